use std::collections::{BTreeMap, BTreeSet};

use foundation::{RoiKey, Year};
use serde::Serialize;

use crate::CatalogError;
use crate::document::{CatalogDocument, YearsDocument, identifier, parse_years};
use crate::metrics::{MetricsRecord, RoiMetrics};
use crate::roi::{BASE_LOCATION, format_label, resolve_roi, split_region};

/// A base region grouping one or more numbered locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Area {
    pub key: String,
    pub label: String,
    /// Always contains [`BASE_LOCATION`]; ascending string order.
    pub locations: BTreeSet<String>,
}

impl Area {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            label: format_label(&key),
            key,
            locations: BTreeSet::from([BASE_LOCATION.to_string()]),
        }
    }

    /// The location picker is only offered when there is a choice.
    pub fn has_multiple_locations(&self) -> bool {
        self.locations.len() > 1
    }

    pub fn location_label(location: &str) -> String {
        format!("Location {location}")
    }

    pub fn roi_keys(&self) -> impl Iterator<Item = RoiKey> + '_ {
        self.locations.iter().map(|loc| resolve_roi(&self.key, loc))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogLayout {
    /// Region names, optionally grouped into areas and locations.
    #[default]
    Regions,
    /// A bare year list for one implicit region.
    SingleRoi,
}

/// Normalized, immutable view of the catalog document.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Catalog {
    layout: CatalogLayout,
    areas: BTreeMap<String, Area>,
    years: BTreeMap<RoiKey, Vec<Year>>,
    metrics: BTreeMap<RoiKey, RoiMetrics>,
}

impl Catalog {
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| CatalogError::Corrupt(e.to_string()))?;
        if !value.is_object() {
            return Err(CatalogError::Corrupt(
                "catalog document is not a JSON object".to_string(),
            ));
        }
        let doc: CatalogDocument =
            serde_json::from_value(value).map_err(|e| CatalogError::Corrupt(e.to_string()))?;
        Ok(Self::from_document(doc))
    }

    pub fn from_document(doc: CatalogDocument) -> Self {
        let mut catalog = Catalog::default();
        let names = doc.region_names();
        let area_docs = doc.area_documents();
        let has_regions = !names.is_empty() || !area_docs.is_empty();

        match doc.years_document() {
            Some(YearsDocument::Single(raw)) if !has_regions => {
                catalog.layout = CatalogLayout::SingleRoi;
                catalog
                    .years
                    .insert(RoiKey::implicit(), parse_years("implicit region", raw));
            }
            Some(YearsDocument::Single(_)) => {
                tracing::warn!("catalog lists a bare year list alongside regions; year list ignored");
            }
            Some(YearsDocument::ByRoi(by_roi)) => {
                for (roi, raw) in by_roi {
                    let years = parse_years(&roi, raw);
                    catalog.years.insert(RoiKey::new(roi), years);
                }
            }
            None => {}
        }

        if catalog.layout == CatalogLayout::Regions {
            catalog.areas = group_regions(names.iter().map(String::as_str));

            for (key, area_doc) in area_docs {
                let area = catalog
                    .areas
                    .entry(key.clone())
                    .or_insert_with(|| Area::new(key));
                if let Some(label) = area_doc.label.filter(|l| !l.trim().is_empty()) {
                    area.label = label;
                }
                area.locations
                    .extend(area_doc.locations.iter().filter_map(identifier));
            }
        }

        for (roi, raw) in doc.metrics_entries() {
            if let Some(m) = RoiMetrics::from_value(&roi, raw) {
                catalog.metrics.insert(RoiKey::new(roi), m);
            }
        }

        tracing::info!(
            "catalog loaded: layout={:?} areas={} rois_with_years={} rois_with_metrics={}",
            catalog.layout,
            catalog.areas.len(),
            catalog.years.len(),
            catalog.metrics.len()
        );
        catalog
    }

    pub fn layout(&self) -> CatalogLayout {
        self.layout
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty() && self.years.is_empty()
    }

    /// Areas in ascending key order.
    pub fn areas(&self) -> impl Iterator<Item = &Area> + '_ {
        self.areas.values()
    }

    pub fn area(&self, key: &str) -> Option<&Area> {
        self.areas.get(key)
    }

    pub fn area_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.areas.keys().map(String::as_str)
    }

    pub fn first_area(&self) -> Option<&Area> {
        self.areas.values().next()
    }

    /// Years for `roi` in catalog order. Empty when the ROI has none.
    pub fn years(&self, roi: &RoiKey) -> &[Year] {
        self.years.get(roi).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_years(&self, roi: &RoiKey) -> bool {
        self.years.contains_key(roi)
    }

    pub fn metrics_for(&self, roi: &RoiKey, year: &Year) -> Option<&MetricsRecord> {
        self.metrics.get(roi)?.for_year(year)
    }

    /// Every ROI key the area set expands to, in area then location order.
    pub fn roi_keys(&self) -> Vec<RoiKey> {
        self.areas.values().flat_map(Area::roi_keys).collect()
    }
}

/// Groups flat region names into areas.
///
/// Duplicates are idempotent, and every area carries the base location.
pub fn group_regions<'a>(names: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, Area> {
    let mut areas: BTreeMap<String, Area> = BTreeMap::new();
    for name in names {
        let (base, location) = split_region(name);
        areas
            .entry(base.to_string())
            .or_insert_with(|| Area::new(base))
            .locations
            .insert(location.to_string());
    }
    areas
}
