use std::collections::BTreeMap;

use foundation::Year;
use serde::Deserialize;
use serde_json::Value;

/// Raw catalog document (`index.json`) as written by the offline pipeline.
///
/// Three shapes are in circulation:
/// - `{ regions, years: {roi: [year]}, metrics?: {roi: {year: record}} }`
/// - `{ regions, years: {roi: [year]}, metrics?: {roi: record} }`
/// - `{ years: [year] }` with a single implicit region
///
/// Every section is kept as raw JSON and classified by hand, so a wrongly
/// typed section or entry degrades on its own instead of failing the whole
/// document.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub regions: Option<Value>,
    #[serde(default)]
    pub areas: Option<Value>,
    #[serde(default)]
    pub years: Option<Value>,
    #[serde(default)]
    pub metrics: Option<Value>,
}

/// Pre-grouped area entry.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AreaDocument {
    pub label: Option<String>,
    pub locations: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum YearsDocument {
    ByRoi(BTreeMap<String, Vec<Value>>),
    Single(Vec<Value>),
}

impl CatalogDocument {
    /// Region names from the flat `regions` list. Bad entries are skipped.
    pub fn region_names(&self) -> Vec<String> {
        let Some(regions) = present("regions", self.regions.as_ref()) else {
            return Vec::new();
        };
        let Value::Array(entries) = regions else {
            tracing::warn!("regions is not a list, ignoring");
            return Vec::new();
        };
        entries
            .iter()
            .filter_map(|v| {
                let id = identifier(v);
                if id.is_none() {
                    tracing::warn!("ignoring malformed region entry {v}");
                }
                id
            })
            .collect()
    }

    pub fn area_documents(&self) -> BTreeMap<String, AreaDocument> {
        let Some(areas) = present("areas", self.areas.as_ref()) else {
            return BTreeMap::new();
        };
        let Value::Object(entries) = areas else {
            tracing::warn!("areas is not an object, ignoring");
            return BTreeMap::new();
        };
        entries
            .iter()
            .filter(|(key, _)| !key.is_empty())
            .filter_map(|(key, value)| {
                let Value::Object(fields) = value else {
                    tracing::warn!("ignoring malformed area entry {key}: {value}");
                    return None;
                };
                let label = fields.get("label").and_then(Value::as_str).map(str::to_string);
                let locations = match fields.get("locations") {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::Array(list)) => list.clone(),
                    Some(other) => {
                        tracing::warn!("locations of area {key} is not a list: {other}");
                        Vec::new()
                    }
                };
                Some((key.clone(), AreaDocument { label, locations }))
            })
            .collect()
    }

    /// Classifies `years`: an object is keyed by ROI, a list is the single
    /// implicit region. A per-ROI entry that is not a list degrades to empty.
    pub fn years_document(&self) -> Option<YearsDocument> {
        match present("years", self.years.as_ref())? {
            Value::Array(list) => Some(YearsDocument::Single(list.clone())),
            Value::Object(entries) => Some(YearsDocument::ByRoi(
                entries
                    .iter()
                    .map(|(roi, raw)| {
                        let list = match raw {
                            Value::Array(list) => list.clone(),
                            Value::Null => {
                                tracing::warn!("null year list for {roi}, treating as empty");
                                Vec::new()
                            }
                            other => {
                                tracing::warn!("year list for {roi} is not a list ({other}), treating as empty");
                                Vec::new()
                            }
                        };
                        (roi.clone(), list)
                    })
                    .collect(),
            )),
            other => {
                tracing::warn!("years is neither a list nor an object ({other}), ignoring");
                None
            }
        }
    }

    /// Raw per-ROI metrics values; shape detection happens per entry.
    pub fn metrics_entries(&self) -> BTreeMap<String, Value> {
        let Some(metrics) = present("metrics", self.metrics.as_ref()) else {
            return BTreeMap::new();
        };
        let Value::Object(entries) = metrics else {
            tracing::warn!("metrics is not an object, ignoring");
            return BTreeMap::new();
        };
        entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

fn present<'a>(section: &str, value: Option<&'a Value>) -> Option<&'a Value> {
    match value {
        None | Some(Value::Null) => {
            tracing::trace!("catalog section {section} absent");
            None
        }
        Some(v) => Some(v),
    }
}

/// Converts raw year entries, keeping source order and dropping entries that
/// are neither integers nor strings.
pub(crate) fn parse_years(context: &str, raw: Vec<Value>) -> Vec<Year> {
    raw.into_iter()
        .filter_map(|v| match serde_json::from_value::<Year>(v.clone()) {
            Ok(y) => Some(y),
            Err(_) => {
                tracing::warn!("ignoring non-year entry {v} in years of {context}");
                None
            }
        })
        .collect()
}

/// Region names and location ids may be written as strings or integers.
pub(crate) fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}
