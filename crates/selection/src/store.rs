//! Selection state machine: area -> location -> ROI -> year pair.
//!
//! The store owns the only mutable copy of the selection. Every transition
//! runs to completion and leaves the year pair valid for the active ROI.

use catalog::{Area, BASE_LOCATION, Catalog, CatalogLayout, MetricsRecord, resolve_roi, split_region};
use foundation::{RoiKey, Year};
use serde::Serialize;

/// Current user selection.
///
/// Invariant once reconciled: each year is either `None` (only when the
/// active ROI has no years) or a member of the active ROI's year list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub area: Option<String>,
    pub location: String,
    pub before_year: Option<Year>,
    pub after_year: Option<Year>,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            area: None,
            location: BASE_LOCATION.to_string(),
            before_year: None,
            after_year: None,
        }
    }
}

/// Named transitions, for callers that forward UI events generically.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEvent {
    Load(Catalog),
    LoadFailed,
    SetArea(String),
    SetLocation(String),
    SetRoi(RoiKey),
    SetBeforeYear(Year),
    SetAfterYear(Year),
}

#[derive(Debug)]
struct Ready {
    catalog: Catalog,
    selection: Selection,
    roi: Option<RoiKey>,
}

#[derive(Debug, Default)]
enum StoreState {
    #[default]
    Uninitialized,
    Ready(Ready),
}

#[derive(Debug, Default)]
pub struct SelectionStore {
    state: StoreState,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: SelectionEvent) -> bool {
        match event {
            SelectionEvent::Load(catalog) => self.load(catalog),
            SelectionEvent::LoadFailed => self.load_failed(),
            SelectionEvent::SetArea(area) => self.set_area(&area),
            SelectionEvent::SetLocation(location) => self.set_location(&location),
            SelectionEvent::SetRoi(roi) => self.set_roi(roi),
            SelectionEvent::SetBeforeYear(year) => self.set_before_year(year),
            SelectionEvent::SetAfterYear(year) => self.set_after_year(year),
        }
    }

    /// `Uninitialized -> Ready`: first area in key order, base location,
    /// first and last year of the resulting ROI.
    ///
    /// The catalog is immutable once loaded; a second load is ignored.
    pub fn load(&mut self, catalog: Catalog) -> bool {
        if self.is_ready() {
            tracing::warn!("selection store already loaded; ignoring catalog reload");
            return false;
        }

        let mut selection = Selection::default();
        let roi = match catalog.layout() {
            CatalogLayout::SingleRoi => Some(RoiKey::implicit()),
            CatalogLayout::Regions => {
                selection.area = catalog.first_area().map(|a| a.key.clone());
                selection
                    .area
                    .as_deref()
                    .map(|area| resolve_roi(area, BASE_LOCATION))
            }
        };

        let mut ready = Ready {
            catalog,
            selection,
            roi,
        };
        ready.reconcile();
        tracing::debug!(
            "selection ready: roi={:?} before={:?} after={:?}",
            ready.roi,
            ready.selection.before_year,
            ready.selection.after_year
        );
        self.state = StoreState::Ready(ready);
        true
    }

    /// The catalog could not be fetched: ready, but with nothing to select.
    pub fn load_failed(&mut self) -> bool {
        self.load(Catalog::default())
    }

    /// Switches area; the location falls back to the base location.
    pub fn set_area(&mut self, area: &str) -> bool {
        self.transition("set_area", |ready| {
            if ready.catalog.layout() == CatalogLayout::SingleRoi {
                return;
            }
            if !area.is_empty() && ready.catalog.area(area).is_none() {
                tracing::warn!("selecting unknown area {area}");
            }
            ready.selection.area = (!area.is_empty()).then(|| area.to_string());
            ready.selection.location = BASE_LOCATION.to_string();
            ready.refresh_roi();
        })
    }

    pub fn set_location(&mut self, location: &str) -> bool {
        self.transition("set_location", |ready| {
            if ready.catalog.layout() == CatalogLayout::SingleRoi {
                return;
            }
            ready.selection.location = if location.is_empty() {
                BASE_LOCATION.to_string()
            } else {
                location.to_string()
            };
            ready.refresh_roi();
        })
    }

    /// Replaces the active ROI directly (flat catalogs without a picker
    /// split). Area and location are re-derived from the key.
    pub fn set_roi(&mut self, roi: RoiKey) -> bool {
        self.transition("set_roi", |ready| {
            if ready.catalog.layout() == CatalogLayout::Regions {
                if roi.is_implicit() {
                    ready.selection.area = None;
                    ready.selection.location = BASE_LOCATION.to_string();
                    ready.roi = None;
                } else {
                    let (area, location) = split_region(roi.as_str());
                    ready.selection.area = Some(area.to_string());
                    ready.selection.location = location.to_string();
                    ready.roi = Some(resolve_roi(area, location));
                }
            } else {
                ready.roi = Some(roi);
            }
            ready.reconcile();
        })
    }

    /// Direct overwrite. The caller picks from [`Self::years`]; the value is
    /// re-validated on the next ROI change.
    pub fn set_before_year(&mut self, year: Year) -> bool {
        self.transition("set_before_year", |ready| {
            ready.selection.before_year = Some(year);
        })
    }

    pub fn set_after_year(&mut self, year: Year) -> bool {
        self.transition("set_after_year", |ready| {
            ready.selection.after_year = Some(year);
        })
    }

    /// Year-reconciliation rule. Idempotent.
    pub fn reconcile(&mut self) -> bool {
        self.transition("reconcile", Ready::reconcile)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, StoreState::Ready(_))
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.ready().map(|r| &r.selection)
    }

    pub fn active_roi(&self) -> Option<&RoiKey> {
        self.ready().and_then(|r| r.roi.as_ref())
    }

    /// Years offered for the active ROI, in catalog order.
    pub fn years(&self) -> &[Year] {
        self.ready().map(Ready::years).unwrap_or(&[])
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.ready().map(|r| &r.catalog)
    }

    pub fn selected_area(&self) -> Option<&Area> {
        let ready = self.ready()?;
        ready.catalog.area(ready.selection.area.as_deref()?)
    }

    /// Metrics for the active ROI at the before year.
    pub fn metrics(&self) -> Option<&MetricsRecord> {
        let ready = self.ready()?;
        let roi = ready.roi.as_ref()?;
        let year = ready.selection.before_year.as_ref()?;
        ready.catalog.metrics_for(roi, year)
    }

    fn ready(&self) -> Option<&Ready> {
        match &self.state {
            StoreState::Ready(ready) => Some(ready),
            StoreState::Uninitialized => None,
        }
    }

    fn transition(&mut self, name: &'static str, f: impl FnOnce(&mut Ready)) -> bool {
        let StoreState::Ready(ready) = &mut self.state else {
            tracing::debug!("{name} ignored: catalog not loaded yet");
            return false;
        };
        let before = (ready.selection.clone(), ready.roi.clone());
        f(ready);
        let changed = before != (ready.selection.clone(), ready.roi.clone());
        if changed {
            tracing::debug!(
                "{name}: roi={:?} area={:?} location={} before={:?} after={:?}",
                ready.roi,
                ready.selection.area,
                ready.selection.location,
                ready.selection.before_year,
                ready.selection.after_year
            );
        }
        changed
    }
}

impl Ready {
    fn years(&self) -> &[Year] {
        match &self.roi {
            Some(roi) => self.catalog.years(roi),
            None => &[],
        }
    }

    fn refresh_roi(&mut self) {
        self.roi = self
            .selection
            .area
            .as_deref()
            .map(|area| resolve_roi(area, &self.selection.location));
        self.reconcile();
    }

    fn reconcile(&mut self) {
        let years = match &self.roi {
            Some(roi) => self.catalog.years(roi),
            None => &[],
        };
        if !self
            .selection
            .before_year
            .as_ref()
            .is_some_and(|y| years.contains(y))
        {
            self.selection.before_year = years.first().cloned();
        }
        if !self
            .selection
            .after_year
            .as_ref()
            .is_some_and(|y| years.contains(y))
        {
            self.selection.after_year = years.last().cloned();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn park_catalog() -> Catalog {
        Catalog::from_json(
            r#"{"regions":["park","park_2"],"years":{"park":[2019,2023],"park_2":[2020]}}"#,
        )
        .unwrap()
    }

    fn y(n: u32) -> Option<Year> {
        Some(Year::from(n))
    }

    #[test]
    fn park_scenario() {
        let mut store = SelectionStore::new();
        assert!(store.load(park_catalog()));

        let s = store.selection().unwrap();
        assert_eq!(s.area.as_deref(), Some("park"));
        assert_eq!(s.location, "1");
        assert_eq!(store.active_roi(), Some(&RoiKey::from("park")));
        assert_eq!(s.before_year, y(2019));
        assert_eq!(s.after_year, y(2023));

        assert!(store.set_location("2"));
        let s = store.selection().unwrap();
        assert_eq!(store.active_roi(), Some(&RoiKey::from("park_2")));
        assert_eq!(s.before_year, y(2020));
        assert_eq!(s.after_year, y(2020));
    }

    #[test]
    fn transitions_before_load_are_ignored() {
        let mut store = SelectionStore::new();
        assert!(!store.is_ready());
        assert!(!store.set_area("park"));
        assert!(!store.set_before_year(Year::from(2019)));
        assert!(store.selection().is_none());
        assert!(store.years().is_empty());
    }

    #[test]
    fn reload_is_ignored() {
        let mut store = SelectionStore::new();
        store.load(park_catalog());
        assert!(!store.load(Catalog::default()));
        assert_eq!(store.active_roi(), Some(&RoiKey::from("park")));
    }

    #[test]
    fn failed_load_is_ready_with_empty_selection() {
        let mut store = SelectionStore::new();
        store.load_failed();
        assert!(store.is_ready());
        assert_eq!(store.selection(), Some(&Selection::default()));
        assert_eq!(store.active_roi(), None);
        assert!(!store.set_location("2"));
    }

    #[test]
    fn empty_catalog_leaves_fields_empty() {
        let mut store = SelectionStore::new();
        store.load(Catalog::from_json(r#"{"regions":[]}"#).unwrap());
        let s = store.selection().unwrap();
        assert_eq!(s.area, None);
        assert_eq!(s.before_year, None);
        assert_eq!(s.after_year, None);
    }

    #[test]
    fn area_switch_resets_location() {
        let mut store = SelectionStore::new();
        store.load(
            Catalog::from_json(
                r#"{"regions":["alpha","park","park_2"],"years":{"alpha":[2001],"park":[2019,2023],"park_2":[2020]}}"#,
            )
            .unwrap(),
        );
        assert_eq!(store.active_roi(), Some(&RoiKey::from("alpha")));
        store.set_area("park");
        store.set_location("2");
        assert_eq!(store.active_roi(), Some(&RoiKey::from("park_2")));

        store.set_area("alpha");
        let s = store.selection().unwrap();
        assert_eq!(s.location, "1");
        assert_eq!(store.active_roi(), Some(&RoiKey::from("alpha")));
        assert_eq!((s.before_year.clone(), s.after_year.clone()), (y(2001), y(2001)));
        assert!(!store.selected_area().unwrap().has_multiple_locations());
    }

    #[test]
    fn valid_years_survive_roi_change() {
        let mut store = SelectionStore::new();
        store.load(
            Catalog::from_json(
                r#"{"regions":["a","b"],"years":{"a":[2018,2019,2020,2021],"b":[2019,2020,2022]}}"#,
            )
            .unwrap(),
        );
        store.set_before_year(Year::from(2019));
        store.set_after_year(Year::from(2021));
        store.set_area("b");
        let s = store.selection().unwrap();
        assert_eq!(s.before_year, y(2019));
        assert_eq!(s.after_year, y(2022));
    }

    #[test]
    fn roi_without_years_clears_pair() {
        let mut store = SelectionStore::new();
        store.load(Catalog::from_json(r#"{"regions":["a","b"],"years":{"a":[2018]}}"#).unwrap());
        store.set_area("b");
        let s = store.selection().unwrap();
        assert_eq!((s.before_year.clone(), s.after_year.clone()), (None, None));
        store.set_area("");
        assert_eq!(store.active_roi(), None);
    }

    #[test]
    fn out_of_order_years_follow_catalog_order() {
        let mut store = SelectionStore::new();
        store.load(Catalog::from_json(r#"{"regions":["a"],"years":{"a":[2023,2019,2021]}}"#).unwrap());
        let s = store.selection().unwrap();
        assert_eq!(s.before_year, y(2023));
        assert_eq!(s.after_year, y(2021));
    }

    #[test]
    fn set_roi_derives_area_and_location() {
        let mut store = SelectionStore::new();
        store.load(park_catalog());
        assert!(store.apply(SelectionEvent::SetRoi(RoiKey::from("park_2"))));
        let s = store.selection().unwrap();
        assert_eq!(s.area.as_deref(), Some("park"));
        assert_eq!(s.location, "2");
        assert_eq!(s.before_year, y(2020));
        assert!(!store.apply(SelectionEvent::SetRoi(RoiKey::from("park_2"))));
    }

    #[test]
    fn set_roi_canonicalizes_explicit_base_suffix() {
        let mut store = SelectionStore::new();
        store.load(park_catalog());
        store.set_location("2");
        assert!(store.set_roi(RoiKey::from("park_1")));
        let s = store.selection().unwrap().clone();
        assert_eq!(store.active_roi(), Some(&RoiKey::from("park")));
        assert_eq!(
            store.active_roi().cloned(),
            s.area.as_deref().map(|a| resolve_roi(a, &s.location))
        );
        assert_eq!((s.before_year, s.after_year), (y(2019), y(2023)));
    }

    #[test]
    fn single_roi_catalog_uses_implicit_roi() {
        let mut store = SelectionStore::new();
        store.load(Catalog::from_json(r#"{"years":[2016,2020,2024]}"#).unwrap());
        assert_eq!(store.active_roi(), Some(&RoiKey::implicit()));
        let s = store.selection().unwrap().clone();
        assert_eq!(s.area, None);
        assert_eq!((s.before_year, s.after_year), (y(2016), y(2024)));
        assert!(!store.set_area("park"));
    }

    #[test]
    fn stale_years_are_revalidated_on_next_roi_change() {
        let mut store = SelectionStore::new();
        store.load(park_catalog());
        store.set_before_year(Year::from(1990));
        assert_eq!(store.selection().unwrap().before_year, y(1990));
        assert!(store.set_location("1"));
        assert_eq!(store.selection().unwrap().before_year, y(2019));
        assert!(!store.reconcile());

        store.set_after_year(Year::from(1991));
        assert!(store.reconcile());
        assert_eq!(store.selection().unwrap().after_year, y(2023));
        assert!(!store.reconcile());
    }

    #[test]
    fn metrics_follow_before_year() {
        let mut store = SelectionStore::new();
        store.load(
            Catalog::from_json(
                r#"{"regions":["park"],"years":{"park":[2019,2023]},"metrics":{"park":{"2019":{"changed_pixels":5},"2023":{"changed_pixels":9}}}}"#,
            )
            .unwrap(),
        );
        assert_eq!(store.metrics().and_then(|m| m.changed_pixels), Some(5));
        store.set_before_year(Year::from(2023));
        assert_eq!(store.metrics().and_then(|m| m.changed_pixels), Some(9));
    }

    #[test]
    fn selection_serializes_for_the_ui() {
        let mut store = SelectionStore::new();
        store.load(park_catalog());
        let json = serde_json::to_value(store.selection().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"area": "park", "location": "1", "before_year": "2019", "after_year": "2023"})
        );
    }

    #[derive(Debug, Clone)]
    enum Op {
        Area(usize),
        Location(usize),
        Roi(usize),
        Before(u32),
        After(u32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..4).prop_map(Op::Area),
            (0usize..4).prop_map(Op::Location),
            (0usize..6).prop_map(Op::Roi),
            (2015u32..2026).prop_map(Op::Before),
            (2015u32..2026).prop_map(Op::After),
        ]
    }

    proptest! {
        #[test]
        fn roi_transitions_keep_years_valid(ops in prop::collection::vec(op(), 0..40)) {
            let areas = ["lake", "park", "river", "ghost"];
            let locations = ["1", "2", "3", ""];
            let rois = ["lake", "park", "park_2", "park_3", "river", "nowhere"];
            let mut store = SelectionStore::new();
            store.load(
                Catalog::from_json(
                    r#"{"regions":["lake","park","park_2","park_3","river"],
                        "years":{"lake":[2019,2020,2021],"park":[2016,2024],"park_2":[2022],"park_3":[],"river":[2021,2017]}}"#,
                )
                .unwrap(),
            );
            for op in ops {
                let roi_changing = match op {
                    Op::Area(i) => { store.set_area(areas[i]); true }
                    Op::Location(i) => { store.set_location(locations[i]); true }
                    Op::Roi(i) => { store.set_roi(RoiKey::from(rois[i])); true }
                    Op::Before(n) => { store.set_before_year(Year::from(n)); false }
                    Op::After(n) => { store.set_after_year(Year::from(n)); false }
                };
                if roi_changing {
                    let years = store.years().to_vec();
                    let s = store.selection().unwrap();
                    for year in [&s.before_year, &s.after_year] {
                        match year {
                            Some(y) => prop_assert!(years.contains(y)),
                            None => prop_assert!(years.is_empty()),
                        }
                    }
                    if years.len() == 1 {
                        prop_assert_eq!(&s.before_year, &s.after_year);
                    }
                    prop_assert!(!store.reconcile());
                }
            }
        }
    }
}
