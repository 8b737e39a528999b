use std::cell::RefCell;

use catalog::{Catalog, CatalogError, MetricsSummary};
use compare::{ArtifactKind, ArtifactResolver, ArtifactStatus, ComparisonView, DEFAULT_POSITION, ImageSet};
use foundation::{Rect, RoiKey, Year};
use gloo_net::http::Request;
use selection::SelectionStore;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

mod config;
mod logging;
mod pointer;
mod theme;

use pointer::DocumentPointerUp;
use theme::{DocumentTheme, ThemeController, ThemeMode};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
enum FetchState {
    #[default]
    Idle,
    Pending,
    Done,
}

#[derive(Debug)]
struct ViewerState {
    store: SelectionStore,
    fetch: FetchState,
    resolver: ArtifactResolver,
    view: Option<ComparisonView<DocumentPointerUp>>,
    theme: DocumentTheme,
}

impl ViewerState {
    fn new() -> Self {
        Self {
            store: SelectionStore::new(),
            fetch: FetchState::Idle,
            resolver: config::resolver(),
            view: None,
            theme: DocumentTheme::default(),
        }
    }

    fn current_images(&self) -> ImageSet {
        current_images(&self.store, &self.resolver)
    }

    fn settle_fetch(&mut self, url: &str, result: Result<Catalog, CatalogError>) {
        self.fetch = FetchState::Done;
        match result {
            Ok(catalog) => {
                self.store.load(catalog);
            }
            Err(err) => {
                tracing::error!("Failed to load catalog {url}: {err}");
                self.store.load_failed();
            }
        }
        self.sync_view();
    }

    /// Pushes the image set for the current selection into the mounted view.
    fn sync_view(&mut self) {
        let images = self.current_images();
        if let Some(view) = &mut self.view {
            view.set_images(images);
        }
    }
}

thread_local! {
    static STATE: RefCell<ViewerState> = RefCell::new(ViewerState::new());
}

fn with_state<F, R>(f: F) -> R
where
    F: FnOnce(&mut ViewerState) -> R,
    R: Default,
{
    STATE
        .try_with(|state| f(&mut state.borrow_mut()))
        .unwrap_or_default()
}

fn current_images(store: &SelectionStore, resolver: &ArtifactResolver) -> ImageSet {
    let selection = store.selection();
    ImageSet::for_selection(
        resolver,
        store.active_roi(),
        selection.and_then(|s| s.before_year.as_ref()),
        selection.and_then(|s| s.after_year.as_ref()),
    )
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn parse_kind(kind: &str) -> Result<ArtifactKind, JsValue> {
    kind.parse::<ArtifactKind>().map_err(to_js)
}

#[derive(Debug, Serialize)]
struct LocationOption {
    id: String,
    label: String,
}

#[derive(Debug, Serialize)]
struct AreaOption {
    key: String,
    label: String,
    locations: Vec<LocationOption>,
    show_location_picker: bool,
}

/// Everything the pickers need to render.
#[derive(Debug, Default, Serialize)]
struct SelectionView {
    ready: bool,
    roi: Option<RoiKey>,
    area: Option<String>,
    location: String,
    before_year: Option<Year>,
    after_year: Option<Year>,
    years: Vec<Year>,
    show_location_picker: bool,
    comparison_ready: bool,
}

impl SelectionView {
    fn from_store(store: &SelectionStore) -> Self {
        let Some(selection) = store.selection() else {
            return Self::default();
        };
        Self {
            ready: true,
            roi: store.active_roi().cloned(),
            area: selection.area.clone(),
            location: selection.location.clone(),
            before_year: selection.before_year.clone(),
            after_year: selection.after_year.clone(),
            years: store.years().to_vec(),
            show_location_picker: store
                .selected_area()
                .is_some_and(|a| a.has_multiple_locations()),
            comparison_ready: selection.before_year.is_some() && selection.after_year.is_some(),
        }
    }
}

fn area_options(catalog: &Catalog) -> Vec<AreaOption> {
    catalog
        .areas()
        .map(|area| AreaOption {
            key: area.key.clone(),
            label: area.label.clone(),
            locations: area
                .locations
                .iter()
                .map(|loc| LocationOption {
                    id: loc.clone(),
                    label: catalog::Area::location_label(loc),
                })
                .collect(),
            show_location_picker: area.has_multiple_locations(),
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct MetricsCard {
    /// The card is only shown for ROIs the catalog lists years for.
    visible: bool,
    summary: MetricsSummary,
}

fn metrics_card(store: &SelectionStore) -> MetricsCard {
    let visible = match (store.catalog(), store.active_roi()) {
        (Some(catalog), Some(roi)) => catalog.has_years(roi),
        _ => false,
    };
    MetricsCard {
        visible,
        summary: MetricsSummary::from_record(store.metrics()),
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    logging::init();
    Ok(())
}

/// Fetches the catalog once. Later calls are ignored.
#[wasm_bindgen]
pub fn load_catalog() {
    let url = with_state(|s| {
        if s.fetch != FetchState::Idle {
            return None;
        }
        s.fetch = FetchState::Pending;
        Some(config::catalog_url())
    });
    let Some(url) = url else {
        tracing::debug!("catalog fetch already issued");
        return;
    };

    spawn_local(async move {
        let result = fetch_catalog(&url).await;
        with_state(|s| s.settle_fetch(&url, result));
    });
}

async fn fetch_catalog(url: &str) -> Result<Catalog, CatalogError> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| CatalogError::Io(e.to_string()))?;
    if !resp.ok() {
        return Err(CatalogError::Http {
            status: resp.status(),
        });
    }
    let text = resp
        .text()
        .await
        .map_err(|e| CatalogError::Io(e.to_string()))?;
    Catalog::from_json(&text)
}

/// True until the catalog fetch has settled (successfully or not).
#[wasm_bindgen]
pub fn is_loading() -> bool {
    with_state(|s| !s.store.is_ready())
}

#[wasm_bindgen]
pub fn areas_json() -> Result<String, JsValue> {
    let areas = with_state(|s| s.store.catalog().map(area_options).unwrap_or_default());
    serde_json::to_string(&areas).map_err(to_js)
}

#[wasm_bindgen]
pub fn selection_json() -> Result<String, JsValue> {
    let view = with_state(|s| SelectionView::from_store(&s.store));
    serde_json::to_string(&view).map_err(to_js)
}

/// Years offered for the active ROI, in catalog order.
#[wasm_bindgen]
pub fn years() -> js_sys::Array {
    let years: Vec<Year> = with_state(|s| s.store.years().to_vec());
    years
        .iter()
        .map(|y| JsValue::from_str(y.as_str()))
        .collect()
}

#[wasm_bindgen]
pub fn set_area(area: &str) {
    with_state(|s| {
        s.store.set_area(area);
        s.sync_view();
    });
}

#[wasm_bindgen]
pub fn set_location(location: &str) {
    with_state(|s| {
        s.store.set_location(location);
        s.sync_view();
    });
}

#[wasm_bindgen]
pub fn set_roi(roi: &str) {
    with_state(|s| {
        s.store.set_roi(RoiKey::new(roi));
        s.sync_view();
    });
}

#[wasm_bindgen]
pub fn set_before_year(year: &str) {
    with_state(|s| {
        s.store.set_before_year(Year::new(year));
        s.sync_view();
    });
}

#[wasm_bindgen]
pub fn set_after_year(year: &str) {
    with_state(|s| {
        s.store.set_after_year(Year::new(year));
        s.sync_view();
    });
}

/// Mounts the comparison slider and starts listening for document-wide
/// pointer releases. Replaces any previously mounted slider.
#[wasm_bindgen]
pub fn mount_slider() -> Result<(), JsValue> {
    let target = DocumentPointerUp::from_window().map_err(to_js)?;
    let mut view = ComparisonView::mount(target).map_err(to_js)?;
    with_state(|s| {
        view.set_images(s.current_images());
        if let Some(previous) = s.view.replace(view) {
            previous.unmount();
        }
    });
    Ok(())
}

#[wasm_bindgen]
pub fn unmount_slider() {
    with_state(|s| {
        if let Some(view) = s.view.take() {
            view.unmount();
        }
    });
}

/// Pointer pressed inside the slider container.
///
/// `container_left`/`container_width` come from `getBoundingClientRect()`.
#[wasm_bindgen]
pub fn slider_pointer_down(client_x: f64, container_left: f64, container_width: f64) {
    with_state(|s| {
        if let Some(view) = &mut s.view {
            view.pointer_down(client_x, Rect::horizontal(container_left, container_width));
        }
    });
}

#[wasm_bindgen]
pub fn slider_pointer_move(client_x: f64, container_left: f64, container_width: f64) {
    with_state(|s| {
        if let Some(view) = &mut s.view {
            view.pointer_move(client_x, Rect::horizontal(container_left, container_width));
        }
    });
}

#[wasm_bindgen]
pub fn slider_touch_move(client_x: f64, container_left: f64, container_width: f64) {
    with_state(|s| {
        if let Some(view) = &mut s.view {
            view.touch_move(client_x, Rect::horizontal(container_left, container_width));
        }
    });
}

/// Normally delivered by the document listener; exposed for hosts that
/// route releases themselves.
#[wasm_bindgen]
pub fn slider_pointer_up() {
    with_state(|s| {
        if let Some(view) = &mut s.view {
            view.pointer_up();
        }
    });
}

#[wasm_bindgen]
pub fn slider_position() -> f64 {
    with_state(|s| s.view.as_ref().map(|v| v.position())).unwrap_or(DEFAULT_POSITION)
}

#[wasm_bindgen]
pub fn comparison_ready() -> bool {
    with_state(|s| match &s.view {
        Some(view) => view.is_ready(),
        None => {
            let images = s.current_images();
            images.before.is_some() && images.after.is_some()
        }
    })
}

/// Asset path for `kind` (`before`, `after`, `mask`, `heat`), or `undefined`
/// when the selection is incomplete.
#[wasm_bindgen]
pub fn artifact_path(kind: &str) -> Result<Option<String>, JsValue> {
    let kind = parse_kind(kind)?;
    Ok(with_state(|s| s.current_images().get(kind).map(str::to_string)))
}

#[wasm_bindgen]
pub fn artifact_status(kind: &str) -> Result<String, JsValue> {
    let kind = parse_kind(kind)?;
    let status = with_state(|s| {
        Some(match &s.view {
            Some(view) => view.status(kind),
            None => match s.current_images().get(kind) {
                Some(path) => ArtifactStatus::Ready(path.to_string()),
                None => ArtifactStatus::Placeholder,
            },
        })
    })
    .unwrap_or(ArtifactStatus::Placeholder);
    serde_json::to_string(&status).map_err(to_js)
}

/// Called from the `<img>` error handler of one artifact card with the
/// element's `src`. Returns false for a stale report.
#[wasm_bindgen]
pub fn artifact_failed(kind: &str, source: &str) -> Result<bool, JsValue> {
    let kind = parse_kind(kind)?;
    Ok(with_state(|s| {
        s.view
            .as_mut()
            .is_some_and(|view| view.mark_failed(kind, source))
    }))
}

#[wasm_bindgen]
pub fn metrics_json() -> Result<String, JsValue> {
    let card = with_state(|s| Some(metrics_card(&s.store)));
    serde_json::to_string(&card).map_err(to_js)
}

/// Applies the system colour-scheme preference; returns the mode name.
#[wasm_bindgen]
pub fn theme_init() -> String {
    with_state(|s| {
        s.theme = DocumentTheme::detect();
        s.theme.current().as_str().to_string()
    })
}

#[wasm_bindgen]
pub fn theme_toggle() -> String {
    with_state(|s| {
        let next = s.theme.current().toggled();
        s.theme.apply(next);
        next.as_str().to_string()
    })
}

#[wasm_bindgen]
pub fn set_theme(mode: &str) -> Result<(), JsValue> {
    let mode = mode.parse::<ThemeMode>().map_err(to_js)?;
    with_state(|s| s.theme.apply(mode));
    Ok(())
}

#[wasm_bindgen]
pub fn theme_current() -> String {
    with_state(|s| s.theme.current().as_str().to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use pretty_assertions::assert_eq;

    fn loaded_store() -> SelectionStore {
        let mut store = SelectionStore::new();
        store.load(
            Catalog::from_json(
                r#"{"regions":["park","park_2"],"years":{"park":[2019,2023],"park_2":[2020]},
                    "metrics":{"park":{"2019":{"deforestation_percent":4.25,"changed_pixels":1200}}}}"#,
            )
            .unwrap(),
        );
        store
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_fetch_is_logged_once_and_ends_loading() {
        let captured = Captured::default();
        let sink = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .without_time()
            .finish();

        let mut state = ViewerState::new();
        tracing::subscriber::with_default(subscriber, || {
            state.settle_fetch("/vr/index.json", Err(CatalogError::Http { status: 404 }));
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.matches("Failed to load catalog /vr/index.json").count(), 1);
        assert_eq!(state.fetch, FetchState::Done);
        assert!(state.store.is_ready());
        assert!(state.store.catalog().unwrap().is_empty());
    }

    #[test]
    fn selection_view_before_load_is_empty() {
        let view = SelectionView::from_store(&SelectionStore::new());
        assert!(!view.ready);
        assert!(view.years.is_empty());
    }

    #[test]
    fn selection_view_reflects_store() {
        let mut store = loaded_store();
        let view = SelectionView::from_store(&store);
        assert!(view.ready);
        assert!(view.show_location_picker);
        assert!(view.comparison_ready);
        assert_eq!(view.years, vec![Year::from(2019), Year::from(2023)]);

        store.set_location("2");
        let view = SelectionView::from_store(&store);
        assert_eq!(view.roi, Some(RoiKey::from("park_2")));
        assert_eq!(view.before_year, view.after_year);
    }

    #[test]
    fn area_options_carry_location_labels() {
        let store = loaded_store();
        let options = area_options(store.catalog().unwrap());
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].label, "Park");
        let labels: Vec<&str> = options[0].locations.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["Location 1", "Location 2"]);
    }

    #[test]
    fn images_follow_selection() {
        let mut store = loaded_store();
        let resolver = ArtifactResolver::new("/vr", "png");
        let images = current_images(&store, &resolver);
        assert_eq!(images.before.as_deref(), Some("/vr/park/before_2019.png"));
        assert_eq!(images.heat.as_deref(), Some("/vr/park/heat_2019.png"));

        store.set_location("2");
        let images = current_images(&store, &resolver);
        assert_eq!(images.mask.as_deref(), Some("/vr/park_2/mask_2020.png"));
        assert_eq!(
            current_images(&SelectionStore::new(), &resolver),
            ImageSet::default()
        );
    }

    #[test]
    fn metrics_card_visibility_and_placeholder() {
        let mut store = loaded_store();
        let card = metrics_card(&store);
        assert!(card.visible);
        assert_eq!(
            card.summary,
            MetricsSummary::Available {
                deforestation: "4.25%".to_string(),
                area_ha: "N/A".to_string(),
                changed_pixels: "1,200".to_string(),
            }
        );

        store.set_location("2");
        let card = metrics_card(&store);
        assert!(card.visible);
        assert!(matches!(card.summary, MetricsSummary::Unavailable { .. }));

        store.set_roi(RoiKey::from("lake"));
        assert!(!metrics_card(&store).visible);
    }
}
