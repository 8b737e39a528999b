use std::cell::RefCell;
use std::rc::Rc;

use foundation::Rect;
use serde::Serialize;

use crate::artifacts::{ArtifactKind, ImageSet};
use crate::slider::ComparisonSlider;
use crate::subscription::{ListenerError, PointerUpSubscription, PointerUpTarget};

/// What the rendering layer should show for one artifact card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "path", rename_all = "snake_case")]
pub enum ArtifactStatus {
    /// No source yet (selection incomplete).
    Placeholder,
    Ready(String),
    /// The source failed to load; show an inline "not found" card.
    NotFound,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ArtifactFailures([bool; 4]);

impl ArtifactFailures {
    fn slot(kind: ArtifactKind) -> usize {
        match kind {
            ArtifactKind::Before => 0,
            ArtifactKind::After => 1,
            ArtifactKind::Mask => 2,
            ArtifactKind::Heat => 3,
        }
    }

    fn get(&self, kind: ArtifactKind) -> bool {
        self.0[Self::slot(kind)]
    }

    fn set(&mut self, kind: ArtifactKind, failed: bool) {
        self.0[Self::slot(kind)] = failed;
    }
}

/// Mounted comparison view: slider, current image set and per-artifact
/// load failures.
///
/// The global pointer-up registration is held for as long as the view is
/// mounted and released by [`ComparisonView::unmount`] or on drop.
#[derive(Debug)]
pub struct ComparisonView<T: PointerUpTarget> {
    slider: Rc<RefCell<ComparisonSlider>>,
    images: ImageSet,
    failures: ArtifactFailures,
    subscription: PointerUpSubscription<T>,
}

impl<T: PointerUpTarget> ComparisonView<T> {
    pub fn mount(target: T) -> Result<Self, ListenerError> {
        let slider = Rc::new(RefCell::new(ComparisonSlider::new()));
        let weak = Rc::downgrade(&slider);
        let subscription = PointerUpSubscription::subscribe(
            target,
            Box::new(move || {
                if let Some(slider) = weak.upgrade() {
                    if let Ok(mut slider) = slider.try_borrow_mut() {
                        slider.pointer_up();
                    }
                }
            }),
        )?;
        tracing::debug!("comparison view mounted");
        Ok(Self {
            slider,
            images: ImageSet::default(),
            failures: ArtifactFailures::default(),
            subscription,
        })
    }

    pub fn unmount(mut self) {
        self.subscription.release();
        tracing::debug!("comparison view unmounted");
    }

    pub fn is_listening(&self) -> bool {
        self.subscription.is_active()
    }

    /// Installs a new image set.
    ///
    /// A change of identity re-centres the slider. Failure flags are cleared
    /// per artifact, only for artifacts whose source changed.
    pub fn set_images(&mut self, images: ImageSet) -> bool {
        if images == self.images {
            return false;
        }
        for kind in ArtifactKind::ALL {
            if images.get(kind) != self.images.get(kind) {
                self.failures.set(kind, false);
            }
        }
        self.images = images;
        self.slider.borrow_mut().reset();
        true
    }

    pub fn images(&self) -> &ImageSet {
        &self.images
    }

    /// Records a load failure of `source` for `kind`. Siblings are
    /// unaffected.
    ///
    /// `source` may be the resolved path or the absolute URL the browser
    /// expanded it to. A report for a source the view no longer shows is
    /// stale and ignored. Returns whether the failure was recorded.
    pub fn mark_failed(&mut self, kind: ArtifactKind, source: &str) -> bool {
        let Some(current) = self.images.get(kind) else {
            return false;
        };
        if !same_source(current, source) {
            tracing::debug!("ignoring stale {} failure for {source}", kind.as_str());
            return false;
        }
        tracing::debug!("artifact {} failed to load", kind.as_str());
        self.failures.set(kind, true);
        true
    }

    pub fn is_failed(&self, kind: ArtifactKind) -> bool {
        self.failures.get(kind)
    }

    pub fn status(&self, kind: ArtifactKind) -> ArtifactStatus {
        match self.images.get(kind) {
            None => ArtifactStatus::Placeholder,
            Some(_) if self.failures.get(kind) => ArtifactStatus::NotFound,
            Some(path) => ArtifactStatus::Ready(path.to_string()),
        }
    }

    /// Both sides of the comparison are known; otherwise the view prompts
    /// for a year pair.
    pub fn is_ready(&self) -> bool {
        self.images.before.is_some() && self.images.after.is_some()
    }

    pub fn position(&self) -> f64 {
        self.slider.borrow().position()
    }

    pub fn is_dragging(&self) -> bool {
        self.slider.borrow().is_dragging()
    }

    pub fn pointer_down(&mut self, x: f64, container: Rect) {
        self.slider.borrow_mut().pointer_down(x, container);
    }

    pub fn pointer_move(&mut self, x: f64, container: Rect) {
        self.slider.borrow_mut().pointer_move(x, container);
    }

    pub fn touch_move(&mut self, x: f64, container: Rect) {
        self.slider.borrow_mut().touch_move(x, container);
    }

    pub fn pointer_up(&mut self) {
        self.slider.borrow_mut().pointer_up();
    }
}

fn same_source(current: &str, reported: &str) -> bool {
    reported == current || (current.starts_with('/') && reported.ends_with(current))
}
