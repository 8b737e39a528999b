//! Before/after reveal slider driven by a single pointer or touch drag.

use foundation::Rect;

/// Neutral boundary position, restored whenever the image set changes.
pub const DEFAULT_POSITION: f64 = 50.0;

const MIN_POSITION: f64 = 0.0;
const MAX_POSITION: f64 = 100.0;

/// Clip boundary as a percentage of container width, in `[0, 100]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonSlider {
    position: f64,
    dragging: bool,
}

impl Default for ComparisonSlider {
    fn default() -> Self {
        Self {
            position: DEFAULT_POSITION,
            dragging: false,
        }
    }
}

impl ComparisonSlider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Pointer pressed inside the container: start dragging and move the
    /// boundary under the pointer.
    pub fn pointer_down(&mut self, x: f64, container: Rect) {
        self.dragging = true;
        self.seek(x, container);
    }

    /// Mouse/pen move. Ignored unless a drag is in progress.
    pub fn pointer_move(&mut self, x: f64, container: Rect) {
        if !self.dragging {
            return;
        }
        self.seek(x, container);
    }

    /// Touch moves always track the finger.
    pub fn touch_move(&mut self, x: f64, container: Rect) {
        self.seek(x, container);
    }

    /// Ends the drag. Delivered from a document-wide listener, so the
    /// release position does not matter.
    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    pub fn reset(&mut self) {
        self.position = DEFAULT_POSITION;
        self.dragging = false;
    }

    fn seek(&mut self, x: f64, container: Rect) {
        // Zero-width containers (not laid out yet) keep the last position.
        if let Some(p) = position_for(x, container) {
            self.position = p;
        }
    }
}

/// `clamp(0, 100, 100 * (x - left) / width)`.
pub fn position_for(x: f64, container: Rect) -> Option<f64> {
    let fraction = container.fraction_x(x)?;
    Some((fraction * 100.0).clamp(MIN_POSITION, MAX_POSITION))
}
