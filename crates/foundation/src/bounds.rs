/// Axis-aligned client-space box, as reported by `getBoundingClientRect`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Rect {
            left,
            top,
            width,
            height,
        }
    }

    /// Horizontal band only; the vertical extent is irrelevant to x math.
    pub fn horizontal(left: f64, width: f64) -> Self {
        Rect::new(left, 0.0, width, 0.0)
    }

    /// Position of `x` across the box, `0.0` at the left edge and `1.0` at
    /// the right edge. Not clamped.
    ///
    /// Returns `None` for a zero, negative or non-finite width, or a
    /// non-finite `x`.
    pub fn fraction_x(&self, x: f64) -> Option<f64> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return None;
        }
        if !(x.is_finite() && self.left.is_finite()) {
            return None;
        }
        Some((x - self.left) / self.width)
    }
}

#[cfg(test)]
mod tests {
    use super::Rect;

    #[test]
    fn fraction_is_relative_to_left_edge() {
        let r = Rect::horizontal(100.0, 200.0);
        assert_eq!(r.fraction_x(100.0), Some(0.0));
        assert_eq!(r.fraction_x(160.0), Some(0.3));
        assert_eq!(r.fraction_x(400.0), Some(1.5));
    }

    #[test]
    fn degenerate_width_has_no_fraction() {
        assert_eq!(Rect::horizontal(0.0, 0.0).fraction_x(10.0), None);
        assert_eq!(Rect::horizontal(0.0, f64::NAN).fraction_x(10.0), None);
        assert_eq!(Rect::horizontal(0.0, 10.0).fraction_x(f64::INFINITY), None);
    }
}
