//! Occupied label rectangles for collision-based placement.

use crate::backend::PixelRect;

/// Pixel rectangles of labels already placed on a chart.
#[derive(Debug, Clone, Default)]
pub struct LabelSpace {
    placed: Vec<PixelRect>,
    padding: f64,
}

/// Why a candidate placement was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Collides,
    OutOfBounds,
}

impl LabelSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `padding` pixels of clearance between labels.
    pub fn with_padding(padding: f64) -> Self {
        Self {
            placed: Vec::new(),
            padding,
        }
    }

    fn padded(&self, rect: &PixelRect) -> PixelRect {
        PixelRect::new(
            rect.x0 - self.padding,
            rect.y0 - self.padding,
            rect.x1 + self.padding,
            rect.y1 + self.padding,
        )
    }

    pub fn collides(&self, rect: &PixelRect) -> bool {
        let probe = self.padded(rect);
        self.placed.iter().any(|p| p.intersects(&probe))
    }

    /// Check a candidate against the plot area and placed labels.
    pub fn check(&self, rect: &PixelRect, area: &PixelRect) -> Result<(), Rejection> {
        if !area.contains(rect) {
            return Err(Rejection::OutOfBounds);
        }
        if self.collides(rect) {
            return Err(Rejection::Collides);
        }
        Ok(())
    }

    pub fn place(&mut self, rect: PixelRect) {
        self.placed.push(rect);
    }

    pub fn len(&self) -> usize {
        self.placed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check() {
        let area = PixelRect::new(0.0, 0.0, 100.0, 100.0);
        let mut space = LabelSpace::new();
        let a = PixelRect::new(10.0, 10.0, 30.0, 20.0);
        assert_eq!(space.check(&a, &area), Ok(()));
        space.place(a);

        let overlapping = PixelRect::new(25.0, 15.0, 45.0, 25.0);
        assert_eq!(space.check(&overlapping, &area), Err(Rejection::Collides));

        let outside = PixelRect::new(90.0, 10.0, 110.0, 20.0);
        assert_eq!(space.check(&outside, &area), Err(Rejection::OutOfBounds));

        let beside = PixelRect::new(30.0, 10.0, 50.0, 20.0);
        assert_eq!(space.check(&beside, &area), Ok(()));
    }

    #[test]
    fn test_padding() {
        let mut space = LabelSpace::with_padding(2.0);
        space.place(PixelRect::new(0.0, 0.0, 10.0, 10.0));
        assert!(space.collides(&PixelRect::new(11.0, 0.0, 20.0, 10.0)));
        assert!(!space.collides(&PixelRect::new(13.0, 0.0, 20.0, 10.0)));
        assert_eq!(space.len(), 1);
    }
}
