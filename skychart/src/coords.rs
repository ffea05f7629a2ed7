//! Sky and native-plane coordinate types.

use serde::{Deserialize, Serialize};

/// Equatorial coordinates in degrees (RA in [0, 360), Dec in [-90, 90]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Equatorial {
    pub ra: f64,
    pub dec: f64,
}

impl Equatorial {
    pub fn new(ra: f64, dec: f64) -> Self {
        Self {
            ra: ra.rem_euclid(360.0),
            dec,
        }
    }

    /// Unit vector on the celestial sphere.
    pub fn to_unit_vector(&self) -> nalgebra::Vector3<f64> {
        let (ra, dec) = (self.ra.to_radians(), self.dec.to_radians());
        nalgebra::Vector3::new(dec.cos() * ra.cos(), dec.cos() * ra.sin(), dec.sin())
    }
}

/// A point in a chart's native 2-D space.
///
/// Undefined projections (far hemisphere, behind the tangent plane) are
/// represented by [`NativePoint::UNDEFINED`] rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NativePoint {
    pub x: f64,
    pub y: f64,
}

impl NativePoint {
    pub const UNDEFINED: NativePoint = NativePoint {
        x: f64::NAN,
        y: f64::NAN,
    };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn finite(self) -> Option<Self> {
        self.is_finite().then_some(self)
    }
}

/// Smallest signed difference `a - b` between two angles, in (-180, 180].
pub fn angle_diff(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ra_wraps_into_range() {
        assert_relative_eq!(Equatorial::new(370.0, 0.0).ra, 10.0);
        assert_relative_eq!(Equatorial::new(-15.0, 0.0).ra, 345.0);
    }

    #[test]
    fn test_angle_diff_crosses_zero() {
        assert_relative_eq!(angle_diff(5.0, 355.0), 10.0);
        assert_relative_eq!(angle_diff(355.0, 5.0), -10.0);
        assert_relative_eq!(angle_diff(180.0, 0.0), 180.0);
    }

    #[test]
    fn test_undefined_point() {
        assert!(!NativePoint::UNDEFINED.is_finite());
        assert!(NativePoint::UNDEFINED.finite().is_none());
        assert_eq!(NativePoint::new(1.0, 2.0).finite(), Some(NativePoint::new(1.0, 2.0)));
    }

    #[test]
    fn test_unit_vector_pole() {
        let v = Equatorial::new(0.0, 90.0).to_unit_vector();
        assert_relative_eq!(v.z, 1.0, epsilon = 1e-12);
    }
}
