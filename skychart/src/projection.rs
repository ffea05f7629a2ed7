//! Coordinate projection from the celestial sphere to a chart's native plane.
//!
//! A [`Projector`] is owned by the static chart and borrowed by the recording
//! layer, so both surfaces place every object with the same math. Undefined
//! points (far hemisphere, behind the tangent plane, beyond Mercator's pole
//! cutoff, below the horizon) project to [`NativePoint::UNDEFINED`].
//!
//! # Native spaces
//! - **Map**: cartographic projection centered on the middle of the RA range,
//!   in degree units on the unit sphere. RA increases to the left, so the
//!   x axis is displayed inverted.
//! - **Zenith**: stereographic about the zenith, horizon at radius 1, north
//!   up, east left.
//! - **Horizon**: azimuth and altitude in degrees, azimuth increasing right.
//! - **Optic**: gnomonic tangent plane about the pointing center, east left.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use strum::{Display, EnumIter, EnumString};

use crate::coords::{angle_diff, Equatorial, NativePoint};
use crate::error::ConfigError;

/// Chart family, also the `type` entry of the recorded projection info.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChartKind {
    Map,
    Zenith,
    Horizon,
    Optic,
}

/// Cartographic projections available to map charts.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MapProjection {
    #[default]
    PlateCarree,
    Miller,
    Mercator,
    Mollweide,
    Stereographic,
    Orthographic,
}

/// Mercator is undefined beyond this declination.
const MERCATOR_DEC_LIMIT: f64 = 85.0;

/// Observer location and local sidereal time, all in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observer {
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    /// Local sidereal time expressed as an angle (hours × 15).
    pub lst: f64,
}

impl Observer {
    /// Unit vector of `eq` in the local horizontal frame: east, north, up.
    pub fn horizontal(&self, eq: &Equatorial) -> Vector3<f64> {
        let lat = self.latitude.to_radians();
        let dec = eq.dec.to_radians();
        let ha = (self.lst - eq.ra).to_radians();
        Vector3::new(
            -dec.cos() * ha.sin(),
            dec.sin() * lat.cos() - dec.cos() * ha.cos() * lat.sin(),
            lat.sin() * dec.sin() + lat.cos() * dec.cos() * ha.cos(),
        )
    }

    /// Altitude and azimuth (north through east) in degrees.
    pub fn alt_az(&self, eq: &Equatorial) -> (f64, f64) {
        let v = self.horizontal(eq);
        let alt = v.z.clamp(-1.0, 1.0).asin();
        let az = v.x.atan2(v.y);
        (alt.to_degrees(), az.to_degrees().rem_euclid(360.0))
    }
}

/// Domain extent in sky coordinates. `ra_min > ra_max` wraps through 0h.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyExtent {
    pub ra_min: f64,
    pub ra_max: f64,
    pub dec_min: f64,
    pub dec_max: f64,
}

impl SkyExtent {
    pub const FULL_SKY: SkyExtent = SkyExtent {
        ra_min: 0.0,
        ra_max: 360.0,
        dec_min: -90.0,
        dec_max: 90.0,
    };

    pub fn new(ra_min: f64, ra_max: f64, dec_min: f64, dec_max: f64) -> Result<Self, ConfigError> {
        let extent = Self {
            ra_min,
            ra_max,
            dec_min,
            dec_max,
        };
        extent.validate()?;
        Ok(extent)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = [self.ra_min, self.ra_max, self.dec_min, self.dec_max];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::Extent("non-finite bound".into()));
        }
        if !(0.0..=360.0).contains(&self.ra_min) || !(0.0..=360.0).contains(&self.ra_max) {
            return Err(ConfigError::Extent(format!(
                "ra range {}..{} outside 0..360",
                self.ra_min, self.ra_max
            )));
        }
        if self.dec_min < -90.0 || self.dec_max > 90.0 || self.dec_min >= self.dec_max {
            return Err(ConfigError::Extent(format!(
                "dec range {}..{} must be increasing within -90..90",
                self.dec_min, self.dec_max
            )));
        }
        if self.ra_span() <= 0.0 {
            return Err(ConfigError::Extent("empty ra range".into()));
        }
        Ok(())
    }

    pub fn ra_span(&self) -> f64 {
        if self.ra_max > self.ra_min {
            self.ra_max - self.ra_min
        } else if self.ra_max < self.ra_min {
            self.ra_max + 360.0 - self.ra_min
        } else {
            0.0
        }
    }

    pub fn ra_center(&self) -> f64 {
        (self.ra_min + self.ra_span() / 2.0).rem_euclid(360.0)
    }

    pub fn contains(&self, eq: &Equatorial) -> bool {
        if eq.dec < self.dec_min || eq.dec > self.dec_max {
            return false;
        }
        if self.ra_span() >= 360.0 {
            return true;
        }
        (eq.ra - self.ra_min).rem_euclid(360.0) <= self.ra_span()
    }
}

/// Axis limits in display order: an inverted x axis has `x_min > x_max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisLimits {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl AxisLimits {
    pub fn width(&self) -> f64 {
        (self.x_max - self.x_min).abs()
    }

    pub fn height(&self) -> f64 {
        (self.y_max - self.y_min).abs()
    }

    pub fn center(&self) -> NativePoint {
        NativePoint::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    pub fn x_inverted(&self) -> bool {
        self.x_min > self.x_max
    }
}

/// Gnomonic tangent-plane projection about a pointing center.
///
/// Camera frame: Z toward the center, Y toward celestial north, X east.
#[derive(Debug, Clone, PartialEq)]
pub struct Gnomonic {
    pub center: Equatorial,
    rotation: Matrix3<f64>,
}

impl Gnomonic {
    pub fn new(center: Equatorial) -> Self {
        let z = center.to_unit_vector();

        // Near the poles north is degenerate, so fall back to the RA=0 meridian.
        let north = if z.z.abs() > 1.0 - 1e-12 {
            Vector3::new(-z.z.signum(), 0.0, 0.0)
        } else {
            Vector3::new(0.0, 0.0, 1.0)
        };
        let east = north.cross(&z).normalize();
        let y = z.cross(&east).normalize();
        let x = y.cross(&z).normalize();

        Self {
            center,
            rotation: Matrix3::from_columns(&[x, y, z]),
        }
    }

    /// Standard coordinates in tangent-plane degrees; undefined behind the plane.
    pub fn project(&self, eq: &Equatorial) -> NativePoint {
        let cam = self.rotation.transpose() * eq.to_unit_vector();
        if cam.z <= 1e-9 {
            return NativePoint::UNDEFINED;
        }
        NativePoint::new(
            (cam.x / cam.z).to_degrees(),
            (cam.y / cam.z).to_degrees(),
        )
    }

    /// Angular distance from the center in degrees.
    pub fn separation(&self, eq: &Equatorial) -> f64 {
        let cos = self.center.to_unit_vector().dot(&eq.to_unit_vector());
        cos.clamp(-1.0, 1.0).acos().to_degrees()
    }
}

/// Chart geometry: projection kind plus the domain it covers.
#[derive(Debug, Clone, PartialEq)]
pub enum Projector {
    Map {
        projection: MapProjection,
        extent: SkyExtent,
    },
    Zenith {
        observer: Observer,
    },
    Horizon {
        observer: Observer,
        az_min: f64,
        az_max: f64,
        alt_min: f64,
        alt_max: f64,
    },
    Optic {
        gnomonic: Gnomonic,
        fov: f64,
    },
}

impl Projector {
    pub fn map(projection: MapProjection, extent: SkyExtent) -> Result<Self, ConfigError> {
        extent.validate()?;
        Ok(Self::Map { projection, extent })
    }

    pub fn zenith(observer: Observer) -> Self {
        Self::Zenith { observer }
    }

    pub fn horizon(
        observer: Observer,
        az: (f64, f64),
        alt: (f64, f64),
    ) -> Result<Self, ConfigError> {
        let (az_min, az_max) = az;
        let (alt_min, alt_max) = alt;
        if !(az_max > az_min) || az_max - az_min > 360.0 {
            return Err(ConfigError::Extent(format!("azimuth range {az_min}..{az_max}")));
        }
        if !(alt_max > alt_min) || alt_min < -90.0 || alt_max > 90.0 {
            return Err(ConfigError::Extent(format!("altitude range {alt_min}..{alt_max}")));
        }
        Ok(Self::Horizon {
            observer,
            az_min,
            az_max,
            alt_min,
            alt_max,
        })
    }

    pub fn optic(center: Equatorial, fov: f64) -> Result<Self, ConfigError> {
        if !(fov > 0.0 && fov < 180.0) {
            return Err(ConfigError::Extent(format!("field of view {fov} outside (0, 180)")));
        }
        Ok(Self::Optic {
            gnomonic: Gnomonic::new(center),
            fov,
        })
    }

    pub fn kind(&self) -> ChartKind {
        match self {
            Self::Map { .. } => ChartKind::Map,
            Self::Zenith { .. } => ChartKind::Zenith,
            Self::Horizon { .. } => ChartKind::Horizon,
            Self::Optic { .. } => ChartKind::Optic,
        }
    }

    /// Project a sky position, returning the undefined sentinel where the
    /// projection has no value.
    pub fn project(&self, eq: &Equatorial) -> NativePoint {
        match self {
            Self::Map { projection, extent } => {
                project_map(*projection, angle_diff(eq.ra, extent.ra_center()), eq.dec)
            }
            Self::Zenith { observer } => {
                // tan(zenith distance / 2) scaled onto the east/north components.
                let v = observer.horizontal(eq);
                if v.z < 0.0 {
                    return NativePoint::UNDEFINED;
                }
                NativePoint::new(v.x / (1.0 + v.z), v.y / (1.0 + v.z))
            }
            Self::Horizon {
                observer, az_min, ..
            } => {
                let (alt, az) = observer.alt_az(eq);
                NativePoint::new(az_min + (az - az_min).rem_euclid(360.0), alt)
            }
            Self::Optic { gnomonic, .. } => gnomonic.project(eq),
        }
    }

    /// Project a polyline, splitting it into runs of finite points. Runs also
    /// break where consecutive points straddle the projection seam.
    pub fn project_path(&self, points: &[Equatorial]) -> Vec<Vec<NativePoint>> {
        let mut runs = Vec::new();
        let mut current: Vec<NativePoint> = Vec::new();
        let mut prev_wrap: Option<f64> = None;

        for eq in points {
            let p = self.project(eq);
            if !p.is_finite() {
                if current.len() > 1 {
                    runs.push(std::mem::take(&mut current));
                }
                current.clear();
                prev_wrap = None;
                continue;
            }
            let wrap = self.seam_coordinate(eq);
            if let (Some(a), Some(b)) = (prev_wrap, wrap) {
                if (a - b).abs() > 180.0 {
                    if current.len() > 1 {
                        runs.push(std::mem::take(&mut current));
                    }
                    current.clear();
                }
            }
            prev_wrap = wrap;
            current.push(p);
        }
        if current.len() > 1 {
            runs.push(current);
        }
        runs
    }

    /// True when both endpoints project and the segment does not cross the seam.
    pub fn project_segment(
        &self,
        a: &Equatorial,
        b: &Equatorial,
    ) -> Option<(NativePoint, NativePoint)> {
        let pa = self.project(a).finite()?;
        let pb = self.project(b).finite()?;
        if let (Some(wa), Some(wb)) = (self.seam_coordinate(a), self.seam_coordinate(b)) {
            if (wa - wb).abs() > 180.0 {
                return None;
            }
        }
        Some((pa, pb))
    }

    fn seam_coordinate(&self, eq: &Equatorial) -> Option<f64> {
        match self {
            Self::Map { extent, .. } => Some(angle_diff(eq.ra, extent.ra_center())),
            Self::Horizon { .. } => Some(self.project(eq).x),
            Self::Zenith { .. } | Self::Optic { .. } => None,
        }
    }

    /// Whether a sky position falls inside the chart's domain.
    pub fn contains(&self, eq: &Equatorial) -> bool {
        match self {
            Self::Map { projection, extent } => {
                extent.contains(eq) && self.project(eq).is_finite() && {
                    *projection != MapProjection::Mercator || eq.dec.abs() <= MERCATOR_DEC_LIMIT
                }
            }
            Self::Zenith { observer } => observer.horizontal(eq).z >= 0.0,
            Self::Horizon {
                alt_min,
                alt_max,
                az_max,
                ..
            } => {
                let p = self.project(eq);
                p.y >= *alt_min && p.y <= *alt_max && p.x <= *az_max
            }
            Self::Optic { gnomonic, fov } => gnomonic.separation(eq) <= fov / 2.0,
        }
    }

    /// Sky extent recorded alongside the axis limits.
    pub fn sky_extent(&self) -> SkyExtent {
        match self {
            Self::Map { extent, .. } => *extent,
            Self::Zenith { observer } => SkyExtent {
                ra_min: 0.0,
                ra_max: 360.0,
                dec_min: (observer.latitude - 90.0).max(-90.0),
                dec_max: (observer.latitude + 90.0).min(90.0),
            },
            Self::Horizon { .. } => SkyExtent::FULL_SKY,
            Self::Optic { gnomonic, fov } => {
                let half = fov / 2.0;
                let c = gnomonic.center;
                let dec_min = (c.dec - half).max(-90.0);
                let dec_max = (c.dec + half).min(90.0);
                let cos_dec = c.dec.to_radians().cos();
                if dec_max >= 90.0
                    || dec_min <= -90.0
                    || cos_dec < 1e-6
                    || half / cos_dec >= 180.0
                {
                    SkyExtent {
                        ra_min: 0.0,
                        ra_max: 360.0,
                        dec_min,
                        dec_max,
                    }
                } else {
                    let ra_half = half / cos_dec;
                    SkyExtent {
                        ra_min: (c.ra - ra_half).rem_euclid(360.0),
                        ra_max: (c.ra + ra_half).rem_euclid(360.0),
                        dec_min,
                        dec_max,
                    }
                }
            }
        }
    }

    /// Native axis limits in display order.
    pub fn axis_limits(&self) -> AxisLimits {
        match self {
            Self::Map { extent, .. } => {
                let (mut lo_x, mut hi_x) = (f64::INFINITY, f64::NEG_INFINITY);
                let (mut lo_y, mut hi_y) = (f64::INFINITY, f64::NEG_INFINITY);
                const STEPS: usize = 48;
                let span = extent.ra_span();
                for i in 0..=STEPS {
                    let ra = extent.ra_min + span * i as f64 / STEPS as f64;
                    for j in 0..=STEPS {
                        let dec = extent.dec_min
                            + (extent.dec_max - extent.dec_min) * j as f64 / STEPS as f64;
                        let p = self.project(&Equatorial::new(ra, dec));
                        if p.is_finite() {
                            lo_x = lo_x.min(p.x);
                            hi_x = hi_x.max(p.x);
                            lo_y = lo_y.min(p.y);
                            hi_y = hi_y.max(p.y);
                        }
                    }
                }
                if !lo_x.is_finite() || !lo_y.is_finite() {
                    return AxisLimits {
                        x_min: 1.0,
                        x_max: -1.0,
                        y_min: -1.0,
                        y_max: 1.0,
                    };
                }
                AxisLimits {
                    x_min: hi_x,
                    x_max: lo_x,
                    y_min: lo_y,
                    y_max: hi_y,
                }
            }
            Self::Zenith { .. } => AxisLimits {
                x_min: 1.0,
                x_max: -1.0,
                y_min: -1.0,
                y_max: 1.0,
            },
            Self::Horizon {
                az_min,
                az_max,
                alt_min,
                alt_max,
                ..
            } => AxisLimits {
                x_min: *az_min,
                x_max: *az_max,
                y_min: *alt_min,
                y_max: *alt_max,
            },
            Self::Optic { fov, .. } => {
                let r = (fov / 2.0).to_radians().tan().to_degrees();
                AxisLimits {
                    x_min: r,
                    x_max: -r,
                    y_min: -r,
                    y_max: r,
                }
            }
        }
    }
}

/// Forward map projection of longitude offset `lambda` and latitude `phi`, degrees.
fn project_map(projection: MapProjection, lambda: f64, phi: f64) -> NativePoint {
    let l = lambda.to_radians();
    let p = phi.to_radians();
    let (x, y) = match projection {
        MapProjection::PlateCarree => (l, p),
        MapProjection::Miller => (l, 1.25 * (FRAC_PI_4 + 0.4 * p).tan().ln()),
        MapProjection::Mercator => {
            if phi.abs() > MERCATOR_DEC_LIMIT {
                return NativePoint::UNDEFINED;
            }
            (l, (FRAC_PI_4 + p / 2.0).tan().ln())
        }
        MapProjection::Mollweide => {
            let theta = mollweide_theta(p);
            (
                2.0 * std::f64::consts::SQRT_2 / PI * l * theta.cos(),
                std::f64::consts::SQRT_2 * theta.sin(),
            )
        }
        MapProjection::Stereographic => {
            let denom = 1.0 + p.cos() * l.cos();
            if denom < 1e-9 {
                return NativePoint::UNDEFINED;
            }
            let k = 2.0 / denom;
            (k * p.cos() * l.sin(), k * p.sin())
        }
        MapProjection::Orthographic => {
            if p.cos() * l.cos() < 0.0 {
                return NativePoint::UNDEFINED;
            }
            (p.cos() * l.sin(), p.sin())
        }
    };
    NativePoint::new(x.to_degrees(), y.to_degrees())
}

/// Solve `2θ + sin 2θ = π sin φ` by Newton iteration.
fn mollweide_theta(phi: f64) -> f64 {
    if (phi.abs() - FRAC_PI_2).abs() < 1e-12 {
        return phi;
    }
    let target = PI * phi.sin();
    let mut theta = phi;
    for _ in 0..50 {
        let f = 2.0 * theta + (2.0 * theta).sin() - target;
        let df = 2.0 + 2.0 * (2.0 * theta).cos();
        if df.abs() < 1e-15 {
            break;
        }
        let step = f / df;
        theta -= step;
        if step.abs() < 1e-12 {
            break;
        }
    }
    theta
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use strum::IntoEnumIterator;

    fn orion_extent() -> SkyExtent {
        SkyExtent::new(60.0, 120.0, -10.0, 30.0).unwrap()
    }

    #[test]
    fn test_map_center_projects_to_origin() {
        for projection in MapProjection::iter() {
            let projector = Projector::map(projection, orion_extent()).unwrap();
            let p = projector.project(&Equatorial::new(90.0, 0.0));
            assert_relative_eq!(p.x, 0.0, epsilon = 1e-9);
            assert_relative_eq!(p.y, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_map_ra_increases_left() {
        let projector = Projector::map(MapProjection::PlateCarree, orion_extent()).unwrap();
        let limits = projector.axis_limits();
        assert!(limits.x_inverted());
        assert_relative_eq!(limits.x_min, 30.0, epsilon = 1e-9);
        assert_relative_eq!(limits.x_max, -30.0, epsilon = 1e-9);
        assert_relative_eq!(limits.y_min, -10.0, epsilon = 1e-9);
        assert_relative_eq!(limits.y_max, 30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mercator_pole_undefined() {
        let projector = Projector::map(MapProjection::Mercator, SkyExtent::FULL_SKY).unwrap();
        assert!(!projector.project(&Equatorial::new(10.0, 89.0)).is_finite());
        assert!(projector.project(&Equatorial::new(10.0, 60.0)).is_finite());
    }

    #[test]
    fn test_mollweide_theta_solves_equation() {
        for deg in [-80.0_f64, -30.0, 0.0, 12.5, 45.0, 89.0] {
            let phi = deg.to_radians();
            let theta = mollweide_theta(phi);
            assert_relative_eq!(
                2.0 * theta + (2.0 * theta).sin(),
                PI * phi.sin(),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_orthographic_far_side_undefined() {
        let projector = Projector::map(MapProjection::Orthographic, SkyExtent::FULL_SKY).unwrap();
        // Center of the full sky is RA 180.
        assert!(!projector.project(&Equatorial::new(0.0, 0.0)).is_finite());
        assert!(projector.project(&Equatorial::new(180.0, 0.0)).is_finite());
    }

    #[test]
    fn test_gnomonic_center_maps_to_origin() {
        let projector = Projector::optic(Equatorial::new(83.8, -5.4), 10.0).unwrap();
        let p = projector.project(&Equatorial::new(83.8, -5.4));
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_gnomonic_east_is_positive_x() {
        let gnomonic = Gnomonic::new(Equatorial::new(100.0, 20.0));
        let east = gnomonic.project(&Equatorial::new(101.0, 20.0));
        let north = gnomonic.project(&Equatorial::new(100.0, 21.0));
        assert!(east.x > 0.0);
        assert!(north.y > 0.0);
        assert_relative_eq!(north.y, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_gnomonic_behind_plane_undefined() {
        let gnomonic = Gnomonic::new(Equatorial::new(0.0, 0.0));
        assert!(!gnomonic.project(&Equatorial::new(180.0, 0.0)).is_finite());
    }

    #[test]
    fn test_gnomonic_at_pole() {
        let gnomonic = Gnomonic::new(Equatorial::new(0.0, 90.0));
        let p = gnomonic.project(&Equatorial::new(45.0, 89.0));
        assert!(p.is_finite());
        assert_relative_eq!((p.x * p.x + p.y * p.y).sqrt(), 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_zenith_point_is_origin_and_horizon_is_unit_circle() {
        let observer = Observer {
            latitude: 40.0,
            longitude: 0.0,
            lst: 120.0,
        };
        let projector = Projector::zenith(observer);
        let zenith = projector.project(&Equatorial::new(120.0, 40.0));
        assert_relative_eq!(zenith.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(zenith.y, 0.0, epsilon = 1e-9);

        // The celestial pole sits due north at altitude = latitude.
        let pole = projector.project(&Equatorial::new(0.0, 90.0));
        assert_relative_eq!(pole.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(pole.y, (25.0_f64).to_radians().tan(), epsilon = 1e-9);

        let below = projector.project(&Equatorial::new(300.0, -60.0));
        assert!(!below.is_finite());
    }

    #[test]
    fn test_zenith_radius_exact_near_zenith() {
        for latitude in [-65.0, -12.5, 0.0, 33.3, 51.5, 78.0] {
            let observer = Observer {
                latitude,
                longitude: 0.0,
                lst: 201.0,
            };
            let projector = Projector::zenith(observer);
            let zenith = projector.project(&Equatorial::new(201.0, latitude));
            assert_relative_eq!(zenith.x, 0.0, epsilon = 1e-12);
            assert_relative_eq!(zenith.y, 0.0, epsilon = 1e-12);

            // 1e-4° south of the zenith along the meridian.
            let near = projector.project(&Equatorial::new(201.0, latitude - 1e-4));
            let expected = (0.5e-4_f64).to_radians().tan();
            assert_relative_eq!(near.x, 0.0, epsilon = 1e-12);
            assert_relative_eq!(near.y, -expected, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_alt_az_of_meridian_star() {
        let observer = Observer {
            latitude: 50.0,
            longitude: 0.0,
            lst: 90.0,
        };
        let (alt, az) = observer.alt_az(&Equatorial::new(90.0, 0.0));
        assert_relative_eq!(alt, 40.0, epsilon = 1e-9);
        assert_relative_eq!(az, 180.0, epsilon = 1e-9);
    }

    #[test]
    fn test_path_breaks_at_seam_and_undefined() {
        let projector = Projector::map(MapProjection::PlateCarree, SkyExtent::FULL_SKY).unwrap();
        // Full sky is centered on RA 180, so RA 0 is the seam.
        let path: Vec<Equatorial> = [350.0, 355.0, 359.0, 1.0, 5.0, 10.0]
            .iter()
            .map(|&ra| Equatorial::new(ra, 0.0))
            .collect();
        let runs = projector.project_path(&path);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].len(), 3);
        assert_eq!(runs[1].len(), 3);

        let zenith = Projector::zenith(Observer {
            latitude: 0.0,
            longitude: 0.0,
            lst: 0.0,
        });
        let equator: Vec<Equatorial> = (0..=36)
            .map(|i| Equatorial::new(i as f64 * 10.0, 0.0))
            .collect();
        for run in zenith.project_path(&equator) {
            assert!(run.iter().all(NativePoint::is_finite));
        }
    }

    #[test]
    fn test_extent_validation() {
        assert!(SkyExtent::new(60.0, 120.0, 30.0, -10.0).is_err());
        assert!(SkyExtent::new(-1.0, 120.0, -10.0, 10.0).is_err());
        assert!(SkyExtent::new(300.0, 60.0, -10.0, 10.0).is_ok());
        assert!(Projector::optic(Equatorial::new(0.0, 0.0), 0.0).is_err());
    }

    #[test]
    fn test_wrapping_extent_contains() {
        let extent = SkyExtent::new(300.0, 60.0, -30.0, 30.0).unwrap();
        assert_relative_eq!(extent.ra_span(), 120.0);
        assert_relative_eq!(extent.ra_center(), 0.0);
        assert!(extent.contains(&Equatorial::new(10.0, 0.0)));
        assert!(extent.contains(&Equatorial::new(330.0, 0.0)));
        assert!(!extent.contains(&Equatorial::new(180.0, 0.0)));
    }

    #[test]
    fn test_chart_kind_names() {
        assert_eq!(ChartKind::Map.to_string(), "map");
        assert_eq!(ChartKind::Optic.to_string(), "optic");
        assert_eq!(MapProjection::PlateCarree.to_string(), "plate_carree");
    }
}
