//! Projected-CRS support.
//!
//! Source imagery is positioned in a planar projected CRS (UTM). The engine
//! talks to projections through [`ProjectionConverter`] so hosts can plug in
//! a full geodetic library; [`TransverseMercator`] is the built-in WGS84 UTM
//! implementation.

use std::f64::consts::{PI, TAU};

use super::geodesy::{Geodetic, WGS84_A, WGS84_E2};
use super::Vec3;

/// Width of one UTM zone (degrees).
pub const UTM_ZONE_WIDTH_DEG: f64 = 6.0;
/// UTM central scale factor.
pub const UTM_K0: f64 = 0.9996;
pub const UTM_FALSE_EASTING: f64 = 500_000.0;
pub const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Latitude (degrees) beyond which the series expansions are not trusted.
const MAX_ABS_LAT_DEG: f64 = 85.0;

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionError {
    NonFinite,
    OutOfDomain { lat_deg: f64 },
    InvalidZone(u8),
}

impl std::fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectionError::NonFinite => write!(f, "non-finite coordinate"),
            ProjectionError::OutOfDomain { lat_deg } => {
                write!(f, "latitude {lat_deg} outside projection domain")
            }
            ProjectionError::InvalidZone(zone) => write!(f, "invalid UTM zone {zone}"),
        }
    }
}

impl std::error::Error for ProjectionError {}

/// Converts between a projected source CRS and WGS84 geodetic coordinates.
///
/// Heights pass through unchanged; only the horizontal datum is projected.
pub trait ProjectionConverter {
    /// Projected `(x, y, z)` to geodetic.
    fn forward(&self, projected: Vec3) -> Result<Geodetic, ProjectionError>;

    /// Geodetic to projected `(x, y, z)`.
    fn inverse(&self, geo: Geodetic) -> Result<Vec3, ProjectionError>;

    /// Short identifier of the projected CRS (e.g. `EPSG:32632`).
    fn crs_name(&self) -> String;
}

/// 1-based UTM zone containing `lon_deg`.
pub fn utm_zone_for_lon_deg(lon_deg: f64) -> u8 {
    let wrapped = (lon_deg + 180.0).rem_euclid(360.0);
    let zone = (wrapped / UTM_ZONE_WIDTH_DEG).floor() as i64 + 1;
    zone.clamp(1, 60) as u8
}

/// Central meridian (degrees) of a 1-based UTM zone.
pub fn utm_central_meridian_deg(zone: u8) -> f64 {
    f64::from(zone) * UTM_ZONE_WIDTH_DEG - 183.0
}

/// Central meridian of the zone nearest to `lon_deg`.
pub fn central_meridian_deg(lon_deg: f64) -> f64 {
    utm_central_meridian_deg(utm_zone_for_lon_deg(lon_deg))
}

/// First-order meridian convergence at a geodetic position (radians).
///
/// `convergence = -Δλ · sin φ` with `Δλ` measured from the nearest zone
/// central meridian, wrapped into `[-π, π)`. Higher-order ellipsoidal terms are omitted; the
/// resulting error stays well below the positional error of the imagery
/// near the zone centre but grows towards zone edges and high latitudes.
pub fn meridian_convergence_rad(lon_rad: f64, lat_rad: f64) -> f64 {
    let cm = central_meridian_deg(lon_rad.to_degrees()).to_radians();
    let delta = (lon_rad - cm + PI).rem_euclid(TAU) - PI;
    -delta * lat_rad.sin()
}

/// WGS84 transverse Mercator in a fixed UTM zone.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TransverseMercator {
    zone: u8,
    south: bool,
    central_meridian_rad: f64,
}

impl TransverseMercator {
    pub fn utm(zone: u8, south: bool) -> Result<Self, ProjectionError> {
        if !(1..=60).contains(&zone) {
            return Err(ProjectionError::InvalidZone(zone));
        }
        Ok(Self {
            zone,
            south,
            central_meridian_rad: utm_central_meridian_deg(zone).to_radians(),
        })
    }

    pub fn zone(&self) -> u8 {
        self.zone
    }

    pub fn is_south(&self) -> bool {
        self.south
    }

    fn false_northing(&self) -> f64 {
        if self.south { UTM_FALSE_NORTHING_SOUTH } else { 0.0 }
    }
}

fn meridian_arc(lat: f64) -> f64 {
    let e2 = WGS84_E2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    WGS84_A
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}

impl ProjectionConverter for TransverseMercator {
    fn forward(&self, projected: Vec3) -> Result<Geodetic, ProjectionError> {
        if !projected.is_finite() {
            return Err(ProjectionError::NonFinite);
        }

        let e2 = WGS84_E2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let ep2 = e2 / (1.0 - e2);

        let m = (projected.y - self.false_northing()) / UTM_K0;
        let mu = m / (WGS84_A * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));
        let sqrt_1me2 = (1.0 - e2).sqrt();
        let e1 = (1.0 - sqrt_1me2) / (1.0 + sqrt_1me2);

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin1, cos1) = phi1.sin_cos();
        let tan1 = sin1 / cos1;
        let c1 = ep2 * cos1 * cos1;
        let t1 = tan1 * tan1;
        let w = 1.0 - e2 * sin1 * sin1;
        let n1 = WGS84_A / w.sqrt();
        let r1 = WGS84_A * (1.0 - e2) / w.powf(1.5);
        let d = (projected.x - UTM_FALSE_EASTING) / (n1 * UTM_K0);

        let lat = phi1
            - (n1 * tan1 / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);
        let lon = self.central_meridian_rad
            + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                    * d.powi(5)
                    / 120.0)
                / cos1;

        let geo = Geodetic::new(lat, lon, projected.z);
        if !geo.is_finite() {
            return Err(ProjectionError::NonFinite);
        }
        if geo.lat_deg().abs() > MAX_ABS_LAT_DEG {
            return Err(ProjectionError::OutOfDomain {
                lat_deg: geo.lat_deg(),
            });
        }
        Ok(geo)
    }

    fn inverse(&self, geo: Geodetic) -> Result<Vec3, ProjectionError> {
        if !geo.is_finite() {
            return Err(ProjectionError::NonFinite);
        }
        if geo.lat_deg().abs() > MAX_ABS_LAT_DEG {
            return Err(ProjectionError::OutOfDomain {
                lat_deg: geo.lat_deg(),
            });
        }

        let e2 = WGS84_E2;
        let ep2 = e2 / (1.0 - e2);
        let lat = geo.lat_rad;
        let (sin_lat, cos_lat) = lat.sin_cos();
        let tan_lat = sin_lat / cos_lat;

        let n = WGS84_A / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let t = tan_lat * tan_lat;
        let c = ep2 * cos_lat * cos_lat;
        let a = (geo.lon_rad - self.central_meridian_rad) * cos_lat;
        let m = meridian_arc(lat);

        let x = UTM_FALSE_EASTING
            + UTM_K0
                * n
                * (a + (1.0 - t + c) * a.powi(3) / 6.0
                    + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0);
        let y = self.false_northing()
            + UTM_K0
                * (m + n
                    * tan_lat
                    * (a * a / 2.0
                        + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                        + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6)
                            / 720.0));

        Ok(Vec3::new(x, y, geo.alt_m))
    }

    fn crs_name(&self) -> String {
        let base = if self.south { 32700 } else { 32600 };
        format!("EPSG:{}", base + u32::from(self.zone))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ProjectionConverter, ProjectionError, TransverseMercator, central_meridian_deg,
        meridian_convergence_rad, utm_zone_for_lon_deg,
    };
    use crate::math::{Geodetic, Vec3};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn zones_and_central_meridians() {
        assert_eq!(utm_zone_for_lon_deg(10.75), 32);
        assert_eq!(utm_zone_for_lon_deg(-179.9), 1);
        assert_eq!(utm_zone_for_lon_deg(179.9), 60);
        assert_eq!(central_meridian_deg(10.75), 9.0);
        assert_eq!(central_meridian_deg(-3.7), -3.0);
    }

    #[test]
    fn convergence_is_zero_on_central_meridian() {
        for lat in [-60.0_f64, -10.0, 0.0, 33.3, 59.9, 80.0] {
            let c = meridian_convergence_rad(9.0_f64.to_radians(), lat.to_radians());
            assert_eq!(c, 0.0);
        }
    }

    #[test]
    fn convergence_sign_follows_offset_and_hemisphere() {
        let east_north = meridian_convergence_rad(10.0_f64.to_radians(), 60.0_f64.to_radians());
        let west_north = meridian_convergence_rad(8.0_f64.to_radians(), 60.0_f64.to_radians());
        assert!(east_north < 0.0);
        assert!(west_north > 0.0);
        assert_close(east_north, -(1.0_f64.to_radians()) * 60.0_f64.to_radians().sin(), 1e-15);
    }

    #[test]
    fn convergence_wraps_longitude_across_the_antimeridian() {
        let lat = 60.0_f64.to_radians();
        let three_deg = 3.0_f64.to_radians() * lat.sin();

        let at_180 = meridian_convergence_rad(180.0_f64.to_radians(), lat);
        assert_close(at_180.abs(), three_deg, 1e-12);

        let at_350 = meridian_convergence_rad(350.0_f64.to_radians(), lat);
        let at_minus_10 = meridian_convergence_rad((-10.0_f64).to_radians(), lat);
        assert_close(at_350, at_minus_10, 1e-12);
        assert_close(at_minus_10, 1.0_f64.to_radians() * lat.sin(), 1e-12);

        // Zone 60 reported past the antimeridian.
        let east_of_180 = meridian_convergence_rad(181.0_f64.to_radians(), lat);
        let west_of_minus_179 = meridian_convergence_rad((-179.0_f64).to_radians(), lat);
        assert_close(east_of_180, west_of_minus_179, 1e-12);
    }

    #[test]
    fn central_meridian_maps_to_false_easting() {
        let tm = TransverseMercator::utm(32, false).unwrap();
        let p = tm.inverse(Geodetic::from_lon_lat_deg(9.0, 0.0, 5.0)).unwrap();
        assert_close(p.x, 500_000.0, 1e-6);
        assert_close(p.y, 0.0, 1e-6);
        assert_eq!(p.z, 5.0);
    }

    #[test]
    fn round_trip_inside_zone() {
        let tm = TransverseMercator::utm(32, false).unwrap();
        let geo = Geodetic::from_lon_lat_deg(10.7522, 59.9139, 42.0);
        let projected = tm.inverse(geo).unwrap();
        assert!(projected.x > 500_000.0);
        let back = tm.forward(projected).unwrap();
        assert_close(back.lon_deg(), geo.lon_deg(), 1e-7);
        assert_close(back.lat_deg(), geo.lat_deg(), 1e-7);
        assert_eq!(back.alt_m, 42.0);
    }

    #[test]
    fn southern_hemisphere_uses_false_northing() {
        let tm = TransverseMercator::utm(56, true).unwrap();
        let p = tm.inverse(Geodetic::from_lon_lat_deg(151.2, -33.86, 0.0)).unwrap();
        assert!(p.y > 6_000_000.0 && p.y < 10_000_000.0);
        assert_eq!(tm.crs_name(), "EPSG:32756");
    }

    #[test]
    fn rejects_invalid_input() {
        assert_eq!(
            TransverseMercator::utm(0, false),
            Err(ProjectionError::InvalidZone(0))
        );
        let tm = TransverseMercator::utm(32, false).unwrap();
        assert_eq!(
            tm.forward(Vec3::new(f64::NAN, 0.0, 0.0)),
            Err(ProjectionError::NonFinite)
        );
        assert!(matches!(
            tm.inverse(Geodetic::from_lon_lat_deg(9.0, 89.0, 0.0)),
            Err(ProjectionError::OutOfDomain { .. })
        ));
    }
}
