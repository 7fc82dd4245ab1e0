use super::Ecef;

/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS84 first eccentricity squared.
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// Geodetic coordinates in radians and meters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Geodetic {
    pub lat_rad: f64,
    pub lon_rad: f64,
    pub alt_m: f64,
}

impl Geodetic {
    pub fn new(lat_rad: f64, lon_rad: f64, alt_m: f64) -> Self {
        Self {
            lat_rad,
            lon_rad,
            alt_m,
        }
    }

    /// Builds a position from degrees, longitude first (GeoJSON axis order).
    pub fn from_lon_lat_deg(lon_deg: f64, lat_deg: f64, alt_m: f64) -> Self {
        Self::new(lat_deg.to_radians(), lon_deg.to_radians(), alt_m)
    }

    pub fn lon_deg(&self) -> f64 {
        self.lon_rad.to_degrees()
    }

    pub fn lat_deg(&self) -> f64 {
        self.lat_rad.to_degrees()
    }

    pub fn is_finite(&self) -> bool {
        self.lat_rad.is_finite() && self.lon_rad.is_finite() && self.alt_m.is_finite()
    }
}

/// Prime-vertical radius of curvature at `lat_rad`.
pub fn prime_vertical_radius(lat_rad: f64) -> f64 {
    let sin_lat = lat_rad.sin();
    WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt()
}

/// Ellipsoidal height is measured along the surface normal.
pub fn geodetic_to_ecef(geo: Geodetic) -> Ecef {
    let sin_lat = geo.lat_rad.sin();
    let cos_lat = geo.lat_rad.cos();
    let sin_lon = geo.lon_rad.sin();
    let cos_lon = geo.lon_rad.cos();

    let n = prime_vertical_radius(geo.lat_rad);
    let x = (n + geo.alt_m) * cos_lat * cos_lon;
    let y = (n + geo.alt_m) * cos_lat * sin_lon;
    let z = (n * (1.0 - WGS84_E2) + geo.alt_m) * sin_lat;

    Ecef::new(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::{Geodetic, WGS84_A, WGS84_F, geodetic_to_ecef, prime_vertical_radius};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn equator_lies_on_semi_major_axis() {
        let ecef = geodetic_to_ecef(Geodetic::from_lon_lat_deg(90.0, 0.0, 0.0));
        assert_close(ecef.x, 0.0, 1e-6);
        assert_close(ecef.y, WGS84_A, 1e-6);
        assert_close(ecef.z, 0.0, 1e-6);
    }

    #[test]
    fn pole_lies_on_semi_minor_axis() {
        let ecef = geodetic_to_ecef(Geodetic::from_lon_lat_deg(0.0, 90.0, 0.0));
        assert_close(ecef.z, WGS84_A * (1.0 - WGS84_F), 1e-6);
        assert_close(ecef.x.hypot(ecef.y), 0.0, 1e-6);
    }

    #[test]
    fn height_moves_along_the_normal() {
        let ground = geodetic_to_ecef(Geodetic::from_lon_lat_deg(10.75, 59.91, 0.0));
        let raised = geodetic_to_ecef(Geodetic::from_lon_lat_deg(10.75, 59.91, 500.0));
        let d = raised.as_vec3() - ground.as_vec3();
        assert_close(d.length(), 500.0, 1e-6);
        assert!(prime_vertical_radius(1.0) > prime_vertical_radius(0.0));
    }

    #[test]
    fn degree_accessors_round_trip() {
        let geo = Geodetic::from_lon_lat_deg(10.75, 59.91, 12.0);
        assert_close(geo.lon_deg(), 10.75, 1e-12);
        assert_close(geo.lat_deg(), 59.91, 1e-12);
        assert_eq!(geo.alt_m, 12.0);
        assert!(!Geodetic::new(f64::NAN, 0.0, 0.0).is_finite());
    }
}
