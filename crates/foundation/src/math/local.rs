use super::{Ecef, Geodetic, Vec3, geodetic_to_ecef};

/// Local East-North-Up coordinates (meters), or an ENU direction when used
/// with the `*_vector_*` helpers.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Enu {
    pub east: f64,
    pub north: f64,
    pub up: f64,
}

impl Enu {
    pub fn new(east: f64, north: f64, up: f64) -> Self {
        Self { east, north, up }
    }

    /// Reads a projected-CRS vector as ENU: x is east, y is north, z is up.
    pub fn from_grid(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    pub fn as_vec3(self) -> Vec3 {
        Vec3::new(self.east, self.north, self.up)
    }
}

impl std::ops::Neg for Enu {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.east, -self.north, -self.up)
    }
}

/// Rotates `v` counter-clockwise by `angle_rad` in the east/north plane.
///
/// The up component is untouched.
pub fn rotate_horizontal(v: Enu, angle_rad: f64) -> Enu {
    let (sin_a, cos_a) = angle_rad.sin_cos();
    Enu::new(
        v.east * cos_a - v.north * sin_a,
        v.east * sin_a + v.north * cos_a,
        v.up,
    )
}

pub fn ecef_to_enu(point: Ecef, origin: Geodetic) -> Enu {
    let origin_ecef = geodetic_to_ecef(origin);
    let dx = point.x - origin_ecef.x;
    let dy = point.y - origin_ecef.y;
    let dz = point.z - origin_ecef.z;

    let sin_lat = origin.lat_rad.sin();
    let cos_lat = origin.lat_rad.cos();
    let sin_lon = origin.lon_rad.sin();
    let cos_lon = origin.lon_rad.cos();

    let east = -sin_lon * dx + cos_lon * dy;
    let north = -sin_lat * cos_lon * dx - sin_lat * sin_lon * dy + cos_lat * dz;
    let up = cos_lat * cos_lon * dx + cos_lat * sin_lon * dy + sin_lat * dz;

    Enu::new(east, north, up)
}

pub fn enu_to_ecef(enu: Enu, origin: Geodetic) -> Ecef {
    let origin_ecef = geodetic_to_ecef(origin);
    let d = enu_vector_to_ecef(enu, origin);
    Ecef::new(origin_ecef.x + d.x, origin_ecef.y + d.y, origin_ecef.z + d.z)
}

/// Rotates an ENU direction at `origin` into the ECEF frame (no translation).
pub fn enu_vector_to_ecef(enu: Enu, origin: Geodetic) -> Vec3 {
    let sin_lat = origin.lat_rad.sin();
    let cos_lat = origin.lat_rad.cos();
    let sin_lon = origin.lon_rad.sin();
    let cos_lon = origin.lon_rad.cos();

    Vec3::new(
        -sin_lon * enu.east - sin_lat * cos_lon * enu.north + cos_lat * cos_lon * enu.up,
        cos_lon * enu.east - sin_lat * sin_lon * enu.north + cos_lat * sin_lon * enu.up,
        cos_lat * enu.north + sin_lat * enu.up,
    )
}
