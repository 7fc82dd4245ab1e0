use serde::{Deserialize, Serialize};

/// Compass sector an oblique camera faces, or a navigation direction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinal {
    #[serde(alias = "N")]
    North,
    #[serde(alias = "E")]
    East,
    #[serde(alias = "S")]
    South,
    #[serde(alias = "W")]
    West,
}

impl Cardinal {
    /// Clockwise from north.
    pub const ALL: [Cardinal; 4] = [
        Cardinal::North,
        Cardinal::East,
        Cardinal::South,
        Cardinal::West,
    ];

    /// Dense index in `ALL` order, for per-sector arrays.
    pub fn index(self) -> usize {
        match self {
            Cardinal::North => 0,
            Cardinal::East => 1,
            Cardinal::South => 2,
            Cardinal::West => 3,
        }
    }

    pub fn heading_deg(self) -> f64 {
        match self {
            Cardinal::North => 0.0,
            Cardinal::East => 90.0,
            Cardinal::South => 180.0,
            Cardinal::West => 270.0,
        }
    }

    /// Sector containing `heading_deg` (clockwise from north).
    ///
    /// Sectors are 90° wide and centred on their heading. A heading exactly on
    /// a boundary belongs to the clockwise-next sector: 45° is east, 315° is
    /// north. Non-finite headings resolve to north.
    pub fn from_heading_deg(heading_deg: f64) -> Cardinal {
        let h = normalize_heading_deg(heading_deg);
        if h < 45.0 {
            Cardinal::North
        } else if h < 135.0 {
            Cardinal::East
        } else if h < 225.0 {
            Cardinal::South
        } else if h < 315.0 {
            Cardinal::West
        } else {
            Cardinal::North
        }
    }

    pub fn opposite(self) -> Cardinal {
        match self {
            Cardinal::North => Cardinal::South,
            Cardinal::East => Cardinal::West,
            Cardinal::South => Cardinal::North,
            Cardinal::West => Cardinal::East,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Cardinal::North => "north",
            Cardinal::East => "east",
            Cardinal::South => "south",
            Cardinal::West => "west",
        }
    }
}

impl std::fmt::Display for Cardinal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wraps a heading into `[0, 360)`. Non-finite input maps to 0.
pub fn normalize_heading_deg(heading_deg: f64) -> f64 {
    if !heading_deg.is_finite() {
        return 0.0;
    }
    let h = heading_deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if h >= 360.0 { 0.0 } else { h }
}

/// Compass bearing (degrees clockwise from grid north) from `dx`/`dy` offsets.
pub fn bearing_deg(dx: f64, dy: f64) -> f64 {
    normalize_heading_deg(dx.atan2(dy).to_degrees())
}
