use foundation::math::ProjectionError;

/// Raw pose entry that could not be turned into a basic record.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    MalformedId { id: String, reason: &'static str },
    NotAnArray { id: String },
    WrongLength { id: String, len: usize },
    NonNumericPosition { id: String, axis: usize },
    NonNumericMatrix { id: String, row: usize, col: usize },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MalformedId { id, reason } => write!(f, "malformed image id {id:?}: {reason}"),
            ParseError::NotAnArray { id } => write!(f, "pose for {id:?} is not an array"),
            ParseError::WrongLength { id, len } => {
                write!(f, "pose for {id:?} has {len} entries, expected 6 or 12")
            }
            ParseError::NonNumericPosition { id, axis } => {
                write!(f, "pose for {id:?} has non-numeric position axis {axis}")
            }
            ParseError::NonNumericMatrix { id, row, col } => {
                write!(f, "pose for {id:?} has non-numeric rotation entry ({row},{col})")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Basic record that could not be enriched into an image record.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtendError {
    UnknownCamera { id: String, camera_id: String, odd_line: bool },
    Projection { id: String, source: ProjectionError },
}

impl std::fmt::Display for ExtendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtendError::UnknownCamera {
                id,
                camera_id,
                odd_line,
            } => {
                let parity = if *odd_line { "odd" } else { "even" };
                write!(
                    f,
                    "no sector for camera {camera_id:?} on {parity} line (image {id:?})"
                )
            }
            ExtendError::Projection { id, source } => {
                write!(f, "projection failed for image {id:?}: {source}")
            }
        }
    }
}

impl std::error::Error for ExtendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtendError::Projection { source, .. } => Some(source),
            ExtendError::UnknownCamera { .. } => None,
        }
    }
}

/// Footprint feature that could not be turned into a centerpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum FootprintError {
    NotAFeatureCollection,
    InvalidFeature { index: usize, reason: String },
    WrongRingLength { id: String, len: usize },
    DegenerateQuad { id: String },
    Projection { id: String, source: ProjectionError },
}

impl std::fmt::Display for FootprintError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FootprintError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
            FootprintError::InvalidFeature { index, reason } => {
                write!(f, "invalid footprint feature at index {index}: {reason}")
            }
            FootprintError::WrongRingLength { id, len } => {
                write!(f, "footprint {id:?} ring has {len} coordinates, expected 5")
            }
            FootprintError::DegenerateQuad { id } => {
                write!(f, "footprint {id:?} diagonals do not intersect")
            }
            FootprintError::Projection { id, source } => {
                write!(f, "projection failed for footprint {id:?}: {source}")
            }
        }
    }
}

impl std::error::Error for FootprintError {}

#[derive(Debug, Clone, PartialEq)]
pub enum ExteriorOrientationError {
    InvalidUpAxis { row: usize },
    DegenerateRotation { id: String },
    Projection { id: String, source: ProjectionError },
}

impl std::fmt::Display for ExteriorOrientationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExteriorOrientationError::InvalidUpAxis { row } => {
                write!(f, "up axis row {row} out of range (0..3)")
            }
            ExteriorOrientationError::DegenerateRotation { id } => {
                write!(f, "rotation matrix of image {id:?} has non-finite rows")
            }
            ExteriorOrientationError::Projection { id, source } => {
                write!(f, "projection failed for image {id:?}: {source}")
            }
        }
    }
}

impl std::error::Error for ExteriorOrientationError {}

#[derive(Debug)]
pub enum ConfigError {
    Decode(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Decode(e) => write!(f, "config decode failed: {e}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Decode(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Decode(e)
    }
}
