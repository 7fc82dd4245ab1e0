pub mod ecef;
pub mod geodesy;
pub mod local;
pub mod precision;
pub mod projection;
pub mod vec;

pub use ecef::*;
pub use geodesy::*;
pub use local::*;
pub use precision::*;
pub use projection::*;
pub use vec::*;
