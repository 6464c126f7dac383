pub mod bounds2;
pub mod vector2;

pub use bounds2::*;
pub use vector2::*;
