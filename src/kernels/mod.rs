pub mod gradient;
pub mod noise;

pub use gradient::*;
pub use noise::*;
