pub mod buffers;
pub mod device;
pub mod display;
pub mod error;
pub mod geometry;
pub mod imageio;
pub mod kernel;
pub mod misc;
pub mod prelude;
pub mod progress;
pub mod rng;
pub mod scene;
pub mod session;
pub mod tile;
