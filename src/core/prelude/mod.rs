pub use super::buffers::*;
pub use super::device::*;
pub use super::display::*;
pub use super::error::*;
pub use super::geometry::*;
pub use super::imageio::*;
pub use super::kernel::*;
pub use super::misc::*;
pub use super::progress::*;
pub use super::rng::*;
pub use super::scene::*;
pub use super::session::*;
pub use super::tile::*;
