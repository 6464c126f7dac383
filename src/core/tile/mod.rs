pub mod tile;
pub mod tile_manager;
pub mod tile_order;

pub use tile::*;
pub use tile_manager::*;
pub use tile_order::*;
