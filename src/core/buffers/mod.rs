pub mod buffer_params;
pub mod display_buffer;
pub mod render_buffers;
pub mod render_tile;

pub use buffer_params::*;
pub use display_buffer::*;
pub use render_buffers::*;
pub use render_tile::*;
