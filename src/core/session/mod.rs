pub mod delayed_reset;
pub mod pause_gate;
pub mod run_loop;
pub mod session;
pub mod session_core;
pub mod session_params;
pub mod session_state;
pub mod status;
pub mod tile_callbacks;

pub use delayed_reset::*;
pub use pause_gate::*;
pub use session::*;
pub use session_core::{UpdateRenderTileCallback, WriteRenderTileCallback};
pub use session_params::*;
pub use session_state::*;
