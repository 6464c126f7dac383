pub mod cpu;
pub mod multi;

pub use cpu::*;
pub use multi::*;
