pub mod multi_device;

pub use multi_device::*;
