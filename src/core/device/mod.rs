pub mod device;
pub mod device_task;
pub mod kernel_data;

pub use device::*;
pub use device_task::*;
pub use kernel_data::*;
