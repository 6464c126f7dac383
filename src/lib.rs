pub mod core;
pub mod devices;
pub mod kernels;
