// src/drm/mod.rs

//! Exclusive control of the card's legacy mode-setting interface: discover
//! the single connector/CRTC/encoder, negotiate the preferred mode, provision
//! a CPU-writable dumb buffer, and commit it to the screen.

pub mod device;
pub mod ioctl;
pub mod pipeline;
pub mod surface;


pub use device::DrmDevice;
pub use pipeline::DisplayPipeline;
pub use surface::{Rgb, Surface};
