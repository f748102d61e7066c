// src/input/mod.rs

//! Raw keyboard state sampled from a character-device event stream:
//! non-blocking poll-and-decode plus the per-key two-frame state machine.

pub mod device;
pub mod keyboard;
pub mod keys;

#[cfg(test)]
mod tests;

pub use device::{EvdevDevice, EventSource};
pub use keyboard::Keyboard;
