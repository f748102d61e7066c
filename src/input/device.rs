// src/input/device.rs

use anyhow::{ensure, Context, Result};
use log::{info, trace};
use std::fs::OpenOptions;
use std::mem;
use std::os::fd::{AsFd, AsRawFd, OwnedFd};
use std::path::Path;

use nix::poll::{poll, PollFd, PollFlags, PollTimeout};

use super::keys::event_type_name;

/// One decoded record from the event stream. Mirrors the kernel's fixed-size
/// `input_event` layout: timestamp, type, code, value.
#[derive(Debug, Clone, Copy)]
pub struct InputEvent {
    pub seconds: i64,
    pub microseconds: i64,
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

/// Anything that can be drained for input events once per tick. The keyboard
/// state machine is written against this, so tests can feed scripted events.
pub trait EventSource {
    /// Zero-timeout poll: `Ok(None)` when nothing is pending (the normal
    /// outcome, never an error), `Err` only on a genuine read failure.
    fn poll_event(&mut self) -> Result<Option<InputEvent>>;
}

/// Owns the read-only fd of a character event device.
#[derive(Debug)]
pub struct EvdevDevice {
    fd: OwnedFd,
}

impl EvdevDevice {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .with_context(|| format!("Cannot open input device {}", path.display()))?;
        info!("Opened input device {} (fd {})", path.display(), file.as_raw_fd());
        Ok(Self { fd: file.into() })
    }
}

impl EventSource for EvdevDevice {
    fn poll_event(&mut self) -> Result<Option<InputEvent>> {
        let mut fds = [PollFd::new(self.fd.as_fd(), PollFlags::POLLIN)];
        let ready = poll(&mut fds, PollTimeout::ZERO).context("poll on input device failed")?;
        if ready == 0 {
            return Ok(None);
        }

        let mut raw: libc::input_event = unsafe { mem::zeroed() };
        let buf = unsafe {
            std::slice::from_raw_parts_mut(
                &mut raw as *mut libc::input_event as *mut u8,
                mem::size_of::<libc::input_event>(),
            )
        };
        let bytes = nix::unistd::read(&self.fd, buf).context("read from input device failed")?;
        ensure!(
            bytes == mem::size_of::<libc::input_event>(),
            "short read from input device: {} of {} bytes",
            bytes,
            mem::size_of::<libc::input_event>()
        );

        let event = InputEvent {
            seconds: raw.time.tv_sec as i64,
            microseconds: raw.time.tv_usec as i64,
            kind: raw.type_,
            code: raw.code,
            value: raw.value,
        };
        trace!(
            "Input event at {}.{:06}: {} code {} value {}",
            event.seconds,
            event.microseconds,
            event_type_name(event.kind),
            event.code,
            event.value
        );
        Ok(Some(event))
    }
}
