// src/util.rs

//! Crash path and entropy source.
//!
//! The appliance's answer to a programmer error or an unrecoverable fault is
//! a diagnostic followed by a device restart; there is nothing to fall back
//! to on a single-purpose box.

use anyhow::{ensure, Context, Result};
use log::error;
use std::fmt::Display;
use std::io::Read;
use std::thread;
use std::time::Duration;

use nix::sys::reboot::{reboot, RebootMode};

const CRASH_DELAY: Duration = Duration::from_secs(5);

/// Logs the diagnostic, waits long enough for it to reach the console, and
/// restarts the device. When the restart request is denied (running outside
/// the appliance, e.g. under a development shell), exits instead.
pub fn crash(msg: impl Display) -> ! {
    error!("crash: {msg}");
    error!("Restarting in {} seconds...", CRASH_DELAY.as_secs());
    thread::sleep(CRASH_DELAY);
    restart();
}

/// Requests a device restart; falls back to a plain exit when not PID 1.
pub fn restart() -> ! {
    // reboot() only ever returns an error; success does not return.
    let Err(e) = reboot(RebootMode::RB_AUTOBOOT);
    error!("Restart request failed ({e}), exiting");
    std::process::exit(1);
}

/// Routes panics through the crash path so a violated precondition restarts
/// the device instead of leaving a wedged screen.
pub fn install_crash_hook() {
    std::panic::set_hook(Box::new(|info| {
        crash(format_args!("panic: {info}"));
    }));
}

/// Uniform draw from `[min, max)`, seeded from the system entropy pool.
pub fn random_range(min: i64, max: i64) -> Result<i64> {
    ensure!(min < max, "empty range [{min}, {max})");
    let mut file =
        std::fs::File::open("/dev/urandom").context("Cannot open /dev/urandom")?;
    let mut bytes = [0u8; 8];
    file.read_exact(&mut bytes)
        .context("Short read from /dev/urandom")?;
    let raw = u64::from_ne_bytes(bytes);
    Ok(min + (raw % (max - min) as u64) as i64)
}
