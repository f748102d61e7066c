// src/vt.rs

//! Console redirection as an owned scope.
//!
//! While the game holds the display, kernel console output is pushed to a
//! serial tty and stdin is rebound to it, so the framebuffer isn't scribbled
//! over by log traffic. The redirection is process-global kernel state, so it
//! is modeled as a guard: acquiring it points the console at the game tty,
//! dropping it points the console back at the shell tty.

use anyhow::{Context, Result};
use log::{info, warn};
use std::fs::OpenOptions;
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

pub struct ConsoleRedirect {
    restore: PathBuf,
}

impl ConsoleRedirect {
    pub fn acquire<P: AsRef<Path>>(target: P, restore: P) -> Result<Self> {
        redirect_to(target.as_ref())?;
        Ok(Self {
            restore: restore.as_ref().to_path_buf(),
        })
    }
}

impl Drop for ConsoleRedirect {
    fn drop(&mut self) {
        if let Err(e) = redirect_to(&self.restore) {
            warn!("Failed to restore console to {}: {:#}", self.restore.display(), e);
        }
    }
}

fn redirect_to(path: &Path) -> Result<()> {
    info!("Switching console to {}", path.display());

    let tty = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .with_context(|| format!("Cannot open tty {}", path.display()))?;
    let raw_fd = tty.as_raw_fd();

    // Raw ioctl: nix has no wrapper for the console-redirect request.
    if unsafe { libc::ioctl(raw_fd, libc::TIOCCONS as _, 1) } == -1 {
        return Err(anyhow::Error::from(std::io::Error::last_os_error()))
            .with_context(|| format!("ioctl TIOCCONS on {} failed", path.display()));
    }

    if unsafe { libc::dup2(raw_fd, libc::STDIN_FILENO) } == -1 {
        return Err(anyhow::Error::from(std::io::Error::last_os_error()))
            .with_context(|| format!("dup2 of {} onto stdin failed", path.display()));
    }

    Ok(())
}
