// src/main.rs

mod config;
mod drm;
mod input;
mod shell;
mod snake;
mod util;
mod vt;

use anyhow::{Context, Result};
use log::{info, warn};
use nix::mount::{mount, MsFlags};

/// The virtual filesystems a bare appliance needs before anything else runs.
const MOUNTS: &[(&str, &str, &str)] = &[
    ("devtmpfs", "/dev", "devtmpfs"),
    ("sysfs", "/sys", "sysfs"),
    ("proc", "/proc", "proc"),
    ("tmpfs", "/tmp", "tmpfs"),
];

fn mount_filesystems() -> Result<()> {
    for &(source, target, fstype) in MOUNTS {
        match mount(
            Some(source),
            target,
            Some(fstype),
            MsFlags::empty(),
            None::<&str>,
        ) {
            Ok(()) => info!("Mounted {fstype} on {target}"),
            // Already mounted: fine when re-entered from a restart loop.
            Err(nix::errno::Errno::EBUSY) => warn!("{target} is already mounted"),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to mount {fstype} on {target}"))
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();
    util::install_crash_hook();

    info!("-- Starting snakebox --");

    if let Err(e) = mount_filesystems() {
        util::crash(format_args!("{e:#}"));
    }

    shell::run();

    info!("Shell exited, restarting device");
    util::restart();
}
