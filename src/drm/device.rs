// src/drm/device.rs

use anyhow::{Context, Result};
use log::{debug, info};
use std::fs::OpenOptions;
use std::num::NonZeroUsize;
use std::os::fd::{AsFd, AsRawFd, OwnedFd};
use std::path::Path;
use std::ptr::NonNull;

use nix::sys::mman::{mmap, MapFlags, ProtFlags};

use super::ioctl::{
    self, GetCap, ModeCardRes, ModeCreateDumb, ModeCrtc, ModeDestroyDumb, ModeFbCmd,
    ModeGetConnector, ModeMapDumb,
};

/// The legacy mode-setting control vocabulary, one method per kernel request.
///
/// `DrmDevice` implements this against the real card node; tests implement it
/// with a simulated device. The pipeline in `drm::pipeline` is written against
/// this trait only.
pub trait ModeSetOps {
    fn get_cap(&self, capability: u64) -> Result<u64>;
    fn get_resources(&self, res: &mut ModeCardRes) -> Result<()>;
    fn get_connector(&self, conn: &mut ModeGetConnector) -> Result<()>;
    fn create_dumb(&self, req: &mut ModeCreateDumb) -> Result<()>;
    fn add_fb(&self, cmd: &mut ModeFbCmd) -> Result<()>;
    fn map_dumb(&self, req: &mut ModeMapDumb) -> Result<()>;
    fn set_crtc(&self, crtc: &mut ModeCrtc) -> Result<()>;
    fn rm_fb(&self, fb_id: u32) -> Result<()>;
    fn destroy_dumb(&self, handle: u32) -> Result<()>;

    /// Maps `size` bytes of the device's pixel storage at `offset` (the token
    /// handed back by `map_dumb`) into the process, read-write and shared.
    fn map_pixels(&self, size: usize, offset: u64) -> Result<NonNull<u8>>;
}

/// Owns the card-node file descriptor. The fd is held as an `OwnedFd`, so a
/// request against a closed handle is unrepresentable and the close runs
/// exactly once, after every other pipeline resource is released.
#[derive(Debug)]
pub struct DrmDevice {
    fd: OwnedFd,
}

impl DrmDevice {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .with_context(|| format!("Cannot open card node {}", path.display()))?;
        info!("Opened card node {} (fd {})", path.display(), file.as_raw_fd());
        Ok(Self { fd: file.into() })
    }
}

impl AsRawFd for DrmDevice {
    fn as_raw_fd(&self) -> std::os::fd::RawFd {
        self.fd.as_raw_fd()
    }
}

impl ModeSetOps for DrmDevice {
    fn get_cap(&self, capability: u64) -> Result<u64> {
        let mut cap = GetCap {
            capability,
            ..Default::default()
        };
        unsafe { ioctl::drm_get_cap(self.fd.as_raw_fd(), &mut cap) }
            .with_context(|| format!("ioctl GET_CAP({:#x}) failed", capability))?;
        Ok(cap.value)
    }

    fn get_resources(&self, res: &mut ModeCardRes) -> Result<()> {
        unsafe { ioctl::drm_mode_get_resources(self.fd.as_raw_fd(), res) }
            .context("ioctl MODE_GETRESOURCES failed")?;
        Ok(())
    }

    fn get_connector(&self, conn: &mut ModeGetConnector) -> Result<()> {
        unsafe { ioctl::drm_mode_get_connector(self.fd.as_raw_fd(), conn) }
            .with_context(|| format!("ioctl MODE_GETCONNECTOR({}) failed", conn.connector_id))?;
        Ok(())
    }

    fn create_dumb(&self, req: &mut ModeCreateDumb) -> Result<()> {
        unsafe { ioctl::drm_mode_create_dumb(self.fd.as_raw_fd(), req) }
            .with_context(|| format!("ioctl MODE_CREATE_DUMB {}x{} failed", req.width, req.height))?;
        Ok(())
    }

    fn add_fb(&self, cmd: &mut ModeFbCmd) -> Result<()> {
        unsafe { ioctl::drm_mode_add_fb(self.fd.as_raw_fd(), cmd) }
            .context("ioctl MODE_ADDFB failed")?;
        Ok(())
    }

    fn map_dumb(&self, req: &mut ModeMapDumb) -> Result<()> {
        unsafe { ioctl::drm_mode_map_dumb(self.fd.as_raw_fd(), req) }
            .with_context(|| format!("ioctl MODE_MAP_DUMB(handle {}) failed", req.handle))?;
        Ok(())
    }

    fn set_crtc(&self, crtc: &mut ModeCrtc) -> Result<()> {
        unsafe { ioctl::drm_mode_set_crtc(self.fd.as_raw_fd(), crtc) }
            .with_context(|| format!("ioctl MODE_SETCRTC(crtc {}) failed", crtc.crtc_id))?;
        Ok(())
    }

    fn rm_fb(&self, fb_id: u32) -> Result<()> {
        let mut id: libc::c_uint = fb_id;
        unsafe { ioctl::drm_mode_rm_fb(self.fd.as_raw_fd(), &mut id) }
            .with_context(|| format!("ioctl MODE_RMFB({fb_id}) failed"))?;
        Ok(())
    }

    fn destroy_dumb(&self, handle: u32) -> Result<()> {
        let mut req = ModeDestroyDumb { handle };
        unsafe { ioctl::drm_mode_destroy_dumb(self.fd.as_raw_fd(), &mut req) }
            .with_context(|| format!("ioctl MODE_DESTROY_DUMB({handle}) failed"))?;
        Ok(())
    }

    fn map_pixels(&self, size: usize, offset: u64) -> Result<NonNull<u8>> {
        let len = NonZeroUsize::new(size).context("Refusing to map a zero-sized dumb buffer")?;
        let ptr = unsafe {
            mmap(
                None,
                len,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                self.fd.as_fd(),
                offset as libc::off_t,
            )
        }
        .with_context(|| format!("mmap of {size} bytes at offset {offset:#x} failed"))?;
        debug!("Mapped dumb buffer: {} bytes at {:p}", size, ptr.as_ptr());
        Ok(ptr.cast())
    }
}
