// src/drm/ioctl.rs

//! Raw ABI for the kernel's legacy mode-setting interface.
//!
//! The payload structs here mirror the kernel's uapi layouts field for field:
//! identifiers are 32-bit, sizes and pointer-valued fields are 64-bit, and
//! userspace addresses travel in `u64` fields. None of these layouts may be
//! reordered or padded differently, or the ioctls stop round-tripping against
//! an unmodified kernel.

use bitflags::bitflags;

/// ioctl type byte shared by every mode-setting request.
pub const DRM_IOCTL_BASE: u8 = b'd';

/// Capability id for CPU-writable dumb buffers (`DRM_CAP_DUMB_BUFFER`).
pub const CAP_DUMB_BUFFER: u64 = 0x1;

/// `drm_connector_status`: the connector drives a sink and can be enabled.
pub const CONNECTOR_STATUS_CONNECTED: u32 = 1;

/// Length of the mode name field in `ModeInfo`.
pub const DISPLAY_MODE_LEN: usize = 32;

bitflags! {
    /// Mode `type` flags. Only the preferred bit matters to this appliance.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModeTypeFlags: u32 {
        const BUILTIN = 1 << 0;
        const CLOCK_C = (1 << 1) | (1 << 0);
        const CRTC_C = (1 << 2) | (1 << 0);
        const PREFERRED = 1 << 3;
        const DEFAULT = 1 << 4;
        const USERDEF = 1 << 5;
        const DRIVER = 1 << 6;
    }
}

/// `struct drm_get_cap`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct GetCap {
    pub capability: u64,
    pub value: u64,
}

/// `struct drm_mode_card_res`, the two-phase resource enumeration payload.
///
/// The four `*_ptr` fields hold userspace addresses of receive arrays; a
/// zeroed struct asks the kernel for counts only.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeCardRes {
    pub fb_id_ptr: u64,
    pub crtc_id_ptr: u64,
    pub connector_id_ptr: u64,
    pub encoder_id_ptr: u64,
    pub count_fbs: u32,
    pub count_crtcs: u32,
    pub count_connectors: u32,
    pub count_encoders: u32,
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
}

/// `struct drm_mode_modeinfo`: one display timing the connector can drive.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ModeInfo {
    pub clock: u32,
    pub hdisplay: u16,
    pub hsync_start: u16,
    pub hsync_end: u16,
    pub htotal: u16,
    pub hskew: u16,
    pub vdisplay: u16,
    pub vsync_start: u16,
    pub vsync_end: u16,
    pub vtotal: u16,
    pub vscan: u16,
    pub vrefresh: u32,
    pub flags: u32,
    pub type_: u32,
    pub name: [u8; DISPLAY_MODE_LEN],
}

impl Default for ModeInfo {
    fn default() -> Self {
        // [u8; 32] has no Default derive path; zero the whole record.
        unsafe { std::mem::zeroed() }
    }
}

impl ModeInfo {
    pub fn is_preferred(&self) -> bool {
        ModeTypeFlags::from_bits_truncate(self.type_).contains(ModeTypeFlags::PREFERRED)
    }

    /// Mode name as reported by the kernel, e.g. "640x480".
    pub fn name(&self) -> String {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(self.name.len());
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }
}

/// `struct drm_mode_get_connector`, the two-phase connector query payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeGetConnector {
    pub encoders_ptr: u64,
    pub modes_ptr: u64,
    pub props_ptr: u64,
    pub prop_values_ptr: u64,
    pub count_modes: u32,
    pub count_props: u32,
    pub count_encoders: u32,
    pub encoder_id: u32,
    pub connector_id: u32,
    pub connector_type: u32,
    pub connector_type_id: u32,
    pub connection: u32,
    pub mm_width: u32,
    pub mm_height: u32,
    pub subpixel: u32,
    pub pad: u32,
}

/// `struct drm_mode_create_dumb`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeCreateDumb {
    pub height: u32,
    pub width: u32,
    pub bpp: u32,
    pub flags: u32,
    pub handle: u32,
    pub pitch: u32,
    pub size: u64,
}

/// `struct drm_mode_fb_cmd` (legacy ADDFB).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeFbCmd {
    pub fb_id: u32,
    pub width: u32,
    pub height: u32,
    pub pitch: u32,
    pub bpp: u32,
    pub depth: u32,
    pub handle: u32,
}

/// `struct drm_mode_map_dumb`: turns a dumb-buffer handle into a fake mmap
/// offset token.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeMapDumb {
    pub handle: u32,
    pub pad: u32,
    pub offset: u64,
}

/// `struct drm_mode_destroy_dumb`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeDestroyDumb {
    pub handle: u32,
}

/// `struct drm_mode_crtc`, the legacy SETCRTC commit payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeCrtc {
    pub set_connectors_ptr: u64,
    pub count_connectors: u32,
    pub crtc_id: u32,
    pub fb_id: u32,
    pub x: u32,
    pub y: u32,
    pub gamma_size: u32,
    pub mode_valid: u32,
    pub mode: ModeInfo,
}

// Request codes, numbered per the kernel's drm.h command table.
nix::ioctl_readwrite!(drm_get_cap, DRM_IOCTL_BASE, 0x0c, GetCap);
nix::ioctl_readwrite!(drm_mode_get_resources, DRM_IOCTL_BASE, 0xa0, ModeCardRes);
nix::ioctl_readwrite!(drm_mode_set_crtc, DRM_IOCTL_BASE, 0xa2, ModeCrtc);
nix::ioctl_readwrite!(drm_mode_get_connector, DRM_IOCTL_BASE, 0xa7, ModeGetConnector);
nix::ioctl_readwrite!(drm_mode_add_fb, DRM_IOCTL_BASE, 0xae, ModeFbCmd);
nix::ioctl_readwrite!(drm_mode_rm_fb, DRM_IOCTL_BASE, 0xaf, libc::c_uint);
nix::ioctl_readwrite!(drm_mode_create_dumb, DRM_IOCTL_BASE, 0xb2, ModeCreateDumb);
nix::ioctl_readwrite!(drm_mode_map_dumb, DRM_IOCTL_BASE, 0xb3, ModeMapDumb);
nix::ioctl_readwrite!(drm_mode_destroy_dumb, DRM_IOCTL_BASE, 0xb4, ModeDestroyDumb);
