// src/drm/pipeline.rs

//! The display pipeline: capability check, resource discovery, connector and
//! mode negotiation, dumb-buffer provisioning, and the commit that puts the
//! buffer on screen.
//!
//! Setup is a strictly ordered sequence of kernel requests; the first failure
//! aborts the whole sequence and tears down whatever was already acquired, in
//! reverse order of acquisition. The appliance drives exactly one connector,
//! one CRTC and one encoder; any other topology is rejected outright.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::fmt;
use thiserror::Error;

use super::device::ModeSetOps;
use super::ioctl::{
    ModeCardRes, ModeCrtc, ModeCreateDumb, ModeFbCmd, ModeGetConnector, ModeInfo, ModeMapDumb,
    CAP_DUMB_BUFFER, CONNECTOR_STATUS_CONNECTED,
};
use super::surface::Surface;

/// Typed failures of pipeline setup and presentation. Callers can downcast
/// the `anyhow` chain to this to tell topology problems from plain I/O ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("device does not support CPU-writable dumb buffers")]
    UnsupportedDevice,
    #[error(
        "unsupported topology: {connectors} connectors, {crtcs} CRTCs, {encoders} encoders \
         (need exactly 1 of each)"
    )]
    UnsupportedTopology {
        connectors: u32,
        crtcs: u32,
        encoders: u32,
    },
    #[error("kernel returned a zero resource identifier")]
    ResourceUnavailable,
    #[error("connector {connector_id} is not connected")]
    Disconnected { connector_id: u32 },
    #[error("connector reports no preferred mode")]
    NoPreferredMode,
    #[error("connector counts changed between the sizing and fill queries")]
    CountDrift,
    #[error("{0} allocation failed")]
    AllocationFailed(&'static str),
    #[error("mode-set commit failed")]
    CommitFailed,
}

/// The exactly-one connector/CRTC/encoder triple the card exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayResources {
    pub connector_id: u32,
    pub crtc_id: u32,
    pub encoder_id: u32,
}

/// Connector capabilities, filled by the two-phase query and kept for the
/// pipeline's lifetime. Property ids/values are retained but not interpreted.
#[derive(Debug)]
pub struct Connector {
    pub id: u32,
    pub modes: Vec<ModeInfo>,
    pub encoders: Vec<u32>,
    pub prop_ids: Vec<u32>,
    pub prop_values: Vec<u64>,
}

/// Kernel-side pixel storage descriptor.
#[derive(Debug, Clone, Copy)]
pub struct DumbBuffer {
    pub handle: u32,
    pub pitch: u32,
    pub size: u64,
}

/// What a caller needs to draw: dimensions and layout of the mapped buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub width: u32,
    pub height: u32,
    /// Bytes per row; may exceed `width * 4`.
    pub stride: u32,
    pub size: u64,
}

pub struct DisplayPipeline<D: ModeSetOps> {
    device: D,
    resources: Option<DisplayResources>,
    connector: Option<Connector>,
    mode: Option<ModeInfo>,
    dumb: Option<DumbBuffer>,
    fb_id: Option<u32>,
    surface: Option<Surface>,
    released: bool,
}

// The mapped surface has no useful Debug form; report the kernel-side state.
impl<D: ModeSetOps> fmt::Debug for DisplayPipeline<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayPipeline")
            .field("resources", &self.resources)
            .field("mode", &self.mode.as_ref().map(ModeInfo::name))
            .field("dumb", &self.dumb)
            .field("fb_id", &self.fb_id)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl<D: ModeSetOps> DisplayPipeline<D> {
    /// Runs the full setup sequence. On any failure the partially acquired
    /// resources are released before the error is returned.
    pub fn initialize(device: D) -> Result<Self> {
        let mut pipeline = Self {
            device,
            resources: None,
            connector: None,
            mode: None,
            dumb: None,
            fb_id: None,
            surface: None,
            released: false,
        };
        match pipeline.setup() {
            Ok(()) => Ok(pipeline),
            Err(e) => {
                pipeline.release();
                Err(e)
            }
        }
    }

    fn setup(&mut self) -> Result<()> {
        self.check_capability()?;
        let resources = self.discover_resources()?;
        info!(
            "Display resources: connector {}, CRTC {}, encoder {}",
            resources.connector_id, resources.crtc_id, resources.encoder_id
        );
        self.resources = Some(resources);

        let (connector, mode) = self.negotiate_connector(resources.connector_id)?;
        info!(
            "Connector {}: {} modes, {} encoders, {} props; using mode {} ({}x{}@{})",
            connector.id,
            connector.modes.len(),
            connector.encoders.len(),
            connector.prop_ids.len(),
            mode.name(),
            mode.hdisplay,
            mode.vdisplay,
            mode.vrefresh
        );
        self.connector = Some(connector);
        self.mode = Some(mode);

        self.provision_framebuffer(&mode)?;
        info!("Display pipeline ready");
        Ok(())
    }

    fn check_capability(&self) -> Result<()> {
        let value = self
            .device
            .get_cap(CAP_DUMB_BUFFER)
            .context("capability query failed")?;
        if value == 0 {
            return Err(PipelineError::UnsupportedDevice.into());
        }
        Ok(())
    }

    /// Two-pass resource enumeration. The first zeroed pass only reports
    /// counts and must reject anything but a 1/1/1 topology before any
    /// receive storage exists.
    fn discover_resources(&self) -> Result<DisplayResources> {
        let mut res = ModeCardRes::default();
        self.device
            .get_resources(&mut res)
            .context("resource count query failed")?;

        if res.count_connectors != 1 || res.count_crtcs != 1 || res.count_encoders != 1 {
            return Err(PipelineError::UnsupportedTopology {
                connectors: res.count_connectors,
                crtcs: res.count_crtcs,
                encoders: res.count_encoders,
            }
            .into());
        }

        let mut connector_id: u32 = 0;
        let mut crtc_id: u32 = 0;
        let mut encoder_id: u32 = 0;
        res.connector_id_ptr = &mut connector_id as *mut u32 as u64;
        res.crtc_id_ptr = &mut crtc_id as *mut u32 as u64;
        res.encoder_id_ptr = &mut encoder_id as *mut u32 as u64;
        self.device
            .get_resources(&mut res)
            .context("resource id query failed")?;

        if connector_id == 0 || crtc_id == 0 || encoder_id == 0 {
            return Err(PipelineError::ResourceUnavailable.into());
        }

        Ok(DisplayResources {
            connector_id,
            crtc_id,
            encoder_id,
        })
    }

    /// Two-phase connector query: learn the counts, allocate exactly-sized
    /// receive buffers, fill them. A count that moves between the phases is
    /// fatal; the hardware is assumed fixed, so no retry.
    fn negotiate_connector(&self, connector_id: u32) -> Result<(Connector, ModeInfo)> {
        // The sizing pass seeds count_modes with a single scratch slot.
        let mut scratch = ModeInfo::default();
        let mut query = ModeGetConnector {
            connector_id,
            count_modes: 1,
            modes_ptr: &mut scratch as *mut ModeInfo as u64,
            ..Default::default()
        };
        self.device
            .get_connector(&mut query)
            .context("connector sizing query failed")?;

        let mut connector = Connector {
            id: connector_id,
            modes: vec![ModeInfo::default(); query.count_modes as usize],
            encoders: vec![0u32; query.count_encoders as usize],
            prop_ids: vec![0u32; query.count_props as usize],
            prop_values: vec![0u64; query.count_props as usize],
        };

        let mut fill = ModeGetConnector {
            connector_id,
            count_modes: connector.modes.len() as u32,
            count_encoders: connector.encoders.len() as u32,
            count_props: connector.prop_ids.len() as u32,
            modes_ptr: connector.modes.as_mut_ptr() as u64,
            encoders_ptr: connector.encoders.as_mut_ptr() as u64,
            props_ptr: connector.prop_ids.as_mut_ptr() as u64,
            prop_values_ptr: connector.prop_values.as_mut_ptr() as u64,
            ..Default::default()
        };
        self.device
            .get_connector(&mut fill)
            .context("connector fill query failed")?;

        if fill.count_modes as usize != connector.modes.len()
            || fill.count_encoders as usize != connector.encoders.len()
            || fill.count_props as usize != connector.prop_ids.len()
        {
            return Err(PipelineError::CountDrift.into());
        }

        if fill.connection != CONNECTOR_STATUS_CONNECTED {
            return Err(PipelineError::Disconnected { connector_id }.into());
        }

        let mode = connector
            .modes
            .iter()
            .find(|m| m.is_preferred())
            .copied()
            .ok_or(PipelineError::NoPreferredMode)?;

        Ok((connector, mode))
    }

    /// Dumb buffer, framebuffer object, mapping, zero-fill. Each request can
    /// fail on its own; the caller's teardown copes with whatever subset
    /// already exists.
    fn provision_framebuffer(&mut self, mode: &ModeInfo) -> Result<()> {
        let mut create = ModeCreateDumb {
            width: mode.hdisplay as u32,
            height: mode.vdisplay as u32,
            bpp: 32,
            ..Default::default()
        };
        self.device
            .create_dumb(&mut create)
            .context(PipelineError::AllocationFailed("dumb buffer"))?;
        let dumb = DumbBuffer {
            handle: create.handle,
            pitch: create.pitch,
            size: create.size,
        };
        debug!(
            "Dumb buffer: handle {}, pitch {}, size {}",
            dumb.handle, dumb.pitch, dumb.size
        );
        self.dumb = Some(dumb);

        let mut fb = ModeFbCmd {
            width: mode.hdisplay as u32,
            height: mode.vdisplay as u32,
            pitch: dumb.pitch,
            bpp: 32,
            depth: 24,
            handle: dumb.handle,
            ..Default::default()
        };
        self.device
            .add_fb(&mut fb)
            .context(PipelineError::AllocationFailed("framebuffer object"))?;
        debug!("Framebuffer id: {}", fb.fb_id);
        self.fb_id = Some(fb.fb_id);

        let mut map = ModeMapDumb {
            handle: dumb.handle,
            ..Default::default()
        };
        self.device
            .map_dumb(&mut map)
            .context(PipelineError::AllocationFailed("map token"))?;
        let ptr = self
            .device
            .map_pixels(dumb.size as usize, map.offset)
            .context(PipelineError::AllocationFailed("pixel mapping"))?;

        // The mapping is exclusively ours from here on.
        let mut surface = unsafe {
            Surface::from_mapping(
                ptr,
                mode.hdisplay as u32,
                mode.vdisplay as u32,
                dumb.pitch,
                dumb.size as usize,
            )
        };
        surface.clear();
        self.surface = Some(surface);
        Ok(())
    }

    pub fn frame_info(&self) -> Result<FrameInfo> {
        let mode = self.mode.context("frame_info() on uninitialized pipeline")?;
        let dumb = self.dumb.context("frame_info() before provisioning")?;
        Ok(FrameInfo {
            width: mode.hdisplay as u32,
            height: mode.vdisplay as u32,
            stride: dumb.pitch,
            size: dumb.size,
        })
    }

    pub fn surface_mut(&mut self) -> Result<&mut Surface> {
        self.surface
            .as_mut()
            .context("surface_mut() before provisioning")
    }

    /// One blocking commit binding connector, CRTC, framebuffer and mode.
    /// There is no partial-commit or rollback; a failure leaves the screen
    /// contents unspecified and is surfaced to the caller.
    pub fn present(&mut self) -> Result<()> {
        let resources = self.resources.context("present() on uninitialized pipeline")?;
        let mode = self.mode.context("present() before mode negotiation")?;
        let fb_id = self.fb_id.context("present() before provisioning")?;

        let mut connector_id = resources.connector_id;
        let mut crtc = ModeCrtc {
            set_connectors_ptr: &mut connector_id as *mut u32 as u64,
            count_connectors: 1,
            crtc_id: resources.crtc_id,
            fb_id,
            x: 0,
            y: 0,
            mode_valid: 1,
            mode,
            ..Default::default()
        };
        self.device
            .set_crtc(&mut crtc)
            .context(PipelineError::CommitFailed)?;
        Ok(())
    }

    /// Reverse-order release. Failures are logged and swallowed; teardown
    /// always runs to completion and the device fd closes after everything
    /// else. Safe on a pipeline that never finished setup.
    pub fn shutdown(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        self.connector = None;
        self.surface = None;

        if let Some(fb_id) = self.fb_id.take() {
            if let Err(e) = self.device.rm_fb(fb_id) {
                warn!("Failed to remove framebuffer {}: {:#}", fb_id, e);
            }
        }
        if let Some(dumb) = self.dumb.take() {
            if let Err(e) = self.device.destroy_dumb(dumb.handle) {
                warn!("Failed to destroy dumb buffer {}: {:#}", dumb.handle, e);
            }
        }
        // `self.device` drops with the pipeline, closing the card fd last.
    }
}

impl<D: ModeSetOps> Drop for DisplayPipeline<D> {
    fn drop(&mut self) {
        self.release();
    }
}
