// src/drm/surface.rs

//! CPU-side view of the scanout buffer.
//!
//! `Surface` is the only way pixels get written. It owns its region for the
//! pipeline's lifetime and exposes bounds-checked writes only; coordinates
//! wrap modulo the surface dimensions, so no write can land outside the
//! mapping even when a caller draws across an edge.

use std::ptr::NonNull;

/// One packed pixel. The scanout format is 32 bits per pixel with the value
/// laid out as `0x00RRGGBB`; consumers drawing into the buffer depend on this
/// exact channel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn packed(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }
}

enum Backing {
    /// Kernel mapping. Released by process exit; no explicit unmap is modeled.
    Mapped,
    /// Heap memory, used by tests that exercise drawing without a device.
    #[cfg(test)]
    Owned(#[allow(dead_code)] Box<[u8]>),
}

pub struct Surface {
    ptr: NonNull<u8>,
    width: usize,
    height: usize,
    pitch: usize,
    len: usize,
    _backing: Backing,
}

impl Surface {
    /// Wraps a mapped dumb buffer.
    ///
    /// # Safety
    /// `ptr` must point to at least `len` writable bytes that stay valid and
    /// unaliased for the surface's lifetime, with `pitch * height <= len`.
    pub(crate) unsafe fn from_mapping(
        ptr: NonNull<u8>,
        width: u32,
        height: u32,
        pitch: u32,
        len: usize,
    ) -> Self {
        debug_assert!(pitch as usize * height as usize <= len);
        Self {
            ptr,
            width: width as usize,
            height: height as usize,
            pitch: pitch as usize,
            len,
            _backing: Backing::Mapped,
        }
    }

    /// Heap-backed surface with the same write semantics as a mapping.
    #[cfg(test)]
    pub(crate) fn with_owned(width: u32, height: u32, pitch: u32) -> Self {
        let len = pitch as usize * height as usize;
        let mut storage = vec![0u8; len].into_boxed_slice();
        let ptr = NonNull::new(storage.as_mut_ptr()).unwrap();
        Self {
            ptr,
            width: width as usize,
            height: height as usize,
            pitch: pitch as usize,
            len,
            _backing: Backing::Owned(storage),
        }
    }

    #[allow(dead_code)]
    pub fn width(&self) -> usize {
        self.width
    }

    #[allow(dead_code)]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes per row, including any alignment slack past `width * 4`.
    #[allow(dead_code)]
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    /// Writes one pixel. Coordinates wrap modulo the surface dimensions.
    pub fn put(&mut self, x: i64, y: i64, color: Rgb) {
        let x = x.rem_euclid(self.width as i64) as usize;
        let y = y.rem_euclid(self.height as i64) as usize;
        let offset = y * self.pitch + x * 4;
        // In-bounds by construction: x < width, y < height, pitch*height <= len.
        unsafe {
            self.ptr
                .as_ptr()
                .add(offset)
                .cast::<u32>()
                .write_unaligned(color.packed());
        }
    }

    /// Fills a rectangle, wrapping pixels that fall past an edge.
    pub fn fill_rect(&mut self, x: i64, y: i64, w: i64, h: i64, color: Rgb) {
        for row in y..y + h {
            for col in x..x + w {
                self.put(col, row, color);
            }
        }
    }

    /// Zeroes the whole buffer, pitch slack included.
    pub fn clear(&mut self) {
        unsafe { std::ptr::write_bytes(self.ptr.as_ptr(), 0, self.len) };
    }

    /// Raw readback, used by drawing tests.
    #[cfg(test)]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

// The surface is written by the single thread driving the render loop.
unsafe impl Send for Surface {}
