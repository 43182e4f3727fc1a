//! Headless image back-end: explicit-density offscreen buffers.

use cairo::{Context, ImageSurface};

use super::Backend;
use crate::error::DrawError;
use crate::register;

/// Back-end for plain offscreen raster images.
///
/// No display is ever attached: density is whatever the caller asks for,
/// drawing needs no focus handshake, and contexts are y-down by default.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageBackend;

impl ImageBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for ImageBackend {
    fn display_density(&self) -> Option<f64> {
        None
    }

    fn default_flipped(&self) -> bool {
        true
    }

    fn display_scaled_buffers(&self) -> bool {
        false
    }

    fn requires_focus(&self) -> bool {
        false
    }

    fn allocate(
        &self,
        width_px: i32,
        height_px: i32,
        opaque: bool,
    ) -> Result<ImageSurface, DrawError> {
        super::allocate_image_surface(width_px, height_px, opaque)
    }

    fn current(&self) -> Option<Context> {
        register::current()
    }

    fn replace_current(&self, next: Option<Context>) -> Option<Context> {
        register::replace(next)
    }
}
