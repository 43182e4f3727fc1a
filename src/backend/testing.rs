//! Test back-end with a private register and settable display density.

use std::cell::RefCell;

use cairo::{Context, ImageSurface};

use super::Backend;
use crate::error::DrawError;

/// In-memory back-end for asserting scope discipline without a real display.
///
/// Unlike the built-in back-ends it owns its own current-context register,
/// so tests never observe each other's state.
pub(crate) struct FakeBackend {
    density: Option<f64>,
    flipped: bool,
    display_scaled: bool,
    focus: bool,
    register: RefCell<Option<Context>>,
}

impl FakeBackend {
    /// No display attached; explicit-density family (no focus, y-down).
    pub(crate) fn headless() -> Self {
        Self {
            density: None,
            flipped: true,
            display_scaled: false,
            focus: false,
            register: RefCell::new(None),
        }
    }

    /// Display attached at the given density; display-scaled family with a
    /// focus handshake and y-up default orientation.
    pub(crate) fn with_density(density: f64) -> Self {
        Self {
            density: Some(density),
            flipped: false,
            display_scaled: true,
            focus: true,
            register: RefCell::new(None),
        }
    }
}

impl Backend for FakeBackend {
    fn display_density(&self) -> Option<f64> {
        self.density
    }

    fn default_flipped(&self) -> bool {
        self.flipped
    }

    fn display_scaled_buffers(&self) -> bool {
        self.display_scaled
    }

    fn requires_focus(&self) -> bool {
        self.focus
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
        self.register.borrow().clone()
    }

    fn replace_current(&self, next: Option<Context>) -> Option<Context> {
        self.register.replace(next)
    }
}
