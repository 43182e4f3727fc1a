//! Drawing back-end capability interface and build-time selection.

use cairo::{Context, Format, ImageSurface};

use crate::error::DrawError;

pub mod image;
pub mod screen;
#[cfg(test)]
pub(crate) mod testing;

pub use image::ImageBackend;
pub use screen::ScreenBackend;

/// Capabilities a drawing back-end provides to the context core.
///
/// Both shipped implementations materialize buffers as Cairo image surfaces
/// and hand out plain [`cairo::Context`] handles; they differ in where
/// density comes from, whether buffers are display-scaled, the default
/// coordinate orientation, and whether drawing into a surface requires an
/// explicit focus handshake.
pub trait Backend {
    /// Native density of the attached display, in device pixels per point.
    ///
    /// `None` when no display can be found; scale resolution then falls back
    /// to 1:1 with a diagnostic.
    fn display_density(&self) -> Option<f64>;

    /// Default Y-axis orientation for drawing operations. `true` means the
    /// axis is flipped so positive is downward.
    fn default_flipped(&self) -> bool;

    /// Whether surface buffers are always allocated at the display's native
    /// density, so logical sizes must be pre-adjusted for other scales.
    fn display_scaled_buffers(&self) -> bool;

    /// Whether a surface must hold drawing focus before it can be drawn into.
    fn requires_focus(&self) -> bool;

    /// Allocates an offscreen pixel buffer.
    ///
    /// Opaque buffers discard the alpha channel for storage efficiency;
    /// non-opaque buffers preserve per-pixel alpha.
    fn allocate(
        &self,
        width_px: i32,
        height_px: i32,
        opaque: bool,
    ) -> Result<ImageSurface, DrawError>;

    /// The context new implicit drawing operations currently target, if any.
    fn current(&self) -> Option<Context>;

    /// Installs `next` as the current context, returning the previous value.
    ///
    /// This is the push/pop primitive behind scoped acquisition. Only the
    /// component holding a scope may call it, and it must restore the
    /// returned value before returning.
    fn replace_current(&self, next: Option<Context>) -> Option<Context>;

    /// Pulls the pixel image out of a context's render target, if it has one.
    fn extract_image(&self, context: &Context) -> Option<ImageSurface> {
        ImageSurface::try_from(context.target()).ok()
    }
}

/// Shared allocation path for the built-in back-ends.
pub(crate) fn allocate_image_surface(
    width_px: i32,
    height_px: i32,
    opaque: bool,
) -> Result<ImageSurface, DrawError> {
    let format = if opaque {
        Format::Rgb24
    } else {
        Format::ARgb32
    };

    ImageSurface::create(format, width_px, height_px).map_err(|err| DrawError::Allocation {
        width: width_px as i64,
        height: height_px as i64,
        reason: err.to_string(),
    })
}

#[cfg(feature = "backend-screen")]
pub type PlatformBackend = ScreenBackend;

#[cfg(all(feature = "backend-image", not(feature = "backend-screen")))]
pub type PlatformBackend = ImageBackend;

#[cfg(not(any(feature = "backend-screen", feature = "backend-image")))]
compile_error!("no drawing back-end selected: enable `backend-screen` or `backend-image`");

/// The back-end family selected at build time.
#[cfg(any(feature = "backend-screen", feature = "backend-image"))]
pub fn platform_backend() -> PlatformBackend {
    PlatformBackend::default()
}
