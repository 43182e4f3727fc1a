//! Drawable pixel surfaces: focus handling, nested context entry, and
//! draw-then-return factories.

use std::cell::Cell;
use std::fs::File;
use std::path::Path;

use cairo::{Context, ImageSurface};

use crate::backend::Backend;
use crate::color::Color;
use crate::context::GraphicsContext;
use crate::error::DrawError;
use crate::geometry::Size;
use crate::register::ContextScope;
use crate::scale::Scale;


/// An owned pixel buffer that can lend itself as a drawing target.
///
/// A surface starts with undefined contents; reading it before an operation
/// has run with drawing focus held is undefined. Logical size and density
/// derive from the buffer itself, so a surface extracted from a context
/// keeps the density the context was materialized at.
///
/// Buffers are exclusively owned: the crate defines no behavior for two
/// logical operations drawing into the same surface concurrently, and
/// callers must serialize all drawing on one thread.
pub struct DrawableSurface {
    buffer: ImageSurface,
    focus_depth: Cell<u32>,
}

/// Holds a focus-depth increment for the duration of a scope.
struct FocusDepth<'a> {
    depth: &'a Cell<u32>,
}

impl<'a> FocusDepth<'a> {
    fn hold(depth: &'a Cell<u32>) -> Self {
        depth.set(depth.get() + 1);
        Self { depth }
    }
}

impl Drop for FocusDepth<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}

impl DrawableSurface {
    /// Allocates an empty surface of `size` points at the resolved density.
    ///
    /// The pixel contents are uninitialized until an operation has drawn
    /// into the surface.
    pub fn new(
        backend: &dyn Backend,
        size: Size,
        opaque: bool,
        scale: Scale,
    ) -> Result<Self, DrawError> {
        let (scale_x, scale_y) = scale.resolve(backend);
        Self::allocate(
            backend,
            size.width as f64 * scale_x,
            size.height as f64 * scale_y,
            (scale_x, scale_y),
            opaque,
        )
    }

    fn allocate(
        backend: &dyn Backend,
        width_px: f64,
        height_px: f64,
        density: (f64, f64),
        opaque: bool,
    ) -> Result<Self, DrawError> {
        let width = width_px.round();
        let height = height_px.round();
        if width > i32::MAX as f64 || height > i32::MAX as f64 {
            return Err(DrawError::Allocation {
                width: width as i64,
                height: height as i64,
                reason: "requested extent exceeds the maximum buffer size".into(),
            });
        }

        let buffer = backend.allocate(width as i32, height as i32, opaque)?;
        buffer.set_device_scale(density.0, density.1);
        Ok(Self::from_buffer(buffer))
    }

    fn from_buffer(buffer: ImageSurface) -> Self {
        Self {
            buffer,
            focus_depth: Cell::new(0),
        }
    }

    /// Logical size in points.
    pub fn size(&self) -> (f64, f64) {
        let (scale_x, scale_y) = self.buffer.device_scale();
        (
            self.buffer.width() as f64 / scale_x,
            self.buffer.height() as f64 / scale_y,
        )
    }

    /// Pixel dimensions of the backing buffer.
    pub fn pixel_size(&self) -> (i32, i32) {
        (self.buffer.width(), self.buffer.height())
    }

    /// Recorded density in device pixels per point.
    pub fn density(&self) -> (f64, f64) {
        self.buffer.device_scale()
    }

    /// Whether any operation currently holds drawing focus on this surface.
    pub fn is_focused(&self) -> bool {
        self.focus_depth.get() > 0
    }

    /// The backing Cairo surface.
    pub fn image_surface(&self) -> &ImageSurface {
        &self.buffer
    }

    /// Runs `operation` while this surface holds drawing focus, using the
    /// back-end's default orientation.
    pub fn with_focus<R>(
        &self,
        backend: &dyn Backend,
        operation: impl FnOnce(&Self) -> Result<R, DrawError>,
    ) -> Result<R, DrawError> {
        self.with_focus_flipped(backend, backend.default_flipped(), operation)
    }

    /// Runs `operation` while this surface holds drawing focus.
    ///
    /// On back-ends requiring a focus handshake this binds a context to the
    /// buffer (flipping the Y axis when `flipped` is `false`, so logical
    /// coordinates stay y-up), makes it current, and releases both on every
    /// exit path, context first. On other back-ends this is a scoped no-op
    /// region around `operation`.
    pub fn with_focus_flipped<R>(
        &self,
        backend: &dyn Backend,
        flipped: bool,
        operation: impl FnOnce(&Self) -> Result<R, DrawError>,
    ) -> Result<R, DrawError> {
        if !backend.requires_focus() {
            return operation(self);
        }

        let context = self.focus_context(flipped)?;
        let _focus = FocusDepth::hold(&self.focus_depth);
        let _scope = ContextScope::enter(backend, context);
        operation(self)
    }

    /// A context bound to this surface's buffer, oriented per `flipped`.
    fn focus_context(&self, flipped: bool) -> Result<Context, DrawError> {
        let context = Context::new(&self.buffer)?;
        if !flipped {
            let (_, height) = self.size();
            context.translate(0.0, height);
            context.scale(1.0, -1.0);
        }
        Ok(context)
    }

    /// Runs a contextualized operation on this surface with the current
    /// context, default orientation, and focus held.
    pub fn in_current_graphics_context<R>(
        &self,
        backend: &dyn Backend,
        operation: impl FnOnce(&Self, Option<&Context>) -> Result<R, DrawError>,
    ) -> Result<R, DrawError> {
        self.in_graphics_context(
            backend,
            &GraphicsContext::Current,
            backend.default_flipped(),
            true,
            operation,
        )
    }

    /// Runs a contextualized operation on this surface with the given
    /// context.
    ///
    /// When `with_focus` is set, focus is acquired first and the context is
    /// entered inside it; teardown runs in reverse, context exit before
    /// focus release.
    pub fn in_graphics_context<R>(
        &self,
        backend: &dyn Backend,
        context: &GraphicsContext,
        flipped: bool,
        with_focus: bool,
        operation: impl FnOnce(&Self, Option<&Context>) -> Result<R, DrawError>,
    ) -> Result<R, DrawError> {
        let enter = move |surface: &Self| {
            context.enter(backend, |handle| operation(surface, handle))
        };

        if with_focus {
            self.with_focus_flipped(backend, flipped, enter)
        } else {
            enter(self)
        }
    }

    /// Creates a new surface and immediately draws it.
    ///
    /// On back-ends whose buffers are always display-scaled the surface
    /// itself is the drawing target: its logical size is pre-adjusted via
    /// the requested scale's relative multiplier so the buffer holds the
    /// intended device pixels, and `artist` draws through the focus
    /// context. On explicit-density back-ends the requested context is
    /// entered directly and the populated image is pulled back out of it; a
    /// missing result image is surfaced as
    /// [`DrawError::CouldNotGetImageFromGraphicsContext`], never silently
    /// replaced with an empty image.
    pub fn draw_new(
        backend: &dyn Backend,
        size: Size,
        context: GraphicsContext,
        flipped: bool,
        artist: impl FnOnce(Option<&Context>) -> Result<(), DrawError>,
    ) -> Result<Self, DrawError> {
        if backend.display_scaled_buffers() {
            let (display_x, display_y) = Scale::CurrentDisplay.resolve(backend);
            let (relative_x, relative_y) = context.scale().relative_multiplier(backend);
            let opaque = matches!(context, GraphicsContext::New { opaque: true, .. });

            let surface = Self::allocate(
                backend,
                size.width as f64 * relative_x * display_x,
                size.height as f64 * relative_y * display_y,
                (display_x, display_y),
                opaque,
            )?;

            surface.in_graphics_context(
                backend,
                &GraphicsContext::Current,
                flipped,
                true,
                |_, handle| artist(handle),
            )?;

            Ok(surface)
        } else {
            context.enter(backend, |handle| {
                artist(handle)?;

                backend
                    .current()
                    .as_ref()
                    .and_then(|current| backend.extract_image(current))
                    .map(Self::from_buffer)
                    .ok_or(DrawError::CouldNotGetImageFromGraphicsContext)
            })
        }
    }

    /// Draws a solid-color swatch of the given size.
    pub fn swatch(backend: &dyn Backend, color: Color, size: Size) -> Result<Self, DrawError> {
        Self::draw_new(
            backend,
            size,
            GraphicsContext::good_for_swatch(size),
            backend.default_flipped(),
            |handle| {
                let context = handle.ok_or(DrawError::CouldNotGetImageFromGraphicsContext)?;
                context.set_source_rgba(color.r, color.g, color.b, color.a);
                context.paint()?;
                Ok(())
            },
        )
    }

    /// Draws a 1x1 solid-color swatch.
    pub fn swatch_1x1(backend: &dyn Backend, color: Color) -> Result<Self, DrawError> {
        Self::swatch(backend, color, Size::ONE)
    }

    /// Encodes the surface contents as PNG bytes.
    pub fn png_data(&self) -> Result<Vec<u8>, DrawError> {
        self.buffer.flush();
        let mut bytes = Vec::new();
        self.buffer.write_to_png(&mut bytes)?;
        Ok(bytes)
    }

    /// Writes the surface contents to `path` as a PNG file.
    pub fn write_png(&self, path: &Path) -> Result<(), DrawError> {
        self.buffer.flush();
        let mut file = File::create(path)?;
        self.buffer.write_to_png(&mut file)?;
        Ok(())
    }
}
