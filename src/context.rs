//! Graphics-context value type and its scoped-execution protocol.

use cairo::Context;
use log::debug;

use crate::backend::Backend;
use crate::error::DrawError;
use crate::geometry::Size;
use crate::register::ContextScope;
use crate::scale::Scale;

/// Describes a drawing destination: either whatever context is already
/// current, or a recipe for a brand-new offscreen context.
///
/// A [`GraphicsContext::New`] value owns no live resource. The offscreen
/// buffer it describes exists only for the duration of a
/// [`GraphicsContext::enter`] call; the value itself is a reusable recipe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GraphicsContext {
    /// Whatever context is current in the process-wide register, if any.
    Current,

    /// A request for a new offscreen context.
    New {
        /// Logical size in points.
        size: Size,
        /// `true` drops the alpha channel for storage efficiency; `false`
        /// preserves per-pixel alpha.
        opaque: bool,
        /// Requested density.
        scale: Scale,
    },
}

impl GraphicsContext {
    /// A context suited to drawing solid-color swatches of the given size:
    /// opaque, one device pixel per point.
    pub fn good_for_swatch(size: Size) -> Self {
        GraphicsContext::New {
            size,
            opaque: true,
            scale: Scale::OneToOne,
        }
    }

    /// A context suited to drawing 1x1 solid-color swatches.
    pub fn good_for_swatch_1x1() -> Self {
        Self::good_for_swatch(Size::ONE)
    }

    /// The density this context was requested at.
    pub fn scale(&self) -> Scale {
        match self {
            GraphicsContext::Current => Scale::CurrentDisplay,
            GraphicsContext::New { scale, .. } => *scale,
        }
    }

    /// Runs `operation` with this context materialized.
    ///
    /// [`GraphicsContext::Current`] hands the operation whatever context is
    /// registered at entry time (`None` when there is none), with no setup
    /// or teardown of its own. The register is consulted on every call, so
    /// nested entries observe the innermost active scope.
    ///
    /// [`GraphicsContext::New`] resolves its scale against `backend`,
    /// allocates an offscreen buffer at that density, makes its context
    /// current for the duration of the call, and tears it down on every
    /// exit path; the previous current context is restored exactly even
    /// when `operation` fails. When the buffer cannot be allocated the call
    /// fails with [`DrawError::Allocation`] and `operation` never runs.
    pub fn enter<R>(
        &self,
        backend: &dyn Backend,
        operation: impl FnOnce(Option<&Context>) -> Result<R, DrawError>,
    ) -> Result<R, DrawError> {
        match self {
            GraphicsContext::Current => operation(backend.current().as_ref()),
            GraphicsContext::New {
                size,
                opaque,
                scale,
            } => {
                let (scale_x, scale_y) = scale.resolve(backend);
                let (width_px, height_px) = device_pixel_extent(*size, scale_x, scale_y)?;
                debug!(
                    "materializing {}x{} pt offscreen context as {width_px}x{height_px} px",
                    size.width, size.height
                );

                let buffer = backend.allocate(width_px, height_px, *opaque)?;
                buffer.set_device_scale(scale_x, scale_y);

                let context = Context::new(&buffer).map_err(|err| DrawError::Allocation {
                    width: width_px as i64,
                    height: height_px as i64,
                    reason: err.to_string(),
                })?;

                let _scope = ContextScope::enter(backend, context.clone());
                operation(Some(&context))
            }
        }
    }
}

/// Converts a logical size to device pixels under the resolved multipliers.
fn device_pixel_extent(size: Size, scale_x: f64, scale_y: f64) -> Result<(i32, i32), DrawError> {
    let width = (size.width as f64 * scale_x).round();
    let height = (size.height as f64 * scale_y).round();

    if width > i32::MAX as f64 || height > i32::MAX as f64 {
        return Err(DrawError::Allocation {
            width: width as i64,
            height: height as i64,
            reason: "requested extent exceeds the maximum buffer size".into(),
        });
    }

    Ok((width as i32, height as i32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::FakeBackend;
    use anyhow::anyhow;

    #[test]
    fn good_for_swatch_is_opaque_one_to_one() {
        let context = GraphicsContext::good_for_swatch(Size::new(2, 2));
        assert_eq!(
            context,
            GraphicsContext::New {
                size: Size::new(2, 2),
                opaque: true,
                scale: Scale::OneToOne,
            }
        );

        assert_eq!(
            GraphicsContext::good_for_swatch_1x1(),
            GraphicsContext::New {
                size: Size::ONE,
                opaque: true,
                scale: Scale::OneToOne,
            }
        );
    }

    #[test]
    fn current_passes_through_without_a_registered_context() {
        let backend = FakeBackend::headless();
        let seen = GraphicsContext::Current
            .enter(&backend, |handle| Ok(handle.is_some()))
            .unwrap();
        assert!(!seen);
    }

    #[test]
    fn new_materializes_a_context_at_the_resolved_density() {
        let backend = FakeBackend::headless();
        let context = GraphicsContext::New {
            size: Size::new(3, 2),
            opaque: false,
            scale: Scale::Multiple(2.0),
        };

        context
            .enter(&backend, |handle| {
                let handle = handle.expect("new context should provide a handle");
                let target = backend.extract_image(handle).unwrap();
                assert_eq!((target.width(), target.height()), (6, 4));
                assert_eq!(target.device_scale(), (2.0, 2.0));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn new_registers_itself_for_the_duration_of_the_call() {
        let backend = FakeBackend::headless();
        let context = GraphicsContext::New {
            size: Size::new(1, 1),
            opaque: false,
            scale: Scale::OneToOne,
        };

        assert!(backend.current().is_none());
        context
            .enter(&backend, |handle| {
                let registered = backend.current().expect("context should be current");
                assert_eq!(registered.to_raw_none(), handle.unwrap().to_raw_none());
                Ok(())
            })
            .unwrap();
        assert!(backend.current().is_none());
    }

    #[test]
    fn register_round_trips_when_the_operation_fails() {
        let backend = FakeBackend::headless();
        let context = GraphicsContext::New {
            size: Size::new(1, 1),
            opaque: false,
            scale: Scale::OneToOne,
        };

        let result: Result<(), DrawError> =
            context.enter(&backend, |_| Err(anyhow!("artist gave up").into()));

        assert!(matches!(result, Err(DrawError::Other(_))));
        assert!(backend.current().is_none());
    }

    #[test]
    fn nested_entries_restore_in_reverse_order() {
        let backend = FakeBackend::headless();
        let outer = GraphicsContext::New {
            size: Size::new(1, 1),
            opaque: false,
            scale: Scale::OneToOne,
        };
        let inner = GraphicsContext::New {
            size: Size::new(2, 2),
            opaque: false,
            scale: Scale::OneToOne,
        };

        outer
            .enter(&backend, |outer_handle| {
                let outer_raw = outer_handle.unwrap().to_raw_none();

                inner.enter(&backend, |inner_handle| {
                    assert_ne!(inner_handle.unwrap().to_raw_none(), outer_raw);
                    assert_eq!(
                        backend.current().unwrap().to_raw_none(),
                        inner_handle.unwrap().to_raw_none()
                    );
                    Ok(())
                })?;

                // Exiting the inner scope must land back on the outer
                // context, not on the pre-entry value.
                assert_eq!(backend.current().unwrap().to_raw_none(), outer_raw);
                Ok(())
            })
            .unwrap();

        assert!(backend.current().is_none());
    }

    #[test]
    fn current_resolution_is_indirect_inside_a_new_scope() {
        let backend = FakeBackend::headless();
        let fresh = GraphicsContext::New {
            size: Size::new(1, 1),
            opaque: false,
            scale: Scale::OneToOne,
        };

        fresh
            .enter(&backend, |handle| {
                let raw = handle.unwrap().to_raw_none();
                // A Current entry inside the scope sees the innermost
                // context, looked up at entry time rather than cached.
                GraphicsContext::Current.enter(&backend, |current| {
                    assert_eq!(current.unwrap().to_raw_none(), raw);
                    Ok(())
                })
            })
            .unwrap();
    }

    #[test]
    fn oversized_requests_fail_before_the_operation_runs() {
        let backend = FakeBackend::headless();
        let context = GraphicsContext::New {
            size: Size::new(u32::MAX, 1),
            opaque: false,
            scale: Scale::Multiple(4.0),
        };

        let mut ran = false;
        let result = context.enter(&backend, |_| {
            ran = true;
            Ok(())
        });

        assert!(matches!(result, Err(DrawError::Allocation { .. })));
        assert!(!ran);
        assert!(backend.current().is_none());
    }

    #[test]
    fn scale_of_current_context_is_the_display_scale() {
        assert_eq!(GraphicsContext::Current.scale(), Scale::CurrentDisplay);
    }
}
