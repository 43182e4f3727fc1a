//! Error types for context acquisition and image export.

use thiserror::Error;

/// Errors that can occur while materializing drawing contexts or exporting
/// surfaces.
#[derive(Debug, Error)]
pub enum DrawError {
    /// The offscreen buffer or its drawing context could not be created.
    ///
    /// Fatal to the `enter` call that requested it, never to the process;
    /// the operation is not invoked and no partial context is left current.
    #[error("failed to allocate {width}x{height} px offscreen buffer: {reason}")]
    Allocation {
        width: i64,
        height: i64,
        reason: String,
    },

    /// Drawing completed but the resulting image could not be retrieved from
    /// the graphics context.
    #[error("could not get image from graphics context")]
    CouldNotGetImageFromGraphicsContext,

    /// A Cairo drawing call inside an operation failed.
    #[error("cairo operation failed: {0}")]
    Cairo(#[from] cairo::Error),

    /// PNG encoding failed.
    #[error("failed to encode PNG: {0}")]
    PngEncode(#[from] cairo::IoError),

    /// Writing an encoded image to disk failed.
    #[error("failed to write image: {0}")]
    Io(#[from] std::io::Error),

    /// A caller-supplied operation failed. Scoped teardown has already run;
    /// the original failure passes through unchanged.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
