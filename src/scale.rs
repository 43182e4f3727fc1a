//! Scale resolution from abstract density requests to per-axis multipliers.

use log::warn;

use crate::backend::Backend;

/// The scale (density) of a graphics context, in device pixels per point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    /// Use the same scale as the attached display.
    ///
    /// When no display can be found, resolution falls back to 1:1 and emits
    /// a diagnostic instead of failing the draw.
    CurrentDisplay,

    /// Exactly one device pixel per point on every axis.
    OneToOne,

    /// A custom multiplier, applied uniformly to both axes.
    ///
    /// `1.0` behaves like [`Scale::OneToOne`]; greater means higher density.
    /// Multipliers of `0.0` (and any non-positive value) mean "let the
    /// back-end pick" and resolve exactly like [`Scale::CurrentDisplay`],
    /// on every back-end family.
    Multiple(f64),
}

impl Scale {
    /// Resolves this request into concrete per-axis multipliers against the
    /// given back-end.
    pub fn resolve(&self, backend: &dyn Backend) -> (f64, f64) {
        match self {
            Scale::OneToOne => (1.0, 1.0),
            Scale::Multiple(multiplier) if *multiplier > 0.0 => (*multiplier, *multiplier),
            Scale::Multiple(_) | Scale::CurrentDisplay => match backend.display_density() {
                Some(density) => (density, density),
                None => {
                    warn!("no display attached; falling back to 1:1 scale");
                    (1.0, 1.0)
                }
            },
        }
    }

    /// How much a buffer's logical size must be multiplied so that a buffer
    /// allocated at the display's native density ends up holding this scale's
    /// device pixels.
    ///
    /// Only meaningful on back-ends whose buffer allocation is always
    /// display-scaled. A display multiplier reported as zero is substituted
    /// with 1 to keep the division defined.
    pub fn relative_multiplier(&self, backend: &dyn Backend) -> (f64, f64) {
        let (display_x, display_y) = Scale::CurrentDisplay.resolve(backend);
        let (desired_x, desired_y) = self.resolve(backend);
        (
            desired_x / non_zero(display_x),
            desired_y / non_zero(display_y),
        )
    }
}

fn non_zero(multiplier: f64) -> f64 {
    if multiplier == 0.0 { 1.0 } else { multiplier }
}
