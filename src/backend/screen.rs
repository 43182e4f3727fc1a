//! Screen back-end: display-scaled buffers behind a focus handshake.

use std::process::{Command, Stdio};

use anyhow::{Context as _, Result, bail};
use cairo::{Context, ImageSurface};
use log::debug;
use serde_json::Value;

use super::Backend;
use crate::error::DrawError;
use crate::register;

/// Back-end for drawing attached to a compositor display.
///
/// Surface buffers are treated as display-scaled (logical sizes are
/// pre-adjusted when a different density is requested), a surface must hold
/// drawing focus before it can be drawn into, and contexts are y-up by
/// default.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScreenBackend;

impl ScreenBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for ScreenBackend {
    fn display_density(&self) -> Option<f64> {
        match monitor_scale() {
            Ok(Some(scale)) if scale > 0.0 => Some(scale),
            Ok(_) => None,
            Err(err) => {
                debug!("display density probe failed: {err:#}");
                None
            }
        }
    }

    fn default_flipped(&self) -> bool {
        false
    }

    fn display_scaled_buffers(&self) -> bool {
        true
    }

    fn requires_focus(&self) -> bool {
        true
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

/// Reads the focused monitor's scale from `hyprctl monitors -j`.
///
/// Returns `Ok(None)` when the compositor reports no monitors.
fn monitor_scale() -> Result<Option<f64>> {
    let output = Command::new("hyprctl")
        .args(["monitors", "-j"])
        .stdout(Stdio::piped())
        .output()
        .context("failed to run hyprctl monitors")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("hyprctl monitors failed: {}", stderr.trim());
    }

    let monitors: Value = serde_json::from_slice(&output.stdout)
        .context("failed to parse hyprctl monitors output")?;

    let list = monitors
        .as_array()
        .context("hyprctl monitors did not return an array")?;

    // Prefer the focused monitor; fall back to the first one reported.
    let monitor = list
        .iter()
        .find(|monitor| {
            monitor
                .get("focused")
                .and_then(Value::as_bool)
                .unwrap_or(false)
        })
        .or_else(|| list.first());

    Ok(monitor.and_then(|monitor| monitor.get("scale").and_then(Value::as_f64)))
}
