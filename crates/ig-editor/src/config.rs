//! Editor configuration.

use crate::error::EditError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum undo depth. 0 keeps every entry.
    pub history_depth: usize,
    /// Distance within which a dragged edge snaps to a sibling edge.
    pub snap_threshold: f64,
    /// Smallest width/height a resize may produce.
    pub min_size: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Relative zoom change per wheel notch.
    pub zoom_step: f64,
    /// Side length of a resize handle.
    pub handle_size: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: 0,
            snap_threshold: 6.0,
            min_size: 1.0,
            min_zoom: 0.1,
            max_zoom: 10.0,
            zoom_step: 0.1,
            handle_size: 8.0,
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON config; missing keys keep defaults.
    pub fn from_json(text: &str) -> Result<Self, EditError> {
        let config: Self = serde_json::from_str(text)?;
        Ok(config.sanitized())
    }

    /// Replace values that would break interactions: non-finite numbers,
    /// an inverted zoom range, a zoom step outside `(0, 1)`.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !self.min_size.is_finite() || self.min_size < 1.0 {
            log::warn!("min_size {} out of range, clamping", self.min_size);
            self.min_size = if self.min_size.is_finite() { 1.0 } else { defaults.min_size };
        }
        if !self.min_zoom.is_finite() || self.min_zoom <= 0.0 {
            log::warn!("min_zoom {} out of range, using default", self.min_zoom);
            self.min_zoom = defaults.min_zoom;
        }
        if !self.max_zoom.is_finite() || self.max_zoom <= 0.0 {
            log::warn!("max_zoom {} out of range, using default", self.max_zoom);
            self.max_zoom = defaults.max_zoom;
        }
        if self.min_zoom > self.max_zoom {
            log::warn!("zoom range {}..{} inverted", self.min_zoom, self.max_zoom);
            std::mem::swap(&mut self.min_zoom, &mut self.max_zoom);
        }
        if !(self.zoom_step > 0.0 && self.zoom_step < 1.0) {
            log::warn!("zoom_step {} out of range, using default", self.zoom_step);
            self.zoom_step = defaults.zoom_step;
        }
        if !(self.handle_size.is_finite() && self.handle_size > 0.0) {
            log::warn!("handle_size {} out of range, using default", self.handle_size);
            self.handle_size = defaults.handle_size;
        }
        if !self.snap_threshold.is_finite() {
            log::warn!("snap_threshold {} not finite, using default", self.snap_threshold);
            self.snap_threshold = defaults.snap_threshold;
        }
        self
    }
}
