// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Color;

/// Persistent engine settings.
///
/// Every field has a default, so a partial JSON file only overrides what it
/// names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Raster scale used when burning destructive annotations (2.0 = 144 dpi).
    pub export_oversampling: f64,
    /// Pixelation block edge in document units. Multiplied by the raster
    /// scale so blocks keep their physical size at any resolution.
    pub pixelate_block_size: f64,
    /// Linear resolution blur downsamples to before smoothing back up.
    pub blur_downsample_ratio: f64,
    /// Blend the blur pass 50/50 with a pixelated pass.
    pub blur_blend_pixelate: bool,
    /// Smallest accepted gesture edge in device pixels.
    pub min_gesture_px: f64,
    /// JPEG quality (1-100) for burned image patches.
    pub jpeg_quality: u8,
    /// Scrub page content under destructive regions: text runs, enclosed
    /// images and paths, and the contents of forms.
    pub scrub_text: bool,
    /// Page colour painted by the built-in paper renderer.
    pub paper_color: Color,
    /// Styling of the in-progress gesture preview.
    pub preview: PreviewStyle,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            export_oversampling: 2.0,
            pixelate_block_size: 8.0,
            blur_downsample_ratio: 0.1,
            blur_blend_pixelate: true,
            min_gesture_px: 5.0,
            jpeg_quality: 90,
            scrub_text: true,
            paper_color: Color::WHITE,
            preview: PreviewStyle::default(),
        }
    }
}

impl AppConfig {
    /// Load settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Write settings as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), raw)?;
        Ok(())
    }

    /// Pixelation block edge in pixels for a raster drawn at `scale`.
    pub fn block_px(&self, scale: f64) -> u32 {
        (self.pixelate_block_size * scale).round().max(1.0) as u32
    }
}

/// How the overlay draws a gesture that has not been committed yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewStyle {
    /// Dash length in pixels.
    pub dash: u32,
    /// Gap between dashes in pixels.
    pub gap: u32,
    /// Opacity (0-255) of the translucent fill inside a pending box.
    pub fill_alpha: u8,
}

impl Default for PreviewStyle {
    fn default() -> Self {
        Self {
            dash: 6,
            gap: 4,
            fill_alpha: 48,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_size_scales_with_raster() {
        let config = AppConfig::default();
        assert_eq!(config.block_px(1.0), 8);
        assert_eq!(config.block_px(2.0), 16);
        assert_eq!(config.block_px(0.01), 1);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"jpeg_quality": 70}"#).unwrap();
        assert_eq!(config.jpeg_quality, 70);
        assert_eq!(config.export_oversampling, 2.0);
        assert!(config.scrub_text);
    }

    #[test]
    fn save_then_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brennwerk.json");
        let config = AppConfig {
            min_gesture_px: 8.0,
            scrub_text: false,
            ..AppConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }
}
