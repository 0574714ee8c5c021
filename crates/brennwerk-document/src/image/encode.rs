// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Patch encoding — crop a burned region out of the export raster and encode
// it as a baseline JPEG that a PDF can embed unchanged (DCTDecode).

use brennwerk_core::error::{BrennwerkError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage, imageops};
use tracing::{debug, instrument};

use crate::geometry::PixelRect;

/// An encoded image ready to become a PDF image XObject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddableImage {
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// JPEG bytes, RGB, 8 bits per component.
    pub data: Vec<u8>,
}

/// Copy `region` out of `raster`. Fails if the region is empty or lies
/// outside the raster.
pub fn crop_region(raster: &RgbaImage, region: PixelRect) -> Result<RgbaImage> {
    if region.width == 0
        || region.height == 0
        || region.right() > raster.width()
        || region.bottom() > raster.height()
    {
        return Err(BrennwerkError::Render(format!(
            "region {region:?} does not fit a {}x{} raster",
            raster.width(),
            raster.height()
        )));
    }
    Ok(imageops::crop_imm(raster, region.x, region.y, region.width, region.height).to_image())
}

/// Encode a patch as JPEG with the given quality (1-100).
///
/// Alpha is dropped; page rasters are opaque.
#[instrument(skip(patch), fields(width = patch.width(), height = patch.height()))]
pub fn encode_jpeg(patch: &RgbaImage, quality: u8) -> Result<EmbeddableImage> {
    if patch.width() == 0 || patch.height() == 0 {
        return Err(BrennwerkError::Encode("cannot encode an empty patch".into()));
    }

    let mut buffer = Vec::new();
    let rgb = DynamicImage::ImageRgba8(patch.clone()).to_rgb8();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)
        .map_err(|err| BrennwerkError::Encode(format!("JPEG encoding failed: {}", err)))?;

    debug!(bytes = buffer.len(), quality, "patch encoded");
    Ok(EmbeddableImage {
        width: patch.width(),
        height: patch.height(),
        data: buffer,
    })
}
