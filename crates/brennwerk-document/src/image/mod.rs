// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — turning burned raster patches into embeddable image data.

pub mod encode;

pub use encode::{EmbeddableImage, crop_region, encode_jpeg};
