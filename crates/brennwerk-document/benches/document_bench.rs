// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the brennwerk-document crate: the pixel effects on
// an A4 raster, the overlay compositor, and a full burn-in of a specimen.

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};

use brennwerk_core::{Annotation, AnnotationKind, AppConfig, Color, DocRect};
use brennwerk_document::effects::{self, EffectParams};
use brennwerk_document::pdf::sample::specimen_document;
use brennwerk_document::{BurnInPipeline, PageRaster, PaperRenderer, PixelRect, compose};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A4 at the default export oversampling, with a gradient so effects have
/// something to average.
fn a4_raster() -> PageRaster {
    let (width, height) = (1190u32, 1684u32);
    PageRaster {
        pixels: RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
        }),
        document_width: 595.0,
        document_height: 842.0,
        scale: 2.0,
    }
}

fn marks() -> Vec<Annotation> {
    vec![
        Annotation::new(0, AnnotationKind::Pixelate { rect: DocRect::new(56.0, 680.0, 260.0, 60.0) }),
        Annotation::new(0, AnnotationKind::Blur { rect: DocRect::new(56.0, 600.0, 300.0, 50.0) }),
        Annotation::new(
            0,
            AnnotationKind::StrokeRect {
                rect: DocRect::new(40.0, 560.0, 400.0, 200.0),
                color: Color::RED,
                width: 2.0,
            },
        ),
    ]
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_effects(c: &mut Criterion) {
    let raster = a4_raster();
    let params = EffectParams::from_config(&AppConfig::default(), raster.scale);
    let region = PixelRect::new(100, 200, 600, 300);

    c.bench_function("pixelate 600x300", |b| {
        b.iter(|| {
            let mut canvas = raster.pixels.clone();
            effects::pixelate(&mut canvas, black_box(region), params.block_px);
            black_box(canvas);
        });
    });

    c.bench_function("blur 600x300", |b| {
        b.iter(|| {
            let mut canvas = raster.pixels.clone();
            effects::blur(&mut canvas, black_box(region), &params);
            black_box(canvas);
        });
    });
}

fn bench_overlay(c: &mut Criterion) {
    let raster = a4_raster();
    let annotations = marks();
    let config = AppConfig::default();

    c.bench_function("overlay compose (A4, 3 marks)", |b| {
        b.iter(|| {
            let out = compose(black_box(&raster), 0, &annotations, None, &config);
            black_box(out.map(|img| img.width()).unwrap_or(0));
        });
    });
}

fn bench_burn_in(c: &mut Criterion) {
    let original = specimen_document(2);
    let annotations = marks();
    let pipeline = BurnInPipeline::new(AppConfig::default(), Arc::new(PaperRenderer::default()));

    c.bench_function("burn-in specimen (2 pages)", |b| {
        b.iter(|| {
            let outcome = pipeline.run(black_box(&original), &annotations);
            black_box(outcome.map(|o| o.bytes.len()).unwrap_or(0));
        });
    });
}

criterion_group!(benches, bench_effects, bench_overlay, bench_burn_in);
criterion_main!(benches);
