// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — decoding the original, writing the burned copy, scrubbing
// text under destroyed regions, and generating specimen documents.

pub mod reader;
pub mod sample;
pub mod scrub;
pub mod writer;

pub use reader::{MediaBox, PageHandle, SourceDocument};
pub use writer::OutputDocument;

use lopdf::Object;

/// Numeric value of an integer or real operand.
pub(crate) fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some((*f).into()),
        _ => None,
    }
}

/// Operand for a content-stream number.
pub(crate) fn real(value: f64) -> Object {
    Object::Real(value as f32)
}
