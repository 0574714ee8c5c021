// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Brennwerk.

use thiserror::Error;

use crate::types::{AnnotationId, SessionId};

/// Top-level error type for all Brennwerk operations.
#[derive(Debug, Error)]
pub enum BrennwerkError {
    // -- Document errors --
    /// Malformed, unsupported, encrypted or empty input. No session is created.
    #[error("document could not be loaded: {0}")]
    Load(String),

    #[error("PDF operation failed: {0}")]
    Pdf(String),

    // -- Burn-in errors --
    #[error("page rendering failed: {0}")]
    Render(String),

    #[error("effect output could not be encoded: {0}")]
    Encode(String),

    #[error("an export is already running for session {0}")]
    ExportConflict(SessionId),

    // -- Session errors --
    #[error("no open session with id {0}")]
    SessionNotFound(SessionId),

    #[error("no annotation with id {0}")]
    AnnotationNotFound(AnnotationId),

    #[error("invalid annotation: {0}")]
    InvalidAnnotation(String),

    #[error("region detection failed: {0}")]
    Detector(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Reasons a gesture or candidate rectangle is refused before it becomes an
/// annotation.
///
/// These never abort anything: callers drop the candidate and at most give
/// UI-level feedback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("rectangle {width:.1}x{height:.1} px is below the {min:.1} px threshold")]
    Degenerate { width: f64, height: f64, min: f64 },

    #[error("rectangle lies outside the page bounds")]
    OutOfBounds,

    #[error("freehand stroke needs at least two distinct points, got {0}")]
    TooFewPoints(usize),

    #[error("scale must be positive and finite, got {0}")]
    InvalidScale(f64),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BrennwerkError>;
