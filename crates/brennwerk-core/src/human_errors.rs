// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives how a front end presents it.

use crate::error::BrennwerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something else is in progress; trying again later will work.
    Transient,
    /// User must do something (pick another file, fix a setting).
    ActionRequired,
    /// Cannot be fixed by retrying: damaged input, unsupported content.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether repeating the same request can succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `BrennwerkError` into a `HumanError`.
pub fn humanize_error(err: &BrennwerkError) -> HumanError {
    match err {
        // -- Document errors --
        BrennwerkError::Load(detail) => humanize_load_error(detail),

        BrennwerkError::Pdf(_) => HumanError {
            message: "The redacted copy couldn't be written.".into(),
            suggestion: "The file may use PDF features we can't rewrite safely. No output was saved.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Burn-in errors --
        BrennwerkError::Render(_) => HumanError {
            message: "A page couldn't be drawn for redaction.".into(),
            suggestion: "No output was saved. Try exporting again, or remove the marks on the failing page.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        BrennwerkError::Encode(_) => HumanError {
            message: "A redacted area couldn't be saved as an image.".into(),
            suggestion: "No output was saved. Try a smaller area or a lower export resolution.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        BrennwerkError::ExportConflict(_) => HumanError {
            message: "This document is already being exported.".into(),
            suggestion: "Wait for the current export to finish, then try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Session errors --
        BrennwerkError::SessionNotFound(_) => HumanError {
            message: "That document is no longer open.".into(),
            suggestion: "Open the document again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        BrennwerkError::AnnotationNotFound(_) => HumanError {
            message: "That mark no longer exists.".into(),
            suggestion: "It may have been undone or cleared.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        BrennwerkError::InvalidAnnotation(detail) => HumanError {
            message: "A mark couldn't be used.".into(),
            suggestion: format!("Check the mark and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        BrennwerkError::Detector(_) => HumanError {
            message: "Automatic detection didn't work on this page.".into(),
            suggestion: "Mark the sensitive areas by hand instead.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Storage --
        BrennwerkError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "We don't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or choose a different location.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        BrennwerkError::Serialization(_) => HumanError {
            message: "A settings or marks file couldn't be read.".into(),
            suggestion: "Check that the file is valid JSON in the expected format.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

/// Load failures carry the decoder's message; pick out the common causes.
fn humanize_load_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("encrypted") {
        HumanError {
            message: "This PDF is password-protected.".into(),
            suggestion: "Remove the password protection first, then open the copy.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("no pages") {
        HumanError {
            message: "This PDF has no pages.".into(),
            suggestion: "There is nothing to redact in this file.".into(),
            retriable: false,
            severity: Severity::Permanent,
        }
    } else {
        HumanError {
            message: "This file couldn't be opened as a PDF.".into(),
            suggestion: format!("The file may be damaged or not a PDF. (Detail: {detail})"),
            retriable: false,
            severity: Severity::Permanent,
        }
    }
}
