// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// brennwerk-session — Open documents and what the user is doing with them.
//
// A `DocumentSession` owns one original PDF, its annotation store, view state
// and pointer gesture. The `SessionRegistry` holds every open session and
// runs rendering, region detection and export on tokio's blocking pool.

pub mod detector;
pub mod gesture;
pub mod registry;
pub mod session;

pub use detector::{DetectionReport, RegionDetector};
pub use gesture::{GestureOutcome, GestureState};
pub use registry::SessionRegistry;
pub use session::{DocumentSession, ExportGuard, SessionSummary, ViewState};
