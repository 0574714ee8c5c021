// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fingerprints for export reports.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `data`.
///
/// Reports carry the digest of both the original and the burned copy so a
/// reviewer can tell which input a redacted file came from.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
