// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use core::fmt;

const TRUNCATE_THRESHOLD: usize = 100;
const TRUNCATE_KEEP: usize = 50;

/// Hex display for potentially large byte blobs such as ciphertexts
pub fn hexf(data: &[u8], f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", truncated_hex(data))
}

/// Hex encode bytes, eliding the middle of long values
pub fn truncated_hex(data: &[u8]) -> String {
    let s = hex::encode(data);
    if s.len() <= TRUNCATE_THRESHOLD {
        return format!("0x{}", s);
    }
    let cutoff = TRUNCATE_KEEP / 2;
    format!(
        "<bytes({}):0x{}..{}>",
        data.len(),
        &s[..cutoff],
        &s[s.len() - (TRUNCATE_KEEP - cutoff)..]
    )
}
