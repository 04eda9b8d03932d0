// Copyright 2025 the Styledit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use core::fmt;

/// Error returned when a global character offset does not resolve to a
/// position inside the buffer.
///
/// Callers that replay recorded edits rely on exact offsets, so resolution
/// fails loudly instead of clamping.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OffsetOutOfRange {
    /// The offset that was requested.
    pub offset: usize,
    /// The total length of the buffer text in bytes.
    pub len: usize,
}

impl fmt::Display for OffsetOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "global offset {} is out of range for buffer of length {}",
            self.offset, self.len
        )
    }
}

impl core::error::Error for OffsetOutOfRange {}
