// Copyright 2025 the Styledit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::error::OffsetOutOfRange;
use crate::layout::ParagraphBlock;

/// A position in the buffer: a block index and a byte offset within that
/// block's text.
///
/// Ordering follows document order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct TextOffset {
    /// Index of the block.
    pub block: usize,
    /// Byte offset within the block's text.
    pub ofs: usize,
}

impl TextOffset {
    /// Creates a new offset.
    pub const fn new(block: usize, ofs: usize) -> Self {
        Self { block, ofs }
    }

    /// Converts to a byte offset into the logically concatenated text of all
    /// blocks. Walks the block list, so use sparingly.
    pub fn global_ofs(&self, blocks: &[ParagraphBlock]) -> usize {
        blocks[..self.block]
            .iter()
            .map(ParagraphBlock::len)
            .sum::<usize>()
            + self.ofs
    }

    /// Resolves a global byte offset back to a position.
    ///
    /// An offset exactly on a block boundary resolves to the start of the
    /// later block. Fails for offsets past the end of the buffer; callers
    /// replaying recorded edits rely on exact resolution.
    pub fn from_global(
        blocks: &[ParagraphBlock],
        gofs: usize,
    ) -> Result<Self, OffsetOutOfRange> {
        let mut rest = gofs;
        for (i, block) in blocks.iter().enumerate() {
            let last = i + 1 == blocks.len();
            if rest < block.len() || (last && rest == block.len()) {
                return Ok(Self::new(i, rest));
            }
            rest -= block.len();
        }
        Err(OffsetOutOfRange {
            offset: gofs,
            len: blocks.iter().map(ParagraphBlock::len).sum(),
        })
    }
}
