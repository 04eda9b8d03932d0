// Copyright 2025 the Styledit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;
use core::iter;
use core::ops::Range;

use crate::content::FragmentContent;
use crate::layout::{LayoutCx, line_break};

/// Glyph painted for each character in password mode.
pub(crate) const PASSWORD_CHAR: char = '\u{2022}';
/// Glyph painted for a line break when whitespace is shown.
pub(crate) const BREAK_STR: &str = "\u{b6}";
/// Glyph painted for a tab when whitespace is shown.
pub(crate) const TAB_STR: &str = "\u{2192}";

/// What a fragment holds.
#[derive(Debug)]
pub enum FragmentKind {
    /// A run of plain text.
    Text,
    /// A single tab character.
    Tab,
    /// A hard line break sequence (`\r\n`, `\r` or `\n`).
    Break,
    /// An embedded-content directive.
    Content(FragmentContent),
}

/// The smallest layout unit: a run of text or one embedded object within a
/// paragraph block.
///
/// A fragment is a read-only view into its block's string. Position and size
/// are cached for the current layout pass; fragments are destroyed and
/// recreated wholesale whenever the block's text changes.
#[derive(Debug)]
pub struct Fragment {
    pub(crate) ofs: usize,
    pub(crate) len: usize,
    pub(crate) xpos: i32,
    pub(crate) ypos: i32,
    pub(crate) width: i32,
    pub(crate) line_ypos: i32,
    pub(crate) line_height: i32,
    pub(crate) kind: FragmentKind,
}

impl Fragment {
    pub(crate) fn new(ofs: usize, len: usize, kind: FragmentKind) -> Self {
        Self {
            ofs,
            len,
            xpos: 0,
            ypos: 0,
            width: 0,
            line_ypos: 0,
            line_height: 0,
            kind,
        }
    }

    /// Byte offset of the fragment within its block.
    pub fn ofs(&self) -> usize {
        self.ofs
    }

    /// Byte length of the fragment.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the fragment is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Byte range of the fragment within its block.
    pub fn text_range(&self) -> Range<usize> {
        self.ofs..self.ofs + self.len
    }

    pub(crate) fn end(&self) -> usize {
        self.ofs + self.len
    }

    /// What the fragment holds.
    pub fn kind(&self) -> &FragmentKind {
        &self.kind
    }

    /// Returns `true` for a hard line break fragment.
    pub fn is_break(&self) -> bool {
        matches!(self.kind, FragmentKind::Break)
    }

    /// Returns `true` for an embedded-content fragment.
    pub fn is_content(&self) -> bool {
        matches!(self.kind, FragmentKind::Content(_))
    }

    /// Horizontal position within the block, for the current layout pass.
    pub fn xpos(&self) -> i32 {
        self.xpos
    }

    /// Vertical position within the block (baseline-adjusted), for the
    /// current layout pass.
    pub fn ypos(&self) -> i32 {
        self.ypos
    }

    /// Width in pixels, for the current layout pass.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Top of the visual line this fragment sits on, within the block.
    pub fn line_ypos(&self) -> i32 {
        self.line_ypos
    }

    /// Height of the visual line this fragment sits on.
    pub fn line_height(&self) -> i32 {
        self.line_height
    }

    /// Measures the fragment at horizontal position `x` (tabs depend on it).
    pub(crate) fn measure_width(&self, cx: &LayoutCx<'_>, block_text: &str, x: i32) -> i32 {
        match &self.kind {
            FragmentKind::Text => {
                let text = &block_text[self.text_range()];
                if cx.password {
                    let masked = mask(text.chars().count());
                    cx.metrics.string_width(&cx.font, &masked)
                } else {
                    cx.metrics.string_width(&cx.font, text)
                }
            }
            FragmentKind::Tab => line_break::tab_width(cx.metrics, &cx.font, x),
            FragmentKind::Break => {
                if cx.show_whitespace {
                    cx.metrics.string_width(&cx.font, BREAK_STR)
                } else {
                    0
                }
            }
            FragmentKind::Content(content) => {
                content.width(cx.metrics, &cx.font, cx.layout_width)
            }
        }
    }

    pub(crate) fn measure_height(&self, cx: &LayoutCx<'_>) -> i32 {
        match &self.kind {
            FragmentKind::Content(content) => content.height(cx.metrics, &cx.font),
            _ => cx.metrics.line_height(&cx.font),
        }
    }

    pub(crate) fn measure_baseline(&self, cx: &LayoutCx<'_>) -> i32 {
        match &self.kind {
            FragmentKind::Content(content) => content.baseline(cx.metrics, &cx.font),
            _ => cx.metrics.baseline(&cx.font),
        }
    }

    /// Width of the fragment's text up to the absolute block offset `ofs`.
    ///
    /// Uses the cached width for offsets at or past the fragment end, so it
    /// stays correct for tabs and embedded content.
    pub(crate) fn prefix_width(&self, cx: &LayoutCx<'_>, block_text: &str, ofs: usize) -> i32 {
        if ofs <= self.ofs {
            return 0;
        }
        if ofs >= self.end() {
            return self.width;
        }
        match self.kind {
            FragmentKind::Text => {
                let text = &block_text[self.ofs..ofs];
                if cx.password {
                    let masked = mask(text.chars().count());
                    cx.metrics.string_width(&cx.font, &masked)
                } else {
                    cx.metrics.string_width(&cx.font, text)
                }
            }
            // Mid-sequence offsets in a break or tab snap to the start.
            _ => 0,
        }
    }

    /// Resolves `x` (relative to the fragment's left edge) to the nearest
    /// character boundary, returned as an offset from the fragment start.
    pub(crate) fn char_ofs_at_x(&self, cx: &LayoutCx<'_>, block_text: &str, x: i32) -> usize {
        match self.kind {
            FragmentKind::Text => {
                let text = &block_text[self.text_range()];
                let mask_w = cx
                    .password
                    .then(|| cx.metrics.string_width(&cx.font, &mask(1)));
                let mut left = x;
                for (pos, c) in text.char_indices() {
                    let char_w = mask_w.unwrap_or_else(|| {
                        cx.metrics
                            .string_width(&cx.font, &text[pos..pos + c.len_utf8()])
                    });
                    if left < char_w / 2 {
                        return pos;
                    }
                    left -= char_w;
                }
                self.len
            }
            FragmentKind::Break => 0,
            _ => {
                if x < self.width / 2 {
                    0
                } else {
                    self.len
                }
            }
        }
    }
}

pub(crate) fn mask(count: usize) -> String {
    iter::repeat_n(PASSWORD_CHAR, count).collect()
}
