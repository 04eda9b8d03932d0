// Copyright 2025 the Styledit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Range;

use smallvec::SmallVec;

use crate::content::ContentFactory;
use crate::layout::fragment::{Fragment, FragmentKind};
use crate::layout::{LayoutCx, line_break};
use crate::style::TextAlign;

/// One logical line of source text between hard breaks.
///
/// A block owns its string exclusively and splits it into [`Fragment`]s,
/// which layout wraps into one or more visual lines. A block contains at
/// most one hard line break, and when it does, the break is the final run.
#[derive(Debug)]
pub struct ParagraphBlock {
    pub(crate) text: String,
    pub(crate) ypos: i32,
    pub(crate) height: i32,
    pub(crate) width: i32,
    pub(crate) align: Option<TextAlign>,
    pub(crate) fragments: Vec<Fragment>,
    first_line_indentation: i32,
}

impl ParagraphBlock {
    pub(crate) fn new(text: String) -> Self {
        Self {
            text,
            ypos: 0,
            height: 0,
            width: 0,
            align: None,
            fragments: Vec::new(),
            first_line_indentation: 0,
        }
    }

    /// The block's source text, including its trailing break if any.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte length of the block's text.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns `true` if the block holds no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Absolute vertical offset of the block within the buffer.
    pub fn ypos(&self) -> i32 {
        self.ypos
    }

    /// Cached height from the last layout pass.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Cached width from the last layout pass.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Alignment override for this block, if any.
    pub fn align(&self) -> Option<TextAlign> {
        self.align
    }

    /// The block's fragments from the last layout pass.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub(crate) fn ends_with_break(&self) -> bool {
        self.text.ends_with(['\n', '\r'])
    }

    /// Splits the block's text into fragments: one per tab, one per break
    /// sequence, one per recognized content directive, and otherwise one per
    /// run of characters up to the next word-break character. A word-break
    /// character itself becomes a one-character fragment.
    pub(crate) fn build_fragments(&mut self, styling: bool, factory: &dyn ContentFactory) {
        let Self {
            text, fragments, ..
        } = self;
        fragments.clear();
        let bytes = text.as_bytes();
        let mut ofs = 0;
        while ofs < text.len() {
            let rest = &text[ofs..];
            if styling {
                if let Some(len) = factory.recognized_length(rest).filter(|len| *len > 0) {
                    if let Some(content) = factory.create_content(rest) {
                        fragments.push(Fragment::new(ofs, len, FragmentKind::Content(content)));
                        ofs += len;
                        continue;
                    }
                }
            }
            match bytes[ofs] {
                b'\t' => {
                    fragments.push(Fragment::new(ofs, 1, FragmentKind::Tab));
                    ofs += 1;
                }
                b'\r' | b'\n' => {
                    let len = if bytes[ofs] == b'\r' && bytes.get(ofs + 1) == Some(&b'\n') {
                        2
                    } else {
                        1
                    };
                    fragments.push(Fragment::new(ofs, len, FragmentKind::Break));
                    ofs += len;
                }
                _ => {
                    let mut len = 0;
                    for c in rest.chars() {
                        if line_break::is_wordbreak(c) {
                            break;
                        }
                        len += c.len_utf8();
                    }
                    if len == 0 {
                        len = rest.chars().next().map_or(1, char::len_utf8);
                    }
                    fragments.push(Fragment::new(ofs, len, FragmentKind::Text));
                    ofs += len;
                }
            }
        }
    }

    /// Wraps the block's fragments into visual lines and returns the
    /// resulting `(width, height)`.
    ///
    /// The walk accumulates x positions and records the last fragment after
    /// which breaking is allowed; when the next fragment would overflow the
    /// layout width and a break point exists, the line ends there. A single
    /// unbreakable run wider than the line overflows instead.
    pub(crate) fn layout(&mut self, cx: &LayoutCx<'_>) -> (i32, i32) {
        if self.fragments.is_empty() {
            self.first_line_indentation = 0;
            return (0, cx.metrics.line_height(&cx.font));
        }
        self.first_line_indentation = if cx.wrapping {
            self.compute_indentation(cx)
        } else {
            0
        };

        let mut block_width = 0;
        let mut line_ypos = 0;
        let mut line_start = 0;
        let mut first_line = true;
        while line_start < self.fragments.len() {
            let x0 = if first_line {
                0
            } else {
                self.first_line_indentation
            };
            let mut x = x0;
            let mut prev_break: Option<usize> = None;
            let mut line_end = self.fragments.len();
            let mut i = line_start;
            while i < self.fragments.len() {
                let w = self.fragments[i].measure_width(cx, &self.text, x);
                if cx.wrapping && i > line_start && x + w > cx.layout_width {
                    if let Some(bi) = prev_break {
                        line_end = bi + 1;
                        break;
                    }
                }
                let frag = &mut self.fragments[i];
                frag.xpos = x;
                frag.width = w;
                x += w;
                if self.fragments[i].is_break() {
                    line_end = i + 1;
                    break;
                }
                if self.allows_break_after(i) {
                    prev_break = Some(i);
                }
                i += 1;
            }
            let (line_height, right_edge) =
                self.finalize_line(cx, line_start..line_end, line_ypos);
            line_ypos += line_height;
            block_width = block_width.max(right_edge);
            line_start = line_end;
            first_line = false;
        }
        (block_width, line_ypos)
    }

    /// Breaking after fragment `i` is allowed unless its last character or
    /// the first character of the next fragment forbids it.
    fn allows_break_after(&self, i: usize) -> bool {
        let frag = &self.fragments[i];
        let Some(last) = self.text[frag.text_range()]
            .char_indices()
            .last()
            .map(|(pos, _)| frag.ofs + pos)
        else {
            return false;
        };
        if line_break::is_never_break_after(&self.text, last) {
            return false;
        }
        match self.fragments.get(i + 1) {
            Some(next) => !line_break::is_never_break_before(&self.text, next.ofs),
            None => true,
        }
    }

    /// Fixes up a finished line: common baseline, alignment shift, and the
    /// final line height written back to every fragment on the line.
    fn finalize_line(
        &mut self,
        cx: &LayoutCx<'_>,
        range: Range<usize>,
        line_ypos: i32,
    ) -> (i32, i32) {
        let align = self.align.unwrap_or(cx.align);
        let frags = &mut self.fragments[range];

        let mut frag_metrics: SmallVec<[(i32, i32); 16]> = SmallVec::new();
        let mut line_height = 0;
        let mut line_baseline = 0;
        for frag in frags.iter() {
            let h = frag.measure_height(cx);
            let b = frag.measure_baseline(cx);
            frag_metrics.push((h, b));
            line_height = line_height.max(h);
            line_baseline = line_baseline.max(b);
        }
        // A fragment hanging below the common baseline grows the line.
        for (h, b) in &frag_metrics {
            line_height = line_height.max(line_baseline - b + h);
        }
        if line_height == 0 {
            line_height = cx.metrics.line_height(&cx.font);
        }

        let right_edge = frags.last().map_or(0, |frag| frag.xpos + frag.width);
        let xofs = match align {
            TextAlign::Left => 0,
            TextAlign::Right => cx.layout_width - right_edge,
            TextAlign::Center => (cx.layout_width - right_edge) / 2,
        };
        for (frag, (_, baseline)) in frags.iter_mut().zip(frag_metrics.iter()) {
            frag.ypos = line_ypos + (line_baseline - baseline);
            frag.line_ypos = line_ypos;
            frag.line_height = line_height;
            frag.xpos += xofs;
        }
        (line_height, right_edge)
    }

    /// Hanging indent for wrapped continuation lines, measured from the
    /// leading whitespace and list-marker characters of the source line.
    fn compute_indentation(&self, cx: &LayoutCx<'_>) -> i32 {
        let mut x = 0;
        for (pos, c) in self.text.char_indices() {
            match c {
                '\t' => x += line_break::tab_width(cx.metrics, &cx.font, x),
                ' ' | '-' | '*' | '\u{2022}' => {
                    x += cx
                        .metrics
                        .string_width(&cx.font, &self.text[pos..pos + c.len_utf8()]);
                }
                _ => break,
            }
        }
        x
    }

    /// Resolves a byte offset to a fragment index.
    ///
    /// An offset exactly on the boundary between two fragments belongs to
    /// both; `prefer_first` picks the earlier one, which places a caret at
    /// the end of the previous visual line rather than the start of the
    /// next.
    pub(crate) fn fragment_index_at_ofs(&self, ofs: usize, prefer_first: bool) -> usize {
        if self.fragments.is_empty() {
            return 0;
        }
        let mut idx = self.fragments.len() - 1;
        for (i, frag) in self.fragments.iter().enumerate() {
            if ofs < frag.end() {
                idx = i;
                break;
            }
        }
        if prefer_first && idx > 0 && self.fragments[idx].ofs == ofs {
            idx - 1
        } else {
            idx
        }
    }

    /// Finds the fragment at a point, in block-local coordinates.
    pub(crate) fn fragment_at_point(&self, x: i32, y: i32) -> usize {
        for (i, frag) in self.fragments.iter().enumerate() {
            if y < frag.line_ypos + frag.line_height {
                if x < frag.xpos + frag.width {
                    return i;
                }
                if let Some(next) = self.fragments.get(i + 1) {
                    if next.line_ypos > frag.line_ypos {
                        // Last fragment on the clicked line.
                        return i;
                    }
                }
            }
        }
        self.fragments.len().saturating_sub(1)
    }
}
