// Copyright 2025 the Styledit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use unicode_segmentation::UnicodeSegmentation;

use crate::editing::TextOffset;
use crate::geometry::Rect;
use crate::layout::{LayoutCx, ParagraphBlock, is_linebreak, is_space, is_wordbreak};

const CARET_WIDTH: i32 = 1;

/// The caret: a buffer position plus its cached pixel geometry.
///
/// `wanted_x` remembers the column for vertical navigation, so moving
/// through short lines does not lose the horizontal position. The
/// `prefer_first` flag resolves offsets that sit exactly on a fragment
/// boundary: at a wrap point the same byte offset has two visual positions,
/// the end of one line and the start of the next.
#[derive(Debug)]
pub struct Caret {
    pub(crate) pos: TextOffset,
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) width: i32,
    pub(crate) height: i32,
    pub(crate) wanted_x: i32,
    pub(crate) on: bool,
    pub(crate) prefer_first: bool,
}

impl Default for Caret {
    fn default() -> Self {
        Self {
            pos: TextOffset::default(),
            x: 0,
            y: 0,
            width: CARET_WIDTH,
            height: 0,
            wanted_x: 0,
            on: false,
            prefer_first: false,
        }
    }
}

impl Caret {
    /// The caret's position.
    pub fn pos(&self) -> TextOffset {
        self.pos
    }

    /// The caret rectangle in document coordinates.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Whether the caret is in the visible phase of its blink cycle.
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Places the caret at `(block, ofs)`, clamping to valid boundaries.
    ///
    /// With `allow_snap`, a position strictly inside a line-break fragment
    /// is pushed to the start of the break, or with `snap_forward` to the
    /// start of the following block. Returns `true` if the caret moved.
    pub(crate) fn place(
        &mut self,
        blocks: &[ParagraphBlock],
        cx: &LayoutCx<'_>,
        block: usize,
        ofs: usize,
        allow_snap: bool,
        snap_forward: bool,
    ) -> bool {
        let mut block = block.min(blocks.len() - 1);
        let mut ofs = ofs.min(blocks[block].len());
        while ofs > 0 && !blocks[block].text().is_char_boundary(ofs) {
            ofs -= 1;
        }
        if allow_snap {
            let target = &blocks[block];
            let fi = target.fragment_index_at_ofs(ofs, false);
            if let Some(frag) = target.fragments().get(fi) {
                if frag.is_break() && ofs > frag.ofs() {
                    if snap_forward && block + 1 < blocks.len() {
                        block += 1;
                        ofs = 0;
                    } else {
                        ofs = frag.ofs();
                    }
                }
            }
        }
        let new_pos = TextOffset::new(block, ofs);
        let moved = new_pos != self.pos;
        self.pos = new_pos;
        self.update_pos(blocks, cx);
        moved
    }

    /// Places the caret at a point in document coordinates, resolving the
    /// block by y, the fragment by (x, y), and the character by measuring
    /// sub-widths to the nearest boundary.
    pub(crate) fn place_point(
        &mut self,
        blocks: &[ParagraphBlock],
        cx: &LayoutCx<'_>,
        x: i32,
        y: i32,
    ) {
        let mut bi = 0;
        for (i, block) in blocks.iter().enumerate() {
            bi = i;
            if y < block.ypos() + block.height() {
                break;
            }
        }
        let block = &blocks[bi];
        let fi = block.fragment_at_point(x, y - block.ypos());
        let Some(frag) = block.fragments().get(fi) else {
            self.prefer_first = false;
            self.place(blocks, cx, bi, 0, true, false);
            return;
        };
        let local = frag.char_ofs_at_x(cx, block.text(), x - frag.xpos());
        let ofs = frag.ofs() + local;
        // Landing past the last character of a wrapped line keeps the caret
        // on that line rather than the start of the next.
        self.prefer_first = local >= frag.len() && !frag.is_break();
        self.place(blocks, cx, bi, ofs, true, false);
    }

    /// Moves the caret one grapheme or one word.
    pub(crate) fn move_step(
        &mut self,
        blocks: &[ParagraphBlock],
        cx: &LayoutCx<'_>,
        forward: bool,
        word: bool,
    ) {
        // Stay on the same visual line when reaching a wrap point.
        self.prefer_first = !forward;
        // Password fields hold one "word"; don't leak boundaries.
        let word = word && !cx.password;

        let mut bi = self.pos.block;
        let mut ofs = self.pos.ofs;
        let text = blocks[bi].text();
        let len = text.len();
        let next_char = |o: usize| text[o..].chars().next();
        let prev_char = |o: usize| text[..o].chars().next_back();

        if word && !(forward && ofs == len) && !(!forward && ofs == 0) {
            if forward {
                match next_char(ofs) {
                    Some(c) if is_linebreak(c) => ofs += 1,
                    Some(c) if is_wordbreak(c) => {
                        while let Some(c) = next_char(ofs) {
                            if !is_wordbreak(c) || is_linebreak(c) {
                                break;
                            }
                            ofs += c.len_utf8();
                        }
                    }
                    _ => {
                        while let Some(c) = next_char(ofs) {
                            if is_wordbreak(c) {
                                break;
                            }
                            ofs += c.len_utf8();
                        }
                        while let Some(c) = next_char(ofs) {
                            if !is_space(c) {
                                break;
                            }
                            ofs += c.len_utf8();
                        }
                    }
                }
            } else {
                while let Some(c) = prev_char(ofs) {
                    if !is_space(c) {
                        break;
                    }
                    ofs -= c.len_utf8();
                }
                if matches!(prev_char(ofs), Some(c) if is_wordbreak(c)) {
                    while let Some(c) = prev_char(ofs) {
                        if !is_wordbreak(c) {
                            break;
                        }
                        ofs -= c.len_utf8();
                    }
                } else {
                    while let Some(c) = prev_char(ofs) {
                        if is_wordbreak(c) {
                            break;
                        }
                        ofs -= c.len_utf8();
                    }
                }
            }
        } else if forward && ofs >= len && bi + 1 < blocks.len() {
            bi += 1;
            ofs = 0;
        } else if !forward && ofs == 0 && bi > 0 {
            bi -= 1;
            ofs = blocks[bi].len();
        } else if forward {
            if let Some(g) = text[ofs..].graphemes(true).next() {
                ofs += g.len();
            }
        } else if let Some(g) = text[..ofs].graphemes(true).next_back() {
            ofs -= g.len();
        }

        self.place(blocks, cx, bi, ofs, true, forward);
        self.update_wanted_x();
    }

    /// Refreshes the cached pixel geometry from the current layout.
    pub(crate) fn update_pos(&mut self, blocks: &[ParagraphBlock], cx: &LayoutCx<'_>) {
        let block = &blocks[self.pos.block];
        self.width = CARET_WIDTH;
        let fi = block.fragment_index_at_ofs(self.pos.ofs, self.prefer_first);
        if let Some(frag) = block.fragments().get(fi) {
            self.x = frag.xpos() + frag.prefix_width(cx, block.text(), self.pos.ofs);
            self.y = block.ypos() + frag.line_ypos();
            self.height = frag.line_height();
        } else {
            self.x = 0;
            self.y = block.ypos();
            self.height = block.height().max(cx.metrics.line_height(&cx.font));
        }
    }

    /// Remembers the current column for vertical navigation.
    pub(crate) fn update_wanted_x(&mut self) {
        self.wanted_x = self.x;
    }
}
