// Copyright 2025 the Styledit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The text buffer and its driver.

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use peniko::Color;

use crate::content::{ContentFactory, FragmentContent, StandardContentFactory};
use crate::editing::{Caret, Selection, TextOffset, UndoEvent, UndoRedoStack};
use crate::error::OffsetOutOfRange;
use crate::geometry::{Point, Rect};
use crate::inputs::{Key, Modifiers, MouseButton};
use crate::layout::{BREAK_STR, FragmentKind, LayoutCx, ParagraphBlock, TAB_STR, is_wordbreak, mask};
use crate::listener::EditListener;
use crate::measure::TextMetrics;
use crate::style::{FontDescription, StyleChange, TextAlign, TextProps};

/// Maximum number of bytes a single insertion may carry, guarding the
/// offset fields against overflow.
const MAX_INSERT_LEN: usize = 0x0077_7777;

/// Large x coordinate used to hit the end of a line.
const FAR_RIGHT: i32 = i32::MAX / 2;

/// Opaque representation of a redraw generation.
///
/// Obtained from [`StyleEdit::generation`].
// Overflow handling: generations are only compared, so wrapping is fine.
#[derive(PartialEq, Eq, Default, Clone, Copy, Debug)]
pub struct Generation(u32);

impl Generation {
    /// Make it not what it currently is.
    pub(crate) fn nudge(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

/// How far the next layout pass has to go.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum LayoutDirty {
    Clean,
    /// Re-wrap with existing fragments; width, alignment or metrics changed.
    Geometry,
    /// Rebuild fragments first; text or styling changed.
    Fragments,
}

/// A line-wrapped, styleable text buffer with caret, selection and
/// undo/redo.
///
/// `StyleEdit` holds pure state and answers queries from it. Anything that
/// can re-layout or call back into the host runs on an [`EditDriver`]
/// obtained from [`driver`](Self::driver).
#[derive(Debug)]
pub struct StyleEdit {
    blocks: Vec<ParagraphBlock>,
    caret: Caret,
    selection: Selection,
    undoredo: UndoRedoStack,
    factory: Box<dyn ContentFactory>,
    font: FontDescription,
    align: TextAlign,
    layout_width: i32,
    layout_height: i32,
    content_width: i32,
    content_height: i32,
    content_width_dirty: bool,
    layout_dirty: LayoutDirty,
    scroll_x: i32,
    scroll_y: i32,
    scrollbar_lock: u32,
    scrollbars_dirty: bool,
    select_state: bool,
    mousedown_pos: TextOffset,
    generation: Generation,
    multiline: bool,
    wrapping: bool,
    read_only: bool,
    password: bool,
    styling: bool,
    show_whitespace: bool,
    win_style_br: bool,
}

impl Default for StyleEdit {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleEdit {
    /// Creates an empty buffer with a single empty block.
    pub fn new() -> Self {
        Self {
            blocks: vec![ParagraphBlock::new(String::new())],
            caret: Caret::default(),
            selection: Selection::default(),
            undoredo: UndoRedoStack::default(),
            factory: Box::new(StandardContentFactory),
            font: FontDescription::default(),
            align: TextAlign::default(),
            layout_width: 0,
            layout_height: 0,
            content_width: 0,
            content_height: 0,
            content_width_dirty: false,
            layout_dirty: LayoutDirty::Fragments,
            scroll_x: 0,
            scroll_y: 0,
            scrollbar_lock: 0,
            scrollbars_dirty: false,
            select_state: false,
            mousedown_pos: TextOffset::default(),
            // Consumers start from the default generation and will want to
            // draw at least once.
            generation: Generation(1),
            multiline: false,
            wrapping: false,
            read_only: false,
            password: false,
            styling: false,
            show_whitespace: false,
            win_style_br: cfg!(windows),
        }
    }

    /// Pairs the editor with its measurement and listener backends for a
    /// series of operations.
    pub fn driver<'drv>(
        &'drv mut self,
        metrics: &'drv dyn TextMetrics,
        listener: &'drv mut dyn EditListener,
    ) -> EditDriver<'drv> {
        EditDriver {
            editor: self,
            metrics,
            listener,
        }
    }

    /// The full text of the buffer: the concatenation of all block strings.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.blocks.iter().map(ParagraphBlock::len).sum());
        for block in &self.blocks {
            out.push_str(block.text());
        }
        out
    }

    /// Returns `true` if the buffer holds no text.
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(ParagraphBlock::is_empty)
    }

    /// The buffer's blocks in document order. Never empty.
    pub fn blocks(&self) -> &[ParagraphBlock] {
        &self.blocks
    }

    /// The caret.
    pub fn caret(&self) -> &Caret {
        &self.caret
    }

    /// The selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The text covered by the selection, if any.
    pub fn selected_text(&self) -> Option<String> {
        self.selection
            .is_selected()
            .then(|| self.text_of_range(self.selection.start, self.selection.stop))
    }

    /// Returns `true` if there is an edit to undo.
    pub fn can_undo(&self) -> bool {
        self.undoredo.can_undo()
    }

    /// Returns `true` if there is an undone edit to redo.
    pub fn can_redo(&self) -> bool {
        self.undoredo.can_redo()
    }

    /// The current redraw generation. It changes whenever something visible
    /// changed; store the value you last drew at and redraw on mismatch.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Cached content width from the last layout pass. The authoritative
    /// value, recomputed if a shrink is pending, comes from
    /// [`EditDriver::content_width`].
    pub fn content_width(&self) -> i32 {
        self.content_width
    }

    /// Cached content height from the last layout pass.
    pub fn content_height(&self) -> i32 {
        self.content_height
    }

    /// Current horizontal scroll offset.
    pub fn scroll_x(&self) -> i32 {
        self.scroll_x
    }

    /// Current vertical scroll offset.
    pub fn scroll_y(&self) -> i32 {
        self.scroll_y
    }

    /// The layout width last given to [`EditDriver::set_layout_size`].
    pub fn layout_width(&self) -> i32 {
        self.layout_width
    }

    /// The layout height last given to [`EditDriver::set_layout_size`].
    pub fn layout_height(&self) -> i32 {
        self.layout_height
    }

    /// The font used for measurement and painting.
    pub fn font(&self) -> FontDescription {
        self.font
    }

    /// Sets the font.
    pub fn set_font(&mut self, font: FontDescription) {
        if self.font != font {
            self.font = font;
            self.mark_dirty(LayoutDirty::Geometry);
        }
    }

    /// Sets the default text alignment.
    pub fn set_align(&mut self, align: TextAlign) {
        if self.align != align {
            self.align = align;
            self.mark_dirty(LayoutDirty::Geometry);
        }
    }

    /// Enables or disables word wrapping.
    pub fn set_wrapping(&mut self, wrapping: bool) {
        if self.wrapping != wrapping {
            self.wrapping = wrapping;
            self.mark_dirty(LayoutDirty::Geometry);
        }
    }

    /// Enables or disables multiline editing. Affects how breaks are
    /// inserted; existing blocks are left as they are.
    pub fn set_multiline(&mut self, multiline: bool) {
        self.multiline = multiline;
    }

    /// Enables or disables read-only mode. Navigation and copying still
    /// work; every mutating operation becomes a no-op.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Enables or disables password display. Measurement and painting
    /// substitute one bullet per character; the underlying text is
    /// unaffected.
    pub fn set_password(&mut self, password: bool) {
        if self.password != password {
            self.password = password;
            self.mark_dirty(LayoutDirty::Geometry);
        }
    }

    /// Enables or disables embedded-content styling.
    pub fn set_styling(&mut self, styling: bool) {
        if self.styling != styling {
            self.styling = styling;
            self.mark_dirty(LayoutDirty::Fragments);
        }
    }

    /// Shows or hides whitespace markers.
    pub fn set_show_whitespace(&mut self, show: bool) {
        if self.show_whitespace != show {
            self.show_whitespace = show;
            self.mark_dirty(LayoutDirty::Geometry);
        }
    }

    /// Selects `\r\n` or `\n` as the break sequence inserted by
    /// [`EditDriver::insert_break`]. Defaults to the platform convention.
    pub fn set_windows_style_break(&mut self, on: bool) {
        self.win_style_br = on;
    }

    /// Replaces the content factory.
    pub fn set_content_factory(&mut self, factory: Box<dyn ContentFactory>) {
        self.factory = factory;
        self.mark_dirty(LayoutDirty::Fragments);
    }

    fn mark_dirty(&mut self, level: LayoutDirty) {
        self.layout_dirty = self.layout_dirty.max(level);
    }

    fn text_of_range(&self, start: TextOffset, stop: TextOffset) -> String {
        if start.block == stop.block {
            return self.blocks[start.block].text()[start.ofs..stop.ofs].to_string();
        }
        let mut out = self.blocks[start.block].text()[start.ofs..].to_string();
        for block in &self.blocks[start.block + 1..stop.block] {
            out.push_str(block.text());
        }
        out.push_str(&self.blocks[stop.block].text()[..stop.ofs]);
        out
    }
}

/// A short-lived wrapper around [`StyleEdit`] bundling the measurement
/// provider and the listener.
///
/// Every operation that can re-layout or notify the host lives here. The
/// editor stays exclusively borrowed for the whole operation, so a listener
/// callback can never re-enter or delete it; host reactions happen after
/// the driver releases the borrow.
pub struct EditDriver<'a> {
    /// The wrapped editor.
    pub editor: &'a mut StyleEdit,
    /// Measurement backend.
    pub metrics: &'a dyn TextMetrics,
    /// Host callbacks.
    pub listener: &'a mut dyn EditListener,
}

impl fmt::Debug for EditDriver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditDriver")
            .field("editor", &self.editor)
            .finish_non_exhaustive()
    }
}

impl<'a> EditDriver<'a> {
    fn cx(&self) -> LayoutCx<'a> {
        LayoutCx {
            metrics: self.metrics,
            font: self.editor.font,
            layout_width: self.editor.layout_width,
            align: self.editor.align,
            wrapping: self.editor.wrapping,
            password: self.editor.password,
            show_whitespace: self.editor.show_whitespace,
        }
    }

    fn size_depends_on_layout(&self) -> bool {
        self.editor.wrapping || self.editor.align != TextAlign::Left
    }

    // --- MARK: Layout ---

    /// Runs any pending layout pass. Deferred while the layout width is
    /// unknown and the result would depend on it.
    pub fn refresh_layout(&mut self) {
        let level = self.editor.layout_dirty;
        if level == LayoutDirty::Clean {
            return;
        }
        if self.editor.layout_width <= 0 && self.size_depends_on_layout() {
            log::trace!("layout deferred until a positive width is known");
            return;
        }
        self.layout_all(level == LayoutDirty::Fragments);
    }

    fn layout_all(&mut self, update_fragments: bool) {
        let cx = self.cx();
        {
            let StyleEdit {
                blocks,
                factory,
                styling,
                ..
            } = &mut *self.editor;
            let mut ypos = 0;
            let mut content_width = 0;
            for block in blocks.iter_mut() {
                if update_fragments {
                    block.build_fragments(*styling, &**factory);
                }
                let (w, h) = block.layout(&cx);
                block.ypos = ypos;
                block.width = w;
                block.height = h;
                ypos += h;
                content_width = content_width.max(w);
            }
            self.editor.content_width = content_width;
            self.editor.content_height = ypos;
        }
        self.editor.content_width_dirty = false;
        self.editor.layout_dirty = LayoutDirty::Clean;
        {
            let StyleEdit { caret, blocks, .. } = &mut *self.editor;
            caret.update_pos(blocks, &cx);
        }
        self.editor.generation.nudge();
        self.update_scrollbars();
    }

    /// Lays out one block after an edit and propagates y offsets to the
    /// blocks below it. O(n) in the remaining blocks; the unavoidable cost
    /// of a line-based model without a y-index structure.
    fn layout_block(&mut self, idx: usize, update_fragments: bool) {
        {
            let StyleEdit {
                blocks,
                factory,
                styling,
                ..
            } = &mut *self.editor;
            if update_fragments {
                blocks[idx].build_fragments(*styling, &**factory);
            }
        }
        if self.editor.layout_width <= 0 && self.size_depends_on_layout() {
            self.editor.mark_dirty(LayoutDirty::Geometry);
            return;
        }
        let cx = self.cx();
        let (w, h) = self.editor.blocks[idx].layout(&cx);
        self.apply_block_size(idx, w, h);
    }

    fn apply_block_size(&mut self, idx: usize, w: i32, h: i32) {
        let editor = &mut *self.editor;
        let old_w = editor.blocks[idx].width;
        editor.blocks[idx].width = w;
        editor.blocks[idx].height = h;
        // Content width grows eagerly and shrinks lazily.
        if w >= editor.content_width {
            editor.content_width = w;
        } else if old_w == editor.content_width {
            editor.content_width_dirty = true;
        }
        let mut ypos = if idx == 0 {
            0
        } else {
            editor.blocks[idx - 1].ypos + editor.blocks[idx - 1].height
        };
        for block in editor.blocks[idx..].iter_mut() {
            block.ypos = ypos;
            ypos += block.height;
        }
        editor.content_height = ypos;
        self.update_scrollbars();
    }

    /// Gives the engine its viewport size. A width change re-wraps when the
    /// layout depends on it.
    pub fn set_layout_size(&mut self, width: i32, height: i32) {
        let width_changed = width != self.editor.layout_width;
        self.editor.layout_width = width;
        self.editor.layout_height = height;
        if width_changed && self.size_depends_on_layout() {
            self.editor.mark_dirty(LayoutDirty::Geometry);
        }
        self.refresh_layout();
        // Re-clamp the scroll offset against the new viewport.
        self.set_scroll_pos(self.editor.scroll_x, self.editor.scroll_y);
        self.update_scrollbars();
    }

    /// The widest block, recomputing the lazily tracked maximum if a shrink
    /// is pending.
    pub fn content_width(&mut self) -> i32 {
        self.refresh_layout();
        if self.editor.content_width_dirty {
            self.editor.content_width = self
                .editor
                .blocks
                .iter()
                .map(ParagraphBlock::width)
                .max()
                .unwrap_or(0);
            self.editor.content_width_dirty = false;
        }
        self.editor.content_width
    }

    /// Total height of all blocks.
    pub fn content_height(&mut self) -> i32 {
        self.refresh_layout();
        self.editor.content_height
    }

    // --- MARK: Scrolling ---

    /// Scrolls to `(x, y)`, clamped to the content size, and notifies the
    /// listener of the delta.
    pub fn set_scroll_pos(&mut self, x: i32, y: i32) {
        let editor = &mut *self.editor;
        let max_x = (editor.content_width - editor.layout_width).max(0);
        let max_y = (editor.content_height - editor.layout_height).max(0);
        let x = x.clamp(0, max_x);
        let y = y.clamp(0, max_y);
        let dx = x - editor.scroll_x;
        let dy = y - editor.scroll_y;
        if dx == 0 && dy == 0 {
            return;
        }
        editor.scroll_x = x;
        editor.scroll_y = y;
        editor.generation.nudge();
        self.listener.scroll(dx, dy);
        self.update_scrollbars();
    }

    /// Scrolls the minimum amount needed to bring the caret into view.
    pub fn scroll_if_needed(&mut self) {
        let editor = &*self.editor;
        if editor.layout_width <= 0 || editor.layout_height <= 0 {
            return;
        }
        let caret = editor.caret.rect();
        let mut x = editor.scroll_x;
        let mut y = editor.scroll_y;
        if caret.x + caret.w > x + editor.layout_width {
            x = caret.x + caret.w - editor.layout_width;
        }
        if caret.x < x {
            x = caret.x;
        }
        if caret.y + caret.h > y + editor.layout_height {
            y = caret.y + caret.h - editor.layout_height;
        }
        if caret.y < y {
            y = caret.y;
        }
        self.set_scroll_pos(x, y);
    }

    /// Suppresses scrollbar-limit callbacks until the matching
    /// [`end_lock_scrollbars`](Self::end_lock_scrollbars). Nests.
    pub fn begin_lock_scrollbars(&mut self) {
        self.editor.scrollbar_lock += 1;
    }

    /// Ends a lock scope; the outermost end delivers one deferred callback
    /// if any were suppressed.
    pub fn end_lock_scrollbars(&mut self) {
        debug_assert!(self.editor.scrollbar_lock > 0, "unbalanced scrollbar lock");
        self.editor.scrollbar_lock = self.editor.scrollbar_lock.saturating_sub(1);
        if self.editor.scrollbar_lock == 0 && self.editor.scrollbars_dirty {
            self.editor.scrollbars_dirty = false;
            self.listener.update_scrollbars();
        }
    }

    fn update_scrollbars(&mut self) {
        if self.editor.scrollbar_lock > 0 {
            self.editor.scrollbars_dirty = true;
            return;
        }
        self.listener.update_scrollbars();
    }

    // --- MARK: Text changes ---

    /// Replaces the whole text. Clears the undo history and puts the caret
    /// at the start.
    pub fn set_text(&mut self, text: &str) {
        self.clear_internal();
        self.insert_text_internal(text, false, true);
        let cx = self.cx();
        {
            let StyleEdit { caret, blocks, .. } = &mut *self.editor;
            caret.prefer_first = false;
            caret.place(blocks, &cx, 0, 0, false, false);
            caret.update_wanted_x();
        }
        self.editor.generation.nudge();
        self.listener.on_change();
    }

    /// Resets to a single empty block, clearing the undo history.
    pub fn clear(&mut self) {
        self.clear_internal();
        self.listener.on_change();
    }

    fn clear_internal(&mut self) {
        let editor = &mut *self.editor;
        editor.blocks.clear();
        editor.blocks.push(ParagraphBlock::new(String::new()));
        editor.selection.select_nothing();
        editor.undoredo.clear();
        editor.caret.pos = TextOffset::default();
        editor.content_width = 0;
        editor.content_height = 0;
        editor.content_width_dirty = false;
        editor.scroll_x = 0;
        editor.scroll_y = 0;
        editor.layout_dirty = LayoutDirty::Fragments;
        editor.generation.nudge();
        self.refresh_layout();
        self.invalidate_view();
    }

    /// Inserts text at the caret, replacing the selection if there is one.
    ///
    /// This is the primitive: it records an undo event but does not invoke
    /// the listener's change callback; the higher-level wrappers
    /// ([`paste`](Self::paste), [`key_down`](Self::key_down), ...) do.
    pub fn insert_text(&mut self, text: &str) {
        self.refresh_layout();
        self.insert_text_internal(text, false, false);
    }

    /// Inserts text at the end of the buffer, leaving the caret after it.
    pub fn append_text(&mut self, text: &str) {
        self.refresh_layout();
        self.insert_text_internal(text, true, false);
    }

    fn insert_text_internal(&mut self, text: &str, after_last: bool, clear_undo: bool) -> usize {
        if text.is_empty() {
            return 0;
        }
        debug_assert!(
            text.len() <= MAX_INSERT_LEN,
            "insert exceeds the maximum length guard"
        );
        self.begin_lock_scrollbars();
        if self.editor.selection.is_selected() {
            self.remove_selection_internal();
        }
        if after_last {
            let cx = self.cx();
            let StyleEdit { caret, blocks, .. } = &mut *self.editor;
            let last = blocks.len() - 1;
            let end = blocks[last].len();
            caret.prefer_first = false;
            caret.place(blocks, &cx, last, end, false, false);
        }
        let TextOffset { block: bi, ofs } = self.editor.caret.pos;
        let effective = if self.editor.multiline {
            text
        } else {
            first_line_of(text)
        };
        let gofs = TextOffset::new(bi, ofs).global_ofs(&self.editor.blocks);

        let segment_count = {
            let editor = &mut *self.editor;
            let old = editor.blocks[bi].text();
            let mut combined = String::with_capacity(old.len() + effective.len());
            combined.push_str(&old[..ofs]);
            combined.push_str(effective);
            combined.push_str(&old[ofs..]);
            let segments = split_after_breaks(&combined);
            let count = segments.len();
            editor
                .blocks
                .splice(bi..=bi, segments.into_iter().map(ParagraphBlock::new));
            count
        };
        for idx in bi..bi + segment_count {
            self.layout_block(idx, true);
        }

        // Walk the new segments to find the end of the inserted text.
        let mut target = ofs + effective.len();
        let mut tbi = bi;
        while target > self.editor.blocks[tbi].len() {
            target -= self.editor.blocks[tbi].len();
            tbi += 1;
        }
        let cx = self.cx();
        {
            let StyleEdit { caret, blocks, .. } = &mut *self.editor;
            caret.prefer_first = false;
            caret.place(blocks, &cx, tbi, target, true, true);
            caret.update_wanted_x();
        }
        self.end_lock_scrollbars();

        if clear_undo {
            self.editor.undoredo.clear();
        } else if !self.editor.undoredo.applying {
            self.editor
                .undoredo
                .commit(gofs, effective.to_string(), true);
        }
        self.editor.generation.nudge();
        self.invalidate_from(bi);
        effective.len()
    }

    fn remove_selection_internal(&mut self) {
        if !self.editor.selection.is_selected() {
            return;
        }
        let start = self.editor.selection.start();
        let stop = self.editor.selection.stop();
        let gofs = start.global_ofs(&self.editor.blocks);
        let removed = self.editor.text_of_range(start, stop);
        self.begin_lock_scrollbars();
        {
            let editor = &mut *self.editor;
            if start.block == stop.block {
                editor.blocks[start.block]
                    .text
                    .replace_range(start.ofs..stop.ofs, "");
            } else {
                let tail = editor.blocks[stop.block].text()[stop.ofs..].to_string();
                editor.blocks[start.block].text.truncate(start.ofs);
                editor.blocks[start.block].text.push_str(&tail);
                editor.blocks.drain(start.block + 1..=stop.block);
            }
            // A block that lost its trailing break merges the next block in.
            if !editor.blocks[start.block].ends_with_break()
                && start.block + 1 < editor.blocks.len()
            {
                let next = editor.blocks.remove(start.block + 1);
                editor.blocks[start.block].text.push_str(next.text());
            }
            editor.selection.select_nothing();
        }
        self.layout_block(start.block, true);
        let cx = self.cx();
        {
            let StyleEdit { caret, blocks, .. } = &mut *self.editor;
            caret.prefer_first = false;
            caret.place(blocks, &cx, start.block, start.ofs, true, false);
            caret.update_wanted_x();
        }
        self.end_lock_scrollbars();
        if !self.editor.undoredo.applying {
            self.editor.undoredo.commit(gofs, removed, false);
        }
        self.editor.generation.nudge();
        self.invalidate_from(start.block);
    }

    /// Deletes the selection. Returns `true` if anything was removed.
    pub fn delete_selected(&mut self) -> bool {
        if self.editor.read_only || !self.editor.selection.is_selected() {
            return false;
        }
        self.refresh_layout();
        self.remove_selection_internal();
        self.scroll_if_needed();
        self.listener.on_change();
        true
    }

    /// Inserts the configured break sequence at the caret.
    ///
    /// Standing at the very end of the buffer with no ending break means
    /// standing on the last line; the sequence is inserted twice, once to
    /// end the current line and once for the new empty line.
    pub fn insert_break(&mut self) -> bool {
        if !self.editor.multiline || self.editor.read_only {
            return false;
        }
        self.refresh_layout();
        let brk = if self.editor.win_style_br { "\r\n" } else { "\n" };
        let pos = self.editor.caret.pos;
        let block = &self.editor.blocks[pos.block];
        if pos.ofs == block.len() && !block.ends_with_break() {
            self.insert_text_internal(brk, false, false);
        }
        self.insert_text_internal(brk, false, false);
        true
    }

    // --- MARK: Clipboard surface ---

    /// The selected text, if any. The host owns the platform clipboard.
    pub fn copy(&mut self) -> Option<String> {
        self.editor.selected_text()
    }

    /// Removes and returns the selected text. No-op in read-only mode.
    pub fn cut(&mut self) -> Option<String> {
        if self.editor.read_only {
            return None;
        }
        let text = self.editor.selected_text()?;
        self.refresh_layout();
        self.remove_selection_internal();
        self.scroll_if_needed();
        self.listener.on_change();
        Some(text)
    }

    /// Inserts clipboard text at the caret. Returns `true` if the buffer
    /// changed.
    pub fn paste(&mut self, text: &str) -> bool {
        if self.editor.read_only || text.is_empty() {
            return false;
        }
        self.refresh_layout();
        self.insert_text_internal(text, false, false);
        self.scroll_if_needed();
        self.listener.on_change();
        true
    }

    // --- MARK: Undo/redo ---

    /// Undoes the most recent edit. Returns `true` if anything happened.
    pub fn undo(&mut self) -> bool {
        if self.editor.read_only || !self.editor.undoredo.can_undo() {
            return false;
        }
        self.refresh_layout();
        let Some(event) = self.editor.undoredo.undos.pop() else {
            return false;
        };
        self.replay(&event, true);
        self.editor.undoredo.redos.push(event);
        true
    }

    /// Redoes the most recently undone edit. Returns `true` if anything
    /// happened.
    pub fn redo(&mut self) -> bool {
        if self.editor.read_only || !self.editor.undoredo.can_redo() {
            return false;
        }
        self.refresh_layout();
        let Some(event) = self.editor.undoredo.redos.pop() else {
            return false;
        };
        self.replay(&event, false);
        self.editor.undoredo.undos.push(event);
        true
    }

    /// Replays `event`, inverted when undoing: an insert is undone by
    /// removing the recorded span, a removal by re-inserting the recorded
    /// text. Either way the affected span ends up selected so consecutive
    /// undos highlight what changed.
    fn replay(&mut self, event: &UndoEvent, reverse: bool) {
        let as_insert = event.insert != reverse;
        self.editor.undoredo.applying = true;
        let ok = if as_insert {
            self.replay_insert(event)
        } else {
            self.replay_remove(event)
        };
        self.editor.undoredo.applying = false;
        if !ok {
            log::warn!(
                "undo replay abandoned: offset {} unresolvable",
                event.gofs
            );
            return;
        }
        self.scroll_if_needed();
        self.listener.on_change();
    }

    fn replay_insert(&mut self, event: &UndoEvent) -> bool {
        let Ok(pos) = TextOffset::from_global(&self.editor.blocks, event.gofs) else {
            return false;
        };
        self.editor.selection.select_nothing();
        let cx = self.cx();
        {
            let StyleEdit { caret, blocks, .. } = &mut *self.editor;
            caret.prefer_first = false;
            caret.place(blocks, &cx, pos.block, pos.ofs, false, false);
        }
        self.insert_text_internal(&event.text, false, false);
        let blocks = &self.editor.blocks;
        let (Ok(a), Ok(b)) = (
            TextOffset::from_global(blocks, event.gofs),
            TextOffset::from_global(blocks, event.gofs + event.text.len()),
        ) else {
            return false;
        };
        self.editor.selection.select(a, b);
        true
    }

    fn replay_remove(&mut self, event: &UndoEvent) -> bool {
        let blocks = &self.editor.blocks;
        let (Ok(a), Ok(b)) = (
            TextOffset::from_global(blocks, event.gofs),
            TextOffset::from_global(blocks, event.gofs + event.text.len()),
        ) else {
            return false;
        };
        self.editor.selection.select(a, b);
        self.remove_selection_internal();
        true
    }

    // --- MARK: Selection ---

    /// Selects the range between two positions, in either order.
    pub fn select(&mut self, a: TextOffset, b: TextOffset) {
        self.refresh_layout();
        self.editor.selection.select(a, b);
        self.editor.generation.nudge();
        self.invalidate_view();
    }

    /// Selects everything.
    pub fn select_all(&mut self) {
        let last = self.editor.blocks.len() - 1;
        let end = self.editor.blocks[last].len();
        self.select(TextOffset::new(0, 0), TextOffset::new(last, end));
    }

    /// Clears the selection.
    pub fn select_nothing(&mut self) {
        if self.editor.selection.is_selected() {
            self.editor.selection.select_nothing();
            self.editor.generation.nudge();
            self.invalidate_view();
        }
    }

    /// Moves the caret to a global byte offset.
    pub fn set_caret_ofs(&mut self, gofs: usize) -> Result<(), OffsetOutOfRange> {
        self.refresh_layout();
        let pos = TextOffset::from_global(&self.editor.blocks, gofs)?;
        let cx = self.cx();
        let StyleEdit { caret, blocks, .. } = &mut *self.editor;
        caret.prefer_first = false;
        caret.place(blocks, &cx, pos.block, pos.ofs, true, false);
        caret.update_wanted_x();
        self.editor.generation.nudge();
        Ok(())
    }

    // --- MARK: Input ---

    /// Handles a key press. Returns `true` if the key was consumed.
    ///
    /// Read-only mode suppresses the mutating branches but navigation and
    /// selection still work.
    pub fn key_down(&mut self, key: Key, mods: Modifiers) -> bool {
        if self.editor.select_state {
            return false;
        }
        self.refresh_layout();
        let ctrl = mods.contains(Modifiers::CTRL);
        let shift = mods.contains(Modifiers::SHIFT);
        let move_caret = matches!(
            key,
            Key::Left
                | Key::Right
                | Key::Up
                | Key::Down
                | Key::Home
                | Key::End
                | Key::PageUp
                | Key::PageDown
        );
        if !shift && move_caret {
            self.editor.selection.select_nothing();
        }
        let old_pos = self.editor.caret.pos;
        let cx = self.cx();
        let mut handled = true;
        let mut changed = false;
        match key {
            Key::Up | Key::Down if ctrl => {
                let line = self.metrics.line_height(&self.editor.font);
                let dy = if key == Key::Up { -line } else { line };
                let (x, y) = (self.editor.scroll_x, self.editor.scroll_y + dy);
                self.set_scroll_pos(x, y);
            }
            Key::Left | Key::Right => {
                let StyleEdit { caret, blocks, .. } = &mut *self.editor;
                caret.move_step(blocks, &cx, key == Key::Right, ctrl);
            }
            Key::Up | Key::Down => {
                let StyleEdit { caret, blocks, .. } = &mut *self.editor;
                let y = if key == Key::Up {
                    caret.y - 1
                } else {
                    caret.y + caret.height + 1
                };
                caret.place_point(blocks, &cx, caret.wanted_x, y);
            }
            Key::PageUp | Key::PageDown => {
                let page = self.editor.layout_height;
                let StyleEdit { caret, blocks, .. } = &mut *self.editor;
                let y = if key == Key::PageUp {
                    caret.y - page
                } else {
                    caret.y + caret.height + page
                };
                caret.place_point(blocks, &cx, caret.wanted_x, y);
            }
            Key::Home if ctrl => {
                let StyleEdit { caret, blocks, .. } = &mut *self.editor;
                caret.place_point(blocks, &cx, 0, 0);
            }
            Key::End if ctrl => {
                let bottom = self.editor.content_height;
                let StyleEdit { caret, blocks, .. } = &mut *self.editor;
                caret.place_point(blocks, &cx, FAR_RIGHT, bottom);
            }
            Key::Home => {
                let StyleEdit { caret, blocks, .. } = &mut *self.editor;
                caret.place_point(blocks, &cx, 0, caret.y);
            }
            Key::End => {
                let StyleEdit { caret, blocks, .. } = &mut *self.editor;
                caret.place_point(blocks, &cx, FAR_RIGHT, caret.y);
            }
            Key::Tab if self.editor.multiline && !self.editor.read_only && !shift => {
                self.insert_text_internal("\t", false, false);
                changed = true;
            }
            Key::Delete | Key::Backspace if !self.editor.read_only => {
                if !self.editor.selection.is_selected() {
                    {
                        let StyleEdit { caret, blocks, .. } = &mut *self.editor;
                        caret.move_step(blocks, &cx, key == Key::Delete, ctrl);
                    }
                    let caret_pos = self.editor.caret.pos;
                    self.editor.selection.select(old_pos, caret_pos);
                }
                self.remove_selection_internal();
                changed = true;
            }
            Key::Enter if self.editor.multiline && !ctrl && !self.editor.read_only => {
                self.insert_break();
                changed = true;
            }
            Key::Char(c) if !ctrl && !self.editor.read_only && !c.is_control() => {
                let mut buf = [0_u8; 4];
                self.insert_text_internal(c.encode_utf8(&mut buf), false, false);
                changed = true;
            }
            _ => handled = false,
        }

        if shift && move_caret {
            let caret_pos = self.editor.caret.pos;
            self.editor.selection.select_to_caret(old_pos, caret_pos);
        }
        if !matches!(key, Key::Up | Key::Down | Key::PageUp | Key::PageDown) {
            self.editor.caret.update_wanted_x();
        }
        self.editor.caret.on = true;

        if key == Key::Enter && !ctrl && self.listener.on_enter() {
            handled = true;
        }
        if changed {
            self.listener.on_change();
        }
        if handled {
            self.scroll_if_needed();
            self.editor.generation.nudge();
            self.invalidate_view();
        }
        handled
    }

    /// Handles a pointer press. `clicks` is 1 for a single click, 2 for a
    /// double click (which selects the word under the pointer).
    pub fn mouse_down(
        &mut self,
        point: Point,
        button: MouseButton,
        clicks: u32,
        mods: Modifiers,
    ) -> bool {
        if button != MouseButton::Left {
            return false;
        }
        self.refresh_layout();
        let cx = self.cx();
        let doc_x = point.x + self.editor.scroll_x;
        let doc_y = point.y + self.editor.scroll_y;
        let old_pos = self.editor.caret.pos;
        {
            let StyleEdit { caret, blocks, .. } = &mut *self.editor;
            caret.place_point(blocks, &cx, doc_x, doc_y);
            caret.update_wanted_x();
            caret.on = true;
        }
        if clicks == 2 {
            self.select_word_at_caret();
            self.editor.select_state = false;
        } else if mods.contains(Modifiers::SHIFT) {
            let caret_pos = self.editor.caret.pos;
            let editor = &mut *self.editor;
            editor.selection.select_to_caret(old_pos, caret_pos);
            // Keep dragging from the selection end away from the caret.
            editor.mousedown_pos = if editor.selection.start() == caret_pos {
                editor.selection.stop()
            } else {
                editor.selection.start()
            };
            editor.select_state = true;
        } else {
            let editor = &mut *self.editor;
            editor.selection.select_nothing();
            editor.mousedown_pos = editor.caret.pos;
            editor.select_state = true;
        }
        self.editor.generation.nudge();
        self.invalidate_view();
        true
    }

    /// Handles pointer movement; extends the selection while dragging.
    pub fn mouse_move(&mut self, point: Point) -> bool {
        if !self.editor.select_state {
            return false;
        }
        self.refresh_layout();
        let cx = self.cx();
        let doc_x = point.x + self.editor.scroll_x;
        let doc_y = point.y + self.editor.scroll_y;
        {
            let StyleEdit { caret, blocks, .. } = &mut *self.editor;
            caret.place_point(blocks, &cx, doc_x, doc_y);
            caret.update_wanted_x();
        }
        let editor = &mut *self.editor;
        let anchor = editor.mousedown_pos;
        let caret_pos = editor.caret.pos;
        editor.selection.select(anchor, caret_pos);
        editor.generation.nudge();
        self.scroll_if_needed();
        self.invalidate_view();
        true
    }

    /// Handles a pointer release, ending any drag selection.
    pub fn mouse_up(&mut self, _point: Point, button: MouseButton) -> bool {
        if button != MouseButton::Left {
            return false;
        }
        let was_dragging = self.editor.select_state;
        self.editor.select_state = false;
        was_dragging
    }

    fn select_word_at_caret(&mut self) {
        let pos = self.editor.caret.pos;
        let text = self.editor.blocks[pos.block].text();
        let mut a = pos.ofs;
        let mut b = pos.ofs;
        match text[pos.ofs..].chars().next() {
            Some(c) if !is_wordbreak(c) => {
                while let Some(p) = text[..a].chars().next_back() {
                    if is_wordbreak(p) {
                        break;
                    }
                    a -= p.len_utf8();
                }
                while let Some(n) = text[b..].chars().next() {
                    if is_wordbreak(n) {
                        break;
                    }
                    b += n.len_utf8();
                }
            }
            Some(c) => b += c.len_utf8(),
            None => {
                while let Some(p) = text[..a].chars().next_back() {
                    if is_wordbreak(p) {
                        break;
                    }
                    a -= p.len_utf8();
                }
            }
        }
        self.editor
            .selection
            .select(TextOffset::new(pos.block, a), TextOffset::new(pos.block, b));
    }

    // --- MARK: Focus and caret blink ---

    /// Focus change: shows or hides the caret and drives the blink timer.
    pub fn focus(&mut self, focused: bool) {
        self.editor.caret.on = focused;
        if focused {
            self.listener.caret_blink_start();
        } else {
            self.listener.caret_blink_stop();
        }
        self.editor.generation.nudge();
        self.invalidate_caret();
    }

    /// One tick of the host blink timer: toggles the caret phase.
    pub fn caret_blink(&mut self) {
        self.editor.caret.on = !self.editor.caret.on;
        self.editor.generation.nudge();
        self.invalidate_caret();
    }

    // --- MARK: Painting ---

    /// Paints everything intersecting `rect` (widget-local coordinates)
    /// through the listener's draw primitives.
    pub fn paint(&mut self, rect: Rect, color: Color) {
        self.refresh_layout();
        let cx = self.cx();
        let editor = &*self.editor;
        let listener = &mut *self.listener;
        let scroll_x = editor.scroll_x;
        let scroll_y = editor.scroll_y;
        let mut props = TextProps::new(color);
        for (bi, block) in editor.blocks.iter().enumerate() {
            let top = block.ypos - scroll_y;
            if top > rect.y + rect.h {
                break;
            }
            let visible = top + block.height > rect.y;
            let sel = editor.selection.range_in_block(bi, block.len());

            if visible {
                if let Some(range) = &sel {
                    for frag in block.fragments() {
                        if frag.is_content() {
                            continue;
                        }
                        let a = range.start.max(frag.ofs());
                        let b = range.end.min(frag.end());
                        if a >= b {
                            continue;
                        }
                        let x1 = frag.prefix_width(&cx, block.text(), a);
                        let mut x2 = frag.prefix_width(&cx, block.text(), b);
                        if frag.is_break() {
                            // Give a selected break some visible width.
                            x2 = x1 + cx.metrics.string_width(&cx.font, " ");
                        }
                        listener.draw_text_selection_bg(Rect::new(
                            frag.xpos() + x1 - scroll_x,
                            block.ypos + frag.line_ypos() - scroll_y,
                            x2 - x1,
                            frag.line_height(),
                        ));
                    }
                }
            }

            // Off-screen blocks still advance the style stack so visible
            // ones below paint with the right state.
            for frag in block.fragments() {
                let x = frag.xpos() - scroll_x;
                let y = block.ypos + frag.ypos() - scroll_y;
                match frag.kind() {
                    FragmentKind::Content(content) => match content {
                        FragmentContent::UnderlineBegin => props.push(StyleChange::Underline),
                        FragmentContent::ColorBegin(c) => props.push(StyleChange::Color(*c)),
                        FragmentContent::StyleEnd => props.pop(),
                        FragmentContent::Rule { height, .. } => {
                            if visible {
                                listener.draw_rect_fill(
                                    Rect::new(x, y, frag.width(), *height),
                                    props.color(),
                                );
                            }
                        }
                        FragmentContent::Embedded(embedded) => {
                            if visible {
                                let h = embedded.height(cx.metrics, &cx.font);
                                let frame = Rect::new(x, y, frag.width(), h);
                                embedded.paint(listener, frame, props.color());
                                let selected = sel
                                    .as_ref()
                                    .is_some_and(|range| range.start <= frag.ofs() && frag.end() <= range.end);
                                if selected {
                                    listener.draw_content_selection_fg(frame);
                                }
                            }
                        }
                    },
                    FragmentKind::Text => {
                        if visible {
                            let text = &block.text()[frag.text_range()];
                            if cx.password {
                                let masked = mask(text.chars().count());
                                listener.draw_string(x, y, &cx.font, props.color(), &masked);
                            } else {
                                listener.draw_string(x, y, &cx.font, props.color(), text);
                            }
                            if props.underline() {
                                let baseline = cx.metrics.baseline(&cx.font);
                                listener.draw_rect_fill(
                                    Rect::new(x, y + baseline + 1, frag.width(), 1),
                                    props.color(),
                                );
                            }
                        }
                    }
                    FragmentKind::Tab => {
                        if visible && cx.show_whitespace {
                            listener.draw_string(x, y, &cx.font, props.color(), TAB_STR);
                        }
                    }
                    FragmentKind::Break => {
                        if visible {
                            if cx.show_whitespace {
                                listener.draw_string(x, y, &cx.font, props.color(), BREAK_STR);
                            }
                            listener.on_break();
                        }
                    }
                }
            }
        }
        if editor.caret.on && !editor.read_only {
            let caret = editor.caret.rect().offset(-scroll_x, -scroll_y);
            if caret.intersects(&rect) {
                listener.draw_caret(caret);
            }
        }
    }

    // --- MARK: Internal helpers ---

    fn invalidate_view(&mut self) {
        let editor = &*self.editor;
        let w = editor.layout_width.max(editor.content_width);
        let h = editor.layout_height.max(editor.content_height);
        self.listener.invalidate(Rect::new(0, 0, w, h));
    }

    fn invalidate_from(&mut self, idx: usize) {
        let editor = &*self.editor;
        let top = editor.blocks.get(idx).map_or(0, ParagraphBlock::ypos) - editor.scroll_y;
        let w = editor.layout_width.max(editor.content_width);
        let bottom = (editor.content_height - editor.scroll_y).max(editor.layout_height);
        self.listener.invalidate(Rect::new(0, top, w, bottom - top));
    }

    fn invalidate_caret(&mut self) {
        let caret = self
            .editor
            .caret
            .rect()
            .offset(-self.editor.scroll_x, -self.editor.scroll_y);
        self.listener.invalidate(caret);
    }
}

fn first_line_of(text: &str) -> &str {
    match text.find(['\r', '\n']) {
        Some(i) => &text[..i],
        None => text,
    }
}

/// Splits `text` into segments, each ending just after a break sequence.
/// The final segment may lack a break; a trailing break does not produce an
/// empty segment. Always returns at least one segment.
fn split_after_breaks(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                i += 1;
                if bytes.get(i) == Some(&b'\n') {
                    i += 1;
                }
                out.push(text[start..i].to_string());
                start = i;
            }
            b'\n' => {
                i += 1;
                out.push(text[start..i].to_string());
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < bytes.len() || out.is_empty() {
        out.push(text[start..].to_string());
    }
    out
}
