// Copyright 2025 the Styledit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host callback boundary.

use peniko::Color;

use crate::geometry::Rect;
use crate::style::FontDescription;

/// Callbacks implemented by the host widget.
///
/// Paint primitives receive coordinates local to the widget (scroll already
/// applied). All methods have no-op defaults so hosts and tests implement
/// only what they observe.
///
/// A listener is only ever invoked through an [`EditDriver`], which holds the
/// editor exclusively borrowed for the whole operation. A callback therefore
/// cannot re-enter or delete the editor mid-operation; the borrow checker
/// enforces what the original pointer-based design had to guard with
/// liveness checks.
///
/// [`EditDriver`]: crate::EditDriver
#[allow(unused_variables, reason = "default implementations ignore their arguments")]
pub trait EditListener {
    /// A region of the widget needs repainting.
    fn invalidate(&mut self, rect: Rect) {}

    /// Draw `text` with its top-left corner at `(x, y)`.
    fn draw_string(&mut self, x: i32, y: i32, font: &FontDescription, color: Color, text: &str) {}

    /// Draw a rectangle outline.
    fn draw_rect(&mut self, rect: Rect, color: Color) {}

    /// Draw a filled rectangle.
    fn draw_rect_fill(&mut self, rect: Rect, color: Color) {}

    /// Draw the background highlight for selected text.
    fn draw_text_selection_bg(&mut self, rect: Rect) {}

    /// Draw the foreground highlight for selected embedded content.
    fn draw_content_selection_fg(&mut self, rect: Rect) {}

    /// Draw the caret.
    fn draw_caret(&mut self, rect: Rect) {}

    /// The scroll offset changed by `(dx, dy)`.
    fn scroll(&mut self, dx: i32, dy: i32) {}

    /// The content or layout size changed; scrollbar limits need syncing.
    fn update_scrollbars(&mut self) {}

    /// The editor gained focus; start the caret blink timer.
    fn caret_blink_start(&mut self) {}

    /// The editor lost focus; stop the caret blink timer.
    fn caret_blink_stop(&mut self) {}

    /// The text content changed.
    fn on_change(&mut self) {}

    /// Enter was pressed without inserting a break. Return `true` to mark
    /// the key as handled.
    fn on_enter(&mut self) -> bool {
        false
    }

    /// Called once per line-break fragment painted, in document order.
    fn on_break(&mut self) {}
}
