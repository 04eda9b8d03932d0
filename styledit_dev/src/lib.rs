// Copyright 2025 the Styledit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic test doubles for driving Styledit without a font stack:
//! a scripted measurement provider and a recording listener.
//!
//! This is an internal development dependency of the Styledit project and
//! makes no stability guarantees.

use styledit::{Color, EditListener, FontDescription, Rect, TextMetrics};

/// Fixed-advance measurement: every character is `char_width` pixels wide
/// unless overridden, and every line has the same height and baseline.
///
/// The defaults (10/10/8) make layout arithmetic readable in tests: a
/// 100-pixel layout fits exactly ten characters.
#[derive(Clone, Debug)]
pub struct FixedMetrics {
    /// Width of one character in pixels.
    pub char_width: i32,
    /// Height of one line in pixels.
    pub line_height: i32,
    /// Distance from the line top to the baseline in pixels.
    pub baseline: i32,
    /// Per-character width overrides.
    pub overrides: Vec<(char, i32)>,
}

impl Default for FixedMetrics {
    fn default() -> Self {
        Self {
            char_width: 10,
            line_height: 10,
            baseline: 8,
            overrides: Vec::new(),
        }
    }
}

impl FixedMetrics {
    /// Overrides the width of one character.
    #[must_use]
    pub fn with_override(mut self, c: char, width: i32) -> Self {
        self.overrides.push((c, width));
        self
    }
}

impl TextMetrics for FixedMetrics {
    fn string_width(&self, _font: &FontDescription, text: &str) -> i32 {
        text.chars()
            .map(|c| {
                self.overrides
                    .iter()
                    .find(|(o, _)| *o == c)
                    .map_or(self.char_width, |(_, w)| *w)
            })
            .sum()
    }

    fn line_height(&self, _font: &FontDescription) -> i32 {
        self.line_height
    }

    fn baseline(&self, _font: &FontDescription) -> i32 {
        self.baseline
    }
}

/// One recorded listener callback.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A repaint request.
    Invalidate(Rect),
    /// A painted string.
    DrawString {
        /// Left edge.
        x: i32,
        /// Top edge.
        y: i32,
        /// Paint color.
        color: Color,
        /// The painted text.
        text: String,
    },
    /// A painted rectangle outline.
    DrawRect(Rect, Color),
    /// A painted filled rectangle.
    DrawRectFill(Rect, Color),
    /// A painted selection background.
    SelectionBg(Rect),
    /// A painted content-selection foreground.
    ContentSelectionFg(Rect),
    /// A painted caret.
    Caret(Rect),
    /// A scroll notification.
    Scroll {
        /// Horizontal delta.
        dx: i32,
        /// Vertical delta.
        dy: i32,
    },
    /// A scrollbar-limit sync request.
    UpdateScrollbars,
    /// Caret blinking started.
    CaretBlinkStart,
    /// Caret blinking stopped.
    CaretBlinkStop,
    /// A change notification.
    OnChange,
    /// An enter notification.
    OnEnter,
    /// A per-line-break paint hook.
    OnBreak,
}

/// A listener that records every callback for assertions.
#[derive(Clone, Debug, Default)]
pub struct RecordingListener {
    /// Recorded callbacks in call order.
    pub events: Vec<Event>,
    /// What [`EditListener::on_enter`] reports back.
    pub enter_result: bool,
}

impl RecordingListener {
    /// Discards everything recorded so far.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// The painted strings, in paint order.
    pub fn strings(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::DrawString { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Counts recorded events matching `pred`.
    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|event| pred(event)).count()
    }
}

impl EditListener for RecordingListener {
    fn invalidate(&mut self, rect: Rect) {
        self.events.push(Event::Invalidate(rect));
    }

    fn draw_string(&mut self, x: i32, y: i32, _font: &FontDescription, color: Color, text: &str) {
        self.events.push(Event::DrawString {
            x,
            y,
            color,
            text: text.to_string(),
        });
    }

    fn draw_rect(&mut self, rect: Rect, color: Color) {
        self.events.push(Event::DrawRect(rect, color));
    }

    fn draw_rect_fill(&mut self, rect: Rect, color: Color) {
        self.events.push(Event::DrawRectFill(rect, color));
    }

    fn draw_text_selection_bg(&mut self, rect: Rect) {
        self.events.push(Event::SelectionBg(rect));
    }

    fn draw_content_selection_fg(&mut self, rect: Rect) {
        self.events.push(Event::ContentSelectionFg(rect));
    }

    fn draw_caret(&mut self, rect: Rect) {
        self.events.push(Event::Caret(rect));
    }

    fn scroll(&mut self, dx: i32, dy: i32) {
        self.events.push(Event::Scroll { dx, dy });
    }

    fn update_scrollbars(&mut self) {
        self.events.push(Event::UpdateScrollbars);
    }

    fn caret_blink_start(&mut self) {
        self.events.push(Event::CaretBlinkStart);
    }

    fn caret_blink_stop(&mut self) {
        self.events.push(Event::CaretBlinkStop);
    }

    fn on_change(&mut self) {
        self.events.push(Event::OnChange);
    }

    fn on_enter(&mut self) -> bool {
        self.events.push(Event::OnEnter);
        self.enter_result
    }

    fn on_break(&mut self) {
        self.events.push(Event::OnBreak);
    }
}
