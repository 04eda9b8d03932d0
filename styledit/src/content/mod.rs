// Copyright 2025 the Styledit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Embedded inline content.
//!
//! A content factory recognizes bracket-delimited directives inside source
//! text and turns each into a fragment of its own. The standard factory
//! understands a horizontal rule, underline and color toggles and a style
//! pop; hosts can substitute their own factory to embed arbitrary objects.

use alloc::boxed::Box;
use core::fmt::Debug;

use peniko::Color;

use crate::geometry::Rect;
use crate::listener::EditListener;
use crate::measure::TextMetrics;
use crate::style::FontDescription;

/// A host-embedded inline object.
///
/// Embedded content flows with the text: the layout asks it for its size and
/// baseline, and the paint pass hands it the rectangle it ended up in.
pub trait EmbeddedContent: Debug {
    /// Width in pixels.
    fn width(&self, metrics: &dyn TextMetrics, font: &FontDescription) -> i32;

    /// Height in pixels.
    fn height(&self, metrics: &dyn TextMetrics, font: &FontDescription) -> i32;

    /// Distance from the top to the baseline. Defaults to sitting on the
    /// baseline.
    fn baseline(&self, metrics: &dyn TextMetrics, font: &FontDescription) -> i32 {
        self.height(metrics, font)
    }

    /// Paint into `rect` (widget-local coordinates).
    fn paint(&self, listener: &mut dyn EditListener, rect: Rect, color: Color);
}

/// The content carried by a non-text fragment.
#[derive(Debug)]
pub enum FragmentContent {
    /// A horizontal rule spanning a percentage of the layout width.
    Rule {
        /// Width as a percentage of the layout width.
        width_percent: i32,
        /// Thickness in pixels.
        height: i32,
    },
    /// Start underlining subsequent text.
    UnderlineBegin,
    /// Start coloring subsequent text.
    ColorBegin(Color),
    /// Pop the most recent underline or color toggle.
    StyleEnd,
    /// A host-embedded object.
    Embedded(Box<dyn EmbeddedContent>),
}

impl FragmentContent {
    pub(crate) fn width(
        &self,
        metrics: &dyn TextMetrics,
        font: &FontDescription,
        layout_width: i32,
    ) -> i32 {
        match self {
            Self::Rule { width_percent, .. } => layout_width.max(0) * width_percent / 100,
            Self::UnderlineBegin | Self::ColorBegin(_) | Self::StyleEnd => 0,
            Self::Embedded(content) => content.width(metrics, font),
        }
    }

    pub(crate) fn height(&self, metrics: &dyn TextMetrics, font: &FontDescription) -> i32 {
        match self {
            Self::Rule { height, .. } => *height,
            Self::UnderlineBegin | Self::ColorBegin(_) | Self::StyleEnd => 0,
            Self::Embedded(content) => content.height(metrics, font),
        }
    }

    pub(crate) fn baseline(&self, metrics: &dyn TextMetrics, font: &FontDescription) -> i32 {
        match self {
            Self::Embedded(content) => content.baseline(metrics, font),
            _ => self.height(metrics, font),
        }
    }
}

/// Recognizes embedded-content markup inside source text.
pub trait ContentFactory: Debug {
    /// Returns the byte length of a directive at the start of `text`, or
    /// `None` if `text` does not start with one.
    fn recognized_length(&self, text: &str) -> Option<usize>;

    /// Creates the content for a directive at the start of `text`.
    fn create_content(&self, text: &str) -> Option<FragmentContent>;
}

/// The built-in factory.
///
/// Recognized directives: `<hr>`, `<u>`, `<color RRGGBB>` (an optional `#`
/// prefix is accepted) and the style pop `</>`. Unrecognized bracketed text
/// is left alone and flows as literal text.
#[derive(Copy, Clone, Default, Debug)]
pub struct StandardContentFactory;

impl ContentFactory for StandardContentFactory {
    fn recognized_length(&self, text: &str) -> Option<usize> {
        parse_directive(text).map(|(len, _)| len)
    }

    fn create_content(&self, text: &str) -> Option<FragmentContent> {
        parse_directive(text).map(|(_, content)| content)
    }
}

fn parse_directive(text: &str) -> Option<(usize, FragmentContent)> {
    if let Some(rest) = text.strip_prefix("<color ") {
        let end = rest.find('>')?;
        let color = parse_color(&rest[..end])?;
        return Some(("<color ".len() + end + 1, FragmentContent::ColorBegin(color)));
    }
    if text.starts_with("<hr>") {
        return Some((
            4,
            FragmentContent::Rule {
                width_percent: 100,
                height: 2,
            },
        ));
    }
    if text.starts_with("<u>") {
        return Some((3, FragmentContent::UnderlineBegin));
    }
    if text.starts_with("</>") {
        return Some((3, FragmentContent::StyleEnd));
    }
    None
}

fn parse_color(s: &str) -> Option<Color> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::from_rgba8(r, g, b, 255))
}
