// Copyright 2025 the Styledit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paragraph blocks, fragments and the wrapping algorithm.

mod block;
mod fragment;
mod line_break;

pub use block::ParagraphBlock;
pub use fragment::{Fragment, FragmentKind};

pub(crate) use fragment::{BREAK_STR, TAB_STR, mask};
pub(crate) use line_break::{is_linebreak, is_space, is_wordbreak};

use crate::measure::TextMetrics;
use crate::style::{FontDescription, TextAlign};

/// Everything a layout pass needs from the buffer, by value or shared
/// borrow, so blocks can be mutated while it is held.
#[derive(Copy, Clone)]
pub(crate) struct LayoutCx<'a> {
    pub(crate) metrics: &'a dyn TextMetrics,
    pub(crate) font: FontDescription,
    pub(crate) layout_width: i32,
    pub(crate) align: TextAlign,
    pub(crate) wrapping: bool,
    pub(crate) password: bool,
    pub(crate) show_whitespace: bool,
}
