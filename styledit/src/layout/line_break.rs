// Copyright 2025 the Styledit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Word-break classification and break-opportunity rules.

use crate::measure::TextMetrics;
use crate::style::FontDescription;

/// Tab stops snap to the next multiple of this many `x` widths.
const TAB_SPACE: i32 = 4;

pub(crate) fn is_space(c: char) -> bool {
    c == ' '
}

pub(crate) fn is_linebreak(c: char) -> bool {
    c == '\n' || c == '\r'
}

/// Characters that terminate a word run during fragmentation. Each one
/// becomes a fragment of its own.
pub(crate) fn is_wordbreak(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t'
            | '\n'
            | '\r'
            | '-'
            | '('
            | ')'
            | '/'
            | '\\'
            | '*'
            | '+'
            | ','
            | '.'
            | ';'
            | ':'
            | '>'
            | '<'
            | '&'
            | '#'
            | '!'
            | '='
            | '['
            | ']'
            | '{'
            | '}'
            | '^'
    )
}

/// Returns `true` if a line may never start with the character at `ofs`.
///
/// A quote only permits the break when it opens a space-delimited word.
pub(crate) fn is_never_break_before(text: &str, ofs: usize) -> bool {
    let Some(c) = text[ofs..].chars().next() else {
        return false;
    };
    match c {
        '\n' | '\r' | ' ' | '-' | '.' | ',' | ':' | ';' | '!' | '?' | ')' | ']' | '}' | '>' => {
            true
        }
        '\'' | '"' => ofs > 0 && !text[..ofs].ends_with(' '),
        _ => false,
    }
}

/// Returns `true` if a line may never end with the character at `ofs`.
///
/// A quote only permits the break when it closes a space-delimited word.
pub(crate) fn is_never_break_after(text: &str, ofs: usize) -> bool {
    let mut chars = text[ofs..].chars();
    let Some(c) = chars.next() else {
        return false;
    };
    match c {
        '(' | '[' | '{' | '<' => true,
        '\'' | '"' => matches!(chars.next(), Some(next) if next != ' '),
        _ => false,
    }
}

/// Width of a tab starting at `x`: the distance to the next tab stop.
pub(crate) fn tab_width(metrics: &dyn TextMetrics, font: &FontDescription, x: i32) -> i32 {
    let stop = metrics.string_width(font, "x") * TAB_SPACE;
    if stop <= 0 {
        return 0;
    }
    (x / stop + 1) * stop - x
}
