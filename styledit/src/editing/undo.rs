// Copyright 2025 the Styledit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;
use alloc::vec::Vec;

/// One recorded edit: an insertion or a removal at a global byte offset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UndoEvent {
    /// Global byte offset of the edit.
    pub gofs: usize,
    /// The text that was inserted or removed.
    pub text: String,
    /// `true` for an insertion, `false` for a removal.
    pub insert: bool,
}

/// Two LIFO stacks of edits with adjacent-typing coalescing.
#[derive(Debug, Default)]
pub(crate) struct UndoRedoStack {
    pub(crate) undos: Vec<UndoEvent>,
    pub(crate) redos: Vec<UndoEvent>,
    /// Set while an event is being replayed; commits are ignored so the
    /// replay does not record itself.
    pub(crate) applying: bool,
}

impl UndoRedoStack {
    /// Records an edit and clears the redo list.
    ///
    /// A single-character insertion immediately following the previous
    /// insert event coalesces into it while the pair still reads as one
    /// typed word: a space extends an event containing no line break, and
    /// any other character extends an event containing neither space nor
    /// line break.
    pub(crate) fn commit(&mut self, gofs: usize, text: String, insert: bool) {
        debug_assert!(!self.applying, "commit during undo/redo replay");
        if self.applying {
            return;
        }
        self.redos.clear();
        if insert && single_char(&text) {
            if let Some(prev) = self.undos.last_mut() {
                if prev.insert && prev.gofs + prev.text.len() == gofs && coalesces(&prev.text, &text)
                {
                    prev.text.push_str(&text);
                    return;
                }
            }
        }
        self.undos.push(UndoEvent { gofs, text, insert });
    }

    pub(crate) fn can_undo(&self) -> bool {
        !self.undos.is_empty()
    }

    pub(crate) fn can_redo(&self) -> bool {
        !self.redos.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.undos.clear();
        self.redos.clear();
    }
}

fn single_char(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some() && chars.next().is_none()
}

fn coalesces(prev: &str, new: &str) -> bool {
    if new == " " {
        !prev.contains(['\r', '\n'])
    } else {
        !prev.contains([' ', '\r', '\n'])
    }
}
