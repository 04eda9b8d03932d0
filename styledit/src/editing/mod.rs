// Copyright 2025 the Styledit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The text buffer and its editing machinery.

mod caret;
mod editor;
mod offset;
mod selection;
mod undo;

pub use caret::Caret;
pub use editor::{EditDriver, Generation, StyleEdit};
pub use offset::TextOffset;
pub use selection::Selection;
pub use undo::UndoEvent;

pub(crate) use undo::UndoRedoStack;
