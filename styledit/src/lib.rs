// Copyright 2025 the Styledit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line-wrapped, styleable text editing.
//!
//! Styledit provides a mutable text model for edit widgets: paragraph blocks
//! split into layout fragments, greedy word wrapping, caret navigation,
//! selection, undo/redo with coalescing, and embedded inline content.
//!
//! The engine never rasterizes. Text measurement is supplied through the
//! [`TextMetrics`] trait and all output happens through the paint primitives
//! of an [`EditListener`]. State lives in [`StyleEdit`]; every operation that
//! can re-layout or call back into the host runs on an [`EditDriver`], a
//! short-lived wrapper bundling the editor with both backends.

#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("styledit requires either the `std` or `libm` feature to be enabled");

extern crate alloc;

mod error;
mod geometry;
mod inputs;
mod listener;
mod measure;

pub mod content;
pub mod editing;
pub mod layout;
pub mod style;

pub use peniko::Color;

pub use content::{ContentFactory, EmbeddedContent, FragmentContent, StandardContentFactory};
pub use editing::{Caret, EditDriver, Generation, Selection, StyleEdit, TextOffset, UndoEvent};
pub use error::OffsetOutOfRange;
pub use geometry::{Point, Rect};
pub use inputs::{Key, Modifiers, MouseButton};
pub use layout::{Fragment, FragmentKind, ParagraphBlock};
pub use listener::EditListener;
pub use measure::TextMetrics;
pub use style::{FontDescription, TextAlign};
