// Copyright 2025 the Styledit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyboard and pointer input types.

use bitflags::bitflags;

/// A key press delivered to [`EditDriver::key_down`](crate::EditDriver::key_down).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Key {
    /// A printable character.
    Char(char),
    /// Arrow up.
    Up,
    /// Arrow down.
    Down,
    /// Arrow left.
    Left,
    /// Arrow right.
    Right,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// Home.
    Home,
    /// End.
    End,
    /// Tab.
    Tab,
    /// Enter/Return.
    Enter,
    /// Backspace.
    Backspace,
    /// Forward delete.
    Delete,
}

bitflags! {
    /// Keyboard modifier state.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        /// Shift.
        const SHIFT = 1 << 0;
        /// Control.
        const CTRL = 1 << 1;
        /// Alt/Option.
        const ALT = 1 << 2;
        /// Logo/Command.
        const SUPER = 1 << 3;
    }
}

/// A pointer button.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Middle button.
    Middle,
    /// Secondary button.
    Right,
}
