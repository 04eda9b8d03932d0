// Copyright 2025 the Styledit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::utils::TestEnv;
use styledit::{Key, Modifiers, TextOffset};

fn type_str(env: &mut TestEnv, text: &str) {
    for c in text.chars() {
        env.driver().key_down(Key::Char(c), Modifiers::empty());
    }
}

#[test]
fn typing_a_word_is_one_undo_step() {
    let mut env = TestEnv::new();
    type_str(&mut env, "hello");
    assert!(env.driver().undo());
    assert_eq!(env.editor.text(), "");
}

#[test]
fn two_words_are_two_undo_steps() {
    let mut env = TestEnv::new();
    type_str(&mut env, "hello world");
    env.driver().undo();
    assert_eq!(env.editor.text(), "hello ");
    env.driver().undo();
    assert_eq!(env.editor.text(), "");
}

#[test]
fn undo_then_redo_restores_the_edit() {
    let mut env = TestEnv::new();
    type_str(&mut env, "hello");
    env.driver().undo();
    assert!(env.driver().redo());
    assert_eq!(env.editor.text(), "hello");
}

#[test]
fn undo_restores_a_deleted_selection() {
    let mut env = TestEnv::new();
    env.driver().set_text("hello world foo");
    env.driver().select(TextOffset::new(0, 4), TextOffset::new(0, 8));
    env.driver().delete_selected();
    assert_eq!(env.editor.text(), "hellrld foo");
    env.driver().undo();
    assert_eq!(env.editor.text(), "hello world foo");
    // The restored span stays selected so the change is visible.
    assert_eq!(env.editor.selected_text().as_deref(), Some("o wo"));
}

#[test]
fn undo_restores_a_multi_block_removal() {
    let mut env = TestEnv::multiline();
    env.driver().set_text("ab\ncd\nef");
    env.driver().select(TextOffset::new(0, 1), TextOffset::new(2, 1));
    env.driver().delete_selected();
    assert_eq!(env.editor.text(), "af");
    env.driver().undo();
    assert_eq!(env.editor.text(), "ab\ncd\nef");
    assert_eq!(env.editor.blocks().len(), 3);
    env.driver().redo();
    assert_eq!(env.editor.text(), "af");
}

#[test]
fn undo_removes_a_pasted_insert() {
    let mut env = TestEnv::multiline();
    env.driver().set_text("start");
    env.driver().set_caret_ofs(5).unwrap();
    env.driver().paste("\nmiddle\nend");
    assert_eq!(env.editor.text(), "start\nmiddle\nend");
    env.driver().undo();
    assert_eq!(env.editor.text(), "start");
    env.driver().redo();
    assert_eq!(env.editor.text(), "start\nmiddle\nend");
}

#[test]
fn a_fresh_edit_clears_the_redo_list() {
    let mut env = TestEnv::new();
    type_str(&mut env, "one");
    env.driver().undo();
    assert!(env.editor.can_redo());
    type_str(&mut env, "two");
    assert!(!env.editor.can_redo());
    assert!(!env.driver().redo());
}

#[test]
fn undo_on_an_empty_stack_is_a_no_op() {
    let mut env = TestEnv::new();
    assert!(!env.driver().undo());
    assert!(!env.driver().redo());
}

#[test]
fn set_text_clears_history() {
    let mut env = TestEnv::new();
    type_str(&mut env, "abc");
    env.driver().set_text("fresh");
    assert!(!env.editor.can_undo());
    assert!(!env.driver().undo());
    assert_eq!(env.editor.text(), "fresh");
}

#[test]
fn read_only_suppresses_undo() {
    let mut env = TestEnv::new();
    type_str(&mut env, "abc");
    env.editor.set_read_only(true);
    assert!(!env.driver().undo());
    assert_eq!(env.editor.text(), "abc");
}

#[test]
fn breaks_split_undo_steps() {
    let mut env = TestEnv::multiline();
    type_str(&mut env, "ab");
    env.driver().key_down(Key::Enter, Modifiers::empty());
    type_str(&mut env, "cd");
    // Typing, the double break, then more typing: undoing the last word
    // leaves the break in place.
    env.driver().undo();
    assert_eq!(env.editor.text(), "ab\n\n");
}

#[test]
fn interleaved_edits_undo_in_reverse_order() {
    let mut env = TestEnv::new();
    env.driver().set_text("abc");
    env.driver().set_caret_ofs(3).unwrap();
    type_str(&mut env, "d");
    env.driver().select(TextOffset::new(0, 0), TextOffset::new(0, 1));
    env.driver().delete_selected();
    assert_eq!(env.editor.text(), "bcd");
    env.driver().undo();
    assert_eq!(env.editor.text(), "abcd");
    env.driver().undo();
    assert_eq!(env.editor.text(), "abc");
}
