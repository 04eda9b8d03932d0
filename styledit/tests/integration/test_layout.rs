// Copyright 2025 the Styledit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use super::utils::TestEnv;
use styledit::TextAlign;

fn fragment_texts(env: &TestEnv, block: usize) -> Vec<&str> {
    let block = &env.editor.blocks()[block];
    block
        .fragments()
        .iter()
        .map(|frag| &block.text()[frag.text_range()])
        .collect()
}

#[test]
fn words_spaces_and_punctuation_fragment_separately() {
    let mut env = TestEnv::new();
    env.driver().set_text("one two, three");
    assert_eq!(
        fragment_texts(&env, 0),
        ["one", " ", "two", ",", " ", "three"]
    );
}

#[test]
fn consecutive_spaces_are_single_fragments() {
    let mut env = TestEnv::new();
    env.driver().set_text("a  b");
    assert_eq!(fragment_texts(&env, 0), ["a", " ", " ", "b"]);
}

#[test]
fn wrap_breaks_after_the_space() {
    let mut env = TestEnv::wrapped(100);
    env.driver().set_text("hello world foo");
    let block = &env.editor.blocks()[0];
    assert_eq!(fragment_texts(&env, 0), ["hello", " ", "world", " ", "foo"]);
    let frags = block.fragments();
    // "hello " stays on the first line, "world foo" wraps.
    assert_eq!(frags[0].line_ypos(), 0);
    assert_eq!(frags[1].line_ypos(), 0);
    assert_eq!(frags[2].line_ypos(), 10);
    assert_eq!(frags[2].xpos(), 0);
    assert_eq!(frags[4].line_ypos(), 10);
    assert_eq!(block.height(), 20);
}

#[test]
fn unbreakable_run_overflows_instead_of_wrapping() {
    let mut env = TestEnv::wrapped(100);
    env.driver().set_text("aaaaaaaaaaaaaaaa");
    let block = &env.editor.blocks()[0];
    assert_eq!(block.height(), 10);
    assert_eq!(block.width(), 160);
}

#[test]
fn opening_punctuation_wraps_with_its_word() {
    let mut env = TestEnv::wrapped(50);
    env.driver().set_text("aa (bb");
    let block = &env.editor.blocks()[0];
    let frags = block.fragments();
    // "(" may not end a line; it moves to the next line with "bb".
    assert_eq!(fragment_texts(&env, 0), ["aa", " ", "(", "bb"]);
    assert_eq!(frags[2].line_ypos(), 10);
    assert_eq!(frags[2].xpos(), 0);
    assert_eq!(frags[3].line_ypos(), 10);
}

#[test]
fn layout_is_idempotent() {
    let mut env = TestEnv::wrapped(100);
    env.driver().set_text("the quick brown fox jumps over the lazy dog");
    let snapshot: Vec<_> = env.editor.blocks()[0]
        .fragments()
        .iter()
        .map(|f| (f.xpos(), f.ypos(), f.line_ypos(), f.line_height(), f.width()))
        .collect();
    // Force a fresh geometry pass at the same width.
    env.editor.set_align(TextAlign::Right);
    env.editor.set_align(TextAlign::Left);
    env.driver().refresh_layout();
    let again: Vec<_> = env.editor.blocks()[0]
        .fragments()
        .iter()
        .map(|f| (f.xpos(), f.ypos(), f.line_ypos(), f.line_height(), f.width()))
        .collect();
    assert_eq!(snapshot, again);
}

#[test]
fn block_y_offsets_chain() {
    let mut env = TestEnv::multiline();
    env.driver().set_text("one\ntwo\nthree");
    let blocks = env.editor.blocks();
    assert_eq!(blocks.len(), 3);
    for pair in blocks.windows(2) {
        assert_eq!(pair[1].ypos(), pair[0].ypos() + pair[0].height());
    }
    assert_eq!(env.editor.content_height(), 30);
}

#[test]
fn height_propagates_after_an_edit_above() {
    let mut env = TestEnv::wrapped(100);
    env.driver().set_text("aa\nbb\ncc");
    assert_eq!(env.editor.blocks()[2].ypos(), 20);
    // Make the first block wrap onto two lines.
    env.driver().set_caret_ofs(0).unwrap();
    env.driver().insert_text("wide wide wide ");
    let blocks = env.editor.blocks();
    assert!(blocks[0].height() > 10);
    for pair in blocks.windows(2) {
        assert_eq!(pair[1].ypos(), pair[0].ypos() + pair[0].height());
    }
}

#[test]
fn right_and_center_alignment() {
    let mut env = TestEnv::new();
    env.editor.set_align(TextAlign::Right);
    env.driver().set_layout_size(100, 100);
    env.driver().set_text("ab");
    assert_eq!(env.editor.blocks()[0].fragments()[0].xpos(), 80);

    env.editor.set_align(TextAlign::Center);
    env.driver().refresh_layout();
    assert_eq!(env.editor.blocks()[0].fragments()[0].xpos(), 40);
}

#[test]
fn tabs_snap_to_tab_stops() {
    let mut env = TestEnv::new();
    env.driver().set_text("a\tb");
    let frags: Vec<_> = env.editor.blocks()[0]
        .fragments()
        .iter()
        .map(|f| (f.xpos(), f.width()))
        .collect();
    // Tab stops sit every 4 * width('x') = 40 pixels.
    assert_eq!(frags, [(0, 10), (10, 30), (40, 10)]);
}

#[test]
fn wrapped_lines_hang_under_the_list_marker() {
    let mut env = TestEnv::wrapped(100);
    env.driver().set_text("- aaa bbb ccc");
    let block = &env.editor.blocks()[0];
    let continuation: Vec<_> = block
        .fragments()
        .iter()
        .filter(|f| f.line_ypos() > 0)
        .collect();
    assert!(!continuation.is_empty());
    // "- " measures 20 pixels; every continuation line starts there.
    assert_eq!(continuation[0].xpos(), 20);
}

#[test]
fn empty_buffer_still_has_one_line() {
    let mut env = TestEnv::new();
    env.driver().refresh_layout();
    assert_eq!(env.editor.blocks().len(), 1);
    assert_eq!(env.editor.content_height(), 10);
}

#[test]
fn content_width_grows_eagerly_and_shrinks_lazily() {
    let mut env = TestEnv::multiline();
    env.driver().set_text("aaaaaaaaaa\nbb");
    assert_eq!(env.driver().content_width(), 100);
    // Shorten the widest line; the next query recomputes the maximum.
    env.driver()
        .select(styledit::TextOffset::new(0, 0), styledit::TextOffset::new(0, 5));
    env.driver().delete_selected();
    assert_eq!(env.driver().content_width(), 50);
}

#[test]
fn wrapping_disabled_keeps_one_line() {
    let mut env = TestEnv::multiline();
    env.driver().set_layout_size(50, 100);
    env.driver().set_text("hello world");
    assert_eq!(env.editor.blocks()[0].height(), 10);
    assert_eq!(env.editor.blocks()[0].width(), 110);
}

#[test]
fn layout_with_zero_width_is_deferred_until_resized() {
    let mut env = TestEnv::new();
    env.editor.set_multiline(true);
    env.editor.set_wrapping(true);
    env.driver().set_layout_size(0, 0);
    env.driver().set_text("hello world");
    // Text landed, geometry waits for a real width.
    assert_eq!(env.editor.text(), "hello world");
    env.driver().set_layout_size(60, 100);
    assert!(env.editor.blocks()[0].height() > 10);
}
