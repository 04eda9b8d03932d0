// Copyright 2025 the Styledit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::boxed::Box;
use alloc::vec::Vec;

use styledit_dev::Event;

use styledit::{
    Color, ContentFactory, EditListener, EmbeddedContent, FontDescription, FragmentContent, Rect,
    TextMetrics, TextOffset,
};

use super::utils::TestEnv;

fn styled(text: &str) -> TestEnv {
    let mut env = TestEnv::new();
    env.editor.set_styling(true);
    env.driver().set_text(text);
    env.listener.clear();
    env
}

fn painted(env: &mut TestEnv) {
    env.driver()
        .paint(Rect::new(0, 0, 1000, 100), Color::BLACK);
}

#[test]
fn directives_become_zero_width_fragments() {
    let mut env = styled("a<u>b</>c");
    assert_eq!(env.editor.text(), "a<u>b</>c");
    let block = &env.editor.blocks()[0];
    let widths: Vec<_> = block.fragments().iter().map(|f| f.width()).collect();
    assert_eq!(widths, [10, 0, 10, 0, 10]);
    painted(&mut env);
    assert_eq!(env.listener.strings(), ["a", "b", "c"]);
}

#[test]
fn underline_spans_only_the_toggled_run() {
    let mut env = styled("a<u>b</>c");
    painted(&mut env);
    let underlines: Vec<_> = env
        .listener
        .events
        .iter()
        .filter_map(|e| match e {
            Event::DrawRectFill(rect, _) => Some(*rect),
            _ => None,
        })
        .collect();
    // One pixel-high rule just below the baseline, under "b" alone.
    assert_eq!(underlines, [Rect::new(10, 9, 10, 1)]);
}

#[test]
fn color_directive_recolors_the_run() {
    let mut env = styled("<color ff0000>x</>y");
    painted(&mut env);
    let red = Color::from_rgba8(255, 0, 0, 255);
    let colors: Vec<_> = env
        .listener
        .events
        .iter()
        .filter_map(|e| match e {
            Event::DrawString { text, color, .. } => Some((text.as_str(), *color)),
            _ => None,
        })
        .collect();
    assert_eq!(colors, [("x", red), ("y", Color::BLACK)]);
}

#[test]
fn horizontal_rule_fills_the_layout_width() {
    let mut env = styled("<hr>");
    painted(&mut env);
    assert_eq!(
        env.listener
            .count(|e| matches!(e, Event::DrawRectFill(rect, _) if *rect == Rect::new(0, 0, 1000, 2))),
        1
    );
}

#[test]
fn styling_disabled_paints_markup_literally() {
    let mut env = TestEnv::new();
    env.driver().set_text("a<u>b");
    painted(&mut env);
    assert!(env.listener.strings().contains(&"<"));
    assert_eq!(env.editor.text(), "a<u>b");
}

#[test]
fn unrecognized_markup_is_literal_text() {
    let mut env = styled("<b>x");
    painted(&mut env);
    assert!(env.listener.strings().contains(&"<"));
}

#[test]
fn password_mode_paints_bullets() {
    let mut env = TestEnv::new();
    env.editor.set_password(true);
    env.driver().set_text("ab");
    env.listener.clear();
    painted(&mut env);
    assert_eq!(env.listener.strings(), ["\u{2022}\u{2022}"]);
}

#[test]
fn shown_whitespace_paints_break_markers() {
    let mut env = TestEnv::multiline();
    env.editor.set_show_whitespace(true);
    env.driver().set_text("a\nb");
    env.listener.clear();
    painted(&mut env);
    assert!(env.listener.strings().contains(&"\u{b6}"));
    assert_eq!(env.listener.count(|e| *e == Event::OnBreak), 1);
}

#[test]
fn on_break_fires_once_per_painted_break() {
    let mut env = TestEnv::multiline();
    env.driver().set_text("a\nb\nc");
    env.listener.clear();
    painted(&mut env);
    assert_eq!(env.listener.count(|e| *e == Event::OnBreak), 2);
}

#[test]
fn selection_background_precedes_the_text() {
    let mut env = TestEnv::new();
    env.driver().set_text("hello");
    env.driver()
        .select(TextOffset::new(0, 1), TextOffset::new(0, 3));
    env.listener.clear();
    painted(&mut env);
    let bg = env
        .listener
        .events
        .iter()
        .position(|e| *e == Event::SelectionBg(Rect::new(10, 0, 20, 10)));
    let text = env
        .listener
        .events
        .iter()
        .position(|e| matches!(e, Event::DrawString { .. }));
    assert!(bg.unwrap() < text.unwrap());
}

#[test]
fn focused_caret_is_painted() {
    let mut env = TestEnv::new();
    env.driver().set_text("ab");
    env.driver().set_caret_ofs(1).unwrap();
    env.driver().focus(true);
    env.listener.clear();
    painted(&mut env);
    assert_eq!(
        env.listener
            .count(|e| matches!(e, Event::Caret(rect) if *rect == Rect::new(10, 0, 1, 10))),
        1
    );
    env.driver().focus(false);
    env.listener.clear();
    painted(&mut env);
    assert_eq!(env.listener.count(|e| matches!(e, Event::Caret(_))), 0);
}

#[derive(Debug)]
struct Gadget;

impl EmbeddedContent for Gadget {
    fn width(&self, _metrics: &dyn TextMetrics, _font: &FontDescription) -> i32 {
        30
    }

    fn height(&self, _metrics: &dyn TextMetrics, _font: &FontDescription) -> i32 {
        14
    }

    fn paint(&self, listener: &mut dyn EditListener, rect: Rect, color: Color) {
        listener.draw_rect(rect, color);
    }
}

#[derive(Debug)]
struct GadgetFactory;

impl ContentFactory for GadgetFactory {
    fn recognized_length(&self, text: &str) -> Option<usize> {
        text.starts_with("<gadget>").then_some("<gadget>".len())
    }

    fn create_content(&self, text: &str) -> Option<FragmentContent> {
        self.recognized_length(text)
            .map(|_| FragmentContent::Embedded(Box::new(Gadget)))
    }
}

#[test]
fn embedded_content_flows_with_the_text() {
    let mut env = TestEnv::new();
    env.editor.set_styling(true);
    env.editor.set_content_factory(Box::new(GadgetFactory));
    env.driver().set_text("ab<gadget>cd");
    // The taller object grows the line; text hangs from the common baseline.
    assert_eq!(env.editor.blocks()[0].height(), 16);
    let frags = env.editor.blocks()[0].fragments();
    assert_eq!(frags[1].width(), 30);
    assert_eq!(frags[2].xpos(), 50);

    env.listener.clear();
    painted(&mut env);
    assert_eq!(
        env.listener
            .count(|e| matches!(e, Event::DrawRect(rect, _) if *rect == Rect::new(20, 0, 30, 14))),
        1
    );
}
