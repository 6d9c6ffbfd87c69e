use std::cell::RefCell;
use std::rc::Rc;

use note_editor_engine::{
    BlockId, BlockKind, Command, Document, Editor, EditorOptions, HeadingLevel, HeadlessSurface,
    MarkType, PaletteKey, Selection, SlashPalette, default_registry,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn untracked_blocks(doc: &Document) -> Vec<String> {
    let mut missing = Vec::new();
    doc.for_each_block(|path, block, _| {
        if block.kind.is_tracked() && block.id.is_none() {
            missing.push(format!("{} at {path:?}", block.kind.name()));
        }
    });
    missing
}

fn ids(doc: &Document) -> Vec<BlockId> {
    let mut out = Vec::new();
    doc.for_each_block(|_, block, _| out.extend(block.id.clone()));
    out
}

fn palette_titles(editor: &Editor) -> Vec<String> {
    editor
        .palette()
        .filtered()
        .iter()
        .map(|descriptor| descriptor.title.clone())
        .collect()
}

#[test]
fn mount_assigns_ids_to_every_tracked_block() {
    let editor = Editor::headless(
        "<h1>Title</h1><ul><li><p>one</p></li></ul><table><tr><td><p>a</p></td></tr></table>",
    );
    assert_eq!(untracked_blocks(editor.document()), Vec::<String>::new());
}

#[rstest]
#[case::split_paragraph(Command::InsertContentAt {
    pos: 4,
    content: note_editor_engine::InsertContent::Markup("<p>x</p><p>y</p>".into()),
})]
#[case::bullet_list(Command::ToggleBulletList)]
#[case::table(Command::InsertTable { rows: 2, cols: 2, with_header_row: false })]
#[case::heading(Command::SetHeading(HeadingLevel::H2))]
#[case::rule(Command::SetHorizontalRule)]
fn every_change_leaves_tracked_blocks_identified(#[case] command: Command) {
    let mut editor = Editor::headless("<p>Hello</p><p>World</p>");
    editor.set_selection(Selection::caret(3)).unwrap();
    let patch = editor.run(command).unwrap().expect("command should apply");
    assert!(patch.doc_changed);
    assert_eq!(untracked_blocks(editor.document()), Vec::<String>::new());
}

#[test]
fn ids_survive_unrelated_edits() {
    let mut editor = Editor::headless("<p>First</p><p>Second</p><p>Third</p>");
    let before = ids(editor.document());
    assert_eq!(before.len(), 3);

    // "Second" occupies 8..14; type at its end.
    editor.set_selection(Selection::caret(14)).unwrap();
    editor.type_text(" line").unwrap();
    editor.run(Command::ToggleItalic).unwrap();
    editor.set_selection(Selection::range(1, 6)).unwrap();
    editor.run(Command::ToggleBold).unwrap();

    assert_eq!(ids(editor.document()), before);
    assert_eq!(editor.document().blocks[1].text_content(), "Second line");
}

#[test]
fn converting_a_block_keeps_its_id() {
    let mut editor = Editor::headless(r#"<p data-id="keep-me">Hello</p>"#);
    editor.set_selection(Selection::caret(2)).unwrap();
    editor.run(Command::SetHeading(HeadingLevel::H1)).unwrap();
    let block = &editor.document().blocks[0];
    assert_eq!(block.kind, BlockKind::Heading(HeadingLevel::H1));
    assert_eq!(block.id, Some(BlockId::new("keep-me")));
}

#[rstest]
#[case::whole_word("<p>Hello <strong>brave</strong> world</p>", 1, 6)]
#[case::partial_word("<p>Hello <strong>brave</strong> world</p>", 2, 5)]
#[case::already_bold("<p>Hello <strong>brave</strong> world</p>", 7, 12)]
#[case::into_code_block("<p>ab</p><pre><code>cd</code></pre>", 1, 7)]
#[case::bold_into_code_block("<p><strong>ab</strong></p><pre><code>cd</code></pre>", 1, 7)]
fn toggling_bold_twice_restores_marks(#[case] markup: &str, #[case] from: usize, #[case] to: usize) {
    let mut editor = Editor::headless(markup);
    let original = editor.get_content();
    editor.set_selection(Selection::range(from, to)).unwrap();

    editor.run(Command::ToggleBold).unwrap();
    assert_ne!(editor.get_content(), original);
    editor.run(Command::ToggleBold).unwrap();

    assert_eq!(editor.get_content(), original);
}

#[test]
fn bold_at_caret_applies_to_typed_text() {
    let mut editor = Editor::headless("<p>ab</p>");
    editor.set_selection(Selection::caret(2)).unwrap();
    editor.run(Command::ToggleBold).unwrap();
    assert!(editor.state().is_mark_active(MarkType::Bold));
    editor.type_text("X").unwrap();
    assert!(editor.get_content().contains("a<strong>X</strong>b"));
}

#[test]
fn heading_query_filters_to_the_three_headings() {
    let mut editor = Editor::headless("<p></p>");
    editor.type_text("/제목").unwrap();
    assert!(editor.palette().is_open());
    assert_eq!(editor.palette().query(), Some("제목"));
    assert_eq!(palette_titles(&editor), vec!["제목 1", "제목 2", "제목 3"]);
}

#[test]
fn navigation_wraps_around_nine_entries() {
    let mut registry = default_registry();
    registry.pop();
    let mut palette = SlashPalette::new(registry);
    palette.open(Default::default());
    assert_eq!(palette.filtered().len(), 9);

    for _ in 0..8 {
        palette.handle_key(PaletteKey::ArrowDown);
    }
    assert_eq!(palette.highlighted(), Some(8));
    palette.handle_key(PaletteKey::ArrowDown);
    assert_eq!(palette.highlighted(), Some(0));
    palette.handle_key(PaletteKey::ArrowUp);
    assert_eq!(palette.highlighted(), Some(8));
}

#[test]
fn slash_opens_filters_and_closes_without_running_anything() {
    let mut editor = Editor::headless("<p></p>");
    let calls = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&calls);
    editor.set_on_change(move |_| *counter.borrow_mut() += 1);

    editor.type_text("/").unwrap();
    assert!(editor.palette().is_open());
    assert_eq!(editor.palette().query(), Some(""));
    assert_eq!(editor.palette().filtered().len(), default_registry().len());

    editor.type_text("te").unwrap();
    assert!(editor.palette().is_open());
    assert_eq!(editor.palette().query(), Some("te"));
    assert_eq!(palette_titles(&editor), Vec::<String>::new());

    for _ in 0..3 {
        editor.backspace().unwrap();
    }
    assert!(!editor.palette().is_open());
    assert_eq!(editor.document().blocks.len(), 1);
    assert!(editor.document().blocks[0].is_empty_textblock());
    assert_eq!(editor.document().blocks[0].kind, BlockKind::Paragraph);
    // Three keystrokes in, three out. Nothing else touched the document.
    assert_eq!(*calls.borrow(), 6);
}

#[test]
fn enter_on_an_empty_list_does_nothing() {
    let mut editor = Editor::headless("<p></p>");
    editor.type_text("/zzz").unwrap();
    assert!(editor.palette().is_open());
    let before = editor.get_content();
    let version = editor.version();

    assert!(editor.handle_key(PaletteKey::Enter).unwrap());
    assert!(editor.handle_key(PaletteKey::ArrowDown).unwrap());

    assert!(editor.palette().is_open());
    assert_eq!(editor.get_content(), before);
    assert_eq!(editor.version(), version);
    assert_eq!(editor.document().blocks.len(), 1);
}

#[test]
fn table_entry_replaces_the_query_with_a_three_by_two_table() {
    let mut editor = Editor::headless("<p>Intro</p><p></p>");
    editor.set_selection(Selection::caret(8)).unwrap();
    editor.type_text("/표").unwrap();
    assert_eq!(palette_titles(&editor), vec!["표 삽입"]);

    assert!(editor.handle_key(PaletteKey::Enter).unwrap());
    assert!(!editor.palette().is_open());

    let doc = editor.document();
    assert_eq!(doc.blocks[0].text_content(), "Intro");
    let table = &doc.blocks[1];
    assert!(matches!(table.kind, BlockKind::Table { .. }));
    let rows = table.children().expect("table rows");
    assert_eq!(rows.len(), 3);
    for (index, row) in rows.iter().enumerate() {
        let cells = row.children().expect("row cells");
        assert_eq!(cells.len(), 2);
        for cell in cells {
            if index == 0 {
                assert!(matches!(cell.kind, BlockKind::TableHeader(_)));
            } else {
                assert!(matches!(cell.kind, BlockKind::TableCell(_)));
            }
        }
    }
    assert!(!doc.text_content().contains('/'));
    assert!(editor.state().in_table());
    assert_eq!(untracked_blocks(doc), Vec::<String>::new());
}

#[test]
fn clicking_an_entry_runs_it_on_the_current_block() {
    let mut editor = Editor::headless("<p>Title</p>");
    editor.set_selection(Selection::caret(6)).unwrap();
    editor.type_text("/제목").unwrap();
    editor.click_command(1).unwrap();

    let block = &editor.document().blocks[0];
    assert_eq!(block.kind, BlockKind::Heading(HeadingLevel::H2));
    assert_eq!(block.text_content(), "Title");
}

#[test]
fn escape_and_blur_close_the_palette() {
    let mut editor = Editor::headless("<p></p>");
    editor.type_text("/").unwrap();
    assert!(editor.handle_key(PaletteKey::Escape).unwrap());
    assert!(!editor.palette().is_open());

    editor.type_text("/").unwrap();
    assert!(editor.palette().is_open());
    editor.blur();
    assert!(!editor.palette().is_open());
}

#[test]
fn change_callback_receives_markup_with_ids() {
    let mut editor = Editor::headless("<p>Hi</p>");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    editor.set_on_change(move |markup| sink.borrow_mut().push(markup.to_string()));

    editor.set_selection(Selection::caret(3)).unwrap();
    editor.type_text("!").unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].starts_with("<p data-id=\"id-"));
    assert!(seen[0].ends_with(">Hi!</p>"));
}

#[test]
fn set_content_does_not_notify() {
    let mut editor = Editor::headless("<p>Hi</p>");
    let calls = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&calls);
    editor.set_on_change(move |_| *counter.borrow_mut() += 1);

    editor.set_content("<h2>Replaced</h2>");
    assert_eq!(*calls.borrow(), 0);
    assert_eq!(editor.document().blocks[0].kind, BlockKind::Heading(HeadingLevel::H2));
    assert!(editor.undo().is_none());
}

#[test]
fn malformed_content_falls_back_to_an_empty_paragraph() {
    let editor = Editor::headless("<p>broken</div>");
    assert_eq!(editor.document().blocks.len(), 1);
    assert!(editor.document().blocks[0].is_empty_textblock());
}

#[test]
fn deferred_first_paint_waits_for_render() {
    let options = EditorOptions {
        immediately_render: false,
        ..EditorOptions::default()
    };
    let mut editor = Editor::new("<p>Hi</p>", options, HeadlessSurface::default());
    assert_eq!(editor.surface().paints, 0);
    assert_eq!(editor.surface().last_paint, None);

    editor.render();
    assert_eq!(editor.surface().paints, 1);
    assert_eq!(editor.surface().last_paint, Some(editor.get_content()));

    editor.render();
    assert_eq!(editor.surface().paints, 1);
}

#[test]
fn mounting_paints_immediately_by_default() {
    let mut editor = Editor::headless("<p>Hi</p>");
    assert_eq!(editor.surface().paints, 1);
    editor.render();
    assert_eq!(editor.surface().paints, 1);
}

#[test]
fn undo_and_redo_restore_documents() {
    let mut editor = Editor::headless("<p>Hi</p>");
    let original = editor.get_content();
    editor.set_selection(Selection::caret(3)).unwrap();
    editor.type_text("!").unwrap();
    let edited = editor.get_content();

    assert!(editor.undo().is_some());
    assert_eq!(editor.get_content(), original);
    assert!(editor.redo().is_some());
    assert_eq!(editor.get_content(), edited);
    assert!(editor.redo().is_none());
}

#[test]
fn scroll_to_block_selects_and_highlights() {
    let mut editor = Editor::headless(r#"<p data-id="a">One</p><h2 data-id="b">Two</h2>"#);
    assert!(editor.scroll_to_block(&BlockId::new("b")));

    assert_eq!(editor.selection(), Selection::caret(6));
    assert!(editor.is_focused());
    assert_eq!(editor.surface().scrolled_to, vec![5]);
    assert_eq!(editor.surface().highlights.len(), 1);
    assert_eq!(editor.surface().highlights[0].0, BlockId::new("b"));
    assert_eq!(editor.surface().highlights[0].1.as_millis(), 1000);

    assert!(!editor.scroll_to_block(&BlockId::new("missing")));
}

#[test]
fn add_block_after_inserts_an_empty_paragraph() {
    let mut editor = Editor::headless(r#"<h1 data-id="h">Head</h1><p data-id="p">Body</p>"#);
    editor.add_block_after(&BlockId::new("h")).unwrap();

    let blocks = &editor.document().blocks;
    assert_eq!(blocks.len(), 3);
    assert!(blocks[1].is_empty_textblock());
    assert!(blocks[1].id.is_some());
    assert_ne!(blocks[1].id, Some(BlockId::new("h")));
    assert_eq!(blocks[2].id, Some(BlockId::new("p")));
}

#[test]
fn outline_lists_blocks_with_fallback_labels() {
    let editor = Editor::headless(r#"<h1 data-id="t">Title</h1><p data-id="e"></p>"#);
    let labels: Vec<_> = editor.outline().into_iter().map(|entry| entry.label).collect();
    assert_eq!(labels, vec!["Title", "내용 없음"]);
}
