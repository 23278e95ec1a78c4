use std::cell::RefCell;
use std::rc::Rc;

use chatpane::content::Node;
use chatpane::editor::{BufferTask, EditableBuffer};
use chatpane::pictogram::PictogramTable;
use chatpane::runtime::Scheduler;

fn settle(buffer: &mut EditableBuffer, tasks: &mut Scheduler<BufferTask>) {
    loop {
        let batch = tasks.drain_microtasks();
        if batch.is_empty() {
            return;
        }
        for task in batch {
            buffer.run(task);
        }
    }
}

fn type_chars(buffer: &mut EditableBuffer, tasks: &mut Scheduler<BufferTask>, text: &str) {
    for ch in text.chars() {
        buffer.insert_text(ch.encode_utf8(&mut [0u8; 4]), tasks);
        settle(buffer, tasks);
    }
}

fn glyphs(buffer: &EditableBuffer) -> Vec<String> {
    let tree = buffer.tree();
    tree.leaves()
        .into_iter()
        .filter_map(|leaf| match tree.node(leaf) {
            Some(Node::Pictogram(pictogram)) => Some(pictogram.glyph.clone()),
            _ => None,
        })
        .collect()
}

fn recorded(buffer: &mut EditableBuffer) -> Rc<RefCell<Vec<String>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    buffer.on_plain_text_changed(move |text| sink.borrow_mut().push(text.to_string()));
    seen
}

#[test]
fn test_typed_emoticon_becomes_pictogram() {
    let mut buffer = EditableBuffer::new(PictogramTable::builtin());
    let mut tasks: Scheduler<BufferTask> = Scheduler::new();
    type_chars(&mut buffer, &mut tasks, "hey :)");

    assert_eq!(buffer.plain_text(), "hey :)");
    assert_eq!(glyphs(&buffer), vec!["🙂".to_string()]);
    assert_eq!(buffer.caret_offset(), 6);
}

#[test]
fn test_burst_of_edits_notifies_once() {
    let mut buffer = EditableBuffer::new(PictogramTable::builtin());
    let mut tasks: Scheduler<BufferTask> = Scheduler::new();
    let seen = recorded(&mut buffer);

    buffer.insert_text("a", &mut tasks);
    buffer.insert_text("b", &mut tasks);
    buffer.insert_text("c", &mut tasks);
    assert!(seen.borrow().is_empty(), "nothing is published before the microtask runs");

    settle(&mut buffer, &mut tasks);
    assert_eq!(*seen.borrow(), vec!["abc".to_string()]);
}

#[test]
fn test_caret_survives_substitution_mid_text() {
    let mut buffer = EditableBuffer::new(PictogramTable::builtin());
    let mut tasks: Scheduler<BufferTask> = Scheduler::new();
    type_chars(&mut buffer, &mut tasks, "ab");
    buffer.set_caret_offset(1);
    type_chars(&mut buffer, &mut tasks, "<3");

    assert_eq!(buffer.plain_text(), "a<3b");
    assert_eq!(glyphs(&buffer).len(), 1);
    assert_eq!(buffer.caret_offset(), 3);

    type_chars(&mut buffer, &mut tasks, "!");
    assert_eq!(buffer.plain_text(), "a<3!b");
}

#[test]
fn test_backspace_after_pictogram_removes_it() {
    let mut buffer = EditableBuffer::new(PictogramTable::builtin());
    let mut tasks: Scheduler<BufferTask> = Scheduler::new();
    type_chars(&mut buffer, &mut tasks, "x:)");
    buffer.delete_backward(&mut tasks);
    settle(&mut buffer, &mut tasks);

    assert_eq!(buffer.plain_text(), "x");
    assert!(glyphs(&buffer).is_empty());
}

#[test]
fn test_disabling_pictograms_keeps_plain_text() {
    let mut buffer = EditableBuffer::new(PictogramTable::builtin());
    let mut tasks: Scheduler<BufferTask> = Scheduler::new();
    type_chars(&mut buffer, &mut tasks, "ok :)");
    let seen = recorded(&mut buffer);

    buffer.set_pictograms_enabled(false);
    buffer.reconcile();

    assert!(glyphs(&buffer).is_empty());
    assert_eq!(buffer.plain_text(), "ok :)");
    assert!(seen.borrow().is_empty(), "plain text did not change");
}

#[test]
fn test_take_text_clears_draft() {
    let mut buffer = EditableBuffer::new(PictogramTable::builtin());
    let mut tasks: Scheduler<BufferTask> = Scheduler::new();
    type_chars(&mut buffer, &mut tasks, "send :) now");
    let seen = recorded(&mut buffer);

    assert_eq!(buffer.take_text(), "send :) now");
    assert_eq!(buffer.plain_text(), "");
    assert_eq!(buffer.caret_offset(), 0);
    assert_eq!(*seen.borrow(), vec![String::new()]);
}

#[test]
fn test_replace_text_substitutes_immediately() {
    let mut buffer = EditableBuffer::new(PictogramTable::builtin());
    buffer.replace_text("draft :( again");
    assert_eq!(glyphs(&buffer).len(), 1);
    assert_eq!(buffer.plain_text(), "draft :( again");
    assert_eq!(buffer.caret_offset(), 14);
}
