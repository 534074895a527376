//! In-memory editor used as a recording source and a replay target.
//!
//! Positions outside the document are clamped the way code editors validate
//! them: lines to `1..=line_count`, columns to `1..=line_length + 1`. All
//! edits of one transaction address the document as it was before the
//! transaction, so they are applied back to front.

use std::cell::{Cell, RefCell};

use super::signal::{Signal, Subscription};
use super::types::{ContentChange, CursorChange, Position, Range, SelectionChange, TextEdit};
use super::{ContentListener, CursorListener, EditorAdapter, SelectionListener};
use crate::error::EditorError;

#[derive(Debug)]
struct Document {
    text: String,
    cursor: Position,
    selection: Range,
}

impl Document {
    fn new(text: String) -> Self {
        let origin = Position::new(1, 1);
        Self {
            text,
            cursor: origin,
            selection: Range::caret(origin),
        }
    }

    fn line_count(&self) -> u32 {
        self.text.split('\n').count() as u32
    }

    fn line(&self, line: u32) -> &str {
        self.text
            .split('\n')
            .nth(line.saturating_sub(1) as usize)
            .unwrap_or("")
    }

    fn max_column(&self, line: u32) -> u32 {
        self.line(line).chars().count() as u32 + 1
    }

    fn end(&self) -> Position {
        let last = self.line_count();
        Position::new(last, self.max_column(last))
    }

    fn clamp(&self, position: Position) -> Position {
        let line = position.line.clamp(1, self.line_count());
        let column = position.column.clamp(1, self.max_column(line));
        Position::new(line, column)
    }

    /// Clamps both ends before ordering them; clamping can swap their order.
    fn clamp_range(&self, range: Range) -> Range {
        Range::from_positions(self.clamp(range.start()), self.clamp(range.end())).normalized()
    }

    /// Byte offset of a position already clamped to the document.
    fn offset(&self, position: Position) -> usize {
        let mut offset = 0;
        for (index, line) in self.text.split('\n').enumerate() {
            if index as u32 + 1 == position.line {
                let column = position.column.saturating_sub(1) as usize;
                return offset
                    + line
                        .char_indices()
                        .nth(column)
                        .map(|(byte, _)| byte)
                        .unwrap_or(line.len());
            }
            offset += line.len() + 1;
        }
        self.text.len()
    }

    /// Applies a transaction and returns the clamped edits that were applied.
    fn apply(&mut self, edits: &[TextEdit]) -> Result<Vec<TextEdit>, EditorError> {
        let applied: Vec<TextEdit> = edits
            .iter()
            .map(|edit| TextEdit::new(self.clamp_range(edit.range), edit.text.clone()))
            .collect();

        let mut spans: Vec<(usize, usize, &str)> = Vec::with_capacity(applied.len());
        for edit in &applied {
            let start = self.offset(edit.range.start());
            let end = self.offset(edit.range.end());
            if start > end {
                return Err(EditorError::InvalidRange(edit.range.to_string()));
            }
            spans.push((start, end, edit.text.as_str()));
        }
        // Stable: inserts at the same offset keep their transaction order.
        spans.sort_by_key(|(start, _, _)| *start);

        for pair in spans.windows(2) {
            if pair[0].1 > pair[1].0 {
                let overlapping = applied
                    .iter()
                    .find(|edit| self.offset(edit.range.start()) == pair[1].0)
                    .map(|edit| edit.range.to_string())
                    .unwrap_or_default();
                return Err(EditorError::OverlappingEdits(overlapping));
            }
        }

        let mut text = self.text.clone();
        for (start, end, replacement) in spans.iter().rev() {
            text.replace_range(*start..*end, replacement);
        }
        self.text = text;
        self.cursor = self.clamp(self.cursor);
        self.selection = self.clamp_range(self.selection);

        Ok(applied)
    }
}

/// Plain-text editor holding its document in memory.
#[derive(Debug)]
pub struct MemoryEditor {
    document: RefCell<Option<Document>>,
    focused: Cell<bool>,
    content_changed: Signal<ContentChange>,
    cursor_changed: Signal<CursorChange>,
    selection_changed: Signal<SelectionChange>,
}

impl MemoryEditor {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            document: RefCell::new(Some(Document::new(text.into()))),
            focused: Cell::new(false),
            content_changed: Signal::new(),
            cursor_changed: Signal::new(),
            selection_changed: Signal::new(),
        }
    }

    /// Caret position, if the model is still attached.
    pub fn position(&self) -> Option<Position> {
        self.document.borrow().as_ref().map(|doc| doc.cursor)
    }

    /// Current selection, if the model is still attached.
    pub fn selection(&self) -> Option<Range> {
        self.document.borrow().as_ref().map(|doc| doc.selection)
    }

    pub fn is_focused(&self) -> bool {
        self.focused.get()
    }

    /// Detaches the document model. Every later command fails with
    /// [`EditorError::Disposed`].
    pub fn dispose(&self) {
        self.document.borrow_mut().take();
        tracing::debug!("Memory editor model disposed");
    }

    /// Number of listeners attached across all signals.
    pub fn listener_count(&self) -> usize {
        self.content_changed.listener_count()
            + self.cursor_changed.listener_count()
            + self.selection_changed.listener_count()
    }

    /// Inserts `text` at the caret, replacing the selection, and moves the
    /// caret after it the way typing does.
    pub fn type_text(&self, text: &str) -> Result<(), EditorError> {
        let selection = self.selection().ok_or(EditorError::Disposed)?;
        self.apply_edits(&[TextEdit::new(selection, text)])?;

        let start = selection.normalized().start();
        let inserted_lines = text.split('\n').count() as u32 - 1;
        let tail = text.rsplit('\n').next().unwrap_or("").chars().count() as u32;
        let caret = if inserted_lines == 0 {
            Position::new(start.line, start.column + tail)
        } else {
            Position::new(start.line + inserted_lines, tail + 1)
        };
        self.set_position(caret, Some("keyboard"))
    }

    fn with_document<R>(&self, f: impl FnOnce(&mut Document) -> R) -> Result<R, EditorError> {
        let mut document = self.document.borrow_mut();
        let document = document.as_mut().ok_or(EditorError::Disposed)?;
        Ok(f(document))
    }
}

impl Default for MemoryEditor {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl EditorAdapter for MemoryEditor {
    fn value(&self) -> Result<String, EditorError> {
        self.with_document(|doc| doc.text.clone())
    }

    fn set_value(&self, value: &str) -> Result<(), EditorError> {
        let replaced = self.with_document(|doc| {
            let whole = Range::from_positions(Position::new(1, 1), doc.end());
            *doc = Document::new(value.to_string());
            whole
        })?;

        self.content_changed.emit(&ContentChange {
            changes: vec![TextEdit::new(replaced, value)],
        });
        Ok(())
    }

    fn focus(&self) {
        self.focused.set(true);
    }

    fn set_position(&self, position: Position, source: Option<&str>) -> Result<(), EditorError> {
        let position = self.with_document(|doc| {
            let position = doc.clamp(position);
            doc.cursor = position;
            doc.selection = Range::caret(position);
            position
        })?;

        self.cursor_changed.emit(&CursorChange {
            position,
            source: source.map(str::to_string),
        });
        Ok(())
    }

    fn set_selection(&self, range: Range, source: Option<&str>) -> Result<(), EditorError> {
        let selection = self.with_document(|doc| {
            let selection = doc.clamp_range(range);
            doc.selection = selection;
            doc.cursor = selection.end();
            selection
        })?;

        self.selection_changed.emit(&SelectionChange {
            selection,
            source: source.map(str::to_string),
        });
        Ok(())
    }

    fn has_model(&self) -> bool {
        self.document.borrow().is_some()
    }

    fn apply_edits(&self, edits: &[TextEdit]) -> Result<(), EditorError> {
        if edits.is_empty() {
            return Ok(());
        }
        let applied = self.with_document(|doc| doc.apply(edits))??;

        self.content_changed.emit(&ContentChange { changes: applied });
        Ok(())
    }

    fn on_content_changed(&self, listener: ContentListener) -> Subscription {
        self.content_changed.subscribe(listener)
    }

    fn on_cursor_position_changed(&self, listener: CursorListener) -> Subscription {
        self.cursor_changed.subscribe(listener)
    }

    fn on_selection_changed(&self, listener: SelectionListener) -> Subscription {
        self.selection_changed.subscribe(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn insert_before_closing_brace() {
        let editor = MemoryEditor::new("function x() {}");
        editor
            .apply_edits(&[TextEdit::insert(Position::new(1, 15), "\n  return 1;")])
            .unwrap();
        assert_eq!(editor.value().unwrap(), "function x() {\n  return 1;}");
    }

    #[test]
    fn batch_edits_address_the_original_document() {
        let editor = MemoryEditor::new("alpha\nbeta\ngamma");
        editor
            .apply_edits(&[
                TextEdit::new(Range::new(1, 1, 1, 6), "ALPHA"),
                TextEdit::new(Range::new(3, 1, 3, 6), "GAMMA"),
                TextEdit::delete(Range::new(2, 5, 3, 1)),
            ])
            .unwrap();
        assert_eq!(editor.value().unwrap(), "ALPHA\nbetaGAMMA");
    }

    #[test]
    fn inserts_at_one_point_keep_transaction_order() {
        let editor = MemoryEditor::new("[]");
        let at = Position::new(1, 2);
        editor
            .apply_edits(&[TextEdit::insert(at, "a"), TextEdit::insert(at, "b")])
            .unwrap();
        assert_eq!(editor.value().unwrap(), "[ab]");
    }

    #[test]
    fn overlapping_edits_are_rejected_without_change() {
        let editor = MemoryEditor::new("abcdef");
        let result = editor.apply_edits(&[
            TextEdit::new(Range::new(1, 1, 1, 4), "x"),
            TextEdit::new(Range::new(1, 3, 1, 5), "y"),
        ]);
        assert!(matches!(result, Err(EditorError::OverlappingEdits(_))));
        assert_eq!(editor.value().unwrap(), "abcdef");
    }

    #[test]
    fn positions_are_clamped_to_the_document() {
        let editor = MemoryEditor::new("ab\ncdé");
        editor.set_position(Position::new(9, 9), None).unwrap();
        assert_eq!(editor.position(), Some(Position::new(2, 4)));

        editor.set_position(Position::new(0, 0), None).unwrap();
        assert_eq!(editor.position(), Some(Position::new(1, 1)));
    }

    #[test]
    fn ranges_past_the_document_end_are_clamped() {
        let editor = MemoryEditor::new("ab");
        editor
            .apply_edits(&[TextEdit::delete(Range::new(5, 10, 6, 1))])
            .unwrap();
        assert_eq!(editor.value().unwrap(), "");

        let editor = MemoryEditor::new("abc");
        editor
            .apply_edits(&[TextEdit::new(Range::new(1, 3, 1, 1), "x")])
            .unwrap();
        assert_eq!(editor.value().unwrap(), "xc");
    }

    #[test]
    fn selection_past_the_document_end_is_clamped_in_order() {
        let editor = MemoryEditor::new("ab
cd");
        editor.set_selection(Range::new(2, 9, 7, 1), None).unwrap();
        assert_eq!(editor.selection(), Some(Range::new(2, 1, 2, 3)));

        editor.set_selection(Range::new(9, 9, 1, 2), None).unwrap();
        assert_eq!(editor.selection(), Some(Range::new(1, 2, 2, 3)));
    }

    #[test]
    fn multibyte_columns_count_characters() {
        let editor = MemoryEditor::new("héllo");
        editor
            .apply_edits(&[TextEdit::delete(Range::new(1, 2, 1, 3))])
            .unwrap();
        assert_eq!(editor.value().unwrap(), "hllo");
    }

    #[test]
    fn content_signal_fires_once_per_transaction() {
        let editor = MemoryEditor::new("");
        let seen: Rc<RefCell<Vec<ContentChange>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let subscription = editor.on_content_changed(Box::new(move |change: &ContentChange| {
            sink.borrow_mut().push(change.clone())
        }));

        editor
            .apply_edits(&[
                TextEdit::insert(Position::new(1, 1), "a"),
                TextEdit::insert(Position::new(1, 1), "b"),
            ])
            .unwrap();
        subscription.dispose();
        editor.type_text("c").unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].changes.len(), 2);
    }

    #[test]
    fn type_text_moves_caret_past_inserted_lines() {
        let editor = MemoryEditor::new("fn main() {}");
        editor.set_position(Position::new(1, 12), None).unwrap();
        editor.type_text("\n    body();\n").unwrap();

        assert_eq!(editor.value().unwrap(), "fn main() {\n    body();\n}");
        assert_eq!(editor.position(), Some(Position::new(3, 1)));
    }

    #[test]
    fn set_selection_reports_source() {
        let editor = MemoryEditor::new("one two");
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        let subscription = editor.on_selection_changed(Box::new(move |change: &SelectionChange| {
            *sink.borrow_mut() = Some(change.clone());
        }));

        editor
            .set_selection(Range::new(1, 8, 1, 5), Some("mouse"))
            .unwrap();
        subscription.dispose();

        let change = seen.borrow().clone().unwrap();
        assert_eq!(change.selection, Range::new(1, 5, 1, 8));
        assert_eq!(change.source.as_deref(), Some("mouse"));
        assert_eq!(editor.position(), Some(Position::new(1, 8)));
    }

    #[test]
    fn disposed_editor_rejects_commands() {
        let editor = MemoryEditor::new("text");
        editor.dispose();

        assert!(!editor.has_model());
        assert_eq!(editor.value(), Err(EditorError::Disposed));
        assert_eq!(
            editor.apply_edits(&[TextEdit::insert(Position::new(1, 1), "x")]),
            Err(EditorError::Disposed)
        );
        assert_eq!(editor.set_position(Position::new(1, 1), None), Err(EditorError::Disposed));
    }
}
