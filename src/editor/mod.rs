//! Editor capability surface consumed by the recorder and the player.
//!
//! The text widget itself lives outside this crate. Anything that can report
//! content, caret and selection changes and accept the matching commands can
//! be recorded from or replayed into by implementing [`EditorAdapter`].

pub mod memory;
pub mod signal;
pub mod types;

pub use memory::MemoryEditor;
pub use signal::{Signal, Subscription};
pub use types::{ContentChange, CursorChange, Position, Range, SelectionChange, TextEdit};

use crate::error::EditorError;

/// Listener for content changes.
pub type ContentListener = Box<dyn FnMut(&ContentChange)>;
/// Listener for caret moves.
pub type CursorListener = Box<dyn FnMut(&CursorChange)>;
/// Listener for selection changes.
pub type SelectionListener = Box<dyn FnMut(&SelectionChange)>;

/// Operations and signals of a live text editor.
///
/// Commands return [`EditorError::Disposed`] once the editor's document model
/// is gone; callers decide whether that is fatal.
pub trait EditorAdapter {
    /// Full document text.
    fn value(&self) -> Result<String, EditorError>;

    /// Replaces the whole document.
    fn set_value(&self, value: &str) -> Result<(), EditorError>;

    /// Gives the editor keyboard focus.
    fn focus(&self);

    /// Moves the caret. `source` is forwarded to cursor listeners.
    fn set_position(&self, position: Position, source: Option<&str>) -> Result<(), EditorError>;

    /// Selects `range`. `source` is forwarded to selection listeners.
    fn set_selection(&self, range: Range, source: Option<&str>) -> Result<(), EditorError>;

    /// Whether a document model is attached.
    fn has_model(&self) -> bool;

    /// Applies `edits` as one transaction.
    fn apply_edits(&self, edits: &[TextEdit]) -> Result<(), EditorError>;

    fn on_content_changed(&self, listener: ContentListener) -> Subscription;

    fn on_cursor_position_changed(&self, listener: CursorListener) -> Subscription;

    fn on_selection_changed(&self, listener: SelectionListener) -> Subscription;
}
