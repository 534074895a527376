//! Document coordinates and change payloads exchanged with an editor.
//!
//! Lines and columns are 1-based, matching the editors this crate drives:
//! `Position::new(1, 1)` is the first character of the document and a column
//! one past the last character of a line addresses the line end.

use std::fmt;

/// Caret location in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Span of a document. The end column is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Range {
    pub const fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Empty range sitting at `position`.
    pub const fn caret(position: Position) -> Self {
        Self::new(position.line, position.column, position.line, position.column)
    }

    pub fn from_positions(start: Position, end: Position) -> Self {
        Self::new(start.line, start.column, end.line, end.column)
    }

    pub fn start(&self) -> Position {
        Position::new(self.start_line, self.start_column)
    }

    pub fn end(&self) -> Position {
        Position::new(self.end_line, self.end_column)
    }

    pub fn is_empty(&self) -> bool {
        self.start() == self.end()
    }

    /// Returns the range with its endpoints ordered.
    pub fn normalized(&self) -> Self {
        if self.end() < self.start() {
            Self::from_positions(self.end(), self.start())
        } else {
            *self
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}-{}]", self.start(), self.end())
    }
}

/// Replacement of `range` with `text`. An empty range is an insertion, empty
/// text a deletion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextEdit {
    pub range: Range,
    pub text: String,
}

impl TextEdit {
    pub fn new(range: Range, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    pub fn insert(position: Position, text: impl Into<String>) -> Self {
        Self::new(Range::caret(position), text)
    }

    pub fn delete(range: Range) -> Self {
        Self::new(range, String::new())
    }
}

/// Payload of a content change: every edit of one editor transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChange {
    pub changes: Vec<TextEdit>,
}

/// Payload of a caret move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorChange {
    pub position: Position,
    /// What caused the move ("keyboard", "mouse", "api", ...).
    pub source: Option<String>,
}

/// Payload of a selection change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChange {
    pub selection: Range,
    pub source: Option<String>,
}
