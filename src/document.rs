use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// A zero-based position in a document: line number and byte column
/// within that line's text (before the separator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
pub struct Position {
    pub line: u32,
    pub ch: u32,
}

impl Position {
    pub fn new(line: u32, ch: u32) -> Self {
        Self { line, ch }
    }
}

/// A span between two positions with `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Range {
    pub from: Position,
    pub to: Position,
}

impl Range {
    pub fn new(from: Position, to: Position) -> Self {
        debug_assert!(from <= to, "range endpoints out of order");
        Self { from, to }
    }

    /// An empty range anchored at a single position, used to seed a
    /// search from a caret rather than a selection.
    pub fn collapsed(at: Position) -> Self {
        Self { from: at, to: at }
    }
}

/// The host document contract.
///
/// The engine never mutates documents; it only snapshots their text and
/// watches the revision counter. The counter must advance on every
/// mutation including undo; timestamps roll back under undo, revisions
/// do not.
pub trait Document: Send + Sync {
    /// Full document text.
    fn text(&self) -> String;

    /// The line separator, typically `"\n"` or `"\r\n"`.
    fn line_separator(&self) -> &str;

    /// Monotonic mutation counter.
    fn revision(&self) -> u64;
}

/// An owned in-memory [`Document`], used by the CLI and by hosts without
/// a document model of their own.
#[derive(Debug)]
pub struct TextDocument {
    text: Mutex<String>,
    separator: String,
    revision: AtomicU64,
}

impl TextDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_separator(text, "\n")
    }

    pub fn with_separator(text: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(text.into()),
            separator: separator.into(),
            revision: AtomicU64::new(1),
        }
    }

    /// Replace the document text, advancing the revision.
    pub fn set_text(&self, text: impl Into<String>) {
        let mut guard = self.text.lock().unwrap_or_else(|e| e.into_inner());
        *guard = text.into();
        self.revision.fetch_add(1, Ordering::Relaxed);
    }
}

impl Document for TextDocument {
    fn text(&self) -> String {
        self.text
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn line_separator(&self) -> &str {
        &self.separator
    }

    fn revision(&self) -> u64 {
        self.revision.load(Ordering::Relaxed)
    }
}
