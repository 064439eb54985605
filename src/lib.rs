//! Incremental search engine for text documents.
//!
//! `loupe` indexes every match of a query in a document once, into a
//! packed offset table, then serves navigation, counting, range
//! iteration, and minimap overviews out of that index. It is built for
//! interactive editor use: documents and queries change on every
//! keystroke, documents can be megabytes, and each operation lazily
//! reindexes only when the document revision or the query actually
//! moved.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use loupe::{Document, SearchCursor, SearchProps, SearchQuery, TextDocument};
//!
//! let doc = Arc::new(TextDocument::new("fn main() {}\nfn helper() {}"));
//! let mut cursor = SearchCursor::new(SearchProps {
//!     document: Some(doc.clone() as Arc<dyn Document>),
//!     query: Some(SearchQuery::literal("fn ")),
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! assert_eq!(cursor.match_count().unwrap(), 2);
//! while let Some(range) = cursor.find(false).unwrap() {
//!     println!("match at line {}, column {}", range.from.line, range.from.ch);
//! }
//! ```

mod cache;
mod cursor;
mod document;
mod error;
mod group_array;
mod indexer;
mod line_index;
mod query;

pub use cursor::{
    DEFAULT_MAX_RESULTS, LinePattern, MatchInfo, ScanRequest, SearchCursor, SearchProps,
    scan_document_for_matches,
};
pub use document::{Document, Position, Range, TextDocument};
pub use error::SearchError;
pub use group_array::GroupArray;
pub use indexer::MatchIndexer;
pub use line_index::LineIndex;
pub use query::{SearchMode, SearchQuery};
