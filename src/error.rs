use thiserror::Error;

/// Failures surfaced by the search engine.
///
/// Truncation at the match limit is not an error; it is reported through
/// the match count reaching the configured ceiling.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The query pattern failed to compile. The cursor keeps its
    /// previous query when this is returned from a partial update.
    #[error("invalid search pattern: {0}")]
    InvalidQuery(#[from] regex::Error),

    /// The cursor has no document bound; only `set_search` is legal in
    /// that state.
    #[error("search cursor has no document")]
    NoDocument,
}
