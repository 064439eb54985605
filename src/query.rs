use regex::{Regex, RegexBuilder};

use crate::error::SearchError;

/// How a query pattern is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// The pattern matches itself; regex metacharacters are escaped.
    #[default]
    Literal,
    /// The pattern is a regular expression.
    Regex,
}

/// An uncompiled search query.
///
/// Compilation always applies the engine's own flag convention
/// (multiline on, case sensitivity from the cursor), so host-chosen
/// flags on a pattern never leak through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pattern: String,
    mode: SearchMode,
}

impl SearchQuery {
    pub fn literal(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            mode: SearchMode::Literal,
        }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            mode: SearchMode::Regex,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub(crate) fn compile(&self, ignore_case: bool) -> Result<CompiledQuery, SearchError> {
        let source = match self.mode {
            SearchMode::Literal => regex::escape(&self.pattern),
            SearchMode::Regex => self.pattern.clone(),
        };
        let regex = RegexBuilder::new(&source)
            .multi_line(true)
            .case_insensitive(ignore_case)
            .build()?;
        Ok(CompiledQuery {
            regex,
            query: self.clone(),
            ignore_case,
        })
    }
}

/// A query compiled against a fixed set of flags.
#[derive(Debug, Clone)]
pub(crate) struct CompiledQuery {
    regex: Regex,
    query: SearchQuery,
    ignore_case: bool,
}

impl CompiledQuery {
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    /// Whether a recompile would produce the same automaton.
    pub fn same_search(&self, query: &SearchQuery, ignore_case: bool) -> bool {
        self.query == *query && self.ignore_case == ignore_case
    }
}
