use std::sync::Arc;

use crate::cache::{self, CacheEntry};
use crate::document::{Document, Position, Range};
use crate::error::SearchError;
use crate::indexer::{self, MatchIndexer};
use crate::line_index::LineIndex;
use crate::query::{CompiledQuery, SearchQuery};

/// Default ceiling on the number of matches a scan retains.
pub const DEFAULT_MAX_RESULTS: u32 = 10_000_000;

/// Partial update for a [`SearchCursor`]; fields left `None` keep their
/// current value.
#[derive(Default)]
pub struct SearchProps {
    pub document: Option<Arc<dyn Document>>,
    pub query: Option<SearchQuery>,
    /// Seed position for the next search and split point for the
    /// cursor-relative scan.
    pub position: Option<Range>,
    pub ignore_case: Option<bool>,
    pub max_results: Option<u32>,
}

/// Capture groups alongside the positions of the current match. Group 0
/// is the whole match; unmatched optional groups are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchInfo {
    pub from: Position,
    pub to: Position,
    pub groups: Vec<Option<String>>,
}

/// Bucketed minimap overview of match locations: `buckets[i]` is 1 when
/// any match starts within bucket `i`'s span of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinePattern {
    pub lines_per_bucket: u32,
    pub buckets: Vec<u8>,
}

/// Navigable search session over one document and query.
///
/// The cursor indexes lazily: every operation first checks whether the
/// document revision or the query moved since the last scan and
/// reindexes if so, so callers can hammer it on every keystroke. The
/// scan itself is cursor-relative: when the match limit truncates it,
/// the retained matches surround the user's position.
pub struct SearchCursor {
    document: Option<Arc<dyn Document>>,
    query: Option<CompiledQuery>,
    ignore_case: bool,
    max_results: u32,
    current: Option<Range>,
    at_occurrence: bool,
    results_current: bool,
    indexer: MatchIndexer,
    entry: Option<Arc<CacheEntry>>,
}

impl SearchCursor {
    pub fn new(props: SearchProps) -> Result<Self, SearchError> {
        let mut cursor = Self {
            document: None,
            query: None,
            ignore_case: false,
            max_results: DEFAULT_MAX_RESULTS,
            current: None,
            at_occurrence: false,
            results_current: false,
            indexer: MatchIndexer::empty(),
            entry: None,
        };
        cursor.set_search(props)?;
        Ok(cursor)
    }

    /// Apply a partial update. Any present field replaces the current
    /// value; changing the document, query, flags, or limit invalidates
    /// the match table, which the next operation rebuilds.
    ///
    /// An invalid pattern is rejected before anything is touched, so
    /// the cursor keeps its previous query and results.
    pub fn set_search(&mut self, props: SearchProps) -> Result<(), SearchError> {
        let ignore_case = props.ignore_case.unwrap_or(self.ignore_case);
        let compiled = match props.query {
            Some(query) => Some(query.compile(ignore_case)?),
            None if ignore_case != self.ignore_case => match &self.query {
                Some(existing) => Some(existing.query().compile(ignore_case)?),
                None => None,
            },
            None => None,
        };

        if let Some(document) = props.document {
            self.document = Some(document);
            self.invalidate();
        }
        self.ignore_case = ignore_case;
        if let Some(compiled) = compiled {
            let changed = match &self.query {
                Some(previous) => !previous.same_search(compiled.query(), ignore_case),
                None => true,
            };
            self.query = Some(compiled);
            if changed {
                self.invalidate();
            }
        }
        if let Some(max_results) = props.max_results {
            if max_results != self.max_results {
                self.max_results = max_results;
                self.invalidate();
            }
        }
        if let Some(position) = props.position {
            self.current = Some(position);
            self.at_occurrence = false;
        }
        Ok(())
    }

    fn invalidate(&mut self) {
        self.results_current = false;
        self.at_occurrence = false;
    }

    /// Rescan unless the match table already reflects the current
    /// document revision, query, and flags.
    fn ensure_indexed(&mut self) -> Result<Arc<CacheEntry>, SearchError> {
        let Some(document) = self.document.clone() else {
            return Err(SearchError::NoDocument);
        };

        // Fresh requires both the shared cache and this cursor's pinned
        // snapshot to still reflect the document's revision; another
        // cursor may have refreshed the cache after ours went stale.
        if let Some(entry) = &self.entry {
            if self.results_current
                && !cache::needs_reindex(&document)
                && entry.revision == document.revision()
            {
                return Ok(entry.clone());
            }
        }

        let entry = cache::get_or_index(&document);
        self.indexer = match &self.query {
            Some(compiled) => {
                let seed = match self.current {
                    Some(range) => entry.line_index.clamped_index(range.from),
                    None => 0,
                };
                log::debug!(
                    "indexing revision {} from offset {}",
                    entry.revision,
                    seed
                );
                MatchIndexer::scan(&entry.text, compiled.regex(), self.max_results, seed)
            }
            None => MatchIndexer::empty(),
        };
        self.results_current = true;
        self.at_occurrence = false;
        self.entry = Some(entry.clone());
        Ok(entry)
    }

    /// Step to the next match in the given direction.
    ///
    /// When the cursor is not on a match it seeds: bisect from the
    /// stored position (or the document boundary matching the
    /// direction) and land on the nearest match. When it is, it steps.
    /// Walking off either end returns `None` and clears the position,
    /// so the following call reseeds from the boundary and the search
    /// wraps one call later.
    pub fn find(&mut self, reverse: bool) -> Result<Option<Range>, SearchError> {
        let entry = self.ensure_indexed()?;
        let line_index = &entry.line_index;

        if !self.at_occurrence {
            let seed = match self.current {
                Some(range) => line_index.clamped_index(range.from),
                None if reverse => line_index.total_len(),
                None => 0,
            };
            let Some(index) = self.indexer.find_result_index_near_offset(seed, reverse) else {
                self.current = None;
                return Ok(None);
            };
            self.indexer.set_current_match(index);
            let range = self.indexer.match_range(index, line_index);
            self.current = Some(range);
            self.at_occurrence = true;
            return Ok(Some(range));
        }

        let stepped = if reverse {
            self.indexer.prev_match(line_index)
        } else {
            self.indexer.next_match(line_index)
        };
        match stepped {
            Some(range) => {
                self.current = Some(range);
                Ok(Some(range))
            }
            None => {
                self.at_occurrence = false;
                self.current = None;
                Ok(None)
            }
        }
    }

    /// Total number of matches, reindexing first if stale. Saturates at
    /// the configured limit, which callers should read as a ceiling.
    pub fn match_count(&mut self) -> Result<u32, SearchError> {
        self.ensure_indexed()?;
        Ok(self.indexer.match_count() as u32)
    }

    /// Zero-based number of the current match, `None` when the cursor
    /// is not on one.
    pub fn current_match_number(&self) -> Option<usize> {
        if self.at_occurrence {
            self.indexer.current_match_number()
        } else {
            None
        }
    }

    /// 1-based `(current, total)` pair for "match m of n" counters.
    pub fn position_label(&self) -> Option<(usize, usize)> {
        let current = self.current_match_number()?;
        Some((current + 1, self.indexer.match_count()))
    }

    /// The range of the current match, if any.
    pub fn current_range(&self) -> Option<Range> {
        if self.at_occurrence { self.current } else { None }
    }

    pub fn at_occurrence(&self) -> bool {
        self.at_occurrence
    }

    pub fn query(&self) -> Option<&SearchQuery> {
        self.query.as_ref().map(|compiled| compiled.query())
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Visit every match in document order.
    pub fn for_each_match<F: FnMut(Range)>(&mut self, f: F) -> Result<(), SearchError> {
        let entry = self.ensure_indexed()?;
        self.indexer.for_each_match(&entry.line_index, f);
        Ok(())
    }

    /// Visit matches between `from` and `to`, at line granularity.
    pub fn for_each_match_in_range<F: FnMut(Range)>(
        &mut self,
        from: Position,
        to: Position,
        f: F,
    ) -> Result<(), SearchError> {
        let entry = self.ensure_indexed()?;
        self.indexer
            .for_each_match_in_range(&entry.line_index, from, to, f);
        Ok(())
    }

    /// Positions and capture groups of the current match.
    ///
    /// The match table stores only offsets; the regex is re-executed at
    /// the stored start to recover the groups on demand.
    pub fn full_info_for_current_match(&mut self) -> Result<Option<MatchInfo>, SearchError> {
        let entry = self.ensure_indexed()?;
        let (Some(index), Some(range)) = (self.current_match_number(), self.current) else {
            return Ok(None);
        };
        let Some(compiled) = &self.query else {
            return Ok(None);
        };

        let (start, _) = self.indexer.match_span(index);
        let Some(captures) = compiled.regex().captures_at(&entry.text, start as usize) else {
            return Ok(None);
        };
        let groups = captures
            .iter()
            .map(|group| group.map(|m| m.as_str().to_string()))
            .collect();
        Ok(Some(MatchInfo {
            from: range.from,
            to: range.to,
            groups,
        }))
    }

    /// Minimap overview of which regions of the document hold matches.
    pub fn line_pattern(&mut self, bucket_count: usize) -> Result<LinePattern, SearchError> {
        let entry = self.ensure_indexed()?;
        let mut buckets = vec![0u8; bucket_count];
        let lines_per_bucket = self
            .indexer
            .fill_line_pattern(&entry.line_index, &mut buckets);
        Ok(LinePattern {
            lines_per_bucket,
            buckets,
        })
    }

    /// Force a scan regardless of staleness and return the match count.
    pub fn scan_and_store(&mut self) -> Result<u32, SearchError> {
        self.results_current = false;
        self.match_count()
    }
}

/// One-shot scan request for [`scan_document_for_matches`].
pub struct ScanRequest<'a> {
    pub document: &'a dyn Document,
    pub query: SearchQuery,
    pub ignore_case: bool,
    /// Restrict the scan to these lines; `None` scans the whole
    /// document.
    pub range: Option<Range>,
}

/// Scan a document once, reporting every match in order, and retain no
/// state: no cursor, no cache entry. The fast path for callers that
/// need the matches but not navigation.
pub fn scan_document_for_matches<F>(
    request: ScanRequest<'_>,
    mut on_match: F,
) -> Result<u32, SearchError>
where
    F: FnMut(Position, Position, &[Option<&str>]),
{
    let compiled = request.query.compile(request.ignore_case)?;
    let text = request.document.text();
    let line_index = LineIndex::new(&text, request.document.line_separator());

    let (start, last_line) = match request.range {
        Some(range) => (line_index.clamped_index(range.from), range.to.line),
        None => (0, u32::MAX),
    };

    let mut count = 0u32;
    let mut at = start as usize;
    let mut hint = 0u32;
    while at <= text.len() {
        let Some(captures) = compiled.regex().captures_at(&text, at) else {
            break;
        };
        let Some(whole) = captures.get(0) else {
            break;
        };
        let from = line_index.pos_from_index(hint, whole.start() as u32);
        if from.line > last_line {
            break;
        }
        let to = line_index.pos_from_index(from.line, whole.end() as u32);
        hint = from.line;

        let groups: Vec<Option<&str>> = captures
            .iter()
            .map(|group| group.map(|m| m.as_str()))
            .collect();
        on_match(from, to, &groups);
        count += 1;

        match indexer::next_scan_position(&text, whole.start(), whole.end()) {
            Some(next) => at = next,
            None => break,
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TextDocument;

    fn cursor_over(text: &str, query: SearchQuery) -> (Arc<TextDocument>, SearchCursor) {
        let doc = Arc::new(TextDocument::new(text));
        let cursor = SearchCursor::new(SearchProps {
            document: Some(doc.clone() as Arc<dyn Document>),
            query: Some(query),
            ..Default::default()
        })
        .unwrap();
        (doc, cursor)
    }

    fn range(from: (u32, u32), to: (u32, u32)) -> Range {
        Range::new(Position::new(from.0, from.1), Position::new(to.0, to.1))
    }

    #[test]
    fn test_literal_matches_across_lines() {
        let (_doc, mut cursor) = cursor_over("abc\ndef\nabc", SearchQuery::literal("abc"));
        assert_eq!(cursor.match_count().unwrap(), 2);
        assert_eq!(cursor.find(false).unwrap(), Some(range((0, 0), (0, 3))));
        assert_eq!(cursor.find(false).unwrap(), Some(range((2, 0), (2, 3))));
        assert_eq!(cursor.find(false).unwrap(), None);
    }

    #[test]
    fn test_ignore_case_matches() {
        let doc = Arc::new(TextDocument::new("AbC abc"));
        let mut cursor = SearchCursor::new(SearchProps {
            document: Some(doc.clone() as Arc<dyn Document>),
            query: Some(SearchQuery::literal("abc")),
            ignore_case: Some(true),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cursor.match_count().unwrap(), 2);
        assert_eq!(cursor.find(false).unwrap(), Some(range((0, 0), (0, 3))));
        assert_eq!(cursor.find(false).unwrap(), Some(range((0, 4), (0, 7))));
    }

    #[test]
    fn test_reverse_navigation_seeds_from_end() {
        let (_doc, mut cursor) = cursor_over("a b a b a", SearchQuery::literal("a"));
        assert_eq!(cursor.find(true).unwrap(), Some(range((0, 8), (0, 9))));
        assert_eq!(cursor.find(true).unwrap(), Some(range((0, 4), (0, 5))));
        assert_eq!(cursor.find(true).unwrap(), Some(range((0, 0), (0, 1))));
        assert_eq!(cursor.find(true).unwrap(), None);
        // Reseeds from the end boundary.
        assert_eq!(cursor.find(true).unwrap(), Some(range((0, 8), (0, 9))));
    }

    #[test]
    fn test_seeded_position_finds_nearest_in_direction() {
        let mut text = String::new();
        for line in 0..10_000 {
            if line == 100 || line == 9_000 {
                text.push_str("foo\n");
            } else {
                text.push_str("bar\n");
            }
        }
        let doc = Arc::new(TextDocument::new(text));
        let mut cursor = SearchCursor::new(SearchProps {
            document: Some(doc.clone() as Arc<dyn Document>),
            query: Some(SearchQuery::literal("foo")),
            position: Some(Range::collapsed(Position::new(500, 0))),
            ..Default::default()
        })
        .unwrap();

        let first = cursor.find(false).unwrap().unwrap();
        assert_eq!(first.from.line, 9_000);

        // Off the end: the walk stops, then the next call reseeds from
        // the document start and wraps to the earlier match.
        assert_eq!(cursor.find(false).unwrap(), None);
        let wrapped = cursor.find(false).unwrap().unwrap();
        assert_eq!(wrapped.from.line, 100);
    }

    #[test]
    fn test_revision_change_triggers_reindex() {
        let doc = Arc::new(TextDocument::new("hello"));
        let mut cursor = SearchCursor::new(SearchProps {
            document: Some(doc.clone() as Arc<dyn Document>),
            query: Some(SearchQuery::literal("hello")),
            ignore_case: Some(true),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cursor.match_count().unwrap(), 1);

        doc.set_text("HELLO");
        assert_eq!(cursor.match_count().unwrap(), 1);
        assert_eq!(cursor.find(false).unwrap(), Some(range((0, 0), (0, 5))));
    }

    #[test]
    fn test_max_results_truncates() {
        let doc = Arc::new(TextDocument::new("aaa"));
        let mut cursor = SearchCursor::new(SearchProps {
            document: Some(doc.clone() as Arc<dyn Document>),
            query: Some(SearchQuery::literal("a")),
            max_results: Some(2),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cursor.match_count().unwrap(), 2);
        assert_eq!(cursor.find(false).unwrap(), Some(range((0, 0), (0, 1))));
        assert_eq!(cursor.find(false).unwrap(), Some(range((0, 1), (0, 2))));
        assert_eq!(cursor.find(false).unwrap(), None);
    }

    #[test]
    fn test_invalid_query_keeps_previous() {
        let (_doc, mut cursor) = cursor_over("abc abc", SearchQuery::literal("abc"));
        assert_eq!(cursor.match_count().unwrap(), 2);

        let result = cursor.set_search(SearchProps {
            query: Some(SearchQuery::regex("[broken")),
            ..Default::default()
        });
        assert!(matches!(result, Err(SearchError::InvalidQuery(_))));

        // The previous query and its results still stand.
        assert_eq!(cursor.query().unwrap().pattern(), "abc");
        assert_eq!(cursor.match_count().unwrap(), 2);
    }

    #[test]
    fn test_query_change_invalidates_results() {
        let (_doc, mut cursor) = cursor_over("abc def", SearchQuery::literal("abc"));
        assert_eq!(cursor.find(false).unwrap(), Some(range((0, 0), (0, 3))));
        assert!(cursor.at_occurrence());

        cursor
            .set_search(SearchProps {
                query: Some(SearchQuery::literal("def")),
                ..Default::default()
            })
            .unwrap();
        assert!(!cursor.at_occurrence());
        assert_eq!(cursor.find(false).unwrap(), Some(range((0, 4), (0, 7))));
    }

    #[test]
    fn test_no_document_fails_fast() {
        let mut cursor = SearchCursor::new(SearchProps {
            query: Some(SearchQuery::literal("x")),
            ..Default::default()
        })
        .unwrap();
        assert!(matches!(cursor.find(false), Err(SearchError::NoDocument)));
        assert!(matches!(cursor.match_count(), Err(SearchError::NoDocument)));
    }

    #[test]
    fn test_no_query_yields_no_matches() {
        let doc = Arc::new(TextDocument::new("anything"));
        let mut cursor = SearchCursor::new(SearchProps {
            document: Some(doc.clone() as Arc<dyn Document>),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cursor.match_count().unwrap(), 0);
        assert_eq!(cursor.find(false).unwrap(), None);
    }

    #[test]
    fn test_match_number_and_label() {
        let (_doc, mut cursor) = cursor_over("x x x", SearchQuery::literal("x"));
        assert_eq!(cursor.current_match_number(), None);
        assert_eq!(cursor.position_label(), None);

        let first = cursor.find(false).unwrap();
        assert_eq!(cursor.current_match_number(), Some(0));
        assert_eq!(cursor.position_label(), Some((1, 3)));
        assert_eq!(cursor.current_range(), first);

        cursor.find(false).unwrap();
        assert_eq!(cursor.position_label(), Some((2, 3)));
    }

    #[test]
    fn test_full_info_recovers_capture_groups() {
        let (_doc, mut cursor) = cursor_over(
            "key=value\nother=thing",
            SearchQuery::regex(r"(\w+)=(\w+)"),
        );
        cursor.find(false).unwrap();
        cursor.find(false).unwrap();

        let info = cursor.full_info_for_current_match().unwrap().unwrap();
        assert_eq!(info.from, Position::new(1, 0));
        assert_eq!(info.to, Position::new(1, 11));
        assert_eq!(
            info.groups,
            vec![
                Some("other=thing".to_string()),
                Some("other".to_string()),
                Some("thing".to_string()),
            ]
        );
    }

    #[test]
    fn test_full_info_without_current_match() {
        let (_doc, mut cursor) = cursor_over("abc", SearchQuery::literal("abc"));
        assert_eq!(cursor.full_info_for_current_match().unwrap(), None);
    }

    #[test]
    fn test_line_pattern() {
        let mut text = String::new();
        for line in 0..50 {
            text.push_str(if line < 5 { "hit\n" } else { "miss\n" });
        }
        let (_doc, mut cursor) = cursor_over(&text, SearchQuery::literal("hit"));
        let pattern = cursor.line_pattern(10).unwrap();
        assert_eq!(pattern.lines_per_bucket, 5);
        assert_eq!(pattern.buckets[0], 1);
        assert_eq!(pattern.buckets[1..].iter().map(|&b| b as u32).sum::<u32>(), 0);
    }

    #[test]
    fn test_scan_and_store_is_idempotent() {
        let (_doc, mut cursor) = cursor_over("m m m", SearchQuery::literal("m"));
        let first = cursor.scan_and_store().unwrap();
        let second = cursor.scan_and_store().unwrap();
        assert_eq!(first, 3);
        assert_eq!(second, 3);
    }

    #[test]
    fn test_for_each_match_in_order() {
        let (_doc, mut cursor) = cursor_over("a\nb\na\nb\na", SearchQuery::literal("a"));
        let mut lines = Vec::new();
        cursor
            .for_each_match(|range| lines.push(range.from.line))
            .unwrap();
        assert_eq!(lines, vec![0, 2, 4]);
    }

    #[test]
    fn test_for_each_match_in_range() {
        let (_doc, mut cursor) = cursor_over("a\na\na\na\na", SearchQuery::literal("a"));
        let mut lines = Vec::new();
        cursor
            .for_each_match_in_range(Position::new(1, 0), Position::new(3, 0), |range| {
                lines.push(range.from.line)
            })
            .unwrap();
        assert_eq!(lines, vec![1, 2, 3]);
    }

    #[test]
    fn test_toggling_ignore_case_recompiles() {
        let (_doc, mut cursor) = cursor_over("Rust rust RUST", SearchQuery::literal("rust"));
        assert_eq!(cursor.match_count().unwrap(), 1);

        cursor
            .set_search(SearchProps {
                ignore_case: Some(true),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(cursor.match_count().unwrap(), 3);
    }

    #[test]
    fn test_set_position_reseeds() {
        let (_doc, mut cursor) = cursor_over("z z z z", SearchQuery::literal("z"));
        cursor.find(false).unwrap();
        cursor
            .set_search(SearchProps {
                position: Some(Range::collapsed(Position::new(0, 5))),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(cursor.find(false).unwrap(), Some(range((0, 6), (0, 7))));
    }

    #[test]
    fn test_one_shot_scan_reports_groups() {
        let doc = TextDocument::new("ab 12 cd 34");
        let mut seen = Vec::new();
        let count = scan_document_for_matches(
            ScanRequest {
                document: &doc,
                query: SearchQuery::regex(r"(\d)(\d)"),
                ignore_case: false,
                range: None,
            },
            |from, to, groups| {
                seen.push((from.ch, to.ch, groups[1].map(str::to_string)));
            },
        )
        .unwrap();
        assert_eq!(count, 2);
        assert_eq!(seen[0], (3, 5, Some("1".to_string())));
        assert_eq!(seen[1], (9, 11, Some("3".to_string())));
    }

    #[test]
    fn test_one_shot_scan_respects_range() {
        let doc = TextDocument::new("m\nm\nm\nm");
        let mut lines = Vec::new();
        let count = scan_document_for_matches(
            ScanRequest {
                document: &doc,
                query: SearchQuery::literal("m"),
                ignore_case: false,
                range: Some(Range::new(Position::new(1, 0), Position::new(2, 0))),
            },
            |from, _to, _groups| lines.push(from.line),
        )
        .unwrap();
        assert_eq!(count, 2);
        assert_eq!(lines, vec![1, 2]);
    }
}
