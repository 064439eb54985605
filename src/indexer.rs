use regex::Regex;

use crate::document::{Position, Range};
use crate::group_array::GroupArray;
use crate::line_index::LineIndex;

/// Matches are stored as `(start, end)` offset pairs.
const GROUP_SIZE: usize = 2;

/// Precomputed table of every match of a query in a document snapshot,
/// with navigation and lookup primitives over it.
///
/// The table is collected cursor-relative: scanning starts at the
/// caller's position and wraps, so when the match limit truncates the
/// scan the retained matches are the ones near the user's focus rather
/// than an arbitrary prefix of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchIndexer {
    table: GroupArray,
    last_matched_line: u32,
}

impl MatchIndexer {
    /// An indexer with no matches, used before any query is set.
    pub fn empty() -> Self {
        Self {
            table: GroupArray::new(GROUP_SIZE),
            last_matched_line: 0,
        }
    }

    /// Scan `text` for matches of `regex`, collecting at most
    /// `max_results` of them starting at `start_offset` and wrapping to
    /// the document head.
    ///
    /// Phase one walks `[start_offset, end]`; if budget remains, phase
    /// two walks `[0, start_offset]` keeping matches that end at or
    /// before the seam. A zero-width match exactly at the seam would be
    /// collected by both phases, so the join edge is deduplicated before
    /// the tables are concatenated into document order.
    pub fn scan(text: &str, regex: &Regex, max_results: u32, start_offset: u32) -> Self {
        let seam = start_offset as usize;
        let budget = max_results as usize;

        let mut primary = GroupArray::new(GROUP_SIZE);
        collect_matches(text, regex, seam, text.len(), budget, &mut primary);

        let table = if seam > 0 && primary.item_count() < budget {
            let mut secondary = GroupArray::new(GROUP_SIZE);
            let remaining = budget - primary.item_count();
            collect_matches(text, regex, 0, seam, remaining, &mut secondary);
            if secondary.last_group().is_some() && secondary.last_group() == primary.first_group()
            {
                secondary.pop_group();
            }
            secondary.append(&mut primary);
            secondary
        } else {
            primary
        };

        if table.item_count() >= budget {
            log::debug!("match table truncated at {} results", max_results);
        }

        Self {
            table,
            last_matched_line: 0,
        }
    }

    pub fn match_count(&self) -> usize {
        self.table.item_count()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Zero-based number of the match the cursor rests on.
    pub fn current_match_number(&self) -> Option<usize> {
        self.table.current_group()
    }

    pub fn set_current_match(&mut self, index: usize) {
        self.table.set_current_group(index);
    }

    pub fn clear_current_match(&mut self) {
        self.table.clear_current_group();
    }

    /// Raw `(start, end)` offsets of match `index`.
    pub fn match_span(&self, index: usize) -> (u32, u32) {
        (
            self.table.group_value(index, 0),
            self.table.group_value(index, 1),
        )
    }

    /// Positions of match `index`, advancing the internal line hint so
    /// an ascending walk converts in amortized linear time.
    pub fn match_range(&mut self, index: usize, line_index: &LineIndex) -> Range {
        let (start, end) = self.match_span(index);
        let from = line_index.pos_from_index(self.last_matched_line, start);
        let to = line_index.pos_from_index(from.line, end);
        self.last_matched_line = from.line;
        Range { from, to }
    }

    /// Step to the next match in document order; `None` past the last.
    pub fn next_match(&mut self, line_index: &LineIndex) -> Option<Range> {
        let index = self.table.next_group()?;
        Some(self.match_range(index, line_index))
    }

    /// Step to the previous match; `None` before the first.
    pub fn prev_match(&mut self, line_index: &LineIndex) -> Option<Range> {
        let index = self.table.prev_group()?;
        Some(self.match_range(index, line_index))
    }

    /// Bisect the table by match start offset.
    ///
    /// An exact hit returns its index regardless of direction.
    /// Otherwise the forward direction yields the first match starting
    /// past `offset` and the reverse direction the last match starting
    /// before it; `None` when the table ends before the sought side.
    pub fn find_result_index_near_offset(&self, offset: u32, reverse: bool) -> Option<usize> {
        let count = self.table.item_count();
        if count == 0 {
            return None;
        }

        // First index whose start is >= offset.
        let mut lo = 0usize;
        let mut hi = count;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.table.group_value(mid, 0) < offset {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }

        if lo < count && self.table.group_value(lo, 0) == offset {
            return Some(lo);
        }
        if reverse {
            lo.checked_sub(1)
        } else if lo < count {
            Some(lo)
        } else {
            None
        }
    }

    /// Visit every match in document order.
    pub fn for_each_match<F: FnMut(Range)>(&self, line_index: &LineIndex, mut f: F) {
        let mut hint = 0u32;
        for index in 0..self.table.item_count() {
            let from = line_index.pos_from_index(hint, self.table.group_value(index, 0));
            let to = line_index.pos_from_index(from.line, self.table.group_value(index, 1));
            hint = from.line;
            f(Range { from, to });
        }
    }

    /// Visit matches starting within `[from, to]`, at line granularity:
    /// the walk begins at the first match at or after `from` and stops
    /// once a match starts below `to`'s line.
    pub fn for_each_match_in_range<F: FnMut(Range)>(
        &self,
        line_index: &LineIndex,
        from: Position,
        to: Position,
        mut f: F,
    ) {
        let start_offset = line_index.clamped_index(from);
        let Some(first) = self.find_result_index_near_offset(start_offset, false) else {
            return;
        };

        let mut hint = from.line;
        for index in first..self.table.item_count() {
            let match_from = line_index.pos_from_index(hint, self.table.group_value(index, 0));
            if match_from.line > to.line {
                break;
            }
            let match_to = line_index.pos_from_index(match_from.line, self.table.group_value(index, 1));
            hint = match_from.line;
            f(Range {
                from: match_from,
                to: match_to,
            });
        }
    }

    /// Mark which buckets of a minimap overview contain a match start.
    ///
    /// The caller provides a zeroed buffer; one byte per bucket is set
    /// to 1. Returns the number of document lines each bucket covers.
    pub fn fill_line_pattern(&self, line_index: &LineIndex, out: &mut [u8]) -> u32 {
        if out.is_empty() {
            return 0;
        }
        let buckets = out.len() as u32;
        let lines_per_bucket = (line_index.line_count() / buckets).max(1);

        let mut hint = 0u32;
        for index in 0..self.table.item_count() {
            let from = line_index.pos_from_index(hint, self.table.group_value(index, 0));
            hint = from.line;
            let bucket = (from.line / lines_per_bucket).min(buckets - 1);
            out[bucket as usize] = 1;
        }
        lines_per_bucket
    }
}

/// Append `(start, end)` pairs for matches of `regex` in `text`,
/// starting at `from` and dropping any match that ends past `end_cap`.
///
/// After a zero-width match the scan position advances one character,
/// never one byte, so progress is guaranteed and positions stay on
/// UTF-8 boundaries.
fn collect_matches(
    text: &str,
    regex: &Regex,
    from: usize,
    end_cap: usize,
    budget: usize,
    out: &mut GroupArray,
) {
    let mut at = from;
    while out.item_count() < budget && at <= text.len() {
        let Some(m) = regex.find_at(text, at) else {
            break;
        };
        if m.end() > end_cap {
            break;
        }
        out.push(m.start() as u32);
        out.push(m.end() as u32);
        match next_scan_position(text, m.start(), m.end()) {
            Some(next) => at = next,
            None => break,
        }
    }
}

/// The offset the scan resumes from after a match, or `None` when the
/// end of the text has been reached on a zero-width match.
pub(crate) fn next_scan_position(text: &str, start: usize, end: usize) -> Option<usize> {
    if end > start {
        return Some(end);
    }
    text[end..].chars().next().map(|c| end + c.len_utf8())
}
