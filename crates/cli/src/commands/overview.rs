use std::sync::Arc;

use anyhow::Result;
use loupe::{Document, SearchCursor, SearchProps};

use super::{build_query, load_document};
use crate::OverviewArgs;

pub fn run(args: &OverviewArgs) -> Result<()> {
    let doc = load_document(&args.query)?;
    let mut cursor = SearchCursor::new(SearchProps {
        document: Some(doc.clone() as Arc<dyn Document>),
        query: Some(build_query(&args.query)),
        ignore_case: Some(args.query.ignore_case),
        max_results: args.query.max_results,
        ..Default::default()
    })?;

    let pattern = cursor.line_pattern(args.buckets)?;
    let bar: String = pattern
        .buckets
        .iter()
        .map(|&hit| if hit == 1 { '#' } else { '.' })
        .collect();

    println!("[{}]", bar);
    println!(
        "{} matches, {} lines per bucket",
        cursor.match_count()?,
        pattern.lines_per_bucket
    );
    Ok(())
}
