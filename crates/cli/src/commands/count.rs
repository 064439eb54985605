use std::sync::Arc;

use anyhow::Result;
use loupe::{Document, SearchCursor, SearchProps};

use super::{build_query, load_document};
use crate::QueryArgs;

pub fn run(args: &QueryArgs) -> Result<()> {
    let doc = load_document(args)?;
    let mut cursor = SearchCursor::new(SearchProps {
        document: Some(doc.clone() as Arc<dyn Document>),
        query: Some(build_query(args)),
        ignore_case: Some(args.ignore_case),
        max_results: args.max_results,
        ..Default::default()
    })?;

    println!("{}", cursor.match_count()?);
    Ok(())
}
