pub mod count;
pub mod overview;
pub mod scan;

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use loupe::{SearchQuery, TextDocument};

use crate::QueryArgs;

pub(crate) fn load_document(args: &QueryArgs) -> Result<Arc<TextDocument>> {
    let text = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    Ok(Arc::new(TextDocument::new(text)))
}

pub(crate) fn build_query(args: &QueryArgs) -> SearchQuery {
    if args.regex {
        SearchQuery::regex(&args.pattern)
    } else {
        SearchQuery::literal(&args.pattern)
    }
}
