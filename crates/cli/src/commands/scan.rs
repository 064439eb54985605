use anyhow::Result;
use loupe::{ScanRequest, scan_document_for_matches};
use serde_json::json;

use super::{build_query, load_document};
use crate::ScanArgs;

pub fn run(args: &ScanArgs) -> Result<()> {
    let doc = load_document(&args.query)?;
    let max_results = args.query.max_results.unwrap_or(u32::MAX);

    let mut printed = 0u32;
    scan_document_for_matches(
        ScanRequest {
            document: doc.as_ref(),
            query: build_query(&args.query),
            ignore_case: args.query.ignore_case,
            range: None,
        },
        |from, to, groups| {
            if printed >= max_results {
                return;
            }
            printed += 1;

            if args.json {
                let line = json!({
                    "from": from,
                    "to": to,
                    "text": groups[0],
                });
                println!("{}", line);
            } else {
                let text = groups[0].unwrap_or("");
                println!("{}:{}  {}", from.line + 1, from.ch + 1, text);
            }
        },
    )?;

    Ok(())
}
