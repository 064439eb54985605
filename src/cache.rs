use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, Weak};

use crate::document::Document;
use crate::line_index::LineIndex;

/// Snapshot of a document taken at a revision: the text and its line
/// table, shared by every cursor searching that document.
#[derive(Debug)]
pub(crate) struct CacheEntry {
    pub text: Box<str>,
    pub line_index: LineIndex,
    pub revision: u64,
}

struct Slot {
    doc: Weak<dyn Document>,
    entry: Arc<CacheEntry>,
}

/// Process-wide cache keyed by document identity. Holding only weak
/// document references, it never keeps a document alive; dead slots are
/// pruned whenever a new entry is stored.
static CACHE: OnceLock<Mutex<HashMap<usize, Slot>>> = OnceLock::new();

fn cache() -> &'static Mutex<HashMap<usize, Slot>> {
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

fn doc_key(doc: &Arc<dyn Document>) -> usize {
    Arc::as_ptr(doc) as *const () as usize
}

/// Whether the cached snapshot for `doc` is missing or behind the
/// document's revision counter.
pub(crate) fn needs_reindex(doc: &Arc<dyn Document>) -> bool {
    let map = cache().lock().unwrap_or_else(|e| e.into_inner());
    match map.get(&doc_key(doc)) {
        // A dead weak means the slot belongs to a dropped document
        // whose address was reused; it never counts as a hit.
        Some(slot) => slot.doc.strong_count() == 0 || slot.entry.revision != doc.revision(),
        None => true,
    }
}

/// Fetch the snapshot for `doc`, rebuilding it when the revision moved.
///
/// The returned `Arc` pins the snapshot for the duration of the
/// caller's operation; a concurrent refresh produces a fresh entry
/// rather than mutating this one.
pub(crate) fn get_or_index(doc: &Arc<dyn Document>) -> Arc<CacheEntry> {
    let key = doc_key(doc);
    let revision = doc.revision();

    {
        let map = cache().lock().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = map.get(&key) {
            if slot.doc.strong_count() > 0 && slot.entry.revision == revision {
                return slot.entry.clone();
            }
        }
    }

    // Build outside the lock; the entry is complete before any other
    // cursor can see it.
    let text = doc.text();
    let line_index = LineIndex::new(&text, doc.line_separator());
    let entry = Arc::new(CacheEntry {
        text: text.into_boxed_str(),
        line_index,
        revision,
    });

    let mut map = cache().lock().unwrap_or_else(|e| e.into_inner());
    map.retain(|_, slot| slot.doc.strong_count() > 0);
    map.insert(
        key,
        Slot {
            doc: Arc::downgrade(doc),
            entry: entry.clone(),
        },
    );
    entry
}
