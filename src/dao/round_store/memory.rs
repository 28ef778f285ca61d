//! Process-local store, used when no database is configured and by the test suites.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::{BoxFuture, ready};
use serde_json::Value;

use crate::dao::{
    round_store::{Revision, RoundStore, Versioned, WriteOutcome},
    storage::StorageResult,
};

#[derive(Debug, Clone)]
struct StoredDocument {
    revision: u64,
    value: Value,
}

/// In-memory [`RoundStore`] keeping each document next to a revision counter.
#[derive(Debug, Clone, Default)]
pub struct MemoryRoundStore {
    documents: Arc<DashMap<&'static str, StoredDocument>>,
    next_revision: Arc<AtomicU64>,
}

impl MemoryRoundStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&self) -> u64 {
        self.next_revision.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl RoundStore for MemoryRoundStore {
    fn load(&self, key: &'static str) -> BoxFuture<'static, StorageResult<Option<Versioned<Value>>>> {
        let loaded = self.documents.get(key).map(|doc| Versioned {
            revision: Revision::new(doc.revision.to_string()),
            value: doc.value.clone(),
        });
        Box::pin(ready(Ok(loaded)))
    }

    fn compare_and_set(
        &self,
        key: &'static str,
        expected: Option<Revision>,
        value: Value,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
        // The entry guard holds the shard lock, so check and write are atomic.
        let outcome = match (self.documents.entry(key), expected) {
            (Entry::Vacant(slot), None) => {
                let revision = self.bump();
                slot.insert(StoredDocument { revision, value });
                WriteOutcome::Stored(Revision::new(revision.to_string()))
            }
            (Entry::Occupied(mut slot), Some(expected))
                if slot.get().revision.to_string() == expected.as_str() =>
            {
                let revision = self.bump();
                slot.insert(StoredDocument { revision, value });
                WriteOutcome::Stored(Revision::new(revision.to_string()))
            }
            _ => WriteOutcome::Conflict,
        };
        Box::pin(ready(Ok(outcome)))
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(ready(Ok(())))
    }
}
