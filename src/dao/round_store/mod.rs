#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;

use std::fmt;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::dao::storage::StorageResult;

/// Key of the document holding the current round.
pub const ROUND_KEY: &str = "current_round";
/// Key of the document holding the cumulative leaderboard.
pub const LEADERBOARD_KEY: &str = "leaderboard";

/// Opaque token identifying one stored version of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document together with the revision it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub revision: Revision,
    pub value: T,
}

/// Result of a conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The document was replaced and now carries this revision.
    Stored(Revision),
    /// Another writer got there first; nothing was written.
    Conflict,
}

/// Versioned key-value persistence for the game documents.
///
/// `compare_and_set` only replaces the document when its current revision matches
/// `expected` (`None` meaning "the document must not exist yet").
pub trait RoundStore: Send + Sync {
    fn load(&self, key: &'static str) -> BoxFuture<'static, StorageResult<Option<Versioned<Value>>>>;
    fn compare_and_set(
        &self,
        key: &'static str,
        expected: Option<Revision>,
        value: Value,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
