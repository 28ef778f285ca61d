use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};

use crate::dao::{
    models::{LeaderboardEntity, RoundEntity},
    round_store::{LEADERBOARD_KEY, ROUND_KEY, Revision, RoundStore, Versioned, WriteOutcome},
    storage::{StorageError, StorageResult},
};

/// Typed access to the documents kept in a [`RoundStore`].
#[derive(Clone)]
pub struct RoundRepository {
    store: Arc<dyn RoundStore>,
}

impl RoundRepository {
    pub fn new(store: Arc<dyn RoundStore>) -> Self {
        Self { store }
    }

    /// Fetch the current round together with its revision.
    pub async fn load_round(&self) -> StorageResult<Option<Versioned<RoundEntity>>> {
        self.load(ROUND_KEY).await
    }

    /// Replace the current round if it is still at `expected`.
    pub async fn store_round(
        &self,
        expected: Option<Revision>,
        round: &RoundEntity,
    ) -> StorageResult<WriteOutcome> {
        self.store(ROUND_KEY, expected, round).await
    }

    pub async fn load_leaderboard(&self) -> StorageResult<Option<Versioned<LeaderboardEntity>>> {
        self.load(LEADERBOARD_KEY).await
    }

    pub async fn store_leaderboard(
        &self,
        expected: Option<Revision>,
        leaderboard: &LeaderboardEntity,
    ) -> StorageResult<WriteOutcome> {
        self.store(LEADERBOARD_KEY, expected, leaderboard).await
    }

    pub async fn health_check(&self) -> StorageResult<()> {
        self.store.health_check().await
    }

    async fn load<T>(&self, key: &'static str) -> StorageResult<Option<Versioned<T>>>
    where
        T: DeserializeOwned,
    {
        let Some(raw) = self.store.load(key).await? else {
            return Ok(None);
        };

        let value = serde_json::from_value(raw.value)
            .map_err(|source| StorageError::Corrupted { key, source })?;
        Ok(Some(Versioned {
            revision: raw.revision,
            value,
        }))
    }

    async fn store<T>(
        &self,
        key: &'static str,
        expected: Option<Revision>,
        document: &T,
    ) -> StorageResult<WriteOutcome>
    where
        T: Serialize,
    {
        let value = serde_json::to_value(document)
            .map_err(|source| StorageError::Corrupted { key, source })?;
        self.store.compare_and_set(key, expected, value).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::dao::{models::PhaseEntity, round_store::memory::MemoryRoundStore};

    #[tokio::test]
    async fn round_id_is_persisted_as_string() {
        let store = Arc::new(MemoryRoundStore::new());
        let repository = RoundRepository::new(store.clone());
        let round = RoundEntity {
            id: 7,
            content_ref: "/memes/meme1.png".into(),
            captions: Vec::new(),
            status: PhaseEntity::Voting,
            winner: None,
            voters: Vec::new(),
        };

        repository.store_round(None, &round).await.unwrap();

        let raw = store.load(ROUND_KEY).await.unwrap().unwrap();
        assert_eq!(raw.value["id"], json!("7"));
        assert_eq!(raw.value["status"], json!("voting"));

        let loaded = repository.load_round().await.unwrap().unwrap();
        assert_eq!(loaded.value, round);
    }

    #[tokio::test]
    async fn malformed_document_is_reported_as_corrupted() {
        let store = Arc::new(MemoryRoundStore::new());
        store
            .compare_and_set(ROUND_KEY, None, json!({"id": "not-a-number"}))
            .await
            .unwrap();

        let err = RoundRepository::new(store).load_round().await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupted { key: ROUND_KEY, .. }));
    }
}
