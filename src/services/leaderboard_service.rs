use tracing::{debug, info};

use crate::{
    dao::{
        models::LeaderboardEntity,
        round::RoundRepository,
        round_store::{LEADERBOARD_KEY, Versioned, WriteOutcome},
        storage::StorageError,
    },
    error::ServiceError,
    state::leaderboard::{Leaderboard, LeaderboardEntry},
};

/// Accumulates per-user win counts in the leaderboard document.
#[derive(Clone)]
pub struct LeaderboardTracker {
    repository: RoundRepository,
    max_write_attempts: u32,
}

impl LeaderboardTracker {
    pub fn new(repository: RoundRepository, max_write_attempts: u32) -> Self {
        Self {
            repository,
            max_write_attempts: max_write_attempts.max(1),
        }
    }

    /// Credit one win to `user_id` and return its new total.
    pub async fn record_win(&self, user_id: &str) -> Result<u32, ServiceError> {
        for attempt in 1..=self.max_write_attempts {
            let (revision, mut leaderboard) = match self.repository.load_leaderboard().await? {
                Some(Versioned { revision, value }) => (Some(revision), Leaderboard::from(value)),
                None => (None, Leaderboard::new()),
            };

            let wins = leaderboard.record_win(user_id);
            let entity = LeaderboardEntity::from(leaderboard);
            match self.repository.store_leaderboard(revision, &entity).await? {
                WriteOutcome::Stored(_) => {
                    info!(user_id, wins, "recorded round win");
                    return Ok(wins);
                }
                WriteOutcome::Conflict => {
                    debug!(user_id, attempt, "leaderboard changed concurrently; retrying");
                }
            }
        }

        Err(StorageError::Contention {
            key: LEADERBOARD_KEY,
            attempts: self.max_write_attempts,
        }
        .into())
    }

    /// Current entries in unspecified order.
    pub async fn snapshot(&self) -> Result<Vec<LeaderboardEntry>, ServiceError> {
        let leaderboard = self
            .repository
            .load_leaderboard()
            .await?
            .map(|versioned| Leaderboard::from(versioned.value))
            .unwrap_or_default();
        Ok(leaderboard.snapshot())
    }
}
