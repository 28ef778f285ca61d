use indexmap::IndexMap;

use crate::dao::models::{LeaderboardEntity, LeaderboardEntryEntity};

/// Cumulative win tally of a single user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub wins: u32,
}

/// Per-user win counts, kept in first-win order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaderboard {
    wins: IndexMap<String, u32>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit one win to `user_id`, creating its entry on the first win.
    pub fn record_win(&mut self, user_id: &str) -> u32 {
        let wins = self.wins.entry(user_id.to_string()).or_insert(0);
        *wins = wins.saturating_add(1);
        *wins
    }

    /// Current entries. Callers sort them for display.
    pub fn snapshot(&self) -> Vec<LeaderboardEntry> {
        self.wins
            .iter()
            .map(|(user_id, wins)| LeaderboardEntry {
                user_id: user_id.clone(),
                wins: *wins,
            })
            .collect()
    }
}

impl From<LeaderboardEntity> for Leaderboard {
    fn from(value: LeaderboardEntity) -> Self {
        let mut leaderboard = Leaderboard::new();
        for entry in value.entries {
            // Duplicated users in a hand-edited document are merged.
            let wins = leaderboard.wins.entry(entry.user_id).or_insert(0);
            *wins = wins.saturating_add(entry.wins);
        }
        leaderboard
    }
}

impl From<Leaderboard> for LeaderboardEntity {
    fn from(value: Leaderboard) -> Self {
        Self {
            entries: value
                .wins
                .into_iter()
                .map(|(user_id, wins)| LeaderboardEntryEntity { user_id, wins })
                .collect(),
        }
    }
}
