use serde::Serialize;
use utoipa::ToSchema;

use crate::state::leaderboard::LeaderboardEntry;

/// Wins accumulated by one player.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntryView {
    pub user_id: String,
    /// Rounds won so far.
    pub wins: u32,
}

/// Response of `GET /api/leaderboard`, best players first.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntryView>,
}

impl From<Vec<LeaderboardEntry>> for LeaderboardResponse {
    fn from(mut entries: Vec<LeaderboardEntry>) -> Self {
        entries.sort_by(|a, b| b.wins.cmp(&a.wins).then_with(|| a.user_id.cmp(&b.user_id)));
        Self {
            entries: entries
                .into_iter()
                .map(|entry| LeaderboardEntryView {
                    user_id: entry.user_id,
                    wins: entry.wins,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(user_id: &str, wins: u32) -> LeaderboardEntry {
        LeaderboardEntry {
            user_id: user_id.into(),
            wins,
        }
    }

    #[test]
    fn entries_sorted_by_wins_then_user() {
        let response = LeaderboardResponse::from(vec![entry("b", 1), entry("c", 3), entry("a", 1)]);
        let order: Vec<_> = response.entries.iter().map(|e| e.user_id.as_str()).collect();
        assert_eq!(order, ["c", "a", "b"]);
    }
}
