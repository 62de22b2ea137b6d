//! Ranked view over every user's progression.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::SharedStore;
use crate::error::Result;
use crate::services::leveling::level_for_points;

pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: u32,
    pub user_id: String,
    pub display_name: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub points: u64,
    pub level: u32,
}

/// Read-only leaderboard; never writes progression.
#[derive(Clone)]
pub struct Leaderboard {
    store: SharedStore,
}

impl Leaderboard {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Top `n` users by points, ties broken by user ID.
    pub async fn top_n(&self, n: usize) -> Result<Vec<LeaderboardEntry>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let mut users = self.store.top_users(n).await?;
        // Re-sort locally so the tie-break holds whatever order storage used.
        users.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        users.truncate(n);

        Ok(users
            .into_iter()
            .enumerate()
            .map(|(i, user)| LeaderboardEntry {
                rank: i as u32 + 1,
                // Level is derived; never trust the stored copy for ranking output.
                level: level_for_points(user.points),
                user_id: user.user_id,
                display_name: user.display_name,
                points: user.points,
            })
            .collect())
    }
}
