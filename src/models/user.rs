//! User progression model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::leveling::level_for_points;

/// User progression stored in Firestore.
///
/// `level` is derived from `points` and stored for readers of the raw
/// document. It may lag `points`, so this crate always re-derives it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User ID (also used as document ID)
    pub user_id: String,
    /// Name shown on the leaderboard
    pub display_name: String,
    /// Cumulative achievement points
    #[serde(default)]
    pub points: u64,
    /// Derived from `points`
    #[serde(default = "default_level")]
    pub level: u32,
    /// When the user was created
    pub created_at: DateTime<Utc>,
    /// Last progression change
    pub updated_at: DateTime<Utc>,
}

fn default_level() -> u32 {
    1
}

impl User {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            points: 0,
            level: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the points total and re-derive the level.
    pub fn set_points(&mut self, points: u64) {
        self.points = points;
        self.level = level_for_points(points);
        self.updated_at = Utc::now();
    }
}
