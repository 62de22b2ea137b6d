//! Database layer.
//!
//! Services talk to storage through the traits below; [`FirestoreDb`] is the
//! production backend and [`MemoryDb`] backs local runs and tests.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::{AchievementDefinition, AwardedAchievement, User};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const ACTIVITIES: &str = "activities";
    pub const DEFINITIONS: &str = "achievement_definitions";
    pub const AWARDS: &str = "awarded_achievements";
}

/// Global achievement definitions.
#[async_trait]
pub trait DefinitionStore: Send + Sync {
    async fn list_definitions(&self) -> Result<Vec<AchievementDefinition>, AppError>;

    async fn get_definition(&self, name: &str)
        -> Result<Option<AchievementDefinition>, AppError>;

    /// Create the definition unless one with the same name exists.
    ///
    /// Returns `false` (and writes nothing) when the name is taken.
    async fn insert_definition_if_absent(
        &self,
        definition: &AchievementDefinition,
    ) -> Result<bool, AppError>;
}

/// Per-user awarded achievements.
#[async_trait]
pub trait AwardStore: Send + Sync {
    /// All awards for a user, duplicates included.
    async fn list_awards(&self, user_id: &str) -> Result<Vec<AwardedAchievement>, AppError>;

    /// Create the award under its (user, name) key.
    ///
    /// Returns `false` (and writes nothing) when that key already exists.
    async fn insert_award(&self, award: &AwardedAchievement) -> Result<bool, AppError>;

    /// Delete this exact record.
    ///
    /// Duplicates of one award can share an ID, so stores that can hold
    /// more than one record per ID must match on `earned_at` as well.
    async fn delete_award(&self, award: &AwardedAchievement) -> Result<(), AppError>;
}

/// User progression records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn load_user(&self, user_id: &str) -> Result<Option<User>, AppError>;

    async fn save_user(&self, user: &User) -> Result<(), AppError>;

    /// Highest-scoring users: points descending, then user ID ascending.
    async fn top_users(&self, limit: usize) -> Result<Vec<User>, AppError>;
}

/// Aggregates over completed activities. Other statuses are never counted.
#[async_trait]
pub trait ActivityStatsProvider: Send + Sync {
    async fn completed_count(&self, user_id: &str) -> Result<u64, AppError>;

    async fn total_distance(&self, user_id: &str) -> Result<f64, AppError>;

    async fn distinct_exercise_ids(&self, user_id: &str) -> Result<HashSet<String>, AppError>;

    /// Days on or after `since` with at least one completed activity.
    async fn completed_activity_dates(
        &self,
        user_id: &str,
        since: NaiveDate,
    ) -> Result<HashSet<NaiveDate>, AppError>;
}

/// Everything the progression engine needs from storage.
pub trait Store: DefinitionStore + AwardStore + UserStore + ActivityStatsProvider {}

impl<T> Store for T where T: DefinitionStore + AwardStore + UserStore + ActivityStatsProvider {}

pub type SharedStore = Arc<dyn Store>;
