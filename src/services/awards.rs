// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Award ledger: the only writer of awarded achievements.
//!
//! Handles the core workflow:
//! 1. Repair the catalog (fill in missing baseline definitions)
//! 2. Load the user's awards and prune duplicates
//! 3. Evaluate every unearned definition against one stats snapshot
//! 4. Commit each new award, add its points, then queue a notification
//!
//! All reads and writes of one user's award set run under a per-user lock.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures_util::future::try_join_all;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::SharedStore;
use crate::error::{AppError, AwardError, Result};
use crate::models::{
    AchievementCategory, AchievementDefinition, ActivityStats, AwardedAchievement, Metric,
    Requirement, User,
};
use crate::services::leveling::{level_for_points, LevelProgress, ProgressionLedger};
use crate::services::notifier::{AchievementEarned, NotificationDispatcher};
use crate::services::progress::progress_percent;
use crate::services::rules::{meets, metric_value, parse_logged};
use crate::services::Catalog;

/// Shared per-user locks type for use in AppState.
pub type UserLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Holds one user's lock; on drop the map entry is removed if nobody else
/// holds or waits on it.
struct UserLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: UserLocks,
    user_id: String,
}

impl Drop for UserLockGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters clone the Arc before awaiting, so a count of 1 means
        // only the map holds it. `remove_if` checks under the shard lock.
        self.locks
            .remove_if(&self.user_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Split awards into one record per name plus the extras to delete.
///
/// The record with the earliest `earned_at` wins; ties go to the smaller ID
/// so every caller picks the same survivor. Survivors are returned in
/// `earned_at` order.
pub fn deduplicate(
    awards: Vec<AwardedAchievement>,
) -> (Vec<AwardedAchievement>, Vec<AwardedAchievement>) {
    let mut keep: HashMap<String, AwardedAchievement> = HashMap::new();
    let mut extras = Vec::new();

    for award in awards {
        match keep.entry(award.name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(award);
            }
            Entry::Occupied(mut slot) => {
                let current = slot.get_mut();
                if (award.earned_at, &award.id) < (current.earned_at, &current.id) {
                    extras.push(std::mem::replace(current, award));
                } else {
                    extras.push(award);
                }
            }
        }
    }

    let mut unique: Vec<AwardedAchievement> = keep.into_values().collect();
    unique.sort_by(|a, b| {
        a.earned_at
            .cmp(&b.earned_at)
            .then_with(|| a.name.cmp(&b.name))
    });
    (unique, extras)
}

/// One catalog entry merged with the user's state.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AchievementProgress {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub category: AchievementCategory,
    pub points: u32,
    pub requirement: Requirement,
    pub badge: Option<String>,
    pub icon: Option<String>,
    pub earned: bool,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub earned_at: Option<DateTime<Utc>>,
    /// Current value of the requirement's metric (0 if malformed)
    pub current_value: f64,
    /// 0–100
    pub progress: u8,
}

/// Progression and activity summary for one user.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserStatsSummary {
    pub user_id: String,
    pub display_name: String,
    pub progression: LevelProgress,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub completed_workouts: u64,
    pub total_distance: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub distinct_exercises: u64,
    pub current_streak: u32,
    pub achievements_earned: u32,
    pub achievements_total: u32,
}

/// Evaluates, deduplicates and grants achievements.
#[derive(Clone)]
pub struct AwardLedger {
    store: SharedStore,
    catalog: Catalog,
    progression: ProgressionLedger,
    notifications: Option<NotificationDispatcher>,
    /// Per-user mutex to serialize award-set read-modify-write.
    locks: UserLocks,
    lookback_days: u32,
}

impl AwardLedger {
    pub fn new(
        store: SharedStore,
        notifications: Option<NotificationDispatcher>,
        locks: UserLocks,
        lookback_days: u32,
    ) -> Self {
        Self {
            catalog: Catalog::new(store.clone()),
            progression: ProgressionLedger::new(store.clone()),
            store,
            notifications,
            locks,
            lookback_days: lookback_days.max(1),
        }
    }

    async fn lock_user(&self, user_id: &str) -> UserLockGuard {
        let lock = self
            .locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        UserLockGuard {
            guard: Some(lock.lock_owned().await),
            locks: self.locks.clone(),
            user_id: user_id.to_string(),
        }
    }

    async fn load_user(&self, user_id: &str) -> Result<User> {
        self.store
            .load_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    /// Load a user's awards, deleting duplicates from storage.
    ///
    /// Callers must hold the user's lock.
    async fn load_deduplicated(&self, user_id: &str) -> Result<Vec<AwardedAchievement>> {
        let awards = self.store.list_awards(user_id).await?;
        let (unique, extras) = deduplicate(awards);

        try_join_all(extras.iter().map(|extra| self.store.delete_award(extra))).await?;
        if !extras.is_empty() {
            tracing::info!(
                user_id,
                pruned = extras.len(),
                "Pruned duplicate awarded achievements"
            );
        }

        Ok(unique)
    }

    async fn stats_snapshot(&self, user: &User, now: DateTime<Utc>) -> Result<ActivityStats> {
        ActivityStats::collect(
            &*self.store,
            &user.user_id,
            level_for_points(user.points),
            now.date_naive(),
            self.lookback_days,
        )
        .await
    }

    /// Grant every achievement the user newly qualifies for.
    pub async fn check_and_award(
        &self,
        user_id: &str,
    ) -> std::result::Result<Vec<AwardedAchievement>, AwardError> {
        self.check_and_award_at(user_id, Utc::now()).await
    }

    /// [`check_and_award`](Self::check_and_award) with an explicit clock.
    ///
    /// `now` stamps new awards and its date anchors the streak.
    ///
    /// On a storage failure the pass stops; awards committed before the
    /// failure are kept and reported in [`AwardError::committed`].
    pub async fn check_and_award_at(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<Vec<AwardedAchievement>, AwardError> {
        let _guard = self.lock_user(user_id).await;

        let mut user = self.load_user(user_id).await?;
        let definitions = self.catalog.load_repaired().await?;
        let mut earned: HashSet<String> = self
            .load_deduplicated(user_id)
            .await?
            .into_iter()
            .map(|a| a.name)
            .collect();
        let mut stats = self.stats_snapshot(&user, now).await?;

        let candidates: Vec<_> = definitions
            .iter()
            .filter(|d| !earned.contains(&d.name))
            .filter_map(|d| parse_logged(&d.requirement, &d.name).map(|req| (d, req)))
            .collect();

        let mut newly_awarded: Vec<AwardedAchievement> = Vec::new();

        // Points earned in one sweep can unlock level achievements, so
        // sweep again until nothing new is granted.
        loop {
            let mut granted_this_sweep = false;

            for (definition, requirement) in &candidates {
                if earned.contains(&definition.name) || !meets(&stats, *requirement) {
                    continue;
                }

                let award = AwardedAchievement::from_definition(definition, user_id, now);
                match self.store.insert_award(&award).await {
                    Ok(true) => {}
                    Ok(false) => {
                        // Written by someone outside this process; its points
                        // were added by that writer.
                        earned.insert(definition.name.clone());
                        continue;
                    }
                    Err(source) => {
                        return Err(AwardError {
                            committed: newly_awarded,
                            source,
                        })
                    }
                }
                earned.insert(definition.name.clone());
                newly_awarded.push(award);

                let level = match self
                    .progression
                    .add_points(&mut user, i64::from(definition.points))
                    .await
                {
                    Ok(level) => level,
                    Err(source) => {
                        return Err(AwardError {
                            committed: newly_awarded,
                            source,
                        })
                    }
                };
                stats.level = level;

                tracing::info!(
                    user_id,
                    achievement = %definition.name,
                    points = definition.points,
                    total_points = user.points,
                    level,
                    "Achievement awarded"
                );

                if let Some(notifications) = &self.notifications {
                    notifications.emit(AchievementEarned {
                        user_id: user_id.to_string(),
                        achievement: definition.name.clone(),
                        points: definition.points,
                        level,
                    });
                }
                granted_this_sweep = true;
            }

            if !granted_this_sweep {
                break;
            }
        }

        Ok(newly_awarded)
    }

    /// A user's awards, one per achievement name.
    pub async fn list_user_achievements(&self, user_id: &str) -> Result<Vec<AwardedAchievement>> {
        let _guard = self.lock_user(user_id).await;
        self.load_user(user_id).await?;
        self.load_deduplicated(user_id).await
    }

    /// Rebuild a user's points and level from their award set.
    pub async fn recalculate(&self, user_id: &str) -> Result<User> {
        let _guard = self.lock_user(user_id).await;
        self.load_deduplicated(user_id).await?;
        self.progression.recalculate_from_ledger(user_id).await
    }

    /// Every catalog entry with the user's earned state and progress.
    pub async fn achievements_with_progress(
        &self,
        user_id: &str,
    ) -> Result<Vec<AchievementProgress>> {
        self.achievements_with_progress_at(user_id, Utc::now()).await
    }

    pub async fn achievements_with_progress_at(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<AchievementProgress>> {
        let (user, awards) = {
            let _guard = self.lock_user(user_id).await;
            let user = self.load_user(user_id).await?;
            (user, self.load_deduplicated(user_id).await?)
        };
        let definitions = self.catalog.list_definitions().await?;
        let stats = self.stats_snapshot(&user, now).await?;

        let earned_at: HashMap<&str, DateTime<Utc>> = awards
            .iter()
            .map(|a| (a.name.as_str(), a.earned_at))
            .collect();

        Ok(definitions
            .into_iter()
            .map(|definition| {
                let earned = earned_at.get(definition.name.as_str()).copied();
                let current_value = definition
                    .requirement
                    .metric
                    .parse::<Metric>()
                    .map(|m| metric_value(&stats, m))
                    .unwrap_or(0.0);
                let progress = progress_percent(&stats, &definition, earned.is_some());
                into_progress(definition, earned, current_value, progress)
            })
            .collect())
    }

    /// Points, level and activity totals for a user.
    pub async fn user_stats(&self, user_id: &str) -> Result<UserStatsSummary> {
        self.user_stats_at(user_id, Utc::now()).await
    }

    pub async fn user_stats_at(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<UserStatsSummary> {
        let (user, awards) = {
            let _guard = self.lock_user(user_id).await;
            let user = self.load_user(user_id).await?;
            (user, self.load_deduplicated(user_id).await?)
        };
        let (definitions, stats) = tokio::try_join!(
            self.catalog.list_definitions(),
            self.stats_snapshot(&user, now),
        )?;

        Ok(UserStatsSummary {
            user_id: user.user_id,
            display_name: user.display_name,
            progression: LevelProgress::new(user.points),
            completed_workouts: stats.completed_workouts,
            total_distance: stats.total_distance,
            distinct_exercises: stats.distinct_exercises,
            current_streak: metric_value(&stats, Metric::StreakDays) as u32,
            achievements_earned: awards.len() as u32,
            achievements_total: definitions.len() as u32,
        })
    }
}

fn into_progress(
    definition: AchievementDefinition,
    earned_at: Option<DateTime<Utc>>,
    current_value: f64,
    progress: u8,
) -> AchievementProgress {
    AchievementProgress {
        name: definition.name,
        description: definition.description,
        category: definition.category,
        points: definition.points,
        requirement: definition.requirement,
        badge: definition.badge,
        icon: definition.icon,
        earned: earned_at.is_some(),
        earned_at,
        current_value,
        progress,
    }
}
