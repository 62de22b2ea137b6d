// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store.
//!
//! Used by the `memory` storage backend for local runs and by the test-suite.
//! Clones share the same underlying data.

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{ActivityStatsProvider, AwardStore, DefinitionStore, UserStore};
use crate::error::AppError;
use crate::models::{AchievementDefinition, ActivityRecord, AwardedAchievement, User};

#[derive(Default)]
struct Inner {
    users: DashMap<String, User>,
    activities: DashMap<String, Vec<ActivityRecord>>,
    definitions: Mutex<Vec<AchievementDefinition>>,
    awards: Mutex<Vec<AwardedAchievement>>,
    /// Remaining award inserts before writes start failing (`None` = unlimited)
    award_write_budget: Mutex<Option<usize>>,
    fail_user_writes: AtomicBool,
}

/// In-memory database.
#[derive(Clone, Default)]
pub struct MemoryDb {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic while holding the lock cannot leave the Vec half-written.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an activity for a user.
    pub fn insert_activity(&self, activity: ActivityRecord) {
        self.inner
            .activities
            .entry(activity.user_id.clone())
            .or_default()
            .push(activity);
    }

    /// Store an award without the (user, name) uniqueness check.
    ///
    /// Simulates duplicates left behind by races or data migrations.
    pub fn insert_award_raw(&self, award: AwardedAchievement) {
        lock(&self.inner.awards).push(award);
    }

    /// Allow `n` more award inserts, then fail every following one.
    pub fn fail_award_writes_after(&self, n: usize) {
        *lock(&self.inner.award_write_budget) = Some(n);
    }

    /// Make every `save_user` call fail (or succeed again).
    pub fn set_fail_user_writes(&self, fail: bool) {
        self.inner.fail_user_writes.store(fail, Ordering::SeqCst);
    }

    /// Count stored awards for a (user, name) pair.
    pub fn award_count(&self, user_id: &str, name: &str) -> usize {
        lock(&self.inner.awards)
            .iter()
            .filter(|a| a.user_id == user_id && a.name == name)
            .count()
    }

    fn completed(&self, user_id: &str) -> Vec<ActivityRecord> {
        self.inner
            .activities
            .get(user_id)
            .map(|list| list.iter().filter(|a| a.is_completed()).cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DefinitionStore for MemoryDb {
    async fn list_definitions(&self) -> Result<Vec<AchievementDefinition>, AppError> {
        Ok(lock(&self.inner.definitions).clone())
    }

    async fn get_definition(
        &self,
        name: &str,
    ) -> Result<Option<AchievementDefinition>, AppError> {
        Ok(lock(&self.inner.definitions)
            .iter()
            .find(|d| d.name == name)
            .cloned())
    }

    async fn insert_definition_if_absent(
        &self,
        definition: &AchievementDefinition,
    ) -> Result<bool, AppError> {
        let mut definitions = lock(&self.inner.definitions);
        if definitions.iter().any(|d| d.name == definition.name) {
            return Ok(false);
        }
        definitions.push(definition.clone());
        Ok(true)
    }
}

#[async_trait]
impl AwardStore for MemoryDb {
    async fn list_awards(&self, user_id: &str) -> Result<Vec<AwardedAchievement>, AppError> {
        Ok(lock(&self.inner.awards)
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_award(&self, award: &AwardedAchievement) -> Result<bool, AppError> {
        {
            let mut budget = lock(&self.inner.award_write_budget);
            match budget.as_mut() {
                Some(0) => {
                    return Err(AppError::Database(
                        "award store unavailable (injected failure)".to_string(),
                    ))
                }
                Some(remaining) => *remaining -= 1,
                None => {}
            }
        }

        let mut awards = lock(&self.inner.awards);
        if awards
            .iter()
            .any(|a| a.user_id == award.user_id && a.name == award.name)
        {
            return Ok(false);
        }
        awards.push(award.clone());
        Ok(true)
    }

    async fn delete_award(&self, award: &AwardedAchievement) -> Result<(), AppError> {
        let mut awards = lock(&self.inner.awards);
        if let Some(pos) = awards
            .iter()
            .position(|a| a.id == award.id && a.earned_at == award.earned_at)
        {
            awards.remove(pos);
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryDb {
    async fn load_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.inner.users.get(user_id).map(|u| u.clone()))
    }

    async fn save_user(&self, user: &User) -> Result<(), AppError> {
        if self.inner.fail_user_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database(
                "user store unavailable (injected failure)".to_string(),
            ));
        }
        self.inner.users.insert(user.user_id.clone(), user.clone());
        Ok(())
    }

    async fn top_users(&self, limit: usize) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.inner.users.iter().map(|u| u.clone()).collect();
        users.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        users.truncate(limit);
        Ok(users)
    }
}

#[async_trait]
impl ActivityStatsProvider for MemoryDb {
    async fn completed_count(&self, user_id: &str) -> Result<u64, AppError> {
        Ok(self.completed(user_id).len() as u64)
    }

    async fn total_distance(&self, user_id: &str) -> Result<f64, AppError> {
        Ok(self
            .completed(user_id)
            .iter()
            .filter_map(|a| a.distance)
            .sum())
    }

    async fn distinct_exercise_ids(&self, user_id: &str) -> Result<HashSet<String>, AppError> {
        Ok(self
            .completed(user_id)
            .into_iter()
            .flat_map(|a| a.exercise_ids)
            .collect())
    }

    async fn completed_activity_dates(
        &self,
        user_id: &str,
        since: NaiveDate,
    ) -> Result<HashSet<NaiveDate>, AppError> {
        Ok(self
            .completed(user_id)
            .iter()
            .map(|a| a.date)
            .filter(|d| *d >= since)
            .collect())
    }
}
