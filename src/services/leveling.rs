// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Points and level progression.
//!
//! Level `L` needs `L·(L−1)·50` points: 0, 100, 300, 600, 1000, ...
//! The level is always derived from points and never stored on its own.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::SharedStore;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::services::awards::deduplicate;

const POINTS_PER_LEVEL_STEP: u64 = 100;

/// Points required to reach `level`, saturating at `u64::MAX`.
pub fn points_for_level(level: u32) -> u64 {
    checked_points_for_level(level).unwrap_or(u64::MAX)
}

fn checked_points_for_level(level: u32) -> Option<u64> {
    let l = u64::from(level.max(1));
    // l·(l−1) fits in u64 for any u32 level; the step multiply may not.
    (l * (l - 1) / 2).checked_mul(POINTS_PER_LEVEL_STEP)
}

/// Largest level `L >= 1` with `points >= points_for_level(L)`.
pub fn level_for_points(points: u64) -> u32 {
    // Solve L² − L − points/50 = 0, then correct for float rounding.
    let estimate = (1.0 + (1.0 + 8.0 * points as f64 / POINTS_PER_LEVEL_STEP as f64).sqrt()) / 2.0;
    let mut level = (estimate.floor() as u32).max(1);
    while level > 1 && !matches!(checked_points_for_level(level), Some(p) if p <= points) {
        level -= 1;
    }
    while let Some(next) = level.checked_add(1).and_then(checked_points_for_level) {
        if next > points {
            break;
        }
        level += 1;
    }
    level
}

/// Where a points total sits between two levels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LevelProgress {
    pub level: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub points: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub current_level_points: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub next_level_points: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub points_to_next_level: u64,
    /// 0–100
    pub percent: u8,
}

impl LevelProgress {
    pub fn new(points: u64) -> Self {
        let level = level_for_points(points);
        let current = points_for_level(level);
        let next = points_for_level(level.saturating_add(1));
        let percent = match next - current {
            0 => 100,
            span => (u128::from(points - current) * 100 / u128::from(span)).min(100) as u8,
        };

        Self {
            level,
            points,
            current_level_points: current,
            next_level_points: next,
            points_to_next_level: next - points,
            percent,
        }
    }
}

/// Owns the points/level record of each user.
#[derive(Clone)]
pub struct ProgressionLedger {
    store: SharedStore,
}

impl ProgressionLedger {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Add `delta` points to `user`, persist it, and return the new level.
    ///
    /// A non-positive delta changes nothing and writes nothing.
    pub async fn add_points(&self, user: &mut User, delta: i64) -> Result<u32> {
        // The stored level may lag a points total written elsewhere.
        let old_level = level_for_points(user.points);
        if delta <= 0 {
            return Ok(old_level);
        }

        user.set_points(user.points.saturating_add(delta as u64));
        self.store.save_user(user).await?;

        if user.level > old_level {
            tracing::info!(
                user_id = %user.user_id,
                old_level,
                new_level = user.level,
                points = user.points,
                "Level up"
            );
        }

        Ok(user.level)
    }

    /// Rebuild points and level from the user's deduplicated award set.
    ///
    /// The result depends only on which awards exist, not on the history of
    /// `add_points` calls, so running it repeatedly is safe.
    pub async fn recalculate_from_ledger(&self, user_id: &str) -> Result<User> {
        let mut user = self
            .store
            .load_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let awards = self.store.list_awards(user_id).await?;
        let (unique, _) = deduplicate(awards);
        let total: u64 = unique.iter().map(|a| u64::from(a.points)).sum();

        if total != user.points {
            tracing::info!(
                user_id,
                old_points = user.points,
                new_points = total,
                "Recalculated points from award ledger"
            );
        }

        user.set_points(total);
        self.store.save_user(&user).await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_thresholds() {
        assert_eq!(level_for_points(0), 1);
        assert_eq!(level_for_points(99), 1);
        assert_eq!(level_for_points(100), 2);
        assert_eq!(level_for_points(299), 2);
        assert_eq!(level_for_points(300), 3);
        assert_eq!(level_for_points(600), 4);
        assert_eq!(level_for_points(999), 4);
        assert_eq!(level_for_points(1000), 5);
    }

    #[test]
    fn test_points_for_level() {
        assert_eq!(points_for_level(1), 0);
        assert_eq!(points_for_level(2), 100);
        assert_eq!(points_for_level(5), 1000);
        assert_eq!(points_for_level(10), 4500);
    }

    #[test]
    fn test_level_matches_threshold_schedule_exhaustively() {
        for level in 1..500u32 {
            let threshold = points_for_level(level);
            assert_eq!(level_for_points(threshold), level);
            if threshold > 0 {
                assert_eq!(level_for_points(threshold - 1), level - 1);
            }
        }
    }

    #[test]
    fn test_level_progress() {
        let progress = LevelProgress::new(150);
        assert_eq!(progress.level, 2);
        assert_eq!(progress.current_level_points, 100);
        assert_eq!(progress.next_level_points, 300);
        assert_eq!(progress.points_to_next_level, 150);
        assert_eq!(progress.percent, 25);
    }

    #[test]
    fn test_huge_point_totals_saturate() {
        let level = level_for_points(u64::MAX);
        assert!(points_for_level(level) <= u64::MAX);
        assert_eq!(points_for_level(u32::MAX), u64::MAX);

        let progress = LevelProgress::new(u64::MAX);
        assert_eq!(progress.level, level);
        assert!(progress.percent <= 100);
        assert_eq!(level_for_points(u64::MAX - 1), level);
    }

    #[test]
    fn test_level_progress_at_exact_threshold() {
        let progress = LevelProgress::new(600);
        assert_eq!(progress.level, 4);
        assert_eq!(progress.percent, 0);
    }
}
