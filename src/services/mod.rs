// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod awards;
pub mod catalog;
pub mod leaderboard;
pub mod leveling;
pub mod notifier;
pub mod progress;
pub mod rules;

pub use awards::{deduplicate, AchievementProgress, AwardLedger, UserLocks, UserStatsSummary};
pub use catalog::{Catalog, NewDefinition};
pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use leveling::{level_for_points, points_for_level, LevelProgress, ProgressionLedger};
pub use notifier::{AchievementEarned, LogNotifier, NotificationDispatcher, Notifier};
