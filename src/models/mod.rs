// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod achievement;
pub mod activity;
pub mod stats;
pub mod user;

pub use achievement::{
    AchievementCategory, AchievementDefinition, AwardedAchievement, Metric, ParsedRequirement,
    Requirement, RuleError,
};
pub use activity::{ActivityRecord, ActivityStatus};
pub use stats::ActivityStats;
pub use user::User;
