// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Achievement definitions, awarded achievements and their requirements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A computable quantity derived from a user's completed-activity history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TotalWorkouts,
    TotalDistance,
    StreakDays,
    Level,
    ExerciseCount,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::TotalWorkouts,
        Metric::TotalDistance,
        Metric::StreakDays,
        Metric::Level,
        Metric::ExerciseCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::TotalWorkouts => "total_workouts",
            Metric::TotalDistance => "total_distance",
            Metric::StreakDays => "streak_days",
            Metric::Level => "level",
            Metric::ExerciseCount => "exercise_count",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| RuleError::UnknownMetric(s.to_string()))
    }
}

/// Display grouping for achievements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "kebab-case")]
pub enum AchievementCategory {
    WorkoutCount,
    Streak,
    Distance,
    Level,
    ExerciseDiversity,
}

/// Why a stored requirement cannot be evaluated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    #[error("unknown metric: {0:?}")]
    UnknownMetric(String),

    #[error("requirement has no threshold")]
    MissingThreshold,

    #[error("threshold is not a finite number: {0}")]
    InvalidThreshold(f64),
}

/// Requirement as persisted.
///
/// Kept loosely typed so that records written by older clients (or by hand)
/// still deserialize; use [`Requirement::parse`] before evaluating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Requirement {
    #[serde(default)]
    pub metric: String,
    #[serde(default)]
    pub value: Option<f64>,
}

/// A requirement that passed validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedRequirement {
    pub metric: Metric,
    pub threshold: f64,
}

impl Requirement {
    pub fn new(metric: Metric, threshold: f64) -> Self {
        Self {
            metric: metric.as_str().to_string(),
            value: Some(threshold),
        }
    }

    pub fn parse(&self) -> Result<ParsedRequirement, RuleError> {
        let metric: Metric = self.metric.parse()?;
        let threshold = self.value.ok_or(RuleError::MissingThreshold)?;
        if !threshold.is_finite() {
            return Err(RuleError::InvalidThreshold(threshold));
        }
        Ok(ParsedRequirement { metric, threshold })
    }
}

/// Global (unowned) achievement definition.
///
/// Stored in `achievement_definitions`, keyed by the url-encoded name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AchievementDefinition {
    pub id: String,
    /// Globally unique key
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub category: AchievementCategory,
    pub points: u32,
    pub requirement: Requirement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Always `None` for global definitions
    #[serde(default)]
    pub user_id: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

/// Per-user snapshot of a definition at the time it was earned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AwardedAchievement {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub category: AchievementCategory,
    pub points: u32,
    pub requirement: Requirement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub earned_at: DateTime<Utc>,
}

impl AwardedAchievement {
    /// Copy a definition into an award bound to `user_id`.
    pub fn from_definition(
        definition: &AchievementDefinition,
        user_id: &str,
        earned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: award_document_id(user_id, &definition.name),
            user_id: user_id.to_string(),
            name: definition.name.clone(),
            description: definition.description.clone(),
            category: definition.category,
            points: definition.points,
            requirement: definition.requirement.clone(),
            badge: definition.badge.clone(),
            icon: definition.icon.clone(),
            earned_at,
        }
    }
}

/// Document ID for a definition: the url-encoded name.
pub fn definition_document_id(name: &str) -> String {
    urlencoding::encode(name).into_owned()
}

/// Document ID for an award: one per (user, name) pair.
pub fn award_document_id(user_id: &str, name: &str) -> String {
    format!(
        "{}_{}",
        urlencoding::encode(user_id),
        urlencoding::encode(name)
    )
}
