// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Achievement rule evaluation.
//!
//! Every metric maps to one pure extractor `(stats) -> value`. The same table
//! drives both the yes/no check here and the progress percentage in
//! [`crate::services::progress`].

use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;

use crate::models::{ActivityStats, Metric, ParsedRequirement, Requirement, RuleError};

type MetricFn = fn(&ActivityStats) -> f64;

fn extractor(metric: Metric) -> MetricFn {
    match metric {
        Metric::TotalWorkouts => |s: &ActivityStats| s.completed_workouts as f64,
        Metric::TotalDistance => |s: &ActivityStats| s.total_distance,
        Metric::ExerciseCount => |s: &ActivityStats| s.distinct_exercises as f64,
        Metric::Level => |s: &ActivityStats| f64::from(s.level),
        Metric::StreakDays => |s: &ActivityStats| f64::from(streak_days(s)),
    }
}

/// Current value of `metric` for the snapshot.
pub fn metric_value(stats: &ActivityStats, metric: Metric) -> f64 {
    extractor(metric)(stats)
}

/// Consecutive days with a completed activity, counted back from `today`.
///
/// Zero if `today` itself has no activity. Never exceeds the lookback window.
pub fn current_streak(
    active_dates: &BTreeSet<NaiveDate>,
    today: NaiveDate,
    lookback_days: u32,
) -> u32 {
    let mut streak = 0;
    let mut day = today;
    while streak < lookback_days && active_dates.contains(&day) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}

fn streak_days(stats: &ActivityStats) -> u32 {
    current_streak(&stats.active_dates, stats.today, stats.lookback_days)
}

/// Parse a stored requirement, logging it if it cannot be evaluated.
pub fn parse_logged(requirement: &Requirement, achievement: &str) -> Option<ParsedRequirement> {
    match requirement.parse() {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            log_malformed(achievement, requirement, &err);
            None
        }
    }
}

fn log_malformed(achievement: &str, requirement: &Requirement, err: &RuleError) {
    tracing::warn!(
        achievement,
        metric = %requirement.metric,
        value = ?requirement.value,
        error = %err,
        "Malformed achievement requirement; treating as not satisfied"
    );
}

/// Whether the snapshot meets an already-parsed requirement.
pub fn meets(stats: &ActivityStats, requirement: ParsedRequirement) -> bool {
    metric_value(stats, requirement.metric) >= requirement.threshold
}

/// Whether the snapshot satisfies a stored requirement.
///
/// Malformed requirements are never satisfied; they are logged, not raised.
pub fn is_satisfied(stats: &ActivityStats, requirement: &Requirement, achievement: &str) -> bool {
    parse_logged(requirement, achievement).is_some_and(|parsed| meets(stats, parsed))
}
