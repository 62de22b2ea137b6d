//! Partial progress toward unearned achievements.

use crate::models::{AchievementDefinition, ActivityStats};
use crate::services::rules::{metric_value, parse_logged};

/// Percentage (0–100) of the way `stats` is toward `definition`.
///
/// Earned achievements are always 100. Malformed requirements report 0.
pub fn progress_percent(
    stats: &ActivityStats,
    definition: &AchievementDefinition,
    earned: bool,
) -> u8 {
    if earned {
        return 100;
    }

    let Some(requirement) = parse_logged(&definition.requirement, &definition.name) else {
        return 0;
    };

    if requirement.threshold <= 0.0 {
        return 100;
    }

    let ratio = metric_value(stats, requirement.metric) / requirement.threshold * 100.0;
    ratio.round().clamp(0.0, 100.0) as u8
}
