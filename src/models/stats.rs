//! Read-only activity statistics used to evaluate achievement rules.
//!
//! A snapshot is gathered once per evaluation pass from the
//! [`ActivityStatsProvider`] so every rule in the pass sees the same data.

use chrono::{Duration, NaiveDate};
use std::collections::{BTreeSet, HashSet};

use crate::db::ActivityStatsProvider;
use crate::error::AppError;
use crate::models::ActivityRecord;

/// Snapshot of a user's completed-activity history.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityStats {
    /// Number of completed activities
    pub completed_workouts: u64,
    /// Summed distance over completed activities
    pub total_distance: f64,
    /// Size of the distinct exercise-id set over completed activities
    pub distinct_exercises: u64,
    /// Current derived level
    pub level: u32,
    /// Day the streak is anchored at
    pub today: NaiveDate,
    /// How far back `active_dates` reaches (and the streak cap)
    pub lookback_days: u32,
    /// Days with at least one completed activity, within the lookback window
    pub active_dates: BTreeSet<NaiveDate>,
}

impl ActivityStats {
    /// Earliest day included in the lookback window.
    pub fn window_start(today: NaiveDate, lookback_days: u32) -> NaiveDate {
        today - Duration::days(i64::from(lookback_days.max(1)) - 1)
    }

    /// Gather a snapshot from the provider.
    ///
    /// The four reads are independent and issued concurrently.
    pub async fn collect(
        provider: &(impl ActivityStatsProvider + ?Sized),
        user_id: &str,
        level: u32,
        today: NaiveDate,
        lookback_days: u32,
    ) -> Result<Self, AppError> {
        let since = Self::window_start(today, lookback_days);

        let (completed_workouts, total_distance, exercises, dates) = tokio::try_join!(
            provider.completed_count(user_id),
            provider.total_distance(user_id),
            provider.distinct_exercise_ids(user_id),
            provider.completed_activity_dates(user_id, since),
        )?;

        Ok(Self {
            completed_workouts,
            total_distance,
            distinct_exercises: exercises.len() as u64,
            level,
            today,
            lookback_days,
            active_dates: dates.into_iter().filter(|d| *d <= today).collect(),
        })
    }

    /// Build a snapshot directly from activity records.
    ///
    /// Non-completed records are ignored.
    pub fn from_activities(
        activities: &[ActivityRecord],
        level: u32,
        today: NaiveDate,
        lookback_days: u32,
    ) -> Self {
        let since = Self::window_start(today, lookback_days);
        let mut stats = Self {
            completed_workouts: 0,
            total_distance: 0.0,
            distinct_exercises: 0,
            level,
            today,
            lookback_days,
            active_dates: BTreeSet::new(),
        };
        let mut exercises: HashSet<&str> = HashSet::new();

        for activity in activities.iter().filter(|a| a.is_completed()) {
            stats.completed_workouts += 1;
            stats.total_distance += activity.distance.unwrap_or(0.0);
            exercises.extend(activity.exercise_ids.iter().map(String::as_str));
            if activity.date >= since && activity.date <= today {
                stats.active_dates.insert(activity.date);
            }
        }

        stats.distinct_exercises = exercises.len() as u64;
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityStatus;

    fn make_activity(id: &str, status: ActivityStatus, date: &str, distance: f64) -> ActivityRecord {
        ActivityRecord {
            id: id.to_string(),
            user_id: "u1".to_string(),
            status,
            date: date.parse().unwrap(),
            distance: Some(distance),
            exercise_ids: vec!["squat".to_string(), format!("ex-{}", id)],
        }
    }

    #[test]
    fn test_from_activities_ignores_non_completed() {
        let today: NaiveDate = "2024-03-10".parse().unwrap();
        let activities = vec![
            make_activity("1", ActivityStatus::Completed, "2024-03-10", 5.0),
            make_activity("2", ActivityStatus::Scheduled, "2024-03-09", 7.0),
            make_activity("3", ActivityStatus::Completed, "2024-03-08", 2.5),
        ];

        let stats = ActivityStats::from_activities(&activities, 1, today, 30);

        assert_eq!(stats.completed_workouts, 2);
        assert_eq!(stats.total_distance, 7.5);
        // squat, ex-1, ex-3
        assert_eq!(stats.distinct_exercises, 3);
        assert_eq!(stats.active_dates.len(), 2);
    }

    #[test]
    fn test_from_activities_bounds_dates_to_window() {
        let today: NaiveDate = "2024-03-10".parse().unwrap();
        let activities = vec![
            make_activity("1", ActivityStatus::Completed, "2024-03-10", 0.0),
            make_activity("2", ActivityStatus::Completed, "2024-02-01", 0.0),
        ];

        let stats = ActivityStats::from_activities(&activities, 1, today, 30);

        assert_eq!(stats.completed_workouts, 2);
        assert_eq!(stats.active_dates.len(), 1);
    }

    #[test]
    fn test_window_start_includes_today() {
        let today: NaiveDate = "2024-03-10".parse().unwrap();
        assert_eq!(ActivityStats::window_start(today, 1), today);
        assert_eq!(
            ActivityStats::window_start(today, 30),
            "2024-02-10".parse::<NaiveDate>().unwrap()
        );
    }
}
