// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Workout activity records.
//!
//! Activities are owned by the workout tracker; this crate only reads them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an activity. Only `Completed` counts toward metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Scheduled,
    Draft,
    InProgress,
    Completed,
}

/// Stored activity record in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Activity ID (also used as document ID)
    pub id: String,
    /// Owning user
    pub user_id: String,
    pub status: ActivityStatus,
    /// Calendar day of the activity, already normalized by the tracker
    pub date: NaiveDate,
    /// Distance in kilometers, if the activity has one
    #[serde(default)]
    pub distance: Option<f64>,
    /// Exercise identifiers performed during the activity
    #[serde(default)]
    pub exercise_ids: Vec<String>,
}

impl ActivityRecord {
    pub fn is_completed(&self) -> bool {
        self.status == ActivityStatus::Completed
    }
}
