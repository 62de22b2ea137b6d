// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Global achievement catalog.
//!
//! The baseline set is reconciled by name: missing entries are inserted,
//! existing ones are never touched. Because it only fills gaps, running it
//! repeatedly or from several requests at once converges on the same catalog.

use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use crate::db::SharedStore;
use crate::error::{AppError, Result};
use crate::models::achievement::definition_document_id;
use crate::models::{AchievementCategory, AchievementDefinition, Metric, Requirement};

struct BaselineEntry {
    name: &'static str,
    description: &'static str,
    category: AchievementCategory,
    points: u32,
    metric: Metric,
    threshold: f64,
    badge: &'static str,
    icon: &'static str,
}

const BASELINE: &[BaselineEntry] = &[
    // Workout count
    BaselineEntry {
        name: "First Step",
        description: "Complete your first workout",
        category: AchievementCategory::WorkoutCount,
        points: 10,
        metric: Metric::TotalWorkouts,
        threshold: 1.0,
        badge: "bronze",
        icon: "👟",
    },
    BaselineEntry {
        name: "Getting Started",
        description: "Complete 5 workouts",
        category: AchievementCategory::WorkoutCount,
        points: 25,
        metric: Metric::TotalWorkouts,
        threshold: 5.0,
        badge: "bronze",
        icon: "💪",
    },
    BaselineEntry {
        name: "Dedicated",
        description: "Complete 10 workouts",
        category: AchievementCategory::WorkoutCount,
        points: 50,
        metric: Metric::TotalWorkouts,
        threshold: 10.0,
        badge: "silver",
        icon: "🏋️",
    },
    BaselineEntry {
        name: "Committed",
        description: "Complete 25 workouts",
        category: AchievementCategory::WorkoutCount,
        points: 100,
        metric: Metric::TotalWorkouts,
        threshold: 25.0,
        badge: "gold",
        icon: "🥇",
    },
    BaselineEntry {
        name: "Centurion",
        description: "Complete 100 workouts",
        category: AchievementCategory::WorkoutCount,
        points: 250,
        metric: Metric::TotalWorkouts,
        threshold: 100.0,
        badge: "platinum",
        icon: "🏛️",
    },
    // Streaks
    BaselineEntry {
        name: "On a Roll",
        description: "Work out 3 days in a row",
        category: AchievementCategory::Streak,
        points: 30,
        metric: Metric::StreakDays,
        threshold: 3.0,
        badge: "bronze",
        icon: "🔥",
    },
    BaselineEntry {
        name: "Week Warrior",
        description: "Work out 7 days in a row",
        category: AchievementCategory::Streak,
        points: 75,
        metric: Metric::StreakDays,
        threshold: 7.0,
        badge: "silver",
        icon: "📅",
    },
    BaselineEntry {
        name: "Unstoppable",
        description: "Work out 30 days in a row",
        category: AchievementCategory::Streak,
        points: 300,
        metric: Metric::StreakDays,
        threshold: 30.0,
        badge: "gold",
        icon: "⚡",
    },
    // Distance
    BaselineEntry {
        name: "First 5K",
        description: "Cover 5 km in total",
        category: AchievementCategory::Distance,
        points: 20,
        metric: Metric::TotalDistance,
        threshold: 5.0,
        badge: "bronze",
        icon: "🏃",
    },
    BaselineEntry {
        name: "Marathoner",
        description: "Cover a marathon distance in total",
        category: AchievementCategory::Distance,
        points: 100,
        metric: Metric::TotalDistance,
        threshold: 42.195,
        badge: "silver",
        icon: "🏅",
    },
    BaselineEntry {
        name: "Long Hauler",
        description: "Cover 250 km in total",
        category: AchievementCategory::Distance,
        points: 250,
        metric: Metric::TotalDistance,
        threshold: 250.0,
        badge: "gold",
        icon: "🛣️",
    },
    // Exercise diversity
    BaselineEntry {
        name: "Explorer",
        description: "Try 5 different exercises",
        category: AchievementCategory::ExerciseDiversity,
        points: 25,
        metric: Metric::ExerciseCount,
        threshold: 5.0,
        badge: "bronze",
        icon: "🧭",
    },
    BaselineEntry {
        name: "Well Rounded",
        description: "Try 20 different exercises",
        category: AchievementCategory::ExerciseDiversity,
        points: 100,
        metric: Metric::ExerciseCount,
        threshold: 20.0,
        badge: "gold",
        icon: "🎯",
    },
    // Levels
    BaselineEntry {
        name: "Rising Star",
        description: "Reach level 3",
        category: AchievementCategory::Level,
        points: 50,
        metric: Metric::Level,
        threshold: 3.0,
        badge: "silver",
        icon: "⭐",
    },
    BaselineEntry {
        name: "Veteran",
        description: "Reach level 10",
        category: AchievementCategory::Level,
        points: 200,
        metric: Metric::Level,
        threshold: 10.0,
        badge: "gold",
        icon: "🌟",
    },
];

impl BaselineEntry {
    fn to_definition(&self) -> AchievementDefinition {
        AchievementDefinition {
            id: definition_document_id(self.name),
            name: self.name.to_string(),
            description: self.description.to_string(),
            category: self.category,
            points: self.points,
            requirement: Requirement::new(self.metric, self.threshold),
            badge: Some(self.badge.to_string()),
            icon: Some(self.icon.to_string()),
            user_id: None,
            created_at: Utc::now(),
        }
    }
}

/// Names of the built-in achievements.
pub fn baseline_names() -> impl Iterator<Item = &'static str> {
    BASELINE.iter().map(|e| e.name)
}

/// The built-in achievements as fresh definitions.
pub fn baseline_definitions() -> Vec<AchievementDefinition> {
    BASELINE.iter().map(BaselineEntry::to_definition).collect()
}

/// Request body for creating a definition.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewDefinition {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub category: AchievementCategory,
    #[validate(range(min = 1))]
    pub points: u32,
    pub requirement: Requirement,
    pub badge: Option<String>,
    pub icon: Option<String>,
}

/// Achievement catalog operations.
#[derive(Clone)]
pub struct Catalog {
    store: SharedStore,
}

impl Catalog {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Insert every baseline entry whose name is not in `existing`.
    ///
    /// Returns the definitions actually written by this call.
    pub async fn ensure_baseline(
        &self,
        existing: &[AchievementDefinition],
    ) -> Result<Vec<AchievementDefinition>> {
        let mut inserted = Vec::new();

        for entry in BASELINE {
            if existing.iter().any(|d| d.name == entry.name) {
                continue;
            }

            let definition = entry.to_definition();
            // Another request may have inserted it since `existing` was read.
            if self.store.insert_definition_if_absent(&definition).await? {
                tracing::info!(achievement = entry.name, "Seeded baseline achievement");
                inserted.push(definition);
            }
        }

        Ok(inserted)
    }

    /// All definitions, with any missing baseline entries filled in first.
    pub async fn load_repaired(&self) -> Result<Vec<AchievementDefinition>> {
        let mut definitions = self.store.list_definitions().await?;
        let inserted = self.ensure_baseline(&definitions).await?;
        if !inserted.is_empty() {
            // Re-read so definitions inserted concurrently by others are seen too.
            definitions = self.store.list_definitions().await?;
        }
        Ok(definitions)
    }

    pub async fn list_definitions(&self) -> Result<Vec<AchievementDefinition>> {
        self.store.list_definitions().await
    }

    pub async fn get_definition(&self, name: &str) -> Result<AchievementDefinition> {
        self.store
            .get_definition(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Achievement {} not found", name)))
    }

    /// Create a new global definition. Names are unique across the catalog.
    pub async fn create_definition(&self, new: NewDefinition) -> Result<AchievementDefinition> {
        new.validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let name = new.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("name must not be blank".to_string()));
        }

        let requirement = new
            .requirement
            .parse()
            .map_err(|e| AppError::BadRequest(format!("invalid requirement: {}", e)))?;
        if requirement.threshold < 0.0 {
            return Err(AppError::BadRequest(
                "requirement value must not be negative".to_string(),
            ));
        }

        let definition = AchievementDefinition {
            id: definition_document_id(name),
            name: name.to_string(),
            description: new.description,
            category: new.category,
            points: new.points,
            requirement: new.requirement,
            badge: new.badge,
            icon: new.icon,
            user_id: None,
            created_at: Utc::now(),
        };

        if !self.store.insert_definition_if_absent(&definition).await? {
            return Err(AppError::Conflict(format!(
                "Achievement {} already exists",
                definition.name
            )));
        }

        tracing::info!(achievement = %definition.name, "Created achievement definition");
        Ok(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn catalog() -> (Catalog, MemoryDb) {
        let db = MemoryDb::new();
        (Catalog::new(Arc::new(db.clone())), db)
    }

    fn new_definition(name: &str) -> NewDefinition {
        NewDefinition {
            name: name.to_string(),
            description: "Custom".to_string(),
            category: AchievementCategory::WorkoutCount,
            points: 15,
            requirement: Requirement::new(Metric::TotalWorkouts, 2.0),
            badge: None,
            icon: None,
        }
    }

    #[test]
    fn test_baseline_names_are_unique_and_valid() {
        let names: HashSet<&str> = baseline_names().collect();
        assert_eq!(names.len(), BASELINE.len());

        for entry in BASELINE {
            assert!(entry.points > 0);
            assert!(entry.to_definition().requirement.parse().is_ok());
        }
    }

    #[tokio::test]
    async fn test_ensure_baseline_fills_gaps_only() {
        let (catalog, _db) = catalog();

        let first = catalog.ensure_baseline(&[]).await.unwrap();
        assert_eq!(first.len(), BASELINE.len());

        let existing = catalog.list_definitions().await.unwrap();
        let second = catalog.ensure_baseline(&existing).await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_baseline_with_stale_view_does_not_duplicate() {
        let (catalog, _db) = catalog();

        catalog.ensure_baseline(&[]).await.unwrap();
        // A caller that read the catalog before the seed ran.
        let again = catalog.ensure_baseline(&[]).await.unwrap();

        assert!(again.is_empty());
        assert_eq!(catalog.list_definitions().await.unwrap().len(), BASELINE.len());
    }

    #[tokio::test]
    async fn test_ensure_baseline_never_overwrites() {
        let (catalog, _db) = catalog();
        let mut custom = new_definition("First Step");
        custom.points = 999;
        catalog.create_definition(custom).await.unwrap();

        catalog.load_repaired().await.unwrap();

        let first_step = catalog.get_definition("First Step").await.unwrap();
        assert_eq!(first_step.points, 999);
    }

    #[tokio::test]
    async fn test_create_definition_rejects_duplicate_name() {
        let (catalog, _db) = catalog();
        catalog.create_definition(new_definition("Custom")).await.unwrap();

        let err = catalog
            .create_definition(new_definition("Custom"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_definition_validates_input() {
        let (catalog, _db) = catalog();

        let mut zero_points = new_definition("Zero");
        zero_points.points = 0;
        assert!(matches!(
            catalog.create_definition(zero_points).await,
            Err(AppError::BadRequest(_))
        ));

        let mut bad_metric = new_definition("Bad");
        bad_metric.requirement.metric = "calories".to_string();
        assert!(matches!(
            catalog.create_definition(bad_metric).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_get_definition_not_found() {
        let (catalog, _db) = catalog();
        assert!(matches!(
            catalog.get_definition("Nope").await,
            Err(AppError::NotFound(_))
        ));
    }
}
