// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (points and level)
//! - Activities (read-only aggregates over completed workouts)
//! - Achievement definitions (global catalog)
//! - Awarded achievements (per-user ledger)

use async_trait::async_trait;
use chrono::NaiveDate;
use firestore::errors::FirestoreError;
use firestore::FirestoreQueryDirection;
use std::collections::HashSet;

use super::{collections, ActivityStatsProvider, AwardStore, DefinitionStore, UserStore};
use crate::error::AppError;
use crate::models::achievement::definition_document_id;
use crate::models::{AchievementDefinition, ActivityRecord, AwardedAchievement, User};

const COMPLETED_STATUS: &str = "completed";

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Activity Operations ─────────────────────────────────────

    /// Store an activity record.
    ///
    /// Activities are written by the workout tracker; this exists for
    /// imports and integration tests.
    pub async fn set_activity(&self, activity: &ActivityRecord) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ACTIVITIES)
            .document_id(&activity.id)
            .object(activity)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Completed activities for a user, optionally limited to `date >= since`.
    async fn completed_activities(
        &self,
        user_id: &str,
        since: Option<NaiveDate>,
    ) -> Result<Vec<ActivityRecord>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES);

        let user_id = user_id.to_string();
        let query = if let Some(since) = since {
            // Dates serialize as YYYY-MM-DD, so string order is date order.
            let since = since.to_string();
            query.filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("status").eq(COMPLETED_STATUS),
                    q.field("date").greater_than_or_equal(since.clone()),
                ])
            })
        } else {
            query.filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("status").eq(COMPLETED_STATUS),
                ])
            })
        };

        query
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[async_trait]
impl DefinitionStore for FirestoreDb {
    async fn list_definitions(&self) -> Result<Vec<AchievementDefinition>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::DEFINITIONS)
            .order_by([("created_at", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn get_definition(
        &self,
        name: &str,
    ) -> Result<Option<AchievementDefinition>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::DEFINITIONS)
            .obj()
            .one(&definition_document_id(name))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert_definition_if_absent(
        &self,
        definition: &AchievementDefinition,
    ) -> Result<bool, AppError> {
        let result: Result<AchievementDefinition, FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::DEFINITIONS)
            .document_id(definition_document_id(&definition.name))
            .object(definition)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(FirestoreError::DataConflictError(_)) => Ok(false),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }
}

#[async_trait]
impl AwardStore for FirestoreDb {
    async fn list_awards(&self, user_id: &str) -> Result<Vec<AwardedAchievement>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::AWARDS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The document ID is derived from (user, name), so Firestore itself
    /// rejects a second award for the same pair.
    async fn insert_award(&self, award: &AwardedAchievement) -> Result<bool, AppError> {
        let result: Result<AwardedAchievement, FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::AWARDS)
            .document_id(&award.id)
            .object(award)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(FirestoreError::DataConflictError(_)) => {
                tracing::debug!(
                    user_id = %award.user_id,
                    achievement = %award.name,
                    "Award already exists (lost race)"
                );
                Ok(false)
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn delete_award(&self, award: &AwardedAchievement) -> Result<(), AppError> {
        // Document IDs are unique here, so the ID alone names the record.
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::AWARDS)
            .document_id(&award.id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for FirestoreDb {
    async fn load_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn save_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.user_id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn top_users(&self, limit: usize) -> Result<Vec<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .order_by([
                ("points", FirestoreQueryDirection::Descending),
                ("user_id", FirestoreQueryDirection::Ascending),
            ])
            .limit(limit.min(u32::MAX as usize) as u32)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[async_trait]
impl ActivityStatsProvider for FirestoreDb {
    async fn completed_count(&self, user_id: &str) -> Result<u64, AppError> {
        Ok(self.completed_activities(user_id, None).await?.len() as u64)
    }

    async fn total_distance(&self, user_id: &str) -> Result<f64, AppError> {
        Ok(self
            .completed_activities(user_id, None)
            .await?
            .iter()
            .filter_map(|a| a.distance)
            .sum())
    }

    async fn distinct_exercise_ids(&self, user_id: &str) -> Result<HashSet<String>, AppError> {
        Ok(self
            .completed_activities(user_id, None)
            .await?
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
            .completed_activities(user_id, Some(since))
            .await?
            .into_iter()
            .map(|a| a.date)
            .collect())
    }
}
