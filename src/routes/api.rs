// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Achievement, progression and leaderboard API routes.

use crate::db::UserStore;
use crate::error::{AwardError, Result};
use crate::models::{AchievementDefinition, AwardedAchievement, User};
use crate::services::leaderboard::DEFAULT_LEADERBOARD_SIZE;
use crate::services::{
    AchievementProgress, LeaderboardEntry, LevelProgress, NewDefinition, UserStatsSummary,
};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/achievements",
            get(list_definitions).post(create_definition),
        )
        .route("/api/achievements/{name}", get(get_definition))
        .route(
            "/api/users/{user_id}/achievements",
            get(list_user_achievements),
        )
        .route(
            "/api/users/{user_id}/achievements/check",
            post(check_achievements),
        )
        .route(
            "/api/users/{user_id}/achievements/progress",
            get(achievement_progress),
        )
        .route("/api/users/{user_id}/stats", get(user_stats))
        .route("/api/users/{user_id}/recalculate", post(recalculate))
        .route("/api/leaderboard", get(leaderboard))
}

// ─── Catalog ─────────────────────────────────────────────────

async fn list_definitions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AchievementDefinition>>> {
    Ok(Json(state.catalog.list_definitions().await?))
}

async fn get_definition(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<AchievementDefinition>> {
    Ok(Json(state.catalog.get_definition(&name).await?))
}

/// Admin: add a definition to the global catalog.
async fn create_definition(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewDefinition>,
) -> Result<(StatusCode, Json<AchievementDefinition>)> {
    let definition = state.catalog.create_definition(body).await?;
    Ok((StatusCode::CREATED, Json(definition)))
}

// ─── Awards ──────────────────────────────────────────────────

async fn list_user_achievements(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<AwardedAchievement>>> {
    Ok(Json(state.awards.list_user_achievements(&user_id).await?))
}

/// Result of an award pass.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CheckAchievementsResponse {
    pub awarded: Vec<AwardedAchievement>,
    pub progression: LevelProgress,
}

/// Evaluate the user's stats and grant anything newly earned.
///
/// If the pass fails part way, the error body lists the awards that were
/// committed before the failure.
async fn check_achievements(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> std::result::Result<Json<CheckAchievementsResponse>, AwardError> {
    tracing::debug!(user_id = %user_id, "Checking achievements");

    let awarded = state.awards.check_and_award(&user_id).await?;
    let user = state.store.load_user(&user_id).await?;

    Ok(Json(CheckAchievementsResponse {
        awarded,
        progression: LevelProgress::new(user.map(|u| u.points).unwrap_or(0)),
    }))
}

async fn achievement_progress(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<AchievementProgress>>> {
    Ok(Json(state.awards.achievements_with_progress(&user_id).await?))
}

async fn user_stats(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserStatsSummary>> {
    Ok(Json(state.awards.user_stats(&user_id).await?))
}

/// Rebuild points and level from the user's awards.
async fn recalculate(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<User>> {
    tracing::info!(user_id = %user_id, "Recalculating progression from awards");
    Ok(Json(state.awards.recalculate(&user_id).await?))
}

// ─── Leaderboard ─────────────────────────────────────────────

#[derive(Deserialize)]
struct LeaderboardQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LEADERBOARD_SIZE
}

async fn leaderboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>> {
    let limit = params.limit.clamp(1, state.config.leaderboard_max);
    Ok(Json(state.leaderboard.top_n(limit).await?))
}
