// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Progression engine: achievements, points and levels for workout tracking
//!
//! This crate provides the backend API that evaluates users' completed
//! workouts against the achievement catalog, grants awards exactly once
//! and maintains points, levels and the leaderboard.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::SharedStore;
use services::{AwardLedger, Catalog, Leaderboard, NotificationDispatcher, UserLocks};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: SharedStore,
    pub catalog: Catalog,
    pub awards: AwardLedger,
    pub leaderboard: Leaderboard,
}

impl AppState {
    /// Wire every service onto one store.
    ///
    /// `notifications` is `None` when achievement events should not be sent.
    pub fn new(
        config: Config,
        store: SharedStore,
        notifications: Option<NotificationDispatcher>,
    ) -> Self {
        let locks: UserLocks = std::sync::Arc::new(dashmap::DashMap::new());
        Self {
            catalog: Catalog::new(store.clone()),
            awards: AwardLedger::new(
                store.clone(),
                notifications,
                locks,
                config.streak_lookback_days,
            ),
            leaderboard: Leaderboard::new(store.clone()),
            store,
            config,
        }
    }
}
