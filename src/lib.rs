// SPDX-License-Identifier: MIT

//! TeamPulse: gamification and engagement engine for team fitness
//!
//! This crate provides the backend API for team challenges, peer
//! recognition, daily quests and performance metrics.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::NotifierService;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub notifier: Arc<NotifierService>,
}
