// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Typing-Tracker: score typing practice and track login streaks
//!
//! This crate provides the scoring core (results, practice sessions, login
//! statistics), a signed-token service, and the HTTP API built on top of them.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::MemoryDb;
use services::TokenService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: MemoryDb,
    pub token_service: TokenService,
}

impl AppState {
    pub fn new(config: Config, db: MemoryDb) -> Self {
        let token_service = TokenService::new(&config);
        Self {
            config,
            db,
            token_service,
        }
    }
}
