// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Trip Planner - Trip Budget & Expense Service
//!
//! Users plan trips with budgets and visibility settings and track per-trip
//! expenses. Identity and document storage are collaborators behind traits.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Bearer session extractor and federated ID token verification
//! - `budget` - Amount coercion and budget aggregation
//! - `controller` - Trip and expense boards that run user intents
//! - `identity` - Identity provider, session manager, profile cache
//! - `storage` - Document storage (JSON files or in memory)
//! - `visibility` - Public/private filtering per viewer

pub mod api;
pub mod auth;
pub mod budget;
pub mod config;
pub mod controller;
pub mod error;
pub mod identity;
pub mod models;
pub mod state;
pub mod storage;
pub mod validation;
pub mod visibility;
