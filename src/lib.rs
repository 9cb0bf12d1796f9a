//! Library crate for bucket-sort-back, exposing modules for binaries and integration tests.

/// Runtime configuration.
pub mod config;
/// Persistence of the session recovery keys.
pub mod dao;
/// Request, response and event payloads.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP route trees.
pub mod routes;
/// Session orchestration and supporting services.
pub mod services;
/// Game state and shared application state.
pub mod state;
