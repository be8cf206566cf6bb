//! Proplift deal-feed API library
//!
//! REST endpoints to list and create property listings, saved searches and
//! inbound leads, each persisted to its own MongoDB collection.
//!
//! # Modules
//!
//! - `config`: Environment configuration.
//! - `db`: Document store trait and MongoDB implementation.
//! - `errors`: Error types and their HTTP mapping.
//! - `extract`: Request extractors that report bad input as 422.
//! - `handlers`: HTTP request handlers.
//! - `memory_store`: In-process document store for tests.
//! - `models`: Entity schemas and API models.
//! - `openapi`: Generated API documentation.
//! - `routes`: Router and middleware.
//! - `telemetry`: Logging setup.
//! - `validation`: Field-level validation primitives.

pub mod config;
pub mod db;
pub mod errors;
pub mod extract;
pub mod handlers;
pub mod memory_store;
pub mod models;
pub mod openapi;
pub mod routes;
pub mod telemetry;
pub mod validation;
