//! Steel Leads API Library
//!
//! This library provides the core functionality for the Steel Leads API:
//! permit-lead queries against the permit store, lead scoring and
//! geofiltering, contractor pipeline assembly, data models, and HTTP
//! handlers.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core business logic.
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `enrichment`: Lead scoring and geofiltering engine.
//! - `errors`: Error handling types.
//! - `fallback`: Bundled sample permits served when the store is down.
//! - `handlers`: HTTP request handlers.
//! - `models`: Core data models.
//! - `services`: Permit store and contractor store queries.

pub mod api;
pub mod core;

// Re-export primary modules for shared use in tests and other binaries
pub mod config;
pub mod db;
pub mod enrichment;
pub mod errors;
pub mod fallback;
pub mod handlers;
pub mod models;
pub mod services;
