//! Scoring API Library
//!
//! Turns an untrusted JSON payload into a strongly-checked command (compute
//! an online score or fetch client interests), enforcing authentication and
//! per-field validation before any business logic runs.
//!
//! # Modules
//!
//! - `api`: HTTP-layer namespace.
//! - `core`: Validation and dispatch namespace.
//! - `auth`: Credential digest check.
//! - `clock`: Local wall time source.
//! - `config`: Configuration management.
//! - `dispatcher`: Authenticated method dispatch.
//! - `errors`: Error handling types.
//! - `fields`: Field type system.
//! - `handlers`: HTTP request handlers and router.
//! - `model`: Model construction engine.
//! - `obs`: Logging setup.
//! - `schemas`: Request schemas.
//! - `scoring`: Score and interests collaborator.

pub mod api;
pub mod core;
pub mod obs;

pub mod auth;
pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod fields;
pub mod handlers;
pub mod model;
pub mod schemas;
pub mod scoring;
