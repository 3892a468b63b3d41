//! Churn Scoring API Library
//!
//! This library provides the core functionality for the churn scoring service:
//! loading the offline-trained scoring artifact, validating and encoding
//! customer records, producing churn predictions, and serving them over HTTP.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core scoring logic.
//! - `app`: Router construction and middleware.
//! - `artifact`: Scoring artifact loading and validation.
//! - `client`: Client for a running scoring API.
//! - `config`: Configuration management.
//! - `encoding`: Categorical, currency and feature-column tables.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `integrity`: Artifact checksum verification.
//! - `models`: Request and response models.
//! - `openapi`: OpenAPI document and Swagger UI.
//! - `scoring`: The inference core.

pub mod api;
pub mod core;

pub mod app;
pub mod artifact;
pub mod client;
pub mod config;
pub mod encoding;
pub mod errors;
pub mod handlers;
pub mod integrity;
pub mod models;
pub mod openapi;
pub mod scoring;
