//! SMS spam classification gateway.
//!
//! Serves a pre-trained binary text classifier (spam/ham) over a synchronous
//! HTTP API, with one-shot model resolution at startup and built-in request
//! observability.
//!
//! # Request flow
//!
//! ```text
//! POST /predict {"sms": "..."}
//!      |
//!      v
//! metrics::begin_request      in-flight gauge up, latency clock started
//! features::prepare           text -> fixed-width feature vector
//! inference::classify         read-only walk of the shared model handle
//!      |
//!      v
//! {"result": "spam"|"ham", "classifier": "decision tree", "sms": "..."}
//! ```
//!
//! The model artifact is resolved exactly once at startup: an existing local
//! copy is preferred, otherwise it is downloaded from `MODEL_URL`, otherwise
//! the service stays up but unhealthy. `/health` reflects handle presence and
//! nothing else.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`features`]: Deterministic text featurization
//! - [`model`]: Artifact acquisition and the decision-tree classifier
//! - [`inference`]: Synchronous classification over the shared handle
//! - [`metrics`]: Request-path Prometheus metrics
//! - [`api`]: HTTP API (predict, health, metrics exposition)
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod features;
pub mod inference;
pub mod metrics;
pub mod model;
pub mod utils;

pub use config::Config;
pub use error::{Result, ServiceError};
