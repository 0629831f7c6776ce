//! Library exports for the training pipeline, CLI tools, and tests.
/// Artifact pair persistence.
pub mod artifacts;
/// Pipeline configuration.
pub mod config;
/// CSV ingestion and record types.
pub mod dataset;
/// Fitted feature transformer.
pub mod features;
/// Tracing setup for the CLI tools.
pub mod logging;
/// Candidate regression models and metrics.
pub mod models;
/// End-to-end training pipeline.
pub mod pipeline;
/// Seeded train/test splitting.
pub mod split;
/// Trial runner and model selection.
pub mod trial;
