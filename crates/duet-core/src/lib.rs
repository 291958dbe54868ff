//! Shared ambient plumbing for the duet workspace: env-based configuration
//! loading and tracing initialization.

pub mod config;
pub mod tracing;
