//! Common utilities shared across all services.
//!
//! This crate provides:
//! - Unified error handling for HTTP and gRPC
//! - Configuration structures and environment helpers
//! - Timestamp and identifier parsing shared by gRPC servers and clients

pub mod config;
pub mod error;
pub mod wire;

pub use config::*;
pub use error::{AppError, AppResult, OptionExt};
