//! Revana Core - Foundation crate for the Revana review engine
//!
//! This crate provides shared functionality used by the analyzer drivers and
//! the analysis orchestrator:
//!
//! # Modules
//!
//! - [`config`] — Strongly-typed configuration with TOML and environment variable support
//! - [`domain`] — The normalized issue model shared across the engine
//! - [`logging`] — Structured logging with tracing
//!
//! # Configuration
//!
//! Load configuration from files and environment:
//!
//! ```rust,ignore
//! use revana_core::Config;
//!
//! let config = Config::load()?;
//! ```
//!
//! Environment variables use the `REVANA__` prefix with double underscore separators:
//!
//! ```bash
//! REVANA__ANALYSIS__MAX_CONCURRENT_BATCHES=3
//! REVANA__DRIVERS__BANDIT__TIMEOUT_SECS=20
//! ```
//!
//! # Logging
//!
//! Initialize structured logging:
//!
//! ```rust,ignore
//! use revana_core::init_tracing;
//!
//! init_tracing(&config.logging)?;
//! ```

pub mod config;
pub mod domain;
pub mod logging;

pub use config::Config;
pub use logging::init_tracing;
