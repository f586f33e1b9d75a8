//! Configuration parsing
//!
//! Handles parsing of the steward configuration file.
//!
//! ## Configuration Format
//!
//! ```yaml
//! server:
//!   url: https://icinga.example.com:5665
//!   username: steward
//!   verify_certs: true
//!
//! check:
//!   timeout: 30s
//!   retries: 1
//!
//! maintenance:
//!   author: steward
//!   comment: Scheduled maintenance
//! ```
//!
//! The password is normally left out of the file and passed through the
//! `ICINGA_PASSWORD` environment variable.

mod server;

pub use server::{Config, ConfigError, MaintenanceDefaults, ServerConfig};
