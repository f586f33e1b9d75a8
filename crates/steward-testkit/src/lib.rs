//! Steward Test Kit
//!
//! Test infrastructure for exercising steward without an Icinga server.
//!
//! This crate provides:
//! - An in-memory Icinga API implementing [`steward::client::Transport`]
//! - Builders for hosts, services and their health over time
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use steward::status::Health;
//! use steward_testkit::{MockHost, MockIcinga, MockService};
//!
//! let (server, client) = MockIcinga::new()
//!     .with_host(
//!         MockHost::new("db-01").with_service(
//!             MockService::new("postgres", Health::Critical)
//!                 .recovering_after(Duration::from_secs(5)),
//!         ),
//!     )
//!     .into_client();
//!
//! assert!(server.requests().is_empty());
//! # let _ = client;
//! ```

pub mod mock;

// Re-exports for convenience
pub use mock::{MockDowntime, MockHost, MockIcinga, MockService, RecordedRequest};
