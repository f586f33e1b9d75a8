//! Steward - Icinga maintenance and check driver
//!
//! Drives an Icinga 2 server's REST API to force service re-checks and wait
//! for them to settle, and to schedule or clear maintenance windows
//! (downtimes) on hosts and their services.
//!
//! ## Modules
//!
//! - [`client`] - HTTP client for the Icinga API, service and host queries
//! - [`checks`] - Forced checks with polling and retries
//! - [`maintenance`] - Downtime scheduling and clearing
//! - [`status`] - Service health states
//! - [`state`] - Host and service state reports
//! - [`duration`] - Compact duration strings (`1d2h30m`)
//! - [`config`] - Configuration file parsing
//!
//! ## Example
//!
//! ```no_run
//! use steward::client::IcingaClient;
//! use steward::maintenance::{DowntimeSpec, ServiceScope};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = IcingaClient::new("https://icinga:5665", "root", "secret", true)?;
//! let downtime = DowntimeSpec::from_secs(steward::duration::parse_duration("2h"))
//!     .with_comment("Kernel upgrade");
//! let result = client
//!     .set_maintenance("web-01", &ServiceScope::All, &downtime, None)
//!     .await?;
//! println!("{} changes: {}", result.changes, result.status());
//! # Ok(())
//! # }
//! ```

pub mod checks;
pub mod client;
pub mod config;
pub mod duration;
pub mod maintenance;
pub mod state;
pub mod status;
