//! Forced service checks
//!
//! Re-checks services on demand and waits for them to settle:
//!
//! - [`IcingaClient::check_service`](crate::client::IcingaClient::check_service)
//!   forces one check and polls until OK, retrying with fresh windows
//! - [`IcingaClient::check_all_services`](crate::client::IcingaClient::check_all_services)
//!   does the same for every active, unhealthy service of a host

mod service;
mod types;

pub use service::POLL_INTERVAL;
pub use types::*;
