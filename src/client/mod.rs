//! Icinga API Client
//!
//! Hand-written client for the Icinga 2 REST API (`/v1/objects`,
//! `/v1/actions`).

mod error;
mod icinga;
mod transport;
mod types;

pub use error::{
    DEFAULT_AUTHENTICATION_MESSAGE, DEFAULT_CONNECTION_MESSAGE, DEFAULT_NOT_FOUND_MESSAGE,
    IcingaError, IcingaResult,
};
pub use icinga::{IcingaClient, diff_missing};
pub use transport::{HttpTransport, METHOD_OVERRIDE_HEADER, Transport, Verb};
pub use types::*;
