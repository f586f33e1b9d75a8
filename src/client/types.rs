//! Icinga API types
//!
//! Shapes of the `/v1/objects/*` and `/v1/actions/*` responses this client
//! reads. Icinga encodes numbers as floats, so numeric attributes are `f64`
//! unless they are health states.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::client::{IcingaError, IcingaResult};
use crate::status::Health;

/// Latest downtime end accepted; Icinga stores timestamps as doubles
pub const MAX_TIMESTAMP: u64 = 1 << 53;

/// Envelope of every Icinga response
/// Endpoint: all
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub results: Vec<T>,
}

/// One object returned by an object query
/// Endpoint: GET /v1/objects/{services,hosts,downtimes}
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectResult<A> {
    /// Full object name (e.g. `web-01!http` for a service)
    #[serde(default)]
    pub name: String,
    /// Object type as reported by the server
    #[serde(default, rename = "type")]
    pub object_type: Option<String>,
    pub attrs: A,
}

/// Outcome of an action on a single object
/// Endpoint: POST /v1/actions/*
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    #[serde(default)]
    pub code: Option<f64>,
    #[serde(default)]
    pub status: String,
    /// Name of the created object (schedule-downtime)
    #[serde(default)]
    pub name: Option<String>,
    /// Downtimes created for the services of a host (schedule-downtime with
    /// `all_services`)
    #[serde(default)]
    pub service_downtimes: Option<Vec<String>>,
}

fn default_active() -> bool {
    true
}

/// Service attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAttrs {
    /// Short service name (without host prefix)
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub host_name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub last_state: Health,
    #[serde(default)]
    pub state: Health,
}

/// Host attributes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostAttrs {
    #[serde(default)]
    pub name: String,
    /// 0 = UP, 1 = DOWN
    #[serde(default)]
    pub state: f64,
    /// Number of active downtimes covering the host
    #[serde(default)]
    pub downtime_depth: f64,
    /// 0 = none, 1 = normal, 2 = sticky
    #[serde(default)]
    pub acknowledgement: f64,
}

/// Downtime attributes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DowntimeAttrs {
    #[serde(default)]
    pub host_name: String,
    /// Empty for host downtimes
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub start_time: f64,
    #[serde(default)]
    pub end_time: f64,
    #[serde(default)]
    pub duration: f64,
}

/// Active downtime as needed to remove it
#[derive(Debug, Clone, Serialize)]
pub struct Downtime {
    /// Server-side name, required by remove-downtime
    pub name: String,
    pub attrs: DowntimeAttrs,
}

/// Aggregate state of a host
#[derive(Debug, Clone, Serialize)]
pub struct HostStatus {
    pub host: String,
    /// Host state is UP
    pub up: bool,
    /// At least one downtime covers the host
    pub in_maintenance: bool,
    /// A problem acknowledgement is set
    pub acknowledged: bool,
    /// Raw attributes as returned by the server
    pub attrs: HostAttrs,
}

impl HostStatus {
    pub fn from_attrs(host: impl Into<String>, attrs: HostAttrs) -> Self {
        Self {
            host: host.into(),
            up: attrs.state == 0.0,
            in_maintenance: attrs.downtime_depth > 0.0,
            acknowledged: attrs.acknowledgement > 0.0,
            attrs,
        }
    }
}

/// Time span of a downtime in Unix seconds
///
/// The end is always derived from start and duration, so a scheduled window
/// covers exactly the requested number of seconds. Windows ending after
/// [`MAX_TIMESTAMP`] cannot be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DowntimeWindow {
    start: u64,
    duration: u64,
}

impl DowntimeWindow {
    pub fn starting_at(start: u64, duration_secs: u64) -> IcingaResult<Self> {
        match start.checked_add(duration_secs) {
            Some(end) if end <= MAX_TIMESTAMP => Ok(Self {
                start,
                duration: duration_secs,
            }),
            _ => Err(IcingaError::InvalidRequest(format!(
                "A downtime of {duration_secs} seconds starting at {start} ends too late"
            ))),
        }
    }

    /// Window starting at the current wall-clock second
    pub fn starting_now(duration_secs: u64) -> IcingaResult<Self> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self::starting_at(now, duration_secs)
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.start + self.duration
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }
}

/// Body of a schedule-downtime action
/// Endpoint: POST /v1/actions/schedule-downtime
#[derive(Debug, Clone, Serialize)]
pub struct DowntimeRequest {
    #[serde(rename = "type")]
    pub object_type: &'static str,
    pub filter: &'static str,
    pub filter_vars: BTreeMap<&'static str, String>,
    /// Also schedule downtimes for every service of the host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_services: Option<bool>,
    pub start_time: u64,
    pub end_time: u64,
    pub duration: u64,
    pub fixed: bool,
    pub child_hosts: u8,
    pub author: String,
    pub comment: String,
}

impl DowntimeRequest {
    /// Downtime on a host, optionally covering all of its services
    pub fn host(
        host: &str,
        all_services: bool,
        window: DowntimeWindow,
        author: &str,
        comment: &str,
    ) -> Self {
        Self {
            object_type: "Host",
            filter: "host.name==host_name",
            filter_vars: BTreeMap::from([("host_name", host.to_string())]),
            all_services: Some(all_services),
            ..Self::base(window, author, comment)
        }
    }

    /// Downtime on exactly one service of a host
    pub fn service(
        host: &str,
        service: &str,
        window: DowntimeWindow,
        author: &str,
        comment: &str,
    ) -> Self {
        Self {
            object_type: "Service",
            filter: "host.name==host_name && service.name==service_name",
            filter_vars: BTreeMap::from([
                ("host_name", host.to_string()),
                ("service_name", service.to_string()),
            ]),
            all_services: None,
            ..Self::base(window, author, comment)
        }
    }

    fn base(window: DowntimeWindow, author: &str, comment: &str) -> Self {
        Self {
            object_type: "",
            filter: "",
            filter_vars: BTreeMap::new(),
            all_services: None,
            start_time: window.start(),
            end_time: window.end(),
            duration: window.duration(),
            fixed: true,
            child_hosts: 0,
            author: author.to_string(),
            comment: comment.to_string(),
        }
    }
}
