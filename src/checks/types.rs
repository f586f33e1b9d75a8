//! Check options and outcomes
//!
//! A forced check either ends healthy, ends failed after every retry window
//! elapsed, or was only scheduled because the caller did not want to wait.
//! Failure is a value here; callers that treat it as fatal use
//! [`CheckOutcome::into_result`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::client::{IcingaError, IcingaResult};
use crate::status::Health;

/// Polling budget for a forced check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOptions {
    /// Length of one polling window, in whole seconds. Zero schedules the
    /// check without waiting for its result.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Additional check+poll windows after the first one fails
    #[serde(default)]
    pub retries: u32,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retries: 0,
        }
    }
}

impl CheckOptions {
    pub fn new(timeout: Duration, retries: u32) -> Self {
        Self { timeout, retries }
    }

    /// Schedule checks without polling
    pub fn fire_and_forget() -> Self {
        Self::new(Duration::ZERO, 0)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Number of one-second waits in a polling window
    ///
    /// Fractional seconds round up, so only a zero timeout skips polling.
    pub fn poll_ticks(&self) -> u64 {
        whole_secs(self.timeout)
    }

    /// Total check+poll windows before giving up
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

fn whole_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

/// Result of forcing a check on one service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// Check was requested without waiting (timeout of zero)
    Scheduled { service: String, status: String },

    /// Service reported OK within a polling window
    Healthy { service: String, attempts: u32 },

    /// Every window elapsed without the service reporting OK
    Failed {
        service: String,
        last_status: Health,
        #[serde(with = "humantime_serde")]
        timeout: Duration,
        attempts: u32,
    },
}

impl CheckOutcome {
    pub fn service(&self) -> &str {
        match self {
            CheckOutcome::Scheduled { service, .. }
            | CheckOutcome::Healthy { service, .. }
            | CheckOutcome::Failed { service, .. } => service,
        }
    }

    /// Scheduled checks count as passed; nothing was observed to fail
    pub fn is_healthy(&self) -> bool {
        !matches!(self, CheckOutcome::Failed { .. })
    }

    /// Health observed by the last poll, if any poll happened
    pub fn last_status(&self) -> Option<Health> {
        match self {
            CheckOutcome::Scheduled { .. } => None,
            CheckOutcome::Healthy { .. } => Some(Health::Ok),
            CheckOutcome::Failed { last_status, .. } => Some(*last_status),
        }
    }

    /// Human-readable summary
    pub fn message(&self) -> String {
        match self {
            CheckOutcome::Scheduled { status, .. } => status.clone(),
            CheckOutcome::Healthy { .. } => "Service is up".to_string(),
            CheckOutcome::Failed {
                service,
                last_status,
                timeout,
                ..
            } => format!(
                "Service {service} state is {last_status} after timeout of {} seconds",
                whole_secs(*timeout)
            ),
        }
    }

    /// Turn a failed outcome into [`IcingaError::ServiceFailed`]
    pub fn into_result(self) -> IcingaResult<Self> {
        if self.is_healthy() {
            Ok(self)
        } else {
            Err(IcingaError::service_failed_with(self.message()))
        }
    }
}

/// Outcome of checking every unhealthy service of a host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub host: String,
    /// Services that reached OK (or were scheduled without waiting)
    pub succeeded: Vec<String>,
    /// Services still not OK after every window
    pub failed: Vec<String>,
}

impl CheckSummary {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: &CheckOutcome) {
        let name = outcome.service().to_string();
        if outcome.is_healthy() {
            self.succeeded.push(name);
        } else {
            self.failed.push(name);
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed.is_empty()
    }

    /// Turn a summary with failures into [`IcingaError::ServiceFailed`]
    /// listing the failed services
    pub fn into_result(self) -> IcingaResult<Self> {
        if self.all_passed() {
            Ok(self)
        } else {
            Err(IcingaError::service_failed_with(format!(
                "One or more services are down on host {}: {}",
                self.host,
                self.failed.join(", ")
            )))
        }
    }
}
