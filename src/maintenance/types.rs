//! Maintenance request and result types

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::checks::CheckOptions;
use crate::client::{DowntimeWindow, IcingaError, IcingaResult, MAX_TIMESTAMP};

/// Author recorded on downtimes when none is given
pub const DEFAULT_AUTHOR: &str = "steward";
/// Comment recorded on downtimes when none is given
pub const DEFAULT_COMMENT: &str = "Downtime";

/// What to record on the downtimes a maintenance operation creates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DowntimeSpec {
    /// Length of the window; whole seconds, must be non-zero
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    pub author: String,
    pub comment: String,
}

impl DowntimeSpec {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            author: DEFAULT_AUTHOR.to_string(),
            comment: DEFAULT_COMMENT.to_string(),
        }
    }

    pub fn from_secs(duration_secs: u64) -> Self {
        Self::new(Duration::from_secs(duration_secs))
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration.as_secs()
    }

    /// Reject windows shorter than one second or ending past
    /// [`MAX_TIMESTAMP`]
    pub fn validate(&self) -> IcingaResult<()> {
        if self.duration_secs() == 0 {
            return Err(IcingaError::InvalidRequest(
                "A duration is required to enable maintenance".to_string(),
            ));
        }
        self.window().map(|_| ())
    }

    /// Window starting now
    pub fn window(&self) -> IcingaResult<DowntimeWindow> {
        DowntimeWindow::starting_now(self.duration_secs())
    }
}

/// Health gate run before touching downtimes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PreCheck {
    /// Budget for each forced service check
    #[serde(flatten)]
    pub check: CheckOptions,
    /// Abort when any service is still unhealthy after its checks
    #[serde(default)]
    pub stop_on_failed_service: bool,
}

impl PreCheck {
    pub fn new(check: CheckOptions) -> Self {
        Self {
            check,
            stop_on_failed_service: false,
        }
    }

    pub fn stop_on_failed_service(mut self, stop: bool) -> Self {
        self.stop_on_failed_service = stop;
        self
    }
}

/// Aggregate outcome of a maintenance operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceResult {
    pub host: String,
    /// Status strings reported by the server, one per action
    pub statuses: Vec<String>,
    /// Number of downtimes created or removed
    pub changes: usize,
    /// Services covered by the operation
    pub services: Vec<String>,
}

impl MaintenanceResult {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    pub fn changed(&self) -> bool {
        self.changes > 0
    }

    /// All status strings joined into one message
    pub fn status(&self) -> String {
        self.statuses.join(", ")
    }
}
