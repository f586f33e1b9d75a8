//! Forced service checks
//!
//! ## State machine
//!
//! ```text
//! ISSUE_CHECK ──timeout 0──▶ Scheduled
//!      │
//!      ▼
//!   POLLING ──OK──▶ Healthy
//!      │
//!  window elapsed
//!      │
//!      ├──attempts left──▶ ISSUE_CHECK (fresh window)
//!      └──exhausted──────▶ Failed
//! ```
//!
//! A window polls at t = 0, 1, ..., timeout seconds, so a service turning OK
//! after k seconds passes the first window iff k <= timeout. Each retry gets
//! a full window of its own.

use std::time::Duration;
use tracing::{debug, info, warn};

use super::types::{CheckOptions, CheckOutcome, CheckSummary};
use crate::client::{IcingaClient, IcingaResult, Transport};
use crate::status::Health;

/// Wait between two status polls
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

impl<T: Transport> IcingaClient<T> {
    /// Force a check of one service and wait for it to report OK
    ///
    /// Transport errors abort immediately; an unhealthy service is reported
    /// as [`CheckOutcome::Failed`].
    pub async fn check_service(
        &self,
        host: &str,
        service: &str,
        opts: &CheckOptions,
    ) -> IcingaResult<CheckOutcome> {
        let ticks = opts.poll_ticks();
        let max_attempts = opts.max_attempts();

        info!(
            host = %host,
            service = %service,
            timeout_secs = ticks,
            retries = opts.retries,
            "Forcing service check"
        );

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let status = self.reschedule_check(host, service).await?;
            debug!(host = %host, service = %service, attempt, status = %status, "Check rescheduled");

            if ticks == 0 {
                return Ok(CheckOutcome::Scheduled {
                    service: service.to_string(),
                    status,
                });
            }

            let last_status = self.poll_until_ok(host, service, ticks).await?;
            if last_status.is_ok() {
                info!(host = %host, service = %service, attempts = attempt, "Service is up");
                return Ok(CheckOutcome::Healthy {
                    service: service.to_string(),
                    attempts: attempt,
                });
            }

            if attempt < max_attempts {
                warn!(
                    host = %host,
                    service = %service,
                    status = %last_status,
                    attempt,
                    max_attempts,
                    "Service not OK after timeout, retrying"
                );
                continue;
            }

            warn!(
                host = %host,
                service = %service,
                status = %last_status,
                attempts = attempt,
                "Service not OK, retries exhausted"
            );
            return Ok(CheckOutcome::Failed {
                service: service.to_string(),
                last_status,
                timeout: opts.timeout,
                attempts: attempt,
            });
        }
    }

    /// Poll the service once per second for `ticks` seconds, stopping early
    /// on OK. Returns the last observed health.
    async fn poll_until_ok(&self, host: &str, service: &str, ticks: u64) -> IcingaResult<Health> {
        let mut last_status = Health::Unknown;
        for tick in 0..=ticks {
            last_status = self.get_service_status(host, service).await?;
            if last_status.is_ok() {
                break;
            }
            if tick < ticks {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }
        Ok(last_status)
    }

    /// Force checks on every active, non-OK service of a host
    ///
    /// Services that are inactive or whose last state is OK get no check and
    /// appear in neither list. Services are handled one after the other.
    pub async fn check_all_services(
        &self,
        host: &str,
        opts: &CheckOptions,
    ) -> IcingaResult<CheckSummary> {
        let services = self.service_states(host).await?;
        let mut summary = CheckSummary::new(host);

        info!(host = %host, services = services.len(), "Checking host services");

        for service in services {
            if !service.active {
                debug!(host = %host, service = %service.name, "Skipping inactive service");
                continue;
            }
            if service.last_state.is_ok() {
                debug!(host = %host, service = %service.name, "Skipping healthy service");
                continue;
            }

            let outcome = self.check_service(host, &service.name, opts).await?;
            summary.record(&outcome);
        }

        info!(
            host = %host,
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            "Host service checks complete"
        );
        Ok(summary)
    }
}
