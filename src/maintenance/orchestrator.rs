//! Scheduling and clearing downtimes
//!
//! Enabling maintenance runs in a fixed order so that a rejected request
//! leaves the server untouched:
//!
//! 1. validate the duration
//! 2. optional pre-check of every unhealthy service on the host
//! 3. resolve the service scope against the live inventory
//! 4. create the host downtime, then one downtime per resolved service

use tracing::{debug, info, warn};

use super::scope::{ServicePlan, ServiceScope};
use super::types::{DowntimeSpec, MaintenanceResult, PreCheck};
use crate::checks::{CheckOptions, CheckSummary};
use crate::client::{
    DowntimeRequest, DowntimeWindow, IcingaClient, IcingaError, IcingaResult, Transport,
    diff_missing,
};

impl<T: Transport> IcingaClient<T> {
    /// Schedule a downtime on exactly one service of a host
    ///
    /// With `precheck`, the service is force-checked first and an unhealthy
    /// service aborts with [`IcingaError::ServiceFailed`].
    pub async fn set_service_maintenance(
        &self,
        host: &str,
        service: &str,
        downtime: &DowntimeSpec,
        precheck: Option<&CheckOptions>,
    ) -> IcingaResult<String> {
        downtime.validate()?;

        if let Some(opts) = precheck {
            self.check_service(host, service, opts).await?.into_result()?;
        }

        self.schedule_service_downtime(host, service, downtime.window()?, downtime)
            .await
    }

    async fn schedule_service_downtime(
        &self,
        host: &str,
        service: &str,
        window: DowntimeWindow,
        downtime: &DowntimeSpec,
    ) -> IcingaResult<String> {
        let request =
            DowntimeRequest::service(host, service, window, &downtime.author, &downtime.comment);
        let result = self
            .schedule_downtime(&request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                IcingaError::not_found_with(format!(
                    "Unable to find the service {service} on host {host}"
                ))
            })?;

        debug!(host = %host, service = %service, status = %result.status, "Service downtime scheduled");
        Ok(result.status)
    }

    /// Put a host, and the services selected by `scope`, into maintenance
    pub async fn set_maintenance(
        &self,
        host: &str,
        scope: &ServiceScope,
        downtime: &DowntimeSpec,
        precheck: Option<&PreCheck>,
    ) -> IcingaResult<MaintenanceResult> {
        downtime.validate()?;

        info!(
            host = %host,
            scope = %scope,
            duration_secs = downtime.duration_secs(),
            "Enabling maintenance"
        );

        if let Some(pre) = precheck {
            self.run_precheck(host, pre).await?;
        }

        let plan = self.resolve_scope(host, scope).await?;
        let window = downtime.window()?;
        let mut result = MaintenanceResult::new(host);

        let request = DowntimeRequest::host(
            host,
            plan.is_all_services(),
            window,
            &downtime.author,
            &downtime.comment,
        );
        let host_result = self
            .schedule_downtime(&request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| IcingaError::not_found_with(format!("Unable to find the host {host}")))?;

        result.changes += 1;
        if let Some(service_downtimes) = &host_result.service_downtimes {
            result.changes += service_downtimes.len();
        }
        result.statuses.push(host_result.status);

        match plan {
            ServicePlan::AllServices => {
                result.services = self.list_services(host, "*").await?;
            }
            ServicePlan::Services(names) => {
                for name in names {
                    let status = self
                        .schedule_service_downtime(host, &name, window, downtime)
                        .await?;
                    result.changes += 1;
                    result.statuses.push(status);
                    result.services.push(name);
                }
            }
        }

        info!(
            host = %host,
            changes = result.changes,
            services = result.services.len(),
            "Maintenance enabled"
        );
        Ok(result)
    }

    /// Remove every downtime registered for a host
    ///
    /// Clearing is always host-wide; `scope` does not narrow it.
    pub async fn clear_maintenance(
        &self,
        host: &str,
        scope: &ServiceScope,
        precheck: Option<&PreCheck>,
    ) -> IcingaResult<MaintenanceResult> {
        info!(host = %host, "Disabling maintenance");

        if let Some(pre) = precheck {
            self.run_precheck(host, pre).await?;
        }

        if !scope.is_all() {
            debug!(host = %host, scope = %scope, "Clearing every downtime of the host regardless of scope");
        }

        let downtimes = self.downtimes(host).await?;
        let mut result = MaintenanceResult::new(host);

        for downtime in downtimes {
            let status = self.remove_downtime(&downtime.name).await?;
            debug!(host = %host, downtime = %downtime.name, status = %status, "Downtime removed");

            result.changes += 1;
            if !status.is_empty() {
                result.statuses.push(status);
            }
            let service = downtime.attrs.service_name;
            if !service.is_empty() && !result.services.contains(&service) {
                result.services.push(service);
            }
        }

        info!(host = %host, changes = result.changes, "Maintenance disabled");
        Ok(result)
    }

    /// Resolve a scope into the concrete services to put into maintenance
    ///
    /// Explicit names are validated against the host's inventory; a single
    /// unknown name fails the whole request.
    pub async fn resolve_scope(
        &self,
        host: &str,
        scope: &ServiceScope,
    ) -> IcingaResult<ServicePlan> {
        match scope {
            ServiceScope::All => Ok(ServicePlan::AllServices),
            ServiceScope::Pattern(pattern) => {
                let services = self.list_services(host, pattern).await?;
                debug!(host = %host, pattern = %pattern, matched = services.len(), "Resolved service pattern");
                Ok(ServicePlan::Services(services))
            }
            ServiceScope::Explicit(names) if names.is_empty() => Ok(ServicePlan::Services(Vec::new())),
            ServiceScope::Explicit(names) => {
                let actual = self.list_services(host, "*").await?;
                let missing = diff_missing(&actual, names);
                if !missing.is_empty() {
                    return Err(IcingaError::not_found_with(format!(
                        "Unable to find service(s) {} on host {host}, valid services are: {}",
                        missing.join(", "),
                        actual.join(", ")
                    )));
                }

                let mut unique: Vec<String> = Vec::with_capacity(names.len());
                for name in names {
                    if !unique.contains(name) {
                        unique.push(name.clone());
                    }
                }
                Ok(ServicePlan::Services(unique))
            }
        }
    }

    async fn run_precheck(&self, host: &str, pre: &PreCheck) -> IcingaResult<CheckSummary> {
        let summary = self.check_all_services(host, &pre.check).await?;

        if !summary.all_passed() {
            if pre.stop_on_failed_service {
                return summary.into_result();
            }
            warn!(
                host = %host,
                failed = ?summary.failed,
                "Services failed pre-check, continuing"
            );
        }
        Ok(summary)
    }
}
