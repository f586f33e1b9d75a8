//! Icinga API client
//!
//! Builds the object queries and actions the orchestrators need on top of a
//! [`Transport`]. User supplied names always travel in `filter_vars`, never
//! spliced into the filter expression.

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use super::error::{IcingaError, IcingaResult};
use super::transport::{HttpTransport, Transport, Verb};
use super::types::*;
use crate::status::Health;

const OBJECTS_SERVICES: &str = "/v1/objects/services";
const OBJECTS_HOSTS: &str = "/v1/objects/hosts";
const OBJECTS_DOWNTIMES: &str = "/v1/objects/downtimes";
const ACTION_RESCHEDULE_CHECK: &str = "/v1/actions/reschedule-check";
const ACTION_SCHEDULE_DOWNTIME: &str = "/v1/actions/schedule-downtime";
const ACTION_REMOVE_DOWNTIME: &str = "/v1/actions/remove-downtime";

/// Client session for one Icinga server
///
/// Holds no mutable state; every query returns what it observed.
///
/// # Example
/// ```no_run
/// use steward::client::IcingaClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = IcingaClient::new("https://icinga:5665", "root", "secret", true)?;
/// let health = client.get_service_status("web-01", "http").await?;
/// println!("http is {health}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct IcingaClient<T = HttpTransport> {
    transport: T,
}

impl IcingaClient<HttpTransport> {
    /// Create a client for the given API URL
    ///
    /// The URL must use `https`; a trailing slash is stripped.
    pub fn new(
        api_url: &str,
        username: &str,
        password: &str,
        verify_certs: bool,
    ) -> IcingaResult<Self> {
        let url = Url::parse(api_url)?;
        if url.scheme() != "https" {
            return Err(IcingaError::InvalidUrl(format!(
                "{api_url}: server must be https://<servername>"
            )));
        }

        let transport = HttpTransport::new(api_url, username, password, verify_certs)?;
        Ok(Self::with_transport(transport))
    }
}

impl<T: Transport> IcingaClient<T> {
    /// Create a client over a custom transport
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    /// Get the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn query<A: DeserializeOwned>(
        &self,
        path: &str,
        body: Value,
    ) -> IcingaResult<Vec<ObjectResult<A>>> {
        let response = self.transport.send(path, Verb::Get, &body).await?;
        let parsed: ApiResponse<ObjectResult<A>> = serde_json::from_value(response)?;
        Ok(parsed.results)
    }

    async fn action(&self, path: &str, body: Value) -> IcingaResult<Vec<ActionResult>> {
        let response = self.transport.send(path, Verb::Post, &body).await?;
        let parsed: ApiResponse<ActionResult> = serde_json::from_value(response)?;
        Ok(parsed.results)
    }

    // =========================================================================
    // Service queries
    // =========================================================================

    /// Get the last known health of one service
    pub async fn get_service_status(&self, host: &str, service: &str) -> IcingaResult<Health> {
        let results: Vec<ObjectResult<ServiceAttrs>> = self
            .query(
                OBJECTS_SERVICES,
                json!({
                    "type": "Service",
                    "filter": "host.name==host_name && service.name==service_name",
                    "filter_vars": {"host_name": host, "service_name": service},
                    "attrs": ["name", "last_state"],
                }),
            )
            .await?;

        let service_obj = results.into_iter().next().ok_or_else(|| {
            IcingaError::not_found_with(format!(
                "Unable to find the service {service} on host {host}"
            ))
        })?;

        debug!(
            host = %host,
            service = %service,
            status = %service_obj.attrs.last_state,
            "Polled service status"
        );
        Ok(service_obj.attrs.last_state)
    }

    /// Get name, activity and last state of every service on a host
    pub async fn service_states(&self, host: &str) -> IcingaResult<Vec<ServiceAttrs>> {
        let results: Vec<ObjectResult<ServiceAttrs>> = self
            .query(
                OBJECTS_SERVICES,
                json!({
                    "type": "Service",
                    "filter": "host.name==host_name",
                    "filter_vars": {"host_name": host},
                    "attrs": ["name", "host_name", "active", "last_state", "state"],
                }),
            )
            .await?;

        Ok(results.into_iter().map(|r| r.attrs).collect())
    }

    /// List the services of a host whose name matches a glob pattern
    ///
    /// `*` matches every service.
    pub async fn list_services(&self, host: &str, pattern: &str) -> IcingaResult<Vec<String>> {
        let results: Vec<ObjectResult<ServiceAttrs>> = self
            .query(
                OBJECTS_SERVICES,
                json!({
                    "type": "Service",
                    "filter": "host.name==host_name && match(pattern, service.name)",
                    "filter_vars": {"host_name": host, "pattern": pattern},
                    "attrs": ["name"],
                }),
            )
            .await?;

        Ok(results.into_iter().map(|r| r.attrs.name).collect())
    }

    /// List the hosts that are members of a host group
    pub async fn list_hosts_by_group(&self, group: &str) -> IcingaResult<Vec<String>> {
        let results: Vec<ObjectResult<HostAttrs>> = self
            .query(
                OBJECTS_HOSTS,
                json!({
                    "type": "Host",
                    "filter": "group in host.groups",
                    "filter_vars": {"group": group},
                    "attrs": ["name"],
                }),
            )
            .await?;

        Ok(results.into_iter().map(|r| r.attrs.name).collect())
    }

    // =========================================================================
    // Host queries
    // =========================================================================

    /// Get the aggregate state of a host
    pub async fn get_host_status(&self, host: &str) -> IcingaResult<HostStatus> {
        let results: Vec<ObjectResult<HostAttrs>> = self
            .query(
                OBJECTS_HOSTS,
                json!({
                    "type": "Host",
                    "filter": "host.name==host_name",
                    "filter_vars": {"host_name": host},
                    "attrs": ["name", "state", "downtime_depth", "acknowledgement"],
                }),
            )
            .await?;

        let host_obj = results
            .into_iter()
            .next()
            .ok_or_else(|| IcingaError::not_found_with(format!("Unable to find the host {host}")))?;

        Ok(HostStatus::from_attrs(host, host_obj.attrs))
    }

    /// List the downtimes currently registered for a host and its services
    pub async fn downtimes(&self, host: &str) -> IcingaResult<Vec<Downtime>> {
        let results: Vec<ObjectResult<DowntimeAttrs>> = self
            .query(
                OBJECTS_DOWNTIMES,
                json!({
                    "type": "Downtime",
                    "filter": "host.name==host_name",
                    "filter_vars": {"host_name": host},
                }),
            )
            .await?;

        Ok(results
            .into_iter()
            .map(|r| Downtime {
                name: r.name,
                attrs: r.attrs,
            })
            .collect())
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Force an immediate check of a service
    ///
    /// Returns the action status reported by the server.
    pub async fn reschedule_check(&self, host: &str, service: &str) -> IcingaResult<String> {
        let results = self
            .action(
                ACTION_RESCHEDULE_CHECK,
                json!({
                    "type": "Service",
                    "filter": "host.name==host_name && service.name==service_name",
                    "filter_vars": {"host_name": host, "service_name": service},
                    "force": true,
                }),
            )
            .await?;

        let result = results.into_iter().next().ok_or_else(|| {
            IcingaError::not_found_with(format!(
                "Unable to find the service {service} on host {host}"
            ))
        })?;
        Ok(result.status)
    }

    /// Schedule a downtime
    pub async fn schedule_downtime(
        &self,
        request: &DowntimeRequest,
    ) -> IcingaResult<Vec<ActionResult>> {
        self.action(ACTION_SCHEDULE_DOWNTIME, serde_json::to_value(request)?)
            .await
    }

    /// Remove one downtime by name
    ///
    /// Returns the action status, empty if the server reported no result.
    pub async fn remove_downtime(&self, name: &str) -> IcingaResult<String> {
        let results = self
            .action(
                ACTION_REMOVE_DOWNTIME,
                json!({
                    "type": "Downtime",
                    "downtime": name,
                }),
            )
            .await?;

        Ok(results
            .into_iter()
            .next()
            .map(|r| r.status)
            .unwrap_or_default())
    }
}

/// Names in `requested` that are absent from `actual`, in `requested` order
pub fn diff_missing(actual: &[String], requested: &[String]) -> Vec<String> {
    requested
        .iter()
        .filter(|name| !actual.contains(name))
        .cloned()
        .collect()
}
