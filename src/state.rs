//! Host and service state reports

use serde::Serialize;
use tracing::debug;

use crate::client::{HostStatus, IcingaClient, IcingaResult, Transport};
use crate::maintenance::{ServicePlan, ServiceScope};
use crate::status::Health;

/// Last known health of one service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceState {
    pub name: String,
    pub status: Health,
}

/// State of a host and the services selected for the report
#[derive(Debug, Clone, Serialize)]
pub struct HostState {
    #[serde(flatten)]
    pub host: HostStatus,
    pub services: Vec<ServiceState>,
}

impl<T: Transport> IcingaClient<T> {
    /// Report a host's state and the health of the services in `scope`
    ///
    /// Scopes resolve as for maintenance: explicit names must all exist.
    pub async fn host_state(&self, host: &str, scope: &ServiceScope) -> IcingaResult<HostState> {
        let status = self.get_host_status(host).await?;

        let names = match self.resolve_scope(host, scope).await? {
            ServicePlan::AllServices => self.list_services(host, "*").await?,
            ServicePlan::Services(names) => names,
        };

        let mut services = Vec::with_capacity(names.len());
        for name in names {
            let health = self.get_service_status(host, &name).await?;
            services.push(ServiceState {
                name,
                status: health,
            });
        }

        debug!(host = %host, services = services.len(), "Collected host state");
        Ok(HostState {
            host: status,
            services,
        })
    }
}
