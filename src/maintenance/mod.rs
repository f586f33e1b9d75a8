//! Maintenance windows
//!
//! Schedules downtimes on a host and a selection of its services, and clears
//! them again. Both directions can be gated on a pre-check of the host's
//! unhealthy services.
//!
//! ## Service selection
//!
//! | Scope               | Host downtime       | Service downtimes          |
//! |---------------------|---------------------|----------------------------|
//! | `All` (`all`, `*`)  | `all_services=true` | created by the server      |
//! | `Pattern("disk*")`  | `all_services=false`| one per matching service   |
//! | `Explicit([..])`    | `all_services=false`| one per name, all must exist |

mod orchestrator;
mod scope;
mod types;

pub use scope::{ServicePlan, ServiceScope};
pub use types::{DEFAULT_AUTHOR, DEFAULT_COMMENT, DowntimeSpec, MaintenanceResult, PreCheck};
