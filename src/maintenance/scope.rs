//! Service selection for maintenance operations

use serde::{Deserialize, Serialize};

/// Which services of a host a maintenance operation covers
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceScope {
    /// Every service, through the host downtime's `all_services` flag
    #[default]
    All,
    /// Services whose name matches a glob pattern
    Pattern(String),
    /// Exactly these services; every name must exist on the host.
    /// An empty list covers the host alone.
    Explicit(Vec<String>),
}

impl ServiceScope {
    /// Interpret a single service argument: `all` and `*` select every
    /// service, anything else is a glob pattern
    pub fn from_pattern(pattern: &str) -> Self {
        match pattern.trim() {
            "all" | "*" => ServiceScope::All,
            other => ServiceScope::Pattern(other.to_string()),
        }
    }

    pub fn explicit<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ServiceScope::Explicit(names.into_iter().map(Into::into).collect())
    }

    /// The host itself, without any of its services
    pub fn host_only() -> Self {
        ServiceScope::Explicit(Vec::new())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, ServiceScope::All)
    }
}

impl From<&str> for ServiceScope {
    fn from(pattern: &str) -> Self {
        Self::from_pattern(pattern)
    }
}

impl From<Vec<String>> for ServiceScope {
    fn from(names: Vec<String>) -> Self {
        ServiceScope::Explicit(names)
    }
}

impl std::fmt::Display for ServiceScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceScope::All => write!(f, "all"),
            ServiceScope::Pattern(p) => write!(f, "{p}"),
            ServiceScope::Explicit(names) if names.is_empty() => write!(f, "host only"),
            ServiceScope::Explicit(names) => write!(f, "{}", names.join(",")),
        }
    }
}

/// Concrete service set a scope resolved to against the live inventory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServicePlan {
    /// Covered by the host downtime's `all_services` flag
    AllServices,
    /// One service downtime per name
    Services(Vec<String>),
}

impl ServicePlan {
    pub fn is_all_services(&self) -> bool {
        matches!(self, ServicePlan::AllServices)
    }
}
