//! In-memory Icinga API for unit testing
//!
//! [`MockIcinga`] implements [`Transport`] over a small object model of hosts,
//! services and downtimes, so the check and maintenance orchestrators can run
//! without a server. Service health can change over (tokio) time, which makes
//! polling behavior testable with a paused clock.
//!
//! # Example
//!
//! ```rust
//! use steward::status::Health;
//! use steward_testkit::mock::{MockHost, MockIcinga, MockService};
//!
//! let icinga = MockIcinga::new().with_host(
//!     MockHost::new("web-01")
//!         .with_service(MockService::new("http", Health::Ok))
//!         .with_service(MockService::new("disk", Health::Critical)),
//! );
//!
//! assert_eq!(icinga.service_names("web-01"), vec!["http", "disk"]);
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use steward::client::{IcingaClient, IcingaError, IcingaResult, Transport, Verb};
use steward::status::Health;

/// Mock representation of an Icinga service
#[derive(Debug, Clone)]
pub struct MockService {
    /// Short service name
    pub name: String,
    /// Whether active checks are enabled
    pub active: bool,
    /// Health before recovery
    pub health: Health,
    /// Time after the first forced check at which the service reports OK
    pub recovery: Option<Duration>,
    /// Instant of the first forced check
    checked_at: Option<Instant>,
}

impl MockService {
    /// Create an active service with a fixed health
    pub fn new(name: impl Into<String>, health: Health) -> Self {
        Self {
            name: name.into(),
            active: true,
            health,
            recovery: None,
            checked_at: None,
        }
    }

    /// Report OK once `after` has elapsed since the first forced check
    pub fn recovering_after(mut self, after: Duration) -> Self {
        self.recovery = Some(after);
        self
    }

    /// Disable active checks
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Health as observed right now
    pub fn current_health(&self) -> Health {
        match (self.recovery, self.checked_at) {
            (Some(after), Some(at)) if at.elapsed() >= after => Health::Ok,
            _ => self.health,
        }
    }
}

/// Mock representation of an Icinga host
#[derive(Debug, Clone)]
pub struct MockHost {
    /// Host name
    pub name: String,
    /// 0 = UP, 1 = DOWN
    pub state: u8,
    /// Acknowledgement level
    pub acknowledgement: u8,
    /// Host groups the host belongs to
    pub groups: Vec<String>,
    /// Services in registration order
    pub services: Vec<MockService>,
}

impl MockHost {
    /// Create an UP host without services
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: 0,
            acknowledgement: 0,
            groups: Vec::new(),
            services: Vec::new(),
        }
    }

    /// Add a service
    pub fn with_service(mut self, service: MockService) -> Self {
        self.services.push(service);
        self
    }

    /// Add the host to a group
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    /// Mark the host DOWN
    pub fn down(mut self) -> Self {
        self.state = 1;
        self
    }

    /// Mark the host problem as acknowledged
    pub fn acknowledged(mut self) -> Self {
        self.acknowledgement = 1;
        self
    }

    fn service(&self, name: &str) -> Option<&MockService> {
        self.services.iter().find(|s| s.name == name)
    }
}

/// Downtime registered on the mock server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockDowntime {
    /// Server-side name
    pub name: String,
    pub host: String,
    /// `None` for host downtimes
    pub service: Option<String>,
    pub author: String,
    pub comment: String,
    pub start_time: u64,
    pub end_time: u64,
    pub duration: u64,
}

/// One call received by the mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub verb: Verb,
    pub body: Value,
}

#[derive(Debug, Default)]
struct MockState {
    hosts: Vec<MockHost>,
    downtimes: Vec<MockDowntime>,
    requests: Vec<RecordedRequest>,
    next_downtime_id: u64,
    reject_credentials: bool,
    unreachable: bool,
}

/// In-memory Icinga server
#[derive(Debug, Default)]
pub struct MockIcinga {
    state: Mutex<MockState>,
}

impl MockIcinga {
    /// Create an empty server
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a host (builder pattern)
    pub fn with_host(self, host: MockHost) -> Self {
        self.state.lock().hosts.push(host);
        self
    }

    /// Answer every request with an authentication error
    pub fn reject_credentials(self) -> Self {
        self.state.lock().reject_credentials = true;
        self
    }

    /// Answer every request with a connection error
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unreachable = unreachable;
    }

    /// Wrap the server into a client, keeping a handle for inspection
    pub fn into_client(self) -> (Arc<Self>, IcingaClient<Arc<Self>>) {
        let server = Arc::new(self);
        let client = IcingaClient::with_transport(Arc::clone(&server));
        (server, client)
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    /// Requests received for one endpoint
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    /// Number of mutating actions received (downtimes created or removed,
    /// checks rescheduled)
    pub fn action_count(&self) -> usize {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| r.path.starts_with("/v1/actions/"))
            .count()
    }

    /// Number of forced checks received for one service
    pub fn reschedule_count(&self, host: &str, service: &str) -> usize {
        self.requests_to("/v1/actions/reschedule-check")
            .iter()
            .filter(|r| var(&r.body, "host_name") == Some(host))
            .filter(|r| var(&r.body, "service_name") == Some(service))
            .count()
    }

    /// Downtimes currently registered
    pub fn downtimes(&self) -> Vec<MockDowntime> {
        self.state.lock().downtimes.clone()
    }

    /// Service names of a host in registration order
    pub fn service_names(&self, host: &str) -> Vec<String> {
        self.state
            .lock()
            .hosts
            .iter()
            .find(|h| h.name == host)
            .map(|h| h.services.iter().map(|s| s.name.clone()).collect())
            .unwrap_or_default()
    }

    fn handle(&self, path: &str, body: &Value) -> IcingaResult<Value> {
        let mut state = self.state.lock();
        match path {
            "/v1/objects/services" => state.query_services(body),
            "/v1/objects/hosts" => state.query_hosts(body),
            "/v1/objects/downtimes" => state.query_downtimes(body),
            "/v1/actions/reschedule-check" => state.reschedule_check(body),
            "/v1/actions/schedule-downtime" => state.schedule_downtime(body),
            "/v1/actions/remove-downtime" => state.remove_downtime(body),
            _ => Err(IcingaError::not_found()),
        }
    }
}

#[async_trait]
impl Transport for MockIcinga {
    async fn send(&self, path: &str, verb: Verb, body: &Value) -> IcingaResult<Value> {
        {
            let mut state = self.state.lock();
            state.requests.push(RecordedRequest {
                path: path.to_string(),
                verb,
                body: body.clone(),
            });
            if state.unreachable {
                return Err(IcingaError::Connection {
                    message: steward::client::DEFAULT_CONNECTION_MESSAGE.to_string(),
                    custom: false,
                    source: None,
                });
            }
            if state.reject_credentials {
                return Err(IcingaError::authentication());
            }
        }
        self.handle(path, body)
    }
}

impl MockState {
    fn host(&self, body: &Value) -> IcingaResult<&MockHost> {
        let name = var(body, "host_name").ok_or_else(IcingaError::not_found)?;
        self.hosts
            .iter()
            .find(|h| h.name == name)
            .ok_or_else(IcingaError::not_found)
    }

    fn host_mut(&mut self, body: &Value) -> IcingaResult<&mut MockHost> {
        let name = var(body, "host_name").ok_or_else(IcingaError::not_found)?;
        self.hosts
            .iter_mut()
            .find(|h| h.name == name)
            .ok_or_else(IcingaError::not_found)
    }

    fn query_services(&self, body: &Value) -> IcingaResult<Value> {
        let host = self.host(body)?;
        let service_name = var(body, "service_name");
        let pattern = var(body, "pattern");

        let results: Vec<Value> = host
            .services
            .iter()
            .filter(|s| service_name.is_none_or(|n| s.name == n))
            .filter(|s| pattern.is_none_or(|p| glob_match(p, &s.name)))
            .map(|s| {
                let health = s.current_health();
                json!({
                    "name": format!("{}!{}", host.name, s.name),
                    "type": "Service",
                    "attrs": {
                        "name": s.name,
                        "host_name": host.name,
                        "active": s.active,
                        "last_state": health.code(),
                        "state": health.code(),
                    },
                })
            })
            .collect();

        Ok(json!({ "results": results }))
    }

    fn query_hosts(&self, body: &Value) -> IcingaResult<Value> {
        let results: Vec<Value> = if let Some(group) = var(body, "group") {
            self.hosts
                .iter()
                .filter(|h| h.groups.iter().any(|g| g == group))
                .map(|h| self.host_object(h))
                .collect()
        } else {
            vec![self.host_object(self.host(body)?)]
        };

        Ok(json!({ "results": results }))
    }

    fn host_object(&self, host: &MockHost) -> Value {
        let depth = self
            .downtimes
            .iter()
            .filter(|d| d.host == host.name && d.service.is_none())
            .count();
        json!({
            "name": host.name,
            "type": "Host",
            "attrs": {
                "name": host.name,
                "state": f64::from(host.state),
                "downtime_depth": depth as f64,
                "acknowledgement": f64::from(host.acknowledgement),
            },
        })
    }

    fn query_downtimes(&self, body: &Value) -> IcingaResult<Value> {
        let host = self.host(body)?;
        let results: Vec<Value> = self
            .downtimes
            .iter()
            .filter(|d| d.host == host.name)
            .map(|d| {
                json!({
                    "name": d.name,
                    "type": "Downtime",
                    "attrs": {
                        "host_name": d.host,
                        "service_name": d.service.clone().unwrap_or_default(),
                        "author": d.author,
                        "comment": d.comment,
                        "start_time": d.start_time as f64,
                        "end_time": d.end_time as f64,
                        "duration": d.duration as f64,
                    },
                })
            })
            .collect();

        Ok(json!({ "results": results }))
    }

    fn reschedule_check(&mut self, body: &Value) -> IcingaResult<Value> {
        let service_name = var(body, "service_name").unwrap_or_default().to_string();
        let host = self.host_mut(body)?;
        let host_name = host.name.clone();

        let results = match host.services.iter_mut().find(|s| s.name == service_name) {
            Some(service) => {
                service.checked_at.get_or_insert_with(Instant::now);
                vec![json!({
                    "code": 200.0,
                    "status": format!(
                        "Successfully rescheduled check for object '{host_name}!{service_name}'."
                    ),
                })]
            }
            None => Vec::new(),
        };

        Ok(json!({ "results": results }))
    }

    fn schedule_downtime(&mut self, body: &Value) -> IcingaResult<Value> {
        let host = self.host(body)?.clone();
        let object_type = body.get("type").and_then(Value::as_str).unwrap_or_default();

        let result = match object_type {
            "Host" => {
                let name = self.add_downtime(body, &host.name, None);
                let all_services = body
                    .get("all_services")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);

                let mut result = json!({
                    "code": 200.0,
                    "name": name,
                    "status": format!("Successfully scheduled downtime '{name}' for object '{}'.", host.name),
                });
                if all_services {
                    let service_downtimes: Vec<String> = host
                        .services
                        .iter()
                        .map(|s| self.add_downtime(body, &host.name, Some(&s.name)))
                        .collect();
                    result["service_downtimes"] = json!(service_downtimes);
                }
                Some(result)
            }
            "Service" => {
                let service_name = var(body, "service_name").unwrap_or_default();
                host.service(service_name).map(|service| {
                    let name = self.add_downtime(body, &host.name, Some(&service.name));
                    json!({
                        "code": 200.0,
                        "name": name,
                        "status": format!(
                            "Successfully scheduled downtime '{name}' for object '{}!{}'.",
                            host.name, service.name
                        ),
                    })
                })
            }
            other => {
                return Err(IcingaError::InvalidRequest(format!(
                    "unsupported downtime type '{other}'"
                )));
            }
        };

        Ok(json!({ "results": result.into_iter().collect::<Vec<_>>() }))
    }

    fn add_downtime(&mut self, body: &Value, host: &str, service: Option<&str>) -> String {
        self.next_downtime_id += 1;
        let object = match service {
            Some(service) => format!("{host}!{service}"),
            None => host.to_string(),
        };
        let name = format!("{object}!mock-{}", self.next_downtime_id);

        let number = |key: &str| body.get(key).and_then(Value::as_u64).unwrap_or_default();
        let text = |key: &str| {
            body.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        self.downtimes.push(MockDowntime {
            name: name.clone(),
            host: host.to_string(),
            service: service.map(str::to_string),
            author: text("author"),
            comment: text("comment"),
            start_time: number("start_time"),
            end_time: number("end_time"),
            duration: number("duration"),
        });
        name
    }

    fn remove_downtime(&mut self, body: &Value) -> IcingaResult<Value> {
        let name = body
            .get("downtime")
            .and_then(Value::as_str)
            .ok_or_else(|| IcingaError::InvalidRequest("missing downtime name".to_string()))?;

        let before = self.downtimes.len();
        self.downtimes.retain(|d| d.name != name);

        let results = if self.downtimes.len() < before {
            vec![json!({
                "code": 200.0,
                "status": format!("Successfully removed downtime '{name}'."),
            })]
        } else {
            Vec::new()
        };

        Ok(json!({ "results": results }))
    }
}

/// Read a string from the request's `filter_vars`
fn var<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get("filter_vars")?.get(key)?.as_str()
}

/// Icinga `match()` semantics: `*` matches any run, `?` one character
pub fn glob_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();

    let (mut p, mut n) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while n < name.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == name[n]) {
            p += 1;
            n += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, n));
            p += 1;
        } else if let Some((sp, sn)) = star {
            p = sp + 1;
            n = sn + 1;
            star = Some((sp, sn + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
