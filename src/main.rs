//! Steward CLI - maintenance windows and forced checks for Icinga
//!
//! Maps command-line parameters onto the steward library and its errors onto
//! the exit status. Results are printed to stdout as JSON; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use steward::checks::CheckOptions;
use steward::client::{IcingaClient, IcingaError};
use steward::config::{Config, ServerConfig};
use steward::duration::parse_duration;
use steward::maintenance::{MaintenanceResult, PreCheck, ServiceScope};

/// Steward - maintenance windows and forced checks for Icinga
#[derive(Debug, Parser)]
#[command(name = "steward")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "STEWARD_CONFIG")]
    config: Option<String>,

    /// Icinga API URL (https://<server>:<port>)
    #[arg(long, global = true, env = "ICINGA_URL")]
    url: Option<String>,

    /// Icinga API user
    #[arg(long, global = true, env = "ICINGA_USERNAME")]
    username: Option<String>,

    /// Icinga API password
    #[arg(long, global = true, env = "ICINGA_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    insecure: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MaintenanceState {
    Enabled,
    Disabled,
}

#[derive(Debug, Args)]
struct TargetArgs {
    /// Host to act on
    #[arg(long, alias = "name", conflicts_with = "hostgroup", required_unless_present = "hostgroup")]
    host: Option<String>,

    /// Act on every member of this host group
    #[arg(long)]
    hostgroup: Option<String>,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Seconds to wait for a forced check to report OK (0 = do not wait)
    #[arg(long)]
    timeout: Option<u64>,

    /// Additional check windows after the first one fails
    #[arg(long)]
    retries: Option<u32>,
}

impl CheckArgs {
    fn to_check_options(&self, defaults: &CheckOptions) -> CheckOptions {
        CheckOptions {
            timeout: self
                .timeout
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            retries: self.retries.unwrap_or(defaults.retries),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Enable or disable maintenance on a host and its services
    Maintenance {
        /// Desired maintenance state
        #[arg(long, value_enum, default_value_t = MaintenanceState::Enabled)]
        state: MaintenanceState,

        #[command(flatten)]
        target: TargetArgs,

        /// Service name or glob pattern; `all` or `*` for every service
        #[arg(long, conflicts_with = "services")]
        service: Option<String>,

        /// Comma-separated list of services that must all exist
        #[arg(long, value_delimiter = ',')]
        services: Option<Vec<String>>,

        /// Maintenance window (e.g. 1d2h30m), required when enabling
        #[arg(long)]
        duration: Option<String>,

        /// Author recorded on the downtime
        #[arg(long)]
        author: Option<String>,

        /// Comment recorded on the downtime
        #[arg(long)]
        message: Option<String>,

        /// Force checks of unhealthy services first
        #[arg(long)]
        check_before: bool,

        /// Abort when a service is still unhealthy after the pre-check
        #[arg(long, requires = "check_before")]
        stop_on_failed_service: bool,

        #[command(flatten)]
        check: CheckArgs,
    },

    /// Force a service check and wait for it to report OK
    Check {
        /// Host of the service
        #[arg(long, alias = "name")]
        host: String,

        /// Service name; `all` or `*` checks every unhealthy service
        #[arg(long)]
        service: String,

        #[command(flatten)]
        check: CheckArgs,
    },

    /// Show host state and the health of selected services
    State {
        #[command(flatten)]
        target: TargetArgs,

        /// Service name or glob pattern; `all` or `*` for every service
        #[arg(long, conflicts_with = "services")]
        service: Option<String>,

        /// Comma-separated list of services that must all exist
        #[arg(long, value_delimiter = ',')]
        services: Option<Vec<String>>,
    },

    /// List the hosts of a host group
    Hostgroup {
        /// Host group name
        #[arg(long)]
        name: String,
    },

    /// Generate a default configuration file
    Init {
        /// Output file path
        #[arg(short, long, default_value = "steward.yaml")]
        output: String,
    },

    /// Validate a configuration file
    Validate,
}

fn setup_logging(verbose: bool, json: bool) {
    let env_filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.json_logs);

    match &cli.command {
        Commands::Init { output } => init_config(output),
        Commands::Validate => validate_config(&cli),
        Commands::Maintenance {
            state,
            target,
            service,
            services,
            duration,
            author,
            message,
            check_before,
            stop_on_failed_service,
            check,
        } => {
            let config = load_config(&cli)?;
            let client = connect(&config)?;

            let scope = service_scope(service, services);
            let precheck = check_before.then(|| {
                PreCheck::new(check.to_check_options(&config.check))
                    .stop_on_failed_service(*stop_on_failed_service)
            });
            let downtime = match state {
                MaintenanceState::Enabled => {
                    let text = duration
                        .as_deref()
                        .context("Duration is needed if maintenance=enabled")?;
                    let seconds = parse_duration(text);
                    if seconds == 0 {
                        anyhow::bail!("Can't convert duration='{text}'");
                    }
                    let mut downtime = config
                        .maintenance
                        .to_downtime_spec(Duration::from_secs(seconds));
                    if let Some(author) = author {
                        downtime = downtime.with_author(author);
                    }
                    if let Some(message) = message {
                        downtime = downtime.with_comment(message);
                    }
                    Some(downtime)
                }
                MaintenanceState::Disabled => None,
            };
            let hosts = resolve_targets(&client, target).await?;

            let mut results = Vec::new();
            for host in &hosts {
                let ctx = ErrorContext::host(&config, host);
                let result = match &downtime {
                    Some(downtime) => {
                        client
                            .set_maintenance(host, &scope, downtime, precheck.as_ref())
                            .await
                    }
                    None => {
                        client
                            .clear_maintenance(host, &scope, precheck.as_ref())
                            .await
                    }
                }
                .map_err(|e| ctx.report(e))?;
                results.push(result);
            }

            print_maintenance(&results)
        }
        Commands::Check {
            host,
            service,
            check,
        } => {
            let config = load_config(&cli)?;
            let client = connect(&config)?;
            let ctx = ErrorContext::host(&config, host).with_service(service);
            let opts = check.to_check_options(&config.check);

            let output = if ServiceScope::from_pattern(service).is_all() {
                let summary = client
                    .check_all_services(host, &opts)
                    .await
                    .map_err(|e| ctx.report(e))?;
                let output = json!({
                    "changed": false,
                    "message": format!(
                        "{} services up, {} down",
                        summary.succeeded.len(),
                        summary.failed.len()
                    ),
                    "summary": summary,
                });
                summary.into_result().map_err(|e| ctx.report(e))?;
                output
            } else {
                let outcome = client
                    .check_service(host, service, &opts)
                    .await
                    .and_then(|o| o.into_result())
                    .map_err(|e| ctx.report(e))?;
                json!({
                    "changed": false,
                    "message": outcome.message(),
                    "outcome": outcome,
                })
            };

            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Commands::State {
            target,
            service,
            services,
        } => {
            let config = load_config(&cli)?;
            let client = connect(&config)?;
            let scope = service_scope(service, services);
            let hosts = resolve_targets(&client, target).await?;

            let mut states = Vec::with_capacity(hosts.len());
            for host in &hosts {
                let ctx = ErrorContext::host(&config, host);
                let state = client
                    .host_state(host, &scope)
                    .await
                    .map_err(|e| ctx.report(e))?;
                states.push(state);
            }

            let output = json!({
                "changed": false,
                "host_maintenance": states.iter().all(|s| s.host.in_maintenance),
                "hosts": states,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Commands::Hostgroup { name } => {
            let config = load_config(&cli)?;
            let client = connect(&config)?;
            let ctx = ErrorContext::hostgroup(&config, name);

            let hosts = client
                .list_hosts_by_group(name)
                .await
                .map_err(|e| ctx.report(e))?;
            let output = json!({"changed": false, "hosts": hosts});
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
    }
}

/// Load the config file if one was given and apply flag overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {path}"))?,
        None => {
            let url = cli
                .url
                .clone()
                .context("No config file given; --url is required")?;
            let username = cli
                .username
                .clone()
                .context("No config file given; --username is required")?;
            Config {
                server: ServerConfig {
                    url,
                    username,
                    password: String::new(),
                    verify_certs: true,
                },
                ..Config::default_config()
            }
        }
    };

    if let Some(url) = &cli.url {
        config.server.url = url.clone();
    }
    if let Some(username) = &cli.username {
        config.server.username = username.clone();
    }
    if let Some(password) = &cli.password {
        config.server.password = password.clone();
    }
    if cli.insecure {
        config.server.verify_certs = false;
    }

    Ok(config)
}

fn connect(config: &Config) -> Result<IcingaClient> {
    tracing::debug!(url = %config.server.url, user = %config.server.username, "Connecting");
    config
        .server
        .to_client()
        .context("Failed to create Icinga client")
}

/// `--service` takes a name or pattern, `--services` an exact list; neither
/// selects the host alone
fn service_scope(service: &Option<String>, services: &Option<Vec<String>>) -> ServiceScope {
    match (service, services) {
        (Some(service), _) => ServiceScope::from_pattern(service),
        (None, Some(services)) => ServiceScope::Explicit(services.clone()),
        (None, None) => ServiceScope::host_only(),
    }
}

/// Expand `--host`/`--hostgroup` into host names
async fn resolve_targets(client: &IcingaClient, target: &TargetArgs) -> Result<Vec<String>> {
    match (&target.host, &target.hostgroup) {
        (Some(host), _) => Ok(vec![host.clone()]),
        (None, Some(group)) => {
            let hosts = client
                .list_hosts_by_group(group)
                .await
                .with_context(|| format!("Unable to find the host group {group}"))?;
            if hosts.is_empty() {
                anyhow::bail!("Host group {group} has no members");
            }
            tracing::info!(group = %group, hosts = hosts.len(), "Expanded host group");
            Ok(hosts)
        }
        (None, None) => anyhow::bail!("Specify --host or --hostgroup"),
    }
}

fn print_maintenance(results: &[MaintenanceResult]) -> Result<()> {
    let changed = results.iter().any(MaintenanceResult::changed);
    let message = results
        .iter()
        .map(MaintenanceResult::status)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    let output = json!({
        "changed": changed,
        "message": message,
        "results": results,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Invocation details used to phrase library errors that carry only the
/// default message
#[derive(Debug, Clone)]
struct ErrorContext {
    url: String,
    username: String,
    object: String,
}

impl ErrorContext {
    fn host(config: &Config, host: &str) -> Self {
        Self {
            url: config.server.url.clone(),
            username: config.server.username.clone(),
            object: format!("host {host}"),
        }
    }

    fn hostgroup(config: &Config, group: &str) -> Self {
        Self {
            url: config.server.url.clone(),
            username: config.server.username.clone(),
            object: format!("host group {group}"),
        }
    }

    fn with_service(mut self, service: &str) -> Self {
        self.object = format!("{} or service {service}", self.object);
        self
    }

    /// Custom messages pass through verbatim; default ones get the
    /// invocation context
    fn report(&self, err: IcingaError) -> anyhow::Error {
        if err.is_custom() {
            return anyhow::Error::new(err);
        }
        let message = match &err {
            IcingaError::Connection { .. } => {
                format!("Unable to connect to or find the Icinga URL {}", self.url)
            }
            IcingaError::Authentication { .. } => format!(
                "Authentication error, please double check the '{}' user",
                self.username
            ),
            IcingaError::NotFound { .. } => format!("Unable to find the {}", self.object),
            IcingaError::ServiceFailed { message, .. } => {
                format!("One or more services are down ({message})")
            }
            other => other.to_string(),
        };
        anyhow::Error::new(err).context(message)
    }
}

/// Generate a default configuration file
fn init_config(output: &str) -> Result<()> {
    let config = Config::default_config();
    let yaml = config.to_yaml().context("Failed to serialize config")?;

    std::fs::write(output, &yaml).with_context(|| format!("Failed to write config to {output}"))?;

    tracing::info!(path = %output, "Configuration file created");
    println!("Created {output}");
    println!();
    println!("Edit the file to point at your Icinga server, then run:");
    println!("  ICINGA_PASSWORD=... steward --config {output} state --host <host>");

    Ok(())
}

/// Validate a configuration file
fn validate_config(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    tracing::info!(url = %config.server.url, "Validating configuration");

    config
        .server
        .validate()
        .context("Configuration is invalid")?;

    println!("Configuration is valid!");
    println!();
    println!("Server: {}", config.server.url);
    println!("User: {}", config.server.username);
    println!("Verify certificates: {}", config.server.verify_certs);
    println!(
        "Check timeout: {}s, retries: {}",
        config.check.timeout.as_secs(),
        config.check.retries
    );
    println!("Downtime author: {}", config.maintenance.author);

    Ok(())
}
