//! Optional TOML configuration for `tickler`.
//!
//! Every field has a default, so running without `--config` behaves like a
//! file with no sections at all.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;
use tickler_cql::{ConnectOptions, Credentials, DEFAULT_PORT};
use tickler_repair::{DEFAULT_PAGE_SIZE, DEFAULT_REPORT_INTERVAL, FailurePolicy, QueryOptions, RepairOptions};
use tickler_types::Consistency;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// How to reach the cluster.
    pub connection: ConnectionSection,
    /// Partition key enumeration.
    pub enumerate: EnumerateSection,
    /// Per-partition repair reads.
    pub repair: RepairSection,
    /// Progress output.
    pub progress: ProgressSection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[connection]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ConnectionSection {
    /// Port used when the contact point does not carry one.
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Session establishment timeout, in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            username: None,
            password: None,
            connect_timeout_ms: 5000,
        }
    }
}

/// `[enumerate]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EnumerateSection {
    pub consistency: Consistency,
    /// Partition keys per page.
    pub page_size: i32,
}

impl Default for EnumerateSection {
    fn default() -> Self {
        Self {
            consistency: Consistency::LocalQuorum,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// `[repair]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RepairSection {
    /// Level of each repair read. Anything below `all` does not force a
    /// full reconciliation.
    pub consistency: Consistency,
    pub on_failure: FailurePolicy,
}

impl Default for RepairSection {
    fn default() -> Self {
        Self {
            consistency: Consistency::All,
            on_failure: FailurePolicy::Abort,
        }
    }
}

/// `[progress]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProgressSection {
    /// Partitions between progress lines; 0 disables them.
    pub interval: u64,
}

impl Default for ProgressSection {
    fn default() -> Self {
        Self {
            interval: DEFAULT_REPORT_INTERVAL,
        }
    }
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl ToolConfig {
    /// Load config from a TOML file, or use the defaults if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("cannot read {}", p.display()))?;
                Self::from_toml(&content).with_context(|| format!("invalid config {}", p.display()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse and validate config from a TOML string.
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.enumerate.page_size <= 0 {
            bail!("enumerate.page_size must be positive, got {}", self.enumerate.page_size);
        }
        if self.connection.username.is_some() != self.connection.password.is_some() {
            bail!("connection.username and connection.password must be set together");
        }
        Ok(())
    }

    /// Session settings for `contact_point`, which may carry its own port.
    pub fn connect_options(&self, contact_point: &str) -> anyhow::Result<ConnectOptions> {
        let (host, port) = split_contact_point(contact_point, self.connection.port)?;
        let mut options = ConnectOptions::new(host);
        options.port = port;
        options.connect_timeout = Duration::from_millis(self.connection.connect_timeout_ms);
        if let (Some(username), Some(password)) =
            (&self.connection.username, &self.connection.password)
        {
            options.credentials = Some(Credentials {
                username: username.clone(),
                password: password.clone(),
            });
        }
        Ok(options)
    }

    /// Run settings with the given per-partition delay.
    pub fn repair_options(&self, delay: Duration) -> RepairOptions {
        RepairOptions {
            delay,
            queries: QueryOptions {
                enumerate_consistency: self.enumerate.consistency,
                repair_consistency: self.repair.consistency,
                page_size: self.enumerate.page_size,
            },
            on_failure: self.repair.on_failure,
        }
    }
}

/// Split `host[:port]` or `[v6]:port`. A bare IPv6 address has no port.
fn split_contact_point(contact_point: &str, default_port: u16) -> anyhow::Result<(String, u16)> {
    if let Some(rest) = contact_point.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .with_context(|| format!("unterminated '[' in contact point {contact_point}"))?;
        let port = match tail.strip_prefix(':') {
            Some(port) => parse_port(port, contact_point)?,
            None if tail.is_empty() => default_port,
            None => bail!("invalid contact point {contact_point}"),
        };
        return Ok((host.to_string(), port));
    }

    match contact_point.split_once(':') {
        Some((host, port)) if !port.contains(':') => {
            Ok((host.to_string(), parse_port(port, contact_point)?))
        }
        _ => Ok((contact_point.to_string(), default_port)),
    }
}

fn parse_port(port: &str, contact_point: &str) -> anyhow::Result<u16> {
    port.parse()
        .with_context(|| format!("invalid port in contact point {contact_point}"))
}
