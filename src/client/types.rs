use crate::errors;
use anyhow::ensure;
use serde::{Deserialize, Serialize};
use std::fmt;

const LOG_LEVELS: [&str; 7] = ["panic", "fatal", "error", "warn", "info", "debug", "trace"];

/// Connection state as mirrored to the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connected,
    Disconnected,
    NeedsLogin,
    Loading,
    Error,
}

/// Structured result of parsing `netbird status` output, or of a failed
/// status invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    pub management: String,
    pub signal: String,
    pub ip: String,
    pub fqdn: String,
    pub error_message: Option<String>,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            management: String::new(),
            signal: String::new(),
            ip: String::new(),
            fqdn: String::new(),
            error_message: None,
        }
    }
}

impl ConnectionStatus {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            state: ConnectionState::Error,
            error_message: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Raw outcome of one external process execution. Produced once per
/// invocation; `error` carries captured stderr whenever it was non-empty,
/// even for successful runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
}

impl CommandResult {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }

    pub fn error_or_unknown(&self) -> &str {
        self.error.as_deref().unwrap_or(errors::connection::UNKNOWN)
    }
}

/// One record parsed from `netbird networks list` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkEntry {
    pub id: String,
    pub domains: Option<String>,
    pub network: Option<String>,
    pub selected: bool,
    pub resolved_ips: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum NetworkAction {
    Select,
    Deselect,
}

/// Payload-less outcome for network select/deselect; the caller toggles
/// its UI state optimistically and rolls back when `success` is false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
    pub success: bool,
    pub error: Option<String>,
}

impl From<CommandResult> for ActionResult {
    fn from(result: CommandResult) -> Self {
        Self {
            success: result.success,
            error: result.error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkListResult {
    pub success: bool,
    pub networks: Vec<NetworkEntry>,
    pub error: Option<String>,
}

/// Resolution of one optimistic toggle request. `Reverted` tells the UI to
/// put the switch back where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleIntent {
    Pending,
    Confirmed,
    Reverted,
}

impl fmt::Display for ToggleIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToggleIntent::Pending => write!(f, "pending"),
            ToggleIntent::Confirmed => write!(f, "confirmed"),
            ToggleIntent::Reverted => write!(f, "reverted"),
        }
    }
}

/// Global flags valid for every netbird subcommand. Every field is
/// optional: absence omits the flag entirely and the external tool
/// supplies its own default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralOptions {
    pub management_url: Option<String>,
    pub admin_url: Option<String>,
    pub anonymize: bool,
    pub daemon_addr: Option<String>,
    pub hostname: Option<String>,
    pub log_file: Option<String>,
    pub log_level: Option<String>,
    pub preshared_key: Option<String>,
    pub service: Option<String>,
    pub setup_key: Option<String>,
    pub setup_key_file: Option<String>,
}

/// Flags valid only for `netbird up`, grouped the way the preferences
/// surface groups them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpOptions {
    // Connection
    pub allow_server_ssh: bool,
    pub block_inbound: bool,
    pub block_lan_access: bool,
    pub disable_auto_connect: bool,

    // Routes
    pub disable_client_routes: bool,
    pub disable_server_routes: bool,

    // DNS
    pub disable_dns: bool,
    pub dns_resolver_address: Option<String>,
    pub dns_router_interval: Option<String>,
    pub extra_dns_labels: Option<String>,

    // Firewall and advanced network
    pub disable_firewall: bool,
    pub interface_name: Option<String>,
    pub mtu: Option<u16>,
    pub wireguard_port: Option<u16>,
    pub external_ip_map: Option<String>,
    pub extra_iface_blacklist: Option<String>,
    /// Tri-state: `None` omits the flag, `Some(_)` always emits
    /// `--network-monitor=true|false`, distinguishing "unset" from
    /// "explicitly off".
    pub network_monitor: Option<bool>,

    // Experimental
    pub enable_lazy_connection: bool,
    pub enable_rosenpass: bool,
    pub rosenpass_permissive: bool,

    // Authentication
    pub no_browser: bool,
    pub profile: Option<String>,
}

/// Combined options for connect: global flags plus up-specific flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    #[serde(flatten)]
    pub general: GeneralOptions,
    #[serde(flatten)]
    pub up: UpOptions,
}

fn clean(value: &mut Option<String>) {
    if value.as_ref().is_some_and(|s| s.trim().is_empty()) {
        *value = None;
    }
}

impl GeneralOptions {
    /// Collapses empty or whitespace-only strings to unset. The external
    /// settings store hands us empty strings for fields the user left
    /// blank.
    pub fn normalize(&mut self) {
        clean(&mut self.management_url);
        clean(&mut self.admin_url);
        clean(&mut self.daemon_addr);
        clean(&mut self.hostname);
        clean(&mut self.log_file);
        clean(&mut self.log_level);
        clean(&mut self.preshared_key);
        clean(&mut self.service);
        clean(&mut self.setup_key);
        clean(&mut self.setup_key_file);
    }
}

impl UpOptions {
    pub fn normalize(&mut self) {
        clean(&mut self.dns_resolver_address);
        clean(&mut self.dns_router_interval);
        clean(&mut self.extra_dns_labels);
        clean(&mut self.interface_name);
        clean(&mut self.external_ip_map);
        clean(&mut self.extra_iface_blacklist);
        clean(&mut self.profile);
        if self.mtu == Some(0) {
            self.mtu = None;
        }
        if self.wireguard_port == Some(0) {
            self.wireguard_port = None;
        }
    }
}

impl ConnectionOptions {
    pub fn normalize(&mut self) {
        self.general.normalize();
        self.up.normalize();
    }

    /// Sanity checks on fields the external tool would otherwise reject at
    /// connect time. The builder itself never validates.
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(ref level) = self.general.log_level {
            ensure!(
                LOG_LEVELS.contains(&level.to_lowercase().as_str()),
                errors::settings::invalid_log_level(level)
            );
        }

        if let Some(ref interval) = self.up.dns_router_interval {
            humantime::parse_duration(interval).map_err(|e| {
                anyhow::anyhow!(errors::settings::invalid_dns_router_interval(
                    interval,
                    &e.to_string()
                ))
            })?;
        }

        Ok(())
    }
}
