//! Argv construction for every netbird subcommand this crate drives.
//!
//! Builders are pure: the same options always produce the same argument
//! list, unset fields are skipped, and nothing here executes or fails.

use crate::client::types::{ConnectionOptions, GeneralOptions, NetworkAction, UpOptions};
use crate::constants::NETBIRD_BINARY;

fn push_flag(command: &mut Vec<String>, enabled: bool, flag: &str) {
    if enabled {
        command.push(flag.to_string());
    }
}

fn push_value(command: &mut Vec<String>, value: Option<&str>, flag: &str) {
    if let Some(value) = value
        && !value.trim().is_empty()
    {
        command.push(flag.to_string());
        command.push(value.to_string());
    }
}

fn push_number(command: &mut Vec<String>, value: Option<u16>, flag: &str) {
    if let Some(value) = value
        && value != 0
    {
        command.push(flag.to_string());
        command.push(value.to_string());
    }
}

/// Global flags, emitted before the subcommand token in a fixed order.
fn push_global_flags(command: &mut Vec<String>, general: &GeneralOptions) {
    push_value(command, general.management_url.as_deref(), "--management-url");
    push_value(command, general.admin_url.as_deref(), "--admin-url");
    push_flag(command, general.anonymize, "--anonymize");
    push_value(command, general.daemon_addr.as_deref(), "--daemon-addr");
    push_value(command, general.hostname.as_deref(), "--hostname");
    push_value(command, general.log_file.as_deref(), "--log-file");
    push_value(command, general.log_level.as_deref(), "--log-level");
    push_value(command, general.preshared_key.as_deref(), "--preshared-key");
    push_value(command, general.service.as_deref(), "--service");
    push_value(command, general.setup_key.as_deref(), "--setup-key");
    push_value(command, general.setup_key_file.as_deref(), "--setup-key-file");
}

fn push_connection_flags(command: &mut Vec<String>, up: &UpOptions) {
    push_flag(command, up.allow_server_ssh, "--allow-server-ssh");
    push_flag(command, up.block_inbound, "--block-inbound");
    push_flag(command, up.block_lan_access, "--block-lan-access");
    push_flag(command, up.disable_auto_connect, "--disable-auto-connect");
}

fn push_route_flags(command: &mut Vec<String>, up: &UpOptions) {
    push_flag(command, up.disable_client_routes, "--disable-client-routes");
    push_flag(command, up.disable_server_routes, "--disable-server-routes");
}

fn push_dns_flags(command: &mut Vec<String>, up: &UpOptions) {
    push_flag(command, up.disable_dns, "--disable-dns");
    push_value(
        command,
        up.dns_resolver_address.as_deref(),
        "--dns-resolver-address",
    );
    push_value(
        command,
        up.dns_router_interval.as_deref(),
        "--dns-router-interval",
    );
    push_value(command, up.extra_dns_labels.as_deref(), "--extra-dns-labels");
}

fn push_network_flags(command: &mut Vec<String>, up: &UpOptions) {
    push_flag(command, up.disable_firewall, "--disable-firewall");
    push_value(command, up.interface_name.as_deref(), "--interface-name");
    push_number(command, up.mtu, "--mtu");
    push_number(command, up.wireguard_port, "--wireguard-port");
    push_value(command, up.external_ip_map.as_deref(), "--external-ip-map");
    push_value(
        command,
        up.extra_iface_blacklist.as_deref(),
        "--extra-iface-blacklist",
    );
    // Tri-state: an explicit false still has to reach the daemon, so the
    // flag always carries its value when set.
    if let Some(enabled) = up.network_monitor {
        command.push(format!("--network-monitor={}", enabled));
    }
}

fn push_experimental_and_auth_flags(command: &mut Vec<String>, up: &UpOptions) {
    push_flag(command, up.enable_lazy_connection, "--enable-lazy-connection");
    push_flag(command, up.enable_rosenpass, "--enable-rosenpass");
    push_flag(command, up.rosenpass_permissive, "--rosenpass-permissive");
    push_flag(command, up.no_browser, "--no-browser");
    push_value(command, up.profile.as_deref(), "--profile");
}

pub fn build_status_command(general: &GeneralOptions) -> Vec<String> {
    let mut command = vec![NETBIRD_BINARY.to_string()];
    push_global_flags(&mut command, general);
    command.push("status".to_string());
    command
}

pub fn build_up_command(options: &ConnectionOptions) -> Vec<String> {
    let mut command = vec![NETBIRD_BINARY.to_string()];
    push_global_flags(&mut command, &options.general);
    command.push("up".to_string());

    push_connection_flags(&mut command, &options.up);
    push_route_flags(&mut command, &options.up);
    push_dns_flags(&mut command, &options.up);
    push_network_flags(&mut command, &options.up);
    push_experimental_and_auth_flags(&mut command, &options.up);

    command
}

pub fn build_down_command(general: &GeneralOptions) -> Vec<String> {
    let mut command = vec![NETBIRD_BINARY.to_string()];
    push_global_flags(&mut command, general);
    command.push("down".to_string());
    command
}

pub fn build_networks_list_command(general: &GeneralOptions) -> Vec<String> {
    let mut command = vec![NETBIRD_BINARY.to_string()];
    push_global_flags(&mut command, general);
    command.push("networks".to_string());
    command.push("list".to_string());
    command
}

pub fn build_networks_toggle_command(
    general: &GeneralOptions,
    action: NetworkAction,
    network_id: &str,
) -> Vec<String> {
    let mut command = vec![NETBIRD_BINARY.to_string()];
    push_global_flags(&mut command, general);
    command.push("networks".to_string());
    match action {
        NetworkAction::Select => {
            command.push("select".to_string());
            // --append adds to the current selection set instead of
            // replacing it.
            command.push("--append".to_string());
        }
        NetworkAction::Deselect => {
            command.push("deselect".to_string());
        }
    }
    command.push(network_id.to_string());
    command
}
