//! Parsers for the two human-oriented text outputs this crate consumes.
//!
//! Both are pure functions of their input and degrade to partial results
//! on unexpected text instead of failing: unknown status lines are
//! ignored, and a malformed networks block simply yields no entry.

use crate::client::types::{ConnectionState, ConnectionStatus, NetworkEntry};

/// Parse the output of `netbird status`.
///
/// Lines are evaluated strictly in order and the last matched condition
/// wins, so a `Management: Connected` line after `Daemon status:
/// NeedsLogin` leaves the state Connected. The daemon prints the daemon
/// line first in practice; callers rely on this pass order.
pub fn parse_status(output: &str) -> ConnectionStatus {
    let mut status = ConnectionStatus::default();

    for line in output.lines() {
        let trimmed = line.trim();

        if let Some(value) = trimmed.strip_prefix("Daemon status:") {
            if value.trim() == "NeedsLogin" {
                status.state = ConnectionState::NeedsLogin;
            }
        } else if let Some(value) = trimmed.strip_prefix("Management:") {
            status.management = value.trim().to_string();
            if status.management == "Connected" {
                status.state = ConnectionState::Connected;
            }
        } else if let Some(value) = trimmed.strip_prefix("Signal:") {
            status.signal = value.trim().to_string();
        } else if let Some(value) = trimmed.strip_prefix("NetBird IP:") {
            status.ip = value.trim().to_string();
        } else if let Some(value) = trimmed.strip_prefix("FQDN:") {
            status.fqdn = value.trim().to_string();
        }
    }

    status
}

/// Parse the output of `netbird networks list`.
///
/// Records are blank-line-delimited blocks. Blocks without an ID line are
/// header or banner text and are dropped wholesale.
pub fn parse_networks(output: &str) -> Vec<NetworkEntry> {
    split_blocks(output)
        .into_iter()
        .filter_map(|block| parse_network_block(&block))
        .collect()
}

fn split_blocks(output: &str) -> Vec<Vec<String>> {
    let mut blocks = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in output.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line.to_string());
        }
    }

    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

fn parse_network_block(lines: &[String]) -> Option<NetworkEntry> {
    let has_id_line = lines.iter().any(|line| {
        let trimmed = line.trim();
        trimmed.starts_with("- ID:") || trimmed.starts_with("ID:")
    });
    if !has_id_line {
        return None;
    }

    let mut id = String::new();
    let mut domains = None;
    let mut network = None;
    let mut selected = false;
    let mut resolved_ips = None;

    for line in lines {
        let trimmed = line.trim();
        let trimmed = trimmed.strip_prefix("- ").unwrap_or(trimmed);

        if let Some(value) = trimmed.strip_prefix("ID:") {
            id = value.trim().to_string();
        } else if let Some(value) = trimmed.strip_prefix("Domains:") {
            domains = Some(value.trim().to_string());
        } else if let Some(value) = trimmed.strip_prefix("Network:") {
            network = Some(value.trim().to_string());
        } else if let Some(value) = trimmed.strip_prefix("Status:") {
            selected = value.trim() == "Selected";
        } else if let Some(value) = trimmed.strip_prefix("Resolved IPs:") {
            let value = value.trim();
            // "-" is the daemon's spelling of "none yet"
            if value != "-" {
                resolved_ips = Some(value.to_string());
            }
        }
    }

    if id.is_empty() {
        return None;
    }

    Some(NetworkEntry {
        id,
        domains,
        network,
        selected,
        resolved_ips,
    })
}
