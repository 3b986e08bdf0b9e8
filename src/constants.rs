use std::path::PathBuf;
use std::time::Duration;

pub const APP_TITLE: &str = "NetBird Manager";

/// Binary name placed at the front of every built argv.
pub const NETBIRD_BINARY: &str = "netbird";

/// How long the suppression flag survives after a successful disconnect.
pub const DISCONNECT_SUPPRESS_WINDOW: Duration = Duration::from_secs(5);

/// How long the suppression flag survives after a notification was suppressed.
pub const SUPPRESS_AUTO_CLEAR: Duration = Duration::from_secs(10);

/// Interval between periodic status refreshes in watch mode.
pub const STATUS_REFRESH_INTERVAL: Duration = Duration::from_secs(3600);

pub fn default_log_directory() -> PathBuf {
    PathBuf::from(".").join("logs")
}
