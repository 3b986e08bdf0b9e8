pub mod binary {
    pub fn not_found(path: &str) -> String {
        format!(
            "netbird binary not found at {}. Please install netbird or use the --netbird-path flag.",
            path
        )
    }

    pub fn permission_denied(path: &str) -> String {
        format!(
            "Permission denied executing netbird binary at {}. Check file permissions.",
            path
        )
    }
}

pub mod process {
    pub const CANCELLED: &str = "Command was cancelled before it completed";

    pub fn spawn_failed(error: &str) -> String {
        format!("Failed to spawn netbird process: {}", error)
    }

    pub fn wait_failed(error: &str) -> String {
        format!("Failed to read netbird process output: {}", error)
    }

    pub fn non_zero_exit(status: &str) -> String {
        format!("netbird exited with {}", status)
    }
}

pub mod connection {
    pub const UNKNOWN: &str = "Unknown error";
    pub const STATUS_FAILED: &str = "Failed to get status";
    pub const OPERATION_IN_PROGRESS: &str =
        "Another connection operation is already in progress. Please wait.";

    pub fn connect_failed(error: &str) -> String {
        format!("Failed to connect: {}", error)
    }

    pub fn disconnect_failed(error: &str) -> String {
        format!("Failed to disconnect: {}", error)
    }
}

pub mod networks {
    pub fn toggle_failed(action: &str, id: &str, error: &str) -> String {
        format!("Failed to {} network \"{}\": {}", action, id, error)
    }
}

pub mod settings {
    pub fn validation_failed(context: &str) -> String {
        format!("Settings validation failed for {}", context)
    }

    pub fn corrupted_yaml(path: &str, error: &str) -> String {
        format!("Corrupted YAML settings at {}: {}", path, error)
    }

    pub fn backup_created(path: &str) -> String {
        format!("Created backup of corrupted settings at {}", path)
    }

    pub fn invalid_log_level(value: &str) -> String {
        format!(
            "Unknown log level '{}'. Expected one of: panic, fatal, error, warn, info, debug, trace",
            value
        )
    }

    pub fn invalid_dns_router_interval(value: &str, error: &str) -> String {
        format!("Invalid dns-router-interval '{}': {}", value, error)
    }

    pub fn failed_to_create_default(path: &str) -> String {
        format!("Failed to create default settings at {}", path)
    }

    pub fn failed_to_read(path: &str) -> String {
        format!("Failed to read settings from {}", path)
    }

    pub fn failed_to_serialize() -> String {
        "Failed to serialize settings to YAML".to_string()
    }

    pub fn failed_to_create_dir(path: &str) -> String {
        format!("Failed to create settings directory: {}", path)
    }

    pub fn failed_to_write_temp(path: &str) -> String {
        format!("Failed to write temporary settings to {}", path)
    }

    pub fn failed_to_rename(from: &str, to: &str) -> String {
        format!("Failed to rename {} to {}", from, to)
    }

    #[cfg(unix)]
    pub const FAILED_TO_OPEN_TEMP: &str = "Failed to open temp file for fsync";
    #[cfg(unix)]
    pub const FAILED_TO_FSYNC: &str = "Failed to fsync temp file";
    pub const FAILED_TO_CREATE_WATCHER: &str = "Failed to create file watcher";

    pub fn failed_to_watch(path: &str) -> String {
        format!("Failed to watch settings file: {}", path)
    }
}

pub mod logs {
    pub const FAILED_TO_CREATE_DIR: &str = "Failed to create log directory";
}
