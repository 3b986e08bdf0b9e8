use netbird_manager::client::command::{
    build_down_command, build_networks_list_command, build_networks_toggle_command,
    build_status_command, build_up_command,
};
use netbird_manager::client::parser::{parse_networks, parse_status};
use netbird_manager::client::types::{
    ConnectionOptions, ConnectionState, GeneralOptions, NetworkAction,
};

fn count_occurrences(command: &[String], flag: &str) -> usize {
    command.iter().filter(|arg| arg.as_str() == flag).count()
}

fn full_general_options() -> GeneralOptions {
    GeneralOptions {
        management_url: Some("https://mgmt.example.com".to_string()),
        admin_url: Some("https://admin.example.com".to_string()),
        anonymize: true,
        daemon_addr: Some("unix:///var/run/netbird.sock".to_string()),
        hostname: Some("laptop".to_string()),
        log_file: Some("/tmp/netbird.log".to_string()),
        log_level: Some("debug".to_string()),
        preshared_key: Some("psk123".to_string()),
        service: Some("netbird".to_string()),
        setup_key: Some("setup-key-1".to_string()),
        setup_key_file: Some("/etc/netbird/setup.key".to_string()),
    }
}

fn full_connection_options() -> ConnectionOptions {
    let mut options = ConnectionOptions {
        general: full_general_options(),
        ..ConnectionOptions::default()
    };
    options.up.allow_server_ssh = true;
    options.up.block_inbound = true;
    options.up.block_lan_access = true;
    options.up.disable_auto_connect = true;
    options.up.disable_client_routes = true;
    options.up.disable_server_routes = true;
    options.up.disable_dns = true;
    options.up.dns_resolver_address = Some("127.0.0.53".to_string());
    options.up.dns_router_interval = Some("60s".to_string());
    options.up.extra_dns_labels = Some("lab,staging".to_string());
    options.up.disable_firewall = true;
    options.up.interface_name = Some("wt1".to_string());
    options.up.mtu = Some(1280);
    options.up.wireguard_port = Some(51820);
    options.up.external_ip_map = Some("198.51.100.1/10.0.0.1".to_string());
    options.up.extra_iface_blacklist = Some("docker0".to_string());
    options.up.network_monitor = Some(true);
    options.up.enable_lazy_connection = true;
    options.up.enable_rosenpass = true;
    options.up.rosenpass_permissive = true;
    options.up.no_browser = true;
    options.up.profile = Some("work".to_string());
    options
}

mod command_builder {
    use super::*;

    const VALUE_FLAGS: [&str; 19] = [
        "--management-url",
        "--admin-url",
        "--daemon-addr",
        "--hostname",
        "--log-file",
        "--log-level",
        "--preshared-key",
        "--service",
        "--setup-key",
        "--setup-key-file",
        "--dns-resolver-address",
        "--dns-router-interval",
        "--extra-dns-labels",
        "--interface-name",
        "--mtu",
        "--wireguard-port",
        "--external-ip-map",
        "--extra-iface-blacklist",
        "--profile",
    ];

    const BARE_FLAGS: [&str; 13] = [
        "--anonymize",
        "--allow-server-ssh",
        "--block-inbound",
        "--block-lan-access",
        "--disable-auto-connect",
        "--disable-client-routes",
        "--disable-server-routes",
        "--disable-dns",
        "--disable-firewall",
        "--enable-lazy-connection",
        "--enable-rosenpass",
        "--rosenpass-permissive",
        "--no-browser",
    ];

    #[test]
    fn every_set_field_emits_its_flag_exactly_once() {
        let command = build_up_command(&full_connection_options());

        for flag in VALUE_FLAGS.iter().chain(BARE_FLAGS.iter()) {
            assert_eq!(
                count_occurrences(&command, flag),
                1,
                "expected exactly one {}",
                flag
            );
        }
        assert_eq!(
            command
                .iter()
                .filter(|arg| arg.as_str() == "--network-monitor=true")
                .count(),
            1
        );
    }

    #[test]
    fn default_options_emit_no_flags() {
        let command = build_up_command(&ConnectionOptions::default());
        assert_eq!(command, vec!["netbird", "up"]);

        for flag in VALUE_FLAGS.iter().chain(BARE_FLAGS.iter()) {
            assert_eq!(count_occurrences(&command, flag), 0);
        }
    }

    #[test]
    fn builders_are_deterministic() {
        let options = full_connection_options();
        assert_eq!(build_up_command(&options), build_up_command(&options));
        assert_eq!(
            build_status_command(&options.general),
            build_status_command(&options.general)
        );
    }

    #[test]
    fn global_flags_keep_their_documented_order() {
        let command = build_status_command(&full_general_options());

        let positions: Vec<usize> = [
            "--management-url",
            "--admin-url",
            "--anonymize",
            "--daemon-addr",
            "--hostname",
            "--log-file",
            "--log-level",
            "--preshared-key",
            "--service",
            "--setup-key",
            "--setup-key-file",
        ]
        .iter()
        .map(|flag| command.iter().position(|arg| arg == flag).unwrap())
        .collect();

        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted, "global flag order changed");
        assert_eq!(command.last().map(String::as_str), Some("status"));
    }

    #[test]
    fn subcommand_follows_global_flags() {
        let options = full_connection_options();
        let command = build_up_command(&options);

        let up_position = command.iter().position(|arg| arg == "up").unwrap();
        let first_up_flag = command
            .iter()
            .position(|arg| arg == "--allow-server-ssh")
            .unwrap();
        let last_global = command
            .iter()
            .position(|arg| arg == "--setup-key-file")
            .unwrap();

        assert!(last_global < up_position);
        assert!(up_position < first_up_flag);
    }

    #[test]
    fn down_command_carries_only_global_flags() {
        let command = build_down_command(&full_general_options());
        assert_eq!(command.last().map(String::as_str), Some("down"));
        assert_eq!(count_occurrences(&command, "--block-inbound"), 0);
    }

    #[test]
    fn select_always_appends() {
        let command = build_networks_toggle_command(
            &full_general_options(),
            NetworkAction::Select,
            "corp-net",
        );

        let append = command.iter().position(|arg| arg == "--append").unwrap();
        assert_eq!(command[append + 1], "corp-net");
        assert_eq!(command.last().map(String::as_str), Some("corp-net"));
    }

    #[test]
    fn deselect_never_appends() {
        let command = build_networks_toggle_command(
            &GeneralOptions::default(),
            NetworkAction::Deselect,
            "corp-net",
        );
        assert_eq!(count_occurrences(&command, "--append"), 0);
        assert_eq!(command, vec!["netbird", "networks", "deselect", "corp-net"]);
    }

    #[test]
    fn networks_list_command_shape() {
        let command = build_networks_list_command(&GeneralOptions::default());
        assert_eq!(command, vec!["netbird", "networks", "list"]);
    }
}

mod status_parser {
    use super::*;

    #[test]
    fn connected_status() {
        let status =
            parse_status("Management: Connected\nNetBird IP: 100.64.0.1\nFQDN: host.netbird\n");

        assert_eq!(status.state, ConnectionState::Connected);
        assert_eq!(status.management, "Connected");
        assert_eq!(status.ip, "100.64.0.1");
        assert_eq!(status.fqdn, "host.netbird");
        assert!(status.error_message.is_none());
    }

    #[test]
    fn needs_login_detected() {
        let output = "Daemon status: NeedsLogin\nManagement: Disconnected\n";
        assert_eq!(parse_status(output).state, ConnectionState::NeedsLogin);
    }

    #[test]
    fn later_management_line_wins_over_needs_login() {
        // Order-dependent by design: evaluation is strictly line-by-line
        // and the last matched condition decides the state.
        let output = "Daemon status: NeedsLogin\nManagement: Connected\n";
        assert_eq!(parse_status(output).state, ConnectionState::Connected);
    }

    #[test]
    fn unknown_lines_are_ignored() {
        let output = "\
NetBird version: 0.36.5\n\
Daemon version: 0.36.5\n\
Management: Connected\n\
Peers count: 4/7 Connected\n";
        let status = parse_status(output);
        assert_eq!(status.state, ConnectionState::Connected);
        assert_eq!(status.signal, "");
    }

    #[test]
    fn empty_input_is_disconnected() {
        let status = parse_status("");
        assert_eq!(status.state, ConnectionState::Disconnected);
        assert_eq!(status.management, "");
    }

    #[test]
    fn parser_is_pure() {
        let output = "Daemon status: NeedsLogin\nSignal: Disconnected\n";
        assert_eq!(parse_status(output), parse_status(output));
    }
}

mod networks_parser {
    use super::*;

    #[test]
    fn header_block_yields_no_entry() {
        let output =
            "Available Networks:\n\n- ID: net1\n  Domains: corp.local\n  Status: Selected\n";
        let networks = parse_networks(output);

        assert_eq!(networks.len(), 1);
        assert_eq!(networks[0].id, "net1");
        assert_eq!(networks[0].domains.as_deref(), Some("corp.local"));
        assert!(networks[0].selected);
        assert!(networks[0].network.is_none());
    }

    #[test]
    fn status_other_than_selected_is_unselected() {
        let output = "- ID: net1\n  Status: Not Selected\n\n- ID: net2\n  Status: Selected\n";
        let networks = parse_networks(output);

        assert!(!networks[0].selected);
        assert!(networks[1].selected);
    }

    #[test]
    fn resolved_ips_dash_means_absent() {
        let networks = parse_networks("- ID: a\n  Resolved IPs: -\n\n- ID: b\n  Resolved IPs: 10.0.0.7, 10.0.0.8\n");

        assert!(networks[0].resolved_ips.is_none());
        assert_eq!(networks[1].resolved_ips.as_deref(), Some("10.0.0.7, 10.0.0.8"));
    }

    #[test]
    fn block_without_id_line_is_discarded() {
        let output = "Domains: corp.local\nStatus: Selected\n\n- ID: real\n";
        let networks = parse_networks(output);
        assert_eq!(networks.len(), 1);
        assert_eq!(networks[0].id, "real");
    }

    #[test]
    fn empty_id_is_discarded() {
        assert!(parse_networks("- ID:\n  Status: Selected\n").is_empty());
    }

    #[test]
    fn id_line_without_dash_prefix() {
        let networks = parse_networks("ID: bare\nStatus: Selected\n");
        assert_eq!(networks.len(), 1);
        assert_eq!(networks[0].id, "bare");
    }
}

mod settings_persistence {
    use netbird_manager::client::settings::{load_options, save_options};
    use netbird_manager::client::types::ConnectionOptions;
    use std::path::PathBuf;

    fn create_temp_test_dir() -> PathBuf {
        let temp_dir = std::env::temp_dir().join(format!(
            "netbird_manager_test_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&temp_dir).unwrap();
        temp_dir
    }

    #[tokio::test]
    async fn missing_file_creates_defaults() {
        let temp_dir = create_temp_test_dir();
        let path = temp_dir.join("settings.yaml");

        let options = load_options(&path).await.unwrap();
        assert_eq!(options, ConnectionOptions::default());
        assert!(path.exists());

        std::fs::remove_dir_all(&temp_dir).ok();
    }

    #[tokio::test]
    async fn round_trip_preserves_options() {
        let temp_dir = create_temp_test_dir();
        let path = temp_dir.join("settings.yaml");

        let mut options = ConnectionOptions::default();
        options.general.management_url = Some("https://mgmt.example.com".to_string());
        options.up.block_inbound = true;
        options.up.network_monitor = Some(false);
        options.up.mtu = Some(1280);

        save_options(&path, &options).await.unwrap();
        let loaded = load_options(&path).await.unwrap();
        assert_eq!(loaded, options);

        std::fs::remove_dir_all(&temp_dir).ok();
    }

    #[tokio::test]
    async fn blank_strings_normalize_to_unset() {
        let temp_dir = create_temp_test_dir();
        let path = temp_dir.join("settings.yaml");

        std::fs::write(&path, "management_url: \"  \"\nhostname: peer-7\n").unwrap();

        let loaded = load_options(&path).await.unwrap();
        assert!(loaded.general.management_url.is_none());
        assert_eq!(loaded.general.hostname.as_deref(), Some("peer-7"));

        std::fs::remove_dir_all(&temp_dir).ok();
    }

    #[tokio::test]
    async fn corrupted_file_is_backed_up_and_replaced() {
        let temp_dir = create_temp_test_dir();
        let path = temp_dir.join("settings.yaml");

        std::fs::write(&path, "{not yaml: [").unwrap();

        let result = load_options(&path).await;
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("replaced with defaults")
        );
        assert!(path.with_extension("yaml.bak").exists());

        // the replacement file now loads cleanly
        let reloaded = load_options(&path).await.unwrap();
        assert_eq!(reloaded, ConnectionOptions::default());

        std::fs::remove_dir_all(&temp_dir).ok();
    }

    #[tokio::test]
    async fn unknown_log_level_fails_validation() {
        let temp_dir = create_temp_test_dir();
        let path = temp_dir.join("settings.yaml");

        std::fs::write(&path, "log_level: chatty\n").unwrap();

        let result = load_options(&path).await;
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Settings validation failed")
        );

        std::fs::remove_dir_all(&temp_dir).ok();
    }
}
