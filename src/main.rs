// NetBird Manager
// Entry point for the application

mod client;
mod constants;
mod errors;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::Executor;
use client::controller::ConnectionController;
use client::events::{ControllerEvent, Notification};
use client::mock_executor::MockExecutor;
use client::process::CommandExecutor;
use client::settings;
use client::types::{ConnectionState, ConnectionStatus, NetworkEntry};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "netbird_manager")]
#[command(about = "NetBird Manager - desktop control client for the netbird daemon")]
struct Args {
    #[arg(long, help = "Path to settings file")]
    settings: Option<PathBuf>,

    #[arg(long, help = "Path to netbird binary")]
    netbird_path: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Print the current connection status
    Status,
    /// Connect to NetBird
    Up,
    /// Disconnect from NetBird
    Down,
    /// Inspect and toggle routable networks
    Networks {
        #[command(subcommand)]
        action: NetworksCommand,
    },
    /// Run as a long-lived toggle service: initial status, hourly
    /// refresh, live settings reload, Ctrl+C to exit
    Watch,
}

#[derive(Subcommand, Debug)]
enum NetworksCommand {
    List,
    Select { id: String },
    Deselect { id: String },
}

fn setup_tracing(service_mode: bool) -> Result<()> {
    let log_directory = constants::default_log_directory();
    std::fs::create_dir_all(&log_directory).context(errors::logs::FAILED_TO_CREATE_DIR)?;

    let file_appender = tracing_appender::rolling::daily(&log_directory, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if service_mode {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(non_blocking).json())
            .with(fmt::layer().json().with_writer(std::io::stdout))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(non_blocking).json())
            .init();
    }

    std::mem::forget(_guard);

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    setup_tracing(matches!(args.command, CliCommand::Watch))
        .context("Failed to initialize tracing")?;

    tracing::info!("{} starting", constants::APP_TITLE);

    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    // Get executable directory for relative path resolution
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()));

    let settings_path = args.settings.unwrap_or_else(|| match &exe_dir {
        Some(dir) => dir.join("netbird_settings.yaml"),
        None => PathBuf::from("netbird_settings.yaml"),
    });

    tracing::info!("Settings path: {}", settings_path.display());

    let options = runtime
        .block_on(settings::load_options(&settings_path))
        .unwrap_or_else(|e| {
            tracing::error!("Failed to load settings: {}, using defaults", e);
            client::types::ConnectionOptions::default()
        });
    let no_browser = options.up.no_browser;

    let use_mock = std::env::var("NETBIRD_MANAGER_MOCK").is_ok();

    if use_mock {
        tracing::info!("Running in MOCK mode - no real processes will be spawned");
        let (controller, events) = ConnectionController::new(MockExecutor::new(), options);
        return runtime.block_on(run(controller, events, args.command, settings_path, no_browser));
    }

    let executor = match args.netbird_path {
        Some(path) => {
            anyhow::ensure!(
                path.exists(),
                errors::binary::not_found(&path.display().to_string())
            );
            CommandExecutor::with_binary(path)
        }
        None => CommandExecutor::new(),
    };

    let (controller, events) = ConnectionController::new(executor, options);
    runtime.block_on(run(controller, events, args.command, settings_path, no_browser))
}

async fn run<E: Executor + 'static>(
    controller: ConnectionController<E>,
    mut events: mpsc::UnboundedReceiver<ControllerEvent>,
    command: CliCommand,
    settings_path: PathBuf,
    no_browser: bool,
) -> Result<()> {
    match command {
        CliCommand::Status => {
            let status = controller.get_status().await;
            print_status(&status);
        }
        CliCommand::Up => {
            let intent = controller.connect().await;
            drain_events(&mut events, no_browser);
            println!("Connect: {}", intent);
        }
        CliCommand::Down => {
            let intent = controller.disconnect().await;
            drain_events(&mut events, no_browser);
            println!("Disconnect: {}", intent);
        }
        CliCommand::Networks { action } => match action {
            NetworksCommand::List => {
                let result = controller.list_networks().await;
                if !result.success {
                    println!(
                        "Failed to list networks: {}",
                        result.error.as_deref().unwrap_or("unknown error")
                    );
                } else if result.networks.is_empty() {
                    println!("No networks available");
                } else {
                    for network in &result.networks {
                        print_network(network);
                    }
                }
            }
            NetworksCommand::Select { id } => {
                let result = controller.select_network(&id).await;
                drain_events(&mut events, no_browser);
                if result.success {
                    println!("Selected network \"{}\"", id);
                }
            }
            NetworksCommand::Deselect { id } => {
                let result = controller.deselect_network(&id).await;
                drain_events(&mut events, no_browser);
                if result.success {
                    println!("Deselected network \"{}\"", id);
                }
            }
        },
        CliCommand::Watch => {
            watch(&controller, &mut events, settings_path, no_browser).await?;
        }
    }

    controller.shutdown();
    Ok(())
}

async fn watch<E: Executor + 'static>(
    controller: &ConnectionController<E>,
    events: &mut mpsc::UnboundedReceiver<ControllerEvent>,
    settings_path: PathBuf,
    no_browser: bool,
) -> Result<()> {
    let status = controller.get_status().await;
    tracing::info!("Initial state: {}", status.state);

    controller.start_periodic_refresh();

    let mut settings_changes = settings::watch_settings_file(settings_path.clone())?;

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => tracing::info!("Ctrl+C received, shutting down"),
                    Err(e) => tracing::error!("Error listening for Ctrl+C: {}", e),
                }
                break;
            }
            Some(event) = events.recv() => {
                render_event(event, no_browser);
            }
            Some(change) = settings_changes.recv() => {
                match change {
                    Ok(_) => match settings::load_options(&settings_path).await {
                        Ok(options) => {
                            tracing::info!("Settings file changed, reloading");
                            controller.update_options(options);
                        }
                        Err(e) => tracing::error!("Settings reload failed: {}", e),
                    },
                    Err(e) => tracing::warn!("Settings watcher error: {}", e),
                }
            }
        }
    }

    Ok(())
}

fn drain_events(events: &mut mpsc::UnboundedReceiver<ControllerEvent>, no_browser: bool) {
    while let Ok(event) = events.try_recv() {
        render_event(event, no_browser);
    }
}

fn render_event(event: ControllerEvent, no_browser: bool) {
    match event {
        ControllerEvent::StatusChanged(status) => {
            if status.state != ConnectionState::Loading {
                tracing::info!("State changed: {}", status.state);
            }
        }
        ControllerEvent::Notify(notification) => render_notification(notification, no_browser),
        ControllerEvent::DismissSystemNotification => {
            // headless runs have no system notification to destroy
            tracing::debug!("Dismiss instruction for suppressed system notification");
        }
    }
}

fn render_notification(notification: Notification, no_browser: bool) {
    match notification {
        Notification::Success { title, body } => {
            tracing::info!("{}: {}", title, body);
            println!("{}", body);
        }
        Notification::Warning { title, body } => {
            tracing::warn!("{}: {}", title, body);
            println!("{}: {}", title, body);

            // the login prompt carries its URL on the last line
            if let Some(url) = body.lines().last().filter(|l| l.starts_with("http")) {
                if no_browser {
                    return;
                }
                match open::that(url) {
                    Ok(()) => tracing::info!("Opened login URL in browser"),
                    Err(e) => tracing::warn!("Failed to open browser: {}", e),
                }
            }
        }
        Notification::Error { body } => {
            tracing::error!("{}", body);
            eprintln!("{}", body);
        }
    }
}

fn print_status(status: &ConnectionStatus) {
    println!("State:      {}", status.state);
    if !status.management.is_empty() {
        println!("Management: {}", status.management);
    }
    if !status.signal.is_empty() {
        println!("Signal:     {}", status.signal);
    }
    if !status.ip.is_empty() {
        println!("NetBird IP: {}", status.ip);
    }
    if !status.fqdn.is_empty() {
        println!("FQDN:       {}", status.fqdn);
    }
    if let Some(ref message) = status.error_message {
        println!("Error:      {}", message);
    }
}

fn print_network(network: &NetworkEntry) {
    let marker = if network.selected { "*" } else { " " };
    let description = network
        .domains
        .as_deref()
        .or(network.network.as_deref())
        .unwrap_or("");
    if description.is_empty() {
        println!("[{}] {}", marker, network.id);
    } else {
        println!("[{}] {}  ({})", marker, network.id, description);
    }
    if let Some(ref ips) = network.resolved_ips {
        println!("      resolved: {}", ips);
    }
}
