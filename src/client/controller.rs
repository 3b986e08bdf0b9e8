//! Orchestrates builder, executor, and parsers into the toggle state
//! machine the UI layer drives.
//!
//! Public operations never error outward: every failure is folded into
//! the returned record or surfaced as a notification event. Writes
//! (connect, disconnect, select, deselect) are serialized through a
//! single guard; reads are skipped while a write is outstanding.

use crate::client::Executor;
use crate::client::command;
use crate::client::events::{ControllerEvent, Notification};
use crate::client::parser;
use crate::client::types::{
    ActionResult, CommandResult, ConnectionOptions, ConnectionState, ConnectionStatus,
    NetworkAction, NetworkListResult, ToggleIntent,
};
use crate::constants;
use crate::errors;
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const NOTIFY_TITLE: &str = "NetBird";
const LOGIN_TITLE: &str = "NetBird Login Required";

/// Timer windows driving the suppression state machine and the periodic
/// refresh. Injectable so suppression tests run in milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    pub disconnect_suppress_window: Duration,
    pub suppress_auto_clear: Duration,
    pub status_refresh_interval: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            disconnect_suppress_window: constants::DISCONNECT_SUPPRESS_WINDOW,
            suppress_auto_clear: constants::SUPPRESS_AUTO_CLEAR,
            status_refresh_interval: constants::STATUS_REFRESH_INTERVAL,
        }
    }
}

struct ControllerInner<E> {
    executor: E,
    options: ArcSwap<ConnectionOptions>,
    events: mpsc::UnboundedSender<ControllerEvent>,
    toggle_on: AtomicBool,
    operation_in_progress: AtomicBool,
    // shared with the clear timers it spawns
    suppress_network_errors: Arc<AtomicBool>,
    intent: std::sync::Mutex<ToggleIntent>,
    timings: Timings,
    shutdown: CancellationToken,
}

pub struct ConnectionController<E: Executor> {
    inner: Arc<ControllerInner<E>>,
}

// Manual impl: a derived Clone would demand E: Clone.
impl<E: Executor> Clone for ConnectionController<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Executor + 'static> ConnectionController<E> {
    pub fn new(
        executor: E,
        options: ConnectionOptions,
    ) -> (Self, mpsc::UnboundedReceiver<ControllerEvent>) {
        Self::with_timings(executor, options, Timings::default())
    }

    pub fn with_timings(
        executor: E,
        mut options: ConnectionOptions,
        timings: Timings,
    ) -> (Self, mpsc::UnboundedReceiver<ControllerEvent>) {
        options.normalize();
        let (events, events_rx) = mpsc::unbounded_channel();

        let inner = Arc::new(ControllerInner {
            executor,
            options: ArcSwap::from_pointee(options),
            events,
            toggle_on: AtomicBool::new(false),
            operation_in_progress: AtomicBool::new(false),
            suppress_network_errors: Arc::new(AtomicBool::new(false)),
            intent: std::sync::Mutex::new(ToggleIntent::Confirmed),
            timings,
            shutdown: CancellationToken::new(),
        });

        (Self { inner }, events_rx)
    }

    /// Swap in freshly loaded settings; the next operation picks them up.
    pub fn update_options(&self, mut options: ConnectionOptions) {
        options.normalize();
        self.inner.options.store(Arc::new(options));
    }

    pub fn options(&self) -> Arc<ConnectionOptions> {
        self.inner.options.load_full()
    }

    /// The underlying executor; tests reach the mock through this.
    pub fn executor(&self) -> &E {
        &self.inner.executor
    }

    /// UI-facing mirror of the toggle, updated from every status resync.
    pub fn is_enabled(&self) -> bool {
        self.inner.toggle_on.load(Ordering::SeqCst)
    }

    pub fn operation_in_progress(&self) -> bool {
        self.inner.operation_in_progress.load(Ordering::SeqCst)
    }

    pub fn suppression_active(&self) -> bool {
        self.inner.suppress_network_errors.load(Ordering::SeqCst)
    }

    pub fn toggle_intent(&self) -> ToggleIntent {
        *self.inner.intent.lock().unwrap()
    }

    /// Query daemon state, update the toggle mirror, and emit a
    /// `StatusChanged` event. Executor failure maps to an `Error` status;
    /// a prior error is never persisted and blocks nothing.
    pub async fn get_status(&self) -> ConnectionStatus {
        let options = self.inner.options.load_full();
        let status = self.inner.run_status(&options).await;
        self.inner.apply_status(&status);
        status
    }

    /// Periodic-poll variant of [`get_status`](Self::get_status): skipped
    /// outright while a write operation is outstanding.
    pub async fn refresh_status(&self) -> Option<ConnectionStatus> {
        if self.operation_in_progress() {
            tracing::debug!("Skipping status refresh: operation in progress");
            return None;
        }
        Some(self.get_status().await)
    }

    /// Dispatch one optimistic toggle request. `target` is the state the
    /// user clicked to; the returned intent tells the UI whether to keep
    /// or revert the switch.
    pub async fn toggle(&self, target: bool) -> ToggleIntent {
        if target {
            self.connect().await
        } else {
            self.disconnect().await
        }
    }

    pub async fn connect(&self) -> ToggleIntent {
        self.run_toggle_operation(true).await
    }

    pub async fn disconnect(&self) -> ToggleIntent {
        self.run_toggle_operation(false).await
    }

    async fn run_toggle_operation(&self, target: bool) -> ToggleIntent {
        let inner = &self.inner;

        if inner
            .operation_in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Toggle request rejected: operation already in progress");
            return ToggleIntent::Reverted;
        }

        *inner.intent.lock().unwrap() = ToggleIntent::Pending;
        inner.emit(ControllerEvent::StatusChanged(ConnectionStatus {
            state: ConnectionState::Loading,
            ..ConnectionStatus::default()
        }));

        if target {
            inner.handle_connect().await;
        } else {
            inner.handle_disconnect().await;
        }

        // The guard clears no matter how the operation went, and before
        // the resync so the status refresh is not skipped.
        inner.operation_in_progress.store(false, Ordering::SeqCst);

        // Never trust the attempted transition; re-read ground truth.
        let status = self.get_status().await;
        let resolved = if (status.state == ConnectionState::Connected) == target {
            ToggleIntent::Confirmed
        } else {
            ToggleIntent::Reverted
        };
        *inner.intent.lock().unwrap() = resolved;
        resolved
    }

    pub async fn list_networks(&self) -> NetworkListResult {
        if self.operation_in_progress() {
            tracing::debug!("Skipping networks refresh: operation in progress");
            return NetworkListResult {
                success: false,
                networks: Vec::new(),
                error: Some(errors::connection::OPERATION_IN_PROGRESS.to_string()),
            };
        }

        let options = self.inner.options.load_full();
        let argv = command::build_networks_list_command(&options.general);
        let result = self.inner.executor.execute(&argv).await;

        if !result.success {
            tracing::warn!("Networks list failed: {}", result.error_or_unknown());
            return NetworkListResult {
                success: false,
                networks: Vec::new(),
                error: result.error,
            };
        }

        NetworkListResult {
            success: true,
            networks: parser::parse_networks(&result.output),
            error: None,
        }
    }

    pub async fn select_network(&self, network_id: &str) -> ActionResult {
        self.toggle_network(NetworkAction::Select, network_id).await
    }

    pub async fn deselect_network(&self, network_id: &str) -> ActionResult {
        self.toggle_network(NetworkAction::Deselect, network_id)
            .await
    }

    async fn toggle_network(&self, action: NetworkAction, network_id: &str) -> ActionResult {
        let inner = &self.inner;

        if inner
            .operation_in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return ActionResult {
                success: false,
                error: Some(errors::connection::OPERATION_IN_PROGRESS.to_string()),
            };
        }

        let options = inner.options.load_full();
        let argv = command::build_networks_toggle_command(&options.general, action, network_id);
        let result = inner.executor.execute(&argv).await;

        inner.operation_in_progress.store(false, Ordering::SeqCst);

        if result.success {
            tracing::info!("Network \"{}\" {} succeeded", network_id, action);
        } else {
            inner.notify_error(errors::networks::toggle_failed(
                &action.to_string(),
                network_id,
                result.error_or_unknown(),
            ));
        }

        ActionResult::from(result)
    }

    /// Route one arriving system notification title through the
    /// suppression window. Returns true when the notification should be
    /// dismissed; the dismiss instruction itself is emitted one
    /// scheduling slot later.
    pub fn handle_system_notification(&self, title: &str) -> bool {
        let inner = &self.inner;

        if !inner.suppress_network_errors.load(Ordering::SeqCst) {
            return false;
        }
        if !title_matches_network_error(title) {
            return false;
        }

        tracing::info!("Suppressing network error notification: {}", title);

        let events = inner.events.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            let _ = events.send(ControllerEvent::DismissSystemNotification);
        });

        inner.schedule_suppression_clear(inner.timings.suppress_auto_clear);
        true
    }

    /// Start the hourly status re-poll. Runs until shutdown.
    pub fn start_periodic_refresh(&self) {
        let controller = self.clone();
        let token = self.inner.shutdown.clone();
        let interval = self.inner.timings.status_refresh_interval;

        tracing::debug!(
            "Periodic status refresh every {}",
            humantime::format_duration(interval)
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // the immediate first tick; initial status is the caller's job
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        controller.refresh_status().await;
                    }
                }
            }
        });
    }

    /// Stop waiting for the most recent in-flight invocation.
    pub fn cancel(&self) {
        self.inner.executor.cancel();
    }

    /// Tear down: cancels every pending timer and abandons any in-flight
    /// process. The controller is inert afterwards.
    pub fn shutdown(&self) {
        tracing::info!("Shutting down connection controller");
        self.inner.shutdown.cancel();
        self.inner.executor.cancel();
    }
}

impl<E: Executor + 'static> ControllerInner<E> {
    async fn run_status(&self, options: &ConnectionOptions) -> ConnectionStatus {
        let argv = command::build_status_command(&options.general);
        let result = self.executor.execute(&argv).await;

        if !result.success {
            tracing::warn!("Status check failed: {}", result.error_or_unknown());
            return ConnectionStatus::error(
                result
                    .error
                    .unwrap_or_else(|| errors::connection::STATUS_FAILED.to_string()),
            );
        }

        parser::parse_status(&result.output)
    }

    fn apply_status(&self, status: &ConnectionStatus) {
        self.toggle_on.store(
            status.state == ConnectionState::Connected,
            Ordering::SeqCst,
        );
        self.emit(ControllerEvent::StatusChanged(status.clone()));
    }

    async fn handle_connect(&self) {
        let options = self.options.load_full();

        // The login check must come first: when the daemon needs a login,
        // `up` prints the login URL instead of connecting.
        let status = self.run_status(&options).await;

        let argv = command::build_up_command(&options);
        let result = self.executor.execute(&argv).await;

        if status.state == ConnectionState::NeedsLogin {
            self.finish_login_connect(&result);
        } else if result.success {
            tracing::info!("Connect command completed successfully");
            self.notify_success(NOTIFY_TITLE, "Connected to NetBird");
        } else {
            self.notify_error(errors::connection::connect_failed(
                result.error_or_unknown(),
            ));
        }
    }

    fn finish_login_connect(&self, result: &CommandResult) {
        if !result.success {
            self.notify_error(errors::connection::connect_failed(
                result.error_or_unknown(),
            ));
            return;
        }

        if let Some(url) = find_login_url(&result.output) {
            self.notify_warning(
                LOGIN_TITLE,
                &format!("Please login in your browser:\n{}", url),
            );
        } else if result.output.contains("Connected") {
            self.notify_success(NOTIFY_TITLE, "Connected to NetBird");
        }
        // anything else: the resync decides what the UI shows
    }

    async fn handle_disconnect(&self) {
        // Tearing down the tunnel predictably produces a spurious
        // "connection failed" system notification; open the window before
        // the daemon can race us.
        self.suppress_network_errors.store(true, Ordering::SeqCst);

        let options = self.options.load_full();
        let argv = command::build_down_command(&options.general);
        let result = self.executor.execute(&argv).await;

        if result.success {
            tracing::info!("Disconnect command completed successfully");
            self.notify_success(NOTIFY_TITLE, "Disconnected from NetBird");
            self.schedule_suppression_clear(self.timings.disconnect_suppress_window);
        } else {
            // A real failure must surface; never swallow the next error.
            self.suppress_network_errors.store(false, Ordering::SeqCst);
            self.notify_error(errors::connection::disconnect_failed(
                result.error_or_unknown(),
            ));
        }
    }

    fn schedule_suppression_clear(&self, window: Duration) {
        let flag = Arc::clone(&self.suppress_network_errors);
        let token = self.shutdown.clone();

        tracing::debug!(
            "Suppression window clears in {}",
            humantime::format_duration(window)
        );

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(window) => {
                    flag.store(false, Ordering::SeqCst);
                }
            }
        });
    }

    fn notify_success(&self, title: &str, body: &str) {
        self.emit(ControllerEvent::Notify(Notification::Success {
            title: title.to_string(),
            body: body.to_string(),
        }));
    }

    fn notify_warning(&self, title: &str, body: &str) {
        self.emit(ControllerEvent::Notify(Notification::Warning {
            title: title.to_string(),
            body: body.to_string(),
        }));
    }

    fn notify_error(&self, body: String) {
        self.emit(ControllerEvent::Notify(Notification::Error { body }));
    }

    fn emit(&self, event: ControllerEvent) {
        // a dropped receiver just means nobody is rendering
        let _ = self.events.send(event);
    }
}

/// First `http(s)://` URL in the text, the way the login prompt prints it.
fn find_login_url(output: &str) -> Option<String> {
    let start = output.find("https://").or_else(|| output.find("http://"))?;
    let rest = &output[start..];
    let end = rest
        .find(char::is_whitespace)
        .unwrap_or(rest.len());
    let url = &rest[..end];

    let authority = url.split_once("://").map(|(_, rest)| rest)?;
    if authority.is_empty() {
        return None;
    }
    Some(url.to_string())
}

fn title_matches_network_error(title: &str) -> bool {
    let title = title.to_lowercase();
    (title.contains("connection") && title.contains("failed"))
        || (title.contains("network") && title.contains("failed"))
        || title.contains("disconnected")
}
