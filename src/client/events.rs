use crate::client::types::ConnectionStatus;

/// What the core wants the host layer to show. The host renders these; the
/// core only decides content and severity.
#[derive(Debug, Clone)]
pub enum Notification {
    Success { title: String, body: String },
    Warning { title: String, body: String },
    Error { body: String },
}

/// Upward event stream from the controller to the UI layer.
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    StatusChanged(ConnectionStatus),
    Notify(Notification),
    /// A suppressed system notification should be destroyed. Emitted one
    /// scheduling slot after the handler that matched it returned, so the
    /// host's own delivery bookkeeping is never raced.
    DismissSystemNotification,
}
