pub mod command;
pub mod controller;
pub mod events;
pub mod mock_executor;
pub mod parser;
pub mod process;
pub mod settings;
pub mod types;

use std::future::Future;
use types::CommandResult;

/// Seam between the controller and the external process layer.
///
/// Implementations must fold every failure into the returned
/// [`CommandResult`] instead of erroring; the controller relies on
/// `execute` being infallible at the type level.
pub trait Executor: Send + Sync {
    /// Run one built argv as a child process and capture its outcome.
    fn execute(&self, argv: &[String]) -> impl Future<Output = CommandResult> + Send;

    /// Abort the most recent in-flight invocation, if any. Idempotent.
    fn cancel(&self);
}
