use crate::client::Executor;
use crate::client::types::CommandResult;
use crate::errors;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Mutex;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Runs built argv lists as child processes of the local netbird binary.
///
/// A single cancellation handle is tracked at a time: starting a new
/// invocation replaces the slot, cancelling the previous handle first so
/// an abandoned wait releases its child (`kill_on_drop`). Failures never
/// escape `execute`; every one is folded into the returned
/// [`CommandResult`].
pub struct CommandExecutor {
    binary_override: Option<PathBuf>,
    current: Mutex<Option<CancellationToken>>,
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self {
            binary_override: None,
            current: Mutex::new(None),
        }
    }

    /// Runs commands through an explicit binary path instead of resolving
    /// `netbird` from PATH. The argv keeps `netbird` as its first element
    /// for logging either way.
    pub fn with_binary(path: PathBuf) -> Self {
        Self {
            binary_override: Some(path),
            current: Mutex::new(None),
        }
    }

    fn begin_invocation(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let mut slot = self.current.lock().unwrap();
        if let Some(previous) = slot.replace(token.clone()) {
            previous.cancel();
        }
        token
    }

    fn map_spawn_error(&self, program: &str, error: &std::io::Error) -> String {
        let message = error.to_string();
        if message.contains("No such file or directory") || message.contains("cannot find the path")
        {
            errors::binary::not_found(program)
        } else if message.contains("Permission denied") {
            errors::binary::permission_denied(program)
        } else {
            errors::process::spawn_failed(&message)
        }
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for CommandExecutor {
    async fn execute(&self, argv: &[String]) -> CommandResult {
        let Some((program, args)) = argv.split_first() else {
            return CommandResult::failure(errors::process::spawn_failed("empty command line"));
        };

        let token = self.begin_invocation();

        let program_path = self
            .binary_override
            .clone()
            .unwrap_or_else(|| PathBuf::from(program));

        tracing::debug!("Executing: {}", argv.join(" "));

        let mut command = Command::new(&program_path);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                let diagnostic =
                    self.map_spawn_error(&program_path.display().to_string(), &e);
                tracing::error!("{}", diagnostic);
                return CommandResult::failure(diagnostic);
            }
        };

        tokio::select! {
            _ = token.cancelled() => {
                tracing::info!("Cancelled in-flight command: {}", argv.join(" "));
                CommandResult::failure(errors::process::CANCELLED)
            }
            result = child.wait_with_output() => match result {
                Ok(output) => {
                    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                    let success = output.status.success();

                    if !success {
                        tracing::warn!(
                            "Command failed ({}): {}",
                            output.status,
                            argv.join(" ")
                        );
                    }

                    let error = if !stderr.is_empty() {
                        Some(stderr)
                    } else if !success {
                        Some(errors::process::non_zero_exit(&output.status.to_string()))
                    } else {
                        None
                    };

                    CommandResult {
                        success,
                        output: stdout,
                        error,
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to collect command output: {}", e);
                    CommandResult::failure(errors::process::wait_failed(&e.to_string()))
                }
            }
        }
    }

    fn cancel(&self) {
        let mut slot = self.current.lock().unwrap();
        if let Some(token) = slot.take() {
            token.cancel();
        }
    }
}
