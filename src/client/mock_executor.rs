//! Scripted executor for tests and mock-mode runs: no real process is
//! ever spawned. Responses are served from a queue; when the queue is
//! empty a plausible canned response is synthesized from the argv.

use crate::client::Executor;
use crate::client::types::CommandResult;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub struct MockExecutor {
    responses: Mutex<VecDeque<CommandResult>>,
    invocations: Mutex<Vec<Vec<String>>>,
    delay: Option<Duration>,
    cancel_count: AtomicUsize,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            invocations: Mutex::new(Vec::new()),
            delay: None,
            cancel_count: AtomicUsize::new(0),
        }
    }

    /// Every execution sleeps this long first, so tests can hold an
    /// invocation in flight.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    pub fn push_response(&self, response: CommandResult) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn push_success(&self, output: &str) {
        self.push_response(CommandResult {
            success: true,
            output: output.to_string(),
            error: None,
        });
    }

    pub fn push_failure(&self, error: &str) {
        self.push_response(CommandResult::failure(error));
    }

    /// Every argv executed so far, in order.
    pub fn invocations(&self) -> Vec<Vec<String>> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancel_count.load(Ordering::SeqCst)
    }

    fn canned_response(argv: &[String]) -> CommandResult {
        let has = |token: &str| argv.iter().any(|arg| arg == token);

        let output = if has("status") {
            "Daemon status: Connected\nManagement: Connected\nSignal: Connected\n\
             NetBird IP: 100.64.0.1\nFQDN: mock.netbird.cloud\n"
                .to_string()
        } else if has("networks") && has("list") {
            "Available Networks:\n\n- ID: mock-office\n  Network: 10.0.0.0/24\n  Status: Selected\n\
             \n- ID: mock-lab\n  Domains: lab.internal\n  Status: Not Selected\n  Resolved IPs: -\n"
                .to_string()
        } else if has("up") {
            "Connected\n".to_string()
        } else {
            String::new()
        };

        CommandResult {
            success: true,
            output,
            error: None,
        }
    }
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for MockExecutor {
    async fn execute(&self, argv: &[String]) -> CommandResult {
        tracing::debug!("MOCK: executing {}", argv.join(" "));
        self.invocations.lock().unwrap().push(argv.to_vec());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.responses.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Self::canned_response(argv))
    }

    fn cancel(&self) {
        self.cancel_count.fetch_add(1, Ordering::SeqCst);
    }
}
