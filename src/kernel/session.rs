//! One-run-at-a-time execution state machine.
//!
//! Transitions:
//! - `Idle | Succeeded | Failed | Stopped` --submit--> `Running`
//! - `Running` --finish(ok)--> `Succeeded` / `Failed`
//! - `Running` --cancel--> `Stopped`
//!
//! Each accepted submit bumps the generation; a completion is applied only
//! when it carries the current generation and the session is still running.

use std::fmt;
use std::time::Instant;

use super::output::{Channel, OutputSink, Severity};
use super::services::ports::{GatewayError, RunOutput};

pub const EXECUTING_MESSAGE: &str = "Executing code...";
pub const NO_OUTPUT_MESSAGE: &str = "Code executed successfully (no output)";
pub const STOPPED_MESSAGE: &str = "Execution stopped by user";
pub const EMPTY_INPUT_MESSAGE: &str = "No code to run";
pub const NOT_READY_MESSAGE: &str = "Python environment not loaded yet. Please wait...";
pub const INIT_FAILED_MESSAGE: &str = "Python environment failed to load. Reload the runtime to try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
    Stopped,
}

impl RunState {
    pub fn label(self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Succeeded => "succeeded",
            RunState::Failed => "failed",
            RunState::Stopped => "stopped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RuntimeStatus {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    Failed(String),
}

impl RuntimeStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, RuntimeStatus::Ready)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    RuntimeNotReady,
    AlreadyRunning,
    EmptyInput,
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::RuntimeNotReady => write!(f, "runtime is not ready"),
            SubmitError::AlreadyRunning => write!(f, "a run is already in progress"),
            SubmitError::EmptyInput => write!(f, "nothing to run"),
        }
    }
}

impl std::error::Error for SubmitError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelError {
    NotRunning,
}

impl fmt::Display for CancelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelError::NotRunning => write!(f, "no run in progress"),
        }
    }
}

impl std::error::Error for CancelError {}

#[derive(Debug, Default)]
pub struct ExecutionSession {
    state: RunState,
    runtime: RuntimeStatus,
    generation: u64,
    started_at: Option<Instant>,
    last_result: Option<ExecutionResult>,
}

impl ExecutionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn runtime(&self) -> &RuntimeStatus {
        &self.runtime
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_result(&self) -> Option<&ExecutionResult> {
        self.last_result.as_ref()
    }

    /// Returns false when the runtime is already up or on its way.
    pub fn begin_initialize(&mut self) -> bool {
        match self.runtime {
            RuntimeStatus::Ready | RuntimeStatus::Initializing => false,
            RuntimeStatus::Uninitialized | RuntimeStatus::Failed(_) => {
                self.runtime = RuntimeStatus::Initializing;
                true
            }
        }
    }

    pub fn runtime_ready(&mut self) {
        self.runtime = RuntimeStatus::Ready;
    }

    pub fn runtime_failed(&mut self, message: impl Into<String>) {
        self.runtime = RuntimeStatus::Failed(message.into());
    }

    pub fn submit(
        &mut self,
        code: &str,
        sink: &mut OutputSink,
        now: Instant,
    ) -> Result<u64, SubmitError> {
        if self.state == RunState::Running {
            tracing::warn!(generation = self.generation, "submit rejected: already running");
            return Err(SubmitError::AlreadyRunning);
        }

        match &self.runtime {
            RuntimeStatus::Ready => {}
            RuntimeStatus::Failed(_) => {
                sink.append(Channel::Console, Severity::Error, INIT_FAILED_MESSAGE);
                return Err(SubmitError::RuntimeNotReady);
            }
            RuntimeStatus::Uninitialized | RuntimeStatus::Initializing => {
                sink.append(Channel::Console, Severity::Error, NOT_READY_MESSAGE);
                return Err(SubmitError::RuntimeNotReady);
            }
        }

        if code.trim().is_empty() {
            sink.append(Channel::Console, Severity::Warning, EMPTY_INPUT_MESSAGE);
            return Err(SubmitError::EmptyInput);
        }

        self.generation += 1;
        self.state = RunState::Running;
        self.started_at = Some(now);
        sink.append(Channel::Console, Severity::Info, EXECUTING_MESSAGE);
        tracing::debug!(generation = self.generation, "run started");
        Ok(self.generation)
    }

    /// Applies a gateway completion. Returns false for stale generations.
    pub fn finish(
        &mut self,
        generation: u64,
        outcome: Result<RunOutput, GatewayError>,
        sink: &mut OutputSink,
        now: Instant,
    ) -> bool {
        if generation != self.generation || self.state != RunState::Running {
            tracing::warn!(
                generation,
                current = self.generation,
                state = self.state.label(),
                "discarding stale run result"
            );
            return false;
        }

        let duration_ms = self
            .started_at
            .take()
            .map(|start| now.saturating_duration_since(start).as_millis() as u64)
            .unwrap_or_default();

        let result = match outcome {
            Ok(output) if output.success => {
                if !output.stdout.is_empty() {
                    sink.append(Channel::Console, Severity::Success, output.stdout.as_str());
                }
                // Captured diagnostics on a successful run are a warning, not a failure.
                if !output.stderr.is_empty() {
                    sink.append(Channel::Console, Severity::Warning, output.stderr.as_str());
                }
                if output.stdout.is_empty() && output.stderr.is_empty() {
                    sink.append(Channel::Console, Severity::Success, NO_OUTPUT_MESSAGE);
                }
                self.state = RunState::Succeeded;
                ExecutionResult {
                    success: true,
                    stdout: output.stdout,
                    stderr: output.stderr,
                    duration_ms,
                }
            }
            Ok(output) => {
                if !output.stdout.is_empty() {
                    sink.append(Channel::Console, Severity::Info, output.stdout.as_str());
                }
                sink.append(
                    Channel::Console,
                    Severity::Error,
                    format!("Error:\n{}", output.stderr),
                );
                self.state = RunState::Failed;
                ExecutionResult {
                    success: false,
                    stdout: output.stdout,
                    stderr: output.stderr,
                    duration_ms,
                }
            }
            Err(err) => {
                tracing::error!(generation, error = %err, "gateway failed during run");
                let message = err.message().to_string();
                sink.append(
                    Channel::Console,
                    Severity::Error,
                    format!("Runtime Error: {}", message),
                );
                self.state = RunState::Failed;
                ExecutionResult {
                    success: false,
                    stdout: String::new(),
                    stderr: message,
                    duration_ms,
                }
            }
        };

        tracing::debug!(
            generation,
            duration_ms,
            state = self.state.label(),
            "run finished"
        );
        self.last_result = Some(result);
        true
    }

    /// Advisory stop: the gateway keeps running, its late result is dropped.
    pub fn cancel(&mut self, sink: &mut OutputSink) -> Result<u64, CancelError> {
        if self.state != RunState::Running {
            return Err(CancelError::NotRunning);
        }
        self.state = RunState::Stopped;
        self.started_at = None;
        sink.append(Channel::Console, Severity::Warning, STOPPED_MESSAGE);
        tracing::debug!(generation = self.generation, "run cancelled");
        Ok(self.generation)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/session.rs"]
mod tests;
