use std::time::Instant;

use crate::kernel::output::{Channel, Severity};
use crate::kernel::services::ports::{GatewayError, InitReport, RunOutput};
use crate::kernel::state::StatusKind;
use crate::kernel::store::{DispatchResult, Rejection};
use crate::kernel::{Action, Effect};

const READY_BANNER: &str =
    "Python environment loaded successfully!\nReady to run Python code\nPress Ctrl+Enter to execute code";
const DEBUG_BANNER: &str = "Debug mode activated\nSet breakpoints by clicking line numbers";

impl crate::kernel::Store {
    pub(in crate::kernel::store) fn reduce_execution_action(
        &mut self,
        action: Action,
    ) -> DispatchResult {
        match action {
            Action::InitializeRuntime => {
                if !self.state.session.begin_initialize() {
                    return DispatchResult::unchanged();
                }
                self.state
                    .status
                    .set(StatusKind::Loading, "Initializing Python runtime...");
                DispatchResult::with_effect(Effect::InitializeRuntime(
                    self.state.runtime_config.clone(),
                ))
            }
            Action::RuntimeInitialized(result) => self.runtime_initialized(result),
            Action::Submit { code } => self.submit(code, false),
            Action::RunActive { buffer } => {
                let flushed = self.state.files.flush(&buffer);
                let code = self.state.files.active().content().to_string();
                self.submit(code, flushed)
            }
            Action::Cancel => match self.state.session.cancel(&mut self.state.output) {
                Ok(_) => {
                    self.state
                        .status
                        .set(StatusKind::Warning, "Execution stopped");
                    DispatchResult::changed(true)
                }
                Err(err) => DispatchResult::rejected(Rejection::Cancel(err), false),
            },
            Action::RunFinished {
                generation,
                outcome,
            } => {
                let applied = self.state.session.finish(
                    generation,
                    outcome,
                    &mut self.state.output,
                    Instant::now(),
                );
                if !applied {
                    return DispatchResult::unchanged();
                }
                match self.state.session.last_result() {
                    Some(result) if result.success => {
                        let message = format!("Execution completed in {}ms", result.duration_ms);
                        self.state.status.set(StatusKind::Success, message);
                    }
                    _ => self.state.status.set(StatusKind::Error, "Execution failed"),
                }
                DispatchResult::changed(true)
            }
            Action::TerminalCommand { line } => self.terminal_command(line),
            Action::TerminalFinished { outcome } => {
                self.state.terminal_busy = false;
                self.terminal_finished(outcome);
                DispatchResult::changed(true)
            }
            Action::InstallPackage { name } => self.install_package(name),
            Action::PackageLoaded { name, result } => {
                self.state.pending_packages.retain(|p| p != &name);
                match result {
                    Ok(()) => {
                        if !self.state.installed_packages.contains(&name) {
                            self.state.installed_packages.push(name.clone());
                        }
                        self.state.status.set(
                            StatusKind::Success,
                            format!("{} installed successfully", name),
                        );
                    }
                    Err(err) => {
                        tracing::warn!(package = %name, error = %err, "package install failed");
                        self.state
                            .status
                            .set(StatusKind::Error, format!("Failed to install {}", name));
                        self.state.output.append(
                            Channel::Console,
                            Severity::Error,
                            format!("Package installation error: {}", err.message()),
                        );
                    }
                }
                DispatchResult::changed(true)
            }
            Action::Debug => {
                self.state
                    .output
                    .append(Channel::Debug, Severity::Info, DEBUG_BANNER);
                DispatchResult::changed(true)
            }
            Action::ClearOutput { channel } => {
                let changed = self.state.output.clear(channel);
                if channel == Channel::Console {
                    self.state.status.set(StatusKind::Success, "Console cleared");
                }
                DispatchResult::changed(changed)
            }
            _ => DispatchResult::unchanged(),
        }
    }

    fn runtime_initialized(&mut self, result: Result<InitReport, GatewayError>) -> DispatchResult {
        match result {
            Ok(report) => {
                self.state.session.runtime_ready();
                for (name, message) in &report.failed_packages {
                    self.state.output.append(
                        Channel::Console,
                        Severity::Warning,
                        format!("Package {} failed to load: {}", name, message),
                    );
                }
                for name in report.loaded_packages {
                    if !self.state.installed_packages.contains(&name) {
                        self.state.installed_packages.push(name);
                    }
                }
                self.state
                    .output
                    .append(Channel::Console, Severity::Success, READY_BANNER);
                self.state.status.set(StatusKind::Normal, "Ready");
                tracing::info!("runtime ready");
            }
            Err(err) => {
                tracing::error!(error = %err, "runtime failed to initialize");
                self.state.session.runtime_failed(err.message());
                self.state.output.append(
                    Channel::Console,
                    Severity::Error,
                    format!(
                        "Failed to load Python environment: {}\n\nReload the runtime to try again.",
                        err.message()
                    ),
                );
                self.state.status.set(StatusKind::Error, "Runtime error");
            }
        }
        DispatchResult::changed(true)
    }

    fn submit(&mut self, code: String, flushed: bool) -> DispatchResult {
        let before = self.state.output.len(Channel::Console);
        match self
            .state
            .session
            .submit(&code, &mut self.state.output, Instant::now())
        {
            Ok(generation) => {
                self.state.status.set(StatusKind::Running, "Running code...");
                DispatchResult::with_effect(Effect::RunCode { generation, code })
            }
            Err(err) => {
                let output_changed = self.state.output.len(Channel::Console) != before;
                DispatchResult::rejected(Rejection::Submit(err), flushed || output_changed)
            }
        }
    }

    fn terminal_command(&mut self, line: String) -> DispatchResult {
        let line = line.trim().to_string();
        if line.is_empty() {
            return DispatchResult::unchanged();
        }
        if !self.state.session.runtime().is_ready() {
            self.state.output.append(
                Channel::Terminal,
                Severity::Error,
                "Python environment not loaded",
            );
            return DispatchResult::changed(true);
        }
        if self.state.terminal_busy {
            self.state.output.append(
                Channel::Terminal,
                Severity::Warning,
                "Terminal is busy with the previous command",
            );
            return DispatchResult::changed(true);
        }

        self.state
            .output
            .append(Channel::Terminal, Severity::Info, format!(">>> {}", line));
        self.state.terminal_busy = true;
        DispatchResult::with_effect(Effect::RunTerminalCommand { line })
    }

    fn terminal_finished(&mut self, outcome: Result<RunOutput, GatewayError>) {
        let output = &mut self.state.output;
        match outcome {
            Ok(result) => {
                let stdout = result.stdout.trim_end_matches('\n');
                if !stdout.is_empty() {
                    output.append(Channel::Terminal, Severity::Success, stdout);
                }
                let stderr = result.stderr.trim_end_matches('\n');
                if !stderr.is_empty() {
                    let severity = if result.success {
                        Severity::Warning
                    } else {
                        Severity::Error
                    };
                    output.append(Channel::Terminal, severity, stderr);
                }
            }
            Err(err) => {
                output.append(Channel::Terminal, Severity::Error, err.message());
            }
        }
    }

    fn install_package(&mut self, name: String) -> DispatchResult {
        let name = name.trim().to_string();
        if name.is_empty() || self.state.pending_packages.contains(&name) {
            return DispatchResult::unchanged();
        }
        if !self.state.session.runtime().is_ready() {
            self.state.output.append(
                Channel::Console,
                Severity::Error,
                "Python environment not loaded yet",
            );
            return DispatchResult::changed(true);
        }

        self.state.pending_packages.push(name.clone());
        self.state
            .status
            .set(StatusKind::Loading, format!("Installing {}...", name));
        DispatchResult::with_effect(Effect::LoadPackage { name })
    }
}
