use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::Duration;

use runpad::kernel::services::adapters::{self, AsyncRuntime, PythonGateway, TokioExecutor};
use runpad::kernel::services::{KernelBusSender, KernelMessage, KernelServiceHost};
use runpad::kernel::{
    Action, Channel, EditorState, Effect, ExportArtifact, ExportFormat, RunState, RuntimeStatus,
    Severity, Store,
};

mod logging;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

const USAGE: &str = "usage: runpad [--terminal] [--install PKG]... [--save-output] [--verbose] FILE...";

#[derive(Debug, Default)]
struct CliArgs {
    files: Vec<PathBuf>,
    packages: Vec<String>,
    terminal: bool,
    save_output: bool,
    verbose: bool,
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<CliArgs, String> {
    let mut parsed = CliArgs::default();
    let mut args = args;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--terminal" | "-t" => parsed.terminal = true,
            "--save-output" => parsed.save_output = true,
            "--verbose" | "-v" => parsed.verbose = true,
            "--install" | "-i" => {
                let name = args
                    .next()
                    .ok_or_else(|| "--install needs a package name".to_string())?;
                parsed.packages.push(name);
            }
            "--help" | "-h" => return Err(String::new()),
            other if other.starts_with('-') => return Err(format!("unknown option: {other}")),
            other => parsed.files.push(PathBuf::from(other)),
        }
    }
    if parsed.files.is_empty() && !parsed.terminal {
        return Err("no input files".to_string());
    }
    Ok(parsed)
}

struct App {
    store: Store,
    host: KernelServiceHost,
    printed: [usize; 3],
    shutdown: bool,
}

impl App {
    fn dispatch(&mut self, action: Action) {
        let result = self.store.dispatch(action);
        if let Some(rejection) = &result.rejection {
            tracing::warn!(%rejection, "action rejected");
        }
        for effect in self.host.execute(result.effects) {
            self.handle_ui_effect(effect);
        }
        self.flush_output();
    }

    fn handle_ui_effect(&mut self, effect: Effect) {
        match effect {
            Effect::RequestConfirm { message } => {
                tracing::info!(%message, "confirmation auto-accepted");
                self.dispatch(Action::ConfirmResolved { accepted: true });
            }
            Effect::Download(artifact) => {
                if let Err(e) = write_artifact(&artifact) {
                    eprintln!("failed to write {}: {}", artifact.file_name, e);
                }
            }
            Effect::PersistSettings(settings) => {
                if let Err(e) = adapters::save_settings(&settings) {
                    tracing::warn!(error = %e, "failed to persist settings");
                }
            }
            other => tracing::warn!(?other, "unhandled effect"),
        }
    }

    fn pump_until(&mut self, done: impl Fn(&EditorState) -> bool) {
        while !self.shutdown && !done(self.store.state()) {
            match self.host.recv_timeout(POLL_INTERVAL) {
                Ok(KernelMessage::Action(action)) => self.dispatch(action),
                Ok(KernelMessage::Shutdown) => self.shutdown = true,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn flush_output(&mut self) {
        let output = &self.store.state().output;
        let stdout = io::stdout();
        let stderr = io::stderr();
        let mut out = stdout.lock();
        let mut err = stderr.lock();

        for (slot, channel) in Channel::ALL.into_iter().enumerate() {
            let entries = output.entries(channel);
            let start = self.printed[slot].min(entries.len());
            for entry in &entries[start..] {
                let line = match channel {
                    Channel::Terminal => entry.text.clone(),
                    _ => entry.display_line(),
                };
                let _ = match entry.severity {
                    Severity::Warning | Severity::Error => writeln!(err, "{}", line),
                    Severity::Info | Severity::Success => writeln!(out, "{}", line),
                };
            }
            self.printed[slot] = entries.len();
        }
        let _ = out.flush();
    }

    fn active_buffer(&self) -> String {
        self.store.state().files.active().content().to_string()
    }
}

fn write_artifact(artifact: &ExportArtifact) -> io::Result<()> {
    std::fs::write(Path::new(&artifact.file_name), &artifact.body)
}

#[cfg(unix)]
fn install_signals(bus: KernelBusSender) -> io::Result<()> {
    use signal_hook::consts::signal::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    std::thread::spawn(move || {
        let mut interrupted = false;
        for sig in signals.forever() {
            // First Ctrl-C stops the run; a second one, or SIGTERM, leaves.
            let sent = if sig == SIGINT && !interrupted {
                interrupted = true;
                bus.send_action(Action::Cancel)
            } else {
                bus.send_shutdown()
            };
            if sent.is_err() {
                break;
            }
        }
    });
    Ok(())
}

#[cfg(not(unix))]
fn install_signals(_bus: KernelBusSender) -> io::Result<()> {
    Ok(())
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            if !message.is_empty() {
                eprintln!("{message}");
            }
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    let logging = logging::init(args.verbose);
    if args.verbose {
        if let Some(guard) = &logging {
            eprintln!("logs: {}", guard.log_dir().display());
        }
    }

    let runtime = match AsyncRuntime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };
    let executor = Arc::new(TokioExecutor::new(runtime.tokio_handle()));
    let gateway = Arc::new(PythonGateway::new());
    let state = EditorState::new(adapters::load_settings(), adapters::load_runtime_config());

    let mut app = App {
        store: Store::new(state),
        host: KernelServiceHost::new(executor, gateway),
        printed: [0; 3],
        shutdown: false,
    };
    if let Err(e) = install_signals(app.host.sender()) {
        tracing::warn!(error = %e, "signal handlers unavailable");
    }

    for path in &args.files {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("failed to read {}: {}", path.display(), e);
                return ExitCode::from(2);
            }
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        app.dispatch(Action::ImportFile {
            name: name.clone(),
            content,
        });
        let buffer = app.active_buffer();
        app.dispatch(Action::SwitchFile { name, buffer });
    }

    app.dispatch(Action::InitializeRuntime);
    app.pump_until(|state| !matches!(state.session.runtime(), RuntimeStatus::Initializing));
    if !app.store.state().session.runtime().is_ready() {
        return ExitCode::FAILURE;
    }

    for name in &args.packages {
        app.dispatch(Action::InstallPackage { name: name.clone() });
    }
    app.pump_until(|state| state.pending_packages.is_empty());

    if args.terminal {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            app.dispatch(Action::TerminalCommand { line });
            app.pump_until(|state| !state.terminal_busy);
            if app.shutdown {
                break;
            }
        }
    } else {
        let buffer = app.active_buffer();
        app.dispatch(Action::RunActive { buffer });
        app.pump_until(|state| !state.session.is_running());
    }

    if args.save_output {
        let buffer = app.active_buffer();
        app.dispatch(Action::Export {
            format: ExportFormat::Console,
            buffer,
        });
    }

    match app.store.state().session.state() {
        RunState::Succeeded => ExitCode::SUCCESS,
        RunState::Idle if args.terminal => ExitCode::SUCCESS,
        RunState::Stopped => ExitCode::from(130),
        _ => ExitCode::FAILURE,
    }
}

#[cfg(test)]
#[path = "../tests/unit/cli_args.rs"]
mod tests;
