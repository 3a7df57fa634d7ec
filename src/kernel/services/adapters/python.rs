//! `RuntimeGateway` backed by a long-lived python worker process.
//!
//! Protocol: one JSON request per line on a private copy of the worker's
//! stdin (`{"op": "exec" | "eval", "code": ...}`), one JSON `RunOutput` per
//! line back on a private copy of its original stdout. User code sees fd 0
//! as `/dev/null` and fd 1 redirected to stderr, so it can neither block on
//! nor corrupt either stream.
//! Requests are serialized; globals persist between runs.

use serde::Serialize;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex, OnceCell};

use crate::kernel::services::ports::{
    GatewayError, GatewayFuture, InitReport, RunOutput, RuntimeConfig, RuntimeGateway,
};

const WORKER_SCRIPT: &str = r#"
import io, json, os, sys, traceback

_requests = os.fdopen(os.dup(0), "r", encoding="utf-8")
_proto = os.fdopen(os.dup(1), "w", encoding="utf-8")
_null = os.open(os.devnull, os.O_RDONLY)
os.dup2(_null, 0)
os.close(_null)
os.dup2(2, 1)
_globals = {"__name__": "__main__", "__builtins__": __builtins__}

def _run(op, code):
    out, err = io.StringIO(), io.StringIO()
    saved = sys.stdin, sys.stdout, sys.stderr
    sys.stdin, sys.stdout, sys.stderr = io.StringIO(), out, err
    ok = True
    try:
        if op == "eval":
            try:
                compiled = compile(code, "<terminal>", "eval")
            except SyntaxError:
                exec(compile(code, "<terminal>", "exec"), _globals)
            else:
                value = eval(compiled, _globals)
                if value is not None:
                    out.write(repr(value) + "\n")
        else:
            exec(compile(code, "<main>", "exec"), _globals)
    except SystemExit as e:
        ok = e.code in (None, 0)
        if not ok:
            err.write("SystemExit: " + str(e.code) + "\n")
    except BaseException as e:
        ok = False
        err.write(str(e) + "\n" + traceback.format_exc())
    finally:
        sys.stdin, sys.stdout, sys.stderr = saved
    return {"success": ok, "stdout": out.getvalue(), "stderr": err.getvalue()}

for _line in _requests:
    _req = json.loads(_line)
    _proto.write(json.dumps(_run(_req.get("op", "exec"), _req.get("code", ""))) + "\n")
    _proto.flush()
"#;

#[derive(Serialize)]
struct WorkerRequest<'a> {
    op: &'a str,
    code: &'a str,
}

struct Worker {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Worker {
    async fn spawn(interpreter: &str) -> Result<Self, String> {
        let mut child = Command::new(interpreter)
            .arg("-u")
            .arg("-c")
            .arg(WORKER_SCRIPT)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("failed to start {}: {}", interpreter, e))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| "worker stdin unavailable".to_string())?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| "worker stdout unavailable".to_string())?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(stderr_loop(stderr));
        }

        tracing::info!(interpreter, pid = ?child.id(), "python worker started");
        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    async fn exchange(&mut self, op: &str, code: &str) -> Result<RunOutput, String> {
        let mut line = serde_json::to_string(&WorkerRequest { op, code })
            .map_err(|e| e.to_string())?;
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| format!("write to interpreter failed: {}", e))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| format!("write to interpreter failed: {}", e))?;

        let mut response = String::new();
        let read = self
            .stdout
            .read_line(&mut response)
            .await
            .map_err(|e| format!("read from interpreter failed: {}", e))?;
        if read == 0 {
            return Err("interpreter exited unexpectedly".to_string());
        }
        serde_json::from_str(response.trim_end())
            .map_err(|e| format!("malformed interpreter response: {}", e))
    }
}

struct Inner {
    config: OnceCell<RuntimeConfig>,
    worker: Mutex<Option<Worker>>,
}

impl Inner {
    async fn request(&self, op: &'static str, code: String) -> Result<RunOutput, GatewayError> {
        let config = self
            .config
            .get()
            .ok_or_else(|| GatewayError::Transport("runtime not initialized".to_string()))?;

        let mut guard = self.worker.lock().await;
        if guard.is_none() {
            let worker = Worker::spawn(&config.interpreter)
                .await
                .map_err(GatewayError::Transport)?;
            *guard = Some(worker);
        }
        let Some(worker) = guard.as_mut() else {
            return Err(GatewayError::Transport("python worker unavailable".to_string()));
        };

        let exchange = worker.exchange(op, &code);
        let result = match config.run_timeout_ms {
            Some(ms) => match tokio::time::timeout(Duration::from_millis(ms), exchange).await {
                Ok(result) => result,
                Err(_) => Err(format!("execution timed out after {}ms", ms)),
            },
            None => exchange.await,
        };

        result.map_err(|message| {
            // The worker state is unknown after a broken exchange; start fresh next time.
            if let Some(mut worker) = guard.take() {
                let _ = worker.child.start_kill();
            }
            tracing::error!(op, error = %message, "python worker failed");
            GatewayError::Transport(message)
        })
    }
}

#[derive(Clone)]
pub struct PythonGateway {
    inner: Arc<Inner>,
}

impl Default for PythonGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl PythonGateway {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                config: OnceCell::new(),
                worker: Mutex::new(None),
            }),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.config.initialized()
    }
}

impl RuntimeGateway for PythonGateway {
    fn initialize(&self, config: RuntimeConfig) -> GatewayFuture<InitReport> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            if inner.config.initialized() {
                return Ok(InitReport::default());
            }

            let config = inner
                .config
                .get_or_try_init(|| async {
                    let mut worker = Worker::spawn(&config.interpreter)
                        .await
                        .map_err(GatewayError::Init)?;
                    worker.exchange("exec", "").await.map_err(GatewayError::Init)?;
                    *inner.worker.lock().await = Some(worker);
                    Ok::<_, GatewayError>(config.clone())
                })
                .await?;

            let mut report = InitReport::default();
            for name in &config.eager_packages {
                match install_package(config, name).await {
                    Ok(()) => report.loaded_packages.push(name.clone()),
                    Err(err) => {
                        tracing::warn!(package = %name, error = %err, "eager package failed");
                        report
                            .failed_packages
                            .push((name.clone(), err.message().to_string()));
                    }
                }
            }
            Ok(report)
        })
    }

    fn run(&self, code: String) -> GatewayFuture<RunOutput> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move { inner.request("exec", code).await })
    }

    fn eval_line(&self, line: String) -> GatewayFuture<RunOutput> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move { inner.request("eval", line).await })
    }

    fn load_package(&self, name: String) -> GatewayFuture<()> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let Some(config) = inner.config.get() else {
                return Err(GatewayError::Package {
                    name,
                    message: "runtime not initialized".to_string(),
                });
            };
            install_package(config, &name).await
        })
    }
}

async fn install_package(config: &RuntimeConfig, name: &str) -> Result<(), GatewayError> {
    let mut cmd = Command::new(&config.interpreter);
    cmd.args(["-m", "pip", "install", "--disable-pip-version-check", "--quiet"]);
    if let Some(index) = &config.package_index_location {
        cmd.args(["--index-url", index.as_str()]);
    }
    cmd.arg(name)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = cmd.output().await.map_err(|e| GatewayError::Package {
        name: name.to_string(),
        message: e.to_string(),
    })?;
    if output.status.success() {
        tracing::info!(package = name, "package installed");
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let message = if stderr.is_empty() {
        format!("pip exited with {}", output.status)
    } else {
        stderr
    };
    Err(GatewayError::Package {
        name: name.to_string(),
        message,
    })
}

async fn stderr_loop(mut stderr: tokio::process::ChildStderr) {
    let mut buf = Vec::new();
    loop {
        let mut chunk = [0u8; 1024];
        let n = match stderr.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(_) => break,
        };
        buf.extend_from_slice(&chunk[..n]);
        while let Some(pos) = buf.iter().position(|b| *b == b'\n') {
            let line = String::from_utf8_lossy(&buf[..pos]).to_string();
            buf.drain(..=pos);
            if !line.trim().is_empty() {
                tracing::debug!("python: {}", line.trim_end());
            }
        }
    }
}
