use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;

pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

pub type GatewayFuture<T> = Pin<Box<dyn Future<Output = Result<T, GatewayError>> + Send + 'static>>;

pub trait AsyncExecutor: Send + Sync {
    fn spawn(&self, task: BoxFuture);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_index_location: Option<String>,
    #[serde(default)]
    pub eager_packages: Vec<String>,
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    /// External watchdog applied by the adapter; the session itself never times out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_timeout_ms: Option<u64>,
}

fn default_interpreter() -> String {
    "python3".to_string()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            package_index_location: None,
            eager_packages: Vec::new(),
            interpreter: default_interpreter(),
            run_timeout_ms: None,
        }
    }
}

/// What the interpreter reports for one piece of code.
///
/// In-language exceptions arrive here as `success == false` with the
/// formatted trace in `stderr`, never as a `GatewayError`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutput {
    pub success: bool,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    pub loaded_packages: Vec<String>,
    pub failed_packages: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    Init(String),
    Transport(String),
    Package { name: String, message: String },
}

impl GatewayError {
    pub fn message(&self) -> &str {
        match self {
            GatewayError::Init(msg) | GatewayError::Transport(msg) => msg,
            GatewayError::Package { message, .. } => message,
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Init(msg) => write!(f, "runtime initialization failed: {}", msg),
            GatewayError::Transport(msg) => write!(f, "runtime transport failure: {}", msg),
            GatewayError::Package { name, message } => {
                write!(f, "failed to load package {}: {}", name, message)
            }
        }
    }
}

impl std::error::Error for GatewayError {}

/// Boundary between the kernel and an embedded interpreter.
///
/// Every call is a suspension point; the returned futures own whatever
/// state they need so they can be spawned on any executor.
pub trait RuntimeGateway: Send + Sync {
    /// Idempotent once it has succeeded.
    fn initialize(&self, config: RuntimeConfig) -> GatewayFuture<InitReport>;

    fn run(&self, code: String) -> GatewayFuture<RunOutput>;

    /// Runs a single interactive line; expression values are echoed to stdout.
    fn eval_line(&self, line: String) -> GatewayFuture<RunOutput> {
        self.run(line)
    }

    fn load_package(&self, name: String) -> GatewayFuture<()>;
}
