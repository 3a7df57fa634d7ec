//! Async runtime adapter: a tokio runtime the kernel host spawns gateway work on.

mod async_runtime;

pub use async_runtime::{AsyncRuntime, TokioExecutor};
