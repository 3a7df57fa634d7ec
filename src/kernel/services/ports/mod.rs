//! Service ports: traits + data contracts.

pub mod runtime;
pub mod settings;

pub use runtime::{
    AsyncExecutor, BoxFuture, GatewayError, GatewayFuture, InitReport, RunOutput, RuntimeConfig,
    RuntimeGateway,
};
pub use settings::{Settings, Theme};
