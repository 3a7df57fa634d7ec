//! Everything between `Store` and the outside world.
//!
//! - `ports`: gateway contract and persisted config types, no IO.
//! - `bus` / `host`: run gateway effects and feed completions back as actions.
//! - `adapters` (`host` feature): tokio runtime, python worker, settings file.

#[cfg(feature = "host")]
pub mod adapters;
pub mod bus;
pub mod host;
pub mod ports;

pub use bus::{kernel_bus, KernelBusReceiver, KernelBusSender, KernelMessage};
pub use host::{KernelServiceContext, KernelServiceHost};
