//! runpad - multi-file scratchpad that runs buffers through an embedded interpreter.
//!
//! Module layout:
//! - kernel: headless core (FileStore, OutputSink, ExecutionSession, Store)
//! - kernel::services::ports: contracts (RuntimeGateway, Settings)
//! - kernel::services::adapters: tokio runtime, python gateway, settings on disk

pub mod kernel;
