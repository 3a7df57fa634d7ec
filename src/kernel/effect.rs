use crate::kernel::export::ExportArtifact;
use crate::kernel::services::ports::{RuntimeConfig, Settings};

/// Work the store asks its host to perform. Gateway effects report back
/// through the kernel bus as the matching completion [`crate::kernel::Action`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    InitializeRuntime(RuntimeConfig),
    RunCode { generation: u64, code: String },
    RunTerminalCommand { line: String },
    LoadPackage { name: String },
    RequestConfirm { message: String },
    Download(ExportArtifact),
    PersistSettings(Settings),
}
