use crate::kernel::export::ExportFormat;
use crate::kernel::output::Channel;
use crate::kernel::services::ports::{GatewayError, InitReport, RunOutput, Theme};

/// Intents fed into [`crate::kernel::Store::dispatch`].
///
/// Variants carrying `buffer` hand over the UI's current edit buffer so the
/// store can flush it into the active file first.
#[derive(Debug, Clone)]
pub enum Action {
    InitializeRuntime,
    RuntimeInitialized(Result<InitReport, GatewayError>),

    CreateFile {
        name: String,
        buffer: String,
    },
    SwitchFile {
        name: String,
        buffer: String,
    },
    CloseFile {
        name: String,
    },
    RenameFile {
        from: String,
        to: String,
    },
    ImportFile {
        name: String,
        content: String,
    },
    BufferEdited {
        content: String,
    },
    SaveActive {
        buffer: String,
    },
    SaveAs {
        name: String,
        buffer: String,
    },
    Export {
        format: ExportFormat,
        buffer: String,
    },
    FormatActive {
        buffer: String,
    },
    ReplaceAll {
        buffer: String,
        needle: String,
        replacement: String,
    },
    ConfirmResolved {
        accepted: bool,
    },

    Submit {
        code: String,
    },
    RunActive {
        buffer: String,
    },
    Cancel,
    RunFinished {
        generation: u64,
        outcome: Result<RunOutput, GatewayError>,
    },
    TerminalCommand {
        line: String,
    },
    TerminalFinished {
        outcome: Result<RunOutput, GatewayError>,
    },
    InstallPackage {
        name: String,
    },
    PackageLoaded {
        name: String,
        result: Result<(), GatewayError>,
    },
    Debug,
    ClearOutput {
        channel: Channel,
    },

    CycleTheme,
    SetTheme(Theme),
    SetFontSize(u16),
    SetFontFamily(String),
    SetAutoSave(bool),
    ToggleWordWrap,
    ToggleMinimap,
}
