use crate::kernel::files::FileStore;
use crate::kernel::output::OutputSink;
use crate::kernel::services::ports::{RuntimeConfig, Settings};
use crate::kernel::session::ExecutionSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusKind {
    #[default]
    Normal,
    Loading,
    Running,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub message: String,
    pub kind: StatusKind,
}

impl Default for StatusLine {
    fn default() -> Self {
        Self {
            message: "Ready".to_string(),
            kind: StatusKind::Normal,
        }
    }
}

impl StatusLine {
    pub fn set(&mut self, kind: StatusKind, message: impl Into<String>) {
        self.kind = kind;
        self.message = message.into();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    CloseFile { name: String },
    ImportFile { name: String, content: String },
}

#[derive(Debug, Clone, Default)]
pub struct ConfirmDialogState {
    pub visible: bool,
    pub message: String,
    pub on_confirm: Option<PendingAction>,
}

/// Everything the host owns about one editor window.
#[derive(Debug)]
pub struct EditorState {
    pub files: FileStore,
    pub session: ExecutionSession,
    pub output: OutputSink,
    pub settings: Settings,
    pub runtime_config: RuntimeConfig,
    pub status: StatusLine,
    pub installed_packages: Vec<String>,
    pub pending_packages: Vec<String>,
    pub terminal_busy: bool,
    pub confirm_dialog: ConfirmDialogState,
}

impl EditorState {
    pub fn new(settings: Settings, runtime_config: RuntimeConfig) -> Self {
        Self {
            files: FileStore::new(),
            session: ExecutionSession::new(),
            output: OutputSink::new(),
            settings,
            runtime_config,
            status: StatusLine::default(),
            installed_packages: Vec::new(),
            pending_packages: Vec::new(),
            terminal_busy: false,
            confirm_dialog: ConfirmDialogState::default(),
        }
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new(Settings::default(), RuntimeConfig::default())
    }
}
