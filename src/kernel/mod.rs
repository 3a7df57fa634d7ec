//! Headless editor core (state/action/effect).

pub mod action;
pub mod effect;
pub mod export;
pub mod files;
pub mod format;
pub mod output;
pub mod services;
pub mod session;
pub mod state;
pub mod store;

pub use action::Action;
pub use effect::Effect;
pub use export::{ExportArtifact, ExportFormat};
pub use files::{File, FileId, FileStore, FileStoreError};
pub use output::{Channel, OutputEntry, OutputSink, Severity};
pub use session::{
    CancelError, ExecutionResult, ExecutionSession, RunState, RuntimeStatus, SubmitError,
};
pub use state::{ConfirmDialogState, EditorState, PendingAction, StatusKind, StatusLine};
pub use store::{DispatchResult, Rejection, Store};
