use std::fmt;

use super::files::FileStoreError;
use super::session::{CancelError, SubmitError};
use super::{Action, EditorState, Effect};

mod reducers;

/// A precondition the dispatched action violated. The operation itself did
/// not happen; `DispatchResult::state_changed` still reports side effects
/// that ran before the check (buffer flush, diagnostic output entry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    File(FileStoreError),
    Submit(SubmitError),
    Cancel(CancelError),
    /// Another confirmation is still waiting for its answer.
    ConfirmPending,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::File(err) => err.fmt(f),
            Rejection::Submit(err) => err.fmt(f),
            Rejection::Cancel(err) => err.fmt(f),
            Rejection::ConfirmPending => write!(f, "a confirmation is already pending"),
        }
    }
}

impl std::error::Error for Rejection {}

#[derive(Debug, Default)]
pub struct DispatchResult {
    pub effects: Vec<Effect>,
    pub state_changed: bool,
    pub rejection: Option<Rejection>,
}

impl DispatchResult {
    fn unchanged() -> Self {
        Self::default()
    }

    fn changed(state_changed: bool) -> Self {
        Self {
            state_changed,
            ..Self::default()
        }
    }

    fn with_effect(effect: Effect) -> Self {
        Self {
            effects: vec![effect],
            state_changed: true,
            rejection: None,
        }
    }

    fn rejected(rejection: Rejection, state_changed: bool) -> Self {
        Self {
            effects: Vec::new(),
            state_changed,
            rejection: Some(rejection),
        }
    }
}

/// Single typed entry point into the editor core.
///
/// `dispatch` is synchronous and never performs IO; suspension points are
/// handed back as effects and their completions re-enter as actions.
pub struct Store {
    state: EditorState,
}

impl Store {
    pub fn new(state: EditorState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn dispatch(&mut self, action: Action) -> DispatchResult {
        match action {
            Action::CreateFile { .. }
            | Action::SwitchFile { .. }
            | Action::CloseFile { .. }
            | Action::RenameFile { .. }
            | Action::ImportFile { .. }
            | Action::BufferEdited { .. }
            | Action::SaveActive { .. }
            | Action::SaveAs { .. }
            | Action::Export { .. }
            | Action::FormatActive { .. }
            | Action::ReplaceAll { .. }
            | Action::ConfirmResolved { .. } => self.reduce_file_action(action),

            Action::CycleTheme
            | Action::SetTheme(_)
            | Action::SetFontSize(_)
            | Action::SetFontFamily(_)
            | Action::SetAutoSave(_)
            | Action::ToggleWordWrap
            | Action::ToggleMinimap => self.reduce_settings_action(action),

            Action::InitializeRuntime
            | Action::RuntimeInitialized(_)
            | Action::Submit { .. }
            | Action::RunActive { .. }
            | Action::Cancel
            | Action::RunFinished { .. }
            | Action::TerminalCommand { .. }
            | Action::TerminalFinished { .. }
            | Action::InstallPackage { .. }
            | Action::PackageLoaded { .. }
            | Action::Debug
            | Action::ClearOutput { .. } => self.reduce_execution_action(action),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/store.rs"]
mod tests;
