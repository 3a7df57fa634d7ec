use super::*;
use crate::kernel::export::ExportFormat;
use crate::kernel::output::{Channel, Severity};
use crate::kernel::services::ports::{GatewayError, InitReport, RunOutput, Settings, Theme};
use crate::kernel::session::{RunState, RuntimeStatus, SubmitError, NO_OUTPUT_MESSAGE};
use crate::kernel::state::{PendingAction, StatusKind};

fn new_store() -> Store {
    Store::new(EditorState::default())
}

fn ready_store() -> Store {
    let mut store = new_store();
    let result = store.dispatch(Action::InitializeRuntime);
    assert!(matches!(
        result.effects.as_slice(),
        [Effect::InitializeRuntime(_)]
    ));
    store.dispatch(Action::RuntimeInitialized(Ok(InitReport::default())));
    assert!(store.state().session.runtime().is_ready());
    store
}

fn run_generation(result: &DispatchResult) -> u64 {
    match result.effects.as_slice() {
        [Effect::RunCode { generation, .. }] => *generation,
        other => panic!("expected a single RunCode effect, got {other:?}"),
    }
}

fn console_texts(store: &Store) -> Vec<String> {
    store
        .state()
        .output
        .entries(Channel::Console)
        .iter()
        .map(|e| e.text.clone())
        .collect()
}

#[test]
fn initialize_is_single_flight_and_uses_runtime_config() {
    let mut store = new_store();
    let first = store.dispatch(Action::InitializeRuntime);
    assert_eq!(
        first.effects,
        vec![Effect::InitializeRuntime(store.state().runtime_config.clone())]
    );
    assert_eq!(store.state().status.kind, StatusKind::Loading);

    let second = store.dispatch(Action::InitializeRuntime);
    assert!(second.effects.is_empty());
    assert!(!second.state_changed);
}

#[test]
fn runtime_ready_reports_failed_eager_packages() {
    let mut store = new_store();
    store.dispatch(Action::InitializeRuntime);
    store.dispatch(Action::RuntimeInitialized(Ok(InitReport {
        loaded_packages: vec!["numpy".to_string()],
        failed_packages: vec![("pandas".to_string(), "no wheel".to_string())],
    })));

    assert_eq!(store.state().installed_packages, vec!["numpy".to_string()]);
    let entries = store.state().output.entries(Channel::Console);
    assert_eq!(entries[0].severity, Severity::Warning);
    assert!(entries[0].text.contains("pandas"));
    assert_eq!(entries[1].severity, Severity::Success);
    assert_eq!(store.state().status.message, "Ready");
}

#[test]
fn runtime_failure_is_reported_and_retryable() {
    let mut store = new_store();
    store.dispatch(Action::InitializeRuntime);
    store.dispatch(Action::RuntimeInitialized(Err(GatewayError::Init(
        "python3 not found".to_string(),
    ))));

    assert!(matches!(
        store.state().session.runtime(),
        RuntimeStatus::Failed(msg) if msg == "python3 not found"
    ));
    assert!(console_texts(&store)[0].contains("python3 not found"));
    assert_eq!(store.state().status.kind, StatusKind::Error);

    let retry = store.dispatch(Action::InitializeRuntime);
    assert_eq!(retry.effects.len(), 1);
}

#[test]
fn submit_before_ready_is_rejected_with_console_error() {
    let mut store = new_store();
    let result = store.dispatch(Action::Submit {
        code: "print(1)".to_string(),
    });
    assert_eq!(
        result.rejection,
        Some(Rejection::Submit(SubmitError::RuntimeNotReady))
    );
    assert!(result.state_changed);
    assert!(result.effects.is_empty());
    assert_eq!(store.state().output.len(Channel::Console), 1);
}

#[test]
fn run_active_flushes_buffer_and_runs_it() {
    let mut store = ready_store();
    let result = store.dispatch(Action::RunActive {
        buffer: "print('hi')".to_string(),
    });

    assert_eq!(
        result.effects,
        vec![Effect::RunCode {
            generation: 1,
            code: "print('hi')".to_string()
        }]
    );
    assert_eq!(store.state().files.active().content(), "print('hi')");
    assert!(store.state().session.is_running());
    assert_eq!(store.state().status.kind, StatusKind::Running);
}

#[test]
fn second_submit_while_running_is_rejected() {
    let mut store = ready_store();
    store.dispatch(Action::Submit {
        code: "a".to_string(),
    });
    let before = store.state().output.total_len();
    let result = store.dispatch(Action::Submit {
        code: "b".to_string(),
    });
    assert_eq!(
        result.rejection,
        Some(Rejection::Submit(SubmitError::AlreadyRunning))
    );
    assert!(!result.state_changed);
    assert_eq!(store.state().output.total_len(), before);
}

#[test]
fn run_finished_updates_status_with_duration() {
    let mut store = ready_store();
    let submitted = store.dispatch(Action::Submit {
        code: "x = 1".to_string(),
    });
    let generation = run_generation(&submitted);

    store.dispatch(Action::RunFinished {
        generation,
        outcome: Ok(RunOutput {
            success: true,
            stdout: String::new(),
            stderr: String::new(),
        }),
    });

    assert_eq!(store.state().session.state(), RunState::Succeeded);
    assert!(store
        .state()
        .status
        .message
        .starts_with("Execution completed in "));
    assert_eq!(console_texts(&store).last().unwrap(), NO_OUTPUT_MESSAGE);
}

#[test]
fn cancel_then_late_completion_leaves_output_alone() {
    let mut store = ready_store();
    let submitted = store.dispatch(Action::Submit {
        code: "while True: pass".to_string(),
    });
    let generation = run_generation(&submitted);

    let cancelled = store.dispatch(Action::Cancel);
    assert!(cancelled.state_changed);
    assert_eq!(store.state().session.state(), RunState::Stopped);
    let before = console_texts(&store);

    let late = store.dispatch(Action::RunFinished {
        generation,
        outcome: Ok(RunOutput {
            success: true,
            stdout: "late".to_string(),
            stderr: String::new(),
        }),
    });
    assert!(!late.state_changed);
    assert_eq!(console_texts(&store), before);
    assert_eq!(store.state().session.state(), RunState::Stopped);
}

#[test]
fn cancel_while_idle_is_rejected() {
    let mut store = ready_store();
    let result = store.dispatch(Action::Cancel);
    assert!(matches!(result.rejection, Some(Rejection::Cancel(_))));
}

#[test]
fn create_switches_to_new_file_after_flushing() {
    let mut store = new_store();
    let result = store.dispatch(Action::CreateFile {
        name: "utils".to_string(),
        buffer: "import utils".to_string(),
    });
    assert!(result.state_changed);
    assert_eq!(store.state().files.active_name(), "utils.py");
    assert_eq!(
        store.state().files.get("main.py").unwrap().content(),
        "import utils"
    );
    assert_eq!(store.state().status.message, "Created utils.py");
}

#[test]
fn duplicate_create_is_rejected_without_changes() {
    let mut store = new_store();
    let result = store.dispatch(Action::CreateFile {
        name: "main".to_string(),
        buffer: "lost".to_string(),
    });
    assert!(matches!(result.rejection, Some(Rejection::File(_))));
    assert!(!result.state_changed);
    assert_eq!(store.state().files.len(), 1);
    assert_eq!(store.state().files.active().content(), "");
}

#[test]
fn switch_round_trip_preserves_both_buffers() {
    let mut store = new_store();
    store.dispatch(Action::CreateFile {
        name: "b".to_string(),
        buffer: "x = 1".to_string(),
    });
    store.dispatch(Action::SwitchFile {
        name: "main.py".to_string(),
        buffer: "y = 2".to_string(),
    });

    let files = &store.state().files;
    assert_eq!(files.active().content(), "x = 1");
    assert_eq!(files.get("b.py").unwrap().content(), "y = 2");
}

#[test]
fn closing_dirty_file_asks_for_confirmation() {
    let mut store = new_store();
    store.dispatch(Action::CreateFile {
        name: "b".to_string(),
        buffer: String::new(),
    });
    store.dispatch(Action::BufferEdited {
        content: "draft".to_string(),
    });

    let result = store.dispatch(Action::CloseFile {
        name: "b.py".to_string(),
    });
    assert!(matches!(
        result.effects.as_slice(),
        [Effect::RequestConfirm { message }] if message.contains("b.py")
    ));
    assert!(store.state().confirm_dialog.visible);
    assert_eq!(
        store.state().confirm_dialog.on_confirm,
        Some(PendingAction::CloseFile {
            name: "b.py".to_string()
        })
    );
    assert!(store.state().files.contains("b.py"));

    store.dispatch(Action::ConfirmResolved { accepted: true });
    assert!(!store.state().files.contains("b.py"));
    assert_eq!(store.state().files.active_name(), "main.py");
    assert!(!store.state().confirm_dialog.visible);
}

#[test]
fn declined_confirmation_keeps_file() {
    let mut store = new_store();
    store.dispatch(Action::CreateFile {
        name: "b".to_string(),
        buffer: String::new(),
    });
    store.dispatch(Action::BufferEdited {
        content: "draft".to_string(),
    });
    store.dispatch(Action::CloseFile {
        name: "b.py".to_string(),
    });

    let result = store.dispatch(Action::ConfirmResolved { accepted: false });
    assert!(result.state_changed);
    assert!(store.state().files.contains("b.py"));
    assert!(store.state().confirm_dialog.on_confirm.is_none());
}

#[test]
fn closing_clean_file_needs_no_confirmation() {
    let mut store = new_store();
    store.dispatch(Action::CreateFile {
        name: "b".to_string(),
        buffer: String::new(),
    });
    let result = store.dispatch(Action::CloseFile {
        name: "b.py".to_string(),
    });
    assert!(result.effects.is_empty());
    assert!(!store.state().files.contains("b.py"));
}

#[test]
fn closing_last_file_is_rejected() {
    let mut store = new_store();
    let result = store.dispatch(Action::CloseFile {
        name: "main.py".to_string(),
    });
    assert!(matches!(result.rejection, Some(Rejection::File(_))));
}

#[test]
fn buffer_edits_only_flush_with_auto_save() {
    let mut store = new_store();
    store.dispatch(Action::SetAutoSave(false));
    let result = store.dispatch(Action::BufferEdited {
        content: "x".to_string(),
    });
    assert!(!result.state_changed);
    assert_eq!(store.state().files.active().content(), "");

    store.dispatch(Action::SetAutoSave(true));
    store.dispatch(Action::BufferEdited {
        content: "x".to_string(),
    });
    assert_eq!(store.state().files.active().content(), "x");
    assert!(store.state().files.active().is_dirty());
}

#[test]
fn import_over_dirty_file_requires_confirmation() {
    let mut store = new_store();
    store.dispatch(Action::BufferEdited {
        content: "mine".to_string(),
    });
    let result = store.dispatch(Action::ImportFile {
        name: "main.py".to_string(),
        content: "theirs".to_string(),
    });
    assert!(matches!(
        result.effects.as_slice(),
        [Effect::RequestConfirm { .. }]
    ));
    assert_eq!(store.state().files.active().content(), "mine");

    store.dispatch(Action::ConfirmResolved { accepted: true });
    assert_eq!(store.state().files.active().content(), "theirs");
    assert!(!store.state().files.active().is_dirty());
}

#[test]
fn import_new_file_keeps_active() {
    let mut store = new_store();
    store.dispatch(Action::ImportFile {
        name: "data.py".to_string(),
        content: "rows = []".to_string(),
    });
    assert_eq!(store.state().files.active_name(), "main.py");
    assert_eq!(store.state().status.message, "Loaded data.py");
}

#[test]
fn save_emits_download_and_clears_dirty() {
    let mut store = new_store();
    let result = store.dispatch(Action::SaveActive {
        buffer: "print(1)".to_string(),
    });
    match result.effects.as_slice() {
        [Effect::Download(artifact)] => {
            assert_eq!(artifact.file_name, "main.py");
            assert_eq!(artifact.body, "print(1)");
        }
        other => panic!("unexpected effects: {other:?}"),
    }
    assert!(!store.state().files.active().is_dirty());
    assert_eq!(store.state().status.message, "Saved main.py");
}

#[test]
fn save_as_renames_before_download() {
    let mut store = new_store();
    let result = store.dispatch(Action::SaveAs {
        name: "script.py".to_string(),
        buffer: "pass".to_string(),
    });
    assert!(matches!(
        result.effects.as_slice(),
        [Effect::Download(artifact)] if artifact.file_name == "script.py"
    ));
    assert_eq!(store.state().files.names(), vec!["script.py"]);
}

#[test]
fn export_console_dumps_console_channel() {
    let mut store = ready_store();
    let result = store.dispatch(Action::Export {
        format: ExportFormat::Console,
        buffer: String::new(),
    });
    match result.effects.as_slice() {
        [Effect::Download(artifact)] => {
            assert_eq!(artifact.file_name, "output.txt");
            assert!(artifact.body.contains("Python environment loaded"));
        }
        other => panic!("unexpected effects: {other:?}"),
    }
}

#[test]
fn export_html_names_artifact_after_file() {
    let mut store = new_store();
    let result = store.dispatch(Action::Export {
        format: ExportFormat::Html,
        buffer: "x < 1".to_string(),
    });
    assert!(matches!(
        result.effects.as_slice(),
        [Effect::Download(artifact)] if artifact.file_name == "main.html" && artifact.body.contains("x &lt; 1")
    ));
}

#[test]
fn format_and_replace_rewrite_active_file() {
    let mut store = new_store();
    store.dispatch(Action::FormatActive {
        buffer: "if x:\nprint(x)".to_string(),
    });
    assert_eq!(store.state().files.active().content(), "if x:\n    print(x)");

    let buffer = store.state().files.active().content().to_string();
    store.dispatch(Action::ReplaceAll {
        buffer,
        needle: "x".to_string(),
        replacement: "y".to_string(),
    });
    assert_eq!(store.state().files.active().content(), "if y:\n    print(y)");
    assert_eq!(
        store.state().status.message,
        "Replaced all occurrences of \"x\""
    );
}

#[test]
fn terminal_command_requires_ready_runtime() {
    let mut store = new_store();
    let result = store.dispatch(Action::TerminalCommand {
        line: "1 + 1".to_string(),
    });
    assert!(result.effects.is_empty());
    let last = store.state().output.last(Channel::Terminal).unwrap();
    assert_eq!(last.severity, Severity::Error);
}

#[test]
fn terminal_command_round_trip() {
    let mut store = ready_store();
    let result = store.dispatch(Action::TerminalCommand {
        line: "  1 + 1 ".to_string(),
    });
    assert_eq!(
        result.effects,
        vec![Effect::RunTerminalCommand {
            line: "1 + 1".to_string()
        }]
    );
    assert!(store.state().terminal_busy);

    let busy = store.dispatch(Action::TerminalCommand {
        line: "2".to_string(),
    });
    assert!(busy.effects.is_empty());

    store.dispatch(Action::TerminalFinished {
        outcome: Ok(RunOutput {
            success: true,
            stdout: "2\n".to_string(),
            stderr: String::new(),
        }),
    });
    assert!(!store.state().terminal_busy);
    let texts: Vec<_> = store
        .state()
        .output
        .entries(Channel::Terminal)
        .iter()
        .map(|e| e.text.as_str())
        .collect();
    assert_eq!(
        texts,
        vec![">>> 1 + 1", "Terminal is busy with the previous command", "2"]
    );
    // The terminal never touches the run state.
    assert_eq!(store.state().session.state(), RunState::Idle);
}

#[test]
fn blank_terminal_line_is_ignored() {
    let mut store = ready_store();
    let result = store.dispatch(Action::TerminalCommand {
        line: "   ".to_string(),
    });
    assert!(!result.state_changed);
    assert!(store.state().output.is_empty(Channel::Terminal));
}

#[test]
fn package_install_flow() {
    let mut store = ready_store();
    let result = store.dispatch(Action::InstallPackage {
        name: " requests ".to_string(),
    });
    assert_eq!(
        result.effects,
        vec![Effect::LoadPackage {
            name: "requests".to_string()
        }]
    );
    assert_eq!(store.state().pending_packages, vec!["requests".to_string()]);

    let duplicate = store.dispatch(Action::InstallPackage {
        name: "requests".to_string(),
    });
    assert!(duplicate.effects.is_empty());

    store.dispatch(Action::PackageLoaded {
        name: "requests".to_string(),
        result: Ok(()),
    });
    assert!(store.state().pending_packages.is_empty());
    assert_eq!(store.state().installed_packages, vec!["requests".to_string()]);
}

#[test]
fn package_failure_writes_console_error() {
    let mut store = ready_store();
    store.dispatch(Action::InstallPackage {
        name: "nope".to_string(),
    });
    store.dispatch(Action::PackageLoaded {
        name: "nope".to_string(),
        result: Err(GatewayError::Package {
            name: "nope".to_string(),
            message: "no matching distribution".to_string(),
        }),
    });
    assert_eq!(
        console_texts(&store).last().unwrap(),
        "Package installation error: no matching distribution"
    );
    assert_eq!(store.state().status.message, "Failed to install nope");
}

#[test]
fn clear_console_keeps_other_channels() {
    let mut store = ready_store();
    store.dispatch(Action::Debug);
    let result = store.dispatch(Action::ClearOutput {
        channel: Channel::Console,
    });
    assert!(result.state_changed);
    assert!(store.state().output.is_empty(Channel::Console));
    assert_eq!(store.state().output.len(Channel::Debug), 1);
    assert_eq!(store.state().status.message, "Console cleared");
}

#[test]
fn settings_changes_are_persisted() {
    let mut store = new_store();
    let result = store.dispatch(Action::CycleTheme);
    assert_eq!(store.state().settings.theme, Theme::Light);
    assert_eq!(
        result.effects,
        vec![Effect::PersistSettings(store.state().settings.clone())]
    );
    assert_eq!(store.state().status.message, "Switched to light theme");

    store.dispatch(Action::SetFontSize(200));
    assert_eq!(store.state().settings.font_size, 72);
    store.dispatch(Action::SetFontSize(1));
    assert_eq!(store.state().settings.font_size, 6);
}

#[test]
fn unchanged_settings_emit_nothing() {
    let mut store = new_store();
    let result = store.dispatch(Action::SetTheme(Settings::default().theme));
    assert!(result.effects.is_empty());
    assert!(!result.state_changed);

    let blank = store.dispatch(Action::SetFontFamily("  ".to_string()));
    assert!(blank.effects.is_empty());
}

fn store_with_dirty_files(names: &[&str]) -> Store {
    let mut store = new_store();
    for name in names {
        let buffer = store.state().files.active().content().to_string();
        store.dispatch(Action::CreateFile {
            name: name.to_string(),
            buffer,
        });
        store.dispatch(Action::BufferEdited {
            content: format!("draft of {name}"),
        });
    }
    store
}

#[test]
fn second_confirmation_is_rejected_while_first_is_pending() {
    let mut store = store_with_dirty_files(&["a", "b"]);

    let first = store.dispatch(Action::CloseFile {
        name: "a.py".to_string(),
    });
    assert_eq!(first.effects.len(), 1);

    let second = store.dispatch(Action::CloseFile {
        name: "b.py".to_string(),
    });
    assert_eq!(second.rejection, Some(Rejection::ConfirmPending));
    assert!(second.effects.is_empty());
    assert!(!second.state_changed);
    assert_eq!(
        store.state().confirm_dialog.on_confirm,
        Some(PendingAction::CloseFile {
            name: "a.py".to_string()
        })
    );

    // The answer applies to the dialog the user actually saw.
    store.dispatch(Action::ConfirmResolved { accepted: true });
    assert_eq!(store.state().files.names(), vec!["main.py", "b.py"]);

    let retry = store.dispatch(Action::CloseFile {
        name: "b.py".to_string(),
    });
    assert_eq!(retry.effects.len(), 1);
}

#[test]
fn import_over_dirty_file_waits_for_open_dialog() {
    let mut store = store_with_dirty_files(&["a"]);
    store.dispatch(Action::CloseFile {
        name: "a.py".to_string(),
    });

    let result = store.dispatch(Action::ImportFile {
        name: "a.py".to_string(),
        content: "replacement".to_string(),
    });
    assert_eq!(result.rejection, Some(Rejection::ConfirmPending));
    assert_eq!(
        store.state().files.get("a.py").unwrap().content(),
        "draft of a"
    );
}

#[test]
fn rejected_run_active_still_reports_the_flush() {
    let mut store = ready_store();
    store.dispatch(Action::Submit {
        code: "print(1)".to_string(),
    });

    let result = store.dispatch(Action::RunActive {
        buffer: "edited".to_string(),
    });
    assert_eq!(
        result.rejection,
        Some(Rejection::Submit(SubmitError::AlreadyRunning))
    );
    assert!(result.state_changed);
    assert_eq!(store.state().files.active().content(), "edited");
    assert!(store.state().files.active().is_dirty());
}

#[test]
fn rejected_run_active_with_unchanged_buffer_reports_nothing() {
    let mut store = ready_store();
    store.dispatch(Action::Submit {
        code: "print(1)".to_string(),
    });
    let result = store.dispatch(Action::RunActive {
        buffer: String::new(),
    });
    assert!(result.rejection.is_some());
    assert!(!result.state_changed);
}

#[test]
fn failed_save_as_still_reports_the_flush() {
    let mut store = new_store();
    store.dispatch(Action::CreateFile {
        name: "taken".to_string(),
        buffer: String::new(),
    });

    let result = store.dispatch(Action::SaveAs {
        name: "main.py".to_string(),
        buffer: "new text".to_string(),
    });
    assert!(matches!(
        result.rejection,
        Some(Rejection::File(FileStoreError::DuplicateName(_)))
    ));
    assert!(result.effects.is_empty());
    assert!(result.state_changed);
    assert_eq!(store.state().files.active_name(), "taken.py");
    assert_eq!(store.state().files.active().content(), "new text");
}
