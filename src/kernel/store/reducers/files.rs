use crate::kernel::export::{self, ExportArtifact, ExportFormat};
use crate::kernel::files::FileStoreError;
use crate::kernel::format;
use crate::kernel::state::{PendingAction, StatusKind};
use crate::kernel::store::{DispatchResult, Rejection};
use crate::kernel::{Action, Effect};

impl crate::kernel::Store {
    pub(in crate::kernel::store) fn reduce_file_action(&mut self, action: Action) -> DispatchResult {
        match action {
            Action::CreateFile { name, buffer } => {
                let created = match self.state.files.create(&name) {
                    Ok(id) => id,
                    Err(err) => return reject_file(err),
                };
                let created_name = self
                    .state
                    .files
                    .file(created)
                    .map(|f| f.name().to_string())
                    .unwrap_or_default();
                if let Err(err) = self.state.files.switch_to(&created_name, &buffer) {
                    return reject_file(err);
                }
                self.state
                    .status
                    .set(StatusKind::Success, format!("Created {}", created_name));
                DispatchResult::changed(true)
            }
            Action::SwitchFile { name, buffer } => {
                if name == self.state.files.active_name() {
                    return DispatchResult::changed(self.state.files.flush(&buffer));
                }
                match self.state.files.switch_to(&name, &buffer) {
                    Ok(_) => DispatchResult::changed(true),
                    Err(err) => reject_file(err),
                }
            }
            Action::CloseFile { name } => {
                let Some(file) = self.state.files.get(&name) else {
                    return reject_file(FileStoreError::NotFound(name));
                };
                if self.state.files.len() <= 1 {
                    return reject_file(FileStoreError::LastFile);
                }
                if file.is_dirty() {
                    let message = format!("File {} has unsaved changes. Close anyway?", name);
                    return self.request_confirm(message, PendingAction::CloseFile { name });
                }
                self.close_file(&name)
            }
            Action::RenameFile { from, to } => match self.state.files.rename(&from, &to) {
                Ok(()) => DispatchResult::changed(from != to.trim()),
                Err(err) => reject_file(err),
            },
            Action::ImportFile { name, content } => {
                let dirty = self
                    .state
                    .files
                    .get(&name)
                    .map(|f| f.is_dirty())
                    .unwrap_or(false);
                if dirty {
                    let message = format!(
                        "File {} has unsaved changes. Replace it with the imported content?",
                        name
                    );
                    return self.request_confirm(message, PendingAction::ImportFile { name, content });
                }
                self.import_file(&name, content)
            }
            Action::BufferEdited { content } => {
                if !self.state.settings.auto_save {
                    return DispatchResult::unchanged();
                }
                DispatchResult::changed(self.state.files.flush(&content))
            }
            Action::SaveActive { buffer } => {
                self.state.files.flush(&buffer);
                self.save_active()
            }
            Action::SaveAs { name, buffer } => {
                let flushed = self.state.files.flush(&buffer);
                let current = self.state.files.active_name().to_string();
                if let Err(err) = self.state.files.rename(&current, &name) {
                    return reject_file_after(err, flushed);
                }
                self.save_active()
            }
            Action::Export { format, buffer } => {
                self.state.files.flush(&buffer);
                let artifact = match format {
                    ExportFormat::Raw => return self.save_active(),
                    ExportFormat::Html => {
                        let file = self.state.files.active();
                        self.state.status.set(
                            StatusKind::Success,
                            format!("Exported {} as HTML", file.name()),
                        );
                        export::export_html(file)
                    }
                    ExportFormat::Console => {
                        self.state
                            .status
                            .set(StatusKind::Success, "Output downloaded");
                        export::export_console(&self.state.output)
                    }
                };
                download(artifact)
            }
            Action::FormatActive { buffer } => {
                self.state.files.flush(&buffer);
                let formatted = format::format_code(self.state.files.active().content());
                self.state.files.set_active_content(formatted);
                self.state.status.set(StatusKind::Success, "Code formatted");
                DispatchResult::changed(true)
            }
            Action::ReplaceAll {
                buffer,
                needle,
                replacement,
            } => {
                let flushed = self.state.files.flush(&buffer);
                let Some(replaced) =
                    format::replace_all(self.state.files.active().content(), &needle, &replacement)
                else {
                    return DispatchResult::changed(flushed);
                };
                self.state.files.set_active_content(replaced);
                self.state.status.set(
                    StatusKind::Success,
                    format!("Replaced all occurrences of \"{}\"", needle),
                );
                DispatchResult::changed(true)
            }
            Action::ConfirmResolved { accepted } => {
                let pending = self.state.confirm_dialog.on_confirm.take();
                let was_visible = self.state.confirm_dialog.visible;
                self.state.confirm_dialog.visible = false;
                self.state.confirm_dialog.message.clear();

                match (accepted, pending) {
                    (true, Some(PendingAction::CloseFile { name })) => self.close_file(&name),
                    (true, Some(PendingAction::ImportFile { name, content })) => {
                        self.import_file(&name, content)
                    }
                    _ => DispatchResult::changed(was_visible),
                }
            }
            _ => DispatchResult::unchanged(),
        }
    }

    fn request_confirm(&mut self, message: String, pending: PendingAction) -> DispatchResult {
        let dialog = &mut self.state.confirm_dialog;
        if dialog.visible {
            tracing::warn!(
                pending = ?dialog.on_confirm,
                "confirmation rejected: another one is pending"
            );
            return DispatchResult::rejected(Rejection::ConfirmPending, false);
        }
        dialog.visible = true;
        dialog.message = message.clone();
        dialog.on_confirm = Some(pending);
        DispatchResult::with_effect(Effect::RequestConfirm { message })
    }

    fn close_file(&mut self, name: &str) -> DispatchResult {
        match self.state.files.close(name) {
            Ok(()) => DispatchResult::changed(true),
            Err(err) => reject_file(err),
        }
    }

    fn import_file(&mut self, name: &str, content: String) -> DispatchResult {
        match self.state.files.import_content(name, content) {
            Ok(_) => {
                self.state
                    .status
                    .set(StatusKind::Success, format!("Loaded {}", name.trim()));
                DispatchResult::changed(true)
            }
            Err(err) => reject_file(err),
        }
    }

    fn save_active(&mut self) -> DispatchResult {
        let artifact = export::export_raw(self.state.files.active());
        self.state.files.mark_saved(&artifact.file_name);
        self.state
            .status
            .set(StatusKind::Success, format!("Saved {}", artifact.file_name));
        download(artifact)
    }
}

fn reject_file(err: FileStoreError) -> DispatchResult {
    reject_file_after(err, false)
}

/// `flushed`: the edit buffer was already written before the check failed.
fn reject_file_after(err: FileStoreError, flushed: bool) -> DispatchResult {
    tracing::warn!(error = %err, "file operation rejected");
    DispatchResult::rejected(Rejection::File(err), flushed)
}

fn download(artifact: ExportArtifact) -> DispatchResult {
    DispatchResult::with_effect(Effect::Download(artifact))
}
