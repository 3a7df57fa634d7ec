use crate::kernel::state::StatusKind;
use crate::kernel::store::DispatchResult;
use crate::kernel::{Action, Effect};

const MIN_FONT_SIZE: u16 = 6;
const MAX_FONT_SIZE: u16 = 72;

impl crate::kernel::Store {
    pub(in crate::kernel::store) fn reduce_settings_action(
        &mut self,
        action: Action,
    ) -> DispatchResult {
        let prev = self.state.settings.clone();
        let settings = &mut self.state.settings;

        match action {
            Action::CycleTheme => {
                settings.theme = settings.theme.next();
                let message = format!("Switched to {} theme", settings.theme.label());
                self.state.status.set(StatusKind::Success, message);
            }
            Action::SetTheme(theme) => settings.theme = theme,
            Action::SetFontSize(size) => {
                settings.font_size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
            }
            Action::SetFontFamily(family) => {
                let family = family.trim();
                if !family.is_empty() {
                    settings.font_family = family.to_string();
                }
            }
            Action::SetAutoSave(enabled) => settings.auto_save = enabled,
            Action::ToggleWordWrap => settings.word_wrap = !settings.word_wrap,
            Action::ToggleMinimap => settings.minimap = !settings.minimap,
            _ => {}
        }

        if self.state.settings == prev {
            return DispatchResult::unchanged();
        }
        DispatchResult::with_effect(Effect::PersistSettings(self.state.settings.clone()))
    }
}
