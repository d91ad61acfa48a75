//! User intents and their dispatch into the app.

use crate::app::{App, EditField};
use crate::export;
use crate::menu::{
    ID_AMBIENT_TOGGLE, ID_AUTO_START_TOGGLE, ID_CLEAR_LOG, ID_EDIT_CYCLE, ID_EDIT_TIME, ID_EXPORT,
    ID_QUIT, ID_RESET, ID_SET_TASK, ID_SOUND_TOGGLE, ID_THEME_TOGGLE, ID_TOGGLE,
};
use crate::models::{parse_config_duration, Mode};
use crate::prompt::Prompter;
use std::path::PathBuf;

/// A discrete user action, independent of the widget that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    ToggleTimer,
    Reset,
    SwitchMode(Mode),
    Edit(EditField),
    DeleteLogEntry(usize),
    ClearLog,
    ExportLog,
    ToggleTheme,
    ToggleAutoStart,
    ToggleSound,
    ToggleAmbientNoise,
    /// Volume in percent.
    SetAmbientVolume(u8),
    SetDuration(Mode, u32),
    CustomDuration(Mode),
    SetLongBreakInterval(u32),
    Quit,
}

impl Intent {
    /// Maps a menu item id to an intent. Unknown ids map to nothing.
    pub fn from_menu_id(id: &str) -> Option<Self> {
        let intent = match id {
            ID_TOGGLE => Self::ToggleTimer,
            ID_RESET => Self::Reset,
            ID_EDIT_TIME => Self::Edit(EditField::RemainingTime),
            ID_EDIT_CYCLE => Self::Edit(EditField::CycleCount),
            ID_SET_TASK => Self::Edit(EditField::TaskName),
            ID_CLEAR_LOG => Self::ClearLog,
            ID_EXPORT => Self::ExportLog,
            ID_THEME_TOGGLE => Self::ToggleTheme,
            ID_AUTO_START_TOGGLE => Self::ToggleAutoStart,
            ID_SOUND_TOGGLE => Self::ToggleSound,
            ID_AMBIENT_TOGGLE => Self::ToggleAmbientNoise,
            ID_QUIT => Self::Quit,
            _ => return Self::from_parameterized_id(id),
        };
        Some(intent)
    }

    fn from_parameterized_id(id: &str) -> Option<Self> {
        let (prefix, arg) = id.split_once('_')?;
        match prefix {
            "mode" => Mode::from_key(arg).map(Self::SwitchMode),
            "vol" => arg.parse::<u8>().ok().filter(|v| *v <= 100).map(Self::SetAmbientVolume),
            "interval" => arg
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .map(Self::SetLongBreakInterval),
            "logtask" => arg.parse().ok().map(|i| Self::Edit(EditField::LogTask(i))),
            "logduration" => arg.parse().ok().map(|i| Self::Edit(EditField::LogDuration(i))),
            "logdelete" => arg.parse().ok().map(Self::DeleteLogEntry),
            _ => {
                let mode = Mode::from_key(prefix)?;
                match arg {
                    "custom" => Some(Self::CustomDuration(mode)),
                    mins => mins
                        .parse::<u32>()
                        .ok()
                        .map(|m| Self::SetDuration(mode, m.saturating_mul(60))),
                }
            }
        }
    }
}

/// Result of dispatching an intent.
#[derive(Debug, Clone, PartialEq)]
pub enum EventResult {
    /// Nothing visible changed.
    Continue,
    /// User requested quit.
    Quit,
    /// Timer state changed, menu needs update.
    StateChanged,
    /// Settings, theme or log changed, menu needs rebuild.
    Rebuild,
    /// Ambient noise settings changed.
    AmbientChanged,
    /// Export finished; `None` means the log was empty.
    Exported(Option<PathBuf>),
}

fn edit_prompt(field: EditField) -> &'static str {
    match field {
        EditField::RemainingTime => "Remaining time (MM:SS)",
        EditField::CycleCount => "Completed pomodoros",
        EditField::TaskName => "Current task",
        EditField::LogTask(_) => "Task name",
        EditField::LogDuration(_) => "Duration",
    }
}

/// Applies an intent to the app, asking the user through `prompter` where needed.
pub fn dispatch(app: &mut App, intent: Intent, prompter: &dyn Prompter) -> EventResult {
    log::debug!("Dispatching {intent:?}");
    match intent {
        Intent::ToggleTimer => {
            app.toggle();
            EventResult::StateChanged
        }
        Intent::Reset => {
            if app.reset() {
                EventResult::Rebuild
            } else {
                EventResult::StateChanged
            }
        }
        Intent::SwitchMode(mode) => {
            // Mode styling lives in the menu and icon, so always rebuild.
            app.switch_mode(mode);
            EventResult::Rebuild
        }
        Intent::Edit(field) => edit(app, field, prompter),
        Intent::DeleteLogEntry(index) => rebuild_if(app.delete_log_entry(index, prompter)),
        Intent::ClearLog => rebuild_if(app.clear_log(prompter)),
        Intent::ExportLog => match export::default_export_dir().and_then(|dir| app.export_log(&dir)) {
            Ok(path) => EventResult::Exported(path),
            Err(e) => {
                log::error!("Export failed: {e}");
                EventResult::Continue
            }
        },
        Intent::ToggleTheme => {
            app.toggle_theme();
            EventResult::Rebuild
        }
        Intent::ToggleAutoStart => {
            app.update_setting(|s| s.auto_start = !s.auto_start);
            EventResult::Rebuild
        }
        Intent::ToggleSound => {
            app.update_setting(|s| s.notification_sound_enabled = !s.notification_sound_enabled);
            EventResult::Rebuild
        }
        Intent::ToggleAmbientNoise => {
            app.update_setting(|s| s.ambient_noise_enabled = !s.ambient_noise_enabled);
            EventResult::AmbientChanged
        }
        Intent::SetAmbientVolume(pct) => {
            app.update_setting(|s| s.ambient_noise_volume = f32::from(pct.min(100)) / 100.0);
            EventResult::AmbientChanged
        }
        Intent::SetDuration(mode, secs) => {
            app.update_setting(|s| s.set_duration(mode, secs));
            EventResult::Rebuild
        }
        Intent::CustomDuration(mode) => {
            let current = crate::timer::format_time(app.settings.duration_for(mode));
            let message = format!("{} duration (MM:SS)", mode.title());
            match prompter.ask_text(&message, &current) {
                Some(text) => {
                    let secs = parse_config_duration(&text);
                    app.update_setting(|s| s.set_duration(mode, secs));
                    EventResult::Rebuild
                }
                None => EventResult::Continue,
            }
        }
        Intent::SetLongBreakInterval(n) => {
            app.update_setting(|s| s.set_long_break_interval(n));
            EventResult::Rebuild
        }
        Intent::Quit => EventResult::Quit,
    }
}

fn rebuild_if(changed: bool) -> EventResult {
    if changed {
        EventResult::Rebuild
    } else {
        EventResult::Continue
    }
}

/// Runs an in-place edit: enter edit mode, ask, then commit or cancel.
fn edit(app: &mut App, field: EditField, prompter: &dyn Prompter) -> EventResult {
    if !app.begin_edit(field) {
        return EventResult::Continue;
    }
    let current = app.edit_text(field);
    match prompter.ask_text(edit_prompt(field), &current) {
        Some(text) => {
            if app.commit_edit(&text) {
                EventResult::Rebuild
            } else {
                log::debug!("Ignoring invalid {field:?} input {text:?}");
                EventResult::Continue
            }
        }
        None => {
            app.cancel_edit();
            EventResult::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimerStatus;
    use crate::persistence::Database;
    use crate::prompt::testing::ScriptedPrompter;
    use crate::timer::testing::ManualCountdown;

    fn create_test_app() -> App {
        App::new(
            Database::new_in_memory().unwrap(),
            Box::new(ManualCountdown::new()),
        )
    }

    #[test]
    fn test_from_menu_id_fixed_ids() {
        assert_eq!(Intent::from_menu_id(ID_TOGGLE), Some(Intent::ToggleTimer));
        assert_eq!(Intent::from_menu_id(ID_RESET), Some(Intent::Reset));
        assert_eq!(
            Intent::from_menu_id(ID_EDIT_TIME),
            Some(Intent::Edit(EditField::RemainingTime))
        );
        assert_eq!(Intent::from_menu_id(ID_QUIT), Some(Intent::Quit));
    }

    #[test]
    fn test_from_menu_id_modes() {
        assert_eq!(
            Intent::from_menu_id("mode_shortBreak"),
            Some(Intent::SwitchMode(Mode::ShortBreak))
        );
        assert_eq!(Intent::from_menu_id("mode_nap"), None);
    }

    #[test]
    fn test_from_menu_id_settings() {
        assert_eq!(
            Intent::from_menu_id("work_30"),
            Some(Intent::SetDuration(Mode::Work, 1800))
        );
        assert_eq!(
            Intent::from_menu_id("longBreak_custom"),
            Some(Intent::CustomDuration(Mode::LongBreak))
        );
        assert_eq!(
            Intent::from_menu_id("interval_3"),
            Some(Intent::SetLongBreakInterval(3))
        );
        assert_eq!(Intent::from_menu_id("interval_0"), None);
        assert_eq!(Intent::from_menu_id("vol_40"), Some(Intent::SetAmbientVolume(40)));
        assert_eq!(Intent::from_menu_id("vol_400"), None);
    }

    #[test]
    fn test_from_menu_id_log_rows() {
        assert_eq!(
            Intent::from_menu_id("logtask_2"),
            Some(Intent::Edit(EditField::LogTask(2)))
        );
        assert_eq!(
            Intent::from_menu_id("logduration_0"),
            Some(Intent::Edit(EditField::LogDuration(0)))
        );
        assert_eq!(Intent::from_menu_id("logdelete_5"), Some(Intent::DeleteLogEntry(5)));
        assert_eq!(Intent::from_menu_id("logdelete_x"), None);
        assert_eq!(Intent::from_menu_id("status"), None);
    }

    #[test]
    fn test_dispatch_toggle_and_reset() {
        let mut app = create_test_app();
        let prompter = ScriptedPrompter::default();
        assert_eq!(
            dispatch(&mut app, Intent::ToggleTimer, &prompter),
            EventResult::StateChanged
        );
        assert_eq!(app.machine.status(), TimerStatus::Running);
        assert_eq!(
            dispatch(&mut app, Intent::Reset, &prompter),
            EventResult::StateChanged
        );
        assert_eq!(app.machine.status(), TimerStatus::Stopped);
    }

    #[test]
    fn test_dispatch_edit_remaining_time() {
        let mut app = create_test_app();
        let prompter = ScriptedPrompter::answering(Some("05:30"));
        let result = dispatch(&mut app, Intent::Edit(EditField::RemainingTime), &prompter);
        assert_eq!(result, EventResult::Rebuild);
        assert_eq!(app.machine.seconds_remaining(), 330);
        assert_eq!(app.editing, None);
    }

    #[test]
    fn test_dispatch_edit_cancelled() {
        let mut app = create_test_app();
        let prompter = ScriptedPrompter::answering(None);
        let result = dispatch(&mut app, Intent::Edit(EditField::CycleCount), &prompter);
        assert_eq!(result, EventResult::Continue);
        assert_eq!(app.editing, None);
    }

    #[test]
    fn test_dispatch_edit_refused_while_running_does_not_prompt() {
        let mut app = create_test_app();
        app.toggle();
        let prompter = ScriptedPrompter::answering(Some("01:00"));
        dispatch(&mut app, Intent::Edit(EditField::RemainingTime), &prompter);
        assert!(prompter.asked.borrow().is_empty());
        assert_eq!(app.machine.seconds_remaining(), 1500);
    }

    #[test]
    fn test_dispatch_clear_log_declined() {
        let mut app = create_test_app();
        app.toggle();
        app.handle_tick(1);
        app.toggle();
        app.reset();

        let result = dispatch(&mut app, Intent::ClearLog, &ScriptedPrompter::confirming(false));
        assert_eq!(result, EventResult::Continue);
        assert_eq!(app.log.len(), 1);
    }

    #[test]
    fn test_dispatch_custom_duration_collapses_garbage_to_zero() {
        let mut app = create_test_app();
        let prompter = ScriptedPrompter::answering(Some("abc:xy"));
        dispatch(&mut app, Intent::CustomDuration(Mode::ShortBreak), &prompter);
        assert_eq!(app.settings.short_break_seconds, 0);

        let prompter = ScriptedPrompter::answering(Some("7:30"));
        dispatch(&mut app, Intent::CustomDuration(Mode::Work), &prompter);
        assert_eq!(app.settings.work_seconds, 450);
        assert_eq!(app.machine.seconds_remaining(), 450);
    }

    #[test]
    fn test_dispatch_settings_toggles() {
        let mut app = create_test_app();
        let prompter = ScriptedPrompter::default();
        dispatch(&mut app, Intent::ToggleAutoStart, &prompter);
        assert!(!app.settings.auto_start);
        assert_eq!(
            dispatch(&mut app, Intent::ToggleAmbientNoise, &prompter),
            EventResult::AmbientChanged
        );
        assert!(app.settings.ambient_noise_enabled);
        dispatch(&mut app, Intent::SetAmbientVolume(30), &prompter);
        assert!((app.settings.ambient_noise_volume - 0.3).abs() < 0.001);
        assert!(app.db.load_settings().ambient_noise_enabled);
    }

    #[test]
    fn test_dispatch_switch_mode() {
        let mut app = create_test_app();
        let prompter = ScriptedPrompter::default();
        dispatch(&mut app, Intent::SwitchMode(Mode::LongBreak), &prompter);
        assert_eq!(app.machine.mode(), Mode::LongBreak);
        assert_eq!(app.machine.seconds_remaining(), 900);
    }
}
