//! Main application state and logic.

use crate::display::DisplayModel;
use crate::export::{self, ExportError};
use crate::models::{Mode, Settings, Theme};
use crate::persistence::{Database, DatabaseError};
use crate::prompt::Prompter;
use crate::session::{Completion, SessionMachine};
use crate::session_log::{LogStore, SessionRecord};
use crate::timer::{format_time, Countdown};
use chrono::Local;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CLEAR_LOG_PROMPT: &str = "ログを全て消去しますか？";
const DELETE_ENTRY_PROMPT: &str = "このログを削除しますか？";

/// Largest remaining time the `MM:SS` editor accepts.
const MAX_EDITABLE_SECS: u32 = 99 * 60 + 59;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Events that should trigger notifications/sounds on the main thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompletionEvent {
    WorkComplete { cycle_count: u32, next: Mode },
    BreakComplete,
}

impl From<&Completion> for CompletionEvent {
    fn from(completion: &Completion) -> Self {
        match completion.finished {
            Mode::Work => Self::WorkComplete {
                cycle_count: completion.cycle_count,
                next: completion.next,
            },
            Mode::ShortBreak | Mode::LongBreak => Self::BreakComplete,
        }
    }
}

/// A displayed value that is currently being edited in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    RemainingTime,
    CycleCount,
    TaskName,
    LogTask(usize),
    LogDuration(usize),
}

/// Main application state (audio is handled separately on the main thread).
pub struct App {
    pub settings: Settings,
    pub machine: SessionMachine,
    pub log: LogStore,
    pub theme: Theme,
    /// Free-text name of the task being worked on.
    pub task_input: String,
    pub editing: Option<EditField>,
    pub db: Database,
}

impl App {
    /// Loads persisted state from `db`; unreadable state falls back to defaults.
    pub fn new(db: Database, countdown: Box<dyn Countdown>) -> Self {
        let settings = db.load_settings();
        let log = LogStore::new(db.load_log());
        let theme = db.load_theme();
        let machine = SessionMachine::new(&settings, countdown);

        Self {
            settings,
            machine,
            log,
            theme,
            task_input: String::new(),
            editing: None,
            db,
        }
    }

    /// Opens the default database and loads from it.
    pub fn open(countdown: Box<dyn Countdown>) -> Result<Self, AppError> {
        Ok(Self::new(Database::new()?, countdown))
    }

    pub fn display(&self) -> DisplayModel {
        DisplayModel::project(self)
    }

    pub fn toggle(&mut self) {
        self.machine.toggle();
    }

    /// Resets the current session, logging it if it was abandoned mid-way.
    pub fn reset(&mut self) -> bool {
        let record = self.machine.reset(&self.settings);
        self.record_if_some(record)
    }

    /// Switches mode, logging an abandoned session if there was one.
    pub fn switch_mode(&mut self, mode: Mode) -> bool {
        let record = self.machine.switch_mode(mode, &self.settings);
        self.record_if_some(record)
    }

    /// Applies a tick from the countdown thread. Stale ticks are dropped.
    pub fn handle_tick(&mut self, generation: u64) -> Option<CompletionEvent> {
        if !self.machine.accepts_tick(generation) {
            log::trace!("Dropping stale tick {generation}");
            return None;
        }
        let completion = self.machine.on_tick(&self.settings)?;
        self.record(&completion.record);
        Some(CompletionEvent::from(&completion))
    }

    fn record_if_some(&mut self, record: Option<SessionRecord>) -> bool {
        match record {
            Some(record) => {
                self.record(&record);
                true
            }
            None => false,
        }
    }

    fn record(&mut self, record: &SessionRecord) {
        let entry = record.synthesize(&self.task_input, &self.settings, Local::now());
        log::info!(
            "Logged {} session '{}' ({})",
            entry.category.label(),
            entry.task_label,
            entry.duration_label
        );
        self.log.prepend(entry);
        self.save_log();
    }

    fn save_log(&self) {
        if let Err(e) = self.db.save_log(self.log.entries()) {
            log::error!("Failed to save session log: {e}");
        }
    }

    /// Enters edit mode for a field. Remaining time cannot be edited while running.
    pub fn begin_edit(&mut self, field: EditField) -> bool {
        let allowed = match field {
            EditField::RemainingTime => !self.machine.is_running(),
            EditField::LogTask(i) | EditField::LogDuration(i) => i < self.log.len(),
            EditField::CycleCount | EditField::TaskName => true,
        };
        if allowed {
            self.editing = Some(field);
        }
        allowed
    }

    /// Current text of the field being edited, used to prefill the editor.
    pub fn edit_text(&self, field: EditField) -> String {
        match field {
            EditField::RemainingTime => {
                format_time(self.machine.seconds_remaining().min(MAX_EDITABLE_SECS))
            }
            EditField::CycleCount => self.machine.cycle_count().to_string(),
            EditField::TaskName => self.task_input.clone(),
            EditField::LogTask(i) => self
                .log
                .get(i)
                .map(|e| e.task_label.clone())
                .unwrap_or_default(),
            EditField::LogDuration(i) => self
                .log
                .get(i)
                .map(|e| e.duration_label.clone())
                .unwrap_or_default(),
        }
    }

    /// Leaves edit mode, applying `text` to the field being edited.
    /// Invalid text is discarded without changing anything.
    pub fn commit_edit(&mut self, text: &str) -> bool {
        let Some(field) = self.editing.take() else {
            return false;
        };
        match field {
            EditField::RemainingTime => self.machine.edit_remaining(text),
            EditField::CycleCount => self.machine.edit_cycle_count(text),
            EditField::TaskName => {
                self.task_input = text.trim().to_string();
                true
            }
            EditField::LogTask(i) => {
                let changed = self.log.set_task_label(i, text);
                if changed {
                    self.save_log();
                }
                changed
            }
            EditField::LogDuration(i) => {
                let changed = self.log.set_duration_label(i, text);
                if changed {
                    self.save_log();
                }
                changed
            }
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Deletes one log entry after confirmation.
    pub fn delete_log_entry(&mut self, index: usize, prompter: &dyn Prompter) -> bool {
        let Some(entry) = self.log.get(index) else {
            return false;
        };
        // Rows are addressed by position, so name the entry being deleted.
        let message = format!(
            "{}\n{}  {}  {}",
            DELETE_ENTRY_PROMPT,
            entry.task_label,
            entry.duration_label,
            entry.occurred_label()
        );
        if !prompter.confirm(&message) {
            return false;
        }
        self.log.remove(index);
        self.save_log();
        true
    }

    /// Clears the whole log after confirmation.
    pub fn clear_log(&mut self, prompter: &dyn Prompter) -> bool {
        if !prompter.confirm(CLEAR_LOG_PROMPT) {
            return false;
        }
        self.log.clear();
        self.save_log();
        true
    }

    /// Writes the log as CSV into `dir`. `None` means there was nothing to export.
    pub fn export_log(&self, dir: &Path) -> Result<Option<PathBuf>, ExportError> {
        export::export_log(self.log.entries(), dir)
    }

    /// Updates a setting, saves it, and re-baselines a stopped countdown.
    pub fn update_setting<F>(&mut self, updater: F)
    where
        F: FnOnce(&mut Settings),
    {
        updater(&mut self.settings);
        if let Err(e) = self.db.save_settings(&self.settings) {
            log::error!("Failed to save settings: {e}");
        }
        self.machine.apply_settings(&self.settings);
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        if let Err(e) = self.db.save_theme(self.theme) {
            log::error!("Failed to save theme: {e}");
        }
    }
}
