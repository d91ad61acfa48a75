//! Display model: a plain snapshot of what the tray should show.

use crate::app::{App, EditField};
use crate::models::{Mode, Theme, TimerStatus};
use crate::timer::{format_time, format_tray_title};

/// One row of the session log as shown in the menu.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    pub index: usize,
    pub category: &'static str,
    pub task: String,
    pub duration: String,
    pub occurred: String,
}

impl LogRow {
    pub fn summary(&self) -> String {
        format!("{}  {} - {}", self.task, self.duration, self.occurred)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayModel {
    /// Remaining time as `MM:SS`.
    pub time_text: String,
    pub tray_title: String,
    pub status: TimerStatus,
    pub mode: Mode,
    pub status_text: String,
    pub progress: f32,
    pub cycle_count: u32,
    pub task_label: String,
    pub editing: Option<EditField>,
    pub theme: Theme,
    pub logs: Vec<LogRow>,
}

impl DisplayModel {
    pub fn project(app: &App) -> Self {
        let machine = &app.machine;
        let remaining = machine.seconds_remaining();
        let logs = app
            .log
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| LogRow {
                index,
                category: entry.category.label(),
                task: entry.task_label.clone(),
                duration: entry.duration_label.clone(),
                occurred: entry.occurred_label(),
            })
            .collect();

        Self {
            time_text: format_time(remaining),
            tray_title: format_tray_title(machine.status(), machine.mode(), remaining),
            status: machine.status(),
            mode: machine.mode(),
            status_text: format_status(machine.status(), machine.mode(), remaining),
            progress: machine.progress(),
            cycle_count: machine.cycle_count(),
            task_label: app.task_input.clone(),
            editing: app.editing,
            theme: app.theme,
            logs,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }
}

/// Formats the status line for the menu.
pub fn format_status(status: TimerStatus, mode: Mode, remaining_secs: u32) -> String {
    match status {
        TimerStatus::Stopped => format!("Ready to start {} - {}", mode.title(), format_time(remaining_secs)),
        TimerStatus::Running => format!("⏱  {} - {} remaining", mode.title(), format_time(remaining_secs)),
        TimerStatus::Paused => format!("⏸  {} - {} (paused)", mode.title(), format_time(remaining_secs)),
    }
}

/// Formats the progress bar for the menu.
pub fn format_progress(progress: f32) -> String {
    let pct = progress.clamp(0.0, 1.0);
    let filled = (pct * 20.0).round() as usize;
    format!(
        "{}{}  {}%",
        "█".repeat(filled),
        "░".repeat(20 - filled),
        (pct * 100.0).round() as u32
    )
}
