//! Menu building and updating for the tray dropdown.

use crate::display::{format_progress, DisplayModel, LogRow};
use crate::models::{Mode, Settings, Theme, TimerStatus};
use crate::timer::format_time;
use muda::accelerator::Accelerator;
use muda::{CheckMenuItem, Menu, MenuId, MenuItem, PredefinedMenuItem, Submenu};
use thiserror::Error;

// Menu item IDs as constants
pub const ID_STATUS: &str = "status";
pub const ID_PROGRESS: &str = "progress";
pub const ID_TOGGLE: &str = "toggle";
pub const ID_RESET: &str = "reset";
pub const ID_EDIT_TIME: &str = "edit_time";
pub const ID_EDIT_CYCLE: &str = "edit_cycle";
pub const ID_SET_TASK: &str = "set_task";
pub const ID_EXPORT: &str = "export";
pub const ID_CLEAR_LOG: &str = "clear_log";
pub const ID_THEME_TOGGLE: &str = "theme_toggle";
pub const ID_AUTO_START_TOGGLE: &str = "auto_start_toggle";
pub const ID_SOUND_TOGGLE: &str = "sound_toggle";
pub const ID_AMBIENT_TOGGLE: &str = "ambient_toggle";
pub const ID_QUIT: &str = "quit";

/// How many log rows the dropdown lists before summarising the rest.
const MAX_LOG_ROWS: usize = 10;

const WORK_PRESETS: [u32; 6] = [15, 20, 25, 30, 45, 60];
const SHORT_BREAK_PRESETS: [u32; 4] = [3, 5, 10, 15];
const LONG_BREAK_PRESETS: [u32; 4] = [10, 15, 20, 30];
const INTERVAL_PRESETS: [u32; 5] = [2, 3, 4, 5, 6];
const VOLUME_PRESETS: [u8; 5] = [10, 25, 50, 75, 100];

#[derive(Error, Debug)]
pub enum MenuError {
    #[error("Menu error: {0}")]
    Muda(#[from] muda::Error),
}

/// Holds references to menu items that change while the timer runs.
pub struct MenuItems {
    pub status: MenuItem,
    pub progress: MenuItem,
    pub cycle: MenuItem,
    pub toggle: MenuItem,
    pub edit_time: MenuItem,
}

fn item(id: impl Into<String>, text: impl AsRef<str>, enabled: bool) -> MenuItem {
    MenuItem::with_id(MenuId::new(id.into()), text, enabled, None::<Accelerator>)
}

fn check(id: impl Into<String>, text: impl AsRef<str>, checked: bool) -> CheckMenuItem {
    CheckMenuItem::with_id(
        MenuId::new(id.into()),
        text,
        true,
        checked,
        None::<Accelerator>,
    )
}

/// Builds the complete menu structure.
pub fn build_menu(model: &DisplayModel, settings: &Settings) -> Result<(Menu, MenuItems), MenuError> {
    let menu = Menu::new();

    // Status display (disabled, info only)
    let status = item(ID_STATUS, &model.status_text, false);
    menu.append(&status)?;
    let progress = item(ID_PROGRESS, format_progress(model.progress), false);
    menu.append(&progress)?;

    menu.append(&PredefinedMenuItem::separator())?;

    let cycle = item(ID_EDIT_CYCLE, format_cycle(model.cycle_count), true);
    menu.append(&cycle)?;
    menu.append(&item(ID_SET_TASK, format_task(&model.task_label), true))?;

    menu.append(&PredefinedMenuItem::separator())?;

    // Control buttons
    let toggle = item(ID_TOGGLE, toggle_text(model.status), true);
    let edit_time = item(ID_EDIT_TIME, "✎  Edit Time…", !model.is_running());
    menu.append(&toggle)?;
    menu.append(&item(ID_RESET, "⏹  Reset", true))?;
    menu.append(&edit_time)?;

    menu.append(&PredefinedMenuItem::separator())?;

    for mode in Mode::ALL {
        menu.append(&check(
            format!("mode_{}", mode.key()),
            mode.title(),
            mode == model.mode,
        ))?;
    }

    menu.append(&PredefinedMenuItem::separator())?;

    menu.append(&build_log_submenu(&model.logs)?)?;
    menu.append(&build_settings_submenu(settings)?)?;
    menu.append(&item(ID_THEME_TOGGLE, theme_text(model.theme), true))?;

    menu.append(&PredefinedMenuItem::separator())?;

    menu.append(&item(ID_QUIT, "Quit Pomolog", true))?;

    let items = MenuItems {
        status,
        progress,
        cycle,
        toggle,
        edit_time,
    };

    Ok((menu, items))
}

fn build_log_submenu(rows: &[LogRow]) -> Result<Submenu, MenuError> {
    let submenu = Submenu::new(format!("📋  Session Log ({})", rows.len()), true);

    if rows.is_empty() {
        submenu.append(&item("log_empty", "No sessions yet", false))?;
    }

    for row in rows.iter().take(MAX_LOG_ROWS) {
        let entry = Submenu::new(format!("{}  {}", row.category, row.summary()), true);
        entry.append(&item(format!("logtask_{}", row.index), "Rename Task…", true))?;
        entry.append(&item(
            format!("logduration_{}", row.index),
            "Edit Duration…",
            true,
        ))?;
        entry.append(&item(format!("logdelete_{}", row.index), "Delete…", true))?;
        submenu.append(&entry)?;
    }

    if rows.len() > MAX_LOG_ROWS {
        submenu.append(&item(
            "log_more",
            format!("… {} older sessions", rows.len() - MAX_LOG_ROWS),
            false,
        ))?;
    }

    submenu.append(&PredefinedMenuItem::separator())?;
    submenu.append(&item(ID_EXPORT, "Export CSV…", true))?;
    submenu.append(&item(ID_CLEAR_LOG, "Clear Log…", !rows.is_empty()))?;

    Ok(submenu)
}

fn build_duration_submenu(mode: Mode, current_secs: u32, presets: &[u32]) -> Result<Submenu, MenuError> {
    let submenu = Submenu::new(
        format!("{}: {}", mode.title(), format_time(current_secs)),
        true,
    );
    for &mins in presets {
        submenu.append(&check(
            format!("{}_{}", mode.key(), mins),
            format!("{} min", mins),
            mins * 60 == current_secs,
        ))?;
    }
    submenu.append(&PredefinedMenuItem::separator())?;
    submenu.append(&item(format!("{}_custom", mode.key()), "Custom…", true))?;
    Ok(submenu)
}

fn build_settings_submenu(settings: &Settings) -> Result<Submenu, MenuError> {
    let submenu = Submenu::new("⚙  Settings", true);

    submenu.append(&build_duration_submenu(
        Mode::Work,
        settings.work_seconds,
        &WORK_PRESETS,
    )?)?;
    submenu.append(&build_duration_submenu(
        Mode::ShortBreak,
        settings.short_break_seconds,
        &SHORT_BREAK_PRESETS,
    )?)?;
    submenu.append(&build_duration_submenu(
        Mode::LongBreak,
        settings.long_break_seconds,
        &LONG_BREAK_PRESETS,
    )?)?;

    // Long break interval submenu
    let interval_sub = Submenu::new(
        format!("Long Break After: {} pomodoros", settings.long_break_interval),
        true,
    );
    for count in INTERVAL_PRESETS {
        interval_sub.append(&check(
            format!("interval_{}", count),
            format!("{} pomodoros", count),
            count == settings.long_break_interval,
        ))?;
    }
    submenu.append(&interval_sub)?;

    submenu.append(&PredefinedMenuItem::separator())?;

    submenu.append(&check(ID_AUTO_START_TOGGLE, "Auto-start Next", settings.auto_start))?;
    submenu.append(&check(
        ID_SOUND_TOGGLE,
        "Notification Sound",
        settings.notification_sound_enabled,
    ))?;

    submenu.append(&PredefinedMenuItem::separator())?;

    submenu.append(&check(
        ID_AMBIENT_TOGGLE,
        "Ambient Noise",
        settings.ambient_noise_enabled,
    ))?;
    let current_pct = (settings.ambient_noise_volume * 100.0).round() as u8;
    let volume_sub = Submenu::new(format!("Noise Volume: {}%", current_pct), true);
    for pct in VOLUME_PRESETS {
        volume_sub.append(&check(
            format!("vol_{}", pct),
            format!("{}%", pct),
            pct == current_pct,
        ))?;
    }
    submenu.append(&volume_sub)?;

    Ok(submenu)
}

/// Updates the items that change on every tick.
pub fn update_menu_items(items: &MenuItems, model: &DisplayModel) {
    items.status.set_text(&model.status_text);
    items.progress.set_text(format_progress(model.progress));
    items.cycle.set_text(format_cycle(model.cycle_count));
    items.toggle.set_text(toggle_text(model.status));
    items.edit_time.set_enabled(!model.is_running());
}

pub fn toggle_text(status: TimerStatus) -> &'static str {
    match status {
        TimerStatus::Stopped => "▶  Start",
        TimerStatus::Running => "⏸  Pause",
        TimerStatus::Paused => "▶  Resume",
    }
}

pub fn format_cycle(count: u32) -> String {
    format!("Cycles: {}  ✎", count)
}

pub fn format_task(task: &str) -> String {
    if task.is_empty() {
        "Task: —  ✎".to_string()
    } else {
        format!("Task: {}  ✎", task)
    }
}

fn theme_text(theme: Theme) -> &'static str {
    match theme {
        Theme::Light => "🌙  Dark Theme",
        Theme::Dark => "☀️  Light Theme",
    }
}
