//! Data models for the Pomolog application.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder task name for work sessions without a user-entered task.
pub const UNNAMED_TASK: &str = "名無しのタスク";

const DEFAULT_WORK_SECS: u32 = 25 * 60;
const DEFAULT_SHORT_BREAK_SECS: u32 = 5 * 60;
const DEFAULT_LONG_BREAK_SECS: u32 = 15 * 60;
const DEFAULT_LONG_BREAK_INTERVAL: u32 = 4;
const DEFAULT_AMBIENT_VOLUME: f32 = 0.5;

/// Whether the countdown is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerStatus {
    #[default]
    Stopped,
    Running,
    Paused,
}

/// Which kind of interval is being counted down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Work,
    ShortBreak,
    LongBreak,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Work, Mode::ShortBreak, Mode::LongBreak];

    /// Parses the wire name used in menu ids. Unknown names are rejected.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "work" => Some(Self::Work),
            "shortBreak" => Some(Self::ShortBreak),
            "longBreak" => Some(Self::LongBreak),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::ShortBreak => "shortBreak",
            Self::LongBreak => "longBreak",
        }
    }

    pub fn is_break(self) -> bool {
        !matches!(self, Self::Work)
    }

    /// Log category for sessions run in this mode.
    pub fn category(self) -> Category {
        if self.is_break() {
            Category::Break
        } else {
            Category::Work
        }
    }

    /// Task label used for break sessions; work sessions use the task input.
    pub fn break_label(self) -> Option<&'static str> {
        match self {
            Self::Work => None,
            Self::ShortBreak => Some("小休憩"),
            Self::LongBreak => Some("大休憩"),
        }
    }

    /// Human-readable name for menus.
    pub fn title(self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::ShortBreak => "Short Break",
            Self::LongBreak => "Long Break",
        }
    }
}

/// Category of a logged session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Work,
    Break,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Self::Work => "作業",
            Self::Break => "休憩",
        }
    }
}

/// Colour scheme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// User-configurable settings for the pomodoro timer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Duration of a work session in seconds.
    pub work_seconds: u32,
    /// Duration of a short break in seconds.
    pub short_break_seconds: u32,
    /// Duration of a long break in seconds.
    pub long_break_seconds: u32,
    /// Number of completed work sessions between long breaks.
    pub long_break_interval: u32,
    /// Whether the next interval starts on its own after a completion.
    pub auto_start: bool,
    /// Whether to play the chime on completion.
    pub notification_sound_enabled: bool,
    pub ambient_noise_enabled: bool,
    /// Ambient noise volume in `0.0..=1.0`.
    pub ambient_noise_volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_seconds: DEFAULT_WORK_SECS,
            short_break_seconds: DEFAULT_SHORT_BREAK_SECS,
            long_break_seconds: DEFAULT_LONG_BREAK_SECS,
            long_break_interval: DEFAULT_LONG_BREAK_INTERVAL,
            auto_start: true,
            notification_sound_enabled: true,
            ambient_noise_enabled: false,
            ambient_noise_volume: DEFAULT_AMBIENT_VOLUME,
        }
    }
}

impl Settings {
    /// Builds settings from a stored JSON document, field by field.
    ///
    /// Missing or non-numeric fields take their defaults, negative durations
    /// collapse to 0, and a zero interval falls back to the default.
    pub fn from_stored(value: &Value) -> Self {
        let defaults = Self::default();
        let duration = |key: &str, fallback: u32| match value.get(key).and_then(Value::as_f64) {
            Some(n) if n.is_finite() => n.max(0.0).floor().min(u32::MAX as f64) as u32,
            _ => fallback,
        };
        let flag = |key: &str, fallback: bool| {
            value.get(key).and_then(Value::as_bool).unwrap_or(fallback)
        };

        let interval = match duration("longBreakInterval", defaults.long_break_interval) {
            0 => defaults.long_break_interval,
            n => n,
        };
        let volume = value
            .get("ambientNoiseVolume")
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
            .map(|v| (v as f32).clamp(0.0, 1.0))
            .unwrap_or(defaults.ambient_noise_volume);

        Self {
            work_seconds: duration("workSeconds", defaults.work_seconds),
            short_break_seconds: duration("shortBreakSeconds", defaults.short_break_seconds),
            long_break_seconds: duration("longBreakSeconds", defaults.long_break_seconds),
            long_break_interval: interval,
            auto_start: flag("autoStart", defaults.auto_start),
            notification_sound_enabled: flag(
                "notificationSoundEnabled",
                defaults.notification_sound_enabled,
            ),
            ambient_noise_enabled: flag("ambientNoiseEnabled", defaults.ambient_noise_enabled),
            ambient_noise_volume: volume,
        }
    }

    /// Configured duration in seconds for the given mode.
    pub fn duration_for(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Work => self.work_seconds,
            Mode::ShortBreak => self.short_break_seconds,
            Mode::LongBreak => self.long_break_seconds,
        }
    }

    pub fn set_duration(&mut self, mode: Mode, seconds: u32) {
        match mode {
            Mode::Work => self.work_seconds = seconds,
            Mode::ShortBreak => self.short_break_seconds = seconds,
            Mode::LongBreak => self.long_break_seconds = seconds,
        }
    }

    pub fn set_long_break_interval(&mut self, interval: u32) {
        self.long_break_interval = if interval == 0 {
            DEFAULT_LONG_BREAK_INTERVAL
        } else {
            interval
        };
    }
}

/// Parses one numeric configuration field; anything unusable becomes 0.
pub fn parse_config_number(text: &str) -> u32 {
    text.trim()
        .parse::<i64>()
        .ok()
        .map(|n| n.clamp(0, u32::MAX as i64) as u32)
        .unwrap_or(0)
}

/// Parses a configured duration typed as `MM:SS` or plain minutes.
pub fn parse_config_duration(text: &str) -> u32 {
    let (mins, secs) = match text.split_once(':') {
        Some((mins, secs)) => (parse_config_number(mins), parse_config_number(secs)),
        None => (parse_config_number(text), 0),
    };
    mins.saturating_mul(60).saturating_add(secs)
}

/// One finished or abandoned session in the log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub category: Category,
    pub task_label: String,
    pub occurred_at: DateTime<Local>,
    pub duration_label: String,
}

impl LogEntry {
    /// Timestamp rendered the way the log list shows it.
    pub fn occurred_label(&self) -> String {
        self.occurred_at.format("%Y/%-m/%-d %-H:%M:%S").to_string()
    }
}
