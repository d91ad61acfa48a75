//! Session log: entry synthesis and the newest-first log store.

use crate::models::{Category, LogEntry, Mode, Settings, UNNAMED_TASK};
use chrono::{DateTime, Local};

/// A session the state machine wants recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub mode: Mode,
    pub category: Category,
    /// Label that overrides the task input (break sessions).
    pub label: Option<String>,
    /// Elapsed seconds for abandoned sessions; `None` means the full duration.
    pub elapsed: Option<u32>,
}

impl SessionRecord {
    /// A session that ran to zero.
    pub fn completed(mode: Mode) -> Self {
        Self {
            mode,
            category: mode.category(),
            label: mode.break_label().map(str::to_string),
            elapsed: None,
        }
    }

    /// A session reset or switched away from after `elapsed` seconds.
    pub fn abandoned(mode: Mode, elapsed: u32) -> Self {
        Self {
            elapsed: Some(elapsed),
            ..Self::completed(mode)
        }
    }

    /// Turns the record into a log entry stamped with `at`.
    pub fn synthesize(&self, task_input: &str, settings: &Settings, at: DateTime<Local>) -> LogEntry {
        let task_label = match &self.label {
            Some(label) => label.clone(),
            None => task_label_or_placeholder(task_input),
        };
        let seconds = self
            .elapsed
            .unwrap_or_else(|| settings.duration_for(self.mode));

        LogEntry {
            category: self.category,
            task_label,
            occurred_at: at,
            duration_label: format_duration_label(seconds),
        }
    }
}

/// Trimmed task input, or the placeholder when it is blank.
pub fn task_label_or_placeholder(task_input: &str) -> String {
    let trimmed = task_input.trim();
    if trimmed.is_empty() {
        UNNAMED_TASK.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Formats a duration as `M分S秒`, dropping the seconds part when it is zero.
pub fn format_duration_label(secs: u32) -> String {
    let (mins, rest) = (secs / 60, secs % 60);
    if rest > 0 {
        format!("{mins}分{rest}秒")
    } else {
        format!("{mins}分")
    }
}

/// Ordered session log, newest entry first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogStore {
    entries: Vec<LogEntry>,
}

impl LogStore {
    pub fn new(entries: Vec<LogEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LogEntry> {
        self.entries.get(index)
    }

    /// Adds an entry at the top of the log.
    pub fn prepend(&mut self, entry: LogEntry) {
        self.entries.insert(0, entry);
    }

    /// Replaces the task label. Blank labels are ignored.
    pub fn set_task_label(&mut self, index: usize, label: &str) -> bool {
        Self::edit(&mut self.entries, index, label, |e| &mut e.task_label)
    }

    /// Replaces the duration label. Blank labels are ignored.
    pub fn set_duration_label(&mut self, index: usize, label: &str) -> bool {
        Self::edit(&mut self.entries, index, label, |e| &mut e.duration_label)
    }

    pub fn remove(&mut self, index: usize) -> Option<LogEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn edit(
        entries: &mut [LogEntry],
        index: usize,
        value: &str,
        field: impl FnOnce(&mut LogEntry) -> &mut String,
    ) -> bool {
        let value = value.trim();
        match entries.get_mut(index) {
            Some(entry) if !value.is_empty() => {
                *field(entry) = value.to_string();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    fn entry(task: &str) -> LogEntry {
        LogEntry {
            category: Category::Work,
            task_label: task.to_string(),
            occurred_at: at(),
            duration_label: "25分".to_string(),
        }
    }

    /// Reads a label produced by `format_duration_label` back into seconds.
    fn parse_label(label: &str) -> (u32, u32) {
        let (mins, rest) = label.split_once('分').unwrap();
        let secs = rest.strip_suffix('秒').map_or(0, |s| s.parse().unwrap());
        (mins.parse().unwrap(), secs)
    }

    #[test]
    fn test_format_duration_label() {
        assert_eq!(format_duration_label(1500), "25分");
        assert_eq!(format_duration_label(330), "5分30秒");
        assert_eq!(format_duration_label(37), "0分37秒");
        assert_eq!(format_duration_label(0), "0分");
    }

    #[test]
    fn test_format_duration_label_splits_exactly() {
        for d in (0..7200).step_by(7).chain([59, 60, 61, 3599, 3600]) {
            let label = format_duration_label(d);
            assert_ne!(label.split_once('分').unwrap().1, "0秒");
            let (mins, secs) = parse_label(&label);
            assert_eq!(mins * 60 + secs, d);
        }
    }

    #[test]
    fn test_completed_work_record_uses_task_input() {
        let record = SessionRecord::completed(Mode::Work);
        let entry = record.synthesize("  write report ", &Settings::default(), at());
        assert_eq!(entry.category, Category::Work);
        assert_eq!(entry.task_label, "write report");
        assert_eq!(entry.duration_label, "25分");
        assert_eq!(entry.occurred_at, at());
    }

    #[test]
    fn test_completed_work_record_placeholder() {
        let entry = SessionRecord::completed(Mode::Work).synthesize("   ", &Settings::default(), at());
        assert_eq!(entry.task_label, UNNAMED_TASK);
    }

    #[test]
    fn test_completed_break_record_uses_break_label() {
        let settings = Settings {
            long_break_seconds: 1230,
            ..Settings::default()
        };
        let short = SessionRecord::completed(Mode::ShortBreak).synthesize("ignored", &settings, at());
        assert_eq!(short.category, Category::Break);
        assert_eq!(short.task_label, "小休憩");
        assert_eq!(short.duration_label, "5分");

        let long = SessionRecord::completed(Mode::LongBreak).synthesize("ignored", &settings, at());
        assert_eq!(long.task_label, "大休憩");
        assert_eq!(long.duration_label, "20分30秒");
    }

    #[test]
    fn test_abandoned_record_uses_elapsed() {
        let entry = SessionRecord::abandoned(Mode::Work, 37).synthesize("", &Settings::default(), at());
        assert_eq!(entry.duration_label, "0分37秒");
        assert_eq!(entry.task_label, UNNAMED_TASK);
    }

    #[test]
    fn test_prepend_keeps_newest_first() {
        let mut store = LogStore::default();
        store.prepend(entry("first"));
        store.prepend(entry("second"));
        assert_eq!(store.len(), 2);
        assert_eq!(store.entries()[0].task_label, "second");
        assert_eq!(store.entries()[1].task_label, "first");
    }

    #[test]
    fn test_edit_labels_in_place() {
        let mut store = LogStore::new(vec![entry("a"), entry("b")]);
        assert!(store.set_task_label(1, " renamed "));
        assert!(store.set_duration_label(1, "24分"));
        assert_eq!(store.get(1).unwrap().task_label, "renamed");
        assert_eq!(store.get(1).unwrap().duration_label, "24分");
        assert_eq!(store.get(0).unwrap().task_label, "a");
    }

    #[test]
    fn test_edit_rejects_blank_and_out_of_range() {
        let mut store = LogStore::new(vec![entry("a")]);
        assert!(!store.set_task_label(0, "  "));
        assert!(!store.set_duration_label(3, "1分"));
        assert_eq!(store.get(0).unwrap().task_label, "a");
    }

    #[test]
    fn test_remove_and_clear() {
        let mut store = LogStore::new(vec![entry("a"), entry("b")]);
        assert_eq!(store.remove(5), None);
        assert_eq!(store.remove(0).unwrap().task_label, "a");
        assert_eq!(store.len(), 1);
        store.clear();
        assert!(store.is_empty());
    }
}
