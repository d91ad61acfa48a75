//! CSV export of the session log.

use crate::models::LogEntry;
use chrono::{Local, NaiveDate};
use directories::UserDirs;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CSV_HEADER: &str = "No,ジャンル,タスク,実行時間,日時";
const UTF8_BOM: &str = "\u{feff}";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Could not determine an export directory")]
    NoTargetDir,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Quotes a field when it contains a comma, quote or line break.
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Renders the log as CSV text, BOM included, rows in display order.
pub fn render_csv(entries: &[LogEntry]) -> String {
    let mut csv = String::from(UTF8_BOM);
    csv.push_str(CSV_HEADER);
    csv.push('\n');

    for (index, entry) in entries.iter().enumerate() {
        let row = [
            (index + 1).to_string(),
            escape_field(entry.category.label()),
            escape_field(&entry.task_label),
            escape_field(&entry.duration_label),
            escape_field(&entry.occurred_label()),
        ];
        csv.push_str(&row.join(","));
        csv.push('\n');
    }
    csv
}

/// File name for an export made on `date`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("pomodoro_logs_{}.csv", date.format("%Y-%m-%d"))
}

/// The user's download directory, or their home directory.
pub fn default_export_dir() -> Result<PathBuf, ExportError> {
    let dirs = UserDirs::new().ok_or(ExportError::NoTargetDir)?;
    Ok(dirs
        .download_dir()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| dirs.home_dir().to_path_buf()))
}

/// Writes the log to `dir`. Returns `None` without writing when the log is empty.
pub fn export_log(entries: &[LogEntry], dir: &Path) -> Result<Option<PathBuf>, ExportError> {
    if entries.is_empty() {
        return Ok(None);
    }

    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(Local::now().date_naive()));
    fs::write(&path, render_csv(entries))?;
    log::info!("Exported {} log entries to {}", entries.len(), path.display());
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::TimeZone;

    fn entry(category: Category, task: &str, duration: &str) -> LogEntry {
        LogEntry {
            category,
            task_label: task.to_string(),
            occurred_at: Local.with_ymd_and_hms(2024, 2, 3, 14, 5, 9).unwrap(),
            duration_label: duration.to_string(),
        }
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
        assert_eq!(escape_field(""), "");
    }

    #[test]
    fn test_render_csv_header_and_bom() {
        let csv = render_csv(&[]);
        assert!(csv.starts_with('\u{feff}'));
        assert_eq!(csv, "\u{feff}No,ジャンル,タスク,実行時間,日時\n");
        assert_eq!(&csv.as_bytes()[..3], &[0xEF, 0xBB, 0xBF]);
    }

    #[test]
    fn test_render_csv_rows_in_display_order() {
        let entries = vec![
            entry(Category::Break, "小休憩", "5分"),
            entry(Category::Work, "review, merge", "24分30秒"),
        ];
        let csv = render_csv(&entries);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "1,休憩,小休憩,5分,2024/2/3 14:05:09");
        assert_eq!(lines[2], "2,作業,\"review, merge\",24分30秒,2024/2/3 14:05:09");
    }

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(export_file_name(date), "pomodoro_logs_2024-01-15.csv");
    }

    #[test]
    fn test_export_empty_log_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(export_log(&[], dir.path()).unwrap().is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_export_log_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let entries = vec![entry(Category::Work, "docs", "25分")];

        let path = export_log(&entries, dir.path()).unwrap().unwrap();
        assert_eq!(path.parent().unwrap(), dir.path());
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, render_csv(&entries));
    }
}
