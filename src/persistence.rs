//! SQLite key-value persistence for settings, the session log and the theme.

use crate::models::{LogEntry, Settings, Theme};
use directories::ProjectDirs;
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

const KEY_SETTINGS: &str = "settings";
const KEY_SESSION_LOG: &str = "sessionLog";
const KEY_THEME: &str = "themePreference";

/// Environment variable that overrides the database location.
const DB_PATH_ENV: &str = "POMOLOG_DB";

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to create database directory")]
    DirectoryCreation,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens the database at the configured location, creating it if needed.
    pub fn new() -> Result<Self, DatabaseError> {
        Self::open(&Self::db_path())
    }

    /// Opens (or creates) a database file at `path`.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|_| DatabaseError::DirectoryCreation)?;
        }

        let conn = Connection::open(path)?;
        Self::initialize_tables(&conn)?;
        log::info!("Using database at {}", path.display());

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing).
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_tables(&conn)?;
        Ok(Self { conn })
    }

    fn initialize_tables(conn: &Connection) -> Result<(), DatabaseError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
        "#,
        )?;
        Ok(())
    }

    fn db_path() -> PathBuf {
        if let Some(path) = std::env::var_os(DB_PATH_ENV) {
            return PathBuf::from(path);
        }
        ProjectDirs::from("com", "pomolog", "Pomolog")
            .map(|dirs| dirs.data_dir().join("pomolog.db"))
            .unwrap_or_else(|| PathBuf::from("pomolog.db"))
    }

    fn get_raw(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |row| row.get(0))
            .optional()?)
    }

    fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?, ?)",
            [key, json.as_str()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?", [key])?;
        Ok(())
    }

    /// Reads and parses a key. A value that fails to parse is deleted.
    fn load_or_discard<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.get_raw(key) {
            Ok(raw) => raw?,
            Err(e) => {
                log::warn!("Failed to read {key}: {e}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Discarding unreadable {key}: {e}");
                if let Err(e) = self.remove(key) {
                    log::error!("Failed to remove {key}: {e}");
                }
                None
            }
        }
    }

    /// Loads settings, falling back to defaults for anything unusable.
    pub fn load_settings(&self) -> Settings {
        self.load_or_discard::<Value>(KEY_SETTINGS)
            .map(|value| Settings::from_stored(&value))
            .unwrap_or_default()
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<(), DatabaseError> {
        self.put(KEY_SETTINGS, settings)
    }

    /// Loads the session log, newest first. Unreadable logs load as empty.
    pub fn load_log(&self) -> Vec<LogEntry> {
        self.load_or_discard(KEY_SESSION_LOG).unwrap_or_default()
    }

    pub fn save_log(&self, entries: &[LogEntry]) -> Result<(), DatabaseError> {
        self.put(KEY_SESSION_LOG, entries)
    }

    pub fn load_theme(&self) -> Theme {
        self.load_or_discard(KEY_THEME).unwrap_or_default()
    }

    pub fn save_theme(&self, theme: Theme) -> Result<(), DatabaseError> {
        self.put(KEY_THEME, &theme)
    }

    #[cfg(test)]
    fn put_raw(&self, key: &str, raw: &str) {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?, ?)",
                [key, raw],
            )
            .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::{Local, TimeZone};

    fn entry(task: &str) -> LogEntry {
        LogEntry {
            category: Category::Work,
            task_label: task.to_string(),
            occurred_at: Local.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap(),
            duration_label: "25分".to_string(),
        }
    }

    #[test]
    fn test_database_creation() {
        let db = Database::new_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_settings_save_and_load() {
        let db = Database::new_in_memory().unwrap();

        // Default settings should be returned when nothing is saved
        assert_eq!(db.load_settings(), Settings::default());

        let custom_settings = Settings {
            work_seconds: 1800,
            short_break_seconds: 600,
            long_break_seconds: 1200,
            long_break_interval: 3,
            auto_start: false,
            notification_sound_enabled: true,
            ambient_noise_enabled: true,
            ambient_noise_volume: 0.75,
        };
        db.save_settings(&custom_settings).unwrap();

        assert_eq!(db.load_settings(), custom_settings);
    }

    #[test]
    fn test_settings_overwrite() {
        let db = Database::new_in_memory().unwrap();

        let settings1 = Settings {
            work_seconds: 1800,
            ..Settings::default()
        };
        db.save_settings(&settings1).unwrap();

        let settings2 = Settings {
            work_seconds: 2700,
            ..Settings::default()
        };
        db.save_settings(&settings2).unwrap();

        assert_eq!(db.load_settings().work_seconds, 2700);
    }

    #[test]
    fn test_corrupt_settings_are_discarded() {
        let db = Database::new_in_memory().unwrap();
        db.put_raw(KEY_SETTINGS, "{not json");

        assert_eq!(db.load_settings(), Settings::default());
        assert_eq!(db.get_raw(KEY_SETTINGS).unwrap(), None);
    }

    #[test]
    fn test_partial_settings_keep_valid_fields() {
        let db = Database::new_in_memory().unwrap();
        db.put_raw(KEY_SETTINGS, r#"{"workSeconds": 600, "shortBreakSeconds": "x"}"#);

        let settings = db.load_settings();
        assert_eq!(settings.work_seconds, 600);
        assert_eq!(settings.short_break_seconds, 300);
    }

    #[test]
    fn test_log_save_and_load_preserves_order() {
        let db = Database::new_in_memory().unwrap();
        assert!(db.load_log().is_empty());

        let entries = vec![entry("newest"), entry("older")];
        db.save_log(&entries).unwrap();
        assert_eq!(db.load_log(), entries);

        db.save_log(&[]).unwrap();
        assert!(db.load_log().is_empty());
    }

    #[test]
    fn test_corrupt_log_is_discarded() {
        let db = Database::new_in_memory().unwrap();
        db.put_raw(KEY_SESSION_LOG, r#"[{"category": "nap"}]"#);

        assert!(db.load_log().is_empty());
        assert_eq!(db.get_raw(KEY_SESSION_LOG).unwrap(), None);
    }

    #[test]
    fn test_theme_save_and_load() {
        let db = Database::new_in_memory().unwrap();
        assert_eq!(db.load_theme(), Theme::Light);

        db.save_theme(Theme::Dark).unwrap();
        assert_eq!(db.load_theme(), Theme::Dark);

        db.put_raw(KEY_THEME, "\"sepia\"");
        assert_eq!(db.load_theme(), Theme::Light);
    }

    #[test]
    fn test_keys_are_independent() {
        let db = Database::new_in_memory().unwrap();
        db.save_theme(Theme::Dark).unwrap();
        db.put_raw(KEY_SESSION_LOG, "garbage");

        assert!(db.load_log().is_empty());
        assert_eq!(db.load_theme(), Theme::Dark);
    }

    #[test]
    fn test_file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("pomolog.db");

        {
            let db = Database::open(&path).unwrap();
            db.save_log(&[entry("persisted")]).unwrap();
            db.save_theme(Theme::Dark).unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.load_log()[0].task_label, "persisted");
        assert_eq!(db.load_theme(), Theme::Dark);
    }
}
