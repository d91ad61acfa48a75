//! System notifications for timer and log events.

use crate::app::CompletionEvent;
use crate::models::Mode;
use notify_rust::Notification;
use std::path::Path;
use std::thread;

const APP_NAME: &str = "Pomolog";

/// System sound for a notification; silent when sound is turned off.
fn sound_for(sound_enabled: bool) -> Option<&'static str> {
    sound_enabled.then_some("default")
}

/// Shows a notification in a background thread so the event loop never blocks.
fn show(summary: String, body: String, sound_enabled: bool) {
    thread::spawn(move || {
        let mut notification = Notification::new();
        notification.appname(APP_NAME).summary(&summary).body(&body);
        if let Some(sound) = sound_for(sound_enabled) {
            notification.sound_name(sound);
        }
        if let Err(e) = notification.show() {
            log::warn!("Failed to show notification: {e}");
        }
    });
}

/// Title and body for a finished session.
pub fn completion_message(event: CompletionEvent) -> (String, String) {
    match event {
        CompletionEvent::WorkComplete { cycle_count, next } => {
            let label = next.break_label().unwrap_or("休憩");
            let body = match next {
                Mode::LongBreak => format!("{}個完了。{}の時間です。", cycle_count, label),
                _ => format!("{}個完了。{}しましょう。", cycle_count, label),
            };
            ("作業時間が終了しました！ 🍅".to_string(), body)
        }
        CompletionEvent::BreakComplete => (
            "休憩時間が終了しました！ ☕".to_string(),
            "次の作業を始めましょう。".to_string(),
        ),
    }
}

pub fn notify_completion(event: CompletionEvent, sound_enabled: bool) {
    let (summary, body) = completion_message(event);
    show(summary, body, sound_enabled);
}

/// Tells the user there was nothing to export.
pub fn notify_export_empty() {
    show(APP_NAME.to_string(), "出力するログがありません".to_string(), false);
}

pub fn notify_exported(path: &Path) {
    show(
        "CSVを出力しました".to_string(),
        path.display().to_string(),
        false,
    );
}
