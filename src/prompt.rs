//! Native dialogs for text entry and confirmation.
//!
//! The tray menu cannot take keyboard input, so edits and destructive
//! actions go through AppleScript dialogs shown by `osascript`.

use std::io;
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Failed to run osascript: {0}")]
    Spawn(#[from] io::Error),
    #[error("Unexpected dialog output: {0}")]
    Output(String),
}

/// Asks the user things. Cancelled dialogs answer "no".
pub trait Prompter {
    /// Returns true only if the user explicitly confirmed.
    fn confirm(&self, message: &str) -> bool;
    /// Returns the entered text, or `None` if the dialog was cancelled.
    fn ask_text(&self, message: &str, default: &str) -> Option<String>;
}

/// Prompter backed by `display dialog`.
pub struct DialogPrompter;

impl DialogPrompter {
    fn run(script: &str) -> Result<Option<String>, PromptError> {
        let output = Command::new("osascript").arg("-e").arg(script).output()?;
        if !output.status.success() {
            // Exit status 1 with "User canceled" is the cancel button.
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
    }
}

impl Prompter for DialogPrompter {
    fn confirm(&self, message: &str) -> bool {
        match Self::run(&confirm_script(message)) {
            Ok(answer) => answer.is_some(),
            Err(e) => {
                log::warn!("Confirmation dialog failed: {e}");
                false
            }
        }
    }

    fn ask_text(&self, message: &str, default: &str) -> Option<String> {
        let result = Self::run(&text_script(message, default)).and_then(|out| match out {
            Some(out) => parse_text_returned(&out)
                .map(Some)
                .ok_or(PromptError::Output(out)),
            None => Ok(None),
        });
        match result {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Text dialog failed: {e}");
                None
            }
        }
    }
}

/// Escapes text for an AppleScript string literal.
fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

fn confirm_script(message: &str) -> String {
    format!(
        "display dialog {} with title \"Pomolog\" buttons {{\"Cancel\", \"OK\"}} default button \"OK\" cancel button \"Cancel\"",
        quote(message)
    )
}

fn text_script(message: &str, default: &str) -> String {
    format!(
        "display dialog {} with title \"Pomolog\" default answer {} buttons {{\"Cancel\", \"OK\"}} default button \"OK\" cancel button \"Cancel\"",
        quote(message),
        quote(default)
    )
}

/// Extracts the answer from `button returned:OK, text returned:...`.
fn parse_text_returned(output: &str) -> Option<String> {
    let (_, text) = output.split_once("text returned:")?;
    Some(text.trim_end_matches(['\r', '\n']).to_string())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(quote(r"back\slash"), r#""back\\slash""#);
    }

    #[test]
    fn test_text_script_contains_default() {
        let script = text_script("Remaining time (MM:SS)", "25:00");
        assert!(script.starts_with("display dialog \"Remaining time (MM:SS)\""));
        assert!(script.contains("default answer \"25:00\""));
    }

    #[test]
    fn test_confirm_script() {
        let script = confirm_script("ログを全て消去しますか？");
        assert!(script.contains("\"ログを全て消去しますか？\""));
        assert!(script.contains("cancel button \"Cancel\""));
    }

    #[test]
    fn test_parse_text_returned() {
        assert_eq!(
            parse_text_returned("button returned:OK, text returned:05:30\n"),
            Some("05:30".to_string())
        );
        assert_eq!(
            parse_text_returned("button returned:OK, text returned:\n"),
            Some(String::new())
        );
        assert_eq!(parse_text_returned("button returned:OK\n"), None);
    }

    #[test]
    #[ignore = "Requires an interactive macOS session"]
    fn test_dialog_confirm() {
        DialogPrompter.confirm("Testing Pomolog dialogs");
    }
}
