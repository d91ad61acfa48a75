//! Countdown tick source and time formatting.

use crate::models::{Mode, TimerStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Message sent from background threads to the event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerMessage {
    /// One second elapsed for the countdown run with this generation.
    Tick(u64),
}

/// A periodic tick source the session machine starts and cancels.
///
/// At most one run is live at a time. Ticks are tagged with the generation
/// of the run that produced them so late ticks from a cancelled run can be
/// told apart from current ones.
pub trait Countdown {
    /// Starts a new run, cancelling any previous one. Returns false if no
    /// run could be started.
    fn start(&mut self) -> bool;
    /// Cancels the current run. Idempotent.
    fn stop(&mut self);
    fn is_active(&self) -> bool;
    /// True if a tick of this generation belongs to the live run.
    fn is_current(&self, generation: u64) -> bool;
}

/// Countdown backed by a sleeping thread that posts ticks to a channel.
pub struct ThreadTicker {
    tx: Sender<TimerMessage>,
    interval: Duration,
    generation: u64,
    cancel: Option<Arc<AtomicBool>>,
}

impl ThreadTicker {
    pub fn new(tx: Sender<TimerMessage>) -> Self {
        Self::with_interval(tx, TICK_INTERVAL)
    }

    pub fn with_interval(tx: Sender<TimerMessage>, interval: Duration) -> Self {
        Self {
            tx,
            interval,
            generation: 0,
            cancel: None,
        }
    }
}

impl Countdown for ThreadTicker {
    fn start(&mut self) -> bool {
        self.stop();
        self.generation += 1;

        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let tx = self.tx.clone();
        let interval = self.interval;
        let generation = self.generation;

        let spawned = thread::Builder::new()
            .name(format!("countdown-{generation}"))
            .spawn(move || loop {
                thread::sleep(interval);
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                if tx.send(TimerMessage::Tick(generation)).is_err() {
                    break;
                }
            });

        match spawned {
            Ok(_) => {
                log::debug!("countdown run {generation} started");
                self.cancel = Some(cancel);
                true
            }
            Err(e) => {
                log::error!("Failed to spawn countdown thread: {e}");
                false
            }
        }
    }

    fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.store(true, Ordering::SeqCst);
            log::debug!("countdown run {} cancelled", self.generation);
        }
    }

    fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    fn is_current(&self, generation: u64) -> bool {
        self.is_active() && generation == self.generation
    }
}

impl Drop for ThreadTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Formats the tray title for the current status and mode.
pub fn format_tray_title(status: TimerStatus, mode: Mode, remaining_secs: u32) -> String {
    match (status, mode) {
        (TimerStatus::Stopped, _) => "🍅".to_string(),
        (TimerStatus::Paused, _) => format!("⏸ {}", format_time(remaining_secs)),
        (TimerStatus::Running, Mode::Work) => format!("🍅 {}", format_time(remaining_secs)),
        (TimerStatus::Running, _) => format!("☕ {}", format_time(remaining_secs)),
    }
}

/// Formats time in MM:SS format.
pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
