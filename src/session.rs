//! Session state machine: status, mode rotation and elapsed-time tracking.

use crate::models::{Mode, Settings, TimerStatus};
use crate::session_log::SessionRecord;
use crate::timer::Countdown;

/// Outcome of a session counting down to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// The full-duration record for the finished session.
    pub record: SessionRecord,
    pub finished: Mode,
    pub next: Mode,
    pub cycle_count: u32,
}

/// Timer state plus the countdown handle that drives it.
///
/// The countdown is active exactly when the status is `Running`.
pub struct SessionMachine {
    status: TimerStatus,
    mode: Mode,
    seconds_remaining: u32,
    session_initial_seconds: u32,
    cycle_count: u32,
    countdown: Box<dyn Countdown>,
}

impl SessionMachine {
    /// Stopped, in work mode, with the configured work duration.
    pub fn new(settings: &Settings, countdown: Box<dyn Countdown>) -> Self {
        let secs = settings.duration_for(Mode::Work);
        Self {
            status: TimerStatus::Stopped,
            mode: Mode::Work,
            seconds_remaining: secs,
            session_initial_seconds: secs,
            cycle_count: 0,
            countdown,
        }
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn session_initial_seconds(&self) -> u32 {
        self.session_initial_seconds
    }

    pub fn cycle_count(&self) -> u32 {
        self.cycle_count
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// Seconds counted down since the session was last baselined.
    pub fn elapsed(&self) -> u32 {
        self.session_initial_seconds
            .saturating_sub(self.seconds_remaining)
    }

    /// Fraction of the session already elapsed, in `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        if self.session_initial_seconds == 0 {
            return 0.0;
        }
        self.elapsed() as f32 / self.session_initial_seconds as f32
    }

    /// Whether a tick of this generation belongs to the live countdown.
    pub fn accepts_tick(&self, generation: u64) -> bool {
        self.is_running() && self.countdown.is_current(generation)
    }

    /// Starts or resumes the countdown. Returns false if already running or
    /// if the countdown could not be started.
    pub fn start(&mut self) -> bool {
        if self.is_running() || !self.countdown.start() {
            return false;
        }
        self.status = TimerStatus::Running;
        log::debug!("{:?} session running, {}s left", self.mode, self.seconds_remaining);
        true
    }

    /// Pauses a running countdown. Returns false if not running.
    pub fn pause(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.countdown.stop();
        self.status = TimerStatus::Paused;
        log::debug!("{:?} session paused, {}s left", self.mode, self.seconds_remaining);
        true
    }

    pub fn toggle(&mut self) {
        if self.is_running() {
            self.pause();
        } else {
            self.start();
        }
    }

    /// Stops and rewinds to the configured duration for the current mode.
    ///
    /// A paused session with time on the clock is returned as an abandoned
    /// record so the caller can log it.
    pub fn reset(&mut self, settings: &Settings) -> Option<SessionRecord> {
        let abandoned = self.abandoned_record();
        self.rewind(settings);
        abandoned
    }

    /// Switches mode with the same semantics as [`reset`](Self::reset).
    /// The abandoned record belongs to the mode being left.
    pub fn switch_mode(&mut self, mode: Mode, settings: &Settings) -> Option<SessionRecord> {
        let abandoned = self.abandoned_record();
        self.mode = mode;
        self.rewind(settings);
        abandoned
    }

    fn abandoned_record(&self) -> Option<SessionRecord> {
        (self.status == TimerStatus::Paused && self.elapsed() > 0)
            .then(|| SessionRecord::abandoned(self.mode, self.elapsed()))
    }

    fn rewind(&mut self, settings: &Settings) {
        self.countdown.stop();
        self.status = TimerStatus::Stopped;
        self.seconds_remaining = settings.duration_for(self.mode);
        self.session_initial_seconds = self.seconds_remaining;
    }

    /// Advances the countdown by one second.
    pub fn on_tick(&mut self, settings: &Settings) -> Option<Completion> {
        if !self.is_running() {
            return None;
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining == 0 {
            Some(self.complete(settings))
        } else {
            None
        }
    }

    fn complete(&mut self, settings: &Settings) -> Completion {
        // Leave Running before rotating so the mode switch cannot log the
        // finished session a second time as abandoned.
        self.countdown.stop();
        self.status = TimerStatus::Stopped;

        let finished = self.mode;
        let record = SessionRecord::completed(finished);

        let next = match finished {
            Mode::Work => {
                self.cycle_count = self.cycle_count.saturating_add(1);
                if self.cycle_count % settings.long_break_interval.max(1) == 0 {
                    Mode::LongBreak
                } else {
                    Mode::ShortBreak
                }
            }
            Mode::ShortBreak | Mode::LongBreak => Mode::Work,
        };

        self.mode = next;
        self.rewind(settings);

        if settings.auto_start && !self.start() {
            log::warn!("Could not auto-start {next:?}");
        }
        log::info!("{finished:?} session complete, next {next:?}");

        Completion {
            record,
            finished,
            next,
            cycle_count: self.cycle_count,
        }
    }

    /// Sets the remaining time from `MM:SS` text. Ignored while running or
    /// when the text does not match.
    pub fn edit_remaining(&mut self, text: &str) -> bool {
        if self.is_running() {
            return false;
        }
        match parse_clock(text) {
            Some(secs) => {
                self.seconds_remaining = secs;
                self.session_initial_seconds = secs;
                true
            }
            None => false,
        }
    }

    /// Sets the cycle count from text. Only non-negative integers apply.
    pub fn edit_cycle_count(&mut self, text: &str) -> bool {
        match text.trim().parse::<u32>() {
            Ok(count) => {
                self.cycle_count = count;
                true
            }
            Err(_) => false,
        }
    }

    /// Re-reads durations from settings when nothing is in progress.
    pub fn apply_settings(&mut self, settings: &Settings) {
        if self.status == TimerStatus::Stopped {
            self.rewind(settings);
        }
    }
}

/// Parses `M:SS` or `MM:SS` with seconds below 60.
pub fn parse_clock(text: &str) -> Option<u32> {
    let (mins, secs) = text.trim().split_once(':')?;
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !(1..=2).contains(&mins.len()) || secs.len() != 2 || !all_digits(mins) || !all_digits(secs) {
        return None;
    }
    let mins: u32 = mins.parse().ok()?;
    let secs: u32 = secs.parse().ok()?;
    (secs < 60).then_some(mins * 60 + secs)
}
