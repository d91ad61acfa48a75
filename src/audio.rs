//! Audio: the completion chime and the ambient noise bed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;
use thiserror::Error;

const SAMPLE_RATE: u32 = 44100;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to initialize audio output: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("Failed to play audio: {0}")]
    Play(#[from] rodio::PlayError),
    #[error("Audio thread is not running")]
    ThreadGone,
}

/// A short sine chime: fast attack, exponential decay.
pub struct Chime {
    frequency: f32,
    peak: f32,
    floor: f32,
    attack_samples: u32,
    total_samples: u32,
    position: u32,
}

impl Chime {
    pub fn new() -> Self {
        Self {
            frequency: 800.0,
            peak: 0.3,
            floor: 0.01,
            attack_samples: SAMPLE_RATE / 100,
            total_samples: SAMPLE_RATE / 2,
            position: 0,
        }
    }

    /// Envelope gain at a sample position.
    fn gain(&self, pos: u32) -> f32 {
        if pos < self.attack_samples {
            return self.peak * pos as f32 / self.attack_samples as f32;
        }
        let decay_len = (self.total_samples - self.attack_samples) as f32;
        let t = (pos - self.attack_samples) as f32 / decay_len;
        self.peak * (self.floor / self.peak).powf(t)
    }
}

impl Iterator for Chime {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.position >= self.total_samples {
            return None;
        }
        let t = self.position as f32 / SAMPLE_RATE as f32;
        let sample = (2.0 * std::f32::consts::PI * self.frequency * t).sin() * self.gain(self.position);
        self.position += 1;
        Some(sample)
    }
}

impl Source for Chime {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_millis(500))
    }
}

/// Brown noise: integrated white noise, a deep rumble.
pub struct BrownNoise {
    last_value: f32,
    rng: StdRng,
}

impl BrownNoise {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            last_value: 0.0,
            rng,
        }
    }
}

impl Iterator for BrownNoise {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let white: f32 = self.rng.gen_range(-1.0..1.0);

        // Small random steps, clamped and slowly decayed to avoid DC drift
        self.last_value = (self.last_value + white * 0.02).clamp(-1.0, 1.0);
        self.last_value *= 0.9999;

        Some(self.last_value * 0.3)
    }
}

impl Source for BrownNoise {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Plays one-shot sounds on the main thread.
pub struct AudioPlayer {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl AudioPlayer {
    /// Creates a new audio player.
    pub fn new() -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }

    /// Plays the completion chime sound.
    pub fn play_chime(&self) {
        if let Err(e) = self.try_play_chime() {
            log::warn!("Failed to play chime: {e}");
        }
    }

    fn try_play_chime(&self) -> Result<(), AudioError> {
        let sink = Sink::try_new(&self.handle)?;
        sink.append(Chime::new());
        sink.detach(); // Play in background
        Ok(())
    }
}

enum NoiseCommand {
    /// Starts playback, or adjusts the volume if already playing.
    Play(f32),
    Stop,
}

/// Handle to the ambient noise thread.
///
/// Output devices are opened lazily on the audio thread, so failures there
/// are logged and never reach the caller.
pub struct AmbientNoise {
    tx: Sender<NoiseCommand>,
}

impl AmbientNoise {
    pub fn spawn() -> Result<Self, AudioError> {
        let (tx, rx) = mpsc::channel::<NoiseCommand>();

        thread::Builder::new()
            .name("ambient-noise".to_string())
            .spawn(move || {
                let mut output: Option<(OutputStream, Sink)> = None;

                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        NoiseCommand::Play(volume) => {
                            if let Some((_, sink)) = output.as_ref() {
                                sink.set_volume(volume.clamp(0.0, 1.0));
                                continue;
                            }
                            match open_noise_sink(volume) {
                                Ok(opened) => {
                                    log::debug!("Ambient noise started");
                                    output = Some(opened);
                                }
                                Err(e) => log::warn!("Ambient noise unavailable: {e}"),
                            }
                        }
                        NoiseCommand::Stop => {
                            if let Some((_, sink)) = output.take() {
                                sink.stop();
                            }
                        }
                    }
                }
            })
            .map_err(|_| AudioError::ThreadGone)?;

        Ok(Self { tx })
    }

    /// Starts, stops or re-levels the noise to match the settings.
    pub fn apply(&self, enabled: bool, volume: f32) {
        let cmd = if enabled {
            NoiseCommand::Play(volume)
        } else {
            NoiseCommand::Stop
        };
        self.send(cmd);
    }

    fn send(&self, cmd: NoiseCommand) {
        if self.tx.send(cmd).is_err() {
            log::warn!("Ambient noise: {}", AudioError::ThreadGone);
        }
    }
}

fn open_noise_sink(volume: f32) -> Result<(OutputStream, Sink), AudioError> {
    let (stream, handle) = OutputStream::try_default()?;
    let sink = Sink::try_new(&handle)?;
    sink.set_volume(volume.clamp(0.0, 1.0));
    sink.append(BrownNoise::new());
    Ok((stream, sink))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chime_length_and_envelope() {
        let samples: Vec<f32> = Chime::new().collect();
        assert_eq!(samples.len(), (SAMPLE_RATE / 2) as usize);
        assert!(samples.iter().all(|s| s.abs() <= 0.3 + f32::EPSILON));
        assert_eq!(samples[0], 0.0);
    }

    #[test]
    fn test_chime_gain_curve() {
        let chime = Chime::new();
        assert_eq!(chime.gain(0), 0.0);
        assert!((chime.gain(chime.attack_samples) - 0.3).abs() < 1e-6);
        assert!((chime.gain(chime.total_samples) - 0.01).abs() < 1e-4);
        assert!(chime.gain(chime.total_samples / 2) < chime.gain(chime.attack_samples));
    }

    #[test]
    fn test_brown_noise_stays_bounded() {
        let noise = BrownNoise::with_rng(StdRng::seed_from_u64(7));
        for sample in noise.take(SAMPLE_RATE as usize) {
            assert!(sample.abs() <= 0.3);
        }
    }

    #[test]
    fn test_brown_noise_is_endless() {
        let noise = BrownNoise::new();
        assert_eq!(noise.total_duration(), None);
        assert_eq!(noise.channels(), 1);
    }

    #[test]
    fn test_ambient_noise_commands_do_not_panic() {
        // Without an output device the thread just logs.
        let noise = AmbientNoise::spawn().unwrap();
        noise.apply(true, 0.4);
        noise.apply(true, 0.2);
        noise.apply(false, 0.2);
    }

    #[test]
    fn test_audio_player_creation() {
        // This test may fail on systems without audio output
        // That's acceptable for CI environments
        match AudioPlayer::new() {
            Ok(_) => println!("Audio player created successfully"),
            Err(e) => println!("Audio player creation failed (expected on CI): {}", e),
        }
    }
}
