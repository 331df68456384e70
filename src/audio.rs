//! Speech payload decoding and the caller-side speech session state.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::time::Duration;

use crate::error::{GenError, Result};

/// Sample rate of the speech endpoint's PCM output.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;
pub const SPEECH_CHANNELS: u16 = 1;

/// Decoded audio, samples interleaved and normalised to [-1.0, 1.0).
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl AudioBuffer {
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate))
    }

    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}

/// Little-endian signed 16-bit PCM to floats (sample / 32768). A trailing odd
/// byte is dropped.
pub fn decode_pcm16(bytes: &[u8], sample_rate: u32, channels: u16) -> AudioBuffer {
    let samples = bytes
        .chunks_exact(2)
        .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / 32768.0)
        .collect();
    AudioBuffer {
        sample_rate,
        channels,
        samples,
    }
}

/// Base64 speech payload straight from the response.
pub fn decode_speech_payload(b64: &str) -> Result<(Vec<u8>, AudioBuffer)> {
    let bytes = STANDARD.decode(b64.trim())?;
    let buffer = decode_pcm16(&bytes, SPEECH_SAMPLE_RATE, SPEECH_CHANNELS);
    Ok((bytes, buffer))
}

/// What the player must do after a play request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackAction {
    /// Stop `previous` (if any) and start the requested clip.
    Start { stop_previous: Option<String> },
    /// The requested clip was playing; stop it.
    Stop(String),
    /// Speech is disabled for this session.
    Unavailable,
}

/// Single active clip. Starting another clip hands back the one to stop.
#[derive(Debug, Clone, Default)]
pub struct PlaybackSlot {
    active: Option<String>,
}

impl PlaybackSlot {
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Make `id` the active clip; returns the previously active one.
    pub fn start(&mut self, id: &str) -> Option<String> {
        self.active.replace(id.to_string())
    }

    /// Play / stop toggle for `id`.
    pub fn toggle(&mut self, id: &str) -> PlaybackAction {
        if self.active.as_deref() == Some(id) {
            self.active = None;
            return PlaybackAction::Stop(id.to_string());
        }
        PlaybackAction::Start {
            stop_previous: self.start(id),
        }
    }

    /// Clip ended on its own (or failed to start).
    pub fn finished(&mut self, id: &str) {
        if self.active.as_deref() == Some(id) {
            self.active = None;
        }
    }
}

/// Per-session speech state owned by the caller. A quota failure switches
/// the feature off until a new session.
#[derive(Debug, Clone)]
pub struct SpeechSession {
    available: bool,
    slot: PlaybackSlot,
}

impl Default for SpeechSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechSession {
    pub fn new() -> Self {
        Self {
            available: true,
            slot: PlaybackSlot::default(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn active(&self) -> Option<&str> {
        self.slot.active()
    }

    pub fn toggle(&mut self, section_id: &str) -> PlaybackAction {
        if !self.available {
            return PlaybackAction::Unavailable;
        }
        self.slot.toggle(section_id)
    }

    pub fn finished(&mut self, section_id: &str) {
        self.slot.finished(section_id);
    }

    /// Record a failed synthesis. Returns true when this latched the feature off.
    pub fn record_failure(&mut self, section_id: &str, err: &GenError) -> bool {
        self.slot.finished(section_id);
        if self.available && err.is_quota_exceeded() {
            log::warn!("speech quota exceeded, disabling audio for this session");
            self.available = false;
            return true;
        }
        log::error!("speech synthesis for {section_id} failed: {err}");
        false
    }
}
