//! Text-to-speech calls on the speech model.

use serde_json::{json, Value};

use super::GeminiClient;
use crate::audio::{self, AudioBuffer};
use crate::error::{GenError, Result};

/// Synthesised speech: the raw s16le bytes and their decoded samples.
#[derive(Debug, Clone)]
pub struct SpeechClip {
    pub pcm: Vec<u8>,
    pub audio: AudioBuffer,
}

pub fn speech_request(text: &str, voice: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": text }] }],
        "generationConfig": {
            "responseModalities": ["AUDIO"],
            "speechConfig": {
                "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice } }
            }
        }
    })
}

impl GeminiClient {
    /// Single attempt; a quota failure surfaces as an `Upstream` error for
    /// which `is_quota_exceeded()` holds.
    pub async fn text_to_speech(&self, text: &str) -> Result<SpeechClip> {
        let models = self.models();
        let body = speech_request(text, &models.voice);
        let resp = self.generate_content(&models.speech, &body).await?;

        let b64 = resp["candidates"][0]["content"]["parts"][0]["inlineData"]["data"]
            .as_str()
            .filter(|s| !s.is_empty())
            .ok_or(GenError::MissingPayload("audio"))?;
        let (pcm, audio) = audio::decode_speech_payload(b64)?;
        log::info!(
            "synthesised {:.1}s of speech for {} chars",
            audio.duration().as_secs_f64(),
            text.chars().count()
        );
        Ok(SpeechClip { pcm, audio })
    }
}
