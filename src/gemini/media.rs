//! Image and video calls. Payloads are passed through as base64; nothing here
//! post-processes media.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::sleep;

use super::{text_of, GeminiClient};
use crate::error::{GenError, Result};
use crate::retry::{CancelToken, Canceled};

/// Base64 media with its MIME type, as carried in `inlineData` parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

impl InlineData {
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Read a local file, MIME type guessed from the extension.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        Ok(Self::from_bytes(mime_for_extension(&ext), &bytes))
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        Ok(STANDARD.decode(&self.data)?)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// File extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            "video/mp4" => "mp4",
            _ => "png",
        }
    }

    fn part(&self) -> Value {
        json!({ "inlineData": { "data": self.data, "mimeType": self.mime_type } })
    }
}

fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        _ => "image/png",
    }
}

/// First `inlineData` part of the first candidate.
pub fn first_inline_data(resp: &Value) -> Option<InlineData> {
    resp["candidates"][0]["content"]["parts"]
        .as_array()?
        .iter()
        .find_map(|p| serde_json::from_value(p.get("inlineData")?.clone()).ok())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoAspect {
    #[default]
    Landscape,
    Portrait,
}

impl VideoAspect {
    pub fn ratio(self) -> &'static str {
        match self {
            VideoAspect::Landscape => "16:9",
            VideoAspect::Portrait => "9:16",
        }
    }
}

impl fmt::Display for VideoAspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ratio())
    }
}

impl FromStr for VideoAspect {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "16:9" | "landscape" => Ok(VideoAspect::Landscape),
            "9:16" | "portrait" => Ok(VideoAspect::Portrait),
            other => Err(format!("unsupported aspect ratio {other} (16:9 or 9:16)")),
        }
    }
}

/// Snapshot of a long-running video generation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VideoOperation {
    pub name: String,
    pub done: bool,
    pub video_uris: Vec<String>,
    pub error: Option<String>,
}

impl VideoOperation {
    pub fn from_response(resp: &Value) -> Result<Self> {
        let name = resp["name"]
            .as_str()
            .ok_or_else(|| GenError::MalformedResponse("operation without a name".into()))?
            .to_string();
        let video_uris = resp["response"]["generateVideoResponse"]["generatedSamples"]
            .as_array()
            .map(|samples| {
                samples
                    .iter()
                    .filter_map(|s| s["video"]["uri"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        let error = resp.get("error").filter(|e| !e.is_null()).map(|e| {
            e["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| e.to_string())
        });
        Ok(Self {
            name,
            done: resp["done"].as_bool().unwrap_or(false),
            video_uris,
            error,
        })
    }
}

/// Poll interval used by [`GeminiClient::wait_for_video`] callers by default.
pub const VIDEO_POLL_INTERVAL: Duration = Duration::from_secs(10);

impl GeminiClient {
    /// Square image from a text prompt.
    pub async fn generate_image(&self, prompt: &str) -> Result<InlineData> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "imageConfig": { "aspectRatio": "1:1" } },
        });
        let resp = self.generate_content(&self.models().image, &body).await?;
        first_inline_data(&resp).ok_or(GenError::MissingPayload("image"))
    }

    pub async fn edit_image(&self, image: &InlineData, prompt: &str) -> Result<InlineData> {
        let body = json!({
            "contents": [{ "parts": [image.part(), { "text": prompt }] }],
        });
        let resp = self.generate_content(&self.models().image, &body).await?;
        first_inline_data(&resp).ok_or(GenError::MissingPayload("image"))
    }

    /// Free-text description; may be empty.
    pub async fn analyze_image(&self, image: &InlineData, prompt: &str) -> Result<String> {
        let body = json!({
            "contents": [{ "parts": [image.part(), { "text": prompt }] }],
        });
        let resp = self.generate_content(&self.models().text, &body).await?;
        Ok(text_of(&resp))
    }

    /// Analyse frames sampled from a video, in order, followed by the prompt.
    pub async fn analyze_video_frames(&self, frames: &[InlineData], prompt: &str) -> Result<String> {
        let mut parts: Vec<Value> = frames.iter().map(InlineData::part).collect();
        parts.push(json!({ "text": prompt }));
        let body = json!({ "contents": [{ "parts": parts }] });
        let resp = self.generate_content(&self.models().text, &body).await?;
        Ok(text_of(&resp))
    }

    /// Start a video generation (one 720p clip). Returns the pending operation.
    pub async fn generate_video(
        &self,
        prompt: &str,
        image: Option<&InlineData>,
        aspect: VideoAspect,
    ) -> Result<VideoOperation> {
        let mut instance = json!({ "prompt": prompt });
        if let Some(img) = image {
            instance["image"] = json!({
                "bytesBase64Encoded": img.data,
                "mimeType": img.mime_type,
            });
        }
        let body = json!({
            "instances": [instance],
            "parameters": {
                "aspectRatio": aspect.ratio(),
                "resolution": "720p",
                "numberOfVideos": 1,
            },
        });
        let url = self.model_url(&self.models().video, "predictLongRunning");
        let resp = self.post_json(&url, &body).await?;
        let op = VideoOperation::from_response(&resp)?;
        log::info!("video generation started: {}", op.name);
        Ok(op)
    }

    pub async fn check_video_operation(&self, name: &str) -> Result<VideoOperation> {
        let config = self.config();
        let url = format!("{}/{}?key={}", config.endpoint, name, config.api_key);
        VideoOperation::from_response(&self.get_json(&url).await?)
    }

    /// Poll until the operation is done or `cancel` fires.
    pub async fn wait_for_video(
        &self,
        name: &str,
        interval: Duration,
        cancel: Option<&CancelToken>,
    ) -> Result<VideoOperation> {
        loop {
            let op = self.check_video_operation(name).await?;
            if op.done {
                return Ok(op);
            }
            log::info!("video {name} still running");
            match cancel {
                Some(token) => tokio::select! {
                    _ = sleep(interval) => {}
                    _ = token.cancelled() => return Err(Canceled.into()),
                },
                None => sleep(interval).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_and_extension() {
        let img = InlineData::from_bytes("image/jpeg", b"abc");
        assert_eq!(img.to_data_uri(), "data:image/jpeg;base64,YWJj");
        assert_eq!(img.extension(), "jpg");
        assert_eq!(img.decode().unwrap(), b"abc");
    }

    #[test]
    fn first_inline_part_wins() {
        let resp = json!({ "candidates": [{ "content": { "parts": [
            { "text": "here you go" },
            { "inlineData": { "mimeType": "image/png", "data": "AAA=" } },
            { "inlineData": { "mimeType": "image/png", "data": "BBB=" } }
        ]}}]});
        let img = first_inline_data(&resp).unwrap();
        assert_eq!(img.data, "AAA=");
        assert!(first_inline_data(&json!({ "candidates": [] })).is_none());
    }

    #[test]
    fn finished_operation_lists_videos() {
        let resp = json!({
            "name": "models/veo/operations/abc",
            "done": true,
            "response": { "generateVideoResponse": { "generatedSamples": [
                { "video": { "uri": "https://files.example/v1.mp4" } }
            ]}}
        });
        let op = VideoOperation::from_response(&resp).unwrap();
        assert!(op.done);
        assert_eq!(op.video_uris, ["https://files.example/v1.mp4"]);
        assert_eq!(op.error, None);
    }

    #[test]
    fn pending_and_failed_operations() {
        let pending = VideoOperation::from_response(&json!({ "name": "operations/x" })).unwrap();
        assert!(!pending.done);
        assert!(pending.video_uris.is_empty());

        let failed = VideoOperation::from_response(&json!({
            "name": "operations/y", "done": true,
            "error": { "code": 3, "message": "prompt rejected" }
        }))
        .unwrap();
        assert_eq!(failed.error.as_deref(), Some("prompt rejected"));

        assert!(VideoOperation::from_response(&json!({ "done": true })).is_err());
    }

    #[test]
    fn aspect_ratio_parses() {
        assert_eq!("9:16".parse::<VideoAspect>(), Ok(VideoAspect::Portrait));
        assert_eq!(VideoAspect::default().ratio(), "16:9");
        assert!("4:3".parse::<VideoAspect>().is_err());
    }
}
