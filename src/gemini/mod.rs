//! Thin REST client for the generative-language API.
//!
//! Requests are plain `json!` bodies posted to
//! `{endpoint}/models/{model}:generateContent?key=...`; any non-2xx answer
//! becomes [`GenError::Upstream`] with the body kept verbatim so the retry
//! and quota checks can classify it.

pub mod media;
pub mod speech;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{GenError, Result};
use crate::params::GenerationParameters;
use crate::prompt::{self, GenerationMode, SuggestionKind};
use crate::repair;
use crate::retry::{CancelToken, RetryPolicy};
use crate::section::GeneratedSection;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model names per call family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSet {
    /// Suggestions, web-grounded search, media analysis.
    pub text: String,
    /// Structured section generation.
    pub pro: String,
    /// Map-grounded search.
    pub maps: String,
    pub speech: String,
    pub image: String,
    pub video: String,
    pub voice: String,
    /// Token budget sent when deep reasoning is on.
    pub thinking_budget: u32,
}

impl Default for ModelSet {
    fn default() -> Self {
        Self {
            text: "gemini-3-flash-preview".into(),
            pro: "gemini-3-pro-preview".into(),
            maps: "gemini-2.5-flash-lite-latest".into(),
            speech: "gemini-2.5-flash-preview-tts".into(),
            image: "gemini-2.5-flash-image".into(),
            video: "veo-3.1-fast-generate-preview".into(),
            voice: "Kore".into(),
            thinking_budget: 32_768,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub models: ModelSet,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            models: ModelSet::default(),
            timeout: Duration::from_secs(300),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTool {
    Web,
    Maps,
}

impl FromStr for SearchTool {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "web" => Ok(SearchTool::Web),
            "maps" => Ok(SearchTool::Maps),
            other => Err(format!("unknown search tool {other} (expected web or maps)")),
        }
    }
}

impl fmt::Display for SearchTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SearchTool::Web => "web",
            SearchTool::Maps => "maps",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub uri: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundedAnswer {
    pub text: String,
    pub sources: Vec<GroundingSource>,
}

pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()?)
}

/// Every `text` part of the first candidate, concatenated. Empty when the
/// response has no candidates or no text parts.
pub fn text_of(resp: &Value) -> String {
    resp["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Sources cited by a grounded answer; chunks that are neither web nor maps
/// results are skipped.
pub fn grounding_sources(resp: &Value) -> Vec<GroundingSource> {
    let Some(chunks) = resp["candidates"][0]["groundingMetadata"]["groundingChunks"].as_array() else {
        return Vec::new();
    };
    chunks
        .iter()
        .filter_map(|chunk| {
            let source = chunk.get("web").or_else(|| chunk.get("maps"))?;
            Some(GroundingSource {
                uri: source["uri"].as_str()?.to_string(),
                title: source["title"].as_str().unwrap_or_default().to_string(),
            })
        })
        .collect()
}

fn user_text(text: &str) -> Value {
    json!([{ "role": "user", "parts": [{ "text": text }] }])
}

/// Body of a structured section request.
pub fn sections_request(
    instruction: &str,
    schema: &Value,
    temperature: f32,
    thinking_budget: Option<u32>,
) -> Value {
    let mut config = json!({
        "responseMimeType": "application/json",
        "responseSchema": schema,
        "temperature": temperature,
    });
    if let Some(budget) = thinking_budget {
        config["thinkingConfig"] = json!({ "thinkingBudget": budget });
    }
    json!({
        "contents": user_text(instruction),
        "generationConfig": config,
    })
}

/// Body of a grounded search request.
pub fn grounded_request(query: &str, tool: SearchTool, location: Option<LatLng>) -> Value {
    let tools = match tool {
        SearchTool::Web => json!([{ "googleSearch": {} }]),
        SearchTool::Maps => json!([{ "googleMaps": {} }]),
    };
    let mut body = json!({
        "contents": user_text(query),
        "tools": tools,
    });
    if let (SearchTool::Maps, Some(loc)) = (tool, location) {
        body["toolConfig"] = json!({
            "retrievalConfig": {
                "latLng": { "latitude": loc.latitude, "longitude": loc.longitude }
            }
        });
    }
    body
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        Ok(Self {
            http: build_client(config.timeout)?,
            config,
        })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    pub fn models(&self) -> &ModelSet {
        &self.config.models
    }

    fn model_url(&self, model: &str, action: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.config.endpoint, model, action, self.config.api_key
        )
    }

    async fn read_json(resp: reqwest::Response) -> Result<Value> {
        let status = resp.status();
        if !status.is_success() {
            return Err(GenError::Upstream {
                status: status.as_u16(),
                body: resp.text().await?,
            });
        }
        Ok(resp.json().await?)
    }

    pub(crate) async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        let resp = self.http.post(url).json(body).send().await?;
        Self::read_json(resp).await
    }

    pub(crate) async fn get_json(&self, url: &str) -> Result<Value> {
        let resp = self.http.get(url).send().await?;
        Self::read_json(resp).await
    }

    /// One raw `generateContent` call, no retry.
    pub async fn generate_content(&self, model: &str, body: &Value) -> Result<Value> {
        log::debug!("generateContent on {model}");
        self.post_json(&self.model_url(model, "generateContent"), body).await
    }

    /// `generate_content` under the retry policy.
    async fn generate_content_retrying(
        &self,
        model: &str,
        body: &Value,
        cancel: Option<&CancelToken>,
    ) -> Result<Value> {
        self.config
            .retry
            .run(|| self.generate_content(model, body), GenError::is_transient, cancel)
            .await
    }

    /// Structured generation: request, retry on transient failures, repair
    /// the JSON text into sections.
    pub async fn generate_sections(
        &self,
        instruction: &str,
        schema: &Value,
        temperature: f32,
        deep_reasoning: bool,
        cancel: Option<&CancelToken>,
    ) -> Result<Vec<GeneratedSection>> {
        let budget = deep_reasoning.then_some(self.config.models.thinking_budget);
        let body = sections_request(instruction, schema, temperature, budget);
        let resp = self
            .generate_content_retrying(&self.config.models.pro, &body, cancel)
            .await?;

        let sections = repair::parse_sections(&text_of(&resp))?;
        log::info!("model returned {} section(s)", sections.len());
        Ok(sections)
    }

    /// Build the prompt for `mode` and run it.
    pub async fn generate(
        &self,
        params: &GenerationParameters,
        mode: GenerationMode,
        cancel: Option<&CancelToken>,
    ) -> Result<Vec<GeneratedSection>> {
        let spec = prompt::build(params, mode);
        log::info!(
            "generating {mode} for {} grade {} (temperature {}, deep reasoning {})",
            params.subject,
            params.grade,
            spec.temperature,
            params.deep_reasoning
        );
        self.generate_sections(
            &spec.instruction,
            &spec.schema,
            spec.temperature,
            params.deep_reasoning,
            cancel,
        )
        .await
    }

    /// Free-text suggestion (Markdown).
    pub async fn suggest(
        &self,
        params: &GenerationParameters,
        kind: SuggestionKind,
        cancel: Option<&CancelToken>,
    ) -> Result<String> {
        let body = json!({ "contents": user_text(&prompt::suggestion(params, kind)) });
        let resp = self
            .generate_content_retrying(&self.config.models.text, &body, cancel)
            .await?;
        let text = text_of(&resp);
        if text.trim().is_empty() {
            return Err(GenError::EmptyResponse);
        }
        Ok(text)
    }

    /// Search-grounded answer with its cited sources.
    pub async fn grounded_search(
        &self,
        query: &str,
        tool: SearchTool,
        location: Option<LatLng>,
        cancel: Option<&CancelToken>,
    ) -> Result<GroundedAnswer> {
        let model = match tool {
            SearchTool::Web => &self.config.models.text,
            SearchTool::Maps => &self.config.models.maps,
        };
        let body = grounded_request(query, tool, location);
        let resp = self.generate_content_retrying(model, &body, cancel).await?;

        let answer = GroundedAnswer {
            text: text_of(&resp),
            sources: grounding_sources(&resp),
        };
        log::info!("{tool} search returned {} source(s)", answer.sources.len());
        Ok(answer)
    }
}
