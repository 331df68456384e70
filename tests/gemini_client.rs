use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use guru_gen::gemini::media::{InlineData, VideoAspect};
use guru_gen::gemini::{GroundingSource, LatLng, SearchTool};
use guru_gen::prompt::{self, SuggestionKind};
use guru_gen::{
    CancelToken, GenError, GeminiClient, GeminiConfig, GenerationMode, GenerationParameters,
    RetryPolicy,
};

const PRO: &str = "/models/gemini-3-pro-preview:generateContent";
const TEXT: &str = "/models/gemini-3-flash-preview:generateContent";

fn client_for(server: &MockServer, max_retries: u32) -> GeminiClient {
    let config = GeminiConfig::new("test-key")
        .with_endpoint(server.uri())
        .with_retry(RetryPolicy::new(max_retries, Duration::from_millis(10)));
    GeminiClient::new(config).unwrap()
}

fn candidate_text(text: &str) -> Value {
    json!({ "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }] })
}

fn unavailable() -> ResponseTemplate {
    ResponseTemplate::new(503).set_body_json(json!({
        "error": { "code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE" }
    }))
}

async fn sections(client: &GeminiClient, cancel: Option<&CancelToken>) -> Result<Vec<guru_gen::GeneratedSection>, GenError> {
    client
        .generate_sections("buat soal", &prompt::sections_schema(), 0.5, false, cancel)
        .await
}

// ============================================================================
// Structured generation
// ============================================================================

#[tokio::test]
async fn fenced_json_answer_becomes_sections() {
    let server = MockServer::start().await;
    let text = "```json\n{\"sections\":[\
        {\"id\":\"naskah\",\"title\":\"Naskah Soal\",\"content\":\"<ol><li>x²</li></ol>\"},\
        {\"id\":\"kunci\",\"title\":\"Kunci Jawaban\",\"content\":\"<p>A</p>\"}]}\n```";

    Mock::given(method("POST"))
        .and(path(PRO))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "generationConfig": { "responseMimeType": "application/json" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate_text(text)))
        .expect(1)
        .mount(&server)
        .await;

    let out = sections(&client_for(&server, 3), None).await.unwrap();
    let ids: Vec<&str> = out.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["naskah", "kunci"]);
    assert_eq!(out[0].content, "<ol><li>x²</li></ol>");
}

#[tokio::test]
async fn deep_reasoning_sends_thinking_budget() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRO))
        .and(body_partial_json(json!({
            "generationConfig": {
                "temperature": 0.5,
                "thinkingConfig": { "thinkingBudget": 32768 }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate_text("{\"sections\":[]}")))
        .expect(1)
        .mount(&server)
        .await;

    let params = GenerationParameters {
        subject: "Kimia".into(),
        grade: "11".into(),
        deep_reasoning: true,
        ..Default::default()
    };
    let out = client_for(&server, 3)
        .generate(&params, GenerationMode::QuestionBank, None)
        .await
        .unwrap();
    assert!(out.is_empty());
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRO))
        .respond_with(unavailable())
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(PRO))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate_text(
            "{\"sections\":[{\"id\":\"a\",\"title\":\"ATP\",\"content\":\"<table></table>\"}]}",
        )))
        .mount(&server)
        .await;

    let out = sections(&client_for(&server, 3), None).await.unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn retry_budget_is_bounded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRO))
        .respond_with(unavailable())
        .expect(3)
        .mount(&server)
        .await;

    let err = sections(&client_for(&server, 2), None).await.unwrap_err();
    assert!(matches!(err, GenError::Upstream { status: 503, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRO))
        .respond_with(ResponseTemplate::new(400).set_body_string("API key not valid"))
        .expect(1)
        .mount(&server)
        .await;

    let err = sections(&client_for(&server, 3), None).await.unwrap_err();
    match err {
        GenError::Upstream { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "API key not valid");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn canceled_token_stops_before_retrying() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRO))
        .respond_with(unavailable())
        .expect(1)
        .mount(&server)
        .await;

    let cancel = CancelToken::new();
    cancel.cancel();
    let err = sections(&client_for(&server, 3), Some(&cancel)).await.unwrap_err();
    assert!(matches!(err, GenError::Canceled));
}

#[tokio::test]
async fn transport_errors_hide_the_key_and_are_not_retried() {
    // nothing listens on the discard port
    let config = GeminiConfig::new("SECRET-KEY-503x")
        .with_endpoint("http://127.0.0.1:9/v1beta")
        .with_retry(RetryPolicy::new(3, Duration::from_millis(10)));
    let client = GeminiClient::new(config).unwrap();

    let err = client
        .generate_sections("buat soal", &prompt::sections_schema(), 0.5, false, None)
        .await
        .unwrap_err();
    assert!(matches!(err, GenError::Http(_)), "{err:?}");
    let shown = format!("{err} {err:?}");
    assert!(!shown.contains("SECRET-KEY"), "{shown}");
    assert!(!err.is_transient());
    assert!(!err.is_quota_exceeded());
}

#[tokio::test]
async fn empty_and_shapeless_answers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRO))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(PRO))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate_text("{\"items\":[]}")))
        .mount(&server)
        .await;

    let client = client_for(&server, 3);
    assert!(matches!(sections(&client, None).await, Err(GenError::EmptyResponse)));
    assert!(matches!(sections(&client, None).await, Err(GenError::MissingSections)));
    // neither is retried
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

// ============================================================================
// Auxiliary text calls
// ============================================================================

#[tokio::test]
async fn suggestion_returns_markdown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEXT))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate_text("- Hukum Newton\n- Usaha dan Energi")))
        .mount(&server)
        .await;

    let params = GenerationParameters { subject: "Fisika".into(), ..Default::default() };
    let text = client_for(&server, 0)
        .suggest(&params, SuggestionKind::Topics, None)
        .await
        .unwrap();
    assert!(text.contains("Hukum Newton"));
}

#[tokio::test]
async fn maps_search_uses_location_and_lists_sources() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash-lite-latest:generateContent"))
        .and(body_partial_json(json!({
            "tools": [{ "googleMaps": {} }],
            "toolConfig": { "retrievalConfig": { "latLng": { "latitude": -6.9, "longitude": 107.6 } } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Perpustakaan Daerah" }] },
                "groundingMetadata": { "groundingChunks": [
                    { "maps": { "uri": "https://maps.example/p", "title": "Perpustakaan" } },
                    { "somethingElse": {} }
                ]}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let loc = LatLng { latitude: -6.9, longitude: 107.6 };
    let answer = client_for(&server, 0)
        .grounded_search("perpustakaan", SearchTool::Maps, Some(loc), None)
        .await
        .unwrap();
    assert_eq!(answer.text, "Perpustakaan Daerah");
    assert_eq!(
        answer.sources,
        vec![GroundingSource { uri: "https://maps.example/p".into(), title: "Perpustakaan".into() }]
    );
}

// ============================================================================
// Speech
// ============================================================================

#[tokio::test]
async fn speech_payload_is_decoded() {
    let server = MockServer::start().await;
    // 0.5 s of silence followed by one full-scale negative sample
    let mut pcm = vec![0u8; 24_000];
    pcm.extend_from_slice(&[0x00, 0x80]);
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash-preview-tts:generateContent"))
        .and(body_partial_json(json!({ "generationConfig": { "responseModalities": ["AUDIO"] } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{
                "inlineData": { "mimeType": "audio/L16;rate=24000", "data": STANDARD.encode(&pcm) }
            }]}}]
        })))
        .mount(&server)
        .await;

    let clip = client_for(&server, 0).text_to_speech("Kunci Jawaban. A").await.unwrap();
    assert_eq!(clip.pcm.len(), 24_002);
    assert_eq!(clip.audio.sample_rate, 24_000);
    assert_eq!(clip.audio.channels, 1);
    assert_eq!(clip.audio.samples.len(), 12_001);
    assert_eq!(clip.audio.samples[12_000], -1.0);
}

#[tokio::test]
async fn speech_quota_is_classified_and_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash-preview-tts:generateContent"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "code": 429, "status": "RESOURCE_EXHAUSTED" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server, 3).text_to_speech("halo").await.unwrap_err();
    assert!(err.is_quota_exceeded());
    assert!(!err.is_transient());
}

#[tokio::test]
async fn speech_without_audio_is_missing_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash-preview-tts:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate_text("no audio")))
        .mount(&server)
        .await;

    let err = client_for(&server, 0).text_to_speech("halo").await.unwrap_err();
    assert!(matches!(err, GenError::MissingPayload("audio")));
}

// ============================================================================
// Media
// ============================================================================

#[tokio::test]
async fn image_generation_returns_first_inline_part() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash-image:generateContent"))
        .and(body_partial_json(json!({ "generationConfig": { "imageConfig": { "aspectRatio": "1:1" } } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "Berikut gambarnya" },
                { "inlineData": { "mimeType": "image/png", "data": "iVBORw==" } }
            ]}}]
        })))
        .mount(&server)
        .await;

    let img = client_for(&server, 0).generate_image("siklus air").await.unwrap();
    assert_eq!(img.to_data_uri(), "data:image/png;base64,iVBORw==");
}

#[tokio::test]
async fn image_edit_without_image_is_missing_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash-image:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate_text("cannot edit")))
        .mount(&server)
        .await;

    let src = InlineData::from_bytes("image/jpeg", b"jpeg");
    let err = client_for(&server, 0).edit_image(&src, "beri label").await.unwrap_err();
    assert!(matches!(err, GenError::MissingPayload("image")));
}

#[tokio::test]
async fn video_generation_and_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/veo-3.1-fast-generate-preview:predictLongRunning"))
        .and(body_partial_json(json!({
            "parameters": { "aspectRatio": "9:16", "resolution": "720p", "numberOfVideos": 1 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "operations/vid-1" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/vid-1"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/vid-1",
            "done": true,
            "response": { "generateVideoResponse": { "generatedSamples": [
                { "video": { "uri": "https://files.example/vid-1.mp4" } }
            ]}}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, 0);
    let op = client
        .generate_video("gerak parabola", None, VideoAspect::Portrait)
        .await
        .unwrap();
    assert_eq!(op.name, "operations/vid-1");
    assert!(!op.done);

    let done = client
        .wait_for_video(&op.name, Duration::from_millis(10), None)
        .await
        .unwrap();
    assert!(done.done);
    assert_eq!(done.video_uris, ["https://files.example/vid-1.mp4"]);
}

#[tokio::test]
async fn video_wait_stops_when_canceled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/operations/vid-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/vid-2",
            "done": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let err = client_for(&server, 0)
        .wait_for_video("operations/vid-2", Duration::from_secs(60), Some(&cancel))
        .await
        .unwrap_err();
    assert!(matches!(err, GenError::Canceled));
    assert!(started.elapsed() < Duration::from_secs(30));
}
