use gonggu_lens::{AnalysisFailure, DefaultOrchestrator, LensError, Provenance, TomlConfig};
use httpmock::prelude::*;
use std::time::{Duration, Instant};

const GEMINI_PATH: &str = "/v1beta/models/gemini-test:generateContent";

fn config_toml(primary: &str, public_base: &str, gemini_base: &str, api_key: Option<&str>) -> TomlConfig {
    config_toml_with_timeout(primary, public_base, gemini_base, api_key, 5)
}

fn config_toml_with_timeout(
    primary: &str,
    public_base: &str,
    gemini_base: &str,
    api_key: Option<&str>,
    timeout_seconds: u64,
) -> TomlConfig {
    let key_line = api_key
        .map(|k| format!("api_key = \"{}\"", k))
        .unwrap_or_default();

    let toml_content = format!(
        r#"
[service]
public_base_url = "{public_base}"
timeout_seconds = {timeout_seconds}

[primary]
endpoint = "{primary}"

[gemini]
{key_line}
model = "gemini-test"
api_base = "{gemini_base}"

[pricing]
store = "Danawa"
search_url = "https://www.danawa.com/search/"
"#
    );

    TomlConfig::from_toml_str(&toml_content).unwrap()
}

fn gemini_answer(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

const MODEL_TEXT: &str = r#"Here is my analysis:
```json
[
  {"name": "DeWalt DCD791", "brand": "DeWalt", "model": "DCD791", "category": "power tool", "type": "drill", "confidence": 0.87, "description": "20V brushless drill driver"},
  {"name": "DeWalt DCD771", "brand": "DeWalt", "model": "DCD771", "category": "power tool", "type": "drill", "confidence": 0.09, "description": "20V drill driver"},
  {"name": "DeWalt DCF887", "brand": "DeWalt", "model": "DCF887", "category": "power tool", "type": "impact driver", "confidence": 0.04, "description": "Impact driver"}
]
```"#;

#[tokio::test]
async fn test_primary_success_is_enriched_and_returned() {
    let ai_server = MockServer::start();
    let gemini = MockServer::start();

    let primary_mock = ai_server.mock(|when, then| {
        when.method(POST)
            .path("/analyze")
            .json_body(serde_json::json!({"image_url": "https://cdn.example.com/a.jpg"}));
        then.status(200).json_body(serde_json::json!({
            "success": true,
            "candidates": [
                {"name": "Bosch GSR 120-LI", "brand": "Bosch", "category": "power tool", "confidence": 0.93, "provider": "yolo"}
            ],
            "processing_time_ms": 812
        }));
    });
    let gemini_mock = gemini.mock(|when, then| {
        when.method(POST).path(GEMINI_PATH);
        then.status(200).json_body(gemini_answer(MODEL_TEXT));
    });

    let config = config_toml(
        &ai_server.base_url(),
        "http://localhost:4000",
        &gemini.base_url(),
        Some("test-key"),
    );
    let orchestrator = DefaultOrchestrator::from_config(&config).unwrap();

    let result = orchestrator
        .analyze_image("https://cdn.example.com/a.jpg")
        .await
        .unwrap();

    primary_mock.assert();
    gemini_mock.assert_hits(0);
    assert_eq!(result.provenance, Provenance::Primary);
    assert_eq!(result.candidates.len(), 1);

    let top = &result.candidates[0];
    assert_eq!(top.candidate.provider.as_deref(), Some("yolo"));
    assert_eq!(top.pricing.store.as_deref(), Some("Danawa"));
    assert_eq!(
        top.pricing.url.as_deref(),
        Some("https://www.danawa.com/search/?query=Bosch+GSR+120-LI")
    );
    assert!(top.pricing.price.is_some());
}

#[tokio::test]
async fn test_primary_error_falls_back_to_gemini_with_fetched_image() {
    let ai_server = MockServer::start();
    let file_host = MockServer::start();
    let gemini = MockServer::start();

    let image_url = file_host.url("/uploads/drill.png");

    let primary_mock = ai_server.mock(|when, then| {
        when.method(POST)
            .path("/analyze")
            .json_body(serde_json::json!({"image_url": image_url}));
        then.status(500);
    });
    let image_mock = file_host.mock(|when, then| {
        when.method(GET).path("/uploads/drill.png");
        then.status(200)
            .header("Content-Type", "image/png")
            .body("fakepng");
    });
    let gemini_mock = gemini.mock(|when, then| {
        when.method(POST)
            .path(GEMINI_PATH)
            .query_param("key", "test-key")
            .body_contains("\"mimeType\":\"image/png\"")
            .body_contains("\"data\":\"ZmFrZXBuZw==\"")
            .body_contains("ONLY the JSON array");
        then.status(200).json_body(gemini_answer(MODEL_TEXT));
    });

    let config = config_toml(
        &ai_server.base_url(),
        &file_host.base_url(),
        &gemini.base_url(),
        Some("test-key"),
    );
    let orchestrator = DefaultOrchestrator::from_config(&config).unwrap();

    // 相對路徑需先轉成 file_host 的絕對 URL
    let result = orchestrator
        .analyze_image("/uploads/drill.png")
        .await
        .unwrap();

    primary_mock.assert();
    image_mock.assert();
    gemini_mock.assert();

    assert!(result.success);
    assert_eq!(result.provenance, Provenance::GeminiDirect);
    assert_eq!(result.candidates.len(), 3);
    assert_eq!(result.candidates[0].candidate.name, "DeWalt DCD791");
    assert_eq!(result.candidates[0].candidate.tool_type.as_deref(), Some("drill"));
    assert!(result
        .candidates
        .iter()
        .all(|c| c.candidate.provider.as_deref() == Some("gemini-direct")));
    assert!(result.candidates.iter().all(|c| c.pricing.price.is_some()));
}

#[tokio::test]
async fn test_unreachable_primary_with_base64_payload() {
    let gemini = MockServer::start();

    let gemini_mock = gemini.mock(|when, then| {
        when.method(POST)
            .path(GEMINI_PATH)
            .body_contains("\"mimeType\":\"image/webp\"")
            .body_contains("\"data\":\"UklGRg==\"");
        then.status(200).json_body(gemini_answer(MODEL_TEXT));
    });

    // port 1 refuses connections
    let config = config_toml(
        "http://127.0.0.1:1",
        "http://localhost:4000",
        &gemini.base_url(),
        Some("test-key"),
    );
    let orchestrator = DefaultOrchestrator::from_config(&config).unwrap();

    let result = orchestrator
        .analyze_image_base64("data:image/webp;base64,UklGRg==")
        .await
        .unwrap();

    gemini_mock.assert();
    assert!(result.success);
    assert_eq!(result.candidates.len(), 3);
}

#[tokio::test]
async fn test_primary_without_success_flag_falls_back() {
    let ai_server = MockServer::start();
    let gemini = MockServer::start();

    ai_server.mock(|when, then| {
        when.method(POST).path("/analyze-base64");
        then.status(200).json_body(serde_json::json!({
            "success": false,
            "candidates": [],
            "error": "YOLO detection failed"
        }));
    });
    let gemini_mock = gemini.mock(|when, then| {
        when.method(POST).path(GEMINI_PATH);
        then.status(200).json_body(gemini_answer(MODEL_TEXT));
    });

    let config = config_toml(
        &ai_server.base_url(),
        "http://localhost:4000",
        &gemini.base_url(),
        Some("test-key"),
    );
    let orchestrator = DefaultOrchestrator::from_config(&config).unwrap();

    let result = orchestrator.analyze_image_base64("/9j/4AAQ").await.unwrap();

    gemini_mock.assert();
    assert_eq!(result.provenance, Provenance::GeminiDirect);
}

#[tokio::test]
async fn test_missing_api_key_after_primary_failure() {
    let ai_server = MockServer::start();
    ai_server.mock(|when, then| {
        when.method(POST).path("/analyze");
        then.status(502);
    });

    let config = config_toml(
        &ai_server.base_url(),
        "http://localhost:4000",
        "https://generativelanguage.googleapis.com",
        None,
    );
    let orchestrator = DefaultOrchestrator::from_config(&config).unwrap();

    let err = orchestrator
        .analyze_image("/uploads/a.jpg")
        .await
        .unwrap_err();

    assert!(err.is_configuration());
    let failure = AnalysisFailure::from_error(&err);
    assert!(!failure.success);
    assert_eq!(
        failure.error,
        "Configuration error: inference credential not configured"
    );
    assert!(!failure.error.to_lowercase().contains("gemini"));
    assert_eq!(failure.message, "analysis failed");
}

#[tokio::test]
async fn test_unparseable_gemini_text_is_analysis_failure() {
    let ai_server = MockServer::start();
    let gemini = MockServer::start();

    ai_server.mock(|when, then| {
        when.method(POST).path("/analyze-base64");
        then.status(500);
    });
    gemini.mock(|when, then| {
        when.method(POST).path(GEMINI_PATH);
        then.status(200)
            .json_body(gemini_answer("Sorry, I cannot tell what tool this is."));
    });

    let config = config_toml(
        &ai_server.base_url(),
        "http://localhost:4000",
        &gemini.base_url(),
        Some("test-key"),
    );
    let orchestrator = DefaultOrchestrator::from_config(&config).unwrap();

    let err = orchestrator.analyze_image_base64("/9j/4AAQ").await.unwrap_err();

    assert!(matches!(err, LensError::AnalysisFailed { .. }));
    assert!(err.to_string().starts_with("AI analysis failed:"));
}

#[tokio::test]
async fn test_gemini_error_status_is_analysis_failure() {
    let ai_server = MockServer::start();
    let gemini = MockServer::start();

    ai_server.mock(|when, then| {
        when.method(POST).path("/analyze-base64");
        then.status(500);
    });
    gemini.mock(|when, then| {
        when.method(POST).path(GEMINI_PATH);
        then.status(429)
            .json_body(serde_json::json!({"error": {"code": 429, "message": "quota"}}));
    });

    let config = config_toml(
        &ai_server.base_url(),
        "http://localhost:4000",
        &gemini.base_url(),
        Some("test-key"),
    );
    let orchestrator = DefaultOrchestrator::from_config(&config).unwrap();

    let err = orchestrator.analyze_image_base64("/9j/4AAQ").await.unwrap_err();
    assert!(matches!(err, LensError::AnalysisFailed { .. }));
    assert!(!err.to_string().contains("test-key"));
    assert!(!err.user_friendly_message().contains("quota"));
}

#[tokio::test]
async fn test_image_fetch_failure_is_analysis_failure() {
    let ai_server = MockServer::start();
    let file_host = MockServer::start();
    let gemini = MockServer::start();

    ai_server.mock(|when, then| {
        when.method(POST).path("/analyze");
        then.status(500);
    });
    file_host.mock(|when, then| {
        when.method(GET).path("/uploads/missing.jpg");
        then.status(404);
    });
    let gemini_mock = gemini.mock(|when, then| {
        when.method(POST).path(GEMINI_PATH);
        then.status(200).json_body(gemini_answer(MODEL_TEXT));
    });

    let config = config_toml(
        &ai_server.base_url(),
        &file_host.base_url(),
        &gemini.base_url(),
        Some("test-key"),
    );
    let orchestrator = DefaultOrchestrator::from_config(&config).unwrap();

    let err = orchestrator
        .analyze_image("/uploads/missing.jpg")
        .await
        .unwrap_err();

    gemini_mock.assert_hits(0);
    assert!(matches!(err, LensError::AnalysisFailed { .. }));
}

#[tokio::test]
async fn test_slow_primary_times_out_and_falls_back() {
    let ai_server = MockServer::start();
    let gemini = MockServer::start();

    ai_server.mock(|when, then| {
        when.method(POST).path("/analyze-base64");
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(serde_json::json!({
                "success": true,
                "candidates": [{"name": "Too late", "confidence": 0.99}]
            }));
    });
    let gemini_mock = gemini.mock(|when, then| {
        when.method(POST).path(GEMINI_PATH);
        then.status(200).json_body(gemini_answer(MODEL_TEXT));
    });

    let config = config_toml_with_timeout(
        &ai_server.base_url(),
        "http://localhost:4000",
        &gemini.base_url(),
        Some("test-key"),
        1,
    );
    let orchestrator = DefaultOrchestrator::from_config(&config).unwrap();

    let started = Instant::now();
    let result = orchestrator.analyze_image_base64("/9j/4AAQ").await.unwrap();

    gemini_mock.assert();
    assert_eq!(result.provenance, Provenance::GeminiDirect);
    assert_eq!(result.candidates[0].candidate.name, "DeWalt DCD791");
    assert!(started.elapsed() < Duration::from_secs(3));
}
