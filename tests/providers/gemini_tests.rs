use kisan_gateway::config::ProviderSettings;
use kisan_gateway::errors::AppError;
use kisan_gateway::providers::gemini::{
    GeminiCandidate, GeminiCandidateContent, GeminiResponse, GeminiResponsePart,
};
use kisan_gateway::providers::{ChatProvider, GeminiProvider, GenerateRequest, InlineImage};
use reqwest::Client;
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path, query_param},
};

fn provider_for(api_base: &str) -> GeminiProvider {
    let config = ProviderSettings {
        api_key: "AIza-test".to_string(),
        api_base: Some(api_base.to_string()),
        ..ProviderSettings::default()
    };
    GeminiProvider::new(config, Client::new())
}

fn text_request(text: &str) -> GenerateRequest {
    GenerateRequest {
        system: None,
        user_text: text.to_string(),
        image: None,
        json_output: false,
    }
}

fn reply_body(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn test_generate_sends_generate_content() {
    let mock_server = MockServer::start().await;

    // The key travels as a query parameter, not a header
    Mock::given(method("POST"))
        .and(path("/gemini-3-flash-preview:generateContent"))
        .and(query_param("key", "AIza-test"))
        .and(body_partial_json(json!({
            "contents": [{"role": "user", "parts": [{"text": "hello"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("hi there")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server.uri());
    let text = provider.generate(&text_request("hello")).await.unwrap();
    assert_eq!(text, "hi there");
}

#[tokio::test]
async fn test_generate_json_output_sets_response_mime() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/gemini-3-flash-preview:generateContent"))
        .and(body_partial_json(json!({
            "generationConfig": {"responseMimeType": "application/json"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("{}")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server.uri());
    let request = GenerateRequest {
        json_output: true,
        ..text_request("diagnose")
    };

    provider.generate(&request).await.unwrap();
}

#[tokio::test]
async fn test_generate_image_precedes_instruction_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/gemini-3-flash-preview:generateContent"))
        .and(body_partial_json(json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {"inlineData": {"mimeType": "image/jpeg", "data": "QUJD"}},
                    {"text": "analyze this plant image"}
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("looks healthy")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server.uri());
    let request = GenerateRequest {
        system: None,
        user_text: "analyze this plant image".to_string(),
        image: Some(InlineImage {
            mime_type: "image/jpeg".to_string(),
            data: "QUJD".to_string(),
        }),
        json_output: false,
    };

    let text = provider.generate(&request).await.unwrap();
    assert_eq!(text, "looks healthy");
}

#[tokio::test]
async fn test_generate_sends_system_instruction() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/gemini-3-flash-preview:generateContent"))
        .and(body_partial_json(json!({
            "systemInstruction": {"parts": [{"text": "You are a Kashmiri agronomist."}]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("salaam")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server.uri());
    let request = GenerateRequest {
        system: Some("You are a Kashmiri agronomist.".to_string()),
        ..text_request("hello")
    };

    provider.generate(&request).await.unwrap();
}

#[tokio::test]
async fn test_generate_uses_configured_model_in_path() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/gemini-pro:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("ok")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ProviderSettings {
        api_key: "AIza-test".to_string(),
        api_base: Some(mock_server.uri()),
        model: Some("gemini-pro".to_string()),
        ..ProviderSettings::default()
    };
    let provider = GeminiProvider::new(config, Client::new());

    provider.generate(&text_request("hello")).await.unwrap();
}

#[tokio::test]
async fn test_generate_maps_http_error_to_upstream() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/gemini-3-flash-preview:generateContent"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server.uri());
    let error = provider.generate(&text_request("hello")).await.unwrap_err();

    match error {
        AppError::Upstream { status, message } => {
            assert_eq!(status, Some(503));
            assert!(message.contains("Gemini API error"));
        }
        other => panic!("expected an upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_generate_concatenates_candidate_parts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/gemini-3-flash-preview:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"parts": [{"text": "Hello"}, {"text": " world"}]}
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server.uri());
    let text = provider.generate(&text_request("hello")).await.unwrap();
    assert_eq!(text, "Hello world");
}

#[tokio::test]
async fn test_generate_rejects_empty_candidates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/gemini-3-flash-preview:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server.uri());
    let error = provider.generate(&text_request("hello")).await.unwrap_err();

    assert!(matches!(error, AppError::UpstreamDecode(_)));
    assert_eq!(error.to_string(), "response contained no candidates");
}

#[test]
fn test_is_configured_requires_non_blank_key() {
    let provider = GeminiProvider::new(ProviderSettings::default(), Client::new());
    assert!(!provider.is_configured());

    let provider = GeminiProvider::new(
        ProviderSettings {
            api_key: "AIza-test".to_string(),
            ..ProviderSettings::default()
        },
        Client::new(),
    );
    assert!(provider.is_configured());
    assert_eq!(provider.required_secret(), "GEMINI_API_KEY");
    assert_eq!(provider.name(), "gemini");
}

#[test]
fn test_into_text_rejects_blank_parts() {
    let response = GeminiResponse {
        candidates: vec![GeminiCandidate {
            content: Some(GeminiCandidateContent {
                parts: vec![GeminiResponsePart {
                    text: Some("  ".to_string()),
                }],
            }),
            finish_reason: None,
        }],
    };
    assert_eq!(
        response.into_text().unwrap_err().to_string(),
        "response text was empty"
    );
}

#[test]
fn test_into_text_handles_missing_content() {
    let response = GeminiResponse {
        candidates: vec![GeminiCandidate {
            content: None,
            finish_reason: Some("SAFETY".to_string()),
        }],
    };
    assert_eq!(
        response.into_text().unwrap_err().to_string(),
        "response text was empty"
    );
}

#[test]
fn test_minimal_envelope_decodes() {
    let raw = r#"{"candidates": [{"content": {"parts": [{"text": "hi there"}]}}]}"#;
    let response: GeminiResponse = serde_json::from_str(raw).unwrap();
    assert_eq!(response.into_text().unwrap(), "hi there");
}
