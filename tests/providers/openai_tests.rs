use kisan_gateway::config::ProviderSettings;
use kisan_gateway::errors::AppError;
use kisan_gateway::providers::openai::{OpenAIChoice, OpenAIReply, OpenAIResponse};
use kisan_gateway::providers::{ChatProvider, GenerateRequest, InlineImage, OpenAIProvider};
use reqwest::Client;
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

fn provider_for(api_base: &str) -> OpenAIProvider {
    let config = ProviderSettings {
        api_key: "sk-test".to_string(),
        api_base: Some(api_base.to_string()),
        ..ProviderSettings::default()
    };
    OpenAIProvider::new(config, Client::new())
}

fn text_request(text: &str) -> GenerateRequest {
    GenerateRequest {
        system: None,
        user_text: text.to_string(),
        image: None,
        json_output: false,
    }
}

fn reply_body(content: &str) -> serde_json::Value {
    json!({
        "choices": [{
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn test_generate_sends_chat_completion() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "messages": [{"role": "user", "content": "hello"}]
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
async fn test_generate_includes_system_message_and_json_format() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": "You are a careful agronomist."},
                {"role": "user", "content": "diagnose"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("{}")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server.uri());
    let request = GenerateRequest {
        system: Some("You are a careful agronomist.".to_string()),
        user_text: "diagnose".to_string(),
        image: None,
        json_output: true,
    };

    provider.generate(&request).await.unwrap();
}

#[tokio::test]
async fn test_generate_attaches_image_as_data_url() {
    let mock_server = MockServer::start().await;

    // With an image the user turn switches to the part-list form
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": "what is wrong with this leaf?"},
                    {"type": "image_url", "image_url": {"url": "data:image/png;base64,QUJD"}}
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("Apple Scab")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server.uri());
    let request = GenerateRequest {
        system: None,
        user_text: "what is wrong with this leaf?".to_string(),
        image: Some(InlineImage {
            mime_type: "image/png".to_string(),
            data: "QUJD".to_string(),
        }),
        json_output: false,
    };

    let text = provider.generate(&request).await.unwrap();
    assert_eq!(text, "Apple Scab");
}

#[tokio::test]
async fn test_generate_uses_configured_model_and_base() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": "gpt-4.1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("ok")))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Trailing slash on the base must not double up in the endpoint
    let config = ProviderSettings {
        api_key: "sk-test".to_string(),
        api_base: Some(format!("{}/", mock_server.uri())),
        model: Some("gpt-4.1".to_string()),
        ..ProviderSettings::default()
    };
    let provider = OpenAIProvider::new(config, Client::new());

    provider.generate(&text_request("hello")).await.unwrap();
}

#[tokio::test]
async fn test_generate_maps_http_error_to_upstream() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server.uri());
    let error = provider.generate(&text_request("hello")).await.unwrap_err();

    match error {
        AppError::Upstream { status, message } => {
            assert_eq!(status, Some(429));
            assert!(message.contains("OpenAI API error"));
            assert!(message.contains("rate limited"));
        }
        other => panic!("expected an upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_generate_rejects_empty_choices() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server.uri());
    let error = provider.generate(&text_request("hello")).await.unwrap_err();

    assert!(matches!(error, AppError::UpstreamDecode(_)));
    assert_eq!(error.to_string(), "response contained no choices");
}

#[test]
fn test_is_configured_requires_non_blank_key() {
    let provider = OpenAIProvider::new(ProviderSettings::default(), Client::new());
    assert!(!provider.is_configured());

    let provider = OpenAIProvider::new(
        ProviderSettings {
            api_key: "   ".to_string(),
            ..ProviderSettings::default()
        },
        Client::new(),
    );
    assert!(!provider.is_configured());

    let provider = OpenAIProvider::new(
        ProviderSettings {
            api_key: "sk-test".to_string(),
            ..ProviderSettings::default()
        },
        Client::new(),
    );
    assert!(provider.is_configured());
    assert_eq!(provider.required_secret(), "OPENAI_API_KEY");
    assert_eq!(provider.name(), "openai");
}

#[test]
fn test_into_text_extracts_first_choice() {
    let response = OpenAIResponse {
        choices: vec![OpenAIChoice {
            message: Some(OpenAIReply {
                content: Some("hi there".to_string()),
            }),
            finish_reason: Some("stop".to_string()),
        }],
    };
    assert_eq!(response.into_text().unwrap(), "hi there");
}

#[test]
fn test_into_text_rejects_missing_content() {
    let response = OpenAIResponse {
        choices: vec![OpenAIChoice {
            message: None,
            finish_reason: None,
        }],
    };
    assert_eq!(
        response.into_text().unwrap_err().to_string(),
        "response message had no content"
    );
}

#[test]
fn test_into_text_rejects_blank_text() {
    let response = OpenAIResponse {
        choices: vec![OpenAIChoice {
            message: Some(OpenAIReply {
                content: Some("   ".to_string()),
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
fn test_minimal_envelope_decodes() {
    // The decoder accepts a reply with nothing but the content path populated
    let raw = r#"{"choices": [{"message": {"content": "hi there"}}]}"#;
    let response: OpenAIResponse = serde_json::from_str(raw).unwrap();
    assert_eq!(response.into_text().unwrap(), "hi there");
}
