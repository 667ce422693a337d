use assert_matches::assert_matches;
use procuro_rust::config::AppConfig;
use procuro_rust::error::LlmError;
use procuro_rust::llm::{ChatMessage, ChatRequest, LlmClient, OpenAiClient};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, api_key: Option<&str>) -> OpenAiClient {
    let mut config = AppConfig::default().llm;
    config.base_url = format!("{}/v1/", server.uri());
    config.api_key = api_key.map(str::to_string);
    config.timeout_secs = 5;
    OpenAiClient::new(&config).unwrap()
}

fn request() -> ChatRequest {
    ChatRequest {
        model: "gpt-5-mini".to_string(),
        messages: vec![ChatMessage::system("Return JSON."), ChatMessage::user("Offer text")],
    }
}

#[tokio::test]
async fn returns_first_choice_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-5-mini",
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": "Return JSON."},
                {"role": "user", "content": "Offer text"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"title\": \"Laptops\"}"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let raw = client(&server, Some("sk-test")).complete_json(&request()).await.unwrap();

    assert_eq!(raw, r#"{"title": "Laptops"}"#);
}

#[tokio::test]
async fn error_status_is_reported_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let result = client(&server, Some("sk-test")).complete_json(&request()).await;

    assert_matches!(result, Err(LlmError::Status { status: 429, body }) if body == "rate limited");
}

#[tokio::test]
async fn missing_choices_is_an_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let result = client(&server, Some("sk-test")).complete_json(&request()).await;

    assert_matches!(result, Err(LlmError::EmptyResponse));
}

#[tokio::test]
async fn missing_api_key_fails_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = client(&server, None).complete_json(&request()).await;

    assert_matches!(result, Err(LlmError::MissingApiKey));
}
