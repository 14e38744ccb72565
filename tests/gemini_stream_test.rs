use std::time::Duration;

use tokio_test::assert_ok;

use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shellq::providers::{create_provider, Credentials, Message, ProviderKind};
use shellq::session::{ConversationSession, LlmClient};
use shellq::ShellqError;

mod common;

const MODEL_PATH: &str = "/v1beta/models/gemini-1.5-flash:streamGenerateContent";

fn client_for(server: &MockServer, endpoint_path: &str) -> LlmClient {
    let model = common::model_config(
        ProviderKind::Gemini,
        format!("{}{}", server.uri(), endpoint_path),
        "GEMINI_API_KEY",
    );
    let provider = create_provider(&model, Credentials::new("gemini-test-key")).unwrap();
    LlmClient::new(provider, Duration::from_secs(5)).unwrap()
}

fn sse_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body)
}

/// Chunks are joined and the key travels in the query string
#[tokio::test]
async fn test_gemini_stream_accumulates_reply() {
    let server = MockServer::start().await;
    let chunks = vec![
        common::gemini_chunk("```bash\n"),
        common::gemini_chunk("ls -la\n```"),
    ];

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(query_param("key", "gemini-test-key"))
        .and(query_param("alt", "sse"))
        .and(body_partial_json(serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": "You are a terminal assistant.\n\nlist files" }]
            }]
        })))
        .respond_with(sse_response(common::sse_body(&chunks, false)))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = ConversationSession::new(
        client_for(&server, MODEL_PATH),
        vec![Message::system("You are a terminal assistant.")],
    );
    let mut updates = 0;
    let reply = session
        .query("list files", |_| updates += 1)
        .await
        .unwrap();

    assert_eq!(reply, "```bash\nls -la\n```");
    assert_eq!(updates, 2);
}

/// A non-streaming endpoint in the configuration is rewritten to stream
#[tokio::test]
async fn test_gemini_generate_endpoint_is_normalized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(sse_response(common::sse_body(
            &[common::gemini_chunk("echo hi")],
            false,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, "/v1beta/models/gemini-1.5-flash:generateContent");
    let reply = assert_ok!(client.stream_reply(&[Message::user("say hi")], |_| {}).await);
    assert_eq!(reply, "echo hi");
}

/// Rejected requests surface as connection errors
#[tokio::test]
async fn test_gemini_forbidden_is_connection_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("API not enabled"))
        .mount(&server)
        .await;

    let error = client_for(&server, MODEL_PATH)
        .stream_reply(&[Message::user("list files")], |_| {})
        .await
        .unwrap_err();

    assert!(error.downcast_ref::<ShellqError>().unwrap().is_connection());
    assert!(error.to_string().contains("403 Forbidden"));
}

/// Transport failures never echo the key-bearing request URL
#[tokio::test]
async fn test_gemini_transport_error_hides_api_key() {
    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = closed.local_addr().unwrap();
    drop(closed);

    let model = common::model_config(
        ProviderKind::Gemini,
        format!("http://{}{}", addr, MODEL_PATH),
        "GEMINI_API_KEY",
    );
    let provider = create_provider(&model, Credentials::new("SECRET-KEY-123")).unwrap();
    let client = LlmClient::new(provider, Duration::from_secs(5)).unwrap();

    let error = client
        .stream_reply(&[Message::user("list files")], |_| {})
        .await
        .unwrap_err();

    assert!(error.downcast_ref::<ShellqError>().unwrap().is_connection());
    let text = format!("{:#}", error);
    assert!(text.contains("Failed to make the API request to Gemini"));
    assert!(!text.contains("SECRET-KEY-123"), "{}", text);
    assert!(!text.contains("key="), "{}", text);
}
