//! Integration tests for the HTTP backend client against a mock server

use serde_json::json;

use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chatline::backend::{ChatBackend, ChatRequest, HttpBackend, PromptUpdate, SessionId};
use chatline::config::BackendConfig;
use chatline::error::ChatlineError;

fn backend_for(server: &MockServer) -> HttpBackend {
    let config = BackendConfig {
        base_url: server.uri(),
        timeout_seconds: 5,
        ..Default::default()
    };
    HttpBackend::new(&config).unwrap()
}

#[tokio::test]
async fn test_list_sessions_sends_window_and_parses_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sessions"))
        .and(query_param("skip", "10"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 12,
            "data": [
                {"id": 11, "system_prompt": "Be brief.", "created_at": "2024-03-01T09:30:00"},
                {"id": 12, "system_prompt": null, "created_at": "2024-03-02T10:00:00.123456"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = backend_for(&server).list_sessions(10, 10).await.unwrap();
    assert_eq!(page.total, 12);
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.data[0].id, SessionId::Int(11));
    assert_eq!(page.data[0].system_prompt.as_deref(), Some("Be brief."));
    assert!(page.data[1].system_prompt.is_none());
}

#[tokio::test]
async fn test_server_error_carries_status_and_detail() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sessions"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "database unavailable"})),
        )
        .mount(&server)
        .await;

    let err = backend_for(&server).list_sessions(0, 10).await.unwrap_err();
    match err.downcast_ref::<ChatlineError>() {
        Some(ChatlineError::Server { status, detail }) => {
            assert_eq!(*status, 500);
            assert_eq!(detail, "database unavailable");
        }
        other => panic!("expected server error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_field_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    let err = backend_for(&server).list_sessions(0, 10).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ChatlineError>(),
        Some(ChatlineError::MalformedResponse(_))
    ));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let config = BackendConfig {
        // Port 9 (discard) is almost never listening
        base_url: "http://127.0.0.1:9".to_string(),
        timeout_seconds: 2,
        ..Default::default()
    };
    let backend = HttpBackend::new(&config).unwrap();

    let err = backend.list_sessions(0, 10).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ChatlineError>(),
        Some(ChatlineError::Network(_))
    ));
}

#[tokio::test]
async fn test_messages_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/messages/abc-123"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"detail": "Session or messages not found"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .messages(&SessionId::Text("abc-123".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ChatlineError>(),
        Some(ChatlineError::NotFound(d)) if d == "Session or messages not found"
    ));
}

#[tokio::test]
async fn test_messages_parse_roles() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/messages/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"role": "user", "content": "hi", "timestamp": "2024-01-01 10:00:00"},
            {"role": "assistant", "content": "hello!", "timestamp": "2024-01-01 10:00:01"}
        ])))
        .mount(&server)
        .await;

    let thread = backend_for(&server)
        .messages(&SessionId::Int(7))
        .await
        .unwrap();
    assert_eq!(thread.len(), 2);
    assert_eq!(thread[1].role.label(), "Bot");
}

#[tokio::test]
async fn test_chat_without_session_omits_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({"content": "hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reply": "Hi there!",
            "session": 42,
            "history": [
                {"role": "user", "content": "hello"},
                {"role": "assistant", "content": "Hi there!"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = backend_for(&server)
        .chat(&ChatRequest {
            session_id: None,
            content: "hello".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(reply.reply, "Hi there!");
    assert_eq!(reply.session, SessionId::Int(42));
    assert_eq!(reply.history.len(), 2);
}

#[tokio::test]
async fn test_set_system_prompt_posts_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/set_system_prompt"))
        .and(body_json(
            json!({"session_id": 3, "system_prompt": "Answer in French."}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "updated",
            "session_id": 3,
            "system_prompt": "Answer in French."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = backend_for(&server)
        .set_system_prompt(&PromptUpdate {
            session_id: SessionId::Int(3),
            system_prompt: "Answer in French.".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(ack.status, "updated");
}

#[tokio::test]
async fn test_reset_uses_query_parameter() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/reset"))
        .and(query_param("session_id", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "reset",
            "session_id": 5
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = backend_for(&server)
        .reset(&SessionId::Int(5))
        .await
        .unwrap();
    assert_eq!(ack.session_id, SessionId::Int(5));
}
