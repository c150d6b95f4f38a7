//! Integration tests for the MockLLM server
//!
//! These tests drive the full router in-process and verify:
//! - Both chat endpoints, full and streaming
//! - Request validation and error bodies
//! - Hot reload of the responses file
//! - Health check

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use mockllm::cli::{router, AppState};
use mockllm::store::ResponseStore;
use mockllm::stream::{parse_sse_payloads, EVENT_STREAM_CONTENT_TYPE};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use tower::ServiceExt;

const RESPONSES: &str = r#"
responses:
  hello: "hi there"
  "what is the meaning of life?": "42"
defaults:
  unknown_response: "??"
settings:
  lag_enabled: false
"#;

fn write_responses(path: &Path, yaml: &str, mtime: SystemTime) {
    std::fs::write(path, yaml).unwrap();
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(mtime).unwrap();
}

fn app_from_yaml(yaml: &str) -> Router {
    let store = ResponseStore::from_yaml(yaml).unwrap();
    router(Arc::new(AppState::new(Arc::new(store))))
}

async fn app_from_file(path: &Path) -> Router {
    let store = ResponseStore::open(path).await.unwrap();
    router(Arc::new(AppState::new(Arc::new(store))))
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, String, String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

fn openai_body(content: &str, stream: bool) -> Value {
    json!({
        "model": "gpt-4",
        "messages": [{"role": "user", "content": content}],
        "stream": stream
    })
}

fn anthropic_body(content: &str, stream: bool) -> Value {
    json!({
        "model": "claude-3-sonnet-20240229",
        "max_tokens": 256,
        "messages": [{"role": "user", "content": content}],
        "stream": stream
    })
}

mod openai_tests {
    use super::*;

    #[tokio::test]
    async fn test_known_prompt() {
        let app = app_from_yaml(RESPONSES);
        let (status, _, body) =
            post_json(&app, "/v1/chat/completions", openai_body("Hello", false)).await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["object"], "chat.completion");
        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["choices"][0]["message"]["role"], "assistant");
        assert_eq!(body["choices"][0]["message"]["content"], "hi there");
        assert_eq!(body["choices"][0]["finish_reason"], "stop");

        let usage = &body["usage"];
        let prompt = usage["prompt_tokens"].as_u64().unwrap();
        let completion = usage["completion_tokens"].as_u64().unwrap();
        assert!(prompt > 0);
        assert!(completion > 0);
        assert_eq!(usage["total_tokens"].as_u64().unwrap(), prompt + completion);
    }

    #[tokio::test]
    async fn test_unknown_prompt_uses_default() {
        let app = app_from_yaml(RESPONSES);
        let (status, _, body) =
            post_json(&app, "/v1/chat/completions", openai_body("bye", false)).await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["choices"][0]["message"]["content"], "??");
    }

    #[tokio::test]
    async fn test_last_user_message_is_answered() {
        let app = app_from_yaml(RESPONSES);
        let request = json!({
            "model": "gpt-4",
            "messages": [
                {"role": "system", "content": "You are helpful."},
                {"role": "user", "content": "bye"},
                {"role": "assistant", "content": "??"},
                {"role": "user", "content": "  What is the meaning of life?  "}
            ]
        });
        let (status, _, body) = post_json(&app, "/v1/chat/completions", request).await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["choices"][0]["message"]["content"], "42");
    }

    #[tokio::test]
    async fn test_streaming_frames() {
        let app = app_from_yaml(RESPONSES);
        let (status, content_type, body) =
            post_json(&app, "/v1/chat/completions", openai_body("hello", true)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.starts_with(EVENT_STREAM_CONTENT_TYPE));

        let (frames, done) = parse_sse_payloads(&body);
        assert!(done);

        // role frame + one frame per character + finish frame
        assert_eq!(frames.len(), "hi there".chars().count() + 2);
        assert_eq!(frames[0]["choices"][0]["delta"]["role"], "assistant");

        let text: String = frames[1..frames.len() - 1]
            .iter()
            .map(|f| f["choices"][0]["delta"]["content"].as_str().unwrap())
            .collect();
        assert_eq!(text, "hi there");

        let last = frames.last().unwrap();
        assert_eq!(last["choices"][0]["finish_reason"], "stop");

        let id = &frames[0]["id"];
        assert!(frames.iter().all(|f| &f["id"] == id));
        assert!(frames.iter().all(|f| f["object"] == "chat.completion.chunk"));
    }

    #[tokio::test]
    async fn test_empty_messages_is_bad_request() {
        let app = app_from_yaml(RESPONSES);
        let request = json!({"model": "gpt-4", "messages": []});
        let (status, _, body) = post_json(&app, "/v1/chat/completions", request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["detail"], "No user message found in request");
        assert!(body.get("choices").is_none());
    }

    #[tokio::test]
    async fn test_stream_null_returns_full_body() {
        let app = app_from_yaml(RESPONSES);
        let request = json!({
            "model": "gpt-4",
            "messages": [{"role": "user", "content": "hello"}],
            "stream": null
        });
        let (status, content_type, body) = post_json(&app, "/v1/chat/completions", request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.starts_with("application/json"));
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["choices"][0]["message"]["content"], "hi there");
    }

    #[tokio::test]
    async fn test_no_user_message_is_bad_request() {
        let app = app_from_yaml(RESPONSES);
        let request = json!({
            "model": "gpt-4",
            "messages": [{"role": "system", "content": "hello"}]
        });
        let (status, _, _) = post_json(&app, "/v1/chat/completions", request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

mod anthropic_tests {
    use super::*;

    #[tokio::test]
    async fn test_known_prompt() {
        let app = app_from_yaml(RESPONSES);
        let (status, _, body) =
            post_json(&app, "/v1/messages", anthropic_body("hello", false)).await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["type"], "message");
        assert_eq!(body["role"], "assistant");
        assert_eq!(body["model"], "claude-3-sonnet-20240229");
        assert_eq!(body["content"][0]["type"], "text");
        assert_eq!(body["content"][0]["text"], "hi there");
        assert!(body["id"].as_str().unwrap().starts_with("msg_"));

        let usage = &body["usage"];
        let input = usage["input_tokens"].as_u64().unwrap();
        let output = usage["output_tokens"].as_u64().unwrap();
        assert_eq!(usage["total_tokens"].as_u64().unwrap(), input + output);
    }

    #[tokio::test]
    async fn test_content_blocks() {
        let app = app_from_yaml(RESPONSES);
        let request = json!({
            "model": "claude-3-haiku",
            "messages": [{
                "role": "user",
                "content": [{"type": "text", "text": "Hello"}]
            }]
        });
        let (status, _, body) = post_json(&app, "/v1/messages", request).await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["content"][0]["text"], "hi there");
    }

    #[tokio::test]
    async fn test_streaming_deltas() {
        let app = app_from_yaml(RESPONSES);
        let (status, content_type, body) =
            post_json(&app, "/v1/messages", anthropic_body("bye", true)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.starts_with(EVENT_STREAM_CONTENT_TYPE));

        let (frames, done) = parse_sse_payloads(&body);
        assert!(done);
        assert_eq!(frames.len(), 2);
        for frame in &frames {
            assert_eq!(frame["type"], "message_delta");
            assert_eq!(frame["delta"]["type"], "content_block_delta");
            assert_eq!(frame["delta"]["index"], 0);
        }

        let text: String = frames
            .iter()
            .map(|f| f["delta"]["delta"]["text"].as_str().unwrap())
            .collect();
        assert_eq!(text, "??");
    }

    #[tokio::test]
    async fn test_assistant_only_is_bad_request() {
        let app = app_from_yaml(RESPONSES);
        let request = json!({
            "model": "claude-3-haiku",
            "messages": [{"role": "assistant", "content": "hello"}]
        });
        let (status, _, body) = post_json(&app, "/v1/messages", request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert!(body.get("content").is_none());
    }
}

mod reload_tests {
    use super::*;

    #[tokio::test]
    async fn test_hot_reload_through_http() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("responses.yml");
        let start = SystemTime::now() - Duration::from_secs(60);
        write_responses(&path, RESPONSES, start);

        let app = app_from_file(&path).await;
        let (_, _, body) =
            post_json(&app, "/v1/chat/completions", openai_body("hello", false)).await;
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["choices"][0]["message"]["content"], "hi there");

        write_responses(
            &path,
            "responses:\n  hello: \"reloaded\"\n",
            start + Duration::from_secs(10),
        );

        let (_, _, body) =
            post_json(&app, "/v1/messages", anthropic_body("hello", false)).await;
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["content"][0]["text"], "reloaded");
    }

    #[tokio::test]
    async fn test_deleted_file_is_internal_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("responses.yml");
        write_responses(&path, RESPONSES, SystemTime::now());

        let app = app_from_file(&path).await;
        std::fs::remove_file(&path).unwrap();

        let (status, _, body) =
            post_json(&app, "/v1/chat/completions", openai_body("hello", false)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .starts_with("Internal server error: "));
    }

    #[tokio::test]
    async fn test_invalid_file_after_start_is_internal_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("responses.yml");
        let start = SystemTime::now() - Duration::from_secs(60);
        write_responses(&path, RESPONSES, start);

        let app = app_from_file(&path).await;
        write_responses(&path, "responses: [unclosed", start + Duration::from_secs(10));

        let (status, _, _) =
            post_json(&app, "/v1/messages", anthropic_body("hello", true)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        // Fixing the file recovers without a restart
        write_responses(&path, RESPONSES, start + Duration::from_secs(20));
        let (status, _, _) =
            post_json(&app, "/v1/messages", anthropic_body("hello", false)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let result = tokio_test::block_on(ResponseStore::open(dir.path().join("missing.yml")));
        assert!(result.is_err());
    }
}

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let app = app_from_yaml(RESPONSES);
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "mockllm");
        assert_eq!(body["responses"], 2);
    }
}
