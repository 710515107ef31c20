//! Test utilities for integration tests
use serde_json::json;
use tempfile::TempDir;

use plancal::google::GoogleEndpoints;
use plancal::google::oauth::{Credential, CredentialStore};

/// Encode `reply` the way an OpenAI compatible API streams it: one
/// `data:` event per word, a final chunk with `finish_reason`, then
/// `[DONE]`.
pub fn sse_body(reply: &str) -> String {
    let mut body = String::new();
    for (i, piece) in reply.split_inclusive(' ').enumerate() {
        let chunk = json!({
            "id": format!("chunk{}", i),
            "model": "gpt-4",
            "choices": [{"index": 0, "delta": {"content": piece}, "finish_reason": null}]
        });
        body.push_str(&format!("data: {}\n\n", chunk));
    }
    let done = json!({
        "id": "done",
        "model": "gpt-4",
        "choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]
    });
    body.push_str(&format!("data: {}\n\n", done));
    body.push_str("data: [DONE]\n\n");
    body
}

pub fn endpoints(server: &mockito::Server) -> GoogleEndpoints {
    GoogleEndpoints {
        api_url: server.url(),
        token_url: format!("{}/token", server.url()),
        ..GoogleEndpoints::default()
    }
}

pub fn store_in(dir: &TempDir) -> CredentialStore {
    CredentialStore::new(
        dir.path().join("token.json"),
        dir.path().join("credentials.json"),
    )
}

/// A credential store that already has a saved `authorized_user` token.
pub async fn authorized_store(dir: &TempDir) -> CredentialStore {
    let store = store_in(dir);
    store
        .save(&Credential::authorized_user("client-id", "client-secret", "refresh-token"))
        .await
        .expect("Failed to save credential");
    store
}

pub async fn mock_token(server: &mut mockito::Server) -> mockito::Mock {
    server
        .mock("POST", "/token")
        .match_body(mockito::Matcher::UrlEncoded(
            "refresh_token".into(),
            "refresh-token".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"test_token","expires_in":3599}"#)
        .create_async()
        .await
}
