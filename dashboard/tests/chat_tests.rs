use learnhub_client::learnhub_client_test::MockApi;
use learnhub_client::{ApiError, LearningApi};
use learnhub_dashboard::{chat_history_key, ChatRole, ChatSession, MemoryStorage, Storage};
use serde_json::json;
use std::sync::Arc;

struct Harness {
    api: Arc<MockApi>,
    storage: Arc<MemoryStorage>,
    chat: ChatSession,
}

fn harness(session_id: &str) -> Harness {
    let api = Arc::new(MockApi::new());
    let storage = Arc::new(MemoryStorage::new());
    let chat = ChatSession::resume(
        Arc::clone(&api) as Arc<dyn LearningApi>,
        Arc::clone(&storage) as Arc<dyn Storage>,
        session_id.to_string(),
    );
    Harness { api, storage, chat }
}

fn reply_body(text: &str) -> serde_json::Value {
    json!({
        "response": text,
        "intent": "course_recommendation",
        "sources": [{ "title": "Catalog" }],
        "timestamp": "t-9",
        "session_id": "s1"
    })
}

#[tokio::test]
async fn fresh_session_opens_with_the_welcome_message() {
    let h = harness("s1");
    let transcript = h.chat.transcript();
    assert_eq!(transcript.len(), 1);
    assert_eq!(transcript[0].role, ChatRole::Bot);
    assert!(transcript[0].text.starts_with("Hi! I'm your Learning Assistant"));
}

#[tokio::test]
async fn send_appends_user_message_and_reply() {
    let h = harness("s1");
    h.api.enqueue("chat", reply_body("Try Rust Basics."));
    h.chat.send("What should I learn?").await.unwrap();

    let transcript = h.chat.transcript();
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[1].role, ChatRole::User);
    assert_eq!(transcript[1].text, "What should I learn?");
    assert_eq!(transcript[2].text, "Try Rust Basics.");
    assert_eq!(
        transcript[2].intent.as_deref(),
        Some("course_recommendation")
    );
    assert!(!h.chat.is_typing());

    let persisted = h.storage.get(&chat_history_key("s1")).unwrap();
    assert!(persisted.contains("Try Rust Basics."));
}

#[tokio::test]
async fn blank_input_is_dropped_without_a_request() {
    let h = harness("s1");
    h.chat.send("   ").await.unwrap();

    assert!(h.api.calls().is_empty());
    assert_eq!(h.chat.transcript().len(), 1);
}

#[tokio::test]
async fn failed_request_appends_the_error_placeholder() {
    let h = harness("s1");
    h.api
        .enqueue("chat", ApiError::Invariant("backend down".to_string()));
    let result = h.chat.send("hello").await;

    assert!(result.is_err());
    assert!(!h.chat.is_typing());
    let transcript = h.chat.transcript();
    assert_eq!(transcript.len(), 3);
    assert_eq!(
        transcript[2].text,
        "Sorry, I encountered an error. Please try again."
    );

    // The flag cleared, so the next send goes through.
    h.api.enqueue("chat", reply_body("Back up."));
    h.chat.send("still there?").await.unwrap();
    assert_eq!(h.api.calls_for("chat"), 2);
}

#[tokio::test]
async fn quick_action_sends_the_canned_prompt() {
    let h = harness("s1");
    h.api.enqueue("chat", reply_body("Here are the courses."));
    h.chat.quick_action("courses").await.unwrap();

    let transcript = h.chat.transcript();
    assert_eq!(transcript[1].text, "What courses are available?");

    h.chat.quick_action("unknown").await.unwrap();
    assert_eq!(h.api.calls_for("chat"), 1);
}

#[tokio::test]
async fn feedback_is_submitted_at_most_once_per_reply() {
    let h = harness("s1");
    h.api.enqueue("chat_feedback", json!(null));
    assert!(h.chat.feedback_enabled("t-9"));

    h.chat.feedback("t-9", 5).await.unwrap();
    assert!(!h.chat.feedback_enabled("t-9"));

    // Second submission is a local no-op.
    h.chat.feedback("t-9", 1).await.unwrap();
    assert_eq!(h.api.calls_for("chat_feedback"), 1);
}

#[tokio::test]
async fn feedback_stays_disabled_after_a_network_failure() {
    let h = harness("s1");
    h.api
        .enqueue("chat_feedback", ApiError::Invariant("timeout".to_string()));
    let result = h.chat.feedback("t-9", 5).await;

    assert!(result.is_err());
    assert!(!h.chat.feedback_enabled("t-9"));
    h.chat.feedback("t-9", 5).await.unwrap();
    assert_eq!(h.api.calls_for("chat_feedback"), 1);
}

#[tokio::test]
async fn clear_resets_local_history_even_when_the_backend_fails() {
    let h = harness("s1");
    h.api.enqueue("chat", reply_body("Try Rust Basics."));
    h.chat.send("hi").await.unwrap();
    assert_eq!(h.chat.transcript().len(), 3);

    h.api
        .enqueue("clear_chat_memory", ApiError::Invariant("boom".to_string()));
    let result = h.chat.clear().await;

    assert!(result.is_err());
    let transcript = h.chat.transcript();
    assert_eq!(transcript.len(), 1);
    assert!(transcript[0].text.starts_with("Hi! I'm your Learning Assistant"));
    assert_eq!(h.storage.get(&chat_history_key("s1")), None);
}

#[tokio::test]
async fn resume_restores_the_persisted_transcript() {
    let h = harness("s1");
    h.api.enqueue("chat", reply_body("Try Rust Basics."));
    h.chat.send("What should I learn?").await.unwrap();

    let resumed = ChatSession::resume(
        Arc::clone(&h.api) as Arc<dyn LearningApi>,
        Arc::clone(&h.storage) as Arc<dyn Storage>,
        "s1".to_string(),
    );
    let transcript = resumed.transcript();
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[2].text, "Try Rust Basics.");
}

#[tokio::test]
async fn corrupt_persisted_history_falls_back_to_a_fresh_transcript() {
    let api = Arc::new(MockApi::new());
    let storage = Arc::new(MemoryStorage::new());
    storage.set(&chat_history_key("s2"), "{not json");

    let chat = ChatSession::resume(
        api as Arc<dyn LearningApi>,
        Arc::clone(&storage) as Arc<dyn Storage>,
        "s2".to_string(),
    );
    let transcript = chat.transcript();
    assert_eq!(transcript.len(), 1);
    assert_eq!(transcript[0].role, ChatRole::Bot);
}

#[tokio::test]
async fn distinct_sessions_keep_separate_histories() {
    let api = Arc::new(MockApi::new());
    let storage = Arc::new(MemoryStorage::new());
    let first = ChatSession::resume(
        Arc::clone(&api) as Arc<dyn LearningApi>,
        Arc::clone(&storage) as Arc<dyn Storage>,
        "s1".to_string(),
    );
    api.enqueue("chat", reply_body("For s1 only."));
    first.send("hello").await.unwrap();

    let second = ChatSession::resume(
        api as Arc<dyn LearningApi>,
        storage as Arc<dyn Storage>,
        "s3".to_string(),
    );
    assert_eq!(second.transcript().len(), 1);
}
