use crate::{
    errors::DashboardResult,
    storage::{chat_history_key, Storage},
};
use learnhub_client::{ChatRequest, ChatSource, LearningApi, UserContext};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::{SystemTime, UNIX_EPOCH},
};

const WELCOME_MESSAGE: &str = "Hi! I'm your Learning Assistant. I can help with course \
recommendations, enrollment guidance, learning paths, and technical support. What would you like \
to know?";
const ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Canned prompts offered as one-click quick actions.
pub const QUICK_ACTIONS: &[(&str, &str)] = &[
    ("courses", "What courses are available?"),
    ("enrollment", "How do I enroll in a course?"),
    ("paths", "Can you suggest a learning path for me?"),
    ("support", "I need technical support"),
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Bot,
}

/// One transcript entry. `timestamp` identifies the entry for feedback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<ChatSource>,
}

struct ChatState {
    transcript: Vec<ChatMessage>,
    context: UserContext,
    token: Option<String>,
    feedback_sent: HashSet<String>,
}

/// A conversation with the learning assistant, keyed by a generated session
/// identifier and persisted locally so the transcript survives reloads.
pub struct ChatSession {
    api: Arc<dyn LearningApi>,
    storage: Arc<dyn Storage>,
    session_id: String,
    typing: AtomicBool,
    state: Mutex<ChatState>,
}

impl ChatSession {
    /// Start a fresh conversation under a newly generated session id.
    #[must_use]
    pub fn new(api: Arc<dyn LearningApi>, storage: Arc<dyn Storage>) -> Self {
        Self::resume(api, storage, generate_session_id())
    }

    /// Continue the conversation stored under `session_id`, falling back to a
    /// fresh transcript when nothing (or something unreadable) is stored.
    #[must_use]
    pub fn resume(
        api: Arc<dyn LearningApi>,
        storage: Arc<dyn Storage>,
        session_id: String,
    ) -> Self {
        let transcript = storage
            .get(&chat_history_key(&session_id))
            .and_then(|raw| serde_json::from_str::<Vec<ChatMessage>>(&raw).ok())
            .filter(|messages| !messages.is_empty())
            .unwrap_or_else(|| vec![welcome()]);
        Self {
            api,
            storage,
            session_id,
            typing: AtomicBool::new(false),
            state: Mutex::new(ChatState {
                transcript,
                context: UserContext::default(),
                token: None,
                feedback_sent: HashSet::new(),
            }),
        }
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        let state = self.state.lock().expect("chat state poisoned");
        state.transcript.clone()
    }

    /// Whether a reply is pending; stands in for the typing placeholder.
    pub fn is_typing(&self) -> bool {
        self.typing.load(Ordering::SeqCst)
    }

    pub fn set_token(&self, token: Option<String>) {
        let mut state = self.state.lock().expect("chat state poisoned");
        state.token = token;
    }

    pub fn set_context(&self, context: UserContext) {
        let mut state = self.state.lock().expect("chat state poisoned");
        state.context = context;
    }

    /// Send a user message and append the assistant reply. The typing flag is
    /// set for the duration of the round trip and is cleared before the reply
    /// (or the error placeholder) is appended.
    pub async fn send(&self, text: &str) -> DashboardResult<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        // A round trip is already pending; drop the input like the widget does.
        if self
            .typing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(());
        }

        let (request, token) = {
            let mut state = self.state.lock().expect("chat state poisoned");
            state.transcript.push(ChatMessage {
                role: ChatRole::User,
                text: text.to_string(),
                timestamp: now_millis().to_string(),
                intent: None,
                sources: Vec::new(),
            });
            self.persist(&state.transcript);
            (
                ChatRequest {
                    message: text.to_string(),
                    user_context: state.context.clone(),
                    session_id: Some(self.session_id.clone()),
                },
                state.token.clone(),
            )
        };

        let result = self.api.chat(token.as_deref(), request).await;
        self.typing.store(false, Ordering::SeqCst);

        let mut state = self.state.lock().expect("chat state poisoned");
        match result {
            Ok(reply) => {
                state.transcript.push(ChatMessage {
                    role: ChatRole::Bot,
                    text: reply.response,
                    timestamp: reply.timestamp,
                    intent: reply.intent,
                    sources: reply.sources,
                });
                self.persist(&state.transcript);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat request failed");
                state.transcript.push(ChatMessage {
                    role: ChatRole::Bot,
                    text: ERROR_REPLY.to_string(),
                    timestamp: now_millis().to_string(),
                    intent: None,
                    sources: Vec::new(),
                });
                self.persist(&state.transcript);
                Err(e.into())
            }
        }
    }

    /// Submit one of the canned quick-action prompts.
    pub async fn quick_action(&self, action: &str) -> DashboardResult<()> {
        let Some((_, message)) = QUICK_ACTIONS.iter().find(|(name, _)| *name == action) else {
            return Ok(());
        };
        self.send(message).await
    }

    /// Whether feedback can still be submitted for the given reply.
    pub fn feedback_enabled(&self, message_id: &str) -> bool {
        let state = self.state.lock().expect("chat state poisoned");
        !state.feedback_sent.contains(message_id)
    }

    /// Submit thumbs up/down for a reply. The control is disabled locally
    /// before the request goes out, so a reply gets at most one submission
    /// regardless of the network outcome.
    pub async fn feedback(&self, message_id: &str, rating: u8) -> DashboardResult<()> {
        let token = {
            let mut state = self.state.lock().expect("chat state poisoned");
            if !state.feedback_sent.insert(message_id.to_string()) {
                return Ok(());
            }
            state.token.clone()
        };
        self.api
            .chat_feedback(
                token.as_deref(),
                learnhub_client::FeedbackRequest {
                    message_id: message_id.to_string(),
                    rating,
                },
            )
            .await?;
        Ok(())
    }

    /// Clear the backend conversation memory and the local transcript. The
    /// local history is reset even when the backend call fails.
    pub async fn clear(&self) -> DashboardResult<()> {
        let token = {
            let state = self.state.lock().expect("chat state poisoned");
            state.token.clone()
        };
        let backend = self.api.clear_chat_memory(token.as_deref()).await;
        self.storage.remove(&chat_history_key(&self.session_id));
        {
            let mut state = self.state.lock().expect("chat state poisoned");
            state.transcript = vec![welcome()];
        }
        backend?;
        Ok(())
    }

    fn persist(&self, transcript: &[ChatMessage]) {
        if let Ok(raw) = serde_json::to_string(transcript) {
            self.storage.set(&chat_history_key(&self.session_id), &raw);
        }
    }
}

fn welcome() -> ChatMessage {
    ChatMessage {
        role: ChatRole::Bot,
        text: WELCOME_MESSAGE.to_string(),
        timestamp: "welcome".to_string(),
        intent: None,
        sources: Vec::new(),
    }
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Time-based id with a random suffix. Not cryptographically unique; it only
/// scopes local history.
fn generate_session_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();
    format!("session_{}_{}", now_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_carry_prefix_and_differ() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert!(a.starts_with("session_"));
        assert_ne!(a, b);
    }
}
