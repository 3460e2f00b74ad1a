use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::{
    api::LearningApi,
    errors::{ApiError, ApiResult},
    types::{
        AuthResponse, ChatReply, ChatRequest, CheckoutSession, Course, CourseDraft, Enrollment,
        FeedbackRequest, LoginRequest, MessageResponse, OrderRequest, PaymentOrder,
        PaymentVerification, RegisterRequest, StudentSummary, UserStats, VerifyEmailRequest,
        VideoUpload,
    },
};

/// Result for a mocked API call: either a JSON body to deserialize into the
/// operation's response type, or an error to return.
pub enum MockResult {
    Json(Value),
    Error(ApiError),
}

impl From<Value> for MockResult {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<ApiError> for MockResult {
    fn from(error: ApiError) -> Self {
        Self::Error(error)
    }
}

/// One recorded invocation: the operation name and its arguments as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub op: String,
    pub payload: Value,
}

#[derive(Default)]
struct MockApiState {
    queued: HashMap<String, VecDeque<MockResult>>,
    calls: Vec<MockCall>,
}

/// A mock [`LearningApi`] for testing that tracks calls and yields predefined
/// results per operation. Operations are keyed by their trait method name.
#[derive(Default)]
pub struct MockApi {
    state: Mutex<MockApiState>,
}

impl MockApi {
    /// Construct a new mock with no queued results.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result for the named operation. Results are consumed in FIFO
    /// order; an operation invoked with an empty queue returns an
    /// [`ApiError::Invariant`].
    pub fn enqueue(&self, op: &str, result: impl Into<MockResult>) -> &Self {
        let mut state = self.state.lock().expect("mock state poisoned");
        state
            .queued
            .entry(op.to_string())
            .or_default()
            .push_back(result.into());
        drop(state);
        self
    }

    /// All recorded calls in invocation order.
    pub fn calls(&self) -> Vec<MockCall> {
        let state = self.state.lock().expect("mock state poisoned");
        state.calls.clone()
    }

    /// Number of recorded calls for the named operation.
    pub fn calls_for(&self, op: &str) -> usize {
        let state = self.state.lock().expect("mock state poisoned");
        state.calls.iter().filter(|call| call.op == op).count()
    }

    /// Clear recorded calls without touching queued results.
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("mock state poisoned");
        state.calls.clear();
    }

    fn invoke<R: DeserializeOwned>(&self, op: &str, payload: Value) -> ApiResult<R> {
        let mut state = self.state.lock().expect("mock state poisoned");
        state.calls.push(MockCall {
            op: op.to_string(),
            payload,
        });
        let result = state
            .queued
            .get_mut(op)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| ApiError::Invariant(format!("no mocked result for {op}")))?;
        drop(state);
        match result {
            MockResult::Json(value) => serde_json::from_value(value)
                .map_err(|e| ApiError::Invariant(format!("mocked {op} body does not fit: {e}"))),
            MockResult::Error(error) => Err(error),
        }
    }
}

#[async_trait::async_trait]
impl LearningApi for MockApi {
    async fn register(&self, request: RegisterRequest) -> ApiResult<AuthResponse> {
        self.invoke("register", json!({ "request": request }))
    }

    async fn login(&self, request: LoginRequest) -> ApiResult<AuthResponse> {
        self.invoke("login", json!({ "request": request }))
    }

    async fn verify_email(&self, request: VerifyEmailRequest) -> ApiResult<MessageResponse> {
        self.invoke("verify_email", json!({ "request": request }))
    }

    async fn logout(&self, user_id: &str) -> ApiResult<MessageResponse> {
        self.invoke("logout", json!({ "user_id": user_id }))
    }

    async fn user_stats(&self) -> ApiResult<UserStats> {
        self.invoke("user_stats", json!({}))
    }

    async fn list_courses(&self, token: &str) -> ApiResult<Vec<Course>> {
        self.invoke("list_courses", json!({ "token": token }))
    }

    async fn all_courses(&self) -> ApiResult<Vec<Course>> {
        self.invoke("all_courses", json!({}))
    }

    async fn teacher_courses(&self, teacher_id: &str) -> ApiResult<Vec<Course>> {
        self.invoke("teacher_courses", json!({ "teacher_id": teacher_id }))
    }

    async fn student_enrollments(&self, student_id: &str) -> ApiResult<Vec<Enrollment>> {
        self.invoke("student_enrollments", json!({ "student_id": student_id }))
    }

    async fn search_courses(&self, query: &str) -> ApiResult<Vec<Course>> {
        self.invoke("search_courses", json!({ "query": query }))
    }

    async fn create_course(&self, token: &str, draft: CourseDraft) -> ApiResult<MessageResponse> {
        self.invoke("create_course", json!({ "token": token, "draft": draft }))
    }

    async fn update_course(
        &self,
        token: &str,
        course_id: &str,
        draft: CourseDraft,
    ) -> ApiResult<MessageResponse> {
        self.invoke(
            "update_course",
            json!({ "token": token, "course_id": course_id, "draft": draft }),
        )
    }

    async fn delete_course(&self, token: &str, course_id: &str) -> ApiResult<MessageResponse> {
        self.invoke(
            "delete_course",
            json!({ "token": token, "course_id": course_id }),
        )
    }

    async fn add_video(&self, token: &str, upload: VideoUpload) -> ApiResult<MessageResponse> {
        self.invoke("add_video", json!({ "token": token, "upload": upload }))
    }

    async fn students(&self) -> ApiResult<Vec<StudentSummary>> {
        self.invoke("students", json!({}))
    }

    async fn create_order(&self, token: &str, order: OrderRequest) -> ApiResult<PaymentOrder> {
        self.invoke("create_order", json!({ "token": token, "order": order }))
    }

    async fn verify_payment(
        &self,
        token: &str,
        payment_intent_id: &str,
        student_id: &str,
    ) -> ApiResult<PaymentVerification> {
        self.invoke(
            "verify_payment",
            json!({
                "token": token,
                "payment_intent_id": payment_intent_id,
                "student_id": student_id,
            }),
        )
    }

    async fn create_checkout_session(
        &self,
        token: &str,
        order: OrderRequest,
    ) -> ApiResult<CheckoutSession> {
        self.invoke(
            "create_checkout_session",
            json!({ "token": token, "order": order }),
        )
    }

    async fn verify_session(
        &self,
        token: &str,
        session_id: &str,
        student_id: &str,
    ) -> ApiResult<PaymentVerification> {
        self.invoke(
            "verify_session",
            json!({
                "token": token,
                "session_id": session_id,
                "student_id": student_id,
            }),
        )
    }

    async fn chat(&self, token: Option<&str>, request: ChatRequest) -> ApiResult<ChatReply> {
        self.invoke("chat", json!({ "token": token, "request": request }))
    }

    async fn chat_feedback(&self, token: Option<&str>, request: FeedbackRequest) -> ApiResult<()> {
        self.invoke("chat_feedback", json!({ "token": token, "request": request }))
    }

    async fn clear_chat_memory(&self, token: Option<&str>) -> ApiResult<()> {
        self.invoke("clear_chat_memory", json!({ "token": token }))
    }
}
