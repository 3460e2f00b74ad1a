use crate::{
    api::LearningApi,
    errors::{ApiError, ApiResult},
    http::{send_form, send_json, BusyFlag},
    types::{
        AuthResponse, ChatReply, ChatRequest, CheckoutSession, Course, CourseDraft, CourseList,
        Enrollment, EnrollmentList, FeedbackRequest, LoginRequest, MessageResponse, OrderRequest,
        PaymentOrder, PaymentVerification, RegisterRequest, StudentList, StudentSummary, UserStats,
        VerifyEmailRequest, VideoUpload,
    },
};
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    multipart, Client, Method,
};

pub struct RestApiOptions {
    /// Base URL of the backend, e.g. `http://localhost:8001/api/v1`.
    pub base_url: Option<String>,
}

/// The reqwest-backed implementation of [`LearningApi`].
pub struct RestApi {
    base_url: String,
    client: Client,
    busy: BusyFlag,
}

impl RestApi {
    #[must_use]
    pub fn new(options: RestApiOptions) -> Self {
        Self {
            base_url: options
                .base_url
                .unwrap_or_else(|| "http://localhost:8001/api/v1".to_string()),
            client: Client::new(),
            busy: BusyFlag::default(),
        }
    }

    /// Number of requests currently in flight. Zero whenever no call is
    /// awaited, on every exit path.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.busy.in_flight()
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    async fn post_json<T: serde::Serialize, R: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> ApiResult<R> {
        let _busy = self.busy.acquire();
        send_json(
            &self.client,
            Method::POST,
            &self.url(endpoint),
            Some(body),
            HeaderMap::new(),
        )
        .await
    }

    async fn get<R: serde::de::DeserializeOwned>(&self, endpoint: &str) -> ApiResult<R> {
        let _busy = self.busy.acquire();
        send_json::<(), R>(
            &self.client,
            Method::GET,
            &self.url(endpoint),
            None,
            HeaderMap::new(),
        )
        .await
    }

    async fn form<R: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        form: multipart::Form,
    ) -> ApiResult<R> {
        let _busy = self.busy.acquire();
        send_form(&self.client, method, &self.url(endpoint), form).await
    }
}

/// Build the authorization header for the chatbot endpoints, the only part of
/// the surface that authenticates via header rather than a token form field.
fn bearer_headers(token: Option<&str>) -> ApiResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    if let Some(token) = token {
        let mut value: HeaderValue = format!("Bearer {token}")
            .try_into()
            .map_err(|_| ApiError::Invariant("auth token is not a valid header value".into()))?;
        value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, value);
    }
    Ok(headers)
}

fn course_form(token: &str, draft: CourseDraft) -> multipart::Form {
    let mut form = multipart::Form::new()
        .text("token", token.to_string())
        .text("title", draft.title)
        .text("description", draft.description)
        .text("price", draft.price.to_string())
        .text("teacher_id", draft.teacher_id)
        .text("visible", draft.visible.to_string());
    if let Some(thumbnail) = draft.thumbnail {
        form = form.part(
            "thumbnail",
            multipart::Part::bytes(thumbnail.bytes).file_name(thumbnail.file_name),
        );
    }
    form
}

#[async_trait::async_trait]
impl LearningApi for RestApi {
    async fn register(&self, request: RegisterRequest) -> ApiResult<AuthResponse> {
        self.post_json("/auth/register", &request).await
    }

    async fn login(&self, request: LoginRequest) -> ApiResult<AuthResponse> {
        self.post_json("/auth/login", &request).await
    }

    async fn verify_email(&self, request: VerifyEmailRequest) -> ApiResult<MessageResponse> {
        self.post_json("/auth/verify-email", &request).await
    }

    async fn logout(&self, user_id: &str) -> ApiResult<MessageResponse> {
        self.post_json("/auth/logout", &serde_json::json!({ "user_id": user_id }))
            .await
    }

    async fn user_stats(&self) -> ApiResult<UserStats> {
        self.get("/auth/users/stats").await
    }

    async fn list_courses(&self, token: &str) -> ApiResult<Vec<Course>> {
        let list: CourseList = self
            .get(&format!("/courses/list?token={}", urlencoding::encode(token)))
            .await?;
        Ok(list.courses)
    }

    async fn all_courses(&self) -> ApiResult<Vec<Course>> {
        let list: CourseList = self.get("/courses/all").await?;
        Ok(list.courses)
    }

    async fn teacher_courses(&self, teacher_id: &str) -> ApiResult<Vec<Course>> {
        let list: CourseList = self
            .get(&format!("/courses/teacher/{teacher_id}"))
            .await?;
        Ok(list.courses)
    }

    async fn student_enrollments(&self, student_id: &str) -> ApiResult<Vec<Enrollment>> {
        let list: EnrollmentList = self
            .get(&format!("/courses/student/{student_id}"))
            .await?;
        Ok(list.enrollments)
    }

    async fn search_courses(&self, query: &str) -> ApiResult<Vec<Course>> {
        let list: CourseList = self
            .get(&format!("/courses/search/{}", urlencoding::encode(query)))
            .await?;
        Ok(list.courses)
    }

    async fn create_course(&self, token: &str, draft: CourseDraft) -> ApiResult<MessageResponse> {
        self.form(Method::POST, "/courses/create", course_form(token, draft))
            .await
    }

    async fn update_course(
        &self,
        token: &str,
        course_id: &str,
        draft: CourseDraft,
    ) -> ApiResult<MessageResponse> {
        let form = course_form(token, draft).text("course_id", course_id.to_string());
        self.form(Method::PUT, "/courses/update", form).await
    }

    async fn delete_course(&self, token: &str, course_id: &str) -> ApiResult<MessageResponse> {
        let _busy = self.busy.acquire();
        send_json::<(), MessageResponse>(
            &self.client,
            Method::DELETE,
            &self.url(&format!(
                "/courses/delete?token={}&course_id={}",
                urlencoding::encode(token),
                urlencoding::encode(course_id)
            )),
            None,
            HeaderMap::new(),
        )
        .await
    }

    async fn add_video(&self, token: &str, upload: VideoUpload) -> ApiResult<MessageResponse> {
        let form = multipart::Form::new()
            .text("token", token.to_string())
            .text("course_id", upload.course_id)
            .text("title", upload.title)
            .text("description", upload.description)
            .part(
                "video_file",
                multipart::Part::bytes(upload.video.bytes).file_name(upload.video.file_name),
            );
        self.form(Method::POST, "/courses/add-video", form).await
    }

    async fn students(&self) -> ApiResult<Vec<StudentSummary>> {
        let list: StudentList = self.get("/users/students").await?;
        Ok(list.students)
    }

    async fn create_order(&self, token: &str, order: OrderRequest) -> ApiResult<PaymentOrder> {
        let form = multipart::Form::new()
            .text("token", token.to_string())
            .text("course_id", order.course_id)
            .text("student_id", order.student_id);
        self.form(Method::POST, "/payment/create-order", form).await
    }

    async fn verify_payment(
        &self,
        token: &str,
        payment_intent_id: &str,
        student_id: &str,
    ) -> ApiResult<PaymentVerification> {
        let form = multipart::Form::new()
            .text("token", token.to_string())
            .text("payment_intent_id", payment_intent_id.to_string())
            .text("student_id", student_id.to_string());
        self.form(Method::POST, "/payment/verify-payment", form)
            .await
    }

    async fn create_checkout_session(
        &self,
        token: &str,
        order: OrderRequest,
    ) -> ApiResult<CheckoutSession> {
        let form = multipart::Form::new()
            .text("token", token.to_string())
            .text("course_id", order.course_id)
            .text("student_id", order.student_id);
        self.form(Method::POST, "/payment/create-checkout-session", form)
            .await
    }

    async fn verify_session(
        &self,
        token: &str,
        session_id: &str,
        student_id: &str,
    ) -> ApiResult<PaymentVerification> {
        let form = multipart::Form::new()
            .text("token", token.to_string())
            .text("session_id", session_id.to_string())
            .text("student_id", student_id.to_string());
        self.form(Method::POST, "/payment/verify-session", form)
            .await
    }

    async fn chat(&self, token: Option<&str>, request: ChatRequest) -> ApiResult<ChatReply> {
        let _busy = self.busy.acquire();
        send_json(
            &self.client,
            Method::POST,
            &self.url("/chatbot/chat"),
            Some(&request),
            bearer_headers(token)?,
        )
        .await
    }

    async fn chat_feedback(&self, token: Option<&str>, request: FeedbackRequest) -> ApiResult<()> {
        let _busy = self.busy.acquire();
        let _ack: serde_json::Value = send_json(
            &self.client,
            Method::POST,
            &self.url("/chatbot/feedback"),
            Some(&request),
            bearer_headers(token)?,
        )
        .await?;
        Ok(())
    }

    async fn clear_chat_memory(&self, token: Option<&str>) -> ApiResult<()> {
        let _busy = self.busy.acquire();
        let _ack: serde_json::Value = send_json::<(), _>(
            &self.client,
            Method::POST,
            &self.url("/chatbot/clear-memory"),
            None,
            bearer_headers(token)?,
        )
        .await?;
        Ok(())
    }
}
