use crate::{
    errors::ApiResult,
    types::{
        AuthResponse, ChatReply, ChatRequest, CheckoutSession, Course, CourseDraft, Enrollment,
        FeedbackRequest, LoginRequest, MessageResponse, OrderRequest, PaymentOrder,
        PaymentVerification, RegisterRequest, StudentSummary, UserStats, VerifyEmailRequest,
        VideoUpload,
    },
};

/// The backend REST surface, one method per operation.
///
/// The trait is the seam between the controllers and the wire: production
/// code uses [`crate::RestApi`], tests use
/// [`crate::learnhub_client_test::MockApi`].
#[async_trait::async_trait]
pub trait LearningApi: Send + Sync {
    // Auth
    async fn register(&self, request: RegisterRequest) -> ApiResult<AuthResponse>;
    async fn login(&self, request: LoginRequest) -> ApiResult<AuthResponse>;
    async fn verify_email(&self, request: VerifyEmailRequest) -> ApiResult<MessageResponse>;
    async fn logout(&self, user_id: &str) -> ApiResult<MessageResponse>;
    async fn user_stats(&self) -> ApiResult<UserStats>;

    // Courses
    /// Admin listing; authenticated by token.
    async fn list_courses(&self, token: &str) -> ApiResult<Vec<Course>>;
    /// Public catalog of visible courses.
    async fn all_courses(&self) -> ApiResult<Vec<Course>>;
    async fn teacher_courses(&self, teacher_id: &str) -> ApiResult<Vec<Course>>;
    async fn student_enrollments(&self, student_id: &str) -> ApiResult<Vec<Enrollment>>;
    async fn search_courses(&self, query: &str) -> ApiResult<Vec<Course>>;
    async fn create_course(&self, token: &str, draft: CourseDraft) -> ApiResult<MessageResponse>;
    async fn update_course(
        &self,
        token: &str,
        course_id: &str,
        draft: CourseDraft,
    ) -> ApiResult<MessageResponse>;
    async fn delete_course(&self, token: &str, course_id: &str) -> ApiResult<MessageResponse>;
    async fn add_video(&self, token: &str, upload: VideoUpload) -> ApiResult<MessageResponse>;

    // Users
    async fn students(&self) -> ApiResult<Vec<StudentSummary>>;

    // Payment
    async fn create_order(&self, token: &str, order: OrderRequest) -> ApiResult<PaymentOrder>;
    async fn verify_payment(
        &self,
        token: &str,
        payment_intent_id: &str,
        student_id: &str,
    ) -> ApiResult<PaymentVerification>;
    async fn create_checkout_session(
        &self,
        token: &str,
        order: OrderRequest,
    ) -> ApiResult<CheckoutSession>;
    async fn verify_session(
        &self,
        token: &str,
        session_id: &str,
        student_id: &str,
    ) -> ApiResult<PaymentVerification>;

    // Chatbot
    async fn chat(&self, token: Option<&str>, request: ChatRequest) -> ApiResult<ChatReply>;
    async fn chat_feedback(&self, token: Option<&str>, request: FeedbackRequest) -> ApiResult<()>;
    async fn clear_chat_memory(&self, token: Option<&str>) -> ApiResult<()>;
}
