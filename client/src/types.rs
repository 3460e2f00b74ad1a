use serde::{Deserialize, Serialize};
use std::fmt;

/// The role attached to a platform account.
/// The backend is not consistent about casing (`"Teacher"` but `"student"`),
/// so every variant also accepts its capitalized form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "Admin")]
    Admin,
    #[serde(alias = "Teacher")]
    Teacher,
    #[serde(alias = "Student")]
    Student,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Teacher => write!(f, "teacher"),
            Self::Student => write!(f, "student"),
        }
    }
}

/// An authenticated platform account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub otp: String,
}

/// Response to login and registration calls. The backend omits fields
/// depending on the operation, so everything besides `message` is optional;
/// callers must treat a token without a user (or the reverse) as logged out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Plain acknowledgement body used by most mutating endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

/// A course as returned by the backend. Only `id`, `title`, `description`
/// and `price` are present on every endpoint; the rest varies per listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrolled_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct CourseList {
    #[serde(default)]
    pub courses: Vec<Course>,
}

/// A file carried on a multipart request (course thumbnail, lesson video).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileAttachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Client-side course fields for create and update calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub teacher_id: String,
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<FileAttachment>,
}

/// A video attachment for an existing course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoUpload {
    pub course_id: String,
    pub title: String,
    pub description: String,
    pub video: FileAttachment,
}

/// The backend-owned relationship between a student and a course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Enrollment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    pub course_title: String,
    /// Completion percentage in `[0, 100]`.
    #[serde(default)]
    pub progress: f64,
    pub enrolled_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct EnrollmentList {
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentSummary {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub enrolled_courses: u32,
    #[serde(default, rename = "isActive")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct StudentList {
    #[serde(default)]
    pub students: Vec<StudentSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OnlineUser {
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Aggregate account statistics shown on the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserStats {
    pub total_users: u64,
    pub online_users: u64,
    pub offline_users: u64,
    #[serde(default)]
    pub online_user_details: Vec<OnlineUser>,
}

/// Arguments shared by the two order-creation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRequest {
    pub course_id: String,
    pub student_id: String,
}

/// A payment order created for the direct card-confirmation flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentOrder {
    pub payment_id: String,
    /// Secret handed to the third-party card gateway to confirm the payment.
    pub client_secret: String,
    /// Amount in the smallest currency unit.
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub stripe_publishable_key: String,
}

/// A hosted checkout session for the redirect flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutSession {
    pub session_id: String,
    /// Backend-supplied URL the browser must navigate to.
    pub checkout_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentVerification {
    pub message: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
}

/// Lightweight user context accumulated client-side and sent with every chat
/// message so the assistant can personalize replies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserContext {
    #[serde(default)]
    pub enrolled_courses: Vec<String>,
    pub user_level: String,
    #[serde(default)]
    pub interests: Vec<String>,
    pub current_page: String,
}

impl Default for UserContext {
    fn default() -> Self {
        Self {
            enrolled_courses: Vec::new(),
            user_level: "beginner".to_string(),
            interests: Vec::new(),
            current_page: "/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    pub user_context: UserContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// A cited document backing an assistant reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatSource {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// An assistant reply. `timestamp` doubles as the reply identifier for
/// feedback submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatReply {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default)]
    pub sources: Vec<ChatSource>,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackRequest {
    pub message_id: String,
    /// 1 (thumbs down) to 5 (thumbs up).
    pub rating: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_accepts_backend_casing() {
        let teacher: Role = serde_json::from_str(r#""Teacher""#).unwrap();
        assert_eq!(teacher, Role::Teacher);
        let student: Role = serde_json::from_str(r#""student""#).unwrap();
        assert_eq!(student, Role::Student);
        let admin: Role = serde_json::from_str(r#""Admin""#).unwrap();
        assert_eq!(admin, Role::Admin);
    }

    #[test]
    fn course_accepts_mongo_id_alias() {
        let course: Course = serde_json::from_str(
            r#"{"_id": "c1", "title": "Rust", "description": "systems", "price": 49.0}"#,
        )
        .unwrap();
        assert_eq!(course.id, "c1");
        assert_eq!(course.enrolled_count, None);
    }

    #[test]
    fn auth_response_tolerates_missing_fields() {
        let response: AuthResponse = serde_json::from_str(r#"{"message": "ok"}"#).unwrap();
        assert_eq!(response.access_token, None);
        assert_eq!(response.user, None);
    }

    #[test]
    fn chat_reply_defaults_optional_fields() {
        let reply: ChatReply =
            serde_json::from_str(r#"{"response": "hi", "timestamp": "t-1"}"#).unwrap();
        assert_eq!(reply.intent, None);
        assert!(reply.sources.is_empty());
    }
}
