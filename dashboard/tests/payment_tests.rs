use learnhub_client::learnhub_client_test::MockApi;
use learnhub_client::{ApiError, LearningApi, Role, User};
use learnhub_dashboard::payment::{
    CardDetails, CardGateway, Navigator, PaymentFlow, PaymentState,
};
use learnhub_dashboard::{
    BufferedNotifier, MemoryStorage, Notifier, Session, Severity, Storage, PENDING_PAYMENT_KEY,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

struct Harness {
    api: Arc<MockApi>,
    storage: Arc<MemoryStorage>,
    notifier: Arc<BufferedNotifier>,
    flow: PaymentFlow,
}

fn harness() -> Harness {
    let api = Arc::new(MockApi::new());
    let storage = Arc::new(MemoryStorage::new());
    let notifier = Arc::new(BufferedNotifier::new());
    let flow = PaymentFlow::new(
        Arc::clone(&api) as Arc<dyn LearningApi>,
        Arc::clone(&storage) as Arc<dyn Storage>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
    );
    Harness {
        api,
        storage,
        notifier,
        flow,
    }
}

fn session() -> Session {
    Session {
        token: "t1".to_string(),
        user: User {
            id: "u1".to_string(),
            name: "Sam".to_string(),
            email: Some("sam@example.com".to_string()),
            role: Role::Student,
        },
    }
}

fn card() -> CardDetails {
    CardDetails {
        number: "4242424242424242".to_string(),
        exp_month: 12,
        exp_year: 2030,
        cvc: "123".to_string(),
        holder_name: "Sam".to_string(),
        holder_email: "sam@example.com".to_string(),
    }
}

fn order_body() -> serde_json::Value {
    json!({
        "payment_id": "pi_1",
        "client_secret": "pi_1_secret",
        "amount": 4900,
        "currency": "usd",
        "status": "requires_payment_method",
        "stripe_publishable_key": "pk_test_1"
    })
}

fn verified_body() -> serde_json::Value {
    json!({ "message": "Payment verified", "status": "succeeded" })
}

struct ApprovingGateway;

#[async_trait::async_trait]
impl CardGateway for ApprovingGateway {
    async fn confirm_card_payment(
        &self,
        _client_secret: &str,
        _card: &CardDetails,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        Ok("pi_1".to_string())
    }
}

struct DecliningGateway;

#[async_trait::async_trait]
impl CardGateway for DecliningGateway {
    async fn confirm_card_payment(
        &self,
        _client_secret: &str,
        _card: &CardDetails,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        Err("card declined".into())
    }
}

#[derive(Default)]
struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, url: &str) {
        self.visited.lock().unwrap().push(url.to_string());
    }
}

#[tokio::test]
async fn direct_purchase_verifies_and_notifies_success() {
    let h = harness();
    h.api
        .enqueue("create_order", order_body())
        .enqueue("verify_payment", verified_body());
    h.flow
        .purchase_direct(&session(), "c1", &ApprovingGateway, &card())
        .await
        .unwrap();

    assert_eq!(h.flow.state(), PaymentState::Verified);
    assert_eq!(h.api.calls_for("verify_payment"), 1);
    let entries = h.notifier.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, Severity::Success);
}

#[tokio::test]
async fn declined_card_resets_to_idle_without_verification() {
    let h = harness();
    h.api.enqueue("create_order", order_body());
    let result = h
        .flow
        .purchase_direct(&session(), "c1", &DecliningGateway, &card())
        .await;

    assert!(result.is_err());
    assert_eq!(h.flow.state(), PaymentState::Idle);
    assert_eq!(h.api.calls_for("verify_payment"), 0);
    let entries = h.notifier.entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].message.starts_with("Payment failed:"));
}

#[tokio::test]
async fn checkout_redirects_to_the_backend_url() {
    let h = harness();
    h.api.enqueue(
        "create_checkout_session",
        json!({ "session_id": "cs_9", "checkout_url": "https://pay.example.com/cs_9" }),
    );
    let navigator = RecordingNavigator::default();
    h.flow
        .begin_checkout(&session(), "c1", &navigator)
        .await
        .unwrap();

    assert_eq!(h.flow.state(), PaymentState::Redirected);
    assert_eq!(
        navigator.visited.lock().unwrap().as_slice(),
        ["https://pay.example.com/cs_9"]
    );
}

#[tokio::test]
async fn cancelled_return_warns_once_and_skips_verification() {
    let h = harness();
    h.flow
        .handle_checkout_return(Some(&session()), "?payment=cancelled")
        .await
        .unwrap();

    assert_eq!(h.flow.state(), PaymentState::Idle);
    assert_eq!(h.api.calls_for("verify_session"), 0);
    let entries = h.notifier.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, Severity::Warning);
    assert_eq!(entries[0].message, "Payment was cancelled");
}

#[tokio::test]
async fn successful_return_with_session_verifies_immediately() {
    let h = harness();
    h.api.enqueue("verify_session", verified_body());
    h.flow
        .handle_checkout_return(Some(&session()), "payment=success&session_id=cs_2")
        .await
        .unwrap();

    assert_eq!(h.flow.state(), PaymentState::Verified);
    assert_eq!(h.api.calls_for("verify_session"), 1);
    assert_eq!(h.storage.get(PENDING_PAYMENT_KEY), None);
}

#[tokio::test]
async fn successful_return_without_auth_session_parks_the_id() {
    let h = harness();
    h.flow
        .handle_checkout_return(None, "payment=success&session_id=cs_1")
        .await
        .unwrap();

    assert_eq!(
        h.storage.get(PENDING_PAYMENT_KEY),
        Some("cs_1".to_string())
    );
    assert!(h.api.calls().is_empty());
}

#[tokio::test]
async fn pending_verification_gets_exactly_one_attempt() {
    let h = harness();
    h.storage.set(PENDING_PAYMENT_KEY, "cs_1");
    h.api
        .enqueue("verify_session", ApiError::Invariant("expired".to_string()));
    let result = h.flow.resume_pending(&session()).await;

    assert!(result.is_err());
    // Consumed up front, so the failed id is not retried.
    assert_eq!(h.storage.get(PENDING_PAYMENT_KEY), None);
    assert_eq!(h.api.calls_for("verify_session"), 1);

    h.flow.resume_pending(&session()).await.unwrap();
    assert_eq!(h.api.calls_for("verify_session"), 1);
}

#[tokio::test]
async fn failed_verification_resets_and_notifies() {
    let h = harness();
    h.api
        .enqueue("verify_session", ApiError::Invariant("expired".to_string()));
    let result = h
        .flow
        .handle_checkout_return(Some(&session()), "payment=success&session_id=cs_3")
        .await;

    assert!(result.is_err());
    assert_eq!(h.flow.state(), PaymentState::Idle);
    let entries = h.notifier.entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].message.starts_with("Payment verification failed:"));
}

#[tokio::test]
async fn unrelated_queries_are_ignored() {
    let h = harness();
    h.flow
        .handle_checkout_return(Some(&session()), "tab=catalog")
        .await
        .unwrap();

    assert!(h.api.calls().is_empty());
    assert!(h.notifier.entries().is_empty());
    assert_eq!(h.flow.state(), PaymentState::Idle);
}
