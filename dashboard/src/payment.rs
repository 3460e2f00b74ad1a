use crate::{
    errors::{DashboardError, DashboardResult},
    notify::Notifier,
    session::Session,
    storage::{Storage, PENDING_PAYMENT_KEY},
};
use learnhub_client::{LearningApi, OrderRequest};
use std::sync::{Arc, Mutex};

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Card details handed to the third-party gateway in the direct flow.
#[derive(Debug, Clone)]
pub struct CardDetails {
    pub number: String,
    pub exp_month: u8,
    pub exp_year: u16,
    pub cvc: String,
    pub holder_name: String,
    pub holder_email: String,
}

/// The third-party payment API used in the direct-confirmation flow: takes
/// the order's client secret and the card, returns the payment-intent id.
#[async_trait::async_trait]
pub trait CardGateway: Send + Sync {
    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        card: &CardDetails,
    ) -> Result<String, BoxedError>;
}

/// Browser navigation seam for the redirect flow.
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &str);
}

/// Progress of the current payment attempt. The direct flow passes through
/// `OrderCreated` and `Confirming`; the redirect flow through
/// `SessionCreated` and `Redirected`. Failure resets to `Idle`; each attempt
/// is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentState {
    Idle,
    OrderCreated,
    Confirming,
    SessionCreated,
    Redirected,
    Verified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentReturnStatus {
    Success,
    Cancelled,
}

/// The outcome carried back in the query string after a hosted checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutReturn {
    pub status: PaymentReturnStatus,
    pub session_id: Option<String>,
}

/// Parse the `payment` and `session_id` query parameters from a return URL.
/// Tolerates a leading `?`, extra parameters, and any ordering.
#[must_use]
pub fn parse_return_query(query: &str) -> Option<CheckoutReturn> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut status = None;
    let mut session_id = None;
    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        match key {
            "payment" => {
                status = match value {
                    "success" => Some(PaymentReturnStatus::Success),
                    "cancelled" => Some(PaymentReturnStatus::Cancelled),
                    _ => return None,
                }
            }
            "session_id" => session_id = Some(value.to_string()),
            _ => {}
        }
    }
    Some(CheckoutReturn {
        status: status?,
        session_id,
    })
}

/// Orchestrates course purchase. Two strategies against one backend surface:
/// direct card confirmation via a [`CardGateway`], or a hosted checkout
/// reached through a [`Navigator`] redirect.
pub struct PaymentFlow {
    api: Arc<dyn LearningApi>,
    storage: Arc<dyn Storage>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<PaymentState>,
}

impl PaymentFlow {
    #[must_use]
    pub fn new(
        api: Arc<dyn LearningApi>,
        storage: Arc<dyn Storage>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            storage,
            notifier,
            state: Mutex::new(PaymentState::Idle),
        }
    }

    pub fn state(&self) -> PaymentState {
        *self.state.lock().expect("payment state poisoned")
    }

    fn set_state(&self, state: PaymentState) {
        tracing::debug!(?state, "payment state");
        *self.state.lock().expect("payment state poisoned") = state;
    }

    /// Direct-confirmation purchase: create the order, confirm the card with
    /// the gateway, then ask the backend to verify the payment intent.
    pub async fn purchase_direct(
        &self,
        session: &Session,
        course_id: &str,
        gateway: &dyn CardGateway,
        card: &CardDetails,
    ) -> DashboardResult<()> {
        let result = self
            .purchase_direct_inner(session, course_id, gateway, card)
            .await;
        if let Err(e) = &result {
            self.set_state(PaymentState::Idle);
            self.notifier.error(&format!("Payment failed: {e}"));
        }
        result
    }

    async fn purchase_direct_inner(
        &self,
        session: &Session,
        course_id: &str,
        gateway: &dyn CardGateway,
        card: &CardDetails,
    ) -> DashboardResult<()> {
        let order = self
            .api
            .create_order(
                &session.token,
                OrderRequest {
                    course_id: course_id.to_string(),
                    student_id: session.user.id.clone(),
                },
            )
            .await?;
        self.set_state(PaymentState::OrderCreated);

        let intent_id = gateway
            .confirm_card_payment(&order.client_secret, card)
            .await
            .map_err(|e| DashboardError::Invariant(format!("card confirmation failed: {e}")))?;
        self.set_state(PaymentState::Confirming);

        self.api
            .verify_payment(&session.token, &intent_id, &session.user.id)
            .await?;
        self.set_state(PaymentState::Verified);
        self.notifier.success("Payment successful! Course enrolled.");
        Ok(())
    }

    /// Redirect purchase: create a hosted checkout session and navigate to
    /// the backend-supplied URL. Verification happens on return.
    pub async fn begin_checkout(
        &self,
        session: &Session,
        course_id: &str,
        navigator: &dyn Navigator,
    ) -> DashboardResult<()> {
        let checkout = self
            .api
            .create_checkout_session(
                &session.token,
                OrderRequest {
                    course_id: course_id.to_string(),
                    student_id: session.user.id.clone(),
                },
            )
            .await
            .inspect_err(|e| {
                self.set_state(PaymentState::Idle);
                self.notifier.error(&format!("Payment failed: {e}"));
            })?;
        self.set_state(PaymentState::SessionCreated);
        navigator.navigate(&checkout.checkout_url);
        self.set_state(PaymentState::Redirected);
        Ok(())
    }

    /// Handle the query string the browser carries back from the hosted
    /// checkout. A cancellation produces a single warning and no verification
    /// call. A success is verified immediately when a session is active;
    /// otherwise the session id is stored as pending and verified later via
    /// [`Self::resume_pending`].
    pub async fn handle_checkout_return(
        &self,
        session: Option<&Session>,
        query: &str,
    ) -> DashboardResult<()> {
        let Some(checkout_return) = parse_return_query(query) else {
            return Ok(());
        };
        match checkout_return.status {
            PaymentReturnStatus::Cancelled => {
                self.set_state(PaymentState::Idle);
                self.notifier.warning("Payment was cancelled");
                Ok(())
            }
            PaymentReturnStatus::Success => {
                let Some(session_id) = checkout_return.session_id else {
                    return Err(DashboardError::Invariant(
                        "payment=success without session_id".to_string(),
                    ));
                };
                match session {
                    Some(session) => self.verify_checkout(session, &session_id).await,
                    None => {
                        // Returned before the auth session was restored; park
                        // the id until one exists.
                        self.storage.set(PENDING_PAYMENT_KEY, &session_id);
                        Ok(())
                    }
                }
            }
        }
    }

    /// Verify a parked checkout session id once an auth session is available.
    /// The marker is consumed up front, so the id gets exactly one attempt
    /// whether or not verification succeeds.
    pub async fn resume_pending(&self, session: &Session) -> DashboardResult<()> {
        let Some(session_id) = self.storage.get(PENDING_PAYMENT_KEY) else {
            return Ok(());
        };
        self.storage.remove(PENDING_PAYMENT_KEY);
        self.verify_checkout(session, &session_id).await
    }

    async fn verify_checkout(&self, session: &Session, session_id: &str) -> DashboardResult<()> {
        match self
            .api
            .verify_session(&session.token, session_id, &session.user.id)
            .await
        {
            Ok(_) => {
                self.set_state(PaymentState::Verified);
                self.notifier.success("Payment successful! Course enrolled.");
                Ok(())
            }
            Err(e) => {
                self.set_state(PaymentState::Idle);
                self.notifier
                    .error(&format!("Payment verification failed: {e}"));
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_success_with_session_id() {
        let parsed = parse_return_query("payment=success&session_id=cs_1").unwrap();
        assert_eq!(parsed.status, PaymentReturnStatus::Success);
        assert_eq!(parsed.session_id.as_deref(), Some("cs_1"));
    }

    #[test]
    fn parses_cancelled_in_any_order_with_extras() {
        let parsed = parse_return_query("?utm=x&session_id=cs_2&payment=cancelled").unwrap();
        assert_eq!(parsed.status, PaymentReturnStatus::Cancelled);
        assert_eq!(parsed.session_id.as_deref(), Some("cs_2"));
    }

    #[test]
    fn rejects_queries_without_payment_outcome() {
        assert_eq!(parse_return_query("session_id=cs_1"), None);
        assert_eq!(parse_return_query("payment=maybe"), None);
    }
}
