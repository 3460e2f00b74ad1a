use crate::{ApiError, ApiResult};
use reqwest::{multipart, Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// Fallback message when the backend error body carries no `detail` field.
const GENERIC_ERROR: &str = "Something went wrong";

/// Counter of requests currently in flight, shared between the client and its
/// request guards. The guard releases on drop, so the counter reaches zero on
/// every exit path.
#[derive(Clone, Default)]
pub(crate) struct BusyFlag(Arc<AtomicUsize>);

impl BusyFlag {
    pub(crate) fn acquire(&self) -> BusyGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        BusyGuard(Arc::clone(&self.0))
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub(crate) struct BusyGuard(Arc<AtomicUsize>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Extract the human-readable message from a backend error body.
pub(crate) fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("detail")
                .and_then(|detail| detail.as_str().map(ToOwned::to_owned))
        })
        .unwrap_or_else(|| GENERIC_ERROR.to_string())
}

/// Create a JSON request, parse the response.
/// Returns an error on non-success status codes.
pub(crate) async fn send_json<T: Serialize, R: DeserializeOwned>(
    client: &Client,
    method: Method,
    url: &str,
    body: Option<&T>,
    headers: reqwest::header::HeaderMap,
) -> ApiResult<R> {
    tracing::debug!(%method, url, "api request");
    let mut request = client.request(method, url).headers(headers);
    if let Some(body) = body {
        request = request.json(body);
    }
    let response = request.send().await?;
    read_json(response).await
}

/// Create a multipart/form-data request, parse the response.
/// Used for operations that carry file attachments; the auth token travels as
/// a form field alongside the typed fields, never as a header.
pub(crate) async fn send_form<R: DeserializeOwned>(
    client: &Client,
    method: Method,
    url: &str,
    form: multipart::Form,
) -> ApiResult<R> {
    tracing::debug!(%method, url, "api multipart request");
    let response = client.request(method, url).multipart(form).send().await?;
    read_json(response).await
}

async fn read_json<R: DeserializeOwned>(response: reqwest::Response) -> ApiResult<R> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = error_detail(&body);
        tracing::warn!(%status, message, "api request failed");
        return Err(ApiError::Status(status, message));
    }
    match response.json::<R>().await {
        Ok(parsed) => Ok(parsed),
        Err(e) if e.is_decode() => Err(ApiError::Invariant(format!(
            "malformed response body: {e}"
        ))),
        Err(e) => Err(ApiError::Transport(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_detail_extracts_backend_message() {
        assert_eq!(
            error_detail(r#"{"detail": "Course not found"}"#),
            "Course not found"
        );
    }

    #[test]
    fn error_detail_falls_back_on_missing_field() {
        assert_eq!(error_detail(r#"{"error": "nope"}"#), GENERIC_ERROR);
    }

    #[test]
    fn error_detail_falls_back_on_non_json_body() {
        assert_eq!(error_detail("<html>502 Bad Gateway</html>"), GENERIC_ERROR);
        assert_eq!(error_detail(""), GENERIC_ERROR);
    }

    #[test]
    fn busy_flag_clears_on_guard_drop() {
        let busy = BusyFlag::default();
        assert_eq!(busy.in_flight(), 0);
        {
            let _a = busy.acquire();
            let _b = busy.acquire();
            assert_eq!(busy.in_flight(), 2);
        }
        assert_eq!(busy.in_flight(), 0);
    }
}
