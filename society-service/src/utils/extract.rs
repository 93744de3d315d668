use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header,
    Json,
};
use serde::de::DeserializeOwned;

use crate::services::WorkflowError;

/// Request body sent as JSON or as an url-encoded HTML form.
///
/// An empty body deserializes to `T::default()`, so missing fields are
/// reported by the workflow's own checks. Rejections use the service's error
/// envelope.
pub struct Payload<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned + Default + 'static,
    S: Send + Sync,
{
    type Rejection = WorkflowError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));

        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            WorkflowError::Validation(format!("Invalid request body: {}", e.body_text()))
        })?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Payload(T::default()));
        }

        if is_form {
            serde_urlencoded::from_bytes(&bytes)
                .map(Payload)
                .map_err(|e| WorkflowError::Validation(format!("Invalid form body: {}", e)))
        } else {
            Json::<T>::from_bytes(&bytes)
                .map(|Json(value)| Payload(value))
                .map_err(|e| WorkflowError::Validation(format!("Invalid JSON body: {}", e.body_text())))
        }
    }
}
