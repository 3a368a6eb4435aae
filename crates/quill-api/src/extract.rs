use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use quill_types::api::Envelope;
use quill_types::validation::Validate;

use crate::error::ApiError;

/// JSON body that has passed its field-bound checks. Malformed bodies and
/// failed checks both surface as `ApiError::Validation`.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| ApiError::Validation(e.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Path ids that do not parse cannot name anything that exists.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("{what} not found")))
}

/// Wraps `data` in the success envelope.
pub fn reply<T: Serialize>(status: StatusCode, message: &str, data: T) -> impl IntoResponse + use<T> {
    (status, Json(Envelope::new(status.as_u16(), message, data)))
}
