//! Validating JSON extractor
//!
//! Wraps Axum's `Json` extractor so that every body problem (wrong content
//! type, malformed JSON, failed field validation) becomes
//! [`AppError::InvalidInput`] and therefore a `400` with a describable
//! message, instead of Axum's default `415`/`422` plain-text rejections.

use crate::error::AppError;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde_json::Value;

/// JSON body validated by `T::try_from(Value)`
///
/// Validation runs on the raw JSON value so the error can name exactly which
/// field is missing or has the wrong type.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: TryFrom<Value, Error = AppError>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(rejection_to_invalid_input)?;

        T::try_from(value).map(ValidatedJson)
    }
}

fn rejection_to_invalid_input(rejection: JsonRejection) -> AppError {
    let message = match &rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "Content-Type must be application/json".to_string()
        }
        JsonRejection::JsonSyntaxError(_) => "request body is not valid JSON".to_string(),
        JsonRejection::JsonDataError(_) => "request body has an unexpected shape".to_string(),
        _ => "request body could not be read".to_string(),
    };

    tracing::debug!(
        rejection = %rejection.body_text(),
        "Rejected request body"
    );

    AppError::InvalidInput(message)
}
