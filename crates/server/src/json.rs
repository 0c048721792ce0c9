use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use shared::{
    api::error::{ConstraintKind, ServerError, ValidationError},
    internal_error,
};

/// `Json` whose rejections are reported as a validation error on `body`
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

/// Map an extractor rejection onto a [`ServerError`]. Client mistakes become a
/// format violation on `field` unless the rejection carries a more specific
/// status.
pub(crate) fn rejection_to_error(
    extractor: &str,
    field: &str,
    status: StatusCode,
    body_text: String,
) -> ServerError {
    match status {
        StatusCode::PAYLOAD_TOO_LARGE => ServerError::PayloadTooLarge { message: body_text },
        StatusCode::UNSUPPORTED_MEDIA_TYPE => ServerError::UnsupportedMediaType { message: body_text },
        s if s.is_server_error() => internal_error!("{extractor}: {body_text}"),
        _ => ValidationError::single(field, ConstraintKind::Format, body_text).into(),
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection_to_error(rejection)),
        }
    }
}

fn json_rejection_to_error(rejection: JsonRejection) -> ServerError {
    rejection_to_error("JsonBody", "body", rejection.status(), rejection.body_text())
}
