use axum::{
    async_trait,
    extract::{
        path::ErrorKind,
        rejection::{PathRejection, QueryRejection},
        FromRequestParts, Path, Query, RawPathParams,
    },
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use shared::api::error::ServerError;

use crate::json::rejection_to_error;

/// `Path` whose rejections are reported as a validation error on the
/// offending parameter
#[derive(Debug, Clone)]
pub struct PathParam<T>(pub T);

/// `Query` whose rejections are reported as a validation error on `query`
#[derive(Debug, Clone)]
pub struct QueryParams<T>(pub T);

/// Name the parameter a path rejection is about. A single parameter route
/// falls back to its only key when the error doesn't say.
fn path_field(rejection: &PathRejection, keys: &[String]) -> String {
    if let PathRejection::FailedToDeserializePathParams(e) = rejection {
        match e.kind() {
            ErrorKind::ParseErrorAtKey { key, .. }
            | ErrorKind::InvalidUtf8InPathParam { key } => return key.clone(),
            _ => {},
        }
    }
    match keys {
        [key] => key.clone(),
        _ => "path".to_owned(),
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => {
                let keys: Vec<String> = RawPathParams::from_request_parts(parts, state)
                    .await
                    .map(|params| params.iter().map(|(key, _)| key.to_owned()).collect())
                    .unwrap_or_default();
                let field = path_field(&rejection, &keys);
                Err(rejection_to_error("PathParam", &field, rejection.status(), rejection.body_text()))
            },
        }
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(query_rejection_to_error(rejection)),
        }
    }
}

fn query_rejection_to_error(rejection: QueryRejection) -> ServerError {
    rejection_to_error("QueryParams", "query", rejection.status(), rejection.body_text())
}
