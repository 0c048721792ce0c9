//! Verification of the bearer tokens issued by the external identity
//! provider. Handlers only ever see a [`DecodedIdentity`].

use std::fmt;

use serde::{Deserialize, Serialize};
use shared::api::error::ServerError;
use thiserror::Error;

mod firebase;
pub use firebase::*;

/// The claims this server cares about from a verified token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedIdentity {
    /// Stable id of the identity, stored as `user.firebase_id`
    pub subject: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub email_verified: bool,
    pub issuer: String,
    pub picture: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidCredential {
    #[error("Malformed token: {0}")]
    Malformed(String),
    #[error("Unknown signing key {0:?}")]
    UnknownKey(Option<String>),
    #[error("Token rejected: {0}")]
    Rejected(String),
}

// Clients get the same message whatever went wrong
impl From<InvalidCredential> for ServerError {
    fn from(_: InvalidCredential) -> Self {
        ServerError::unauthenticated()
    }
}

/// Turns a raw bearer token into a verified identity
pub trait IdentityVerifier: fmt::Debug + Send + Sync {
    fn verify(&self, token: &str) -> Result<DecodedIdentity, InvalidCredential>;
}
