use std::{collections::HashMap, fmt, fs, path::Path};

use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use super::{DecodedIdentity, IdentityVerifier, InvalidCredential};

const FIREBASE_ISSUER_PREFIX: &str = "https://securetoken.google.com/";

#[derive(Debug, Error)]
pub enum KeyLoadError {
    #[error("Reading {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("Parsing key file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Key {kid} is not an RSA public key: {source}")]
    Pem { kid: String, source: jsonwebtoken::errors::Error },
    #[error("No keys configured")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    iss: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
    picture: Option<String>,
}

/// Verifies Firebase ID tokens (RS256) against a fixed set of public keys
pub struct FirebaseVerifier {
    project_id: String,
    keys: HashMap<String, DecodingKey>,
}

impl fmt::Debug for FirebaseVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirebaseVerifier")
            .field("project_id", &self.project_id)
            .field("key_ids", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FirebaseVerifier {
    /// `keys` maps key id to PEM encoded RSA public key
    pub fn new<P: Into<String>>(
        project_id: P,
        keys: HashMap<String, String>,
    ) -> Result<Self, KeyLoadError> {
        if keys.is_empty() {
            return Err(KeyLoadError::Empty);
        }
        let keys = keys
            .into_iter()
            .map(|(kid, pem)| match DecodingKey::from_rsa_pem(pem.as_bytes()) {
                Ok(key) => Ok((kid, key)),
                Err(source) => Err(KeyLoadError::Pem { kid, source }),
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(Self { project_id: project_id.into(), keys })
    }

    /// Load keys from a JSON object of key id to PEM, the shape Google
    /// publishes them in once converted from certificates
    #[instrument(skip(project_id))]
    pub fn from_key_file<P: Into<String>>(
        project_id: P,
        path: &Path,
    ) -> Result<Self, KeyLoadError> {
        let contents = fs::read_to_string(path).map_err(|source| KeyLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let keys: HashMap<String, String> = serde_json::from_str(&contents)?;
        let verifier = Self::new(project_id, keys)?;
        info!(keys = verifier.keys.len(), "Loaded identity verification keys");
        Ok(verifier)
    }

    pub fn issuer(&self) -> String {
        format!("{FIREBASE_ISSUER_PREFIX}{}", self.project_id)
    }
}

impl IdentityVerifier for FirebaseVerifier {
    fn verify(&self, token: &str) -> Result<DecodedIdentity, InvalidCredential> {
        let header = decode_header(token).map_err(|e| {
            debug!(error = %e, "Failed to decode token header");
            InvalidCredential::Malformed(e.to_string())
        })?;

        let key = header
            .kid
            .as_ref()
            .and_then(|kid| self.keys.get(kid))
            .ok_or_else(|| InvalidCredential::UnknownKey(header.kid.clone()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[self.issuer()]);
        validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);

        let claims = decode::<FirebaseClaims>(token, key, &validation)
            .map_err(|e| {
                debug!(error = %e, "Token validation failed");
                match e.kind() {
                    ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) => {
                        InvalidCredential::Malformed(e.to_string())
                    },
                    _ => InvalidCredential::Rejected(e.to_string()),
                }
            })?
            .claims;

        if claims.sub.is_empty() {
            return Err(InvalidCredential::Rejected("empty subject".to_owned()));
        }

        Ok(DecodedIdentity {
            subject: claims.sub,
            name: claims.name,
            email: claims.email,
            email_verified: claims.email_verified,
            issuer: claims.iss,
            picture: claims.picture,
        })
    }
}
