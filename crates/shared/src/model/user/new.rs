use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "backend")]
use exemplar::Model;

use super::validate_profile;
use crate::{
    model::{Role, Sex},
    validation::{rules, ValidateModel, ValidationError, Validator},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "backend", derive(Model))]
#[cfg_attr(feature = "backend", table("user"))]
pub struct NewUser {
    pub firebase_id: String,
    pub username: String,
    pub email: String,
    pub role: Option<Role>,
    pub sex: Sex,
    pub height: u32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl NewUser {
    /// A regular user registered now
    pub fn new<F: Into<String>, U: Into<String>, E: Into<String>>(
        firebase_id: F,
        username: U,
        email: E,
        sex: Sex,
        height: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            firebase_id: firebase_id.into(),
            username: username.into(),
            email: email.into(),
            role: None,
            sex,
            height,
            created_at: now,
            modified_at: now,
        }
    }
}

impl ValidateModel for NewUser {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut validator = Validator::new();
        validate_profile(
            &mut validator,
            &self.username,
            &self.email,
            true,
            self.height.into(),
        );
        validator
            .field("firebaseId", &self.firebase_id, rules::FIREBASE_ID)
            .field("createdAt", self.created_at, rules::TIMESTAMP);
        validator.finish()
    }
}
