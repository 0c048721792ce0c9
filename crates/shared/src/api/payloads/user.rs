use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    model::{validate_profile, NewUser, Role, Sex, User},
    types::UserId,
    validation::{ConstraintKind, ValidationError, Validator},
};

/// A user as sent to clients. The identity provider's subject stays on the
/// server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Option<Role>,
    pub sex: Sex,
    pub height: u32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        let User { id, username, email, role, sex, height, created_at, modified_at, .. } = user;
        Self { id, username, email, role, sex, height, created_at, modified_at }
    }
}

/// Profile fields a user sets themselves, used for registration and updates.
/// Everything defaults to empty so missing fields are reported as violations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileRequest {
    pub username: String,
    pub email: String,
    /// Kept as text so an unknown value is reported with the other violations
    pub sex: Option<String>,
    pub height: i64,
}

pub type RegisterUserRequest = ProfileRequest;
pub type UpdateUserRequest = ProfileRequest;

/// Validated profile values
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub username: String,
    pub email: String,
    pub sex: Sex,
    pub height: u32,
}

impl ProfileRequest {
    /// Use `fallback_email` (the identity's email) when none was given
    pub fn with_fallback_email(mut self, fallback_email: Option<&str>) -> Self {
        if self.email.trim().is_empty() {
            if let Some(email) = fallback_email {
                self.email = email.to_owned();
            }
        }
        self
    }

    pub fn into_profile(self) -> Result<Profile, ValidationError> {
        let mut validator = Validator::new();
        validate_profile(
            &mut validator,
            &self.username,
            &self.email,
            self.sex.is_some(),
            self.height,
        );
        let sex = self.sex.as_deref().map(str::parse::<Sex>).transpose();
        if let Err(e) = &sex {
            validator.violation("sex", ConstraintKind::Format, e.to_string());
        }
        let height = u32::try_from(self.height);
        if self.height > 0 && height.is_err() {
            validator.violation("height", ConstraintKind::Format, "is too large");
        }
        validator.finish()?;

        match (sex, height) {
            (Ok(Some(sex)), Ok(height)) => Ok(Profile {
                username: self.username.trim().to_owned(),
                email: self.email.trim().to_owned(),
                sex,
                height,
            }),
            // Both are covered by the validator above
            _ => Err(ValidationError::single("body", ConstraintKind::Format, "is invalid")),
        }
    }
}

impl Profile {
    pub fn into_new_user<F: Into<String>>(self, firebase_id: F) -> NewUser {
        NewUser::new(firebase_id, self.username, self.email, self.sex, self.height)
    }

    pub fn apply_to(self, user: &mut User) {
        user.username = self.username;
        user.email = self.email;
        user.sex = self.sex;
        user.height = self.height;
    }
}

/// `null` demotes to a regular user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRoleRequest {
    #[serde(default)]
    pub role: Option<Role>,
}
