//! Constraint lists per field

use super::Constraint::{self, *};

pub const USERNAME: &[Constraint] = &[Required, Length { min: 3, max: 256 }];
pub const EMAIL: &[Constraint] = &[Required, Length { min: 3, max: 256 }, EmailStrict];
pub const HEIGHT: &[Constraint] = &[Positive];
pub const SEX: &[Constraint] = &[Required];
pub const FIREBASE_ID: &[Constraint] = &[Required, MaxLength(128)];
pub const TIMESTAMP: &[Constraint] = &[NotInFuture];

pub const EXERCISE_NAME: &[Constraint] = &[Required, Length { min: 1, max: 256 }];
pub const EXERCISE_DESCRIPTION: &[Constraint] = &[MaxLength(1024)];
pub const MUSCLE_GROUPS: &[Constraint] = &[NotEmpty];
pub const LOGGING_TYPES: &[Constraint] = &[NotEmpty];

pub const SETS: &[Constraint] = &[NotEmpty];
pub const SET_METRIC: &[Constraint] = &[Positive];
