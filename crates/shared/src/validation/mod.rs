//! Declarative field rules and the interpreter that evaluates them.
//!
//! Models list the [`Constraint`]s that apply to each field (see [`rules`])
//! and hand them to a [`Validator`], which collects every violation instead of
//! stopping at the first one.

use std::{
    collections::BTreeSet,
    sync::LazyLock,
};

use chrono::{DateTime, Utc};
use regex::Regex;

pub use crate::api::error::{ConstraintKind, FieldViolation, ValidationError};

pub mod rules;

static EMAIL_STRICT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@]+@[^@]+$").expect("email pattern is valid"));

/// Non-empty local part, exactly one `@`, non-empty domain
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_STRICT.is_match(email)
}

pub trait ValidateModel {
    fn validate(&self) -> Result<(), ValidationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Text must be non-blank, options must be set
    Required,
    /// Character count after trimming
    Length { min: usize, max: usize },
    /// Character count after trimming, for optional text
    MaxLength(usize),
    Positive,
    EmailStrict,
    /// Equal to now is fine
    NotInFuture,
    /// Collections must contain at least one element
    NotEmpty,
}

impl Constraint {
    pub const fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::Required => ConstraintKind::Required,
            Constraint::Length { .. } => ConstraintKind::Length,
            Constraint::MaxLength(_) => ConstraintKind::MaxLength,
            Constraint::Positive => ConstraintKind::Positive,
            Constraint::EmailStrict => ConstraintKind::EmailStrict,
            Constraint::NotInFuture => ConstraintKind::NotInFuture,
            Constraint::NotEmpty => ConstraintKind::NotEmpty,
        }
    }

    /// Returns the violation message, if any. Constraints that don't apply to
    /// the kind of value given are ignored.
    fn check(&self, value: &FieldValue<'_>, now: DateTime<Utc>) -> Option<String> {
        use FieldValue::*;

        match (self, value) {
            (Constraint::Required, Text(v)) if v.trim().is_empty() => {
                Some("must not be blank".to_owned())
            },
            (Constraint::Required, OptionalText(None) | Present(false)) => {
                Some("is required".to_owned())
            },
            (Constraint::Length { min, max }, Text(v) | OptionalText(Some(v))) => {
                let len = v.trim().chars().count();
                (len < *min || len > *max)
                    .then(|| format!("length must be between {min} and {max}, got {len}"))
            },
            (Constraint::MaxLength(max), Text(v) | OptionalText(Some(v))) => {
                let len = v.trim().chars().count();
                (len > *max).then(|| format!("length must be at most {max}, got {len}"))
            },
            (Constraint::Positive, Integer(v)) if *v <= 0 => {
                Some(format!("must be a positive number, got {v}"))
            },
            (Constraint::EmailStrict, Text(v) | OptionalText(Some(v))) if !is_valid_email(v) => {
                Some("must be of the form name@domain with exactly one @".to_owned())
            },
            (Constraint::NotInFuture, Timestamp(v)) if *v > now => {
                Some(format!("must not be in the future, got {v}"))
            },
            (Constraint::NotEmpty, Count(0)) => Some("must contain at least one element".to_owned()),
            _ => None,
        }
    }
}

/// The shape of a field value as far as the constraints care
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    OptionalText(Option<&'a str>),
    Integer(i64),
    Timestamp(DateTime<Utc>),
    Count(usize),
    Present(bool),
}

impl<'a> From<&'a str> for FieldValue<'a> {
    fn from(value: &'a str) -> Self {
        FieldValue::Text(value)
    }
}

impl<'a> From<&'a String> for FieldValue<'a> {
    fn from(value: &'a String) -> Self {
        FieldValue::Text(value)
    }
}

impl<'a> From<&'a Option<String>> for FieldValue<'a> {
    fn from(value: &'a Option<String>) -> Self {
        FieldValue::OptionalText(value.as_deref())
    }
}

impl From<i64> for FieldValue<'_> {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<u32> for FieldValue<'_> {
    fn from(value: u32) -> Self {
        FieldValue::Integer(value.into())
    }
}

impl From<DateTime<Utc>> for FieldValue<'_> {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl<T> From<&BTreeSet<T>> for FieldValue<'_> {
    fn from(value: &BTreeSet<T>) -> Self {
        FieldValue::Count(value.len())
    }
}

impl<T> From<&Vec<T>> for FieldValue<'_> {
    fn from(value: &Vec<T>) -> Self {
        FieldValue::Count(value.len())
    }
}

#[derive(Debug)]
pub struct Validator {
    now: DateTime<Utc>,
    violations: Vec<FieldViolation>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Validate against a fixed "now", for timestamps
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now, violations: Vec::new() }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Check `value` against each constraint. A failed `Required` skips the
    /// remaining constraints for the field so blank input reports once.
    pub fn field<'a, V: Into<FieldValue<'a>>>(
        &mut self,
        field: &str,
        value: V,
        constraints: &[Constraint],
    ) -> &mut Self {
        let value = value.into();
        for constraint in constraints {
            if let Some(message) = constraint.check(&value, self.now) {
                self.violation(field, constraint.kind(), message);
                if *constraint == Constraint::Required {
                    break;
                }
            }
        }
        self
    }

    /// Record a violation that isn't expressed as a [`Constraint`]
    pub fn violation<M: Into<String>>(
        &mut self,
        field: &str,
        constraint: ConstraintKind,
        message: M,
    ) -> &mut Self {
        self.violations.push(FieldViolation {
            field: field.to_owned(),
            constraint,
            message: message.into(),
        });
        self
    }

    /// Merge the result of validating a nested value, prefixing its fields.
    /// An empty prefix merges the fields as they are.
    pub fn nested(&mut self, prefix: &str, result: Result<(), ValidationError>) -> &mut Self {
        if let Err(inner) = result {
            self.violations.extend(inner.violations.into_iter().map(|mut v| {
                if !prefix.is_empty() {
                    v.field = format!("{prefix}.{}", v.field);
                }
                v
            }));
        }
        self
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { violations: self.violations })
        }
    }
}
