use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "backend")]
use {
    crate::{
        api::error::{ServerError, ServerErrorContext},
        not_found_error,
    },
    exemplar::Model,
    rusqlite::{Connection, OptionalExtension},
    sea_query::{enum_def, Expr, Order, Query, SelectStatement, SqliteQueryBuilder},
    sea_query_rusqlite::RusqliteBinder,
};
use crate::{
    json_column,
    model::{LoggingType, LoggingTypes, Metric},
    types::{ExerciseId, ExerciseLogId, UserId},
    validation::{rules, ConstraintKind, FieldValue, ValidationError, Validator},
};

/// One set as performed. Which metrics are present depends on how the
/// exercise is logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Set {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_g: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<u32>,
}

impl Set {
    pub const fn metric(&self, metric: Metric) -> Option<u32> {
        match metric {
            Metric::WeightG => self.weight_g,
            Metric::Reps => self.reps,
            Metric::Seconds => self.seconds,
            Metric::DistanceM => self.distance_m,
        }
    }

    fn records(&self, logging_type: LoggingType) -> bool {
        logging_type.metrics().iter().all(|m| self.metric(*m).is_some())
    }

    /// A set must carry every metric of at least one of the exercise's
    /// logging types. Metrics it carries must be positive.
    pub fn validate_for(&self, logging_types: &LoggingTypes) -> Result<(), ValidationError> {
        let mut validator = Validator::new();

        if !logging_types.iter().any(|t| self.records(*t)) {
            let expected = logging_types
                .iter()
                .map(|t| {
                    t.metrics()
                        .iter()
                        .map(Metric::field)
                        .collect::<Vec<_>>()
                        .join(" and ")
                })
                .collect::<Vec<_>>()
                .join(", or ");
            validator.violation(
                "metrics",
                ConstraintKind::Required,
                format!("must record {expected}"),
            );
        }

        for metric in [Metric::WeightG, Metric::Reps, Metric::Seconds, Metric::DistanceM] {
            if let Some(value) = self.metric(metric) {
                validator.field(metric.field(), value, rules::SET_METRIC);
            }
        }

        validator.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sets(pub Vec<Set>);

impl Deref for Sets {
    type Target = Vec<Set>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Sets {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<Set>> for Sets {
    fn from(sets: Vec<Set>) -> Self {
        Self(sets)
    }
}

impl<'a> From<&'a Sets> for FieldValue<'a> {
    fn from(value: &'a Sets) -> Self {
        FieldValue::Count(value.len())
    }
}

json_column!(Sets);

/// Check a batch of sets and when they were performed against an exercise
pub fn validate_log(
    performed_at: DateTime<Utc>,
    sets: &Sets,
    logging_types: &LoggingTypes,
) -> Result<(), ValidationError> {
    let mut validator = Validator::new();
    validator
        .field("performedAt", performed_at, rules::TIMESTAMP)
        .field("sets", sets, rules::SETS);
    for (i, set) in sets.iter().enumerate() {
        validator.nested(&format!("sets[{i}]"), set.validate_for(logging_types));
    }
    validator.finish()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "backend", derive(Model))]
#[cfg_attr(feature = "backend", table("exercise_log"))]
#[cfg_attr(feature = "backend", enum_def)]
pub struct ExerciseLog {
    pub id: ExerciseLogId,
    pub user_id: UserId,
    pub exercise_id: ExerciseId,
    pub performed_at: DateTime<Utc>,
    pub sets: Sets,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "backend", derive(Model))]
#[cfg_attr(feature = "backend", table("exercise_log"))]
pub struct NewExerciseLog {
    pub user_id: UserId,
    pub exercise_id: ExerciseId,
    pub performed_at: DateTime<Utc>,
    pub sets: Sets,
    pub created_at: DateTime<Utc>,
}

impl NewExerciseLog {
    pub fn new(
        user_id: UserId,
        exercise_id: ExerciseId,
        performed_at: DateTime<Utc>,
        sets: Sets,
    ) -> Self {
        Self { user_id, exercise_id, performed_at, sets, created_at: Utc::now() }
    }
}

#[cfg(feature = "backend")]
impl ExerciseLog {
    fn select() -> SelectStatement {
        Query::select()
            .columns([
                ExerciseLogIden::Id,
                ExerciseLogIden::UserId,
                ExerciseLogIden::ExerciseId,
                ExerciseLogIden::PerformedAt,
                ExerciseLogIden::Sets,
                ExerciseLogIden::CreatedAt,
            ])
            .from(ExerciseLogIden::Table)
            .to_owned()
    }

    pub fn fetch_by_id(conn: &Connection, id: ExerciseLogId) -> Result<ExerciseLog, ServerError> {
        let (sql, values) = Self::select()
            .and_where(Expr::col(ExerciseLogIden::Id).eq(id))
            .limit(1)
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        stmt.query_row(&*values.as_params(), ExerciseLog::from_row)
            .optional()
            .context("ExerciseLog::fetch_by_id")?
            .ok_or_else(|| not_found_error!("exercise log"))
    }

    /// One user's logs for one exercise, oldest first
    pub fn fetch_for(
        conn: &Connection,
        user_id: UserId,
        exercise_id: ExerciseId,
    ) -> Result<Vec<ExerciseLog>, ServerError> {
        let (sql, values) = Self::select()
            .and_where(Expr::col(ExerciseLogIden::UserId).eq(user_id))
            .and_where(Expr::col(ExerciseLogIden::ExerciseId).eq(exercise_id))
            .order_by(ExerciseLogIden::PerformedAt, Order::Asc)
            .order_by(ExerciseLogIden::Id, Order::Asc)
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let logs = stmt
            .query_map(&*values.as_params(), ExerciseLog::from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("ExerciseLog::fetch_for")?;
        Ok(logs)
    }

    pub fn create(
        conn: &mut Connection,
        new_log: NewExerciseLog,
        logging_types: &LoggingTypes,
    ) -> Result<ExerciseLog, ServerError> {
        validate_log(new_log.performed_at, &new_log.sets, logging_types)?;

        let tx = conn.transaction()?;
        let log = {
            new_log.insert(&tx).context("ExerciseLog::create")?;
            ExerciseLog::fetch_by_id(&tx, ExerciseLogId(tx.last_insert_rowid()))?
        };
        tx.commit()?;

        Ok(log)
    }
}
