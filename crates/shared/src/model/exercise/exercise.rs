use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "backend")]
use {
    crate::{
        api::error::{ServerError, ServerErrorContext},
        not_found_error,
    },
    exemplar::Model,
    rusqlite::{Connection, OptionalExtension, Row},
    sea_query::{Expr, Iden, Order, Query, SelectStatement, SqliteQueryBuilder},
    sea_query_rusqlite::RusqliteBinder,
    tracing::debug,
};
use crate::{
    access::Principal,
    model::{LoggingTypes, MuscleGroups},
    types::{ExerciseId, UserId},
    validation::{rules, ValidateModel, ValidationError, Validator},
};

/// The fields every exercise has, whoever owns it. Also the request body for
/// creating and updating exercises; missing fields default to empty so they
/// show up as violations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExerciseDefinition {
    pub name: String,
    pub description: Option<String>,
    pub muscle_groups: MuscleGroups,
    pub logging_types: LoggingTypes,
}

impl ValidateModel for ExerciseDefinition {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut validator = Validator::new();
        validator
            .field("name", &self.name, rules::EXERCISE_NAME)
            .field("description", &self.description, rules::EXERCISE_DESCRIPTION)
            .field("muscleGroups", &self.muscle_groups, rules::MUSCLE_GROUPS)
            .field("loggingTypes", &self.logging_types, rules::LOGGING_TYPES);
        validator.finish()
    }
}

/// Where an exercise comes from. Catalog exercises are shared by everyone,
/// user authored ones belong to their creator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ExerciseOrigin {
    Catalog,
    UserAuthored {
        #[serde(rename = "createdBy")]
        created_by: UserId,
    },
}

impl ExerciseOrigin {
    pub const fn owner(&self) -> Option<UserId> {
        match self {
            ExerciseOrigin::Catalog => None,
            ExerciseOrigin::UserAuthored { created_by } => Some(*created_by),
        }
    }
}

impl From<Option<UserId>> for ExerciseOrigin {
    fn from(created_by: Option<UserId>) -> Self {
        match created_by {
            Some(created_by) => ExerciseOrigin::UserAuthored { created_by },
            None => ExerciseOrigin::Catalog,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: ExerciseId,
    #[serde(flatten)]
    pub definition: ExerciseDefinition,
    #[serde(flatten)]
    pub origin: ExerciseOrigin,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Exercise {
    pub fn is_catalog(&self) -> bool {
        self.origin == ExerciseOrigin::Catalog
    }

    /// Catalog exercises are visible to everyone, user authored ones to their
    /// owner and admins
    pub fn can_view(&self, user_id: Option<UserId>, principal: &Principal) -> bool {
        match self.origin {
            ExerciseOrigin::Catalog => true,
            ExerciseOrigin::UserAuthored { created_by } => {
                principal.is_admin() || user_id == Some(created_by)
            },
        }
    }

    /// Catalog exercises are edited by admins, user authored ones only by
    /// their owner
    pub fn can_edit(&self, user_id: Option<UserId>, principal: &Principal) -> bool {
        match self.origin {
            ExerciseOrigin::Catalog => principal.is_admin(),
            ExerciseOrigin::UserAuthored { created_by } => user_id == Some(created_by),
        }
    }
}

impl ValidateModel for Exercise {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut validator = Validator::new();
        validator
            .nested("", self.definition.validate())
            .field("createdAt", self.created_at, rules::TIMESTAMP)
            .field("modifiedAt", self.modified_at, rules::TIMESTAMP);
        if self.modified_at < self.created_at {
            validator.violation(
                "modifiedAt",
                crate::validation::ConstraintKind::Ordering,
                "must not be earlier than createdAt",
            );
        }
        validator.finish()
    }
}

#[cfg(feature = "backend")]
#[derive(Iden, Clone, Copy)]
#[iden = "exercise"]
pub enum ExerciseIden {
    Table,
    Id,
    Name,
    Description,
    MuscleGroups,
    LoggingTypes,
    CreatedAt,
    ModifiedAt,
}

#[cfg(feature = "backend")]
#[derive(Iden, Clone, Copy)]
#[iden = "user_exercise"]
pub enum UserExerciseIden {
    Table,
    Id,
    CreatedBy,
}

/// The base row, without the id the sequence hands out
#[cfg(feature = "backend")]
#[derive(Debug, Model)]
#[table("exercise")]
struct NewExerciseRow {
    name: String,
    description: Option<String>,
    muscle_groups: MuscleGroups,
    logging_types: LoggingTypes,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

/// The ownership row joined onto user authored exercises
#[cfg(feature = "backend")]
#[derive(Debug, Model)]
#[table("user_exercise")]
struct UserExerciseRow {
    id: ExerciseId,
    created_by: UserId,
}

#[cfg(feature = "backend")]
impl Exercise {
    fn select() -> SelectStatement {
        Query::select()
            .columns([
                (ExerciseIden::Table, ExerciseIden::Id),
                (ExerciseIden::Table, ExerciseIden::Name),
                (ExerciseIden::Table, ExerciseIden::Description),
                (ExerciseIden::Table, ExerciseIden::MuscleGroups),
                (ExerciseIden::Table, ExerciseIden::LoggingTypes),
                (ExerciseIden::Table, ExerciseIden::CreatedAt),
                (ExerciseIden::Table, ExerciseIden::ModifiedAt),
            ])
            .column((UserExerciseIden::Table, UserExerciseIden::CreatedBy))
            .from(ExerciseIden::Table)
            .left_join(
                UserExerciseIden::Table,
                Expr::col((UserExerciseIden::Table, UserExerciseIden::Id))
                    .equals((ExerciseIden::Table, ExerciseIden::Id)),
            )
            .to_owned()
    }

    /// Maps a row of [`Exercise::select`]
    fn from_joined_row(row: &Row) -> rusqlite::Result<Exercise> {
        let created_by: Option<UserId> = row.get(7)?;
        Ok(Exercise {
            id: row.get(0)?,
            definition: ExerciseDefinition {
                name: row.get(1)?,
                description: row.get(2)?,
                muscle_groups: row.get(3)?,
                logging_types: row.get(4)?,
            },
            origin: created_by.into(),
            created_at: row.get(5)?,
            modified_at: row.get(6)?,
        })
    }

    pub fn fetch_by_id(conn: &Connection, id: ExerciseId) -> Result<Exercise, ServerError> {
        let (sql, values) = Self::select()
            .and_where(Expr::col((ExerciseIden::Table, ExerciseIden::Id)).eq(id))
            .limit(1)
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        stmt.query_row(&*values.as_params(), Self::from_joined_row)
            .optional()
            .context("Exercise::fetch_by_id")?
            .ok_or_else(|| not_found_error!("exercise"))
    }

    /// The catalog plus, for non admins, the caller's own exercises. Admins
    /// see everything.
    pub fn fetch_visible(
        conn: &Connection,
        user_id: Option<UserId>,
        principal: &Principal,
    ) -> Result<Vec<Exercise>, ServerError> {
        let mut query = Self::select();
        if !principal.is_admin() {
            let created_by = Expr::col((UserExerciseIden::Table, UserExerciseIden::CreatedBy));
            query.and_where(match user_id {
                Some(user_id) => created_by.clone().is_null().or(created_by.eq(user_id)),
                None => created_by.is_null(),
            });
        }
        let (sql, values) = query
            .order_by((ExerciseIden::Table, ExerciseIden::Id), Order::Asc)
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let exercises = stmt
            .query_map(&*values.as_params(), Self::from_joined_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Exercise::fetch_visible")?;
        Ok(exercises)
    }

    pub fn count_catalog(conn: &Connection) -> Result<usize, ServerError> {
        let (sql, values) = Query::select()
            .expr(Expr::col((ExerciseIden::Table, ExerciseIden::Id)).count())
            .from(ExerciseIden::Table)
            .left_join(
                UserExerciseIden::Table,
                Expr::col((UserExerciseIden::Table, UserExerciseIden::Id))
                    .equals((ExerciseIden::Table, ExerciseIden::Id)),
            )
            .and_where(Expr::col((UserExerciseIden::Table, UserExerciseIden::CreatedBy)).is_null())
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let count: usize = stmt
            .query_row(&*values.as_params(), |row| row.get(0))
            .context("Exercise::count_catalog")?;
        Ok(count)
    }

    /// Insert the base row and, for user authored exercises, the ownership
    /// row in one transaction
    pub fn create(
        conn: &mut Connection,
        definition: ExerciseDefinition,
        origin: ExerciseOrigin,
    ) -> Result<Exercise, ServerError> {
        definition.validate()?;

        let now = Utc::now();
        let ExerciseDefinition { name, description, muscle_groups, logging_types } = definition;
        let row = NewExerciseRow {
            name,
            description,
            muscle_groups,
            logging_types,
            created_at: now,
            modified_at: now,
        };

        let tx = conn.transaction()?;
        let exercise = {
            row.insert(&tx).context("Exercise::create(exercise)")?;
            let id = ExerciseId(tx.last_insert_rowid());

            if let ExerciseOrigin::UserAuthored { created_by } = origin {
                UserExerciseRow { id, created_by }
                    .insert(&tx)
                    .context("Exercise::create(user_exercise)")?;
            }

            Exercise::fetch_by_id(&tx, id)?
        };
        tx.commit()?;

        debug!(id = %exercise.id, origin = ?exercise.origin, "Created exercise");
        Ok(exercise)
    }

    /// Replace the definition. The origin never changes.
    pub fn update(
        &mut self,
        conn: &Connection,
        definition: ExerciseDefinition,
    ) -> Result<(), ServerError> {
        definition.validate()?;
        self.definition = definition;
        self.modified_at = Utc::now().max(self.created_at);

        let (sql, values) = Query::update()
            .table(ExerciseIden::Table)
            .values([
                (ExerciseIden::Name, self.definition.name.clone().into()),
                (ExerciseIden::Description, self.definition.description.clone().into()),
                (ExerciseIden::MuscleGroups, (&self.definition.muscle_groups).into()),
                (ExerciseIden::LoggingTypes, (&self.definition.logging_types).into()),
                (ExerciseIden::ModifiedAt, self.modified_at.into()),
            ])
            .and_where(Expr::col(ExerciseIden::Id).eq(self.id))
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        match stmt.execute(&*values.as_params()).context("Exercise::update")? {
            0 => Err(not_found_error!("exercise")),
            _ => Ok(()),
        }
    }

    /// Deleting the base row cascades to the ownership row and the logs
    pub fn delete(conn: &Connection, id: ExerciseId) -> Result<(), ServerError> {
        let (sql, values) = Query::delete()
            .from_table(ExerciseIden::Table)
            .and_where(Expr::col(ExerciseIden::Id).eq(id))
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        match stmt.execute(&*values.as_params()).context("Exercise::delete")? {
            0 => Err(not_found_error!("exercise")),
            _ => Ok(()),
        }
    }
}
