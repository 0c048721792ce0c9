use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "backend")]
use {
    crate::{
        api::error::{ServerError, ServerErrorContext},
        model::NewUser,
        not_found_error,
    },
    exemplar::Model,
    rusqlite::{Connection, OptionalExtension},
    sea_query::{enum_def, Expr, Order, Query, SqliteQueryBuilder},
    sea_query_rusqlite::RusqliteBinder,
};
use crate::{
    access::Principal,
    model::{Role, Sex},
    types::UserId,
    validation::{rules, ConstraintKind, FieldValue, ValidateModel, ValidationError, Validator},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "backend", derive(Model))]
#[cfg_attr(feature = "backend", table("user"))]
#[cfg_attr(feature = "backend", enum_def)]
pub struct User {
    pub id: UserId,
    /// Subject of the identity provider's token
    pub firebase_id: String,
    pub username: String,
    pub email: String,
    pub role: Option<Role>,
    pub sex: Sex,
    /// Centimetres
    pub height: u32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal::User { role: self.role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }
}

/// The checks shared by every shape a user takes on its way into the database
pub(crate) fn validate_profile(
    validator: &mut Validator,
    username: &str,
    email: &str,
    sex_present: bool,
    height: i64,
) {
    validator
        .field("username", username, rules::USERNAME)
        .field("email", email, rules::EMAIL)
        .field("sex", FieldValue::Present(sex_present), rules::SEX)
        .field("height", height, rules::HEIGHT);
}

impl ValidateModel for User {
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
            .field("createdAt", self.created_at, rules::TIMESTAMP)
            .field("modifiedAt", self.modified_at, rules::TIMESTAMP);
        if self.modified_at < self.created_at {
            validator.violation(
                "modifiedAt",
                ConstraintKind::Ordering,
                "must not be earlier than createdAt",
            );
        }
        validator.finish()
    }
}

#[cfg(feature = "backend")]
impl User {
    fn select() -> sea_query::SelectStatement {
        Query::select()
            .columns([
                UserIden::Id,
                UserIden::FirebaseId,
                UserIden::Username,
                UserIden::Email,
                UserIden::Role,
                UserIden::Sex,
                UserIden::Height,
                UserIden::CreatedAt,
                UserIden::ModifiedAt,
            ])
            .from(UserIden::Table)
            .to_owned()
    }

    pub fn fetch_by_id(conn: &Connection, id: UserId) -> Result<User, ServerError> {
        let (sql, values) = Self::select()
            .and_where(Expr::col(UserIden::Id).eq(id))
            .limit(1)
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        stmt.query_row(&*values.as_params(), User::from_row)
            .optional()
            .context("User::fetch_by_id")?
            .ok_or_else(|| not_found_error!("user"))
    }

    pub fn fetch_by_firebase_id<T: AsRef<str>>(
        conn: &Connection,
        firebase_id: T,
    ) -> Result<Option<User>, ServerError> {
        let (sql, values) = Self::select()
            .and_where(Expr::col(UserIden::FirebaseId).eq(firebase_id.as_ref()))
            .limit(1)
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let user = stmt
            .query_row(&*values.as_params(), User::from_row)
            .optional()
            .context("User::fetch_by_firebase_id")?;
        Ok(user)
    }

    pub fn fetch_all(conn: &Connection) -> Result<Vec<User>, ServerError> {
        let (sql, values) = Self::select()
            .order_by(UserIden::Id, Order::Asc)
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let users = stmt
            .query_map(&*values.as_params(), User::from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("User::fetch_all")?;
        Ok(users)
    }

    pub fn create(conn: &mut Connection, new_user: NewUser) -> Result<User, ServerError> {
        new_user.validate()?;

        let tx = conn.transaction()?;
        let user = {
            new_user.insert(&tx).context("User::create(insert)")?;
            let id = UserId(tx.last_insert_rowid());
            User::fetch_by_id(&tx, id)?
        };
        tx.commit()?;

        Ok(user)
    }

    /// Write every mutable column back. The modification time is bumped.
    pub fn update(&mut self, conn: &Connection) -> Result<(), ServerError> {
        self.modified_at = Utc::now().max(self.created_at);
        self.validate()?;

        let (sql, values) = Query::update()
            .table(UserIden::Table)
            .values([
                (UserIden::Username, self.username.clone().into()),
                (UserIden::Email, self.email.clone().into()),
                (UserIden::Role, self.role.into()),
                (UserIden::Sex, self.sex.into()),
                (UserIden::Height, self.height.into()),
                (UserIden::ModifiedAt, self.modified_at.into()),
            ])
            .and_where(Expr::col(UserIden::Id).eq(self.id))
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        match stmt.execute(&*values.as_params()).context("User::update")? {
            0 => Err(not_found_error!("user")),
            _ => Ok(()),
        }
    }

    pub fn set_role(
        conn: &Connection,
        id: UserId,
        role: Option<Role>,
    ) -> Result<User, ServerError> {
        let mut user = User::fetch_by_id(conn, id)?;
        user.role = role;
        user.update(conn)?;
        Ok(user)
    }
}
