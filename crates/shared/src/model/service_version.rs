use std::fmt::Display;

use chrono::{DateTime, Utc};
use exemplar::Model;
use rusqlite::{Connection, OptionalExtension};
use sea_query::{enum_def, Expr, Order, Query, SqliteQueryBuilder};
use sea_query_rusqlite::RusqliteBinder;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::{
    api::error::{ServerError, ServerErrorContext},
    not_found_error,
    types::ServiceVersionId,
};

/// A crate version that has run against this database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
#[table("service_version")]
#[enum_def]
pub struct ServiceVersion {
    pub id: ServiceVersionId,
    pub version: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
#[table("service_version")]
pub struct NewServiceVersion {
    pub version: String,
    pub created_at: DateTime<Utc>,
}

impl NewServiceVersion {
    pub fn new(version: String) -> Result<Self, semver::Error> {
        // Only checks it's valid semver
        let _ = Version::parse(&version)?;
        Ok(Self { version, created_at: Utc::now() })
    }
}

impl Display for ServiceVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.version.fmt(f)
    }
}

impl ServiceVersion {
    pub fn cmp(&self, other: &str) -> Result<std::cmp::Ordering, semver::Error> {
        let my_version = Version::parse(&self.version)?;
        let other_version = Version::parse(other)?;

        Ok(my_version.cmp(&other_version))
    }

    fn select() -> sea_query::SelectStatement {
        Query::select()
            .columns([
                ServiceVersionIden::Id,
                ServiceVersionIden::Version,
                ServiceVersionIden::CreatedAt,
            ])
            .from(ServiceVersionIden::Table)
            .to_owned()
    }

    pub fn fetch_by_id(conn: &Connection, id: ServiceVersionId) -> Result<Self, ServerError> {
        let (sql, values) = Self::select()
            .and_where(Expr::col(ServiceVersionIden::Id).eq(id))
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        stmt.query_row(&*values.as_params(), Self::from_row)
            .optional()
            .context("ServiceVersion::fetch_by_id")?
            .ok_or_else(|| not_found_error!("service version"))
    }

    pub fn fetch_latest(conn: &Connection) -> Result<Option<Self>, ServerError> {
        let (sql, values) = Self::select()
            .order_by(ServiceVersionIden::Id, Order::Desc)
            .limit(1)
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let value = stmt
            .query_row(&*values.as_params(), Self::from_row)
            .optional()
            .context("ServiceVersion::fetch_latest")?;

        Ok(value)
    }

    pub fn create(
        conn: &mut Connection,
        new_service_version: NewServiceVersion,
    ) -> Result<ServiceVersion, ServerError> {
        let tx = conn.transaction()?;
        let service_version = {
            new_service_version.insert(&tx).context("ServiceVersion::create")?;
            ServiceVersion::fetch_by_id(&tx, ServiceVersionId(tx.last_insert_rowid()))?
        };
        tx.commit()?;

        Ok(service_version)
    }
}
