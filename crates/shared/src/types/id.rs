use std::{fmt, ops::Deref};

use serde::{Deserialize, Serialize};
#[cfg(feature = "backend")]
use rusqlite::{
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
    ToSql,
};

/// Declares a surrogate integer key generated by the database sequence
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl Deref for $name {
            type Target = i64;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        #[cfg(feature = "backend")]
        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.0))
            }
        }

        #[cfg(feature = "backend")]
        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                i64::column_result(value).map(Self)
            }
        }

        #[cfg(feature = "backend")]
        impl From<$name> for sea_query::Value {
            fn from(value: $name) -> Self {
                value.0.into()
            }
        }

        #[cfg(feature = "backend")]
        impl From<&$name> for sea_query::Value {
            fn from(value: &$name) -> Self {
                value.0.into()
            }
        }
    };
}

id_type!(UserId);
id_type!(ExerciseId);
id_type!(ExerciseLogId);
id_type!(ServiceVersionId);
