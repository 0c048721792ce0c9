//! Column encodings shared by the models. Structured values are stored as
//! JSON text and plain enums as their serde name.

/// Implement `ToSql`/`FromSql` for a type by storing it as a JSON document
#[macro_export]
macro_rules! json_column {
    ($ty:ty) => {
        #[cfg(feature = "backend")]
        impl rusqlite::ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                serde_json::to_string(self)
                    .map(rusqlite::types::ToSqlOutput::from)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
            }
        }

        #[cfg(feature = "backend")]
        impl rusqlite::types::FromSql for $ty {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                <serde_json::Value as rusqlite::types::FromSql>::column_result(value).and_then(|v| {
                    serde_json::from_value(v)
                        .map_err(|e| rusqlite::types::FromSqlError::Other(Box::new(e)))
                })
            }
        }

        #[cfg(feature = "backend")]
        impl From<&$ty> for sea_query::Value {
            fn from(value: &$ty) -> Self {
                serde_json::to_string(value)
                    .map(Into::into)
                    .unwrap_or(sea_query::Value::String(None))
            }
        }
    };
}

/// Implement `ToSql`/`FromSql` for a unit-variant enum by storing its serde
/// name as TEXT
#[macro_export]
macro_rules! text_column {
    ($ty:ty) => {
        #[cfg(feature = "backend")]
        impl rusqlite::ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                match serde_json::to_value(self) {
                    Ok(serde_json::Value::String(s)) => Ok(rusqlite::types::ToSqlOutput::from(s)),
                    Ok(other) => Err(rusqlite::Error::ToSqlConversionFailure(
                        format!("{} is not a text enum: {other}", stringify!($ty)).into(),
                    )),
                    Err(e) => Err(rusqlite::Error::ToSqlConversionFailure(Box::new(e))),
                }
            }
        }

        #[cfg(feature = "backend")]
        impl rusqlite::types::FromSql for $ty {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                let text = value.as_str()?;
                serde_json::from_value(serde_json::Value::String(text.to_owned()))
                    .map_err(|e| rusqlite::types::FromSqlError::Other(Box::new(e)))
            }
        }

        #[cfg(feature = "backend")]
        impl From<$ty> for sea_query::Value {
            fn from(value: $ty) -> Self {
                match serde_json::to_value(value) {
                    Ok(serde_json::Value::String(s)) => s.into(),
                    _ => sea_query::Value::String(None),
                }
            }
        }

        #[cfg(feature = "backend")]
        impl sea_query::Nullable for $ty {
            fn null() -> sea_query::Value {
                sea_query::Value::String(None)
            }
        }
    };
}
