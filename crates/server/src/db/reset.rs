use rusqlite::Connection;
use shared::api::error::{ServerError, ServerErrorContext};
use tracing::{info, instrument};

/// Children before parents. `service_version` is bookkeeping and survives.
const APPLICATION_TABLES: [&str; 4] = ["exercise_log", "user_exercise", "exercise", "user"];

/// Delete every application row and restart the id sequences. Only meant for
/// tests. Foreign keys are switched back on whether or not the clear worked.
#[instrument(skip(conn))]
pub fn reset_database(conn: &mut Connection) -> Result<(), ServerError> {
    conn.pragma_update(None, "foreign_keys", "OFF")
        .context("reset_database(foreign_keys OFF)")?;

    let cleared = clear_tables(conn);
    let restored = conn
        .pragma_update(None, "foreign_keys", "ON")
        .context("reset_database(foreign_keys ON)");

    cleared?;
    restored?;
    info!("Database reset");
    Ok(())
}

fn clear_tables(conn: &mut Connection) -> Result<(), ServerError> {
    let tx = conn.transaction()?;
    for table in APPLICATION_TABLES {
        tx.execute(&format!("DELETE FROM {table}"), ())
            .with_context(|| format!("reset_database({table})"))?;
    }
    let sequences = APPLICATION_TABLES
        .iter()
        .map(|table| format!("'{table}'"))
        .collect::<Vec<_>>()
        .join(", ");
    tx.execute(&format!("DELETE FROM sqlite_sequence WHERE name IN ({sequences})"), ())
        .context("reset_database(sqlite_sequence)")?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use shared::model::{
        Exercise, ExerciseDefinition, ExerciseOrigin, LoggingType, MuscleGroup, NewUser, Sex, User,
    };

    use super::*;
    use crate::db::{configure_new_connection, run_migrations};

    fn migrated() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reset.sqlite");
        run_migrations(path.to_str().unwrap(), "0.1.0").unwrap();
        let mut conn = Connection::open(&path).unwrap();
        configure_new_connection(&mut conn).unwrap();
        (dir, conn)
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), (), |row| row.get(0))
            .unwrap()
    }

    fn populate(conn: &mut Connection) -> User {
        let user = User::create(
            conn,
            NewUser::new("uid-1", "presser", "presser@example.com", Sex::Male, 175),
        )
        .unwrap();
        Exercise::create(
            conn,
            ExerciseDefinition {
                name: "Strict press".into(),
                description: None,
                muscle_groups: [MuscleGroup::Shoulders].into(),
                logging_types: [LoggingType::RepsWeight].into(),
            },
            ExerciseOrigin::UserAuthored { created_by: user.id },
        )
        .unwrap();
        user
    }

    #[test]
    fn test_reset_clears_rows_and_sequences() {
        let (_dir, mut conn) = migrated();
        let first = populate(&mut conn);
        assert_eq!(count(&conn, "user_exercise"), 1);

        reset_database(&mut conn).unwrap();
        for table in APPLICATION_TABLES {
            assert_eq!(count(&conn, table), 0, "{table}");
        }
        assert_eq!(count(&conn, "service_version"), 1);

        let again = populate(&mut conn);
        assert_eq!(again.id, first.id);
    }

    #[test]
    fn test_reset_is_idempotent_and_restores_foreign_keys() {
        let (_dir, mut conn) = migrated();
        reset_database(&mut conn).unwrap();
        reset_database(&mut conn).unwrap();

        let enabled: i64 = conn.query_row("PRAGMA foreign_keys", (), |row| row.get(0)).unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_failed_reset_rolls_back_and_restores_foreign_keys() {
        let (_dir, mut conn) = migrated();
        populate(&mut conn);
        conn.execute_batch("DROP TABLE exercise_log").unwrap();

        let err = reset_database(&mut conn).unwrap_err();
        assert!(matches!(err, ServerError::Internal { .. }), "{err:?}");

        let enabled: i64 = conn.query_row("PRAGMA foreign_keys", (), |row| row.get(0)).unwrap();
        assert_eq!(enabled, 1);
        assert_eq!(count(&conn, "user"), 1);
        assert_eq!(count(&conn, "user_exercise"), 1);
    }
}
