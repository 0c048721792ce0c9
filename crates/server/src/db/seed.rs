use rusqlite::Connection;
use shared::{
    api::error::ServerError,
    internal_error,
    model::{Exercise, ExerciseDefinition, ExerciseOrigin},
};
use tracing::{info, instrument};

static CATALOG: &str = include_str!("../../catalog.json");

pub fn catalog() -> Result<Vec<ExerciseDefinition>, ServerError> {
    serde_json::from_str(CATALOG).map_err(|e| internal_error!("catalog.json: {e}"))
}

/// Insert the bundled catalog if the database has no catalog exercises yet.
/// Returns how many exercises were added.
#[instrument(skip(conn))]
pub fn seed_catalog(conn: &mut Connection) -> Result<usize, ServerError> {
    if Exercise::count_catalog(conn)? > 0 {
        return Ok(0);
    }

    let definitions = catalog()?;
    let count = definitions.len();
    for definition in definitions {
        Exercise::create(conn, definition, ExerciseOrigin::Catalog)?;
    }
    info!(count, "Seeded exercise catalog");
    Ok(count)
}
