use axum::{http::StatusCode, Json};
use rusqlite::Connection;
use shared::{
    access::Principal,
    api::error::ServerError,
    ensure_server, forbidden_error,
    model::{Exercise, ExerciseDefinition, ExerciseOrigin},
    not_found_error,
    types::{ExerciseId, UserId},
};
use tracing::{info, instrument};

use crate::{db::DatabaseConnection, Caller, JsonBody, PathParam};

/// Fetch an exercise the caller may see. Exercises they may not see are
/// reported as missing.
pub(crate) fn fetch_visible(
    conn: &Connection,
    id: ExerciseId,
    user_id: Option<UserId>,
    principal: &Principal,
) -> Result<Exercise, ServerError> {
    let exercise = Exercise::fetch_by_id(conn, id)?;
    ensure_server!(exercise.can_view(user_id, principal), not_found_error!("exercise"));
    Ok(exercise)
}

fn fetch_editable(
    conn: &Connection,
    id: ExerciseId,
    user_id: Option<UserId>,
    principal: &Principal,
) -> Result<Exercise, ServerError> {
    let exercise = fetch_visible(conn, id, user_id, principal)?;
    ensure_server!(
        exercise.can_edit(user_id, principal),
        forbidden_error!("exercise {id} can't be changed by a {principal}")
    );
    Ok(exercise)
}

pub async fn list_exercises(
    DatabaseConnection(conn): DatabaseConnection,
    caller: Caller,
) -> Result<Json<Vec<Exercise>>, ServerError> {
    let (user_id, principal) = (caller.user_id(), caller.principal);
    let exercises = conn
        .interact(move |conn| Exercise::fetch_visible(conn, user_id, &principal))
        .await??;
    Ok(Json(exercises))
}

pub async fn fetch_exercise(
    DatabaseConnection(conn): DatabaseConnection,
    caller: Caller,
    PathParam(id): PathParam<ExerciseId>,
) -> Result<Json<Exercise>, ServerError> {
    let (user_id, principal) = (caller.user_id(), caller.principal);
    let exercise = conn
        .interact(move |conn| fetch_visible(conn, id, user_id, &principal))
        .await??;
    Ok(Json(exercise))
}

#[instrument(skip_all)]
pub async fn create_catalog_exercise(
    DatabaseConnection(conn): DatabaseConnection,
    JsonBody(definition): JsonBody<ExerciseDefinition>,
) -> Result<(StatusCode, Json<Exercise>), ServerError> {
    let exercise = conn
        .interact(move |conn| Exercise::create(conn, definition, ExerciseOrigin::Catalog))
        .await??;
    info!(id = %exercise.id, "Created catalog exercise");

    Ok((StatusCode::CREATED, Json(exercise)))
}

#[instrument(skip_all)]
pub async fn create_user_exercise(
    DatabaseConnection(conn): DatabaseConnection,
    caller: Caller,
    JsonBody(definition): JsonBody<ExerciseDefinition>,
) -> Result<(StatusCode, Json<Exercise>), ServerError> {
    let origin = ExerciseOrigin::UserAuthored { created_by: caller.registered()?.id };
    let exercise = conn
        .interact(move |conn| Exercise::create(conn, definition, origin))
        .await??;
    info!(id = %exercise.id, owner = ?origin.owner(), "Created user exercise");

    Ok((StatusCode::CREATED, Json(exercise)))
}

#[instrument(skip(conn, caller, definition))]
pub async fn update_exercise(
    DatabaseConnection(conn): DatabaseConnection,
    caller: Caller,
    PathParam(id): PathParam<ExerciseId>,
    JsonBody(definition): JsonBody<ExerciseDefinition>,
) -> Result<Json<Exercise>, ServerError> {
    let (user_id, principal) = (caller.user_id(), caller.principal);
    let exercise = conn
        .interact(move |conn| {
            let mut exercise = fetch_editable(conn, id, user_id, &principal)?;
            exercise.update(conn, definition)?;
            Ok::<_, ServerError>(exercise)
        })
        .await??;

    Ok(Json(exercise))
}

#[instrument(skip(conn, caller))]
pub async fn delete_exercise(
    DatabaseConnection(conn): DatabaseConnection,
    caller: Caller,
    PathParam(id): PathParam<ExerciseId>,
) -> Result<StatusCode, ServerError> {
    let (user_id, principal) = (caller.user_id(), caller.principal);
    conn.interact(move |conn| {
        fetch_editable(conn, id, user_id, &principal)?;
        Exercise::delete(conn, id)
    })
    .await??;
    info!("Deleted exercise");

    Ok(StatusCode::NO_CONTENT)
}
