use axum::{http::StatusCode, Json};
use shared::{
    api::{error::ServerError, payloads::LogExerciseRequest},
    model::{ExerciseLog, ExerciseStatistics},
    types::ExerciseId,
};
use tracing::{info, instrument};

use super::exercise::fetch_visible;
use crate::{db::DatabaseConnection, state::Args, Caller, JsonBody, PathParam};

#[instrument(skip(conn, caller, request))]
pub async fn log_exercise(
    DatabaseConnection(conn): DatabaseConnection,
    caller: Caller,
    PathParam(exercise_id): PathParam<ExerciseId>,
    JsonBody(request): JsonBody<LogExerciseRequest>,
) -> Result<(StatusCode, Json<ExerciseLog>), ServerError> {
    let user_id = caller.registered()?.id;
    let principal = caller.principal;

    let log = conn
        .interact(move |conn| {
            let exercise = fetch_visible(conn, exercise_id, Some(user_id), &principal)?;
            let logging_types = exercise.definition.logging_types;
            let new_log = request.into_new_log(user_id, exercise_id, &logging_types)?;
            ExerciseLog::create(conn, new_log, &logging_types)
        })
        .await??;
    info!(id = %log.id, sets = log.sets.len(), "Logged exercise");

    Ok((StatusCode::CREATED, Json(log)))
}

pub async fn list_exercise_logs(
    DatabaseConnection(conn): DatabaseConnection,
    caller: Caller,
    PathParam(exercise_id): PathParam<ExerciseId>,
) -> Result<Json<Vec<ExerciseLog>>, ServerError> {
    let user_id = caller.registered()?.id;
    let principal = caller.principal;

    let logs = conn
        .interact(move |conn| {
            fetch_visible(conn, exercise_id, Some(user_id), &principal)?;
            ExerciseLog::fetch_for(conn, user_id, exercise_id)
        })
        .await??;

    Ok(Json(logs))
}

/// Maxima over the caller's own logs of an exercise, with the one rep max
/// estimated by the configured formula
#[instrument(skip(conn, caller, args))]
pub async fn exercise_statistics(
    DatabaseConnection(conn): DatabaseConnection,
    caller: Caller,
    args: Args,
    PathParam(exercise_id): PathParam<ExerciseId>,
) -> Result<Json<ExerciseStatistics>, ServerError> {
    let user_id = caller.registered()?.id;
    let principal = caller.principal;
    let formula = args.one_rep_max_formula.formula();

    let logs = conn
        .interact(move |conn| {
            fetch_visible(conn, exercise_id, Some(user_id), &principal)?;
            ExerciseLog::fetch_for(conn, user_id, exercise_id)
        })
        .await??;

    Ok(Json(ExerciseStatistics::aggregate(exercise_id, &logs, formula)))
}
