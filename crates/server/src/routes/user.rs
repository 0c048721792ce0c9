use axum::{http::StatusCode, Json};
use shared::{
    api::{
        error::ServerError,
        payloads::{RegisterUserRequest, UpdateRoleRequest, UpdateUserRequest, UserDto},
    },
    ensure_server,
    model::User,
    types::UserId,
};
use tracing::{info, instrument};

use crate::{db::DatabaseConnection, Caller, JsonBody, PathParam};

#[instrument(skip_all)]
pub async fn register_user(
    DatabaseConnection(conn): DatabaseConnection,
    caller: Caller,
    JsonBody(request): JsonBody<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserDto>), ServerError> {
    let identity = caller.identity()?.clone();
    ensure_server!(
        caller.user.is_none(),
        ServerError::Conflict { field: "firebaseId".to_owned() }
    );

    let new_user = request
        .with_fallback_email(identity.email.as_deref())
        .into_profile()?
        .into_new_user(identity.subject);

    let user = conn.interact(move |conn| User::create(conn, new_user)).await??;
    info!(id = %user.id, "Registered user");

    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn fetch_current_user(caller: Caller) -> Result<Json<UserDto>, ServerError> {
    Ok(Json(caller.registered()?.clone().into()))
}

#[instrument(skip_all)]
pub async fn update_current_user(
    DatabaseConnection(conn): DatabaseConnection,
    caller: Caller,
    JsonBody(request): JsonBody<UpdateUserRequest>,
) -> Result<Json<UserDto>, ServerError> {
    let mut user = caller.registered()?.clone();
    request.into_profile()?.apply_to(&mut user);

    let user = conn
        .interact(move |conn| {
            user.update(conn)?;
            Ok::<_, ServerError>(user)
        })
        .await??;

    Ok(Json(user.into()))
}

pub async fn list_users(
    DatabaseConnection(conn): DatabaseConnection,
) -> Result<Json<Vec<UserDto>>, ServerError> {
    let users = conn.interact(|conn| User::fetch_all(conn)).await??;
    Ok(Json(users.into_iter().map(UserDto::from).collect()))
}

pub async fn fetch_user(
    DatabaseConnection(conn): DatabaseConnection,
    PathParam(id): PathParam<UserId>,
) -> Result<Json<UserDto>, ServerError> {
    let user = conn.interact(move |conn| User::fetch_by_id(conn, id)).await??;
    Ok(Json(user.into()))
}

#[instrument(skip(conn, request))]
pub async fn update_user_role(
    DatabaseConnection(conn): DatabaseConnection,
    PathParam(id): PathParam<UserId>,
    JsonBody(request): JsonBody<UpdateRoleRequest>,
) -> Result<Json<UserDto>, ServerError> {
    let user = conn
        .interact(move |conn| User::set_role(conn, id, request.role))
        .await??;
    info!(role = ?user.role, "Changed user role");

    Ok(Json(user.into()))
}
