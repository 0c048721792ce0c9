use axum::{
    body::Body,
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use shared::{
    api::{error::ServerError, Operation},
    not_found_error,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    map_response_body::MapResponseBodyLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

use crate::{enforce_access, state::AppState};

mod ping;
pub use ping::*;

mod greeting;
pub use greeting::*;

mod user;
pub use user::*;

mod exercise;
pub use exercise::*;

mod exercise_log;
pub use exercise_log::*;

fn cors(origin: &str) -> CorsLayer {
    let allow_origin = match origin.parse::<HeaderValue>() {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(e) => {
            warn!(origin, error = %e, "Invalid CORS origin, cross origin requests are disabled");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        },
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// The body limit layer answers an oversized `Content-Length` in plain text
/// before any extractor runs
async fn payload_too_large_as_json(response: Response) -> Response {
    let plain_text = response
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|value| value.as_bytes().starts_with(b"text/plain"));
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE && plain_text {
        return ServerError::PayloadTooLarge { message: "length limit exceeded".to_owned() }
            .into_response();
    }
    response
}

/// Every API route, each behind the access check for its operation
pub fn router(state: AppState) -> Router {
    use Operation::*;

    let api = Router::new()
        .route(Ping.path(), get(ping))
        .route(Greeting.path(), get(greeting))
        .route(RegisterUser.path(), post(register_user).get(list_users))
        .route(FetchCurrentUser.path(), get(fetch_current_user).put(update_current_user))
        .route(FetchUser.path(), get(fetch_user))
        .route(UpdateUserRole.path(), put(update_user_role))
        .route(ListExercises.path(), get(list_exercises).post(create_catalog_exercise))
        .route(
            FetchExercise.path(),
            get(fetch_exercise).put(update_exercise).delete(delete_exercise),
        )
        .route(CreateUserExercise.path(), post(create_user_exercise))
        .route(LogExercise.path(), post(log_exercise).get(list_exercise_logs))
        .route(ExerciseStatistics.path(), get(exercise_statistics))
        .route_layer(middleware::from_fn_with_state(state.clone(), enforce_access))
        .fallback(|| async { not_found_error!("route") });

    api.layer(
        ServiceBuilder::new()
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(cors(&state.args.cors_origin))
            .layer(MapResponseBodyLayer::new(Body::new))
            .layer(RequestBodyLimitLayer::new(state.args.request_body_limit)),
    )
    .layer(middleware::map_response(payload_too_large_as_json))
    .with_state(state)
}
