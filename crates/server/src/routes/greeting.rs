use axum::{extract::State, Json};
use shared::api::payloads::{Greeting, GreetingQuery};

use crate::{state::GreetingCounter, QueryParams};

pub async fn greeting(
    State(counter): State<GreetingCounter>,
    QueryParams(query): QueryParams<GreetingQuery>,
) -> Json<Greeting> {
    Json(Greeting::new(counter.next(), query.name.as_deref()))
}
