use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use axum::extract::FromRef;

use crate::state::AppState;

/// Number of greetings handed out since startup. Owned by [`AppState`] so
/// every router built in a test gets its own sequence.
#[derive(Debug, Clone, Default)]
pub struct GreetingCounter(Arc<AtomicU64>);

impl GreetingCounter {
    /// Returns the id of the next greeting, starting at 1
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl FromRef<AppState> for GreetingCounter {
    fn from_ref(state: &AppState) -> Self {
        state.greeting_counter.clone()
    }
}
