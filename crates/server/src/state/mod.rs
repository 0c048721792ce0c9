use std::sync::Arc;

use axum::extract::FromRef;
use deadpool_sqlite::Pool;

use crate::{cli::Cli, identity::IdentityVerifier};

mod args;
pub use args::*;

mod cli;

mod greeting;
pub use greeting::*;

#[derive(Debug, Clone)]
pub struct AppState {
    pub pool: Pool,
    pub args: Arc<Cli>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub greeting_counter: GreetingCounter,
}

impl AppState {
    pub fn new(pool: Pool, args: Cli, verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self {
            pool,
            args: Arc::new(args),
            verifier,
            greeting_counter: GreetingCounter::default(),
        }
    }
}

impl FromRef<AppState> for Pool {
    fn from_ref(state: &AppState) -> Self {
        // pool uses an Arc internally so clone is cheap
        state.pool.clone()
    }
}

impl FromRef<AppState> for Arc<dyn IdentityVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.verifier.clone()
    }
}
