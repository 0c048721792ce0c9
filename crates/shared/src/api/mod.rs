use const_format::concatcp;
use http::Method;

use crate::access::AccessTier;

pub mod error;
pub mod payloads;

pub const API_BASE_PATH: &str = "/api/";

/// Every operation the REST surface exposes, along with the access tier the
/// caller needs before the handler runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Ping,
    Greeting,
    RegisterUser,
    FetchCurrentUser,
    UpdateCurrentUser,
    ListUsers,
    FetchUser,
    UpdateUserRole,
    ListExercises,
    FetchExercise,
    CreateCatalogExercise,
    CreateUserExercise,
    UpdateExercise,
    DeleteExercise,
    LogExercise,
    ListExerciseLogs,
    ExerciseStatistics,
}

impl Operation {
    pub const ALL: [Operation; 17] = [
        Operation::Ping,
        Operation::Greeting,
        Operation::RegisterUser,
        Operation::FetchCurrentUser,
        Operation::UpdateCurrentUser,
        Operation::ListUsers,
        Operation::FetchUser,
        Operation::UpdateUserRole,
        Operation::ListExercises,
        Operation::FetchExercise,
        Operation::CreateCatalogExercise,
        Operation::CreateUserExercise,
        Operation::UpdateExercise,
        Operation::DeleteExercise,
        Operation::LogExercise,
        Operation::ListExerciseLogs,
        Operation::ExerciseStatistics,
    ];

    pub const fn path(&self) -> &'static str {
        use Operation::*;
        match self {
            Ping => concatcp!(API_BASE_PATH, "ping"),
            Greeting => concatcp!(API_BASE_PATH, "greeting"),
            RegisterUser | ListUsers => concatcp!(API_BASE_PATH, "users"),
            FetchCurrentUser | UpdateCurrentUser => concatcp!(API_BASE_PATH, "me"),
            FetchUser => concatcp!(API_BASE_PATH, "users/:id"),
            UpdateUserRole => concatcp!(API_BASE_PATH, "users/:id/role"),
            ListExercises | CreateCatalogExercise => concatcp!(API_BASE_PATH, "exercises"),
            FetchExercise | UpdateExercise | DeleteExercise => {
                concatcp!(API_BASE_PATH, "exercises/:id")
            },
            CreateUserExercise => concatcp!(API_BASE_PATH, "user_exercises"),
            LogExercise | ListExerciseLogs => concatcp!(API_BASE_PATH, "exercises/:id/logs"),
            ExerciseStatistics => concatcp!(API_BASE_PATH, "exercises/:id/statistics"),
        }
    }

    pub fn method(&self) -> Method {
        use Operation::*;
        match self {
            RegisterUser | CreateCatalogExercise | CreateUserExercise | LogExercise => Method::POST,
            UpdateCurrentUser | UpdateUserRole | UpdateExercise => Method::PUT,
            DeleteExercise => Method::DELETE,
            Ping | Greeting | FetchCurrentUser | ListUsers | FetchUser | ListExercises
            | FetchExercise | ListExerciseLogs | ExerciseStatistics => Method::GET,
        }
    }

    pub const fn tier(&self) -> AccessTier {
        use Operation::*;
        match self {
            Ping | Greeting => AccessTier::Public,
            ListUsers | FetchUser | UpdateUserRole | CreateCatalogExercise => AccessTier::Admin,
            CreateUserExercise => AccessTier::PremiumOrAdmin,
            ExerciseStatistics => AccessTier::Premium,
            // Ownership of the individual exercise is checked by the handler
            RegisterUser | FetchCurrentUser | UpdateCurrentUser | ListExercises | FetchExercise
            | UpdateExercise | DeleteExercise | LogExercise | ListExerciseLogs => {
                AccessTier::Authenticated
            },
        }
    }

    /// Look up the operation registered for a matched route. HEAD is served
    /// by the GET handler, so it shares the GET operation.
    pub fn find(method: &Method, path: &str) -> Option<Operation> {
        let serves = |op: &Operation| {
            let op_method = op.method();
            op_method == *method || (*method == Method::HEAD && op_method == Method::GET)
        };
        Self::ALL.into_iter().find(|op| op.path() == path && serves(op))
    }

    /// Tier for a matched route, falling back to the default tier for routes
    /// without an operation entry
    pub fn tier_for(method: &Method, path: &str) -> AccessTier {
        Self::find(method, path).map_or_else(AccessTier::default, |op| op.tier())
    }
}
