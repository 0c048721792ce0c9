//! Who is making a request. [`enforce_access`] resolves the caller once per
//! request, checks the operation's tier and leaves a [`Caller`] in the
//! request extensions for handlers.

use axum::{
    async_trait,
    extract::{FromRequestParts, MatchedPath, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use shared::{
    access::{self, AccessTier, Principal},
    api::{error::ServerError, Operation},
    internal_error,
    model::User,
    not_found_error,
    types::UserId,
};
use tracing::{debug, instrument, Span};

use crate::{identity::DecodedIdentity, state::AppState};

#[derive(Debug, Clone)]
pub struct Caller {
    pub principal: Principal,
    /// Present when a valid token was presented
    pub identity: Option<DecodedIdentity>,
    /// Present when the identity has registered
    pub user: Option<User>,
}

impl Caller {
    pub const fn anonymous() -> Self {
        Self { principal: Principal::Anonymous, identity: None, user: None }
    }

    /// A verified identity. Without a user row it counts as a regular user.
    pub fn verified(identity: DecodedIdentity, user: Option<User>) -> Self {
        let principal = user.as_ref().map_or_else(Principal::regular, User::principal);
        Self { principal, identity: Some(identity), user }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user.as_ref().map(|u| u.id)
    }

    pub fn identity(&self) -> Result<&DecodedIdentity, ServerError> {
        self.identity.as_ref().ok_or_else(ServerError::unauthenticated)
    }

    /// The caller's user row, for operations that only make sense after
    /// registration
    pub fn registered(&self) -> Result<&User, ServerError> {
        self.user.as_ref().ok_or_else(|| not_found_error!("user"))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .cloned()
            .ok_or_else(|| internal_error!("Caller requested on a route without enforce_access"))
    }
}

/// Look up the token's identity and its user row. Tokens that fail
/// verification leave the caller anonymous.
async fn resolve_caller(state: &AppState, token: &str) -> Result<Caller, ServerError> {
    let identity = match state.verifier.verify(token) {
        Ok(identity) => identity,
        Err(e) => {
            debug!(error = %e, "Ignoring invalid credential");
            return Ok(Caller::anonymous());
        },
    };

    let subject = identity.subject.clone();
    let conn = state.pool.get().await?;
    let user = conn
        .interact(move |conn| User::fetch_by_firebase_id(conn, subject))
        .await??;

    Ok(Caller::verified(identity, user))
}

/// Route layer deciding every request against its operation's tier before
/// the handler runs
#[instrument(skip_all, fields(tier, principal))]
pub async fn enforce_access(
    State(state): State<AppState>,
    matched: Option<MatchedPath>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let tier = matched
        .as_ref()
        .map_or_else(AccessTier::default, |path| Operation::tier_for(request.method(), path.as_str()));

    let caller = match (tier, bearer) {
        // Public operations never look at credentials
        (AccessTier::Public, _) | (_, None) => Caller::anonymous(),
        (_, Some(TypedHeader(Authorization(bearer)))) => {
            resolve_caller(&state, bearer.token()).await?
        },
    };

    let span = Span::current();
    span.record("tier", tracing::field::debug(tier));
    span.record("principal", tracing::field::display(caller.principal));

    access::decide(&caller.principal, tier).into_result().map_err(|reason| {
        debug!(%reason, "Access denied");
        ServerError::from(reason)
    })?;

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}
