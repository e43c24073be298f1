use axum::{
    Router,
    extract::FromRequestParts,
    http::{header::HeaderName, request::Parts},
};
use uuid::Uuid;

use crate::{error::AppError, state::SharedState};

pub mod docs;
pub mod health;
pub mod pair_game;

/// Header carrying the already-authenticated caller identity.
///
/// Authentication itself happens upstream; this backend only consumes the
/// resolved user id.
pub const USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");

/// Extractor for the caller's user id taken from [`USER_ID_HEADER`].
#[derive(Debug, Clone, Copy)]
pub struct UserId(pub Uuid);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("missing x-user-id header".into()))?;
        let value = value
            .to_str()
            .map_err(|_| AppError::Unauthorized("malformed x-user-id header".into()))?;
        let id = Uuid::parse_str(value)
            .map_err(|_| AppError::Unauthorized("x-user-id is not a valid UUID".into()))?;

        Ok(UserId(id))
    }
}

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router().merge(pair_game::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
