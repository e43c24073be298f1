//! Read path: assemble the externally visible projection of a game.
//!
//! Both lookups settle the game first, so expired grace windows materialize
//! as `Finished` on the very read that observes them.

use uuid::Uuid;

use crate::{
    dto::game::GamePairView, error::ServiceError, services::lifecycle, state::SharedState,
};

/// Project the caller's current (non-finished) game.
pub async fn current_pair(
    state: &SharedState,
    user_id: Uuid,
) -> Result<GamePairView, ServiceError> {
    let backend = state.require_backend().await?;

    let Some(game) = backend.find_unfinished_for_user(user_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "no current game for user `{user_id}`"
        )));
    };

    let game = lifecycle::settle(state, game).await?;
    Ok(game.into())
}

/// Project a game by id for one of its participants.
pub async fn pair_by_id(
    state: &SharedState,
    game_id: Uuid,
    user_id: Uuid,
) -> Result<GamePairView, ServiceError> {
    let backend = state.require_backend().await?;

    let Some(game) = backend.find_game(game_id).await? else {
        return Err(ServiceError::NotFound(format!("game `{game_id}` not found")));
    };

    if game.slot_of(user_id).is_none() {
        return Err(ServiceError::Forbidden(format!(
            "user `{user_id}` does not participate in game `{game_id}`"
        )));
    }

    let game = lifecycle::settle(state, game).await?;
    Ok(game.into())
}
