//! Matchmaking: pair the caller into a game.
//!
//! `connect` never fails the caller with a race: either the single open
//! pending slot is claimed atomically, or the caller becomes the first player
//! of a brand-new pending game.

use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        game_store::SecondPlayerClaim,
        models::{Game, Player},
    },
    dto::game::GamePairView,
    error::ServiceError,
    state::SharedState,
};

/// Connect `user_id` to a game: join the open pending game if one exists,
/// otherwise create a fresh pending one.
///
/// Fails with [`ServiceError::AlreadyInGame`] when the user already
/// participates in any unfinished game.
pub async fn connect(state: &SharedState, user_id: Uuid) -> Result<GamePairView, ServiceError> {
    let backend = state.require_backend().await?;

    let Some(user) = backend.resolve(user_id).await? else {
        return Err(ServiceError::NotFound(format!("user `{user_id}` not found")));
    };

    if backend.find_unfinished_for_user(user_id).await?.is_some() {
        return Err(ServiceError::AlreadyInGame);
    }

    let player = Player::new(user);
    let now = SystemTime::now();

    // Atomic claim: when two connects race for one open slot, exactly one
    // lands here; the loser falls through to creating a new pending game.
    let claim = SecondPlayerClaim {
        player: player.clone(),
        started_at: now,
    };
    if let Some(game) = backend.claim_pending_slot(claim).await? {
        info!(game_id = %game.id, user_id = %user_id, "second player joined, game active");
        return Ok(game.into());
    }

    let requested = state.config().questions_per_game();
    let questions = backend.pick_random(requested).await?;
    if questions.len() < requested {
        return Err(ServiceError::NotEnoughQuestions {
            available: questions.len(),
            requested,
        });
    }

    let game = Game::new(player, questions, now);
    backend.insert_game(game.clone()).await?;
    info!(game_id = %game.id, user_id = %user_id, "created pending game");

    Ok(game.into())
}
