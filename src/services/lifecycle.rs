//! Read-triggered finalization.
//!
//! Every read and the tail of every answer submission passes the loaded game
//! through [`settle`]. Nothing here ever raises on an already-finished game,
//! so callers can apply it unconditionally before projecting state.

use std::time::SystemTime;

use tracing::debug;

use crate::{
    dao::models::Game,
    error::ServiceError,
    state::{SharedState, state_machine},
};

/// Finalize `game` if it is due, returning the freshest persisted state.
///
/// The finalize write is conditional on the game still being `Active` with
/// the scores the verdict was computed from. A rejected write means either a
/// concurrent caller finalized first (the frozen state is authoritative) or
/// an answer landed after our snapshot; both cases re-read and re-evaluate,
/// so the assigned outcomes always agree with the persisted scores.
pub async fn settle(state: &SharedState, game: Game) -> Result<Game, ServiceError> {
    let grace = state.config().grace_period();
    let mut game = game;

    loop {
        let now = SystemTime::now();
        let Some(reason) = state_machine::due_finalization(&game, now, grace) else {
            return Ok(game);
        };

        let backend = state.require_backend().await?;
        let verdict = state_machine::verdict(&game, now);
        let game_id = verdict.game_id;

        match backend.finalize_game(verdict).await? {
            Some(finalized) => {
                debug!(game_id = %game_id, reason = ?reason, "game finalized");
                return Ok(finalized);
            }
            None => {
                game = backend
                    .find_game(game_id)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound(format!("game `{game_id}` not found")))?;
            }
        }
    }
}
