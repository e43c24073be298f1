//! Duel lifecycle rules.
//!
//! A game moves `PendingSecondPlayer → Active → Finished`, never backwards and
//! never skipping a step. Finalization is read-triggered: there is no timer per
//! game, only a due-check every caller runs before projecting or mutating
//! state. The actual `Finished` write is a conditional storage update, so the
//! rules here stay pure and idempotent.

use std::time::{Duration, SystemTime};

use crate::dao::{
    game_store::GameVerdict,
    models::{Game, GameStatus, PlayerOutcome},
};

/// Why an `Active` game is due for finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Both players answered the whole question sequence.
    BothFinished,
    /// The grace window after the first finisher elapsed.
    GraceExpired,
}

/// Decide whether `game` should finalize at `now`.
///
/// Returns `None` for games that are not `Active`, have no first finisher yet,
/// or whose grace window is still open. Calling this on a `Finished` game is
/// always a no-op, which makes the read paths free to invoke it unconditionally.
pub fn due_finalization(game: &Game, now: SystemTime, grace: Duration) -> Option<FinishReason> {
    if game.status != GameStatus::Active {
        return None;
    }

    if game.both_finished() {
        return Some(FinishReason::BothFinished);
    }

    let first_finisher_at = game.first_finisher_at?;
    let deadline = first_finisher_at + grace;
    (now >= deadline).then_some(FinishReason::GraceExpired)
}

/// Compare final scores and assign each player its outcome.
pub fn outcomes(first_score: u32, second_score: u32) -> (PlayerOutcome, PlayerOutcome) {
    match first_score.cmp(&second_score) {
        std::cmp::Ordering::Greater => (PlayerOutcome::Win, PlayerOutcome::Lose),
        std::cmp::Ordering::Less => (PlayerOutcome::Lose, PlayerOutcome::Win),
        std::cmp::Ordering::Equal => (PlayerOutcome::Draw, PlayerOutcome::Draw),
    }
}

/// Build the finalization verdict for `game` from the scores as they stand.
///
/// Answers the still-playing player might have submitted later are not waited
/// for; whatever was persisted when the game became due is what counts.
pub fn verdict(game: &Game, finished_at: SystemTime) -> GameVerdict {
    let second_score = game
        .second_player
        .as_ref()
        .map(|player| player.score)
        .unwrap_or_default();
    let first_score = game.first_player.score;
    let (first, second) = outcomes(first_score, second_score);

    GameVerdict {
        game_id: game.id,
        finished_at,
        first,
        second,
        first_score,
        second_score,
    }
}
