//! Answer processing: validate, score, and persist one submission.

use std::{sync::Arc, time::SystemTime};

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        game_store::{AnswerRecord, StorageBackend},
        models::{Answer, AnswerStatus, Game, GameStatus, PlayerSlot},
    },
    dto::game::{AnswerView, SubmitAnswerRequest},
    error::ServiceError,
    services::lifecycle,
    state::SharedState,
};

/// One-time score bonus for the first player to answer the whole sequence.
const SPEED_BONUS: u32 = 1;

/// Score and record one answer for the caller's next unanswered question.
pub async fn submit_answer(
    state: &SharedState,
    user_id: Uuid,
    request: SubmitAnswerRequest,
) -> Result<AnswerView, ServiceError> {
    let backend = state.require_backend().await?;

    let Some(game) = backend.find_unfinished_for_user(user_id).await? else {
        return Err(ServiceError::NotInActiveGame);
    };

    // Lazy finalization first: once the grace window has run out, late
    // answers are rejected even though no read has materialized the finish yet.
    let game = lifecycle::settle(state, game).await?;
    if game.status != GameStatus::Active {
        return Err(ServiceError::NotInActiveGame);
    }

    let slot = game.slot_of(user_id).ok_or(ServiceError::NotInActiveGame)?;
    let Some(question) = game.next_question(slot) else {
        return Err(ServiceError::AllQuestionsAnswered);
    };

    // Plain membership test; callers supply case variants themselves.
    let status = if question.correct_answers.iter().any(|accepted| accepted == &request.answer) {
        AnswerStatus::Correct
    } else {
        AnswerStatus::Incorrect
    };

    let now = SystemTime::now();
    let answer = Answer {
        question_id: question.id,
        status,
        added_at: now,
    };
    let base_delta = match status {
        AnswerStatus::Correct => 1,
        AnswerStatus::Incorrect => 0,
    };

    let answered_after = game
        .player(slot)
        .map(|player| player.answers.len() + 1)
        .unwrap_or_default();
    let finishing = answered_after == game.questions.len();

    let updated = record(&backend, &game, slot, answer.clone(), base_delta, finishing, now).await?;
    let Some(updated_game) = updated else {
        // The game stopped being active (or the question got answered) under
        // our feet; from the caller's perspective there is no game to play.
        return Err(ServiceError::NotInActiveGame);
    };

    if finishing {
        info!(game_id = %game.id, user_id = %user_id, "player answered the whole sequence");
    }

    // Tail check covers the both-finished-immediately case.
    lifecycle::settle(state, updated_game).await?;

    Ok(answer.into())
}

/// Issue the conditional answer write, claiming the speed bonus when this
/// submission is the first to complete the sequence.
async fn record(
    backend: &Arc<dyn StorageBackend>,
    game: &Game,
    slot: PlayerSlot,
    answer: Answer,
    base_delta: u32,
    finishing: bool,
    now: SystemTime,
) -> Result<Option<Game>, ServiceError> {
    if finishing && game.first_finisher_at.is_none() {
        let with_bonus = AnswerRecord {
            game_id: game.id,
            slot,
            answer: answer.clone(),
            score_delta: base_delta + SPEED_BONUS,
            finisher_mark: Some(now),
        };
        if let Some(updated) = backend.record_answer(with_bonus).await? {
            info!(game_id = %game.id, "speed bonus awarded to first finisher");
            return Ok(updated.into());
        }
        // Lost the first-finisher race; record the answer without the bonus.
    }

    let plain = AnswerRecord {
        game_id: game.id,
        slot,
        answer,
        score_delta: base_delta,
        finisher_mark: None,
    };
    Ok(backend.record_answer(plain).await?)
}
