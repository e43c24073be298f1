use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::game::{AnswerView, GamePairView, SubmitAnswerRequest},
    error::AppError,
    routes::UserId,
    services::{game_view, matchmaking, play},
    state::SharedState,
};

/// Routes handling the two-player duel lifecycle.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/pair-game/connection", post(connect))
        .route("/pair-game/my-current", get(my_current_pair))
        .route("/pair-game/{id}", get(pair_by_id))
        .route("/pair-game/my-current/answers", post(submit_answer))
}

/// Join the open pending game or create a new one.
#[utoipa::path(
    post,
    path = "/pair-game/connection",
    tag = "pair-game",
    responses(
        (status = 200, description = "Caller is now a player in a game", body = GamePairView),
        (status = 403, description = "Caller already participates in an unfinished game")
    )
)]
pub async fn connect(
    State(state): State<SharedState>,
    UserId(user_id): UserId,
) -> Result<Json<GamePairView>, AppError> {
    let view = matchmaking::connect(&state, user_id).await?;
    Ok(Json(view))
}

/// Return the caller's current game, finalizing it first if it is overdue.
#[utoipa::path(
    get,
    path = "/pair-game/my-current",
    tag = "pair-game",
    responses(
        (status = 200, description = "Current game projection", body = GamePairView),
        (status = 404, description = "Caller has no current game")
    )
)]
pub async fn my_current_pair(
    State(state): State<SharedState>,
    UserId(user_id): UserId,
) -> Result<Json<GamePairView>, AppError> {
    let view = game_view::current_pair(&state, user_id).await?;
    Ok(Json(view))
}

/// Return a game by id; restricted to its two participants.
#[utoipa::path(
    get,
    path = "/pair-game/{id}",
    tag = "pair-game",
    params(("id" = Uuid, Path, description = "Identifier of the game")),
    responses(
        (status = 200, description = "Game projection", body = GamePairView),
        (status = 403, description = "Caller is not a participant of this game"),
        (status = 404, description = "No such game")
    )
)]
pub async fn pair_by_id(
    State(state): State<SharedState>,
    UserId(user_id): UserId,
    Path(id): Path<Uuid>,
) -> Result<Json<GamePairView>, AppError> {
    let view = game_view::pair_by_id(&state, id, user_id).await?;
    Ok(Json(view))
}

/// Score the caller's answer to their next unanswered question.
#[utoipa::path(
    post,
    path = "/pair-game/my-current/answers",
    tag = "pair-game",
    request_body = SubmitAnswerRequest,
    responses(
        (status = 200, description = "Answer recorded", body = AnswerView),
        (status = 403, description = "No active game, or all questions already answered")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    UserId(user_id): UserId,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<Json<AnswerView>, AppError> {
    payload.validate()?;
    let view = play::submit_answer(&state, user_id, payload).await?;
    Ok(Json(view))
}
