use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Quiz Duel Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::pair_game::connect,
        crate::routes::pair_game::my_current_pair,
        crate::routes::pair_game::pair_by_id,
        crate::routes::pair_game::submit_answer,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::game::GamePairView,
            crate::dto::game::PlayerProgress,
            crate::dto::game::PlayerView,
            crate::dto::game::QuestionView,
            crate::dto::game::AnswerView,
            crate::dto::game::SubmitAnswerRequest,
            crate::dao::models::GameStatus,
            crate::dao::models::AnswerStatus,
            crate::dao::models::PlayerOutcome,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "pair-game", description = "Two-player quiz duel operations"),
    )
)]
pub struct ApiDoc;
