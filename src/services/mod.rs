/// OpenAPI documentation generation.
pub mod documentation;
/// Read path assembling game projections.
pub mod game_view;
/// Health check service.
pub mod health_service;
/// Read-triggered (lazy) game finalization.
pub mod lifecycle;
/// Matchmaking and pending-slot claiming.
pub mod matchmaking;
/// Answer validation, scoring, and recording.
pub mod play;
/// Storage connection supervision and degraded mode handling.
pub mod storage_supervisor;
