use serde::Serialize;
use utoipa::ToSchema;

/// Health states reported by `/healthcheck`.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Storage is reachable; all operations are served.
    Ok,
    /// No storage backend is available; game operations fail with 503.
    Degraded,
}

/// Body of the `/healthcheck` response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall service health.
    pub status: HealthStatus,
}

impl HealthResponse {
    /// The service is fully operational.
    pub fn ok() -> Self {
        Self {
            status: HealthStatus::Ok,
        }
    }

    /// The service is running without storage.
    pub fn degraded() -> Self {
        Self {
            status: HealthStatus::Degraded,
        }
    }
}
