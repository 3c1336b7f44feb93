use serde::Serialize;
use utoipa::ToSchema;

/// Health probe payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `"ok"` or `"degraded"`.
    pub status: String,
    /// True while no storage backend is installed.
    pub degraded: bool,
}

impl HealthResponse {
    /// Healthy payload.
    pub fn ok() -> Self {
        Self {
            status: "ok".into(),
            degraded: false,
        }
    }

    /// Degraded-mode payload.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".into(),
            degraded: true,
        }
    }
}
