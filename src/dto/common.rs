use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Body carrying only the caller identity, shared by the mutations that need
/// nothing else (leave, ready toggle, clear document, quiz advancement).
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CallerRequest {
    /// Identity of the caller.
    #[validate(custom(function = crate::dto::validation::validate_user_id))]
    pub user_id: String,
}

/// Caller identity passed in the query string of DELETE endpoints.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CallerQuery {
    /// Identity of the caller.
    pub user_id: String,
}

/// Generic acknowledgement used by mutations with no other updated fields.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    /// Always true; failures return an error body instead.
    pub success: bool,
    /// Human-readable outcome description.
    pub message: String,
}

impl ActionResponse {
    /// Successful acknowledgement with a description.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
