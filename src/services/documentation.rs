use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the study room backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::room::get_room,
        crate::routes::room::create_room,
        crate::routes::room::join_room,
        crate::routes::quiz::submit_answer,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::room::RoomSnapshot,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::JoinRoomRequest,
            crate::dto::quiz::SubmitAnswerRequest,
            crate::dto::quiz::SubmitAnswerResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "room", description = "Room lifecycle, participants, timer, documents, chat"),
        (name = "quiz", description = "Host-orchestrated live quiz"),
    )
)]
pub struct ApiDoc;
