/// Chat log operations.
pub mod chat_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Document broadcast and shared-file operations.
pub mod document_service;
/// Health check service.
pub mod health_service;
/// Quiz orchestration operations.
pub mod quiz_service;
/// Room lifecycle, participant registry, and the shared mutation plumbing.
pub mod room_service;
/// Storage backend supervision with reconnect/backoff.
pub mod storage_supervisor;
/// Study timer operations.
pub mod timer_service;
