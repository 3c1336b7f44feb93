use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::{
        common::CallerRequest,
        quiz::{
            EndQuizResponse, LeaderboardResponse, NextQuestionResponse, StartQuizRequest,
            StartQuizResponse, SubmitAnswerRequest, SubmitAnswerResponse,
        },
    },
    error::AppError,
    services::quiz_service,
    state::SharedState,
};

/// Host-orchestrated quiz endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms/{code}/quiz/start", post(start_quiz))
        .route("/rooms/{code}/quiz/answer", post(submit_answer))
        .route("/rooms/{code}/quiz/next", post(next_question))
        .route("/rooms/{code}/quiz/end", post(end_quiz))
        .route("/rooms/{code}/quiz/leaderboard", get(leaderboard))
}

/// Start a quiz from a pre-generated question set; host-only.
#[utoipa::path(
    post,
    path = "/rooms/{code}/quiz/start",
    tag = "quiz",
    params(("code" = String, Path, description = "Room share code")),
    request_body = StartQuizRequest,
    responses(
        (status = 200, description = "Quiz started", body = StartQuizResponse),
        (status = 409, description = "A quiz is already in progress")
    )
)]
pub async fn start_quiz(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<StartQuizRequest>>,
) -> Result<Json<StartQuizResponse>, AppError> {
    Ok(Json(
        quiz_service::start_quiz(&state, &code, payload).await?,
    ))
}

/// Submit an answer for the current question.
#[utoipa::path(
    post,
    path = "/rooms/{code}/quiz/answer",
    tag = "quiz",
    params(("code" = String, Path, description = "Room share code")),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 200, description = "Answer recorded", body = SubmitAnswerResponse),
        (status = 409, description = "Stale question or duplicate answer")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<SubmitAnswerRequest>>,
) -> Result<Json<SubmitAnswerResponse>, AppError> {
    Ok(Json(
        quiz_service::submit_answer(&state, &code, payload).await?,
    ))
}

/// Advance to the next question; host-only.
#[utoipa::path(
    post,
    path = "/rooms/{code}/quiz/next",
    tag = "quiz",
    params(("code" = String, Path, description = "Room share code")),
    request_body = CallerRequest,
    responses(
        (status = 200, description = "Question advanced", body = NextQuestionResponse),
        (status = 409, description = "Already at the last question")
    )
)]
pub async fn next_question(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<CallerRequest>>,
) -> Result<Json<NextQuestionResponse>, AppError> {
    Ok(Json(
        quiz_service::next_question(&state, &code, &payload.user_id).await?,
    ))
}

/// End the quiz and return the final ranking; host-only.
#[utoipa::path(
    post,
    path = "/rooms/{code}/quiz/end",
    tag = "quiz",
    params(("code" = String, Path, description = "Room share code")),
    request_body = CallerRequest,
    responses((status = 200, description = "Quiz ended", body = EndQuizResponse))
)]
pub async fn end_quiz(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<CallerRequest>>,
) -> Result<Json<EndQuizResponse>, AppError> {
    Ok(Json(
        quiz_service::end_quiz(&state, &code, &payload.user_id).await?,
    ))
}

/// Current ranking, score descending with join-order ties.
#[utoipa::path(
    get,
    path = "/rooms/{code}/quiz/leaderboard",
    tag = "quiz",
    params(("code" = String, Path, description = "Room share code")),
    responses((status = 200, description = "Current ranking", body = LeaderboardResponse))
)]
pub async fn leaderboard(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    Ok(Json(quiz_service::leaderboard(&state, &code).await?))
}
