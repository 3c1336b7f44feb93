//! Host-orchestrated quiz lifecycle, answer submission, and the leaderboard.

use tracing::info;

use crate::{
    dto::quiz::{
        EndQuizResponse, LeaderboardResponse, NextQuestionResponse, QuizSnapshot,
        StartQuizRequest, StartQuizResponse, SubmitAnswerRequest, SubmitAnswerResponse,
        leaderboard_entries,
    },
    error::ServiceError,
    services::room_service::{load_room, mutate_room},
    state::{SharedState, quiz::QuizQuestion},
};

/// Start a quiz from a pre-generated question set; host-only.
///
/// Question generation happens upstream (an AI collaborator invoked by the
/// host's client); this engine only ever receives the finished questions.
pub async fn start_quiz(
    state: &SharedState,
    code: &str,
    request: StartQuizRequest,
) -> Result<StartQuizResponse, ServiceError> {
    let questions: Vec<QuizQuestion> = request
        .questions
        .iter()
        .map(|q| QuizQuestion {
            question: q.question.clone(),
            options: q.options.clone(),
            correct_answer: q.correct_answer,
            explanation: q.explanation.clone(),
        })
        .collect();
    let question_count = questions.len();

    let ((), room) = mutate_room(state, code, |room, now| {
        room.start_quiz(
            &request.user_id,
            questions,
            request.subject.clone(),
            request.test_type.clone(),
            now,
        )
    })
    .await?;

    info!(
        room = %room.code,
        questions = question_count,
        subject = %request.subject,
        "quiz started"
    );

    let quiz = room
        .quiz
        .as_ref()
        .ok_or_else(|| ServiceError::Internal("quiz missing after start".into()))?;
    Ok(StartQuizResponse {
        success: true,
        quiz: QuizSnapshot::from(quiz),
    })
}

/// Record an answer for the current question on behalf of a participant.
pub async fn submit_answer(
    state: &SharedState,
    code: &str,
    request: SubmitAnswerRequest,
) -> Result<SubmitAnswerResponse, ServiceError> {
    let (outcome, _room) = mutate_room(state, code, |room, _now| {
        room.submit_quiz_answer(
            &request.user_id,
            request.question_index,
            request.selected_answer,
            request.time_taken_ms,
        )
    })
    .await?;

    Ok(SubmitAnswerResponse {
        success: true,
        is_correct: outcome.is_correct,
        score: outcome.score,
    })
}

/// Advance to the next question; host-only.
pub async fn next_question(
    state: &SharedState,
    code: &str,
    user_id: &str,
) -> Result<NextQuestionResponse, ServiceError> {
    let (current_question_index, room) =
        mutate_room(state, code, |room, _now| room.next_quiz_question(user_id)).await?;

    info!(room = %room.code, index = current_question_index, "quiz advanced");
    Ok(NextQuestionResponse {
        success: true,
        current_question_index,
    })
}

/// End the quiz and return the final ranking; host-only.
pub async fn end_quiz(
    state: &SharedState,
    code: &str,
    user_id: &str,
) -> Result<EndQuizResponse, ServiceError> {
    let ((), room) = mutate_room(state, code, |room, _now| room.end_quiz(user_id)).await?;

    info!(room = %room.code, "quiz ended");
    Ok(EndQuizResponse {
        success: true,
        leaderboard: leaderboard_entries(room.leaderboard()),
    })
}

/// Current ranking; empty when no quiz ever ran.
pub async fn leaderboard(
    state: &SharedState,
    code: &str,
) -> Result<LeaderboardResponse, ServiceError> {
    let room = load_room(state, code).await?;
    Ok(LeaderboardResponse {
        entries: leaderboard_entries(room.leaderboard()),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::room_store::memory::MemoryRoomStore,
        dto::{
            quiz::QuizQuestionInput,
            room::{CreateRoomRequest, JoinRoomRequest},
        },
        services::room_service,
        state::{AppState, room::RoomError},
    };

    fn question(correct: usize) -> QuizQuestionInput {
        QuizQuestionInput {
            question: "which?".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: correct,
            explanation: None,
        }
    }

    async fn room_with_two_participants() -> (SharedState, String) {
        let state = AppState::new(AppConfig::default());
        state
            .install_room_store(Arc::new(MemoryRoomStore::new()))
            .await;
        let created = room_service::create_room(
            &state,
            CreateRoomRequest {
                user_id: "host".into(),
                username: "Hana".into(),
            },
        )
        .await
        .unwrap();
        let code = created.room.code;
        for (id, name) in [("p1", "Priya"), ("p2", "Marek")] {
            room_service::join_room(
                &state,
                &code,
                JoinRoomRequest {
                    user_id: id.into(),
                    username: name.into(),
                },
            )
            .await
            .unwrap();
        }
        (state, code)
    }

    #[tokio::test]
    async fn quiz_round_trip_with_leaderboard() {
        let (state, code) = room_with_two_participants().await;

        start_quiz(
            &state,
            &code,
            StartQuizRequest {
                user_id: "host".into(),
                subject: "biology".into(),
                test_type: "multiple-choice".into(),
                questions: vec![question(1), question(1), question(1)],
            },
        )
        .await
        .unwrap();

        let p1 = submit_answer(
            &state,
            &code,
            SubmitAnswerRequest {
                user_id: "p1".into(),
                question_index: 0,
                selected_answer: 1,
                time_taken_ms: 3_000,
            },
        )
        .await
        .unwrap();
        assert!(p1.is_correct);
        assert_eq!(p1.score, 1);

        // Retried network call: rejected, score unchanged.
        let dup = submit_answer(
            &state,
            &code,
            SubmitAnswerRequest {
                user_id: "p1".into(),
                question_index: 0,
                selected_answer: 1,
                time_taken_ms: 3_000,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            dup,
            ServiceError::Room(RoomError::DuplicateAnswer { .. })
        ));

        let p2 = submit_answer(
            &state,
            &code,
            SubmitAnswerRequest {
                user_id: "p2".into(),
                question_index: 0,
                selected_answer: 3,
                time_taken_ms: 5_000,
            },
        )
        .await
        .unwrap();
        assert!(!p2.is_correct);

        let advanced = next_question(&state, &code, "host").await.unwrap();
        assert_eq!(advanced.current_question_index, 1);

        // Late submission for the previous question.
        let stale = submit_answer(
            &state,
            &code,
            SubmitAnswerRequest {
                user_id: "p2".into(),
                question_index: 0,
                selected_answer: 1,
                time_taken_ms: 500,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            stale,
            ServiceError::Room(RoomError::StaleQuestion { .. })
        ));

        let ranking = leaderboard(&state, &code).await.unwrap();
        assert_eq!(ranking.entries.len(), 2);
        assert_eq!(ranking.entries[0].user_id, "p1");
        assert_eq!(ranking.entries[0].rank, 1);
        assert_eq!(ranking.entries[1].user_id, "p2");

        let ended = end_quiz(&state, &code, "host").await.unwrap();
        assert_eq!(ended.leaderboard.len(), 2);
    }

    #[tokio::test]
    async fn quiz_lifecycle_is_host_only() {
        let (state, code) = room_with_two_participants().await;

        let err = start_quiz(
            &state,
            &code,
            StartQuizRequest {
                user_id: "p1".into(),
                subject: "bio".into(),
                test_type: "mc".into(),
                questions: vec![question(0)],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Room(RoomError::NotAuthorized)));

        let err = next_question(&state, &code, "p1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Room(RoomError::NotAuthorized)));
    }
}
