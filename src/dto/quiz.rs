use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dto::format_system_time,
    state::{
        quiz::{AnswerRecord, ParticipantScore, Quiz, QuizQuestion, QuizStatus},
        room::LeaderboardRow,
    },
};

/// Incoming question definition for a quiz start.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuizQuestionInput {
    /// Prompt shown to participants.
    pub question: String,
    /// Answer options; at least two.
    pub options: Vec<String>,
    /// Index into `options` identifying the correct answer.
    pub correct_answer: usize,
    /// Optional explanation revealed alongside results.
    #[serde(default)]
    pub explanation: Option<String>,
}

impl Validate for QuizQuestionInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.question.trim().is_empty() {
            errors.add("question", ValidationError::new("question_empty"));
        }

        if self.options.len() < 2 {
            let mut err = ValidationError::new("options_count");
            err.message = Some("A question needs at least two options".into());
            errors.add("options", err);
        }

        if self.correct_answer >= self.options.len() {
            let mut err = ValidationError::new("correct_answer_range");
            err.message = Some("correct_answer must index into options".into());
            errors.add("correct_answer", err);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Host request starting a quiz with a pre-generated question set.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct StartQuizRequest {
    /// Identity of the caller; must be the host.
    #[validate(custom(function = crate::dto::validation::validate_user_id))]
    pub user_id: String,
    /// Subject the questions were generated from.
    pub subject: String,
    /// Kind of test, caller-defined.
    pub test_type: String,
    /// Question sequence; frozen once the quiz starts.
    #[validate(length(min = 1), nested)]
    pub questions: Vec<QuizQuestionInput>,
}

/// Participant answer submission.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitAnswerRequest {
    /// Identity of the submitter.
    #[validate(custom(function = crate::dto::validation::validate_user_id))]
    pub user_id: String,
    /// Question the answer targets; must be the current question.
    pub question_index: usize,
    /// Selected option index.
    pub selected_answer: usize,
    /// Client-reported answer time in milliseconds.
    pub time_taken_ms: u64,
}

/// Quiz lifecycle status as serialized to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum QuizStatusDto {
    /// Reserved for an upstream join lobby.
    Waiting,
    /// Host is driving the question sequence.
    InProgress,
    /// Quiz has ended; scores remain readable.
    Completed,
}

impl From<QuizStatus> for QuizStatusDto {
    fn from(value: QuizStatus) -> Self {
        match value {
            QuizStatus::Waiting => QuizStatusDto::Waiting,
            QuizStatus::InProgress => QuizStatusDto::InProgress,
            QuizStatus::Completed => QuizStatusDto::Completed,
        }
    }
}

/// Projection of a quiz question inside the room snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuizQuestionSummary {
    /// Prompt shown to participants.
    pub question: String,
    /// Answer options.
    pub options: Vec<String>,
    /// Correct option index.
    pub correct_answer: usize,
    /// Optional explanation.
    pub explanation: Option<String>,
}

impl From<&QuizQuestion> for QuizQuestionSummary {
    fn from(value: &QuizQuestion) -> Self {
        Self {
            question: value.question.clone(),
            options: value.options.clone(),
            correct_answer: value.correct_answer,
            explanation: value.explanation.clone(),
        }
    }
}

/// Projection of one recorded answer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnswerRecordSummary {
    /// Question the answer was submitted for.
    pub question_index: usize,
    /// Option the participant selected.
    pub selected_answer: usize,
    /// Client-reported answer time in milliseconds.
    pub time_taken_ms: u64,
    /// Whether the selection was correct.
    pub is_correct: bool,
}

impl From<&AnswerRecord> for AnswerRecordSummary {
    fn from(value: &AnswerRecord) -> Self {
        Self {
            question_index: value.question_index,
            selected_answer: value.selected_answer,
            time_taken_ms: value.time_taken_ms,
            is_correct: value.is_correct,
        }
    }
}

/// Projection of a participant's quiz tally.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParticipantScoreSummary {
    /// Identity of the participant.
    pub user_id: String,
    /// Display name captured at first answer.
    pub username: String,
    /// Cumulative score.
    pub score: u32,
    /// Recorded answers in submission order.
    pub answers: Vec<AnswerRecordSummary>,
}

impl From<&ParticipantScore> for ParticipantScoreSummary {
    fn from(value: &ParticipantScore) -> Self {
        Self {
            user_id: value.user_id.clone(),
            username: value.username.clone(),
            score: value.score,
            answers: value.answers.iter().map(Into::into).collect(),
        }
    }
}

/// Projection of the embedded quiz inside the room snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuizSnapshot {
    /// Stable identifier for this quiz run.
    pub id: Uuid,
    /// Subject the questions were generated from.
    pub subject: String,
    /// Kind of test, caller-defined.
    pub test_type: String,
    /// Whether the quiz currently accepts answers.
    pub is_active: bool,
    /// Lifecycle status.
    pub status: QuizStatusDto,
    /// Index of the question currently accepting answers.
    pub current_question_index: usize,
    /// Frozen question sequence.
    pub questions: Vec<QuizQuestionSummary>,
    /// Tallies for participants who answered at least once.
    pub participant_answers: Vec<ParticipantScoreSummary>,
    /// RFC3339 start timestamp.
    pub started_at: String,
}

impl From<&Quiz> for QuizSnapshot {
    fn from(value: &Quiz) -> Self {
        Self {
            id: value.id,
            subject: value.subject.clone(),
            test_type: value.test_type.clone(),
            is_active: value.is_active,
            status: value.status.into(),
            current_question_index: value.current_question_index,
            questions: value.questions.iter().map(Into::into).collect(),
            participant_answers: value.participant_answers.iter().map(Into::into).collect(),
            started_at: format_system_time(value.started_at),
        }
    }
}

/// One leaderboard row; the list is ordered by score descending with ties in
/// room join order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardEntry {
    /// One-based rank.
    pub rank: usize,
    /// Identity of the participant.
    pub user_id: String,
    /// Display name.
    pub username: String,
    /// Final cumulative score.
    pub score: u32,
}

/// Build ranked entries from ordered leaderboard rows.
pub fn leaderboard_entries(rows: Vec<LeaderboardRow>) -> Vec<LeaderboardEntry> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| LeaderboardEntry {
            rank: index + 1,
            user_id: row.user_id,
            username: row.username,
            score: row.score,
        })
        .collect()
}

/// Response returned when a quiz starts.
#[derive(Debug, Serialize, ToSchema)]
pub struct StartQuizResponse {
    /// Always true on success.
    pub success: bool,
    /// Snapshot of the freshly started quiz.
    pub quiz: QuizSnapshot,
}

/// Response returned after a successful answer submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitAnswerResponse {
    /// Always true on success.
    pub success: bool,
    /// Whether the submitted option was correct.
    pub is_correct: bool,
    /// Updated cumulative score for the submitter.
    pub score: u32,
}

/// Response returned after advancing the question index.
#[derive(Debug, Serialize, ToSchema)]
pub struct NextQuestionResponse {
    /// Always true on success.
    pub success: bool,
    /// Index now accepting answers.
    pub current_question_index: usize,
}

/// Response returned when the host ends the quiz.
#[derive(Debug, Serialize, ToSchema)]
pub struct EndQuizResponse {
    /// Always true on success.
    pub success: bool,
    /// Final ranking.
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Read-only leaderboard projection.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    /// Ranked entries, best first.
    pub entries: Vec<LeaderboardEntry>,
}
