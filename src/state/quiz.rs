use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::room::RoomError;

/// Lifecycle of a quiz embedded in a room.
///
/// `Waiting` exists for upstream lobby flows that gather participants before
/// the host presses start; this engine never enters it and goes straight to
/// `InProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuizStatus {
    /// Reserved for an upstream join lobby.
    Waiting,
    /// Host is driving the question sequence.
    InProgress,
    /// Quiz was ended; scores remain readable until overwritten.
    Completed,
}

/// A single question, immutable once the quiz starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    /// Prompt shown to participants.
    pub question: String,
    /// Answer options, indexed from zero.
    pub options: Vec<String>,
    /// Index into `options` identifying the correct answer.
    pub correct_answer: usize,
    /// Optional explanation revealed alongside results.
    pub explanation: Option<String>,
}

/// One recorded answer for a `(participant, question)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    /// Question the answer was submitted for.
    pub question_index: usize,
    /// Option the participant selected.
    pub selected_answer: usize,
    /// Time the participant took, in milliseconds (client-reported).
    pub time_taken_ms: u64,
    /// Whether the selection matched the correct answer.
    pub is_correct: bool,
}

/// Per-participant tally; one entry per participant who answered at least once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantScore {
    /// Identity of the answering participant.
    pub user_id: String,
    /// Display name captured at first answer.
    pub username: String,
    /// Cumulative score (one point per correct answer).
    pub score: u32,
    /// Answers in submission order; at most one per question index.
    pub answers: Vec<AnswerRecord>,
}

/// Result handed back to the submitter after a successful answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    /// Whether the submitted option was correct.
    pub is_correct: bool,
    /// Updated cumulative score for the participant.
    pub score: u32,
}

/// Host-orchestrated quiz state embedded in the room aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    /// Stable identifier for this quiz run.
    pub id: Uuid,
    /// Subject the questions were generated from.
    pub subject: String,
    /// Kind of test (e.g. multiple-choice practice), caller-defined.
    pub test_type: String,
    /// Whether the quiz currently accepts answers or advancement.
    pub is_active: bool,
    /// Lifecycle status.
    pub status: QuizStatus,
    /// Question sequence, frozen at start.
    pub questions: Vec<QuizQuestion>,
    /// Index of the question currently accepting answers; only ever advances.
    pub current_question_index: usize,
    /// Tallies for every participant who answered at least one question.
    pub participant_answers: Vec<ParticipantScore>,
    /// When the host started the quiz.
    pub started_at: SystemTime,
}

impl Quiz {
    /// Freeze the question set and enter `InProgress` at question zero.
    pub fn start(
        questions: Vec<QuizQuestion>,
        subject: String,
        test_type: String,
        now: SystemTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject,
            test_type,
            is_active: true,
            status: QuizStatus::InProgress,
            questions,
            current_question_index: 0,
            participant_answers: Vec::new(),
            started_at: now,
        }
    }

    /// Record an answer for the current question.
    ///
    /// Rejections, in order: the quiz is not in progress (`QuizNotActive`),
    /// the index is not the current question (`StaleQuestion`), or the
    /// participant already answered it (`DuplicateAnswer`). Retried network
    /// calls therefore can never double-score.
    pub fn submit_answer(
        &mut self,
        user_id: &str,
        username: &str,
        question_index: usize,
        selected_answer: usize,
        time_taken_ms: u64,
    ) -> Result<AnswerOutcome, RoomError> {
        if self.status != QuizStatus::InProgress {
            return Err(RoomError::QuizNotActive);
        }

        if question_index != self.current_question_index {
            return Err(RoomError::StaleQuestion {
                submitted: question_index,
                current: self.current_question_index,
            });
        }

        let entry = match self
            .participant_answers
            .iter_mut()
            .position(|p| p.user_id == user_id)
        {
            Some(index) => &mut self.participant_answers[index],
            None => {
                self.participant_answers.push(ParticipantScore {
                    user_id: user_id.to_owned(),
                    username: username.to_owned(),
                    score: 0,
                    answers: Vec::new(),
                });
                self.participant_answers
                    .last_mut()
                    .expect("entry pushed above")
            }
        };

        if entry
            .answers
            .iter()
            .any(|a| a.question_index == question_index)
        {
            return Err(RoomError::DuplicateAnswer {
                user_id: user_id.to_owned(),
                question_index,
            });
        }

        let is_correct = self.questions[question_index].correct_answer == selected_answer;
        entry.answers.push(AnswerRecord {
            question_index,
            selected_answer,
            time_taken_ms,
            is_correct,
        });
        if is_correct {
            entry.score += 1;
        }

        Ok(AnswerOutcome {
            is_correct,
            score: entry.score,
        })
    }

    /// Advance to the next question; the only path by which the index moves.
    pub fn next_question(&mut self) -> Result<usize, RoomError> {
        if self.status != QuizStatus::InProgress {
            return Err(RoomError::QuizNotActive);
        }

        if self.current_question_index + 1 >= self.questions.len() {
            return Err(RoomError::AtLastQuestion);
        }

        self.current_question_index += 1;
        Ok(self.current_question_index)
    }

    /// Close the quiz; final scores stay readable until a new quiz overwrites
    /// this one or the room is destroyed.
    pub fn end(&mut self) -> Result<(), RoomError> {
        if self.status != QuizStatus::InProgress {
            return Err(RoomError::QuizNotActive);
        }

        self.status = QuizStatus::Completed;
        self.is_active = false;
        Ok(())
    }

    /// Cumulative score for a participant, zero when they never answered.
    pub fn score_of(&self, user_id: &str) -> u32 {
        self.participant_answers
            .iter()
            .find(|p| p.user_id == user_id)
            .map(|p| p.score)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use std::time::UNIX_EPOCH;

    use super::*;

    fn three_questions() -> Vec<QuizQuestion> {
        (0..3)
            .map(|i| QuizQuestion {
                question: format!("question {i}"),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_answer: 1,
                explanation: None,
            })
            .collect()
    }

    fn started_quiz() -> Quiz {
        Quiz::start(
            three_questions(),
            "biology".into(),
            "multiple-choice".into(),
            UNIX_EPOCH,
        )
    }

    #[test]
    fn start_enters_in_progress_at_question_zero() {
        let quiz = started_quiz();
        assert!(quiz.is_active);
        assert_eq!(quiz.status, QuizStatus::InProgress);
        assert_eq!(quiz.current_question_index, 0);
        assert!(quiz.participant_answers.is_empty());
    }

    #[test]
    fn correct_answer_scores_one_point() {
        let mut quiz = started_quiz();
        let outcome = quiz.submit_answer("p1", "Priya", 0, 1, 4_200).unwrap();
        assert!(outcome.is_correct);
        assert_eq!(outcome.score, 1);

        let outcome = quiz.submit_answer("p2", "Marek", 0, 3, 2_000).unwrap();
        assert!(!outcome.is_correct);
        assert_eq!(outcome.score, 0);
    }

    #[test]
    fn duplicate_answer_is_rejected_and_score_unchanged() {
        let mut quiz = started_quiz();
        let first = quiz.submit_answer("p1", "Priya", 0, 1, 4_200).unwrap();
        assert_eq!(first.score, 1);

        let err = quiz.submit_answer("p1", "Priya", 0, 1, 4_200).unwrap_err();
        assert!(matches!(err, RoomError::DuplicateAnswer { question_index: 0, .. }));
        assert_eq!(quiz.score_of("p1"), 1);
        assert_eq!(quiz.participant_answers[0].answers.len(), 1);
    }

    #[test]
    fn stale_submission_is_rejected_regardless_of_correctness() {
        let mut quiz = started_quiz();
        quiz.next_question().unwrap();

        let err = quiz.submit_answer("p1", "Priya", 0, 1, 1_000).unwrap_err();
        assert!(matches!(
            err,
            RoomError::StaleQuestion {
                submitted: 0,
                current: 1,
            }
        ));
        assert_eq!(quiz.score_of("p1"), 0);
    }

    #[test]
    fn next_question_stops_at_last_index() {
        let mut quiz = started_quiz();
        assert_eq!(quiz.next_question().unwrap(), 1);
        assert_eq!(quiz.next_question().unwrap(), 2);
        assert!(matches!(
            quiz.next_question().unwrap_err(),
            RoomError::AtLastQuestion
        ));
        assert_eq!(quiz.current_question_index, 2);
    }

    #[test]
    fn ended_quiz_rejects_answers_but_keeps_scores() {
        let mut quiz = started_quiz();
        quiz.submit_answer("p1", "Priya", 0, 1, 900).unwrap();
        quiz.end().unwrap();

        assert_eq!(quiz.status, QuizStatus::Completed);
        assert!(!quiz.is_active);
        assert!(matches!(
            quiz.submit_answer("p2", "Marek", 0, 1, 900).unwrap_err(),
            RoomError::QuizNotActive
        ));
        assert_eq!(quiz.score_of("p1"), 1);
    }

    #[test]
    fn out_of_range_selection_is_scored_as_incorrect() {
        let mut quiz = started_quiz();
        let outcome = quiz.submit_answer("p1", "Priya", 0, 17, 900).unwrap();
        assert!(!outcome.is_correct);
        assert_eq!(outcome.score, 0);
    }
}
