use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::{
    quiz::{AnswerOutcome, Quiz, QuizQuestion, QuizStatus},
    timer::{StudyTimer, TimerAction, TimerPhase},
};

/// Rejections produced by room mutations. Every variant is recoverable at the
/// call site: the offending mutation is refused and room state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    /// The room code does not resolve (or the room was deactivated).
    #[error("room not found")]
    RoomNotFound,
    /// The configured participant capacity would be exceeded.
    #[error("room is full (capacity {capacity})")]
    RoomFull {
        /// Capacity the room was configured with.
        capacity: usize,
    },
    /// The caller is not registered in the room.
    #[error("user `{user_id}` is not a participant of this room")]
    NotAParticipant {
        /// Identity of the rejected caller.
        user_id: String,
    },
    /// A host-only operation was attempted by somebody else, or a
    /// participant-scoped rule (original-sharer removal, host ready-toggle)
    /// denied the caller.
    #[error("caller is not authorized to perform this action")]
    NotAuthorized,
    /// A session needs at least one participant besides the host.
    #[error("at least {required} participants are required to start a session")]
    InsufficientParticipants {
        /// Minimum total participant count, host included.
        required: usize,
    },
    /// Some non-host participants have not toggled ready yet.
    #[error("{pending} participant(s) are not ready")]
    ParticipantsNotReady {
        /// How many participants still need to ready up.
        pending: usize,
    },
    /// A quiz is already in progress.
    #[error("a quiz is already in progress")]
    AlreadyActive,
    /// No quiz is accepting answers or advancement.
    #[error("no quiz is currently in progress")]
    QuizNotActive,
    /// Answer submitted for a question the host has advanced past.
    #[error("question {submitted} is closed (current question is {current})")]
    StaleQuestion {
        /// Index the answer was submitted for.
        submitted: usize,
        /// Index currently accepting answers.
        current: usize,
    },
    /// The participant already answered this question.
    #[error("user `{user_id}` already answered question {question_index}")]
    DuplicateAnswer {
        /// Identity of the submitter.
        user_id: String,
        /// Question index the duplicate targeted.
        question_index: usize,
    },
    /// The quiz is already on its final question.
    #[error("already at the last question")]
    AtLastQuestion,
    /// Referenced file id is not in the shared-files list.
    #[error("file `{file_id}` is not shared in this room")]
    FileNotFound {
        /// The unresolved file id.
        file_id: String,
    },
    /// Reviewer content was supplied while no document is broadcast.
    #[error("no document is currently broadcast")]
    NoDocumentSelected,
    /// The requested timer action is not valid in the current phase.
    #[error("timer action {action:?} is not valid while {phase:?}")]
    InvalidTimerAction {
        /// The rejected command.
        action: TimerAction,
        /// Phase the timer was in.
        phase: TimerPhase,
    },
    /// A quiz cannot start without questions.
    #[error("a quiz requires at least one question")]
    EmptyQuiz,
}

/// A member of the room. The host is seeded at creation and always counts as
/// ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Caller-supplied identity, unique within the room.
    pub user_id: String,
    /// Display name.
    pub username: String,
    /// Ready flag; meaningless for the host.
    pub ready: bool,
    /// When the participant first joined.
    pub joined_at: SystemTime,
}

/// How the broadcast document should be rendered by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Plain shared text.
    Raw,
    /// AI-reviewed derivative; content may still be in flight.
    Reviewer,
}

/// Reviewer derivative of the broadcast document; last write wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewerContent {
    /// Reviewed text body.
    pub text: String,
    /// Key points extracted from the text.
    pub key_points: Vec<String>,
}

/// The host-selected shared artifact replicated to all participants.
///
/// `view_mode == Reviewer` with `reviewer_content == None` is legal and means
/// generation is still in progress upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentDocument {
    /// File the broadcast points at; must be in `shared_files`.
    pub file_id: String,
    /// Rendering mode requested by the host.
    pub view_mode: ViewMode,
    /// Reviewer derivative, filled in separately once generated.
    pub reviewer_content: Option<ReviewerContent>,
}

/// Attribution for a shared file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedBy {
    /// Identity of the sharer.
    pub user_id: String,
    /// Display name of the sharer.
    pub username: String,
}

/// A file made available to the room, content included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedFile {
    /// Identifier assigned by the file collaborator.
    pub file_id: String,
    /// Original file name.
    pub file_name: String,
    /// MIME-ish type tag.
    pub file_type: String,
    /// Subject the file belongs to.
    pub subject: String,
    /// Raw text content, stored verbatim.
    pub file_content: String,
    /// Who shared it (governs removal rights).
    pub shared_by: SharedBy,
}

/// One chat entry; the log is append-only and server-stamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Identity of the sender.
    pub user_id: String,
    /// Display name of the sender.
    pub username: String,
    /// Message body.
    pub message: String,
    /// Server-side receive timestamp.
    pub sent_at: SystemTime,
}

/// Outcome of a `leave` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// A regular participant left.
    Left,
    /// The host left; the room was deactivated (auto-close, no succession).
    RoomDeactivated,
}

/// Root aggregate for a collaborative study session, keyed by a short
/// human-shareable code. The room store owns this exclusively; clients only
/// ever hold derived snapshot copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    /// Six-character share code.
    pub code: String,
    /// Identity of the creator; immutable for the room's lifetime.
    pub host_id: String,
    /// False once the host left or the room was closed.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last mutation timestamp.
    pub updated_at: SystemTime,
    /// Join-ordered participants, unique by user id.
    pub participants: IndexMap<String, Participant>,
    /// Shared group countdown.
    pub study_timer: StudyTimer,
    /// Host-selected broadcast document, if any.
    pub current_document: Option<CurrentDocument>,
    /// Files shared into the room, unique by file id, in share order.
    pub shared_files: IndexMap<String, SharedFile>,
    /// Append-only chat log.
    pub chat_messages: Vec<ChatMessage>,
    /// Embedded quiz; `None` until the first quiz starts.
    pub quiz: Option<Quiz>,
}

/// One leaderboard row; rows are ordered by score descending with ties broken
/// by room join order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    /// Identity of the participant.
    pub user_id: String,
    /// Display name captured at first answer.
    pub username: String,
    /// Final cumulative score.
    pub score: u32,
}

impl Room {
    /// Create a room with the host seeded as its first (always-ready)
    /// participant.
    pub fn new(code: String, host_id: String, host_name: String, now: SystemTime) -> Self {
        let mut participants = IndexMap::new();
        participants.insert(
            host_id.clone(),
            Participant {
                user_id: host_id.clone(),
                username: host_name,
                ready: true,
                joined_at: now,
            },
        );

        Self {
            code,
            host_id,
            is_active: true,
            created_at: now,
            updated_at: now,
            participants,
            study_timer: StudyTimer::default(),
            current_document: None,
            shared_files: IndexMap::new(),
            chat_messages: Vec::new(),
            quiz: None,
        }
    }

    /// The capability check gating every host-only operation.
    pub fn require_host(&self, caller: &str) -> Result<(), RoomError> {
        if self.host_id == caller {
            Ok(())
        } else {
            Err(RoomError::NotAuthorized)
        }
    }

    /// Resolve a caller to their participant entry.
    pub fn require_participant(&self, user_id: &str) -> Result<&Participant, RoomError> {
        self.participants
            .get(user_id)
            .ok_or_else(|| RoomError::NotAParticipant {
                user_id: user_id.to_owned(),
            })
    }

    /// Register a participant. Re-joining is a no-op success; returns whether
    /// the entry is new.
    pub fn join(
        &mut self,
        user_id: &str,
        username: &str,
        capacity: usize,
        now: SystemTime,
    ) -> Result<bool, RoomError> {
        if self.participants.contains_key(user_id) {
            return Ok(false);
        }

        if self.participants.len() >= capacity {
            return Err(RoomError::RoomFull { capacity });
        }

        self.participants.insert(
            user_id.to_owned(),
            Participant {
                user_id: user_id.to_owned(),
                username: username.to_owned(),
                ready: false,
                joined_at: now,
            },
        );
        Ok(true)
    }

    /// Remove a participant. Host departure deactivates the room.
    pub fn leave(&mut self, user_id: &str) -> Result<LeaveOutcome, RoomError> {
        if self.participants.shift_remove(user_id).is_none() {
            return Err(RoomError::NotAParticipant {
                user_id: user_id.to_owned(),
            });
        }

        if self.host_id == user_id {
            self.is_active = false;
            return Ok(LeaveOutcome::RoomDeactivated);
        }

        Ok(LeaveOutcome::Left)
    }

    /// Flip the ready flag of a non-host participant; returns the new value.
    pub fn toggle_ready(&mut self, user_id: &str) -> Result<bool, RoomError> {
        if self.host_id == user_id {
            // The host is excluded from the ready computation entirely.
            return Err(RoomError::NotAuthorized);
        }

        let participant =
            self.participants
                .get_mut(user_id)
                .ok_or_else(|| RoomError::NotAParticipant {
                    user_id: user_id.to_owned(),
                })?;
        participant.ready = !participant.ready;
        Ok(participant.ready)
    }

    /// Non-host participants in join order.
    pub fn non_host_participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants
            .values()
            .filter(|p| p.user_id != self.host_id)
    }

    /// Start the shared study session: host-only, requires at least
    /// `min_participants` members in total and every non-host member ready.
    pub fn start_session(
        &mut self,
        caller: &str,
        duration_secs: u64,
        min_participants: usize,
        now: SystemTime,
    ) -> Result<(), RoomError> {
        self.require_host(caller)?;

        if self.participants.len() < min_participants {
            return Err(RoomError::InsufficientParticipants {
                required: min_participants,
            });
        }

        let pending = self.non_host_participants().filter(|p| !p.ready).count();
        if pending > 0 {
            return Err(RoomError::ParticipantsNotReady { pending });
        }

        self.study_timer.start(duration_secs, now)
    }

    /// Apply a host-issued timer command. `Start` routes through the gated
    /// session-start path and requires a duration.
    pub fn control_timer(
        &mut self,
        caller: &str,
        action: TimerAction,
        duration_secs: Option<u64>,
        min_participants: usize,
        now: SystemTime,
    ) -> Result<(), RoomError> {
        self.require_host(caller)?;

        match action {
            TimerAction::Start => {
                let duration = duration_secs.unwrap_or(self.study_timer.duration_secs);
                self.start_session(caller, duration, min_participants, now)
            }
            TimerAction::Pause => self.study_timer.pause(now),
            TimerAction::Resume => self.study_timer.resume(now),
            TimerAction::Reset => {
                self.study_timer.reset();
                Ok(())
            }
        }
    }

    /// Share (or re-share, last-write-wins) a file into the room.
    pub fn share_file(&mut self, caller: &str, file: SharedFile) -> Result<(), RoomError> {
        self.require_participant(caller)?;

        match self.shared_files.get_mut(&file.file_id) {
            // Replace in place so the share-order position is preserved.
            Some(existing) => *existing = file,
            None => {
                self.shared_files.insert(file.file_id.clone(), file);
            }
        }
        Ok(())
    }

    /// Remove a shared file; allowed for the host or the original sharer.
    /// Removing the file currently broadcast also clears the broadcast.
    pub fn remove_shared_file(&mut self, caller: &str, file_id: &str) -> Result<(), RoomError> {
        let file = self
            .shared_files
            .get(file_id)
            .ok_or_else(|| RoomError::FileNotFound {
                file_id: file_id.to_owned(),
            })?;

        if self.host_id != caller && file.shared_by.user_id != caller {
            return Err(RoomError::NotAuthorized);
        }

        self.shared_files.shift_remove(file_id);
        if self
            .current_document
            .as_ref()
            .is_some_and(|doc| doc.file_id == file_id)
        {
            self.current_document = None;
        }
        Ok(())
    }

    /// Broadcast a shared file to all participants; host-only.
    pub fn set_document(
        &mut self,
        caller: &str,
        file_id: &str,
        view_mode: ViewMode,
    ) -> Result<(), RoomError> {
        self.require_host(caller)?;

        if !self.shared_files.contains_key(file_id) {
            return Err(RoomError::FileNotFound {
                file_id: file_id.to_owned(),
            });
        }

        self.current_document = Some(CurrentDocument {
            file_id: file_id.to_owned(),
            view_mode,
            reviewer_content: None,
        });
        Ok(())
    }

    /// Attach reviewer content to the broadcast document; last write wins.
    pub fn set_reviewer_content(
        &mut self,
        caller: &str,
        text: String,
        key_points: Vec<String>,
    ) -> Result<(), RoomError> {
        self.require_host(caller)?;

        let document = self
            .current_document
            .as_mut()
            .ok_or(RoomError::NoDocumentSelected)?;
        document.reviewer_content = Some(ReviewerContent { text, key_points });
        Ok(())
    }

    /// Stop broadcasting; host-only.
    pub fn clear_document(&mut self, caller: &str) -> Result<(), RoomError> {
        self.require_host(caller)?;
        self.current_document = None;
        Ok(())
    }

    /// Append a chat message with a server-side timestamp.
    pub fn push_chat(
        &mut self,
        user_id: &str,
        message: String,
        now: SystemTime,
    ) -> Result<(), RoomError> {
        let username = self.require_participant(user_id)?.username.clone();
        self.chat_messages.push(ChatMessage {
            user_id: user_id.to_owned(),
            username,
            message,
            sent_at: now,
        });
        Ok(())
    }

    /// Start a quiz; host-only, rejected while one is already in progress.
    /// A completed quiz is overwritten.
    pub fn start_quiz(
        &mut self,
        caller: &str,
        questions: Vec<QuizQuestion>,
        subject: String,
        test_type: String,
        now: SystemTime,
    ) -> Result<(), RoomError> {
        self.require_host(caller)?;

        if questions.is_empty() {
            return Err(RoomError::EmptyQuiz);
        }

        if self
            .quiz
            .as_ref()
            .is_some_and(|quiz| quiz.status == QuizStatus::InProgress)
        {
            return Err(RoomError::AlreadyActive);
        }

        self.quiz = Some(Quiz::start(questions, subject, test_type, now));
        Ok(())
    }

    /// Record a quiz answer on behalf of a participant.
    pub fn submit_quiz_answer(
        &mut self,
        user_id: &str,
        question_index: usize,
        selected_answer: usize,
        time_taken_ms: u64,
    ) -> Result<AnswerOutcome, RoomError> {
        let username = self.require_participant(user_id)?.username.clone();
        let quiz = self.quiz.as_mut().ok_or(RoomError::QuizNotActive)?;
        quiz.submit_answer(
            user_id,
            &username,
            question_index,
            selected_answer,
            time_taken_ms,
        )
    }

    /// Advance the quiz to the next question; host-only.
    pub fn next_quiz_question(&mut self, caller: &str) -> Result<usize, RoomError> {
        self.require_host(caller)?;
        let quiz = self.quiz.as_mut().ok_or(RoomError::QuizNotActive)?;
        quiz.next_question()
    }

    /// End the quiz; host-only.
    pub fn end_quiz(&mut self, caller: &str) -> Result<(), RoomError> {
        self.require_host(caller)?;
        let quiz = self.quiz.as_mut().ok_or(RoomError::QuizNotActive)?;
        quiz.end()
    }

    /// Rank quiz participants by score descending; equal scores keep room
    /// join order (participants who left rank after current members, in
    /// answer order). Deterministic, never randomized.
    pub fn leaderboard(&self) -> Vec<LeaderboardRow> {
        let Some(quiz) = self.quiz.as_ref() else {
            return Vec::new();
        };

        let mut rows: Vec<(usize, LeaderboardRow)> = quiz
            .participant_answers
            .iter()
            .map(|entry| {
                let join_index = self
                    .participants
                    .get_index_of(entry.user_id.as_str())
                    .unwrap_or(usize::MAX);
                (
                    join_index,
                    LeaderboardRow {
                        user_id: entry.user_id.clone(),
                        username: entry.username.clone(),
                        score: entry.score,
                    },
                )
            })
            .collect();

        rows.sort_by(|(a_join, a), (b_join, b)| {
            b.score.cmp(&a.score).then(a_join.cmp(b_join))
        });
        rows.into_iter().map(|(_, row)| row).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;

    const CAPACITY: usize = 10;
    const MIN_PARTICIPANTS: usize = 2;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn room_with_host() -> Room {
        Room::new("ABC123".into(), "host".into(), "Hana".into(), at(0))
    }

    fn sample_file(id: &str, sharer: &str) -> SharedFile {
        SharedFile {
            file_id: id.into(),
            file_name: format!("{id}.txt"),
            file_type: "text/plain".into(),
            subject: "biology".into(),
            file_content: "mitochondria".into(),
            shared_by: SharedBy {
                user_id: sharer.into(),
                username: sharer.into(),
            },
        }
    }

    fn questions(count: usize) -> Vec<QuizQuestion> {
        (0..count)
            .map(|i| QuizQuestion {
                question: format!("q{i}"),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_answer: 2,
                explanation: None,
            })
            .collect()
    }

    #[test]
    fn join_is_idempotent() {
        let mut room = room_with_host();
        assert!(room.join("p1", "Priya", CAPACITY, at(1)).unwrap());
        assert!(!room.join("p1", "Priya", CAPACITY, at(2)).unwrap());
        assert_eq!(
            room.participants.values().filter(|p| p.user_id == "p1").count(),
            1
        );
        // The original join timestamp is preserved.
        assert_eq!(room.participants["p1"].joined_at, at(1));
    }

    #[test]
    fn join_respects_capacity() {
        let mut room = room_with_host();
        room.join("p1", "Priya", 2, at(1)).unwrap();
        assert!(matches!(
            room.join("p2", "Marek", 2, at(2)),
            Err(RoomError::RoomFull { capacity: 2 })
        ));
        // A returning member still gets a no-op success at capacity.
        assert!(!room.join("p1", "Priya", 2, at(3)).unwrap());
    }

    #[test]
    fn host_leaving_deactivates_the_room() {
        let mut room = room_with_host();
        room.join("p1", "Priya", CAPACITY, at(1)).unwrap();

        assert_eq!(room.leave("p1").unwrap(), LeaveOutcome::Left);
        assert!(room.is_active);

        assert_eq!(room.leave("host").unwrap(), LeaveOutcome::RoomDeactivated);
        assert!(!room.is_active);
    }

    #[test]
    fn host_cannot_toggle_ready() {
        let mut room = room_with_host();
        assert!(matches!(
            room.toggle_ready("host"),
            Err(RoomError::NotAuthorized)
        ));
        assert!(matches!(
            room.toggle_ready("stranger"),
            Err(RoomError::NotAParticipant { .. })
        ));
    }

    #[test]
    fn session_start_requires_everyone_ready() {
        let mut room = room_with_host();
        assert!(matches!(
            room.start_session("host", 1500, MIN_PARTICIPANTS, at(1)),
            Err(RoomError::InsufficientParticipants { required: 2 })
        ));

        room.join("p1", "Priya", CAPACITY, at(1)).unwrap();
        room.join("p2", "Marek", CAPACITY, at(2)).unwrap();
        assert!(room.toggle_ready("p1").unwrap());

        assert!(matches!(
            room.start_session("host", 1500, MIN_PARTICIPANTS, at(3)),
            Err(RoomError::ParticipantsNotReady { pending: 1 })
        ));

        assert!(room.toggle_ready("p2").unwrap());
        room.start_session("host", 1500, MIN_PARTICIPANTS, at(4))
            .unwrap();
        assert!(room.study_timer.is_running);
        assert_eq!(room.study_timer.duration_secs, 1500);
        assert_eq!(room.study_timer.time_remaining_secs, 1500);
    }

    #[test]
    fn session_start_is_host_only() {
        let mut room = room_with_host();
        room.join("p1", "Priya", CAPACITY, at(1)).unwrap();
        assert!(matches!(
            room.start_session("p1", 60, MIN_PARTICIPANTS, at(2)),
            Err(RoomError::NotAuthorized)
        ));
        assert!(matches!(
            room.control_timer("p1", TimerAction::Pause, None, MIN_PARTICIPANTS, at(2)),
            Err(RoomError::NotAuthorized)
        ));
    }

    #[test]
    fn file_removal_requires_host_or_sharer() {
        let mut room = room_with_host();
        room.join("p1", "Priya", CAPACITY, at(1)).unwrap();
        room.join("p2", "Marek", CAPACITY, at(2)).unwrap();
        room.share_file("p1", sample_file("f1", "p1")).unwrap();

        assert!(matches!(
            room.remove_shared_file("p2", "f1"),
            Err(RoomError::NotAuthorized)
        ));
        room.remove_shared_file("p1", "f1").unwrap();

        room.share_file("p1", sample_file("f2", "p1")).unwrap();
        room.remove_shared_file("host", "f2").unwrap();
        assert!(room.shared_files.is_empty());
    }

    #[test]
    fn removing_broadcast_file_clears_document() {
        let mut room = room_with_host();
        room.join("p1", "Priya", CAPACITY, at(1)).unwrap();
        room.share_file("p1", sample_file("f1", "p1")).unwrap();
        room.set_document("host", "f1", ViewMode::Raw).unwrap();

        room.remove_shared_file("host", "f1").unwrap();
        assert!(room.current_document.is_none());
    }

    #[test]
    fn reviewer_mode_without_content_signals_generation_in_progress() {
        let mut room = room_with_host();
        room.join("p1", "Priya", CAPACITY, at(1)).unwrap();
        room.share_file("p1", sample_file("f1", "p1")).unwrap();

        room.set_document("host", "f1", ViewMode::Reviewer).unwrap();
        let doc = room.current_document.as_ref().unwrap();
        assert_eq!(doc.view_mode, ViewMode::Reviewer);
        assert!(doc.reviewer_content.is_none());

        room.set_reviewer_content("host", "summary".into(), vec!["one".into()])
            .unwrap();
        let doc = room.current_document.as_ref().unwrap();
        assert_eq!(doc.reviewer_content.as_ref().unwrap().text, "summary");

        // Last write wins, no merge.
        room.set_reviewer_content("host", "rewrite".into(), Vec::new())
            .unwrap();
        let doc = room.current_document.as_ref().unwrap();
        assert_eq!(doc.reviewer_content.as_ref().unwrap().text, "rewrite");
        assert!(doc.reviewer_content.as_ref().unwrap().key_points.is_empty());
    }

    #[test]
    fn set_document_requires_shared_file() {
        let mut room = room_with_host();
        assert!(matches!(
            room.set_document("host", "ghost", ViewMode::Raw),
            Err(RoomError::FileNotFound { .. })
        ));
        assert!(matches!(
            room.set_reviewer_content("host", "text".into(), Vec::new()),
            Err(RoomError::NoDocumentSelected)
        ));
    }

    #[test]
    fn chat_is_append_only_and_participant_scoped() {
        let mut room = room_with_host();
        room.join("p1", "Priya", CAPACITY, at(1)).unwrap();

        room.push_chat("p1", "hello".into(), at(2)).unwrap();
        room.push_chat("host", "hi".into(), at(3)).unwrap();
        assert!(matches!(
            room.push_chat("stranger", "boo".into(), at(4)),
            Err(RoomError::NotAParticipant { .. })
        ));

        let bodies: Vec<_> = room.chat_messages.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(bodies, ["hello", "hi"]);
    }

    #[test]
    fn quiz_restart_overwrites_completed_but_not_running() {
        let mut room = room_with_host();
        room.start_quiz("host", questions(2), "bio".into(), "mc".into(), at(1))
            .unwrap();
        assert!(matches!(
            room.start_quiz("host", questions(2), "bio".into(), "mc".into(), at(2)),
            Err(RoomError::AlreadyActive)
        ));

        room.end_quiz("host").unwrap();
        room.start_quiz("host", questions(3), "bio".into(), "mc".into(), at(3))
            .unwrap();
        assert_eq!(room.quiz.as_ref().unwrap().questions.len(), 3);
    }

    #[test]
    fn full_session_scenario() {
        let mut room = room_with_host();
        room.join("p1", "Priya", CAPACITY, at(1)).unwrap();
        room.join("p2", "Marek", CAPACITY, at(2)).unwrap();
        room.toggle_ready("p1").unwrap();
        room.toggle_ready("p2").unwrap();

        room.start_session("host", 1500, MIN_PARTICIPANTS, at(3))
            .unwrap();
        assert!(room.study_timer.is_running);
        assert_eq!(room.study_timer.remaining_at(at(3)), 1500);

        room.start_quiz("host", questions(3), "bio".into(), "mc".into(), at(4))
            .unwrap();

        let p1 = room.submit_quiz_answer("p1", 0, 2, 3_000).unwrap();
        assert!(p1.is_correct);
        assert_eq!(p1.score, 1);

        let p2 = room.submit_quiz_answer("p2", 0, 0, 5_000).unwrap();
        assert!(!p2.is_correct);
        assert_eq!(p2.score, 0);

        assert_eq!(room.next_quiz_question("host").unwrap(), 1);

        let rows = room.leaderboard();
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].user_id.as_str(), rows[0].score), ("p1", 1));
        assert_eq!((rows[1].user_id.as_str(), rows[1].score), ("p2", 0));
    }

    #[test]
    fn leaderboard_ties_keep_join_order() {
        let mut room = room_with_host();
        room.join("p1", "Priya", CAPACITY, at(1)).unwrap();
        room.join("p2", "Marek", CAPACITY, at(2)).unwrap();
        room.start_quiz("host", questions(1), "bio".into(), "mc".into(), at(3))
            .unwrap();

        // p2 answers first, but both end on equal scores; join order decides.
        room.submit_quiz_answer("p2", 0, 2, 1_000).unwrap();
        room.submit_quiz_answer("p1", 0, 2, 2_000).unwrap();

        let rows = room.leaderboard();
        assert_eq!(rows[0].user_id, "p1");
        assert_eq!(rows[1].user_id, "p2");
    }
}
