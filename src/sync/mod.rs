//! Conforming poll-client adapter.
//!
//! There is no push transport: clients fetch the full room snapshot on a
//! fixed interval and rebuild every piece of derived state from it, so a
//! client that missed any number of polls self-heals on the next successful
//! one. The only mutation a poll may trigger is the auto-join below.

use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use thiserror::Error;
use tracing::warn;

use crate::dto::room::{DocumentSnapshot, RoomSnapshot};

/// Fixed room snapshot poll interval.
pub const ROOM_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Poll interval for auxiliary notification feeds.
pub const NOTIFICATION_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Failures surfaced by a snapshot source.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The snapshot read failed.
    #[error("snapshot fetch failed: {0}")]
    Fetch(String),
    /// The auto-join mutation failed.
    #[error("join failed: {0}")]
    Join(String),
    /// The room no longer exists.
    #[error("room not found")]
    RoomGone,
}

/// Transport abstraction a conforming client polls through.
pub trait SnapshotSource: Send + Sync {
    /// Read the full room snapshot.
    fn fetch(&self, code: &str) -> BoxFuture<'_, Result<RoomSnapshot, SyncError>>;
    /// Issue a join mutation and return the post-join snapshot.
    fn join(
        &self,
        code: &str,
        user_id: &str,
        username: &str,
    ) -> BoxFuture<'_, Result<RoomSnapshot, SyncError>>;
}

/// Local countdown anchor used purely for cosmetic smoothing between polls.
#[derive(Debug, Clone, Copy)]
struct CountdownAnchor {
    remaining_secs: u64,
    running: bool,
    anchored_at: Instant,
}

/// Per-poll derived view, rebuilt in full from the latest snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomView {
    /// Whether this client is the room host.
    pub is_host: bool,
    /// This client's ready flag as the server sees it.
    pub is_ready: bool,
    /// Current participant count.
    pub participant_count: usize,
    /// Smoothed countdown display value in seconds.
    pub countdown_secs: u64,
    /// Whether the shared timer is running.
    pub timer_running: bool,
    /// Derived session-complete condition: a configured countdown that
    /// reached zero and stopped.
    pub session_complete: bool,
    /// Document currently broadcast, if any.
    pub document: Option<DocumentSnapshot>,
    /// True when the host switched to reviewer mode but generation has not
    /// landed yet.
    pub reviewer_pending: bool,
    /// Question index currently accepting answers, while a quiz is active.
    pub current_question: Option<usize>,
    /// Whether this client already answered the current question.
    pub answered_current_question: bool,
    /// This client's cumulative quiz score.
    pub quiz_score: u32,
}

/// Client-side reconciliation state.
///
/// Holds nothing but the latest snapshot and the countdown anchor; both are
/// discarded and rebuilt on every poll cycle, never patched incrementally.
pub struct SyncClient {
    user_id: String,
    username: String,
    snapshot: Option<RoomSnapshot>,
    anchor: Option<CountdownAnchor>,
}

impl SyncClient {
    /// Create an adapter for the given identity.
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            snapshot: None,
            anchor: None,
        }
    }

    /// Latest reconciled snapshot, if any poll succeeded yet.
    pub fn latest(&self) -> Option<&RoomSnapshot> {
        self.snapshot.as_ref()
    }

    fn is_member(&self, snapshot: &RoomSnapshot) -> bool {
        snapshot.host_id == self.user_id
            || snapshot
                .participants
                .iter()
                .any(|p| p.user_id == self.user_id)
    }

    /// Whether the last snapshot lists neither this client nor names it host,
    /// in which case a join must be issued before the snapshot is trusted.
    pub fn needs_join(&self) -> bool {
        self.snapshot
            .as_ref()
            .is_some_and(|snapshot| snapshot.is_active && !self.is_member(snapshot))
    }

    /// Replace all local state with a fresh snapshot and re-anchor the
    /// countdown to the server-computed remaining time.
    pub fn reconcile(&mut self, snapshot: RoomSnapshot, received_at: Instant) {
        self.anchor = Some(CountdownAnchor {
            remaining_secs: snapshot.study_timer.time_remaining_secs,
            running: snapshot.study_timer.is_running,
            anchored_at: received_at,
        });
        self.snapshot = Some(snapshot);
    }

    /// Smoothed countdown display value.
    ///
    /// Ticks down locally from the last anchored server value while the timer
    /// runs, clamped at zero; every reconcile snaps it back to the
    /// authoritative figure.
    pub fn countdown_secs(&self, now: Instant) -> u64 {
        match self.anchor {
            Some(anchor) if anchor.running => {
                let elapsed = now.saturating_duration_since(anchor.anchored_at).as_secs();
                anchor.remaining_secs.saturating_sub(elapsed)
            }
            Some(anchor) => anchor.remaining_secs,
            None => 0,
        }
    }

    /// Rebuild the derived view from the latest snapshot.
    pub fn view(&self, now: Instant) -> Option<RoomView> {
        let snapshot = self.snapshot.as_ref()?;
        let me = snapshot
            .participants
            .iter()
            .find(|p| p.user_id == self.user_id);

        let countdown_secs = self.countdown_secs(now);
        let timer_running = snapshot.study_timer.is_running && countdown_secs > 0;
        let session_complete = snapshot.study_timer.duration_secs > 0 && countdown_secs == 0;

        let quiz = snapshot.quiz.as_ref().filter(|q| q.is_active);
        let current_question = quiz.map(|q| q.current_question_index);
        let my_answers = snapshot
            .quiz
            .as_ref()
            .and_then(|q| {
                q.participant_answers
                    .iter()
                    .find(|entry| entry.user_id == self.user_id)
            });
        let answered_current_question = match (current_question, my_answers) {
            (Some(index), Some(entry)) => {
                entry.answers.iter().any(|a| a.question_index == index)
            }
            _ => false,
        };

        Some(RoomView {
            is_host: snapshot.host_id == self.user_id,
            is_ready: me.map(|p| p.ready).unwrap_or(false),
            participant_count: snapshot.participants.len(),
            countdown_secs,
            timer_running,
            session_complete,
            document: snapshot.current_document.clone(),
            reviewer_pending: snapshot.current_document.as_ref().is_some_and(|doc| {
                matches!(doc.view_mode, crate::dto::room::ViewModeDto::Reviewer)
                    && doc.reviewer_content.is_none()
            }),
            current_question,
            answered_current_question,
            quiz_score: my_answers.map(|entry| entry.score).unwrap_or(0),
        })
    }

    /// One poll cycle: fetch, auto-join when absent, reconcile.
    pub async fn poll_once<S: SnapshotSource>(
        &mut self,
        source: &S,
        code: &str,
    ) -> Result<(), SyncError> {
        let snapshot = source.fetch(code).await?;

        let snapshot = if snapshot.is_active && !self.is_member(&snapshot) {
            // Navigated straight to a room URL without an explicit join; the
            // snapshot is not authoritative for us until we are in it.
            source.join(code, &self.user_id, &self.username).await?
        } else {
            snapshot
        };

        self.reconcile(snapshot, Instant::now());
        Ok(())
    }
}

/// Drive the fixed-interval poll loop until the room deactivates.
///
/// Transient errors are logged and retried on the next tick; the snapshot
/// model makes every successful poll a full resynchronization.
pub async fn run_poll_loop<S: SnapshotSource>(
    source: &S,
    client: &mut SyncClient,
    code: &str,
) -> Result<(), SyncError> {
    let mut ticker = tokio::time::interval(ROOM_POLL_INTERVAL);
    loop {
        ticker.tick().await;
        match client.poll_once(source, code).await {
            Ok(()) => {
                if client.latest().is_some_and(|snapshot| !snapshot.is_active) {
                    return Ok(());
                }
            }
            Err(SyncError::RoomGone) => return Err(SyncError::RoomGone),
            Err(err) => {
                warn!(room = %code, error = %err, "poll failed; retrying next tick");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::dto::{
        quiz::{AnswerRecordSummary, ParticipantScoreSummary, QuizSnapshot, QuizStatusDto},
        room::{ParticipantSummary, TimerSnapshot, ViewModeDto},
    };

    fn participant(user_id: &str, is_host: bool) -> ParticipantSummary {
        ParticipantSummary {
            user_id: user_id.into(),
            username: user_id.into(),
            ready: is_host,
            is_host,
            joined_at: "1970-01-01T00:00:00Z".into(),
        }
    }

    fn snapshot(participants: Vec<ParticipantSummary>) -> RoomSnapshot {
        RoomSnapshot {
            code: "ABC123".into(),
            host_id: "host".into(),
            is_active: true,
            created_at: "1970-01-01T00:00:00Z".into(),
            updated_at: "1970-01-01T00:00:00Z".into(),
            participants,
            study_timer: TimerSnapshot {
                is_running: false,
                duration_secs: 0,
                time_remaining_secs: 0,
                started_at: None,
            },
            current_document: None,
            shared_files: Vec::new(),
            chat_messages: Vec::new(),
            quiz: None,
            poll_interval_secs: 2,
        }
    }

    struct FakeSource {
        snapshots: Mutex<Vec<RoomSnapshot>>,
        joins: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn new(snapshots: Vec<RoomSnapshot>) -> Self {
            Self {
                snapshots: Mutex::new(snapshots),
                joins: Mutex::new(Vec::new()),
            }
        }
    }

    impl SnapshotSource for FakeSource {
        fn fetch(&self, _code: &str) -> BoxFuture<'_, Result<RoomSnapshot, SyncError>> {
            Box::pin(async {
                let mut queue = self.snapshots.lock().unwrap();
                if queue.is_empty() {
                    Err(SyncError::Fetch("queue drained".into()))
                } else {
                    Ok(queue.remove(0))
                }
            })
        }

        fn join(
            &self,
            _code: &str,
            user_id: &str,
            username: &str,
        ) -> BoxFuture<'_, Result<RoomSnapshot, SyncError>> {
            let user_id = user_id.to_owned();
            let _ = username;
            Box::pin(async move {
                self.joins.lock().unwrap().push(user_id.clone());
                let mut joined = snapshot(vec![participant("host", true)]);
                joined.participants.push(participant(&user_id, false));
                Ok(joined)
            })
        }
    }

    #[tokio::test]
    async fn auto_join_fires_when_absent_from_snapshot() {
        let source = FakeSource::new(vec![snapshot(vec![participant("host", true)])]);
        let mut client = SyncClient::new("p1", "Priya");

        client.poll_once(&source, "ABC123").await.unwrap();

        assert_eq!(source.joins.lock().unwrap().as_slice(), ["p1"]);
        assert!(!client.needs_join());
        let view = client.view(Instant::now()).unwrap();
        assert_eq!(view.participant_count, 2);
        assert!(!view.is_host);
    }

    #[tokio::test]
    async fn member_snapshot_does_not_trigger_join() {
        let source = FakeSource::new(vec![snapshot(vec![
            participant("host", true),
            participant("p1", false),
        ])]);
        let mut client = SyncClient::new("p1", "Priya");

        client.poll_once(&source, "ABC123").await.unwrap();
        assert!(source.joins.lock().unwrap().is_empty());
    }

    #[test]
    fn countdown_smooths_between_polls_and_reanchors() {
        let mut client = SyncClient::new("p1", "Priya");
        let t0 = Instant::now();

        let mut snap = snapshot(vec![participant("host", true), participant("p1", false)]);
        snap.study_timer = TimerSnapshot {
            is_running: true,
            duration_secs: 60,
            time_remaining_secs: 50,
            started_at: Some("1970-01-01T00:00:10Z".into()),
        };
        client.reconcile(snap, t0);

        assert_eq!(client.countdown_secs(t0), 50);
        assert_eq!(client.countdown_secs(t0 + Duration::from_secs(3)), 47);
        // Never negative, regardless of how long the poll gap was.
        assert_eq!(client.countdown_secs(t0 + Duration::from_secs(500)), 0);

        // A new snapshot wins over any locally accumulated value.
        let mut snap = snapshot(vec![participant("host", true), participant("p1", false)]);
        snap.study_timer = TimerSnapshot {
            is_running: true,
            duration_secs: 60,
            time_remaining_secs: 44,
            started_at: Some("1970-01-01T00:00:10Z".into()),
        };
        let t1 = t0 + Duration::from_secs(6);
        client.reconcile(snap, t1);
        assert_eq!(client.countdown_secs(t1), 44);
    }

    #[test]
    fn view_is_rebuilt_entirely_from_the_snapshot() {
        let mut client = SyncClient::new("p1", "Priya");
        let t0 = Instant::now();

        let mut snap = snapshot(vec![participant("host", true), participant("p1", false)]);
        snap.quiz = Some(QuizSnapshot {
            id: uuid::Uuid::nil(),
            subject: "bio".into(),
            test_type: "mc".into(),
            is_active: true,
            status: QuizStatusDto::InProgress,
            current_question_index: 0,
            questions: Vec::new(),
            participant_answers: vec![ParticipantScoreSummary {
                user_id: "p1".into(),
                username: "Priya".into(),
                score: 1,
                answers: vec![AnswerRecordSummary {
                    question_index: 0,
                    selected_answer: 1,
                    time_taken_ms: 900,
                    is_correct: true,
                }],
            }],
            started_at: "1970-01-01T00:00:00Z".into(),
        });
        client.reconcile(snap, t0);

        let view = client.view(t0).unwrap();
        assert_eq!(view.current_question, Some(0));
        assert!(view.answered_current_question);
        assert_eq!(view.quiz_score, 1);

        // The host advances: the answered flag derives fresh, no local state
        // to invalidate.
        let mut snap = snapshot(vec![participant("host", true), participant("p1", false)]);
        snap.quiz = Some(QuizSnapshot {
            id: uuid::Uuid::nil(),
            subject: "bio".into(),
            test_type: "mc".into(),
            is_active: true,
            status: QuizStatusDto::InProgress,
            current_question_index: 1,
            questions: Vec::new(),
            participant_answers: Vec::new(),
            started_at: "1970-01-01T00:00:00Z".into(),
        });
        client.reconcile(snap, t0 + Duration::from_secs(2));

        let view = client.view(t0 + Duration::from_secs(2)).unwrap();
        assert_eq!(view.current_question, Some(1));
        assert!(!view.answered_current_question);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_loop_ends_when_room_deactivates() {
        let active = snapshot(vec![participant("host", true), participant("p1", false)]);
        let mut closed = snapshot(vec![participant("p1", false)]);
        closed.is_active = false;

        let source = FakeSource::new(vec![active, closed]);
        let mut client = SyncClient::new("p1", "Priya");

        run_poll_loop(&source, &mut client, "ABC123").await.unwrap();
        assert!(!client.latest().unwrap().is_active);
        // No join was issued for the inactive snapshot.
        assert!(source.joins.lock().unwrap().is_empty());
    }

    #[test]
    fn session_complete_and_reviewer_pending_are_derived() {
        let mut client = SyncClient::new("p1", "Priya");
        let t0 = Instant::now();

        let mut snap = snapshot(vec![participant("host", true), participant("p1", false)]);
        snap.study_timer = TimerSnapshot {
            is_running: false,
            duration_secs: 1500,
            time_remaining_secs: 0,
            started_at: None,
        };
        snap.current_document = Some(DocumentSnapshot {
            file_id: "f1".into(),
            view_mode: ViewModeDto::Reviewer,
            reviewer_content: None,
        });
        client.reconcile(snap, t0);

        let view = client.view(t0).unwrap();
        assert!(view.session_complete);
        assert!(!view.timer_running);
        assert!(view.reviewer_pending);
    }
}
