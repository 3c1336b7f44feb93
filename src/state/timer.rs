use std::time::SystemTime;

use crate::state::room::RoomError;

/// Coarse view of where the shared countdown currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    /// No countdown in flight; the full duration is available.
    Idle,
    /// Counting down from the last start/resume anchor.
    Running,
    /// Stopped mid-countdown with time left on the clock.
    Paused,
}

/// Host-issued timer commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Begin a fresh countdown with a new duration.
    Start,
    /// Freeze the countdown, banking the remaining time.
    Pause,
    /// Re-anchor and continue a paused countdown.
    Resume,
    /// Return to idle with the full duration restored.
    Reset,
}

/// Shared study countdown, anchored to wall-clock timestamps instead of a
/// server-side ticker.
///
/// While running, `time_remaining_secs` holds the remaining figure at the
/// instant `started_at` was set; the live value is always derived through
/// [`StudyTimer::remaining_at`]. Expiry is observed at read time only — the
/// struct never transitions on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyTimer {
    /// Whether the countdown is currently ticking.
    pub is_running: bool,
    /// Duration configured at the last start, in seconds.
    pub duration_secs: u64,
    /// Wall-clock anchor of the last start/resume; `None` unless running.
    pub started_at: Option<SystemTime>,
    /// Remaining seconds at the instant of the last start/resume/pause.
    pub time_remaining_secs: u64,
}

impl Default for StudyTimer {
    fn default() -> Self {
        Self {
            is_running: false,
            duration_secs: 0,
            started_at: None,
            time_remaining_secs: 0,
        }
    }
}

impl StudyTimer {
    /// Derive the coarse phase from the anchored fields.
    pub fn phase(&self) -> TimerPhase {
        if self.is_running {
            TimerPhase::Running
        } else if self.time_remaining_secs == 0 || self.time_remaining_secs == self.duration_secs {
            TimerPhase::Idle
        } else {
            TimerPhase::Paused
        }
    }

    /// Authoritative remaining time at `now`.
    ///
    /// `remaining = is_running ? max(0, anchored_remaining - (now - started_at)) : anchored_remaining`
    pub fn remaining_at(&self, now: SystemTime) -> u64 {
        match (self.is_running, self.started_at) {
            (true, Some(anchor)) => {
                let elapsed = now
                    .duration_since(anchor)
                    .map(|d| d.as_secs())
                    .unwrap_or(0);
                self.time_remaining_secs.saturating_sub(elapsed)
            }
            _ => self.time_remaining_secs,
        }
    }

    /// Begin a fresh countdown over `duration_secs`.
    pub fn start(&mut self, duration_secs: u64, now: SystemTime) -> Result<(), RoomError> {
        if self.is_running || duration_secs == 0 {
            return Err(RoomError::InvalidTimerAction {
                action: TimerAction::Start,
                phase: self.phase(),
            });
        }

        self.duration_secs = duration_secs;
        self.time_remaining_secs = duration_secs;
        self.started_at = Some(now);
        self.is_running = true;
        Ok(())
    }

    /// Freeze the countdown, banking the remaining time at `now`.
    pub fn pause(&mut self, now: SystemTime) -> Result<(), RoomError> {
        if !self.is_running {
            return Err(RoomError::InvalidTimerAction {
                action: TimerAction::Pause,
                phase: self.phase(),
            });
        }

        self.time_remaining_secs = self.remaining_at(now);
        self.is_running = false;
        self.started_at = None;
        Ok(())
    }

    /// Continue a paused countdown from its banked remaining time.
    pub fn resume(&mut self, now: SystemTime) -> Result<(), RoomError> {
        if self.is_running || self.time_remaining_secs == 0 {
            return Err(RoomError::InvalidTimerAction {
                action: TimerAction::Resume,
                phase: self.phase(),
            });
        }

        self.started_at = Some(now);
        self.is_running = true;
        Ok(())
    }

    /// Return to idle with the full configured duration restored.
    pub fn reset(&mut self) {
        self.is_running = false;
        self.started_at = None;
        self.time_remaining_secs = self.duration_secs;
    }

    /// Collapse an expired-but-still-flagged-running timer into its idle form.
    ///
    /// Called before every mutation so persisted state catches up with the
    /// wall clock; read paths use [`StudyTimer::observe`] instead and leave
    /// the stored document untouched.
    pub fn normalize(&mut self, now: SystemTime) {
        if self.is_running && self.remaining_at(now) == 0 {
            self.is_running = false;
            self.started_at = None;
            self.time_remaining_secs = 0;
        }
    }

    /// Produce the read-time projection of the timer: remaining seconds are
    /// recomputed against `now`, and a countdown that ran out reads as idle.
    pub fn observe(&self, now: SystemTime) -> StudyTimer {
        let remaining = self.remaining_at(now);
        if self.is_running && remaining == 0 {
            StudyTimer {
                is_running: false,
                duration_secs: self.duration_secs,
                started_at: None,
                time_remaining_secs: 0,
            }
        } else {
            StudyTimer {
                time_remaining_secs: remaining,
                ..self.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn fresh_timer_is_idle() {
        let timer = StudyTimer::default();
        assert_eq!(timer.phase(), TimerPhase::Idle);
        assert_eq!(timer.remaining_at(at(100)), 0);
    }

    #[test]
    fn start_anchors_full_duration() {
        let mut timer = StudyTimer::default();
        timer.start(1500, at(10)).unwrap();

        assert!(timer.is_running);
        assert_eq!(timer.duration_secs, 1500);
        assert_eq!(timer.time_remaining_secs, 1500);
        assert_eq!(timer.remaining_at(at(10)), 1500);
        assert_eq!(timer.remaining_at(at(110)), 1400);
    }

    #[test]
    fn remaining_is_monotonic_and_never_negative() {
        let mut timer = StudyTimer::default();
        timer.start(60, at(0)).unwrap();

        let mut previous = u64::MAX;
        for t in [0, 1, 30, 59, 60, 61, 3600] {
            let remaining = timer.remaining_at(at(t));
            assert!(remaining <= previous, "remaining grew at t={t}");
            previous = remaining;
        }
        assert_eq!(timer.remaining_at(at(3600)), 0);
    }

    #[test]
    fn pause_resume_round_trip_reaches_exactly_zero() {
        let mut timer = StudyTimer::default();
        timer.start(60, at(0)).unwrap();

        timer.pause(at(10)).unwrap();
        assert_eq!(timer.phase(), TimerPhase::Paused);
        assert_eq!(timer.time_remaining_secs, 50);
        assert!(timer.started_at.is_none());

        timer.resume(at(20)).unwrap();
        assert_eq!(timer.remaining_at(at(69)), 1);
        assert_eq!(timer.remaining_at(at(70)), 0);
        assert_eq!(timer.remaining_at(at(71)), 0);
    }

    #[test]
    fn expiry_is_observed_not_spontaneous() {
        let mut timer = StudyTimer::default();
        timer.start(60, at(0)).unwrap();

        // Past the deadline the stored struct still claims to be running.
        assert!(timer.is_running);
        assert_eq!(timer.remaining_at(at(100)), 0);

        let observed = timer.observe(at(100));
        assert!(!observed.is_running);
        assert!(observed.started_at.is_none());
        assert_eq!(observed.time_remaining_secs, 0);

        // Observation is read-only; only normalize persists the transition.
        assert!(timer.is_running);
        timer.normalize(at(100));
        assert!(!timer.is_running);
        assert_eq!(timer.time_remaining_secs, 0);
    }

    #[test]
    fn observe_while_running_recomputes_remaining() {
        let mut timer = StudyTimer::default();
        timer.start(60, at(0)).unwrap();

        let observed = timer.observe(at(25));
        assert!(observed.is_running);
        assert_eq!(observed.time_remaining_secs, 35);
    }

    #[test]
    fn reset_restores_full_duration() {
        let mut timer = StudyTimer::default();
        timer.start(60, at(0)).unwrap();
        timer.pause(at(45)).unwrap();
        assert_eq!(timer.time_remaining_secs, 15);

        timer.reset();
        assert_eq!(timer.phase(), TimerPhase::Idle);
        assert_eq!(timer.time_remaining_secs, 60);
        assert!(timer.started_at.is_none());
    }

    #[test]
    fn invalid_actions_are_rejected() {
        let mut timer = StudyTimer::default();
        assert!(matches!(
            timer.pause(at(0)),
            Err(RoomError::InvalidTimerAction {
                action: TimerAction::Pause,
                ..
            })
        ));
        assert!(timer.resume(at(0)).is_err());

        timer.start(60, at(0)).unwrap();
        assert!(matches!(
            timer.start(30, at(1)),
            Err(RoomError::InvalidTimerAction {
                action: TimerAction::Start,
                phase: TimerPhase::Running,
            })
        ));
        assert!(timer.resume(at(1)).is_err());
    }
}
