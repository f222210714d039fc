//! Single-slot, wall-clock undo window.
//!
//! Deadlines are absolute timestamps, so time spent with the app suspended still
//! counts: the first tick after resuming finalizes an expired window.

use std::time::Duration;

use chrono::DateTime;
use chrono::TimeDelta;
use chrono::Utc;

use super::state::CardId;
use super::state::Category;
use super::state::CommitKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUndo {
    pub card_id: CardId,
    pub category: Category,
    pub commit: CommitKind,
    pub label: String,
    pub deadline: DateTime<Utc>,
}

impl PendingUndo {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.deadline - now).to_std().unwrap_or(Duration::ZERO)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoResolution {
    Reverted,
    Finalized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoAttempt {
    Reverted(PendingUndo),
    /// The deadline had already passed; the window was finalized instead.
    Expired(PendingUndo),
    NotArmed,
}

#[derive(Debug, Clone)]
pub struct UndoWindow {
    window: Duration,
    armed: Option<PendingUndo>,
    last_resolution: Option<(CardId, UndoResolution)>,
    countdowns_cancelled: u64,
}

impl UndoWindow {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            armed: None,
            last_resolution: None,
            countdowns_cancelled: 0,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn armed(&self) -> Option<&PendingUndo> {
        self.armed.as_ref()
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn last_resolution(&self) -> Option<&(CardId, UndoResolution)> {
        self.last_resolution.as_ref()
    }

    /// Number of countdowns stopped before their deadline (undo, re-arm, cancel).
    pub fn countdowns_cancelled(&self) -> u64 {
        self.countdowns_cancelled
    }

    /// Arms a new window. An already armed window is finalized first and returned.
    pub fn open(
        &mut self,
        card_id: CardId,
        category: Category,
        commit: CommitKind,
        now: DateTime<Utc>,
    ) -> Option<PendingUndo> {
        let previous = self.cancel();
        let window = TimeDelta::from_std(self.window).unwrap_or(TimeDelta::seconds(8));
        self.armed = Some(PendingUndo {
            label: commit.undo_label(),
            card_id,
            category,
            commit,
            deadline: now + window,
        });
        previous
    }

    pub fn undo(&mut self, now: DateTime<Utc>) -> UndoAttempt {
        let Some(pending) = self.armed.take() else {
            return UndoAttempt::NotArmed;
        };
        if pending.is_expired(now) {
            self.last_resolution = Some((pending.card_id.clone(), UndoResolution::Finalized));
            return UndoAttempt::Expired(pending);
        }
        self.countdowns_cancelled += 1;
        self.last_resolution = Some((pending.card_id.clone(), UndoResolution::Reverted));
        UndoAttempt::Reverted(pending)
    }

    /// Finalizes the armed window if its deadline has passed.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<PendingUndo> {
        if !self.armed.as_ref()?.is_expired(now) {
            return None;
        }
        let pending = self.armed.take()?;
        self.last_resolution = Some((pending.card_id.clone(), UndoResolution::Finalized));
        Some(pending)
    }

    /// Stops the countdown and finalizes immediately. Calling it again is a no-op.
    pub fn cancel(&mut self) -> Option<PendingUndo> {
        let pending = self.armed.take()?;
        self.countdowns_cancelled += 1;
        self.last_resolution = Some((pending.card_id.clone(), UndoResolution::Finalized));
        Some(pending)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).single().expect("valid time")
    }

    fn window() -> UndoWindow {
        UndoWindow::new(Duration::from_secs(8))
    }

    #[test]
    fn undo_within_deadline_reverts() {
        let mut undo = window();
        undo.open(CardId::from("x"), Category::Primary, CommitKind::MarkedRead, t0());
        assert_eq!(undo.armed().map(|p| p.label.as_str()), Some("Marked as Read"));

        let attempt = undo.undo(t0() + TimeDelta::seconds(3));
        assert!(matches!(attempt, UndoAttempt::Reverted(ref p) if p.card_id.as_str() == "x"));
        assert!(!undo.is_armed());
        assert_eq!(
            undo.last_resolution(),
            Some(&(CardId::from("x"), UndoResolution::Reverted))
        );
        assert_eq!(undo.undo(t0()), UndoAttempt::NotArmed);
    }

    #[test]
    fn tick_finalizes_only_after_deadline() {
        let mut undo = window();
        undo.open(
            CardId::from("x"),
            Category::Primary,
            CommitKind::TookAction {
                action_id: "a".into(),
            },
            t0(),
        );
        assert_eq!(undo.tick(t0() + TimeDelta::seconds(7)), None);
        assert!(undo.is_armed());
        let finalized = undo.tick(t0() + TimeDelta::seconds(8)).expect("finalized");
        assert_eq!(finalized.label, "Action Taken");
        assert!(!undo.is_armed());
        assert_eq!(undo.countdowns_cancelled(), 0);
    }

    #[test]
    fn undo_after_suspension_past_deadline_finalizes() {
        let mut undo = window();
        undo.open(CardId::from("x"), Category::Primary, CommitKind::MarkedRead, t0());
        let attempt = undo.undo(t0() + TimeDelta::minutes(5));
        assert!(matches!(attempt, UndoAttempt::Expired(_)));
        assert_eq!(
            undo.last_resolution(),
            Some(&(CardId::from("x"), UndoResolution::Finalized))
        );
    }

    #[test]
    fn opening_second_window_finalizes_first() {
        let mut undo = window();
        assert_eq!(
            undo.open(CardId::from("a"), Category::Primary, CommitKind::MarkedRead, t0()),
            None
        );
        let previous = undo
            .open(
                CardId::from("b"),
                Category::Primary,
                CommitKind::MarkedRead,
                t0() + TimeDelta::seconds(1),
            )
            .expect("first finalized");
        assert_eq!(previous.card_id, CardId::from("a"));
        assert_eq!(undo.armed().map(|p| p.card_id.clone()), Some(CardId::from("b")));
        assert_eq!(undo.countdowns_cancelled(), 1);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut undo = window();
        undo.open(CardId::from("a"), Category::Primary, CommitKind::MarkedRead, t0());
        assert!(undo.cancel().is_some());
        assert!(undo.cancel().is_none());
        assert_eq!(undo.countdowns_cancelled(), 1);
    }

    #[test]
    fn remaining_counts_down_to_zero() {
        let mut undo = window();
        undo.open(CardId::from("a"), Category::Primary, CommitKind::MarkedRead, t0());
        let pending = undo.armed().expect("armed").clone();
        assert_eq!(pending.remaining(t0() + TimeDelta::seconds(2)), Duration::from_secs(6));
        assert_eq!(pending.remaining(t0() + TimeDelta::seconds(20)), Duration::ZERO);
    }
}
