//! Drag interpretation for the top card.
//!
//! The machine only classifies the gesture. Committing the resulting action
//! (and mutating the collection) is the reducer's job.

use super::config::GestureConfig;
use super::state::DragTranslation;
use super::state::SwipeDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GesturePhase {
    #[default]
    Idle,
    Dragging,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragUpdate {
    pub translation: DragTranslation,
    pub reveal_progress: f64,
    pub direction: Option<SwipeDirection>,
    /// Set on the single event where the drag first crosses the haptic threshold.
    pub haptic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    Revert,
    Commit(SwipeDirection),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureRelease {
    pub outcome: GestureOutcome,
    pub translation: DragTranslation,
    pub distance: f64,
}

pub fn is_horizontal(translation: DragTranslation) -> bool {
    translation.width.abs() > translation.height.abs()
}

pub fn swipe_distance(translation: DragTranslation) -> f64 {
    if is_horizontal(translation) {
        translation.width.abs()
    } else {
        translation.height.abs()
    }
}

/// Normalized 0..=1 progress used for the reveal of the card beneath.
pub fn reveal_progress(distance: f64, reveal_distance: f64) -> f64 {
    if !distance.is_finite() || reveal_distance <= 0.0 {
        return if distance > 0.0 { 1.0 } else { 0.0 };
    }
    (distance / reveal_distance).clamp(0.0, 1.0)
}

pub fn resolve_direction(translation: DragTranslation) -> SwipeDirection {
    if is_horizontal(translation) {
        if translation.width > 0.0 {
            SwipeDirection::Right
        } else {
            SwipeDirection::Left
        }
    } else if translation.height < 0.0 {
        SwipeDirection::Up
    } else {
        SwipeDirection::Down
    }
}

#[derive(Debug, Clone)]
pub struct GestureMachine {
    config: GestureConfig,
    phase: GesturePhase,
    translation: DragTranslation,
    haptic_fired: bool,
}

impl GestureMachine {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            phase: GesturePhase::Idle,
            translation: DragTranslation::ZERO,
            haptic_fired: false,
        }
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn translation(&self) -> DragTranslation {
        self.translation
    }

    pub fn on_drag_change(&mut self, delta: DragTranslation) -> DragUpdate {
        if self.phase == GesturePhase::Idle {
            self.phase = GesturePhase::Dragging;
            self.translation = DragTranslation::ZERO;
            self.haptic_fired = false;
        }
        self.translation.width += delta.width;
        self.translation.height += delta.height;

        let distance = swipe_distance(self.translation);
        let haptic = !self.haptic_fired && distance > self.config.haptic_threshold;
        if haptic {
            self.haptic_fired = true;
        }

        DragUpdate {
            translation: self.translation,
            reveal_progress: reveal_progress(distance, self.config.reveal_distance),
            direction: (distance > 0.0).then(|| resolve_direction(self.translation)),
            haptic,
        }
    }

    /// Terminal event of a gesture. `final_translation` replaces the accumulated
    /// value when the platform reports one. The machine is always idle afterwards.
    pub fn on_drag_end(&mut self, final_translation: Option<DragTranslation>) -> GestureRelease {
        let translation = final_translation.unwrap_or(self.translation);
        self.reset();

        let distance = swipe_distance(translation);
        let outcome = if distance.is_nan() || distance <= self.config.commit_threshold {
            GestureOutcome::Revert
        } else {
            GestureOutcome::Commit(resolve_direction(translation))
        };
        GestureRelease {
            outcome,
            translation,
            distance,
        }
    }

    /// Platform interruption; treated as a release below the commit threshold.
    /// Returns whether a drag was in progress.
    pub fn cancel(&mut self) -> bool {
        let was_dragging = self.phase == GesturePhase::Dragging;
        self.reset();
        was_dragging
    }

    fn reset(&mut self) {
        self.phase = GesturePhase::Idle;
        self.translation = DragTranslation::ZERO;
        self.haptic_fired = false;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn machine() -> GestureMachine {
        GestureMachine::new(GestureConfig::default())
    }

    #[test]
    fn reveal_progress_is_normalized_and_clamped() {
        assert_eq!(reveal_progress(0.0, 200.0), 0.0);
        assert_eq!(reveal_progress(100.0, 200.0), 0.5);
        assert_eq!(reveal_progress(200.0, 200.0), 1.0);
        assert_eq!(reveal_progress(900.0, 200.0), 1.0);
    }

    #[test]
    fn dominant_axis_picks_distance_and_direction() {
        let t = DragTranslation::new(-120.0, 40.0);
        assert!(is_horizontal(t));
        assert_eq!(swipe_distance(t), 120.0);
        assert_eq!(resolve_direction(t), SwipeDirection::Left);

        let t = DragTranslation::new(30.0, -90.0);
        assert!(!is_horizontal(t));
        assert_eq!(swipe_distance(t), 90.0);
        assert_eq!(resolve_direction(t), SwipeDirection::Up);

        let t = DragTranslation::new(50.0, 50.0);
        assert!(!is_horizontal(t));
        assert_eq!(resolve_direction(t), SwipeDirection::Down);

        assert_eq!(
            resolve_direction(DragTranslation::new(10.0, 0.0)),
            SwipeDirection::Right
        );
    }

    #[test]
    fn drag_changes_accumulate_and_enter_dragging() {
        let mut machine = machine();
        assert_eq!(machine.phase(), GesturePhase::Idle);

        machine.on_drag_change(DragTranslation::new(30.0, 5.0));
        let update = machine.on_drag_change(DragTranslation::new(70.0, -5.0));

        assert_eq!(machine.phase(), GesturePhase::Dragging);
        assert_eq!(update.translation, DragTranslation::new(100.0, 0.0));
        assert_eq!(update.reveal_progress, 0.5);
        assert_eq!(update.direction, Some(SwipeDirection::Right));
    }

    #[test]
    fn haptic_fires_once_per_gesture() {
        let mut machine = machine();
        let fired: Vec<bool> = [20.0, 20.0, 20.0, 20.0, -60.0, 60.0]
            .into_iter()
            .map(|dx| machine.on_drag_change(DragTranslation::new(dx, 0.0)).haptic)
            .collect();
        assert_eq!(fired, vec![false, false, true, false, false, false]);

        machine.on_drag_end(None);
        let update = machine.on_drag_change(DragTranslation::new(80.0, 0.0));
        assert!(update.haptic);
    }

    #[test]
    fn release_below_threshold_reverts() {
        let mut machine = machine();
        machine.on_drag_change(DragTranslation::new(80.0, 0.0));
        let release = machine.on_drag_end(None);
        assert_eq!(release.outcome, GestureOutcome::Revert);
        assert_eq!(machine.phase(), GesturePhase::Idle);
        assert_eq!(machine.translation(), DragTranslation::ZERO);
    }

    #[test]
    fn release_past_threshold_commits_direction() {
        let mut machine = machine();
        machine.on_drag_change(DragTranslation::new(10.0, 0.0));
        let release = machine.on_drag_end(Some(DragTranslation::new(0.0, -100.0)));
        assert_eq!(release.outcome, GestureOutcome::Commit(SwipeDirection::Up));
        assert_eq!(release.distance, 100.0);

        let release = machine.on_drag_end(Some(DragTranslation::new(0.0, 150.0)));
        assert_eq!(release.outcome, GestureOutcome::Commit(SwipeDirection::Down));
    }

    #[test]
    fn cancel_always_returns_to_idle() {
        let mut machine = machine();
        assert!(!machine.cancel());
        machine.on_drag_change(DragTranslation::new(300.0, 0.0));
        assert!(machine.cancel());
        assert_eq!(machine.phase(), GesturePhase::Idle);
        assert_eq!(machine.translation(), DragTranslation::ZERO);
    }
}
