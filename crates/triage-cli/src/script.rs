//! Replay scripts: a YAML list of host inputs fed through a [`Session`].

use chrono::DateTime;
use chrono::TimeDelta;
use chrono::Utc;
use serde::Deserialize;

use triage_core::actions::RuntimeAction;
use triage_core::actions::TriageAction;
use triage_core::actions::UserAction;
use triage_core::reducer::TriageEvent;
use triage_core::state::CardId;
use triage_core::state::Category;
use triage_core::state::DragTranslation;
use triage_core::state::SwipeDirection;
use triage_core::undo::UndoResolution;
use triage_exec::collaborators::CollaboratorScript;
use triage_exec::collaborators::Collaborators;
use triage_exec::dispatch::Session;

const DEFAULT_SWIPE_DISTANCE: f64 = 120.0;
const SWIPE_SEGMENTS: u32 = 4;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Script {
    pub start: Option<DateTime<Utc>>,
    pub collaborators: CollaboratorScript,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Swipe {
        card: CardId,
        direction: SwipeDirection,
        distance: Option<f64>,
    },
    Drag {
        dx: f64,
        dy: f64,
    },
    Release {
        card: CardId,
    },
    Cancel,
    Undo,
    DismissUndo,
    /// Advances the clock, then fires the countdown timer.
    Wait {
        secs: i64,
    },
    Tick,
    Resume,
    Category {
        to: Category,
    },
    Select {
        card: CardId,
        action: String,
    },
    Override {
        card: CardId,
        action: String,
    },
    ClearOverride {
        card: CardId,
    },
    Reclassify {
        card: CardId,
        to: Category,
    },
    DismissHint,
}

impl Step {
    pub fn label(&self) -> String {
        match self {
            Self::Swipe {
                card, direction, ..
            } => format!("swipe {} {card}", direction.label()),
            Self::Drag { dx, dy } => format!("drag ({dx}, {dy})"),
            Self::Release { card } => format!("release {card}"),
            Self::Cancel => "cancel".to_string(),
            Self::Undo => "undo".to_string(),
            Self::DismissUndo => "dismiss undo".to_string(),
            Self::Wait { secs } => format!("wait {secs}s"),
            Self::Tick => "tick".to_string(),
            Self::Resume => "resume".to_string(),
            Self::Category { to } => format!("category {}", to.label()),
            Self::Select { card, action } => format!("select {action} on {card}"),
            Self::Override { card, action } => format!("override {card} -> {action}"),
            Self::ClearOverride { card } => format!("clear override {card}"),
            Self::Reclassify { card, to } => format!("reclassify {card} -> {}", to.label()),
            Self::DismissHint => "dismiss hint".to_string(),
        }
    }

    /// Host inputs this step stands for, and how far it moves the clock first.
    pub fn inputs(&self) -> (TimeDelta, Vec<TriageAction>) {
        let user = |action| vec![TriageAction::User(action)];
        match self {
            Self::Swipe {
                card,
                direction,
                distance,
            } => (
                TimeDelta::zero(),
                swipe_inputs(card, *direction, distance.unwrap_or(DEFAULT_SWIPE_DISTANCE)),
            ),
            Self::Drag { dx, dy } => (
                TimeDelta::zero(),
                user(UserAction::DragChanged {
                    delta: DragTranslation::new(*dx, *dy),
                }),
            ),
            Self::Release { card } => (
                TimeDelta::zero(),
                user(UserAction::DragEnded {
                    card_id: card.clone(),
                    translation: None,
                }),
            ),
            Self::Cancel => (TimeDelta::zero(), user(UserAction::DragCancelled)),
            Self::Undo => (TimeDelta::zero(), user(UserAction::Undo)),
            Self::DismissUndo => (TimeDelta::zero(), user(UserAction::DismissUndo)),
            Self::Wait { secs } => (
                TimeDelta::seconds((*secs).max(0)),
                vec![TriageAction::Runtime(RuntimeAction::Tick)],
            ),
            Self::Tick => (
                TimeDelta::zero(),
                vec![TriageAction::Runtime(RuntimeAction::Tick)],
            ),
            Self::Resume => (
                TimeDelta::zero(),
                vec![TriageAction::Runtime(RuntimeAction::Resumed)],
            ),
            Self::Category { to } => (TimeDelta::zero(), user(UserAction::SetCategory(*to))),
            Self::Select { card, action } => (
                TimeDelta::zero(),
                user(UserAction::SelectAction {
                    card_id: card.clone(),
                    action_id: action.clone(),
                }),
            ),
            Self::Override { card, action } => (
                TimeDelta::zero(),
                user(UserAction::SetActionOverride {
                    card_id: card.clone(),
                    action_id: action.clone(),
                }),
            ),
            Self::ClearOverride { card } => (
                TimeDelta::zero(),
                user(UserAction::ClearActionOverride {
                    card_id: card.clone(),
                }),
            ),
            Self::Reclassify { card, to } => (
                TimeDelta::zero(),
                user(UserAction::Reclassify {
                    card_id: card.clone(),
                    to: *to,
                }),
            ),
            Self::DismissHint => (TimeDelta::zero(), user(UserAction::DismissFirstCardHint)),
        }
    }
}

fn swipe_inputs(card: &CardId, direction: SwipeDirection, distance: f64) -> Vec<TriageAction> {
    let total = match direction {
        SwipeDirection::Right => DragTranslation::new(distance, 0.0),
        SwipeDirection::Left => DragTranslation::new(-distance, 0.0),
        SwipeDirection::Down => DragTranslation::new(0.0, distance),
        SwipeDirection::Up => DragTranslation::new(0.0, -distance),
    };
    let segments = f64::from(SWIPE_SEGMENTS);
    let delta = DragTranslation::new(total.width / segments, total.height / segments);

    let mut inputs: Vec<TriageAction> = (0..SWIPE_SEGMENTS)
        .map(|_| TriageAction::User(UserAction::DragChanged { delta }))
        .collect();
    inputs.push(TriageAction::User(UserAction::DragEnded {
        card_id: card.clone(),
        translation: Some(total),
    }));
    inputs
}

pub fn parse_script(text: &str) -> Result<Script, serde_yaml::Error> {
    serde_yaml::from_str(text)
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub index: usize,
    pub label: String,
    pub at: DateTime<Utc>,
    pub events: Vec<TriageEvent>,
}

/// Runs every step in order against `session`, starting the clock at `start`.
pub fn replay<C: Collaborators>(
    session: &mut Session<C>,
    steps: &[Step],
    start: DateTime<Utc>,
) -> Vec<StepReport> {
    let mut now = start;
    let mut reports = Vec::with_capacity(steps.len());
    for (index, step) in steps.iter().enumerate() {
        let (advance, inputs) = step.inputs();
        now += advance;
        let mut events = Vec::new();
        for input in inputs {
            events.extend(session.apply(input, now));
        }
        reports.push(StepReport {
            index: index + 1,
            label: step.label(),
            at: now,
            events,
        });
    }
    reports
}

pub fn describe_event(event: &TriageEvent) -> String {
    match event {
        TriageEvent::DragProgressed {
            translation,
            reveal_progress,
            direction,
        } => format!(
            "drag ({:.0}, {:.0}) reveal {:.2}{}",
            translation.width,
            translation.height,
            reveal_progress,
            direction
                .map(|direction| format!(" toward {}", direction.label()))
                .unwrap_or_default()
        ),
        TriageEvent::GestureReverted => "gesture reverted".to_string(),
        TriageEvent::CardStateChanged { card_id, state } => {
            format!("card {card_id} -> {}", state.label())
        }
        TriageEvent::CategorySwitched { from, to } => {
            format!("category {} -> {}", from.label(), to.label())
        }
        TriageEvent::StackExhausted => "stack exhausted".to_string(),
        TriageEvent::UndoArmed {
            card_id,
            label,
            deadline,
        } => format!(
            "undo armed for {card_id}: \"{label}\" until {}",
            deadline.format("%H:%M:%S")
        ),
        TriageEvent::UndoResolved {
            card_id,
            resolution,
        } => format!(
            "undo {} for {card_id}",
            match resolution {
                UndoResolution::Reverted => "reverted",
                UndoResolution::Finalized => "finalized",
            }
        ),
        TriageEvent::OverrideChanged {
            card_id,
            action_id,
        } => match action_id {
            Some(action_id) => format!("override {card_id} -> {action_id}"),
            None => format!("override {card_id} cleared"),
        },
        TriageEvent::FirstCardHintDismissed => "first-card hint dismissed".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;
    use triage_core::collection::CardCollection;
    use triage_core::config::TriageConfig;
    use triage_core::state::Card;
    use triage_core::state::TriageState;
    use triage_exec::collaborators::SimulatedCollaborators;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn parses_tagged_steps() {
        let script = parse_script(
            r#"
collaborators:
  confirm_urgent: false
  save_snooze: { kind: snooze, minutes: 30 }
steps:
  - step: swipe
    card: m1
    direction: right
  - step: wait
    secs: 9
  - step: undo
  - step: category
    to: promotional
"#,
        )
        .expect("parse");
        assert!(!script.collaborators.confirm_urgent);
        assert_eq!(
            script.steps,
            vec![
                Step::Swipe {
                    card: CardId::from("m1"),
                    direction: SwipeDirection::Right,
                    distance: None,
                },
                Step::Wait { secs: 9 },
                Step::Undo,
                Step::Category {
                    to: Category::Promotional,
                },
            ]
        );
    }

    #[test]
    fn swipe_expands_to_drag_then_release() {
        let (advance, inputs) = Step::Swipe {
            card: CardId::from("m1"),
            direction: SwipeDirection::Up,
            distance: Some(200.0),
        }
        .inputs();
        assert_eq!(advance, TimeDelta::zero());
        assert_eq!(inputs.len(), 5);
        let Some(TriageAction::User(UserAction::DragEnded { translation, .. })) = inputs.last() else {
            panic!("last input should release the drag");
        };
        assert_eq!(*translation, Some(DragTranslation::new(0.0, -200.0)));
    }

    #[test]
    fn replay_commits_then_expires_undo() {
        let collection = CardCollection::new(
            vec![Card::new("a", Category::Primary), Card::new("b", Category::Primary)],
            Category::Primary,
        )
        .expect("collection");
        let state = TriageState::new(TriageConfig::default(), collection);
        let mut session = Session::new(state, SimulatedCollaborators::default());
        let steps = vec![
            Step::Swipe {
                card: CardId::from("a"),
                direction: SwipeDirection::Left,
                distance: None,
            },
            Step::Wait { secs: 9 },
            Step::Undo,
        ];

        let reports = replay(&mut session, &steps, t0());

        assert_eq!(reports.len(), 3);
        assert_eq!(reports[1].at, t0() + TimeDelta::seconds(9));
        assert!(reports[1].events.iter().any(|event| matches!(
            event,
            TriageEvent::UndoResolved {
                resolution: UndoResolution::Finalized,
                ..
            }
        )));
        assert!(reports[2].events.is_empty());
        assert!(!session
            .state()
            .collection
            .get(&CardId::from("a"))
            .expect("card")
            .is_unseen());
    }

    #[test]
    fn describes_undo_events() {
        assert_eq!(
            describe_event(&TriageEvent::UndoResolved {
                card_id: CardId::from("a"),
                resolution: UndoResolution::Reverted,
            }),
            "undo reverted for a"
        );
        assert_eq!(
            describe_event(&TriageEvent::OverrideChanged {
                card_id: CardId::from("a"),
                action_id: None,
            }),
            "override a cleared"
        );
    }
}
