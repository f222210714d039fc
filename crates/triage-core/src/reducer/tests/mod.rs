use chrono::DateTime;
use chrono::TimeDelta;
use chrono::TimeZone;
use chrono::Utc;
use pretty_assertions::assert_eq;

pub(super) use super::reduce;
pub(super) use super::TriageEffect;
pub(super) use super::TriageEvent;
pub(super) use crate::actions::Disposition;
pub(super) use crate::actions::RuntimeAction;
pub(super) use crate::actions::TriageAction;
pub(super) use crate::actions::UserAction;
pub(super) use crate::collection::CardCollection;
pub(super) use crate::config::TriageConfig;
pub(super) use crate::gesture::GesturePhase;
pub(super) use crate::persistence::PreferenceEvent;
pub(super) use crate::resolution::ResolutionSource;
pub(super) use crate::state::Card;
pub(super) use crate::state::CardId;
pub(super) use crate::state::CardState;
pub(super) use crate::state::Category;
pub(super) use crate::state::DragTranslation;
pub(super) use crate::state::LogLevel;
pub(super) use crate::state::SuggestedAction;
pub(super) use crate::state::TriageState;
pub(super) use crate::undo::UndoResolution;
pub(super) use crate::window::project;

mod gestures;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0)
        .single()
        .expect("valid time")
}

fn at(secs: i64) -> DateTime<Utc> {
    t0() + TimeDelta::seconds(secs)
}

fn card(id: &str, category: Category) -> Card {
    Card::new(id, category)
}

fn state_with(cards: Vec<Card>, category: Category) -> TriageState {
    let collection = CardCollection::new(cards, category).expect("collection");
    TriageState::new(TriageConfig::default(), collection)
}

fn user(state: &mut TriageState, action: UserAction, now: DateTime<Utc>) -> Vec<TriageEffect> {
    reduce(state, TriageAction::User(action), now)
}

fn runtime(state: &mut TriageState, action: RuntimeAction, now: DateTime<Utc>) -> Vec<TriageEffect> {
    reduce(state, TriageAction::Runtime(action), now)
}

/// Drags the top card in `steps` equal increments, then releases at the total.
fn swipe(
    state: &mut TriageState,
    card_id: &str,
    width: f64,
    height: f64,
    now: DateTime<Utc>,
) -> Vec<TriageEffect> {
    let steps = 5.0;
    for _ in 0..5 {
        user(
            state,
            UserAction::DragChanged {
                delta: DragTranslation::new(width / steps, height / steps),
            },
            now,
        );
    }
    user(
        state,
        UserAction::DragEnded {
            card_id: CardId::from(card_id),
            translation: Some(DragTranslation::new(width, height)),
        },
        now,
    )
}

fn state_of(state: &TriageState, id: &str) -> CardState {
    state
        .collection
        .get(&CardId::from(id))
        .map(|card| card.state)
        .expect("card present")
}

fn filtered_ids(state: &TriageState) -> Vec<String> {
    state
        .collection
        .filtered()
        .iter()
        .map(|card| card.id.to_string())
        .collect()
}

fn events(effects: &[TriageEffect]) -> Vec<&TriageEvent> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            TriageEffect::Emit(event) => Some(event),
            _ => None,
        })
        .collect()
}

fn assert_idle(state: &TriageState) {
    assert_eq!(state.gesture.phase(), GesturePhase::Idle);
    assert_eq!(state.gesture.translation(), DragTranslation::ZERO);
}
