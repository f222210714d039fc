use chrono::DateTime;
use chrono::Utc;

use super::state::CardId;
use super::state::Category;
use super::state::DragTranslation;

#[derive(Debug, Clone)]
pub enum TriageAction {
    User(UserAction),
    Runtime(RuntimeAction),
}

#[derive(Debug, Clone)]
pub enum UserAction {
    DragChanged {
        delta: DragTranslation,
    },
    DragEnded {
        card_id: CardId,
        translation: Option<DragTranslation>,
    },
    DragCancelled,
    Undo,
    DismissUndo,
    SetCategory(Category),
    UrgentConfirmationResolved {
        card_id: CardId,
        confirmed: bool,
    },
    SelectAction {
        card_id: CardId,
        action_id: String,
    },
    SetActionOverride {
        card_id: CardId,
        action_id: String,
    },
    ClearActionOverride {
        card_id: CardId,
    },
    Reclassify {
        card_id: CardId,
        to: Category,
    },
    DismissFirstCardHint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    SaveToFolder { folder: String },
    Snooze { until: DateTime<Utc> },
    Cancelled,
}

#[derive(Debug, Clone)]
pub enum RuntimeAction {
    Tick,
    Resumed,
    SaveSnoozeResolved {
        card_id: CardId,
        disposition: Disposition,
    },
    ActionExecutionFailed {
        card_id: CardId,
        action_id: String,
        message: String,
    },
}
