use serde::Deserialize;
use serde::Serialize;

use triage_core::resolution::ResolvedAction;
use triage_core::state::CardId;
use triage_core::state::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionExecutionRequest {
    pub card_id: CardId,
    pub action: ResolvedAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionExecutionReport {
    pub card_id: CardId,
    pub action_id: String,
    pub status: ExecutionStatus,
    pub message: Option<String>,
}

impl ActionExecutionReport {
    pub fn succeeded(request: &ActionExecutionRequest) -> Self {
        Self {
            card_id: request.card_id.clone(),
            action_id: request.action.action_id.clone(),
            status: ExecutionStatus::Succeeded,
            message: None,
        }
    }

    pub fn failed(request: &ActionExecutionRequest, message: impl Into<String>) -> Self {
        Self {
            card_id: request.card_id.clone(),
            action_id: request.action.action_id.clone(),
            status: ExecutionStatus::Failed,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationFeedback {
    pub card_id: CardId,
    pub from: Category,
    pub to: Category,
}

/// Answer a Save/Snooze sheet gives back for a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SaveSnoozeChoice {
    Save { folder: String },
    Snooze { minutes: i64 },
    Cancel,
}
