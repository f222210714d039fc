use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use triage_core::state::Card;
use triage_core::state::SuggestedAction;

use crate::contracts::ActionExecutionReport;
use crate::contracts::ActionExecutionRequest;
use crate::contracts::ClassificationFeedback;
use crate::contracts::SaveSnoozeChoice;

pub trait ActionExecutor {
    fn execute(&mut self, request: &ActionExecutionRequest) -> ActionExecutionReport;
}

pub trait UrgentConfirmer {
    fn confirm_dismiss(&mut self, card: &Card) -> bool;
}

pub trait SaveSnoozeSelector {
    fn choose(&mut self, card: &Card) -> SaveSnoozeChoice;
}

pub trait ActionSelector {
    /// Returns the chosen action id, or `None` when the selector was dismissed.
    fn select(&mut self, card: &Card, actions: &[SuggestedAction]) -> Option<String>;
}

pub trait FeedbackSink {
    fn submit(&mut self, feedback: ClassificationFeedback);
}

pub trait Collaborators:
    ActionExecutor + UrgentConfirmer + SaveSnoozeSelector + ActionSelector + FeedbackSink
{
}

impl<T> Collaborators for T where
    T: ActionExecutor + UrgentConfirmer + SaveSnoozeSelector + ActionSelector + FeedbackSink
{
}

/// Scripted answers for every collaborator, for headless runs and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollaboratorScript {
    pub confirm_urgent: bool,
    pub save_snooze: SaveSnoozeChoice,
    /// Action picked from the selector; `None` picks the first listed action.
    pub selection: Option<String>,
    pub dismiss_selector: bool,
    pub failing_actions: BTreeSet<String>,
}

impl Default for CollaboratorScript {
    fn default() -> Self {
        Self {
            confirm_urgent: true,
            save_snooze: SaveSnoozeChoice::Save {
                folder: "Saved".to_string(),
            },
            selection: None,
            dismiss_selector: false,
            failing_actions: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct SimulatedCollaborators {
    script: CollaboratorScript,
    executed: Vec<ActionExecutionRequest>,
    feedback: Vec<ClassificationFeedback>,
    confirmations: usize,
}

impl SimulatedCollaborators {
    pub fn new(script: CollaboratorScript) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    pub fn executed(&self) -> &[ActionExecutionRequest] {
        &self.executed
    }

    pub fn feedback(&self) -> &[ClassificationFeedback] {
        &self.feedback
    }

    pub fn confirmations(&self) -> usize {
        self.confirmations
    }
}

impl ActionExecutor for SimulatedCollaborators {
    fn execute(&mut self, request: &ActionExecutionRequest) -> ActionExecutionReport {
        self.executed.push(request.clone());
        if self
            .script
            .failing_actions
            .contains(&request.action.action_id)
        {
            return ActionExecutionReport::failed(request, "simulated failure");
        }
        ActionExecutionReport::succeeded(request)
    }
}

impl UrgentConfirmer for SimulatedCollaborators {
    fn confirm_dismiss(&mut self, _card: &Card) -> bool {
        self.confirmations += 1;
        self.script.confirm_urgent
    }
}

impl SaveSnoozeSelector for SimulatedCollaborators {
    fn choose(&mut self, _card: &Card) -> SaveSnoozeChoice {
        self.script.save_snooze.clone()
    }
}

impl ActionSelector for SimulatedCollaborators {
    fn select(&mut self, _card: &Card, actions: &[SuggestedAction]) -> Option<String> {
        if self.script.dismiss_selector {
            return None;
        }
        self.script
            .selection
            .clone()
            .or_else(|| actions.first().map(|action| action.id.clone()))
    }
}

impl FeedbackSink for SimulatedCollaborators {
    fn submit(&mut self, feedback: ClassificationFeedback) {
        self.feedback.push(feedback);
    }
}
