use std::collections::VecDeque;

use chrono::DateTime;
use chrono::TimeDelta;
use chrono::Utc;

use triage_core::actions::Disposition;
use triage_core::actions::RuntimeAction;
use triage_core::actions::TriageAction;
use triage_core::actions::UserAction;
use triage_core::persistence::PreferenceEvent;
use triage_core::persistence::PreferenceStore;
use triage_core::reducer::reduce;
use triage_core::reducer::TriageEffect;
use triage_core::reducer::TriageEvent;
use triage_core::state::CardId;
use triage_core::state::LogEntry;
use triage_core::state::LogLevel;
use triage_core::state::LogSource;
use triage_core::state::TriageState;

use crate::collaborators::Collaborators;
use crate::contracts::ActionExecutionReport;
use crate::contracts::ActionExecutionRequest;
use crate::contracts::ClassificationFeedback;
use crate::contracts::ExecutionStatus;
use crate::contracts::SaveSnoozeChoice;

/// Upper bound on follow-up actions processed for one host action.
pub const MAX_FOLLOW_UPS: usize = 16;

#[derive(Debug, Default, Clone)]
pub struct Dispatched {
    pub events: Vec<TriageEvent>,
    pub follow_ups: Vec<TriageAction>,
    pub preferences: Vec<PreferenceEvent>,
    pub reports: Vec<ActionExecutionReport>,
    pub haptics: usize,
}

/// Routes reducer effects to collaborators. Answers that must flow back into
/// the core are returned as follow-up actions, never applied here.
pub fn dispatch<C: Collaborators + ?Sized>(
    state: &mut TriageState,
    effects: Vec<TriageEffect>,
    collaborators: &mut C,
    now: DateTime<Utc>,
) -> Dispatched {
    let mut out = Dispatched::default();
    for effect in effects {
        match effect {
            TriageEffect::Emit(event) => out.events.push(event),
            TriageEffect::Haptic => out.haptics += 1,
            TriageEffect::ExecuteAction { card_id, action } => {
                let request = ActionExecutionRequest { card_id, action };
                let report = collaborators.execute(&request);
                if report.status == ExecutionStatus::Failed {
                    out.follow_ups
                        .push(TriageAction::Runtime(RuntimeAction::ActionExecutionFailed {
                            card_id: report.card_id.clone(),
                            action_id: report.action_id.clone(),
                            message: report.message.clone().unwrap_or_default(),
                        }));
                }
                out.reports.push(report);
            }
            TriageEffect::RequestUrgentConfirmation { card_id } => {
                let Some(card) = state.collection.get(&card_id) else {
                    missing_card(state, &card_id, "urgent confirmation", now);
                    continue;
                };
                let confirmed = collaborators.confirm_dismiss(card);
                out.follow_ups
                    .push(TriageAction::User(UserAction::UrgentConfirmationResolved {
                        card_id,
                        confirmed,
                    }));
            }
            TriageEffect::OpenSaveSnooze { card_id } => {
                let Some(card) = state.collection.get(&card_id) else {
                    missing_card(state, &card_id, "save/snooze", now);
                    continue;
                };
                let disposition = disposition_for(collaborators.choose(card), now);
                out.follow_ups
                    .push(TriageAction::Runtime(RuntimeAction::SaveSnoozeResolved {
                        card_id,
                        disposition,
                    }));
            }
            TriageEffect::OpenActionSelector { card_id, actions } => {
                let Some(card) = state.collection.get(&card_id) else {
                    missing_card(state, &card_id, "action selector", now);
                    continue;
                };
                if let Some(action_id) = collaborators.select(card, &actions) {
                    out.follow_ups
                        .push(TriageAction::User(UserAction::SelectAction { card_id, action_id }));
                }
            }
            TriageEffect::SubmitClassificationFeedback { card_id, from, to } => {
                collaborators.submit(ClassificationFeedback { card_id, from, to });
            }
            TriageEffect::PersistPreference(event) => out.preferences.push(event),
        }
    }
    out
}

pub fn disposition_for(choice: SaveSnoozeChoice, now: DateTime<Utc>) -> Disposition {
    match choice {
        SaveSnoozeChoice::Save { folder } => Disposition::SaveToFolder { folder },
        SaveSnoozeChoice::Snooze { minutes } => Disposition::Snooze {
            until: now + TimeDelta::minutes(minutes.max(0)),
        },
        SaveSnoozeChoice::Cancel => Disposition::Cancelled,
    }
}

fn missing_card(state: &mut TriageState, card_id: &CardId, surface: &str, now: DateTime<Utc>) {
    state.log(
        LogEntry::new(
            LogLevel::Warn,
            LogSource::Host,
            format!("{surface} requested for unknown card"),
        )
        .at(now.timestamp_millis())
        .for_card(card_id),
    );
}

/// Drives the reducer and its collaborators until no follow-up work remains.
pub struct Session<C> {
    state: TriageState,
    collaborators: C,
    store: Option<PreferenceStore>,
    haptics: usize,
}

impl<C: Collaborators> Session<C> {
    pub fn new(state: TriageState, collaborators: C) -> Self {
        Self {
            state,
            collaborators,
            store: None,
            haptics: 0,
        }
    }

    pub fn with_store(mut self, store: PreferenceStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn state(&self) -> &TriageState {
        &self.state
    }

    pub fn collaborators(&self) -> &C {
        &self.collaborators
    }

    pub fn haptics(&self) -> usize {
        self.haptics
    }

    /// Applies `action` and every follow-up it triggers, returning the events
    /// emitted along the way. Preference write failures are logged into the
    /// state; the in-memory preference still applies for this session.
    pub fn apply(&mut self, action: TriageAction, now: DateTime<Utc>) -> Vec<TriageEvent> {
        let mut queue = VecDeque::from([action]);
        let mut events = Vec::new();
        let mut processed = 0usize;
        while let Some(next) = queue.pop_front() {
            if processed > MAX_FOLLOW_UPS {
                self.state.log(
                    LogEntry::new(
                        LogLevel::Error,
                        LogSource::Host,
                        format!("dropped {} follow-up actions", queue.len() + 1),
                    )
                    .at(now.timestamp_millis()),
                );
                break;
            }
            processed += 1;

            let effects = reduce(&mut self.state, next, now);
            let dispatched = dispatch(&mut self.state, effects, &mut self.collaborators, now);
            if let Some(store) = self.store.as_mut() {
                for event in dispatched.preferences {
                    if let Err(err) = store.append(event) {
                        self.state.log(
                            LogEntry::new(
                                LogLevel::Error,
                                LogSource::Host,
                                format!("persist preference to {}: {err}", store.path().display()),
                            )
                            .at(now.timestamp_millis()),
                        );
                    }
                }
            }
            self.haptics += dispatched.haptics;
            events.extend(dispatched.events);
            queue.extend(dispatched.follow_ups);
        }
        events
    }
}
