use chrono::DateTime;
use chrono::Utc;

use super::actions::Disposition;
use super::actions::RuntimeAction;
use super::actions::TriageAction;
use super::actions::UserAction;
use super::gesture::GestureOutcome;
use super::persistence::PreferenceEvent;
use super::resolution::resolve_effective_action;
use super::resolution::ResolutionSource;
use super::resolution::ResolvedAction;
use super::stack::advance;
use super::stack::Advance;
use super::state::CardId;
use super::state::CardState;
use super::state::Category;
use super::state::CommitKind;
use super::state::DragTranslation;
use super::state::LogEntry;
use super::state::LogLevel;
use super::state::LogSource;
use super::state::SuggestedAction;
use super::state::SwipeDirection;
use super::state::TriageState;
use super::undo::PendingUndo;
use super::undo::UndoAttempt;
use super::undo::UndoResolution;

/// Discrete change notifications for the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub enum TriageEvent {
    DragProgressed {
        translation: DragTranslation,
        reveal_progress: f64,
        direction: Option<SwipeDirection>,
    },
    GestureReverted,
    CardStateChanged {
        card_id: CardId,
        state: CardState,
    },
    CategorySwitched {
        from: Category,
        to: Category,
    },
    StackExhausted,
    UndoArmed {
        card_id: CardId,
        label: String,
        deadline: DateTime<Utc>,
    },
    UndoResolved {
        card_id: CardId,
        resolution: UndoResolution,
    },
    OverrideChanged {
        card_id: CardId,
        action_id: Option<String>,
    },
    FirstCardHintDismissed,
}

/// Work handed to collaborators outside the core. None of these are awaited.
#[derive(Debug, Clone, PartialEq)]
pub enum TriageEffect {
    Emit(TriageEvent),
    Haptic,
    ExecuteAction {
        card_id: CardId,
        action: ResolvedAction,
    },
    RequestUrgentConfirmation {
        card_id: CardId,
    },
    OpenSaveSnooze {
        card_id: CardId,
    },
    OpenActionSelector {
        card_id: CardId,
        actions: Vec<SuggestedAction>,
    },
    SubmitClassificationFeedback {
        card_id: CardId,
        from: Category,
        to: Category,
    },
    PersistPreference(PreferenceEvent),
}

pub fn reduce(
    state: &mut TriageState,
    action: TriageAction,
    now: DateTime<Utc>,
) -> Vec<TriageEffect> {
    match action {
        TriageAction::User(user) => reduce_user(state, user, now),
        TriageAction::Runtime(runtime) => reduce_runtime(state, runtime, now),
    }
}

fn reduce_user(state: &mut TriageState, action: UserAction, now: DateTime<Utc>) -> Vec<TriageEffect> {
    match action {
        UserAction::DragChanged { delta } => {
            let update = state.gesture.on_drag_change(delta);
            let mut effects = Vec::with_capacity(2);
            if update.haptic {
                effects.push(TriageEffect::Haptic);
            }
            effects.push(TriageEffect::Emit(TriageEvent::DragProgressed {
                translation: update.translation,
                reveal_progress: update.reveal_progress,
                direction: update.direction,
            }));
            effects
        }
        UserAction::DragEnded {
            card_id,
            translation,
        } => {
            let release = state.gesture.on_drag_end(translation);
            if !is_actionable(state, &card_id, now) || !is_top_card(state, &card_id, now) {
                return vec![TriageEffect::Emit(TriageEvent::GestureReverted)];
            }
            match release.outcome {
                GestureOutcome::Revert => vec![TriageEffect::Emit(TriageEvent::GestureReverted)],
                GestureOutcome::Commit(direction) => {
                    log(
                        state,
                        LogEntry::new(
                            LogLevel::Debug,
                            LogSource::Gesture,
                            format!(
                                "swipe {} at distance {:.0}",
                                direction.label(),
                                release.distance
                            ),
                        )
                        .for_card(&card_id),
                        now,
                    );
                    commit_swipe(state, card_id, direction, now)
                }
            }
        }
        UserAction::DragCancelled => {
            if state.gesture.cancel() {
                vec![TriageEffect::Emit(TriageEvent::GestureReverted)]
            } else {
                Vec::new()
            }
        }
        UserAction::Undo => undo(state, now),
        UserAction::DismissUndo => match state.undo.cancel() {
            Some(pending) => vec![finalized(pending)],
            None => Vec::new(),
        },
        UserAction::SetCategory(category) => {
            let from = state.collection.category();
            if from == category {
                return Vec::new();
            }
            state.collection.set_category(category);
            // The cursor keeps its numeric value but is relative to the new view.
            state.cursor = state.cursor.min(state.collection.count());
            state.exhausted = all_exhausted(state);
            vec![TriageEffect::Emit(TriageEvent::CategorySwitched {
                from,
                to: category,
            })]
        }
        UserAction::UrgentConfirmationResolved { card_id, confirmed } => {
            if !confirmed {
                log(
                    state,
                    LogEntry::new(LogLevel::Info, LogSource::Gesture, "urgent dismiss cancelled")
                        .for_card(&card_id),
                    now,
                );
                return Vec::new();
            }
            if !is_actionable(state, &card_id, now) {
                return Vec::new();
            }
            commit(state, card_id, CommitKind::MarkedRead, None, now)
        }
        UserAction::SelectAction { card_id, action_id } => select_action(state, card_id, action_id, now),
        UserAction::SetActionOverride { card_id, action_id } => {
            if state.overrides.get(&card_id) == Some(&action_id) {
                return Vec::new();
            }
            state.overrides.insert(card_id.clone(), action_id.clone());
            vec![
                TriageEffect::PersistPreference(PreferenceEvent::OverrideSet {
                    card_id: card_id.clone(),
                    action_id: action_id.clone(),
                }),
                TriageEffect::Emit(TriageEvent::OverrideChanged {
                    card_id,
                    action_id: Some(action_id),
                }),
            ]
        }
        UserAction::ClearActionOverride { card_id } => {
            if state.overrides.remove(&card_id).is_none() {
                return Vec::new();
            }
            vec![
                TriageEffect::PersistPreference(PreferenceEvent::OverrideCleared {
                    card_id: card_id.clone(),
                }),
                TriageEffect::Emit(TriageEvent::OverrideChanged {
                    card_id,
                    action_id: None,
                }),
            ]
        }
        UserAction::Reclassify { card_id, to } => {
            let Some(card) = state.collection.get(&card_id) else {
                log(
                    state,
                    LogEntry::new(LogLevel::Warn, LogSource::Host, "reclassify for unknown card")
                        .for_card(&card_id),
                    now,
                );
                return Vec::new();
            };
            let from = card.category;
            if from == to {
                return Vec::new();
            }
            vec![TriageEffect::SubmitClassificationFeedback { card_id, from, to }]
        }
        UserAction::DismissFirstCardHint => {
            if state.hint.has_seen {
                return Vec::new();
            }
            state.hint.has_seen = true;
            vec![
                TriageEffect::PersistPreference(PreferenceEvent::FirstCardHintSeen),
                TriageEffect::Emit(TriageEvent::FirstCardHintDismissed),
            ]
        }
    }
}

fn reduce_runtime(
    state: &mut TriageState,
    action: RuntimeAction,
    now: DateTime<Utc>,
) -> Vec<TriageEffect> {
    match action {
        RuntimeAction::Tick | RuntimeAction::Resumed => match state.undo.tick(now) {
            Some(pending) => vec![finalized(pending)],
            None => Vec::new(),
        },
        RuntimeAction::SaveSnoozeResolved {
            card_id,
            disposition,
        } => {
            let commit_kind = match disposition {
                Disposition::SaveToFolder { folder } => CommitKind::SavedToFolder { folder },
                Disposition::Snooze { until } => CommitKind::Snoozed {
                    until_ms: until.timestamp_millis(),
                },
                Disposition::Cancelled => {
                    log(
                        state,
                        LogEntry::new(LogLevel::Info, LogSource::Host, "save/snooze cancelled")
                            .for_card(&card_id),
                        now,
                    );
                    return Vec::new();
                }
            };
            if !is_actionable(state, &card_id, now) {
                return Vec::new();
            }
            commit(state, card_id, commit_kind, None, now)
        }
        RuntimeAction::ActionExecutionFailed {
            card_id,
            action_id,
            message,
        } => {
            // The swipe was committed optimistically; failures are reported, not rolled back.
            log(
                state,
                LogEntry::new(
                    LogLevel::Warn,
                    LogSource::Host,
                    format!("action `{action_id}` failed: {message}"),
                )
                .for_card(&card_id),
                now,
            );
            Vec::new()
        }
    }
}

fn commit_swipe(
    state: &mut TriageState,
    card_id: CardId,
    direction: SwipeDirection,
    now: DateTime<Utc>,
) -> Vec<TriageEffect> {
    match direction {
        SwipeDirection::Right => {
            let Some(card) = state.collection.get(&card_id) else {
                return Vec::new();
            };
            let action = resolve_effective_action(card, &state.overrides, &state.fallback_table);
            if action.source == ResolutionSource::Generic {
                log(
                    state,
                    LogEntry::new(
                        LogLevel::Warn,
                        LogSource::Resolution,
                        "no suggested or fallback action, using view details",
                    )
                    .for_card(&card_id),
                    now,
                );
            }
            let commit_kind = CommitKind::TookAction {
                action_id: action.action_id.clone(),
            };
            commit(state, card_id, commit_kind, Some(action), now)
        }
        SwipeDirection::Left => {
            let urgent = state
                .collection
                .get(&card_id)
                .is_some_and(|card| card.urgent);
            if urgent {
                return vec![TriageEffect::RequestUrgentConfirmation { card_id }];
            }
            commit(state, card_id, CommitKind::MarkedRead, None, now)
        }
        SwipeDirection::Down => vec![TriageEffect::OpenSaveSnooze { card_id }],
        SwipeDirection::Up => {
            let actions = state
                .collection
                .get(&card_id)
                .map(|card| card.suggested_actions.clone())
                .unwrap_or_default();
            vec![TriageEffect::OpenActionSelector { card_id, actions }]
        }
    }
}

/// Mutation first, then execution, then the undo window, then advancement.
fn commit(
    state: &mut TriageState,
    card_id: CardId,
    commit_kind: CommitKind,
    action: Option<ResolvedAction>,
    now: DateTime<Utc>,
) -> Vec<TriageEffect> {
    if !state.collection.mark_acted_upon(&card_id) {
        log(
            state,
            LogEntry::new(LogLevel::Warn, LogSource::Collection, "card already acted upon")
                .for_card(&card_id),
            now,
        );
        return Vec::new();
    }
    let Some(category) = state.collection.get(&card_id).map(|card| card.category) else {
        return Vec::new();
    };

    let mut effects = vec![TriageEffect::Emit(TriageEvent::CardStateChanged {
        card_id: card_id.clone(),
        state: CardState::ActedUpon,
    })];

    if let Some(action) = action {
        effects.push(TriageEffect::ExecuteAction {
            card_id: card_id.clone(),
            action,
        });
    }

    if let Some(previous) = state
        .undo
        .open(card_id.clone(), category, commit_kind, now)
    {
        effects.push(finalized(previous));
    }
    if let Some(armed) = state.undo.armed() {
        effects.push(TriageEffect::Emit(TriageEvent::UndoArmed {
            card_id: armed.card_id.clone(),
            label: armed.label.clone(),
            deadline: armed.deadline,
        }));
    }

    // Advancement is relative to the category the card was acted on in.
    if state.collection.category() == category {
        match advance(&mut state.collection, &mut state.cursor) {
            Advance::Stayed => {}
            Advance::SwitchedCategory { from, to } => {
                effects.push(TriageEffect::Emit(TriageEvent::CategorySwitched { from, to }));
            }
            Advance::Exhausted => {
                effects.push(TriageEffect::Emit(TriageEvent::StackExhausted));
            }
        }
    }
    state.exhausted = all_exhausted(state);
    effects
}

fn undo(state: &mut TriageState, now: DateTime<Utc>) -> Vec<TriageEffect> {
    let pending = match state.undo.undo(now) {
        UndoAttempt::Reverted(pending) => pending,
        UndoAttempt::Expired(pending) => {
            log(
                state,
                LogEntry::new(LogLevel::Info, LogSource::Undo, "undo after deadline, finalized")
                    .for_card(&pending.card_id),
                now,
            );
            return vec![finalized(pending)];
        }
        UndoAttempt::NotArmed => return Vec::new(),
    };

    let mut effects = Vec::with_capacity(3);
    if !state.collection.revert(&pending.card_id) {
        log(
            state,
            LogEntry::new(LogLevel::Error, LogSource::Undo, "armed card was not acted upon")
                .for_card(&pending.card_id),
            now,
        );
    } else {
        effects.push(TriageEffect::Emit(TriageEvent::CardStateChanged {
            card_id: pending.card_id.clone(),
            state: CardState::Unseen,
        }));
    }
    if let CommitKind::TookAction { action_id } = &pending.commit {
        log(
            state,
            LogEntry::new(
                LogLevel::Debug,
                LogSource::Undo,
                format!("reverted card; executed action `{action_id}` is not recalled"),
            )
            .for_card(&pending.card_id),
            now,
        );
    }

    let from = state.collection.category();
    if from != pending.category {
        state.collection.set_category(pending.category);
        effects.push(TriageEffect::Emit(TriageEvent::CategorySwitched {
            from,
            to: pending.category,
        }));
    }
    state.cursor = 0;
    state.exhausted = false;

    effects.push(TriageEffect::Emit(TriageEvent::UndoResolved {
        card_id: pending.card_id,
        resolution: UndoResolution::Reverted,
    }));
    effects
}

fn select_action(
    state: &mut TriageState,
    card_id: CardId,
    action_id: String,
    now: DateTime<Utc>,
) -> Vec<TriageEffect> {
    let Some(card) = state.collection.get(&card_id) else {
        log(
            state,
            LogEntry::new(LogLevel::Warn, LogSource::Host, "selection for unknown card")
                .for_card(&card_id),
            now,
        );
        return Vec::new();
    };

    let selected = card
        .suggested_action(&action_id)
        .map(|suggested| ResolvedAction::from_suggestion(suggested, ResolutionSource::Selected))
        .or_else(|| {
            state
                .fallback_table
                .applicable(card)
                .find(|entry| entry.action_id == action_id)
                .map(|entry| ResolvedAction {
                    action_id: entry.action_id.clone(),
                    label: entry.label.clone(),
                    description: (!entry.description.is_empty())
                        .then(|| entry.description.clone()),
                    url: None,
                    source: ResolutionSource::Selected,
                })
        });
    let Some(action) = selected else {
        log(
            state,
            LogEntry::new(
                LogLevel::Warn,
                LogSource::Resolution,
                format!("selected action `{action_id}` is not offered"),
            )
            .for_card(&card_id),
            now,
        );
        return Vec::new();
    };
    vec![TriageEffect::ExecuteAction { card_id, action }]
}

/// Unknown or already-acted cards are stale gestures: logged and ignored.
fn is_actionable(state: &mut TriageState, card_id: &CardId, now: DateTime<Utc>) -> bool {
    let message = match state.collection.get(card_id) {
        Some(card) if card.is_unseen() => return true,
        Some(_) => "gesture on card already acted upon",
        None => "gesture on unknown card",
    };
    log(
        state,
        LogEntry::new(LogLevel::Warn, LogSource::Gesture, message).for_card(card_id),
        now,
    );
    false
}

/// Gestures only ever apply to the card on top of the active view.
fn is_top_card(state: &mut TriageState, card_id: &CardId, now: DateTime<Utc>) -> bool {
    if state.top_card().is_some_and(|top| &top.id == card_id) {
        return true;
    }
    log(
        state,
        LogEntry::new(LogLevel::Warn, LogSource::Gesture, "gesture on card that is not on top")
            .for_card(card_id),
        now,
    );
    false
}

fn all_exhausted(state: &TriageState) -> bool {
    Category::ALL
        .into_iter()
        .all(|category| state.collection.unseen_count(category) == 0)
}

fn finalized(pending: PendingUndo) -> TriageEffect {
    TriageEffect::Emit(TriageEvent::UndoResolved {
        card_id: pending.card_id,
        resolution: UndoResolution::Finalized,
    })
}

fn log(state: &mut TriageState, entry: LogEntry, now: DateTime<Utc>) {
    state.log(entry.at(now.timestamp_millis()));
}

#[cfg(test)]
mod tests;
