use super::*;
use pretty_assertions::assert_eq;

#[test]
fn drag_progress_reports_reveal_and_single_haptic() {
    let mut state = state_with(vec![card("a", Category::Primary)], Category::Primary);

    let mut haptics = 0;
    let mut last_progress = 0.0;
    for _ in 0..6 {
        let effects = user(
            &mut state,
            UserAction::DragChanged {
                delta: DragTranslation::new(40.0, 0.0),
            },
            t0(),
        );
        haptics += effects
            .iter()
            .filter(|effect| matches!(effect, TriageEffect::Haptic))
            .count();
        if let Some(TriageEvent::DragProgressed {
            reveal_progress, ..
        }) = events(&effects).last()
        {
            last_progress = *reveal_progress;
        }
    }

    assert_eq!(haptics, 1);
    assert_eq!(last_progress, 1.0);
    assert_eq!(state.gesture.phase(), GesturePhase::Dragging);
}

#[test]
fn short_release_reverts_without_mutation() {
    let mut state = state_with(vec![card("a", Category::Primary)], Category::Primary);

    let effects = swipe(&mut state, "a", 60.0, 0.0, t0());

    assert_eq!(
        effects,
        vec![TriageEffect::Emit(TriageEvent::GestureReverted)]
    );
    assert_eq!(state_of(&state, "a"), CardState::Unseen);
    assert!(!state.undo.is_armed());
    assert_idle(&state);
}

#[test]
fn release_exactly_at_threshold_reverts() {
    let mut state = state_with(vec![card("a", Category::Primary)], Category::Primary);
    swipe(&mut state, "a", 80.0, 0.0, t0());
    assert_eq!(state_of(&state, "a"), CardState::Unseen);
}

#[test]
fn platform_cancel_reverts_even_past_threshold() {
    let mut state = state_with(vec![card("a", Category::Primary)], Category::Primary);
    user(
        &mut state,
        UserAction::DragChanged {
            delta: DragTranslation::new(300.0, 0.0),
        },
        t0(),
    );

    let effects = user(&mut state, UserAction::DragCancelled, t0());

    assert_eq!(
        effects,
        vec![TriageEffect::Emit(TriageEvent::GestureReverted)]
    );
    assert_eq!(state_of(&state, "a"), CardState::Unseen);
    assert_idle(&state);
    assert!(user(&mut state, UserAction::DragCancelled, t0()).is_empty());
}

#[test]
fn stale_release_on_acted_card_is_logged_noop() {
    let mut state = state_with(
        vec![card("a", Category::Primary), card("b", Category::Primary)],
        Category::Primary,
    );
    swipe(&mut state, "a", 250.0, 0.0, t0());
    let armed_before = state.undo.armed().cloned();
    let warnings_before = state.logs.at_least(LogLevel::Warn).count();

    let effects = swipe(&mut state, "a", -250.0, 0.0, at(1));

    assert_eq!(
        effects,
        vec![TriageEffect::Emit(TriageEvent::GestureReverted)]
    );
    assert_eq!(state.undo.armed().cloned(), armed_before);
    assert_eq!(state_of(&state, "b"), CardState::Unseen);
    assert_eq!(
        state.logs.at_least(LogLevel::Warn).count(),
        warnings_before + 1
    );
    assert_idle(&state);
}

#[test]
fn release_on_unknown_card_is_ignored() {
    let mut state = state_with(vec![card("a", Category::Primary)], Category::Primary);
    let effects = swipe(&mut state, "ghost", 250.0, 0.0, t0());
    assert_eq!(
        effects,
        vec![TriageEffect::Emit(TriageEvent::GestureReverted)]
    );
    assert_eq!(state_of(&state, "a"), CardState::Unseen);
}

#[test]
fn release_on_card_below_top_is_logged_noop() {
    let mut state = state_with(
        vec![card("p1", Category::Primary), card("p2", Category::Primary)],
        Category::Primary,
    );

    let effects = swipe(&mut state, "p2", -250.0, 0.0, t0());

    assert_eq!(
        effects,
        vec![TriageEffect::Emit(TriageEvent::GestureReverted)]
    );
    assert_eq!(state_of(&state, "p1"), CardState::Unseen);
    assert_eq!(state_of(&state, "p2"), CardState::Unseen);
    assert!(!state.undo.is_armed());
    assert_eq!(state.logs.at_least(LogLevel::Warn).count(), 1);
    assert_idle(&state);
}

#[test]
fn release_on_card_in_other_category_is_logged_noop() {
    let mut state = state_with(
        vec![
            card("p1", Category::Primary),
            card("p2", Category::Primary),
            card("d1", Category::Promotional),
        ],
        Category::Primary,
    );

    let effects = swipe(&mut state, "d1", 250.0, 0.0, t0());

    assert_eq!(
        effects,
        vec![TriageEffect::Emit(TriageEvent::GestureReverted)]
    );
    assert_eq!(state_of(&state, "d1"), CardState::Unseen);
    assert!(!state.undo.is_armed());
    assert_eq!(state.active_category(), Category::Primary);
    assert_eq!(
        state.top_card().map(|top| top.id.to_string()),
        Some("p1".to_string())
    );

    let effects = swipe(&mut state, "p1", 250.0, 0.0, at(1));
    assert_eq!(state_of(&state, "p1"), CardState::ActedUpon);
    assert!(events(&effects).contains(&&TriageEvent::CardStateChanged {
        card_id: CardId::from("p1"),
        state: CardState::ActedUpon,
    }));
}
