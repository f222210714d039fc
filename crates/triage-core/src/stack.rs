use super::collection::CardCollection;
use super::state::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The active category still has cards.
    Stayed,
    SwitchedCategory { from: Category, to: Category },
    /// Neither category has unseen cards left.
    Exhausted,
}

/// Keeps `cursor` inside `[0, len]`. Out-of-range values are a bug: they trip a
/// debug assertion and clamp in release builds.
pub fn clamp_cursor(cursor: usize, len: usize) -> usize {
    debug_assert!(cursor <= len, "cursor {cursor} outside filtered view of {len}");
    cursor.min(len)
}

/// Re-derives the filtered view after a commit. The acted card has already dropped
/// out of the filter, so the cursor keeps its position over the shrunk list.
pub fn advance(collection: &mut CardCollection, cursor: &mut usize) -> Advance {
    let len = collection.count();
    *cursor = clamp_cursor(*cursor, len);
    if *cursor < len {
        return Advance::Stayed;
    }

    let from = collection.category();
    let to = from.other();
    if collection.unseen_count(to) == 0 {
        return Advance::Exhausted;
    }
    collection.set_category(to);
    *cursor = 0;
    Advance::SwitchedCategory { from, to }
}
