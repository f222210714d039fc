//! Bounded slice of the filtered stack that needs rendering.

use super::state::Card;

pub const DEFAULT_LOOKAHEAD: usize = 4;
/// Cards deeper than this are materialized but not drawn.
pub const MAX_VISIBLE_DEPTH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedCard<'a> {
    pub card: &'a Card,
    pub stack_offset: usize,
}

impl ProjectedCard<'_> {
    pub fn depth(&self) -> StackDepth {
        StackDepth::for_offset(self.stack_offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackDepth {
    pub scale: f64,
    pub opacity: f64,
    pub hidden: bool,
}

impl StackDepth {
    pub fn for_offset(offset: usize) -> Self {
        let step = offset.min(MAX_VISIBLE_DEPTH + 1) as f64;
        Self {
            scale: 1.0 - 0.05 * step,
            opacity: (1.0 - 0.15 * step).max(0.0),
            hidden: offset > MAX_VISIBLE_DEPTH,
        }
    }
}

/// Returns at most `lookahead + 1` cards starting at `cursor`, whatever the inbox size.
pub fn project<'a>(filtered: &[&'a Card], cursor: usize, lookahead: usize) -> Vec<ProjectedCard<'a>> {
    let start = cursor.min(filtered.len());
    filtered[start..]
        .iter()
        .copied()
        .take(lookahead.saturating_add(1))
        .enumerate()
        .map(|(stack_offset, card)| ProjectedCard { card, stack_offset })
        .collect()
}
