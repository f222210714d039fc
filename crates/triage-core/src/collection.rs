use std::collections::HashMap;

use super::state::Card;
use super::state::CardId;
use super::state::CardState;
use super::state::Category;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    #[error("duplicate card id `{0}`")]
    DuplicateCardId(CardId),
    #[error("card `{card_id}` lists suggested action `{action_id}` more than once")]
    DuplicateActionId { card_id: CardId, action_id: String },
}

/// Master card list plus the active category filter.
///
/// Cards are never removed: acting on a card only flips its state, so undo can
/// bring it back. `order` is the presentation order over `cards`; it starts as
/// insertion order and only changes when a reverted card is moved to the front.
#[derive(Debug, Clone)]
pub struct CardCollection {
    cards: Vec<Card>,
    order: Vec<usize>,
    index: HashMap<CardId, usize>,
    category: Category,
}

impl CardCollection {
    pub fn new(cards: Vec<Card>, category: Category) -> Result<Self, CollectionError> {
        let mut index = HashMap::with_capacity(cards.len());
        for (idx, card) in cards.iter().enumerate() {
            if let Some(action_id) = card.duplicate_action_id() {
                return Err(CollectionError::DuplicateActionId {
                    card_id: card.id.clone(),
                    action_id: action_id.to_string(),
                });
            }
            if index.insert(card.id.clone(), idx).is_some() {
                return Err(CollectionError::DuplicateCardId(card.id.clone()));
            }
        }
        Ok(Self {
            order: (0..cards.len()).collect(),
            cards,
            index,
            category,
        })
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Cursor values are relative to the filtered view of the *current* category;
    /// callers must re-read `filtered()` after switching.
    pub fn set_category(&mut self, category: Category) {
        self.category = category;
    }

    pub fn filtered(&self) -> Vec<&Card> {
        self.filtered_for(self.category)
    }

    pub fn filtered_for(&self, category: Category) -> Vec<&Card> {
        self.order
            .iter()
            .map(|&idx| &self.cards[idx])
            .filter(|card| card.category == category && card.is_unseen())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.unseen_count(self.category)
    }

    pub fn unseen_count(&self, category: Category) -> usize {
        self.cards
            .iter()
            .filter(|card| card.category == category && card.is_unseen())
            .count()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, card_id: &CardId) -> Option<&Card> {
        self.index.get(card_id).map(|&idx| &self.cards[idx])
    }

    /// Returns `true` when the card transitioned; a second call is a no-op.
    pub fn mark_acted_upon(&mut self, card_id: &CardId) -> bool {
        match self.card_mut(card_id) {
            Some(card) if card.state == CardState::Unseen => {
                card.state = CardState::ActedUpon;
                true
            }
            _ => false,
        }
    }

    /// Returns `true` when the card transitioned back to unseen. The card moves to
    /// the front of the presentation order so it is the next card of its category.
    pub fn revert(&mut self, card_id: &CardId) -> bool {
        let Some(&idx) = self.index.get(card_id) else {
            return false;
        };
        if self.cards[idx].state != CardState::ActedUpon {
            return false;
        }
        self.cards[idx].state = CardState::Unseen;
        if let Some(pos) = self.order.iter().position(|&entry| entry == idx) {
            self.order.remove(pos);
            self.order.insert(0, idx);
        }
        true
    }

    fn card_mut(&mut self, card_id: &CardId) -> Option<&mut Card> {
        let idx = *self.index.get(card_id)?;
        self.cards.get_mut(idx)
    }
}
