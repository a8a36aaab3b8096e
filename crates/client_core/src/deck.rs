//! Ordered queue of undecided job cards.

use shared::domain::{FitReport, JobId, JobPosting};

/// Non-negative modulo; a zero-length deck always maps to index 0.
pub fn wrap_index(index: i64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let n = len as i64;
    (((index % n) + n) % n) as usize
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: JobId,
    pub posting: JobPosting,
    pub fit: Option<FitReport>,
}

impl From<JobPosting> for Card {
    fn from(posting: JobPosting) -> Self {
        Self {
            id: posting.id,
            posting,
            fit: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Deck {
    cards: Vec<Card>,
    index: usize,
}

impl Deck {
    pub fn new(cards: Vec<Card>) -> Self {
        Self { cards, index: 0 }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn cards_mut(&mut self) -> &mut [Card] {
        &mut self.cards
    }

    pub fn current_index(&self) -> usize {
        wrap_index(self.index as i64, self.cards.len())
    }

    pub fn current(&self) -> Option<&Card> {
        self.cards.get(self.current_index())
    }

    pub fn get(&self, id: JobId) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == id)
    }

    pub fn get_mut(&mut self, id: JobId) -> Option<&mut Card> {
        self.cards.iter_mut().find(|card| card.id == id)
    }

    pub fn contains(&self, id: JobId) -> bool {
        self.get(id).is_some()
    }

    /// Moves the cursor by `delta`, wrapping in both directions.
    pub fn advance(&mut self, delta: i64) -> Option<&Card> {
        let len = self.cards.len();
        let step = wrap_index(delta, len);
        self.index = wrap_index((self.current_index() + step) as i64, len);
        self.current()
    }

    /// Removes a card by identity, keeping the cursor on the same logical card
    /// when the removed one sat before it.
    pub fn remove(&mut self, id: JobId) -> Option<Card> {
        let position = self.cards.iter().position(|card| card.id == id)?;
        let cursor = self.current_index();
        let card = self.cards.remove(position);
        let cursor = if position < cursor { cursor - 1 } else { cursor };
        self.index = wrap_index(cursor as i64, self.cards.len());
        Some(card)
    }

    pub fn replace(&mut self, cards: Vec<Card>) {
        self.cards = cards;
        self.index = 0;
    }
}

#[cfg(test)]
#[path = "tests/deck_tests.rs"]
mod tests;
