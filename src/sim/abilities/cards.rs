//! Card deck and hand for card-driven ability selection.
//!
//! Cards move around four piles: the deck's available and discarded piles and
//! the hand's available and discarded piles. No card is ever created or lost,
//! so the four piles together always hold exactly the deck the owner started
//! with.

use bevy::prelude::*;
use rand::Rng;

use super::{AbilityId, CardId};

/// Fisher-Yates, front to back.
fn shuffle_cards<R: Rng + ?Sized>(cards: &mut [CardId], rng: &mut R) {
    let len = cards.len();
    for i in 0..len {
        let j = rng.gen_range(i..len);
        cards.swap(i, j);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AbilityDeck {
    base: Vec<CardId>,
    available: Vec<CardId>,
    discarded: Vec<CardId>,
}

impl AbilityDeck {
    pub fn new(cards: Vec<CardId>) -> Self {
        Self {
            base: cards.clone(),
            available: cards,
            discarded: Vec::new(),
        }
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        shuffle_cards(&mut self.available, rng);
    }

    /// Deal up to `size` cards off the top of the available pile.
    pub fn request_new_hand(&mut self, size: usize) -> AbilityHand {
        if size == 0 || self.available.is_empty() {
            error!("Cannot deal a hand of {} from {} available cards", size, self.available.len());
            return AbilityHand::default();
        }
        let count = size.min(self.available.len());
        AbilityHand::new(self.available.drain(..count).collect())
    }

    /// Return every discarded card to the available pile.
    pub fn reset_available(&mut self) {
        self.available.append(&mut self.discarded);
    }

    pub fn discard(&mut self, cards: impl IntoIterator<Item = CardId>) {
        self.discarded.extend(cards);
    }

    pub fn is_available_empty(&self) -> bool {
        self.available.is_empty()
    }

    pub fn base(&self) -> &[CardId] {
        &self.base
    }

    pub fn available(&self) -> &[CardId] {
        &self.available
    }

    pub fn discarded(&self) -> &[CardId] {
        &self.discarded
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AbilityHand {
    available: Vec<CardId>,
    discarded: Vec<CardId>,
}

impl AbilityHand {
    pub fn new(cards: Vec<CardId>) -> Self {
        Self {
            available: cards,
            discarded: Vec::new(),
        }
    }

    /// Rotate so the first card becomes the last: [a, b, c] -> [b, c, a].
    pub fn shift_left(&mut self) {
        if !self.available.is_empty() {
            self.available.rotate_left(1);
        }
    }

    /// Rotate so the last card becomes the first: [a, b, c] -> [c, a, b].
    pub fn shift_right(&mut self) {
        if !self.available.is_empty() {
            self.available.rotate_right(1);
        }
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        shuffle_cards(&mut self.available, rng);
    }

    pub fn add_card(&mut self, card: CardId) {
        self.available.push(card);
    }

    pub fn add_cards(&mut self, cards: impl IntoIterator<Item = CardId>) {
        self.available.extend(cards);
    }

    /// Move one copy of `card` to the hand's discard pile.
    pub fn remove_card(&mut self, card: &CardId) -> bool {
        let Some(index) = self.available.iter().position(|c| c == card) else {
            error!("Card {} is not in the hand", card);
            return false;
        };
        let removed = self.available.remove(index);
        self.discarded.push(removed);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }

    pub fn cards(&self) -> &[CardId] {
        &self.available
    }

    pub fn discarded(&self) -> &[CardId] {
        &self.discarded
    }

    fn take_discarded(&mut self) -> Vec<CardId> {
        std::mem::take(&mut self.discarded)
    }
}

/// Card state of an entity that picks abilities from a hand instead of fixed slots.
#[derive(Component, Clone, Debug)]
pub struct AbilityCards {
    /// Ability bound to the basic action button
    pub basic_attack: Option<AbilityId>,
    pub hand_size: usize,
    deck: AbilityDeck,
    hand: AbilityHand,
}

impl AbilityCards {
    /// Shuffle the deck and deal the opening hand.
    pub fn new<R: Rng + ?Sized>(
        cards: Vec<CardId>,
        basic_attack: Option<AbilityId>,
        hand_size: usize,
        rng: &mut R,
    ) -> Self {
        let mut deck = AbilityDeck::new(cards);
        deck.shuffle(rng);
        let mut this = Self {
            basic_attack,
            hand_size,
            deck,
            hand: AbilityHand::default(),
        };
        if !this.deck.is_available_empty() {
            this.draw_hand(rng);
        }
        this
    }

    /// Replace the (empty) hand, reshuffling the discards when the deck runs out.
    pub fn draw_hand<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let used = self.hand.take_discarded();
        self.deck.discard(used);
        // A partially played hand goes back too so nothing is lost
        let unplayed = std::mem::take(&mut self.hand.available);
        self.deck.discard(unplayed);

        if self.deck.is_available_empty() {
            self.deck.reset_available();
            self.deck.shuffle(rng);
        }
        self.hand = self.deck.request_new_hand(self.hand_size);
    }

    /// The card the next action press would cast. Refills an empty hand first.
    pub fn next_card<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<CardId> {
        if self.hand.is_empty() {
            self.draw_hand(rng);
        }
        self.hand.cards().first().cloned()
    }

    /// Discard a played card, dealing a fresh hand once the hand is spent.
    pub fn discard_card<R: Rng + ?Sized>(&mut self, card: &CardId, rng: &mut R) -> bool {
        if !self.hand.remove_card(card) {
            return false;
        }
        if self.hand.is_empty() {
            self.draw_hand(rng);
        }
        true
    }

    pub fn shift_left(&mut self) {
        self.hand.shift_left();
    }

    pub fn shift_right(&mut self) {
        self.hand.shift_right();
    }

    pub fn hand_cards(&self) -> &[CardId] {
        self.hand.cards()
    }

    pub fn deck(&self) -> &AbilityDeck {
        &self.deck
    }

    pub fn hand(&self) -> &AbilityHand {
        &self.hand
    }

    /// Every card across all four piles.
    pub fn all_cards(&self) -> Vec<CardId> {
        self.deck
            .available
            .iter()
            .chain(&self.deck.discarded)
            .chain(&self.hand.available)
            .chain(&self.hand.discarded)
            .cloned()
            .collect()
    }
}
