//! Deck store
//!
//! Decks hold entries keyed by (card id, category): the same card may sit in
//! the mainboard and the sideboard with independent quantities.

use crate::core::{Card, CardId, ColorSet, DeckId};
use crate::loader::deck::section_header;
use crate::store::clock::Clock;
use crate::store::kv::{read_document, write_document, KeyValueStore, MemoryKv, DECKS_KEY};
use crate::MtgError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Partition of a deck's entries
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Mainboard,
    Sideboard,
    Commander,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Mainboard, Category::Sideboard, Category::Commander];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Mainboard => "mainboard",
            Category::Sideboard => "sideboard",
            Category::Commander => "commander",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = MtgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "main" | "mainboard" | "maindeck" | "md" => Ok(Category::Mainboard),
            "side" | "sideboard" | "sb" => Ok(Category::Sideboard),
            "commander" | "cmdr" => Ok(Category::Commander),
            other => Err(MtgError::ParseError(format!("unknown deck category '{other}'"))),
        }
    }
}

/// Copies of one card in one category of a deck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckEntry {
    pub card: Card,
    pub quantity: u32,
    pub category: Category,
}

impl DeckEntry {
    pub fn new(card: Card, quantity: u32, category: Category) -> Self {
        DeckEntry {
            card,
            quantity,
            category,
        }
    }

    fn is(&self, card_id: &CardId, category: Category) -> bool {
        self.category == category && &self.card.id == card_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    pub format: String,
    pub colors: ColorSet,
    /// Entries in insertion order, unique per (card id, category)
    entries: Vec<DeckEntry>,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub description: Option<String>,
    pub is_public: bool,
    pub tags: Vec<String>,
}

impl Deck {
    pub fn entries(&self) -> &[DeckEntry] {
        &self.entries
    }

    pub fn entry(&self, card_id: &CardId, category: Category) -> Option<&DeckEntry> {
        self.entries.iter().find(|e| e.is(card_id, category))
    }

    pub fn quantity_of(&self, card_id: &CardId, category: Category) -> u32 {
        self.entry(card_id, category).map_or(0, |e| e.quantity)
    }

    pub fn entries_in(&self, category: Category) -> impl Iterator<Item = &DeckEntry> {
        self.entries.iter().filter(move |e| e.category == category)
    }

    /// Number of cards (not entries) in a category, saturating at `u32::MAX`
    pub fn count(&self, category: Category) -> u32 {
        saturating_total(self.entries_in(category))
    }

    pub fn total_cards(&self) -> u32 {
        saturating_total(self.entries.iter())
    }

    /// Render the deck as a text list the deck-list parser reads back
    ///
    /// Mainboard comes first because the text format has no header that
    /// switches back to it. A card whose name contains a header word
    /// ("Commander's Sphere") re-imports as a section header, so the round
    /// trip loses it; each such card is logged.
    pub fn to_deck_list(&self) -> String {
        let mut out = String::new();
        for category in Category::ALL {
            let mut entries = self.entries_in(category).peekable();
            if entries.peek().is_none() {
                continue;
            }
            if category != Category::Mainboard {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(match category {
                    Category::Sideboard => "Sideboard\n",
                    _ => "Commander\n",
                });
            }
            for entry in entries {
                if section_header(&entry.card.name).is_some() {
                    tracing::warn!(
                        deck = %self.id,
                        card = %entry.card.id,
                        "'{}' will read back as a section header, not a card",
                        entry.card.name
                    );
                }
                out.push_str(&format!("{} {}\n", entry.quantity, entry.card.name));
            }
        }
        out
    }

    /// Add-semantics shared by the store and deck creation
    fn add_entry(&mut self, card: &Card, category: Category, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.entries.iter_mut().find(|e| e.is(&card.id, category)) {
            Some(entry) => entry.quantity = entry.quantity.saturating_add(quantity),
            None => self
                .entries
                .push(DeckEntry::new(card.clone(), quantity, category)),
        }
    }

    fn remove_entry(&mut self, card_id: &CardId, category: Category) -> bool {
        match self.entries.iter().position(|e| e.is(card_id, category)) {
            Some(pos) => {
                // Keep the remaining entries in insertion order
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }
}

fn saturating_total<'a>(entries: impl Iterator<Item = &'a DeckEntry>) -> u32 {
    entries.fold(0, |total, e| total.saturating_add(e.quantity))
}

/// Fields for a deck about to be created
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewDeck {
    pub name: String,
    pub format: String,
    pub colors: ColorSet,
    pub description: Option<String>,
    pub is_public: bool,
    pub tags: Vec<String>,
    pub entries: Vec<DeckEntry>,
}

impl NewDeck {
    pub fn new(name: impl Into<String>) -> Self {
        NewDeck {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_colors(mut self, colors: ColorSet) -> Self {
        self.colors = colors;
        self
    }

    pub fn with_entries(mut self, entries: Vec<DeckEntry>) -> Self {
        self.entries = entries;
        self
    }
}

/// Partial update for `DeckStore::edit_deck`; `None` leaves a field alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeckUpdate {
    pub name: Option<String>,
    pub format: Option<String>,
    pub colors: Option<ColorSet>,
    pub description: Option<Option<String>>,
    pub is_public: Option<bool>,
    pub tags: Option<Vec<String>>,
}

/// Where a card appears across the stored decks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardUsage {
    pub deck_id: DeckId,
    pub deck_name: String,
    pub quantity: u32,
    pub category: Category,
}

/// Owns every deck and writes a snapshot after every mutation
///
/// Operations naming an unknown deck are no-ops reported through their
/// return value.
pub struct DeckStore {
    decks: Vec<Deck>,
    kv: Arc<dyn KeyValueStore>,
    clock: Clock,
}

impl DeckStore {
    /// Load decks from `kv`, or start with none
    pub fn open(kv: Arc<dyn KeyValueStore>) -> Self {
        let decks: Vec<Deck> = read_document(kv.as_ref(), DECKS_KEY);
        let mut clock = Clock::new();
        for deck in &decks {
            clock.observe(deck.last_modified);
            clock.observe(deck.created_at);
        }
        tracing::debug!(decks = decks.len(), "opened deck store");
        DeckStore { decks, kv, clock }
    }

    /// Store backed by a private in-memory key-value store
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemoryKv::new()))
    }

    pub fn decks(&self) -> &[Deck] {
        &self.decks
    }

    pub fn get(&self, deck_id: &DeckId) -> Option<&Deck> {
        self.decks.iter().find(|d| &d.id == deck_id)
    }

    pub fn len(&self) -> usize {
        self.decks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decks.is_empty()
    }

    /// Create a deck and return its fresh id
    ///
    /// Supplied entries sharing a (card id, category) are folded together.
    pub fn create_deck(&mut self, data: NewDeck) -> DeckId {
        let now = self.clock.now();
        let mut deck = Deck {
            id: DeckId::generate(),
            name: data.name,
            format: data.format,
            colors: data.colors,
            entries: Vec::with_capacity(data.entries.len()),
            created_at: now,
            last_modified: now,
            description: data.description,
            is_public: data.is_public,
            tags: data.tags,
        };
        for entry in &data.entries {
            deck.add_entry(&entry.card, entry.category, entry.quantity);
        }

        let id = deck.id.clone();
        tracing::debug!(deck = %id, entries = deck.entries.len(), "created deck '{}'", deck.name);
        self.decks.push(deck);
        self.save();
        id
    }

    /// Merge `update` into a deck. Returns false for unknown decks.
    pub fn edit_deck(&mut self, deck_id: &DeckId, update: DeckUpdate) -> bool {
        self.mutate(deck_id, |deck| {
            if let Some(name) = update.name {
                deck.name = name;
            }
            if let Some(format) = update.format {
                deck.format = format;
            }
            if let Some(colors) = update.colors {
                deck.colors = colors;
            }
            if let Some(description) = update.description {
                deck.description = description;
            }
            if let Some(is_public) = update.is_public {
                deck.is_public = is_public;
            }
            if let Some(tags) = update.tags {
                deck.tags = tags;
            }
            true
        })
    }

    /// Returns false for unknown decks
    pub fn delete_deck(&mut self, deck_id: &DeckId) -> bool {
        let Some(pos) = self.decks.iter().position(|d| &d.id == deck_id) else {
            tracing::debug!(deck = %deck_id, "delete of unknown deck");
            return false;
        };
        self.decks.remove(pos);
        self.save();
        true
    }

    /// Copy a deck under a fresh id and timestamps
    ///
    /// The copy is named "<original> (Copy)" unless `new_name` is given.
    pub fn duplicate_deck(&mut self, deck_id: &DeckId, new_name: Option<&str>) -> Option<DeckId> {
        let Some(original) = self.get(deck_id) else {
            tracing::debug!(deck = %deck_id, "duplicate of unknown deck");
            return None;
        };

        let mut copy = original.clone();
        copy.name = match new_name {
            Some(name) => name.to_string(),
            None => format!("{} (Copy)", original.name),
        };
        copy.id = DeckId::generate();
        let now = self.clock.now();
        copy.created_at = now;
        copy.last_modified = now;

        let id = copy.id.clone();
        self.decks.push(copy);
        self.save();
        Some(id)
    }

    /// Add copies of a card to one category. Returns false for unknown decks.
    pub fn add_card_to_deck(
        &mut self,
        deck_id: &DeckId,
        card: &Card,
        category: Category,
        quantity: u32,
    ) -> bool {
        if quantity == 0 {
            tracing::debug!(deck = %deck_id, card = %card.id, "ignoring add of zero copies");
            return false;
        }
        self.mutate(deck_id, |deck| {
            deck.add_entry(card, category, quantity);
            true
        })
    }

    /// Drop the (card, category) entry outright, whatever its quantity
    pub fn remove_card_from_deck(
        &mut self,
        deck_id: &DeckId,
        card_id: &CardId,
        category: Category,
    ) -> bool {
        self.mutate(deck_id, |deck| deck.remove_entry(card_id, category))
    }

    /// Set an entry's quantity; zero removes the entry
    ///
    /// Only existing entries can be set, since the store has no card record
    /// to build a new one from. Returns false when nothing changed.
    pub fn set_card_quantity_in_deck(
        &mut self,
        deck_id: &DeckId,
        card_id: &CardId,
        quantity: u32,
        category: Category,
    ) -> bool {
        if quantity == 0 {
            return self.remove_card_from_deck(deck_id, card_id, category);
        }
        self.mutate(deck_id, |deck| {
            match deck.entries.iter_mut().find(|e| e.is(card_id, category)) {
                Some(entry) => {
                    entry.quantity = quantity;
                    true
                }
                None => {
                    tracing::debug!(card = %card_id, %category, "no entry to set quantity on");
                    false
                }
            }
        })
    }

    /// Every (deck, category) holding `card_id`
    pub fn card_usage_across_decks(&self, card_id: &CardId) -> Vec<CardUsage> {
        self.decks
            .iter()
            .flat_map(|deck| {
                deck.entries
                    .iter()
                    .filter(|e| &e.card.id == card_id)
                    .map(|e| CardUsage {
                        deck_id: deck.id.clone(),
                        deck_name: deck.name.clone(),
                        quantity: e.quantity,
                        category: e.category,
                    })
            })
            .collect()
    }

    /// Write the current snapshot. Returns false if persisting failed.
    pub fn save(&self) -> bool {
        write_document(self.kv.as_ref(), DECKS_KEY, &self.decks)
    }

    /// Run `f` on a deck; when it reports a change, refresh the timestamp and save
    fn mutate<F>(&mut self, deck_id: &DeckId, f: F) -> bool
    where
        F: FnOnce(&mut Deck) -> bool,
    {
        let Some(deck) = self.decks.iter_mut().find(|d| &d.id == deck_id) else {
            tracing::debug!(deck = %deck_id, "mutation of unknown deck");
            return false;
        };
        if !f(deck) {
            return false;
        }
        deck.last_modified = self.clock.now();
        self.save();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bolt() -> Card {
        Card::new("bolt", "Lightning Bolt")
    }

    fn mountain() -> Card {
        Card::new("mountain", "Mountain")
    }

    #[test]
    fn test_create_folds_duplicate_entries() {
        let mut store = DeckStore::in_memory();
        let id = store.create_deck(NewDeck::new("Burn").with_entries(vec![
            DeckEntry::new(bolt(), 2, Category::Mainboard),
            DeckEntry::new(mountain(), 20, Category::Mainboard),
            DeckEntry::new(bolt(), 2, Category::Mainboard),
            DeckEntry::new(bolt(), 1, Category::Sideboard),
            DeckEntry::new(Card::new("zero", "Nothing"), 0, Category::Mainboard),
        ]));

        let deck = store.get(&id).unwrap();
        assert_eq!(deck.entries().len(), 3);
        assert_eq!(deck.quantity_of(&bolt().id, Category::Mainboard), 4);
        assert_eq!(deck.quantity_of(&bolt().id, Category::Sideboard), 1);
        assert_eq!(deck.created_at, deck.last_modified);
    }

    #[test]
    fn test_edit_merges_only_given_fields() {
        let mut store = DeckStore::in_memory();
        let id = store.create_deck(NewDeck::new("Burn").with_format("modern"));
        let before = store.get(&id).unwrap().last_modified;

        assert!(store.edit_deck(
            &id,
            DeckUpdate {
                name: Some("Boros Burn".to_string()),
                tags: Some(vec!["aggro".to_string()]),
                ..Default::default()
            }
        ));

        let deck = store.get(&id).unwrap();
        assert_eq!(deck.name, "Boros Burn");
        assert_eq!(deck.format, "modern");
        assert_eq!(deck.tags, vec!["aggro".to_string()]);
        assert!(deck.last_modified > before);
    }

    #[test]
    fn test_unknown_deck_is_noop() {
        let mut store = DeckStore::in_memory();
        let ghost = DeckId::from("ghost");

        assert!(!store.edit_deck(&ghost, DeckUpdate::default()));
        assert!(!store.delete_deck(&ghost));
        assert!(store.duplicate_deck(&ghost, None).is_none());
        assert!(!store.add_card_to_deck(&ghost, &bolt(), Category::Mainboard, 1));
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_drops_whole_entry() {
        let mut store = DeckStore::in_memory();
        let id = store.create_deck(NewDeck::new("Burn"));
        store.add_card_to_deck(&id, &bolt(), Category::Mainboard, 4);

        assert!(store.remove_card_from_deck(&id, &bolt().id, Category::Mainboard));
        assert!(store.get(&id).unwrap().entries().is_empty());
        assert!(!store.remove_card_from_deck(&id, &bolt().id, Category::Mainboard));
    }

    #[test]
    fn test_set_quantity_requires_existing_entry() {
        let mut store = DeckStore::in_memory();
        let id = store.create_deck(NewDeck::new("Burn"));

        assert!(!store.set_card_quantity_in_deck(&id, &bolt().id, 3, Category::Mainboard));
        store.add_card_to_deck(&id, &bolt(), Category::Mainboard, 1);
        assert!(store.set_card_quantity_in_deck(&id, &bolt().id, 3, Category::Mainboard));
        assert_eq!(store.get(&id).unwrap().quantity_of(&bolt().id, Category::Mainboard), 3);
    }

    #[test]
    fn test_export_lists_mainboard_first() {
        let mut store = DeckStore::in_memory();
        let id = store.create_deck(NewDeck::new("Burn"));
        store.add_card_to_deck(&id, &Card::new("pyro", "Pyroblast"), Category::Sideboard, 2);
        store.add_card_to_deck(&id, &bolt(), Category::Mainboard, 4);
        store.add_card_to_deck(&id, &mountain(), Category::Mainboard, 16);

        let text = store.get(&id).unwrap().to_deck_list();
        assert_eq!(text, "4 Lightning Bolt\n16 Mountain\n\nSideboard\n2 Pyroblast\n");
    }

    #[test]
    fn test_export_keeps_header_named_cards() {
        let mut store = DeckStore::in_memory();
        let id = store.create_deck(NewDeck::new("Ramp"));
        store.add_card_to_deck(&id, &mountain(), Category::Mainboard, 10);
        store.add_card_to_deck(&id, &Card::new("sphere", "Commander's Sphere"), Category::Mainboard, 1);

        let text = store.get(&id).unwrap().to_deck_list();
        assert_eq!(text, "10 Mountain\n1 Commander's Sphere\n");

        // Read back, the sphere line becomes a commander header
        let lines = crate::loader::DeckListParser::parse(&text);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name, "Mountain");
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("SB".parse::<Category>().unwrap(), Category::Sideboard);
        assert_eq!("main".parse::<Category>().unwrap(), Category::Mainboard);
        assert!("maybeboard".parse::<Category>().is_err());
    }
}
