//! Collection store
//!
//! Holds the single owned-cards collection. Entries are keyed by card id;
//! an entry whose quantity would reach zero is removed rather than kept.

use crate::core::{Card, CardId, CollectionId};
use crate::store::clock::Clock;
use crate::store::kv::{read_document, write_document, KeyValueStore, MemoryKv, COLLECTION_KEY};
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Condition given to cards added without one
pub const DEFAULT_CONDITION: &str = "Near Mint";

/// Owned copies of one card printing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEntry {
    pub card: Card,
    pub quantity: u32,
    pub condition: String,
    pub foil: bool,
}

/// The persisted collection document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    pub description: String,
    entries: FxHashMap<CardId, CollectionEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_public: bool,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Collection {
            id: CollectionId::generate(),
            name: name.into(),
            description: String::new(),
            entries: FxHashMap::default(),
            created_at: now,
            updated_at: now,
            is_public: false,
        }
    }

    pub fn entry(&self, card_id: &CardId) -> Option<&CollectionEntry> {
        self.entries.get(card_id)
    }

    /// Entries in no particular order
    pub fn entries(&self) -> impl Iterator<Item = &CollectionEntry> {
        self.entries.values()
    }

    /// Entries ordered by card name, then set code
    pub fn sorted_entries(&self) -> Vec<&CollectionEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by(|a, b| {
            a.card
                .name
                .cmp(&b.card.name)
                .then_with(|| a.card.set.cmp(&b.card.set))
                .then_with(|| a.card.id.cmp(&b.card.id))
        });
        entries
    }

    /// Number of distinct printings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of copies across all entries
    pub fn total_cards(&self) -> u32 {
        self.entries
            .values()
            .fold(0, |total: u32, e| total.saturating_add(e.quantity))
    }
}

impl Default for Collection {
    fn default() -> Self {
        Collection::new("My Collection")
    }
}

/// Owns the collection and writes a snapshot after every mutation
pub struct CollectionStore {
    collection: Collection,
    kv: Arc<dyn KeyValueStore>,
    clock: Clock,
}

impl CollectionStore {
    /// Load the collection from `kv`, or start an empty one
    pub fn open(kv: Arc<dyn KeyValueStore>) -> Self {
        let collection: Collection = read_document(kv.as_ref(), COLLECTION_KEY);
        let mut clock = Clock::new();
        clock.observe(collection.updated_at);
        tracing::debug!(
            entries = collection.len(),
            "opened collection '{}'",
            collection.name
        );
        CollectionStore {
            collection,
            kv,
            clock,
        }
    }

    /// Store backed by a private in-memory key-value store
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemoryKv::new()))
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Add `quantity` copies of `card`, returning the new quantity
    ///
    /// A zero quantity changes nothing.
    pub fn add_card(&mut self, card: &Card, quantity: u32) -> u32 {
        if quantity == 0 {
            tracing::debug!(card = %card.id, "ignoring add of zero copies");
            return self.quantity_of(&card.id);
        }

        let entry = self
            .collection
            .entries
            .entry(card.id.clone())
            .and_modify(|e| e.quantity = e.quantity.saturating_add(quantity))
            .or_insert_with(|| CollectionEntry {
                card: card.clone(),
                quantity,
                condition: DEFAULT_CONDITION.to_string(),
                foil: false,
            });
        let new_quantity = entry.quantity;

        self.touch();
        new_quantity
    }

    /// Remove a single copy, returning the remaining quantity
    ///
    /// The entry disappears when its last copy is removed.
    pub fn remove_card(&mut self, card_id: &CardId) -> u32 {
        let Some(entry) = self.collection.entries.get_mut(card_id) else {
            tracing::debug!(card = %card_id, "remove of card not in collection");
            return 0;
        };

        let remaining = entry.quantity.saturating_sub(1);
        if remaining > 0 {
            entry.quantity = remaining;
        } else {
            self.collection.entries.remove(card_id);
        }

        self.touch();
        remaining
    }

    /// Copies owned of `card_id`, zero when absent
    pub fn quantity_of(&self, card_id: &CardId) -> u32 {
        self.collection
            .entries
            .get(card_id)
            .map_or(0, |e| e.quantity)
    }

    /// Change the condition label of an entry. Returns false for unknown cards.
    pub fn set_condition(&mut self, card_id: &CardId, condition: impl Into<String>) -> bool {
        let Some(entry) = self.collection.entries.get_mut(card_id) else {
            return false;
        };
        entry.condition = condition.into();
        self.touch();
        true
    }

    /// Mark an entry as foil or non-foil. Returns false for unknown cards.
    pub fn set_foil(&mut self, card_id: &CardId, foil: bool) -> bool {
        let Some(entry) = self.collection.entries.get_mut(card_id) else {
            return false;
        };
        entry.foil = foil;
        self.touch();
        true
    }

    pub fn rename(&mut self, name: impl Into<String>, description: impl Into<String>) {
        self.collection.name = name.into();
        self.collection.description = description.into();
        self.touch();
    }

    pub fn set_public(&mut self, is_public: bool) {
        self.collection.is_public = is_public;
        self.touch();
    }

    /// Write the current snapshot. Returns false if persisting failed.
    pub fn save(&self) -> bool {
        write_document(self.kv.as_ref(), COLLECTION_KEY, &self.collection)
    }

    fn touch(&mut self) {
        self.collection.updated_at = self.clock.now();
        self.save();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bolt() -> Card {
        Card::new("bolt-lea", "Lightning Bolt")
    }

    #[test]
    fn test_add_new_card_uses_defaults() {
        let mut store = CollectionStore::in_memory();
        assert_eq!(store.add_card(&bolt(), 3), 3);

        let entry = store.collection().entry(&bolt().id).unwrap();
        assert_eq!(entry.quantity, 3);
        assert_eq!(entry.condition, DEFAULT_CONDITION);
        assert!(!entry.foil);
    }

    #[test]
    fn test_add_existing_card_increments() {
        let mut store = CollectionStore::in_memory();
        store.add_card(&bolt(), 1);
        store.add_card(&bolt(), 2);

        assert_eq!(store.quantity_of(&bolt().id), 3);
        assert_eq!(store.collection().len(), 1);
    }

    #[test]
    fn test_add_zero_is_noop() {
        let mut store = CollectionStore::in_memory();
        let before = store.collection().updated_at;
        assert_eq!(store.add_card(&bolt(), 0), 0);
        assert!(store.collection().is_empty());
        assert_eq!(store.collection().updated_at, before);
    }

    #[test]
    fn test_remove_decrements_by_one() {
        let mut store = CollectionStore::in_memory();
        store.add_card(&bolt(), 3);

        assert_eq!(store.remove_card(&bolt().id), 2);
        assert_eq!(store.quantity_of(&bolt().id), 2);
    }

    #[test]
    fn test_remove_last_copy_drops_entry() {
        let mut store = CollectionStore::in_memory();
        store.add_card(&bolt(), 1);

        assert_eq!(store.remove_card(&bolt().id), 0);
        assert!(store.collection().entry(&bolt().id).is_none());
        assert_eq!(store.quantity_of(&bolt().id), 0);
    }

    #[test]
    fn test_remove_unknown_card() {
        let mut store = CollectionStore::in_memory();
        assert_eq!(store.remove_card(&CardId::new("nope")), 0);
        assert!(store.collection().is_empty());
    }

    #[test]
    fn test_updated_at_advances_on_mutation() {
        let mut store = CollectionStore::in_memory();
        let t0 = store.collection().updated_at;
        store.add_card(&bolt(), 1);
        let t1 = store.collection().updated_at;
        store.remove_card(&bolt().id);
        let t2 = store.collection().updated_at;

        assert!(t0 < t1);
        assert!(t1 < t2);
    }

    #[test]
    fn test_entry_metadata_edits() {
        let mut store = CollectionStore::in_memory();
        store.add_card(&bolt(), 1);

        assert!(store.set_condition(&bolt().id, "Lightly Played"));
        assert!(store.set_foil(&bolt().id, true));
        assert!(!store.set_foil(&CardId::new("nope"), true));

        let entry = store.collection().entry(&bolt().id).unwrap();
        assert_eq!(entry.condition, "Lightly Played");
        assert!(entry.foil);
    }

    #[test]
    fn test_sorted_entries() {
        let mut store = CollectionStore::in_memory();
        store.add_card(&Card::new("m1", "Mountain"), 10);
        store.add_card(&bolt(), 4);
        store.add_card(&Card::new("c1", "Counterspell"), 2);

        let names: Vec<_> = store
            .collection()
            .sorted_entries()
            .iter()
            .map(|e| e.card.name.as_str())
            .collect();
        assert_eq!(names, vec!["Counterspell", "Lightning Bolt", "Mountain"]);
        assert_eq!(store.collection().total_cards(), 16);
    }
}
