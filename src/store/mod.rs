//! Collection and deck stores with write-through persistence

pub mod clock;
pub mod collection;
pub mod deck;
pub mod kv;

pub use collection::{Collection, CollectionEntry, CollectionStore, DEFAULT_CONDITION};
pub use deck::{CardUsage, Category, Deck, DeckEntry, DeckStore, DeckUpdate, NewDeck};
pub use kv::{FileKv, KeyValueStore, MemoryKv, COLLECTION_KEY, DECKS_KEY};
