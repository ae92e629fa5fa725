//! Core card types

pub mod card;
pub mod mana;
pub mod types;

pub use card::{Card, Rarity, RawCard, RawCardFace};
pub use mana::{Color, ColorSet, ManaCost};
pub use types::{normalize_name, CardId, CollectionId, DeckId};
