//! Strongly-typed identifiers
//!
//! Card ids come from the external card database, deck and collection ids are
//! generated locally. Wrapping each in its own type keeps a deck id from ever
//! being handed to a card lookup by mistake.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity assigned by the card database to a specific printing
///
/// Examples: "e3285e6b-3e79-4d7c-bf96-d920f973b80d" (Scryfall), "bolt-lea"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    pub fn new(s: impl Into<String>) -> Self {
        CardId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CardId {
    fn from(s: String) -> Self {
        CardId(s)
    }
}

impl From<&str> for CardId {
    fn from(s: &str) -> Self {
        CardId(s.to_string())
    }
}

/// Locally generated deck identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeckId(String);

impl DeckId {
    /// Generate a fresh random id
    pub fn generate() -> Self {
        DeckId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DeckId {
    fn from(s: String) -> Self {
        DeckId(s)
    }
}

impl From<&str> for DeckId {
    fn from(s: &str) -> Self {
        DeckId(s.to_string())
    }
}

/// Locally generated collection identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(String);

impl CollectionId {
    pub fn generate() -> Self {
        CollectionId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalize a card name into a lookup key
pub fn normalize_name(name: &str) -> String {
    deunicode::deunicode(name)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Lightning Bolt"), "lightning bolt");
        assert_eq!(normalize_name("  Lim-Dûl's   Vault "), "lim-dul's vault");
        assert_eq!(normalize_name("Æther Vial"), "aether vial");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(DeckId::generate(), DeckId::generate());
        assert_ne!(CollectionId::generate(), CollectionId::generate());
    }

    #[test]
    fn test_card_id_serializes_as_plain_string() {
        let id = CardId::new("bolt-lea");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"bolt-lea\"");
    }
}
