//! Local card database
//!
//! Serves lookups from a card dump held in memory, e.g. a Scryfall bulk-data
//! JSON file. Useful offline and as a deterministic stand-in for the API.

use crate::core::{normalize_name, Card, RawCard};
use crate::loader::lookup::{CardLookup, SearchPage, SearchQuery};
use crate::Result;
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Index {
    /// Every printing, in load order
    cards: Vec<Arc<Card>>,
    /// Normalized full name -> printings
    by_name: FxHashMap<String, Vec<Arc<Card>>>,
    /// Normalized front-face name -> printings, for split and double-faced cards
    by_front_face: FxHashMap<String, Vec<Arc<Card>>>,
}

impl Index {
    fn insert(&mut self, card: Card) {
        let card = Arc::new(card);
        let key = normalize_name(&card.name);
        let front = normalize_name(card.front_face_name());
        if front != key {
            self.by_front_face
                .entry(front)
                .or_default()
                .push(Arc::clone(&card));
        }
        self.by_name.entry(key).or_default().push(Arc::clone(&card));
        self.cards.push(card);
    }
}

/// In-memory card database implementing `CardLookup`
#[derive(Debug, Clone, Default)]
pub struct CardDatabase {
    index: Arc<RwLock<Index>>,
}

impl CardDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a database from already-normalized cards
    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        let mut index = Index::default();
        for card in cards {
            index.insert(card);
        }
        CardDatabase {
            index: Arc::new(RwLock::new(index)),
        }
    }

    /// Load a JSON array of card objects (Scryfall bulk-data shape)
    ///
    /// Records failing normalization are skipped with a warning.
    pub async fn load_from_file(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;

        // Bulk dumps run to hundreds of megabytes; keep parsing off the runtime threads
        let cards = tokio::task::spawn_blocking(move || -> Result<Vec<Card>> {
            let raw: Vec<RawCard> = serde_json::from_str(&contents)?;
            let mut cards = Vec::with_capacity(raw.len());
            for record in raw {
                match Card::try_from(record) {
                    Ok(card) => cards.push(card),
                    Err(e) => tracing::warn!(error = %e, "skipping card record"),
                }
            }
            Ok(cards)
        })
        .await??;

        tracing::info!(cards = cards.len(), path = %path.display(), "loaded card database");
        Ok(Self::from_cards(cards))
    }

    pub async fn insert(&self, card: Card) {
        self.index.write().await.insert(card);
    }

    /// Number of printings loaded
    pub async fn len(&self) -> usize {
        self.index.read().await.cards.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.index.read().await.cards.is_empty()
    }
}

#[async_trait]
impl CardLookup for CardDatabase {
    async fn find_by_name(&self, name: &str) -> Result<Option<Card>> {
        let key = normalize_name(name);
        let index = self.index.read().await;

        let hit = index
            .by_name
            .get(&key)
            .or_else(|| index.by_front_face.get(&key))
            .and_then(|printings| printings.first());

        Ok(hit.map(|card| Card::clone(card)))
    }

    async fn search(&self, query: &SearchQuery, page: u32) -> Result<SearchPage> {
        let index = self.index.read().await;
        let mut matches: Vec<Card> = index
            .cards
            .iter()
            .filter(|card| query.matches(card))
            .map(|card| Card::clone(card))
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.set.cmp(&b.set)));
        Ok(SearchPage::paginate(matches, page))
    }
}
