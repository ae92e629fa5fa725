//! Composition root
//!
//! `Workspace` owns the two stores and the card lookup. Front ends (the CLI,
//! tests) hold a `Workspace` and call into it; nothing here is global.

use crate::config::Config;
use crate::core::Card;
use crate::loader::{
    CancelToken, CardDatabase, CardLookup, DeckImporter, ImportOptions, ImportReport,
    ScryfallClient,
};
use crate::store::{CollectionStore, DeckStore, FileKv, KeyValueStore, NewDeck};
use crate::{MtgError, Result};
use std::sync::Arc;

pub struct Workspace {
    collection: CollectionStore,
    decks: DeckStore,
    lookup: Arc<dyn CardLookup>,
    import_options: ImportOptions,
}

impl Workspace {
    /// Open both stores from `kv` and resolve cards through `lookup`
    pub fn new(kv: Arc<dyn KeyValueStore>, lookup: Arc<dyn CardLookup>) -> Self {
        Workspace {
            collection: CollectionStore::open(Arc::clone(&kv)),
            decks: DeckStore::open(kv),
            lookup,
            import_options: ImportOptions::default(),
        }
    }

    /// File-backed stores under `config.data_dir`; a local card dump when
    /// `config.card_db` is set, the remote API otherwise
    pub async fn from_config(config: &Config) -> Result<Self> {
        let kv: Arc<dyn KeyValueStore> = Arc::new(FileKv::open(&config.data_dir)?);
        let lookup: Arc<dyn CardLookup> = match &config.card_db {
            Some(path) => Arc::new(CardDatabase::load_from_file(path).await?),
            None => Arc::new(ScryfallClient::new(&config.api_url, config.http_timeout)?),
        };
        let options = ImportOptions {
            concurrency: config.import_concurrency,
        };
        Ok(Self::new(kv, lookup).with_import_options(options))
    }

    pub fn with_import_options(mut self, options: ImportOptions) -> Self {
        self.import_options = options;
        self
    }

    pub fn collection(&self) -> &CollectionStore {
        &self.collection
    }

    pub fn collection_mut(&mut self) -> &mut CollectionStore {
        &mut self.collection
    }

    pub fn decks(&self) -> &DeckStore {
        &self.decks
    }

    pub fn decks_mut(&mut self) -> &mut DeckStore {
        &mut self.decks
    }

    pub fn lookup(&self) -> &Arc<dyn CardLookup> {
        &self.lookup
    }

    /// Resolve a name the user typed, failing when nothing matches
    pub async fn resolve_card(&self, name: &str) -> Result<Card> {
        self.lookup
            .find_by_name(name)
            .await?
            .ok_or_else(|| MtgError::Lookup(format!("no card named '{name}'")))
    }

    /// Import a deck list as a new deck
    pub async fn import_deck(
        &mut self,
        text: &str,
        meta: NewDeck,
        cancel: &CancelToken,
    ) -> Result<ImportReport> {
        let importer = DeckImporter::with_options(Arc::clone(&self.lookup), self.import_options);
        importer.import(&mut self.decks, text, meta, cancel).await
    }
}
