//! Deck list parsing, card lookups and deck import
//!
//! Parsers for pasted deck lists, plus the card database collaborators that
//! resolve their card names.

pub mod database;
pub mod deck;
pub mod import;
pub mod lookup;
pub mod scryfall;

pub use database::CardDatabase;
pub use deck::{DeckListParser, ParsedLine};
pub use import::{
    cancel_pair, CancelHandle, CancelToken, DeckImporter, ImportOptions, ImportReport,
    SkipReason, SkippedLine,
};
pub use lookup::{CardLookup, Comparison, SearchPage, SearchQuery, PAGE_SIZE};
pub use scryfall::{ScryfallClient, DEFAULT_API_URL};
