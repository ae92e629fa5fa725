//! MTG collection manager
//!
//! Keeps a personal Magic: The Gathering collection and any number of decks,
//! imports decks from pasted text lists, and resolves card names through a
//! card database (the Scryfall API or a local dump).

pub mod app;
pub mod config;
pub mod core;
pub mod error;
pub mod loader;
pub mod stats;
pub mod store;

pub use app::Workspace;
pub use error::{MtgError, Result};
