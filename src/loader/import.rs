//! Deck list import
//!
//! Parses a deck list, resolves every card line through a `CardLookup` and
//! creates the resulting deck. Lines that fail to resolve are reported and
//! skipped; a partial deck is a valid outcome.
//!
//! Lookups run one at a time by default. With `concurrency > 1` they run on
//! a bounded pool of tasks, and results are put back into input order before
//! the deck is built, so both modes produce the same deck.

use crate::core::{Card, DeckId};
use crate::loader::deck::{DeckListParser, ParsedLine};
use crate::loader::lookup::CardLookup;
use crate::store::{DeckEntry, DeckStore, NewDeck};
use crate::{MtgError, Result};
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;

/// Create a linked cancel handle and token
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Requests cancellation of the imports holding the paired token
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observed by an import between and during lookups
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Token that is never cancelled
    pub fn never() -> Self {
        cancel_pair().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested; pends forever otherwise
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // Handle dropped without cancelling
                std::future::pending::<()>().await;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Lookups in flight at once; 0 and 1 both mean sequential
    pub concurrency: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions { concurrency: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The lookup answered, but no card has that name
    NotFound,
    /// The lookup itself failed
    LookupFailed(String),
}

/// A well-formed card line that produced no entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub line_no: usize,
    pub name: String,
    pub reason: SkipReason,
}

/// Card lines resolved to deck entries, in input order
#[derive(Debug, Clone, Default)]
pub struct ResolvedLines {
    pub entries: Vec<DeckEntry>,
    pub skipped: Vec<SkippedLine>,
}

impl ResolvedLines {
    fn record(&mut self, line: ParsedLine, outcome: Result<Option<Card>>) {
        match outcome {
            Ok(Some(card)) => self
                .entries
                .push(DeckEntry::new(card, line.quantity, line.category)),
            Ok(None) => {
                tracing::warn!(line_no = line.line_no, name = %line.name, "card not found, skipping line");
                self.skipped.push(SkippedLine {
                    line_no: line.line_no,
                    name: line.name,
                    reason: SkipReason::NotFound,
                });
            }
            Err(e) => {
                tracing::warn!(line_no = line.line_no, name = %line.name, error = %e, "card lookup failed, skipping line");
                self.skipped.push(SkippedLine {
                    line_no: line.line_no,
                    name: line.name,
                    reason: SkipReason::LookupFailed(e.to_string()),
                });
            }
        }
    }
}

/// Summary of a completed import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub deck_id: DeckId,
    /// Card lines that resolved to a card
    pub imported: usize,
    pub skipped: Vec<SkippedLine>,
}

/// Resolves deck lists through a card lookup and stores them as decks
pub struct DeckImporter {
    lookup: Arc<dyn CardLookup>,
    options: ImportOptions,
}

impl DeckImporter {
    pub fn new(lookup: Arc<dyn CardLookup>) -> Self {
        Self::with_options(lookup, ImportOptions::default())
    }

    pub fn with_options(lookup: Arc<dyn CardLookup>, options: ImportOptions) -> Self {
        DeckImporter { lookup, options }
    }

    pub fn options(&self) -> ImportOptions {
        self.options
    }

    /// Parse `text`, resolve its card lines and create a deck from `meta`
    ///
    /// Entries already present in `meta` are kept; repeated (card, category)
    /// pairs merge their quantities. A cancelled import creates no deck.
    pub async fn import(
        &self,
        decks: &mut DeckStore,
        text: &str,
        mut meta: NewDeck,
        cancel: &CancelToken,
    ) -> Result<ImportReport> {
        let lines = DeckListParser::parse(text);
        let resolved = self.resolve(lines, cancel).await?;

        let imported = resolved.entries.len();
        meta.entries.extend(resolved.entries);
        let name = meta.name.clone();
        let deck_id = decks.create_deck(meta);

        tracing::info!(
            deck = %deck_id,
            imported,
            skipped = resolved.skipped.len(),
            "imported deck '{name}'"
        );

        Ok(ImportReport {
            deck_id,
            imported,
            skipped: resolved.skipped,
        })
    }

    /// Resolve parsed lines to entries without touching any store
    pub async fn resolve(
        &self,
        lines: Vec<ParsedLine>,
        cancel: &CancelToken,
    ) -> Result<ResolvedLines> {
        if self.options.concurrency <= 1 {
            self.resolve_sequential(lines, cancel).await
        } else {
            self.resolve_parallel(lines, cancel).await
        }
    }

    async fn resolve_sequential(
        &self,
        lines: Vec<ParsedLine>,
        cancel: &CancelToken,
    ) -> Result<ResolvedLines> {
        let mut resolved = ResolvedLines::default();
        for line in lines {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(MtgError::Cancelled),
                outcome = self.lookup.find_by_name(&line.name) => outcome,
            };
            resolved.record(line, outcome);
        }
        Ok(resolved)
    }

    async fn resolve_parallel(
        &self,
        lines: Vec<ParsedLine>,
        cancel: &CancelToken,
    ) -> Result<ResolvedLines> {
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency));
        let mut tasks = JoinSet::new();
        // Indexed by position in `lines`; a slot left empty means the task died
        let mut outcomes: Vec<Option<Result<Option<Card>>>> = Vec::with_capacity(lines.len());
        outcomes.resize_with(lines.len(), || None);

        for (index, line) in lines.iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    return Err(MtgError::Cancelled);
                }
                permit = Arc::clone(&semaphore).acquire_owned() => permit
                    .map_err(|_| MtgError::Lookup("lookup pool closed".to_string()))?,
            };

            let lookup = Arc::clone(&self.lookup);
            let name = line.name.clone();
            tasks.spawn(async move {
                let _permit = permit;
                (index, lookup.find_by_name(&name).await)
            });
        }

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    return Err(MtgError::Cancelled);
                }
                next = tasks.join_next() => next,
            };
            match next {
                Some(Ok((index, outcome))) => outcomes[index] = Some(outcome),
                Some(Err(e)) => tracing::error!(error = %e, "card lookup task failed"),
                None => break,
            }
        }

        let mut resolved = ResolvedLines::default();
        for (line, outcome) in lines.into_iter().zip(outcomes) {
            let outcome = outcome
                .unwrap_or_else(|| Err(MtgError::Lookup("lookup task panicked".to_string())));
            resolved.record(line, outcome);
        }
        Ok(resolved)
    }
}
