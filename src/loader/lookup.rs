//! Card lookup collaborator
//!
//! The card database lives outside this crate (a remote API or a local dump).
//! `CardLookup` is the seam: it resolves deck-list names and answers searches.

use crate::core::{normalize_name, Card, ColorSet, Rarity};
use crate::Result;
use async_trait::async_trait;
use std::fmt;

/// Results per search page, matching the Scryfall API
pub const PAGE_SIZE: usize = 175;

#[async_trait]
pub trait CardLookup: Send + Sync {
    /// Resolve a card by exact (or best-effort) name
    ///
    /// `Ok(None)` means the name did not resolve; `Err` means the service
    /// could not be asked.
    async fn find_by_name(&self, name: &str) -> Result<Option<Card>>;

    /// Run a search and return one page of results (1-based)
    async fn search(&self, query: &SearchQuery, page: u32) -> Result<SearchPage>;
}

/// Comparison operator for numeric search terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Less,
    LessOrEqual,
    Equal,
    GreaterOrEqual,
    Greater,
}

impl Comparison {
    fn holds(&self, lhs: f32, rhs: f32) -> bool {
        match self {
            Comparison::Less => lhs < rhs,
            Comparison::LessOrEqual => lhs <= rhs,
            Comparison::Equal => lhs == rhs,
            Comparison::GreaterOrEqual => lhs >= rhs,
            Comparison::Greater => lhs > rhs,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Comparison::Less => "<",
            Comparison::LessOrEqual => "<=",
            Comparison::Equal => "=",
            Comparison::GreaterOrEqual => ">=",
            Comparison::Greater => ">",
        };
        write!(f, "{op}")
    }
}

/// Structured card search, rendered to the Scryfall query syntax
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    /// Free text matched against card names
    pub text: Option<String>,
    /// Cards must include all of these colors (empty = colorless)
    pub colors: Option<ColorSet>,
    pub type_line: Option<String>,
    pub rarity: Option<Rarity>,
    pub set: Option<String>,
    pub mana_value: Option<(Comparison, u32)>,
    /// Format legality; only the remote API can check this
    pub format: Option<String>,
}

impl SearchQuery {
    pub fn text(text: impl Into<String>) -> Self {
        SearchQuery {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_query_string().is_empty()
    }

    /// Render as a Scryfall search string, e.g. `bolt c:r t:instant mv<=1`
    pub fn to_query_string(&self) -> String {
        let mut terms: Vec<String> = Vec::new();

        if let Some(text) = self.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            terms.push(text.to_string());
        }
        if let Some(colors) = &self.colors {
            terms.push(format!("c:{}", colors.to_string().to_lowercase()));
        }
        if let Some(type_line) = self.type_line.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            terms.push(format!("t:{}", quote_if_spaced(&type_line.to_lowercase())));
        }
        if let Some(rarity) = self.rarity {
            terms.push(format!("r:{rarity}"));
        }
        if let Some(set) = self.set.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            terms.push(format!("s:{}", set.to_lowercase()));
        }
        if let Some((cmp, value)) = self.mana_value {
            terms.push(format!("mv{cmp}{value}"));
        }
        if let Some(format) = self.format.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
            terms.push(format!("f:{}", format.to_lowercase()));
        }

        terms.join(" ")
    }

    /// Apply the query locally. Format legality is not checked.
    pub fn matches(&self, card: &Card) -> bool {
        if let Some(text) = &self.text {
            let name = normalize_name(&card.name);
            if !normalize_name(text)
                .split_whitespace()
                .all(|word| name.contains(word))
            {
                return false;
            }
        }
        if let Some(colors) = &self.colors {
            let ok = if colors.is_colorless() {
                card.colors.is_colorless()
            } else {
                colors.is_subset(&card.colors)
            };
            if !ok {
                return false;
            }
        }
        if let Some(type_line) = &self.type_line {
            let wanted = type_line.to_lowercase();
            if !card
                .type_line
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(&wanted))
            {
                return false;
            }
        }
        if let Some(rarity) = self.rarity {
            if card.rarity != rarity {
                return false;
            }
        }
        if let Some(set) = &self.set {
            if !card
                .set
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case(set.trim()))
            {
                return false;
            }
        }
        if let Some((cmp, value)) = self.mana_value {
            if !cmp.holds(card.mana_value, value as f32) {
                return false;
            }
        }
        true
    }
}

fn quote_if_spaced(term: &str) -> String {
    if term.contains(char::is_whitespace) {
        format!("\"{term}\"")
    } else {
        term.to_string()
    }
}

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub cards: Vec<Card>,
    /// 1-based page number
    pub page: u32,
    /// Matches across all pages
    pub total_cards: usize,
    pub has_more: bool,
}

impl SearchPage {
    pub fn empty(page: u32) -> Self {
        SearchPage {
            page,
            ..Default::default()
        }
    }

    /// Cut one page out of a full, ordered result list
    pub fn paginate(all: Vec<Card>, page: u32) -> Self {
        let page = page.max(1);
        let total_cards = all.len();
        let start = (page as usize - 1).saturating_mul(PAGE_SIZE);
        let cards: Vec<Card> = all.into_iter().skip(start).take(PAGE_SIZE).collect();
        SearchPage {
            has_more: start + cards.len() < total_cards,
            cards,
            page,
            total_cards,
        }
    }
}
