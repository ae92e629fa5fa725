//! Scryfall REST client
//!
//! Resolves names through `/cards/named` (exact first, then fuzzy) and runs
//! searches through `/cards/search`. A 404 from either endpoint means "no
//! match", not a failure.

use crate::core::{Card, RawCard};
use crate::loader::lookup::{CardLookup, SearchPage, SearchQuery};
use crate::{MtgError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.scryfall.com";

/// Search response envelope
#[derive(Debug, Deserialize)]
struct CardList {
    #[serde(default)]
    total_cards: usize,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    data: Vec<RawCard>,
}

/// Error object returned alongside non-2xx statuses
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    details: String,
}

#[derive(Debug, Clone)]
pub struct ScryfallClient {
    client: reqwest::Client,
    base_url: String,
}

impl ScryfallClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mtg-collection/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(ScryfallClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` with `params`; `Ok(None)` on 404
    async fn get_json<T>(&self, path: &str, params: &[(&str, &str)]) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let details = response
                .json::<ApiError>()
                .await
                .map(|e| e.details)
                .unwrap_or_default();
            return Err(MtgError::Lookup(format!("{path} returned {status}: {details}")));
        }

        Ok(Some(response.json::<T>().await?))
    }

    async fn named(&self, mode: &str, name: &str) -> Result<Option<Card>> {
        match self.get_json::<RawCard>("/cards/named", &[(mode, name)]).await? {
            Some(raw) => Ok(Some(Card::try_from(raw)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl CardLookup for ScryfallClient {
    async fn find_by_name(&self, name: &str) -> Result<Option<Card>> {
        if let Some(card) = self.named("exact", name).await? {
            return Ok(Some(card));
        }
        tracing::debug!(name, "no exact match, trying fuzzy lookup");
        self.named("fuzzy", name).await
    }

    async fn search(&self, query: &SearchQuery, page: u32) -> Result<SearchPage> {
        let page = page.max(1);
        let q = query.to_query_string();
        if q.is_empty() {
            return Ok(SearchPage::empty(page));
        }

        let page_param = page.to_string();
        let Some(list) = self
            .get_json::<CardList>(
                "/cards/search",
                &[("q", q.as_str()), ("page", page_param.as_str())],
            )
            .await?
        else {
            return Ok(SearchPage::empty(page));
        };

        let mut cards = Vec::with_capacity(list.data.len());
        for raw in list.data {
            match Card::try_from(raw) {
                Ok(card) => cards.push(card),
                Err(e) => tracing::warn!(error = %e, "skipping search result"),
            }
        }

        Ok(SearchPage {
            cards,
            page,
            total_cards: list.total_cards,
            has_more: list.has_more,
        })
    }
}
