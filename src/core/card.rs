//! Card records
//!
//! A `Card` is an immutable value fetched from the card database. The lookup
//! services deserialize their wire format into `RawCard`, where every field is
//! optional, and `Card::try_from` is the one place that validates it.

use crate::core::{CardId, Color, ColorSet, ManaCost};
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Printing rarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Mythic,
    Special,
    Bonus,
    Unknown,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Mythic => "mythic",
            Rarity::Special => "special",
            Rarity::Bonus => "bonus",
            Rarity::Unknown => "unknown",
        }
    }

    /// Lenient conversion used at the lookup boundary
    pub fn from_wire(s: &str) -> Self {
        s.parse().unwrap_or(Rarity::Unknown)
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Rarity {
    type Err = MtgError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "c" | "common" => Ok(Rarity::Common),
            "u" | "uncommon" => Ok(Rarity::Uncommon),
            "r" | "rare" => Ok(Rarity::Rare),
            "m" | "mythic" | "mythic rare" => Ok(Rarity::Mythic),
            "s" | "special" => Ok(Rarity::Special),
            "b" | "bonus" => Ok(Rarity::Bonus),
            other => Err(MtgError::ParseError(format!("unknown rarity '{other}'"))),
        }
    }
}

/// A card printing as supplied by the card database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Database identity of this printing
    pub id: CardId,

    /// Card name (e.g., "Lightning Bolt", "Fire // Ice")
    pub name: String,

    /// Set code (e.g., "lea")
    pub set: Option<String>,

    /// Set display name (e.g., "Limited Edition Alpha")
    pub set_name: Option<String>,

    pub rarity: Rarity,

    pub mana_cost: Option<ManaCost>,

    /// Mana value as reported by the database
    pub mana_value: f32,

    pub type_line: Option<String>,

    pub colors: ColorSet,

    pub color_identity: ColorSet,

    pub oracle_text: Option<String>,

    pub collector_number: Option<String>,
}

impl Card {
    /// Minimal card, mostly useful for tests and fixtures
    pub fn new(id: impl Into<CardId>, name: impl Into<String>) -> Self {
        Card {
            id: id.into(),
            name: name.into(),
            set: None,
            set_name: None,
            rarity: Rarity::Unknown,
            mana_cost: None,
            mana_value: 0.0,
            type_line: None,
            colors: ColorSet::new(),
            color_identity: ColorSet::new(),
            oracle_text: None,
            collector_number: None,
        }
    }

    pub fn is_land(&self) -> bool {
        self.type_line
            .as_deref()
            .is_some_and(|t| t.split("//").next().unwrap_or(t).contains("Land"))
    }

    /// Name of the front face ("Fire" for "Fire // Ice")
    pub fn front_face_name(&self) -> &str {
        self.name
            .split_once(" // ")
            .map(|(front, _)| front)
            .unwrap_or(&self.name)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.set {
            Some(set) => write!(f, "{} ({})", self.name, set.to_uppercase()),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Card face of a multi-faced card, as it appears on the wire
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawCardFace {
    pub name: Option<String>,
    pub mana_cost: Option<String>,
    pub type_line: Option<String>,
    pub oracle_text: Option<String>,
    pub colors: Option<Vec<String>>,
}

/// Card record as it appears on the wire (Scryfall card object shape)
///
/// Unknown fields are ignored, missing fields default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawCard {
    pub id: Option<String>,
    pub name: Option<String>,
    pub set: Option<String>,
    pub set_name: Option<String>,
    pub rarity: Option<String>,
    pub mana_cost: Option<String>,
    pub cmc: Option<f32>,
    pub type_line: Option<String>,
    pub colors: Option<Vec<String>>,
    pub color_identity: Option<Vec<String>>,
    pub oracle_text: Option<String>,
    pub collector_number: Option<String>,
    pub card_faces: Option<Vec<RawCardFace>>,
}

fn parse_colors(symbols: &[String]) -> ColorSet {
    symbols
        .iter()
        .filter_map(|s| s.chars().next().and_then(Color::from_symbol))
        .collect()
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl TryFrom<RawCard> for Card {
    type Error = MtgError;

    fn try_from(raw: RawCard) -> Result<Self> {
        let id = non_blank(raw.id)
            .ok_or_else(|| MtgError::InvalidCard("missing card id".to_string()))?;
        let name = non_blank(raw.name)
            .ok_or_else(|| MtgError::InvalidCard(format!("card {id} has no name")))?;

        let front = raw.card_faces.as_ref().and_then(|faces| faces.first());

        // Double-faced cards carry cost and colors on their faces only
        let mana_cost = non_blank(raw.mana_cost)
            .or_else(|| front.and_then(|f| non_blank(f.mana_cost.clone())))
            .map(|s| ManaCost::from_string(&s));

        let colors = raw
            .colors
            .as_deref()
            .or_else(|| front.and_then(|f| f.colors.as_deref()))
            .map(parse_colors)
            .unwrap_or_default();

        let color_identity = raw
            .color_identity
            .as_deref()
            .map(parse_colors)
            .unwrap_or_else(|| colors.clone());

        let mana_value = raw
            .cmc
            .unwrap_or_else(|| mana_cost.map(|c| c.mana_value() as f32).unwrap_or(0.0));

        let oracle_text = non_blank(raw.oracle_text)
            .or_else(|| front.and_then(|f| non_blank(f.oracle_text.clone())));

        Ok(Card {
            id: CardId::new(id),
            name,
            set: non_blank(raw.set).map(|s| s.to_lowercase()),
            set_name: non_blank(raw.set_name),
            rarity: raw
                .rarity
                .as_deref()
                .map(Rarity::from_wire)
                .unwrap_or(Rarity::Unknown),
            mana_cost,
            mana_value,
            type_line: non_blank(raw.type_line),
            colors,
            color_identity,
            oracle_text,
            collector_number: non_blank(raw.collector_number),
        })
    }
}
