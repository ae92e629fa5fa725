//! Collection and deck statistics
//!
//! Pure group-by/sum views over store contents. Every count is weighted by
//! quantity: four copies of a common count four times toward "common".

use crate::core::{Card, Color, Rarity};
use crate::store::{Category, Collection, Deck};
use std::collections::BTreeMap;
use std::fmt;

/// Mana values at or above this land in one "7+" bucket
pub const CURVE_CAP: u8 = 7;

/// Copies per mana value, lands excluded
pub type ManaCurve = BTreeMap<u8, u32>;

/// Copies per color; `None` collects colorless cards
pub type ColorCounts = BTreeMap<Option<Color>, u32>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionStats {
    /// Distinct printings
    pub unique_cards: usize,
    pub total_cards: u32,
    pub foil_cards: u32,
    pub by_rarity: BTreeMap<Rarity, u32>,
    /// Keyed by set code; cards without one count under "unknown"
    pub by_set: BTreeMap<String, u32>,
    pub by_color: ColorCounts,
    pub mana_curve: ManaCurve,
}

impl CollectionStats {
    pub fn compute(collection: &Collection) -> Self {
        let mut stats = CollectionStats {
            unique_cards: collection.len(),
            ..Default::default()
        };

        for entry in collection.entries() {
            let n = entry.quantity;
            stats.total_cards = stats.total_cards.saturating_add(n);
            if entry.foil {
                stats.foil_cards = stats.foil_cards.saturating_add(n);
            }
            bump(&mut stats.by_rarity, entry.card.rarity, n);
            let set = entry.card.set.clone().unwrap_or_else(|| "unknown".to_string());
            bump(&mut stats.by_set, set, n);
            add_colors(&mut stats.by_color, &entry.card, n);
            add_to_curve(&mut stats.mana_curve, &entry.card, n);
        }

        stats
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeckStats {
    pub mainboard: u32,
    pub sideboard: u32,
    pub commander: u32,
    /// Mainboard and commander only
    pub mana_curve: ManaCurve,
    /// Mainboard and commander only
    pub by_color: ColorCounts,
}

impl DeckStats {
    pub fn compute(deck: &Deck) -> Self {
        let mut stats = DeckStats {
            mainboard: deck.count(Category::Mainboard),
            sideboard: deck.count(Category::Sideboard),
            commander: deck.count(Category::Commander),
            ..Default::default()
        };

        for entry in deck
            .entries()
            .iter()
            .filter(|e| e.category != Category::Sideboard)
        {
            add_colors(&mut stats.by_color, &entry.card, entry.quantity);
            add_to_curve(&mut stats.mana_curve, &entry.card, entry.quantity);
        }

        stats
    }

    /// Average mana value of the nonland cards on the curve
    pub fn average_mana_value(&self) -> Option<f32> {
        let (sum, count) = self
            .mana_curve
            .iter()
            .fold((0u64, 0u64), |(s, c), (mv, n)| {
                (s + u64::from(*mv) * u64::from(*n), c + u64::from(*n))
            });
        (count > 0).then(|| (sum as f64 / count as f64) as f32)
    }
}

/// Quantities can reach `u32::MAX` on their own, so every tally saturates
fn bump<K: Ord>(counts: &mut BTreeMap<K, u32>, key: K, n: u32) {
    let slot = counts.entry(key).or_default();
    *slot = slot.saturating_add(n);
}

fn add_colors(counts: &mut ColorCounts, card: &Card, n: u32) {
    if card.color_identity.is_colorless() {
        bump(counts, None, n);
        return;
    }
    for color in card.color_identity.iter() {
        bump(counts, Some(color), n);
    }
}

fn add_to_curve(curve: &mut ManaCurve, card: &Card, n: u32) {
    if card.is_land() {
        return;
    }
    let bucket = (card.mana_value.max(0.0).floor() as u8).min(CURVE_CAP);
    bump(curve, bucket, n);
}

fn write_curve(f: &mut fmt::Formatter<'_>, curve: &ManaCurve) -> fmt::Result {
    for (mv, n) in curve {
        let label = if *mv == CURVE_CAP {
            format!("{CURVE_CAP}+")
        } else {
            mv.to_string()
        };
        writeln!(f, "  {label:>3}: {n:>4} {}", "#".repeat((*n).min(60) as usize))?;
    }
    Ok(())
}

fn write_colors(f: &mut fmt::Formatter<'_>, colors: &ColorCounts) -> fmt::Result {
    for (color, n) in colors {
        match color {
            Some(c) => writeln!(f, "  {c}: {n}")?,
            None => writeln!(f, "  colorless: {n}")?,
        }
    }
    Ok(())
}

impl fmt::Display for CollectionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} cards ({} unique, {} foil)",
            self.total_cards, self.unique_cards, self.foil_cards
        )?;
        writeln!(f, "Rarity:")?;
        for (rarity, n) in &self.by_rarity {
            writeln!(f, "  {rarity}: {n}")?;
        }
        writeln!(f, "Sets:")?;
        for (set, n) in &self.by_set {
            writeln!(f, "  {}: {n}", set.to_uppercase())?;
        }
        writeln!(f, "Colors:")?;
        write_colors(f, &self.by_color)?;
        writeln!(f, "Mana curve:")?;
        write_curve(f, &self.mana_curve)
    }
}

impl fmt::Display for DeckStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Mainboard: {}  Sideboard: {}  Commander: {}",
            self.mainboard, self.sideboard, self.commander
        )?;
        if let Some(avg) = self.average_mana_value() {
            writeln!(f, "Average mana value: {avg:.2}")?;
        }
        writeln!(f, "Colors:")?;
        write_colors(f, &self.by_color)?;
        writeln!(f, "Mana curve:")?;
        write_curve(f, &self.mana_curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CollectionStore, DeckStore, NewDeck};

    fn card(id: &str, name: &str, set: &str, rarity: Rarity, mv: f32, colors: &str) -> Card {
        let mut card = Card::new(id, name);
        card.set = Some(set.to_string());
        card.rarity = rarity;
        card.mana_value = mv;
        card.color_identity = colors.parse().unwrap();
        card.colors = card.color_identity.clone();
        card
    }

    fn mountain() -> Card {
        let mut land = card("mtn", "Mountain", "m10", Rarity::Common, 0.0, "C");
        land.type_line = Some("Basic Land — Mountain".to_string());
        land
    }

    #[test]
    fn test_collection_stats() {
        let mut store = CollectionStore::in_memory();
        let bolt = card("bolt", "Lightning Bolt", "lea", Rarity::Common, 1.0, "R");
        let helix = card("helix", "Lightning Helix", "rav", Rarity::Uncommon, 2.0, "RW");
        let emrakul = card("emra", "Emrakul, the Aeons Torn", "roe", Rarity::Mythic, 15.0, "C");
        store.add_card(&bolt, 4);
        store.add_card(&helix, 2);
        store.add_card(&emrakul, 1);
        store.add_card(&mountain(), 10);
        store.set_foil(&helix.id, true);

        let stats = CollectionStats::compute(store.collection());
        assert_eq!(stats.unique_cards, 4);
        assert_eq!(stats.total_cards, 17);
        assert_eq!(stats.foil_cards, 2);
        assert_eq!(stats.by_rarity[&Rarity::Common], 14);
        assert_eq!(stats.by_rarity[&Rarity::Mythic], 1);
        assert_eq!(stats.by_set["lea"], 4);
        assert_eq!(stats.by_color[&Some(Color::Red)], 6);
        assert_eq!(stats.by_color[&Some(Color::White)], 2);
        assert_eq!(stats.by_color[&None], 11);

        // Lands are off the curve; 15 folds into 7+
        let curve: Vec<_> = stats.mana_curve.into_iter().collect();
        assert_eq!(curve, vec![(1, 4), (2, 2), (CURVE_CAP, 1)]);
    }

    #[test]
    fn test_deck_stats_ignore_sideboard_on_curve() {
        let mut decks = DeckStore::in_memory();
        let id = decks.create_deck(NewDeck::new("Burn"));
        let bolt = card("bolt", "Lightning Bolt", "lea", Rarity::Common, 1.0, "R");
        let pyro = card("pyro", "Pyroblast", "ice", Rarity::Common, 1.0, "R");
        decks.add_card_to_deck(&id, &bolt, Category::Mainboard, 4);
        decks.add_card_to_deck(&id, &mountain(), Category::Mainboard, 16);
        decks.add_card_to_deck(&id, &pyro, Category::Sideboard, 3);

        let stats = DeckStats::compute(decks.get(&id).unwrap());
        assert_eq!(stats.mainboard, 20);
        assert_eq!(stats.sideboard, 3);
        assert_eq!(stats.mana_curve.get(&1), Some(&4));
        assert_eq!(stats.average_mana_value(), Some(1.0));
    }

    #[test]
    fn test_huge_quantities_saturate() {
        let mut store = CollectionStore::in_memory();
        let bolt = card("bolt", "Lightning Bolt", "lea", Rarity::Common, 1.0, "R");
        let helix = card("helix", "Lightning Helix", "rav", Rarity::Uncommon, 2.0, "RW");
        store.add_card(&bolt, u32::MAX);
        store.add_card(&helix, 1);

        let stats = CollectionStats::compute(store.collection());
        assert_eq!(stats.total_cards, u32::MAX);
        assert_eq!(stats.by_color[&Some(Color::Red)], u32::MAX);
        assert_eq!(store.collection().total_cards(), u32::MAX);

        let mut decks = DeckStore::in_memory();
        let id = decks.create_deck(NewDeck::new("Pile"));
        decks.add_card_to_deck(&id, &bolt, Category::Mainboard, u32::MAX);
        decks.add_card_to_deck(&id, &helix, Category::Mainboard, 1);
        let deck = decks.get(&id).unwrap();
        assert_eq!(deck.total_cards(), u32::MAX);

        let stats = DeckStats::compute(deck);
        assert_eq!(stats.mainboard, u32::MAX);
        assert_eq!(stats.mana_curve[&1], u32::MAX);
        let avg = stats.average_mana_value().unwrap();
        assert!((avg - 1.0).abs() < 1e-3, "{avg}");
    }

    #[test]
    fn test_empty_collection() {
        let store = CollectionStore::in_memory();
        let stats = CollectionStats::compute(store.collection());
        assert_eq!(stats.total_cards, 0);
        assert!(stats.mana_curve.is_empty());
        assert!(stats.to_string().starts_with("0 cards"));
    }
}
