//! Colors and mana costs

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

use crate::MtgError;

/// The five colors of Magic, in WUBRG order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    #[serde(rename = "W")]
    White,
    #[serde(rename = "U")]
    Blue,
    #[serde(rename = "B")]
    Black,
    #[serde(rename = "R")]
    Red,
    #[serde(rename = "G")]
    Green,
}

impl Color {
    pub const ALL: [Color; 5] = [
        Color::White,
        Color::Blue,
        Color::Black,
        Color::Red,
        Color::Green,
    ];

    /// Single-letter symbol for this color
    pub fn symbol(&self) -> char {
        match self {
            Color::White => 'W',
            Color::Blue => 'U',
            Color::Black => 'B',
            Color::Red => 'R',
            Color::Green => 'G',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'W' => Some(Color::White),
            'U' => Some(Color::Blue),
            'B' => Some(Color::Black),
            'R' => Some(Color::Red),
            'G' => Some(Color::Green),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Color {
    type Err = MtgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "w" | "white" => Ok(Color::White),
            "u" | "blue" => Ok(Color::Blue),
            "b" | "black" => Ok(Color::Black),
            "r" | "red" => Ok(Color::Red),
            "g" | "green" => Ok(Color::Green),
            other => Err(MtgError::ParseError(format!("unknown color '{other}'"))),
        }
    }
}

/// A set of colors, kept sorted in WUBRG order without duplicates
///
/// An empty set means colorless.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Color>", into = "Vec<Color>")]
pub struct ColorSet(SmallVec<[Color; 5]>);

impl ColorSet {
    pub fn new() -> Self {
        ColorSet(SmallVec::new())
    }

    pub fn insert(&mut self, color: Color) -> bool {
        match self.0.binary_search(&color) {
            Ok(_) => false,
            Err(pos) => {
                self.0.insert(pos, color);
                true
            }
        }
    }

    pub fn contains(&self, color: Color) -> bool {
        self.0.binary_search(&color).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = Color> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_colorless(&self) -> bool {
        self.0.is_empty()
    }

    /// True if every color of `self` is also in `other`
    pub fn is_subset(&self, other: &ColorSet) -> bool {
        self.iter().all(|c| other.contains(c))
    }
}

impl FromIterator<Color> for ColorSet {
    fn from_iter<I: IntoIterator<Item = Color>>(iter: I) -> Self {
        let mut set = ColorSet::new();
        for color in iter {
            set.insert(color);
        }
        set
    }
}

impl From<Vec<Color>> for ColorSet {
    fn from(colors: Vec<Color>) -> Self {
        colors.into_iter().collect()
    }
}

impl From<ColorSet> for Vec<Color> {
    fn from(set: ColorSet) -> Self {
        set.0.into_vec()
    }
}

impl fmt::Display for ColorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "C");
        }
        for color in &self.0 {
            write!(f, "{color}")?;
        }
        Ok(())
    }
}

/// Parse a color string like "WU", "rg" or "C" (colorless)
impl FromStr for ColorSet {
    type Err = MtgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("c") || s.is_empty() {
            return Ok(ColorSet::new());
        }
        s.chars()
            .filter(|c| !c.is_whitespace() && *c != ',')
            .map(|c| {
                Color::from_symbol(c)
                    .ok_or_else(|| MtgError::ParseError(format!("unknown color symbol '{c}'")))
            })
            .collect()
    }
}

/// Represents a mana cost (e.g., "{2}{R}{R}" = 2 generic + 2 red)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManaCost {
    pub generic: u8,
    pub white: u8,
    pub blue: u8,
    pub black: u8,
    pub red: u8,
    pub green: u8,
    pub colorless: u8,
    /// Hybrid and phyrexian symbols, each worth one
    pub hybrid: u8,
    /// X symbols, worth zero outside the stack
    pub variable: u8,
}

impl ManaCost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a mana cost in brace notation ("{1}{W/U}{G/P}") or compact
    /// notation ("2RR")
    pub fn from_string(s: &str) -> Self {
        if s.contains('{') {
            Self::from_symbols(s)
        } else {
            Self::from_compact(s)
        }
    }

    fn from_symbols(s: &str) -> Self {
        let mut cost = ManaCost::new();
        for symbol in s.split('{').filter_map(|part| part.strip_suffix('}')) {
            if let Ok(n) = symbol.parse::<u8>() {
                cost.generic = cost.generic.saturating_add(n);
                continue;
            }
            if symbol.contains('/') {
                // {2/W} costs two generic when paid without the colored half
                if let Some(("2", _)) = symbol.split_once('/') {
                    cost.generic = cost.generic.saturating_add(1);
                }
                cost.hybrid += 1;
                continue;
            }
            match symbol {
                "X" | "Y" | "Z" => cost.variable += 1,
                "C" => cost.colorless += 1,
                other => cost.add_colored(other.chars().next()),
            }
        }
        cost
    }

    fn from_compact(s: &str) -> Self {
        let mut cost = ManaCost::new();
        let mut generic_str = String::new();

        for c in s.chars() {
            match c {
                '0'..='9' => generic_str.push(c),
                'X' => cost.variable += 1,
                'C' => cost.colorless += 1,
                _ => cost.add_colored(Some(c)),
            }
        }

        if !generic_str.is_empty() {
            cost.generic = generic_str.parse().unwrap_or(0);
        }

        cost
    }

    fn add_colored(&mut self, symbol: Option<char>) {
        match symbol.and_then(Color::from_symbol) {
            Some(Color::White) => self.white += 1,
            Some(Color::Blue) => self.blue += 1,
            Some(Color::Black) => self.black += 1,
            Some(Color::Red) => self.red += 1,
            Some(Color::Green) => self.green += 1,
            None => {} // Snow and other symbols carry no mana value
        }
    }

    /// Mana value (formerly converted mana cost)
    pub fn mana_value(&self) -> u8 {
        self.generic
            + self.white
            + self.blue
            + self.black
            + self.red
            + self.green
            + self.colorless
            + self.hybrid
    }

    /// Colors appearing as plain colored symbols
    pub fn colors(&self) -> ColorSet {
        let pairs = [
            (Color::White, self.white),
            (Color::Blue, self.blue),
            (Color::Black, self.black),
            (Color::Red, self.red),
            (Color::Green, self.green),
        ];
        pairs
            .into_iter()
            .filter(|(_, n)| *n > 0)
            .map(|(c, _)| c)
            .collect()
    }
}

impl fmt::Display for ManaCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.variable {
            write!(f, "{{X}}")?;
        }
        if self.generic > 0 {
            write!(f, "{{{}}}", self.generic)?;
        }
        for _ in 0..self.colorless {
            write!(f, "{{C}}")?;
        }
        for _ in 0..self.hybrid {
            write!(f, "{{H}}")?;
        }
        for (color, n) in [
            (Color::White, self.white),
            (Color::Blue, self.blue),
            (Color::Black, self.black),
            (Color::Red, self.red),
            (Color::Green, self.green),
        ] {
            for _ in 0..n {
                write!(f, "{{{color}}}")?;
            }
        }
        Ok(())
    }
}
