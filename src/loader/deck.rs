//! Deck list text parser
//!
//! Reads pasted deck lists such as
//!
//! ```text
//! 4 Lightning Bolt
//! 4x Mountain
//!
//! Sideboard:
//! 2 Pyroblast
//! ```
//!
//! Card lines are `<quantity>[x] <name>`. Any line containing "sideboard" or
//! "commander" (case-insensitive) switches the category for the lines that
//! follow; everything else is skipped.

use crate::store::Category;
use crate::Result;
use nom::{
    character::complete::{digit1, one_of, space1},
    combinator::{map_res, opt},
    sequence::tuple,
    IResult,
};
use std::fs;
use std::path::Path;

/// A card line recognised in a deck list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// 1-based line number in the input
    pub line_no: usize,
    pub category: Category,
    pub quantity: u32,
    pub name: String,
}

/// Deck list parser
pub struct DeckListParser;

impl DeckListParser {
    /// Load a deck list from a text file
    pub fn load_from_file(path: &Path) -> Result<Vec<ParsedLine>> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Parse deck list text into card lines, top to bottom
    ///
    /// Never fails: unrecognised lines are dropped, so empty or header-only
    /// input yields no lines.
    pub fn parse(content: &str) -> Vec<ParsedLine> {
        let mut lines = Vec::new();
        let mut category = Category::Mainboard;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(header) = section_header(line) {
                if parse_card_line(line).is_some() {
                    // "1 Commander's Sphere" reads as a header too
                    tracing::warn!(
                        line_no,
                        line,
                        "line looks like a card but names a section; treating it as the {header} header"
                    );
                }
                category = header;
                continue;
            }

            match parse_card_line(line) {
                Some((quantity, name)) if quantity > 0 => lines.push(ParsedLine {
                    line_no,
                    category,
                    quantity,
                    name: name.to_string(),
                }),
                Some(_) => tracing::debug!(line_no, "skipping zero-quantity line"),
                None => tracing::debug!(line_no, line, "skipping unrecognised line"),
            }
        }

        lines
    }
}

/// Section header test: a substring match, checked before the card pattern
pub(crate) fn section_header(line: &str) -> Option<Category> {
    let lower = line.to_lowercase();
    if lower.contains("sideboard") {
        Some(Category::Sideboard)
    } else if lower.contains("commander") {
        Some(Category::Commander)
    } else {
        None
    }
}

fn quantity_prefix(input: &str) -> IResult<&str, u32> {
    let (input, (quantity, _, _)) = tuple((
        map_res(digit1, str::parse::<u32>),
        opt(one_of("xX")),
        space1,
    ))(input)?;
    Ok((input, quantity))
}

/// Match `^(\d+)[xX]?\s+(.+)$` on a trimmed line, dropping any `|SET` suffix
fn parse_card_line(line: &str) -> Option<(u32, &str)> {
    let (rest, quantity) = quantity_prefix(line).ok()?;
    // Forge lists pin a printing as "Name|SET"
    let name = rest.split_once('|').map_or(rest, |(name, _set)| name).trim();
    if name.is_empty() {
        return None;
    }
    Some((quantity, name))
}
