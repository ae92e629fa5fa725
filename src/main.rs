//! MTG collection manager - command line front end

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use mtg_collection::{
    config::Config,
    core::{CardId, ColorSet, DeckId, Rarity},
    loader::{cancel_pair, CancelToken, CardLookup, Comparison, SearchQuery, SkipReason},
    stats::{CollectionStats, DeckStats},
    store::{Category, Deck, DeckUpdate, NewDeck},
    Workspace,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Verbosity level for log output (accepts names and numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(&'static str);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg("off")),
            "minimal" | "1" => Ok(VerbosityArg("warn")),
            "normal" | "2" => Ok(VerbosityArg("info")),
            "verbose" | "3" => Ok(VerbosityArg("debug")),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

/// Mana value filter like "3", "<=2" or ">5"
fn parse_mana_value(s: &str) -> std::result::Result<(Comparison, u32), String> {
    let s = s.trim();
    let (cmp, rest) = if let Some(rest) = s.strip_prefix("<=") {
        (Comparison::LessOrEqual, rest)
    } else if let Some(rest) = s.strip_prefix(">=") {
        (Comparison::GreaterOrEqual, rest)
    } else if let Some(rest) = s.strip_prefix('<') {
        (Comparison::Less, rest)
    } else if let Some(rest) = s.strip_prefix('>') {
        (Comparison::Greater, rest)
    } else {
        (Comparison::Equal, s.strip_prefix('=').unwrap_or(s))
    };
    let value = rest
        .trim()
        .parse()
        .map_err(|_| format!("invalid mana value filter '{s}' (expected e.g. 3, <=2, >5)"))?;
    Ok((cmp, value))
}

#[derive(Parser)]
#[command(name = "mtg")]
#[command(about = "Magic: The Gathering collection and deck manager", long_about = None)]
struct Cli {
    /// Directory for the collection and deck documents [env: MTG_DATA_DIR]
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Card search API base URL [env: MTG_API_URL]
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Resolve cards from a local JSON card dump instead of the API [env: MTG_CARD_DB]
    #[arg(long, global = true)]
    card_db: Option<PathBuf>,

    /// Log verbosity (0=silent, 1=minimal, 2=normal, 3=verbose); RUST_LOG overrides
    #[arg(long, short = 'v', global = true, default_value = "minimal")]
    verbosity: VerbosityArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the card collection
    Collection {
        #[command(subcommand)]
        action: CollectionCommand,
    },

    /// Manage decks
    Deck {
        #[command(subcommand)]
        action: DeckCommand,
    },

    /// Import a deck list file as a new deck
    Import {
        /// Deck list text file ("4 Lightning Bolt" per line)
        file: PathBuf,

        /// Deck name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,

        #[arg(long, default_value = "")]
        format: String,

        /// Deck colors, e.g. "UR"
        #[arg(long)]
        colors: Option<ColorSet>,

        /// Card lookups in flight at once [env: MTG_IMPORT_CONCURRENCY]
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Import every deck list (*.txt, *.dck) found under a directory
    ImportDir {
        dir: PathBuf,

        #[arg(long, default_value = "")]
        format: String,
    },

    /// Search the card database
    Search {
        /// Words the card name must contain
        text: Option<String>,

        /// Colors the card must include ("C" for colorless)
        #[arg(long, short = 'c')]
        color: Option<ColorSet>,

        /// Type line text, e.g. "creature"
        #[arg(long = "type", short = 't')]
        type_line: Option<String>,

        #[arg(long, short = 'r')]
        rarity: Option<Rarity>,

        /// Set code
        #[arg(long, short = 's')]
        set: Option<String>,

        /// Mana value filter, e.g. "<=2"
        #[arg(long, value_parser = parse_mana_value, allow_hyphen_values = true)]
        mv: Option<(Comparison, u32)>,

        /// Format legality (API only)
        #[arg(long, short = 'f')]
        format: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Show collection statistics, or deck statistics with --deck
    Stats {
        #[arg(long)]
        deck: Option<String>,
    },
}

#[derive(Subcommand)]
enum CollectionCommand {
    /// Add copies of a card
    Add {
        name: String,
        #[arg(long, short = 'n', default_value_t = 1)]
        quantity: u32,
    },
    /// Remove one copy of a card
    Remove { name: String },
    /// List owned cards
    List,
    /// Show how many copies of a card are owned
    Quantity { name: String },
    /// Change the condition label of an owned card
    Condition { name: String, condition: String },
    /// Mark an owned card as foil (or not, with --off)
    Foil {
        name: String,
        #[arg(long)]
        off: bool,
    },
}

#[derive(Subcommand)]
enum DeckCommand {
    /// Create an empty deck
    Create {
        name: String,
        #[arg(long, default_value = "")]
        format: String,
        #[arg(long)]
        colors: Option<ColorSet>,
    },
    /// List decks
    List,
    /// Show a deck's cards and statistics
    Show { id: String },
    /// Rename or re-format a deck
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        format: Option<String>,
        #[arg(long)]
        colors: Option<ColorSet>,
        #[arg(long)]
        description: Option<String>,
        /// Comma separated tags
        #[arg(long)]
        tags: Option<String>,
    },
    /// Delete a deck
    Delete { id: String },
    /// Copy a deck
    Duplicate {
        id: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Add copies of a card to a deck
    Add {
        id: String,
        card: String,
        #[arg(long, default_value = "mainboard")]
        category: Category,
        #[arg(long, short = 'n', default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a card entry from a deck
    Remove {
        id: String,
        card: String,
        #[arg(long, default_value = "mainboard")]
        category: Category,
    },
    /// Set the quantity of a card already in a deck (0 removes it)
    Set {
        id: String,
        card: String,
        quantity: u32,
        #[arg(long, default_value = "mainboard")]
        category: Category,
    },
    /// Print a deck as an importable text list
    Export { id: String },
    /// Show which decks use a card
    Usage { card: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("mtg_collection={}", cli.verbosity.0).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(path) = cli.card_db {
        config.card_db = Some(path);
    }
    if let Commands::Import {
        concurrency: Some(n),
        ..
    } = &cli.command
    {
        config.import_concurrency = *n;
    }

    let mut workspace = Workspace::from_config(&config)
        .await
        .context("failed to open workspace")?;

    match cli.command {
        Commands::Collection { action } => run_collection(&mut workspace, action).await?,
        Commands::Deck { action } => run_deck(&mut workspace, action).await?,
        Commands::Import {
            file,
            name,
            format,
            colors,
            concurrency: _,
        } => run_import(&mut workspace, file, name, format, colors).await?,
        Commands::ImportDir { dir, format } => run_import_dir(&mut workspace, dir, format).await?,
        Commands::Search {
            text,
            color,
            type_line,
            rarity,
            set,
            mv,
            format,
            page,
        } => {
            let query = SearchQuery {
                text,
                colors: color,
                type_line,
                rarity,
                set,
                mana_value: mv,
                format,
            };
            run_search(&workspace, query, page).await?
        }
        Commands::Stats { deck } => run_stats(&workspace, deck)?,
    }

    Ok(())
}

async fn run_collection(workspace: &mut Workspace, action: CollectionCommand) -> anyhow::Result<()> {
    match action {
        CollectionCommand::Add { name, quantity } => {
            let card = workspace.resolve_card(&name).await?;
            let total = workspace.collection_mut().add_card(&card, quantity);
            println!("{card}: {total} owned");
        }
        CollectionCommand::Remove { name } => {
            let id = owned_card_id(workspace, &name).await?;
            let left = workspace.collection_mut().remove_card(&id);
            println!("{name}: {left} owned");
        }
        CollectionCommand::List => {
            let collection = workspace.collection().collection();
            println!("{} ({} cards)", collection.name, collection.total_cards());
            for entry in collection.sorted_entries() {
                let foil = if entry.foil { " *foil*" } else { "" };
                println!(
                    "  {:>3} {} [{}]{foil}",
                    entry.quantity, entry.card, entry.condition
                );
            }
        }
        CollectionCommand::Quantity { name } => {
            let id = owned_card_id(workspace, &name).await?;
            println!("{name}: {}", workspace.collection().quantity_of(&id));
        }
        CollectionCommand::Condition { name, condition } => {
            let id = owned_card_id(workspace, &name).await?;
            if !workspace.collection_mut().set_condition(&id, condition) {
                bail!("'{name}' is not in the collection");
            }
        }
        CollectionCommand::Foil { name, off } => {
            let id = owned_card_id(workspace, &name).await?;
            if !workspace.collection_mut().set_foil(&id, !off) {
                bail!("'{name}' is not in the collection");
            }
        }
    }
    Ok(())
}

/// Prefer the printing already owned, so a name maps to the entry the user sees
async fn owned_card_id(workspace: &Workspace, name: &str) -> anyhow::Result<CardId> {
    let owned = workspace
        .collection()
        .collection()
        .entries()
        .find(|e| e.card.name.eq_ignore_ascii_case(name))
        .map(|e| e.card.id.clone());
    match owned {
        Some(id) => Ok(id),
        None => Ok(workspace.resolve_card(name).await?.id),
    }
}

/// Card id for a name, preferring a printing already in the deck
async fn deck_card_id(workspace: &Workspace, deck: &Deck, name: &str) -> anyhow::Result<CardId> {
    let in_deck = deck
        .entries()
        .iter()
        .find(|e| e.card.name.eq_ignore_ascii_case(name))
        .map(|e| e.card.id.clone());
    match in_deck {
        Some(id) => Ok(id),
        None => Ok(workspace.resolve_card(name).await?.id),
    }
}

fn find_deck<'a>(workspace: &'a Workspace, id: &str) -> anyhow::Result<&'a Deck> {
    let id = DeckId::from(id);
    workspace
        .decks()
        .get(&id)
        .with_context(|| format!("no deck with id '{id}'"))
}

fn print_deck(deck: &Deck) {
    println!("{} [{}] {} ({})", deck.name, deck.colors, deck.format, deck.id);
    if let Some(description) = &deck.description {
        println!("  {description}");
    }
    for category in Category::ALL {
        let count = deck.count(category);
        if count == 0 {
            continue;
        }
        println!("{category} ({count}):");
        for entry in deck.entries_in(category) {
            println!("  {:>3} {}", entry.quantity, entry.card);
        }
    }
    print!("{}", DeckStats::compute(deck));
}

async fn run_deck(workspace: &mut Workspace, action: DeckCommand) -> anyhow::Result<()> {
    match action {
        DeckCommand::Create {
            name,
            format,
            colors,
        } => {
            let id = workspace.decks_mut().create_deck(
                NewDeck::new(name)
                    .with_format(format)
                    .with_colors(colors.unwrap_or_default()),
            );
            println!("{id}");
        }
        DeckCommand::List => {
            for deck in workspace.decks().decks() {
                println!(
                    "{}  {:<30} {:<10} {:>3} cards  modified {}",
                    deck.id,
                    deck.name,
                    deck.format,
                    deck.total_cards(),
                    deck.last_modified.format("%Y-%m-%d %H:%M")
                );
            }
        }
        DeckCommand::Show { id } => print_deck(find_deck(workspace, &id)?),
        DeckCommand::Edit {
            id,
            name,
            format,
            colors,
            description,
            tags,
        } => {
            let update = DeckUpdate {
                name,
                format,
                colors,
                description: description.map(Some),
                is_public: None,
                tags: tags.map(|t| {
                    t.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                }),
            };
            if !workspace.decks_mut().edit_deck(&DeckId::from(id.as_str()), update) {
                bail!("no deck with id '{id}'");
            }
        }
        DeckCommand::Delete { id } => {
            if !workspace.decks_mut().delete_deck(&DeckId::from(id.as_str())) {
                bail!("no deck with id '{id}'");
            }
        }
        DeckCommand::Duplicate { id, name } => {
            let copy = workspace
                .decks_mut()
                .duplicate_deck(&DeckId::from(id.as_str()), name.as_deref())
                .with_context(|| format!("no deck with id '{id}'"))?;
            println!("{copy}");
        }
        DeckCommand::Add {
            id,
            card,
            category,
            quantity,
        } => {
            let deck_id = find_deck(workspace, &id)?.id.clone();
            let card = workspace.resolve_card(&card).await?;
            workspace
                .decks_mut()
                .add_card_to_deck(&deck_id, &card, category, quantity);
        }
        DeckCommand::Remove { id, card, category } => {
            let deck = find_deck(workspace, &id)?;
            let deck_id = deck.id.clone();
            let card_id = deck_card_id(workspace, deck, &card).await?;
            if !workspace
                .decks_mut()
                .remove_card_from_deck(&deck_id, &card_id, category)
            {
                bail!("'{card}' is not in the {category} of that deck");
            }
        }
        DeckCommand::Set {
            id,
            card,
            quantity,
            category,
        } => {
            let deck = find_deck(workspace, &id)?;
            let deck_id = deck.id.clone();
            let card_id = deck_card_id(workspace, deck, &card).await?;
            if !workspace
                .decks_mut()
                .set_card_quantity_in_deck(&deck_id, &card_id, quantity, category)
            {
                bail!("'{card}' is not in the {category} of that deck");
            }
        }
        DeckCommand::Export { id } => print!("{}", find_deck(workspace, &id)?.to_deck_list()),
        DeckCommand::Usage { card } => {
            let card = workspace.resolve_card(&card).await?;
            let usage = workspace.decks().card_usage_across_decks(&card.id);
            println!("{card} appears in {} deck entries", usage.len());
            for u in usage {
                println!("  {:>3} in {} ({})", u.quantity, u.deck_name, u.category);
            }
        }
    }
    Ok(())
}

/// Cancel `token` on Ctrl-C
fn cancel_on_ctrl_c() -> CancelToken {
    let (handle, token) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });
    token
}

async fn run_import(
    workspace: &mut Workspace,
    file: PathBuf,
    name: Option<String>,
    format: String,
    colors: Option<ColorSet>,
) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let name = name.unwrap_or_else(|| deck_name_from_path(&file));
    let meta = NewDeck::new(name)
        .with_format(format)
        .with_colors(colors.unwrap_or_default());

    let cancel = cancel_on_ctrl_c();
    let report = workspace.import_deck(&text, meta, &cancel).await?;

    println!("{}", report.deck_id);
    println!("Imported {} lines, skipped {}", report.imported, report.skipped.len());
    for skipped in &report.skipped {
        let reason = match &skipped.reason {
            SkipReason::NotFound => "not found".to_string(),
            SkipReason::LookupFailed(e) => e.clone(),
        };
        println!("  line {}: {} ({reason})", skipped.line_no, skipped.name);
    }
    Ok(())
}

fn deck_name_from_path(path: &std::path::Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().replace('_', " "))
        .unwrap_or_else(|| "Imported deck".to_string())
}

async fn run_import_dir(
    workspace: &mut Workspace,
    dir: PathBuf,
    format: String,
) -> anyhow::Result<()> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }

    let dir_for_walk = dir.clone();
    let mut paths: Vec<PathBuf> = tokio::task::spawn_blocking(move || {
        jwalk::WalkDir::new(&dir_for_walk)
            .skip_hidden(true)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext == "txt" || ext == "dck")
            })
            .collect()
    })
    .await?;
    paths.sort();

    println!("Found {} deck lists in {}", paths.len(), dir.display());
    let cancel = cancel_on_ctrl_c();
    let mut imported = 0;
    for path in paths {
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable deck list");
                continue;
            }
        };
        let meta = NewDeck::new(deck_name_from_path(&path)).with_format(format.clone());
        let report = workspace.import_deck(&text, meta, &cancel).await?;
        println!(
            "  {}: {} lines imported, {} skipped",
            path.display(),
            report.imported,
            report.skipped.len()
        );
        imported += 1;
    }
    println!("Imported {imported} decks");
    Ok(())
}

async fn run_search(workspace: &Workspace, query: SearchQuery, page: u32) -> anyhow::Result<()> {
    if query.is_empty() {
        bail!("search needs at least one filter");
    }
    let results = workspace.lookup().search(&query, page).await?;
    println!(
        "{} matches for '{}' (page {})",
        results.total_cards,
        query.to_query_string(),
        results.page
    );
    for card in &results.cards {
        let cost = card.mana_cost.map(|c| c.to_string()).unwrap_or_default();
        let owned = workspace.collection().quantity_of(&card.id);
        println!(
            "  {card}  {cost}  {}  {}  owned: {owned}",
            card.type_line.as_deref().unwrap_or(""),
            card.rarity
        );
    }
    if results.has_more {
        println!("More results: --page {}", results.page + 1);
    }
    Ok(())
}

fn run_stats(workspace: &Workspace, deck: Option<String>) -> anyhow::Result<()> {
    match deck {
        Some(id) => {
            let deck = find_deck(workspace, &id)?;
            println!("{}", deck.name);
            print!("{}", DeckStats::compute(deck));
        }
        None => print!(
            "{}",
            CollectionStats::compute(workspace.collection().collection())
        ),
    }
    Ok(())
}
