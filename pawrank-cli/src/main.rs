mod config;
mod output;
mod store;

use clap::Parser;
use pawrank_core::{
    EloConfig, EngineConfig, ItemId, Pair, RankingEngine, RankingMethod, VoteFilters, VoterId, VoterProfile,
};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::PawrankConfig;
use crate::output::OutputFormat;
use crate::store::SqliteVoteStore;

pub fn bail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

#[derive(Parser)]
#[command(name = "pawrank", version, about = "Collect pairwise votes on dogs and rank them")]
struct Cli {
    /// SQLite database file (default: $PAWRANK_DATABASE or ./pawrank.sqlite)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Path to config file (default: ~/.config/pawrank/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log pipeline details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Create a default config file
    Init,
    /// Add a rankable item
    AddItem(AddItemArgs),
    /// List every item with its display name
    ListItems(ListItemsArgs),
    /// Register a voter and show their first pair
    RegisterVoter(RegisterVoterArgs),
    /// Record a vote and show the voter's next pair
    Vote(VoteArgs),
    /// Show the next unseen pair for a voter
    NextPair(NextPairArgs),
    /// Rank items from the recorded votes
    Rank(RankArgs),
    /// Per-opponent win/loss/tie breakdown for one item
    Matchups(MatchupsArgs),
    /// Count voters with cyclic (intransitive) preferences
    Intransitivity(IntransitivityArgs),
}

#[derive(clap::Args)]
struct AddItemArgs {
    /// Display name
    #[arg(long)]
    name: Option<String>,
}

#[derive(clap::Args)]
struct ListItemsArgs {
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct RegisterVoterArgs {
    #[arg(long)]
    gender: Option<String>,
    #[arg(long)]
    age: Option<u32>,
    #[arg(long)]
    education: Option<String>,
    #[arg(long)]
    location: Option<String>,
    /// Whether the voter owns a dog
    #[arg(long)]
    dog_owner: Option<bool>,
    #[arg(long)]
    affiliation: Option<String>,
}

#[derive(clap::Args)]
struct VoteArgs {
    #[arg(long)]
    voter: VoterId,
    #[arg(long)]
    item1: ItemId,
    #[arg(long)]
    item2: ItemId,
    /// The preferred item (must be item1 or item2)
    #[arg(long, required_unless_present = "tie", conflicts_with = "tie")]
    winner: Option<ItemId>,
    /// Neither item is preferred
    #[arg(long)]
    tie: bool,
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(clap::Args)]
struct NextPairArgs {
    #[arg(long)]
    voter: VoterId,
    #[arg(long)]
    seed: Option<u64>,
}

/// Vote scope. Every filter given must hold (AND); `--first-n` runs last.
#[derive(clap::Args)]
struct FilterArgs {
    #[arg(long)]
    education: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    gender: Option<String>,
    #[arg(long)]
    age_min: Option<u32>,
    #[arg(long)]
    age_max: Option<u32>,
    /// Only this voter's votes
    #[arg(long)]
    voter: Option<VoterId>,
    /// Keep each voter's earliest N votes
    #[arg(long)]
    first_n: Option<usize>,
    /// Leave an item out of scope (repeatable)
    #[arg(long = "ignore-item")]
    ignore_items: Vec<ItemId>,
}

impl FilterArgs {
    fn to_filters(&self) -> VoteFilters {
        VoteFilters {
            education: self.education.clone(),
            location: self.location.clone(),
            gender_identity: self.gender.clone(),
            age_min: self.age_min,
            age_max: self.age_max,
            voter: self.voter,
            first_n: self.first_n,
            excluded_items: self.ignore_items.iter().copied().collect(),
        }
    }
}

#[derive(clap::Args)]
struct RankArgs {
    /// ranked_pairs, copeland, elo, minimax, win_ratio or win_tie_ratio
    #[arg(long)]
    method: Option<String>,

    #[command(flatten)]
    filters: FilterArgs,

    /// table, json or columns
    #[arg(long)]
    format: Option<String>,

    /// List tied items one per rank instead of grouping them
    #[arg(long)]
    flatten_ties: bool,

    /// Seed for the Elo replay shuffle
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(clap::Args)]
struct MatchupsArgs {
    #[arg(long)]
    item: ItemId,
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct IntransitivityArgs {
    #[command(flatten)]
    filters: FilterArgs,
    #[arg(long)]
    json: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Settings shared by every command that touches the database.
struct Context {
    cfg: PawrankConfig,
    store: SqliteVoteStore,
}

impl Context {
    fn load(cli: &Cli) -> Self {
        let config_path = cli.config.clone().unwrap_or_else(config::config_path);
        let cfg = config::load_config(&config_path);

        let database = cli
            .database
            .clone()
            .or_else(|| cfg.database.clone())
            .unwrap_or_else(SqliteVoteStore::default_path);
        let store = SqliteVoteStore::open(&database)
            .unwrap_or_else(|e| bail(format!("Failed to open database {}: {e}", database.display())));
        debug!(database = %store.path().display(), "opened vote store");

        Context { cfg, store }
    }

    fn engine(&self, seed: Option<u64>) -> RankingEngine<&SqliteVoteStore> {
        let mut elo = EloConfig::default();
        if let Some(k) = self.cfg.elo_k {
            elo.k_factor = k;
        }
        let config = EngineConfig {
            elo,
            seed: seed.or(self.cfg.seed),
            ..EngineConfig::default()
        };
        RankingEngine::new(&self.store, config)
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Init = cli.command {
        let path = cli.config.clone().unwrap_or_else(config::config_path);
        config::create_default_config(&path);
        println!("Created config at {}", path.display());
        println!("Edit it to set your default database, ranking method, etc.");
        return;
    }

    let ctx = Context::load(&cli);
    match &cli.command {
        Commands::Init => {}
        Commands::AddItem(args) => run_add_item(&ctx, args),
        Commands::ListItems(args) => {
            let items = ctx
                .store
                .list_items()
                .unwrap_or_else(|e| bail(format!("Failed to list items: {e}")));
            print!("{}", output::render_items(&items, args.json));
        }
        Commands::RegisterVoter(args) => run_register_voter(&ctx, args),
        Commands::Vote(args) => run_vote(&ctx, args),
        Commands::NextPair(args) => {
            let pair = next_pair(&ctx, args.voter, args.seed);
            print_pair("Next pair", pair);
        }
        Commands::Rank(args) => run_rank(&ctx, args),
        Commands::Matchups(args) => {
            let summary = ctx
                .engine(None)
                .matchup_summary(args.item)
                .unwrap_or_else(|e| bail(e));
            print!("{}", output::render_matchups(args.item, &summary, args.json));
        }
        Commands::Intransitivity(args) => {
            let report = ctx
                .engine(None)
                .intransitivity(&args.filters.to_filters())
                .unwrap_or_else(|e| bail(e));
            print!("{}", output::render_intransitivity(&report, args.json));
        }
    }
}

fn run_add_item(ctx: &Context, args: &AddItemArgs) {
    let id = ctx
        .store
        .add_item(args.name.as_deref())
        .unwrap_or_else(|e| bail(format!("Failed to add item: {e}")));
    println!("Added item {id}");
}

fn run_register_voter(ctx: &Context, args: &RegisterVoterArgs) {
    let profile = VoterProfile {
        id: 0,
        gender_identity: args.gender.clone(),
        age: args.age,
        education: args.education.clone(),
        location: args.location.clone(),
        dog_ownership: args.dog_owner,
        affiliation: args.affiliation.clone(),
    };
    let id = ctx
        .store
        .register_voter(&profile)
        .unwrap_or_else(|e| bail(format!("Failed to register voter: {e}")));
    println!("Registered voter {id}");
    print_pair("First pair", next_pair(ctx, id, None));
}

fn run_vote(ctx: &Context, args: &VoteArgs) {
    let winner = if args.tie { None } else { args.winner };
    let vote = ctx
        .store
        .submit_vote(args.voter, args.item1, args.item2, winner)
        .unwrap_or_else(|e| bail(format!("Vote rejected: {e}")));
    println!("Recorded {} vs {}: {}", vote.item1, vote.item2, vote.outcome);
    print_pair("Next pair", next_pair(ctx, args.voter, args.seed));
}

fn next_pair(ctx: &Context, voter: VoterId, seed: Option<u64>) -> Option<Pair> {
    ctx.engine(seed)
        .select_next_pair(voter)
        .unwrap_or_else(|e| bail(e))
}

fn print_pair(label: &str, pair: Option<Pair>) {
    match pair {
        Some((a, b)) => println!("{label}: {a} vs {b}"),
        None => println!("{label}: none, every matchup has been voted on"),
    }
}

fn run_rank(ctx: &Context, args: &RankArgs) {
    let method: RankingMethod = args
        .method
        .clone()
        .or_else(|| ctx.cfg.method.clone())
        .unwrap_or_else(|| RankingMethod::RankedPairs.as_str().to_string())
        .parse()
        .unwrap_or_else(|e| bail(format!("{e}. Use one of: ranked_pairs, copeland, elo, minimax, win_ratio, win_tie_ratio")));
    let format = output::parse_format(
        args.format
            .as_deref()
            .or(ctx.cfg.format.as_deref())
            .unwrap_or("table"),
    );

    let ordering = ctx
        .engine(args.seed)
        .rank_by_method(method, &args.filters.to_filters())
        .unwrap_or_else(|e| bail(e));

    let rendered = match format {
        OutputFormat::Columns => output::render_columns(&ordering, args.flatten_ties),
        OutputFormat::Table | OutputFormat::Json => {
            let names = ctx
                .store
                .item_names()
                .unwrap_or_else(|e| bail(format!("Failed to read item names: {e}")));
            if format == OutputFormat::Table {
                output::render_table(&ordering, &names, method, args.flatten_ties)
            } else {
                output::render_json(&ordering, &names, method, args.flatten_ties)
            }
        }
    };
    print!("{rendered}");
}
