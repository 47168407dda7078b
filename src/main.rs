use anyhow::Result;
use ariadne::association::AssociationPool;
use ariadne::config;
use ariadne::extract::{self, ExtractConfig};
use ariadne::store::RecordStore;
use ariadne::writer;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "ariadne")]
#[command(about = "Sample a bounded author/publication/venue snapshot from the dblp dump")]
struct Cli {
    /// Path to the dblp XML dump (.xml or .xml.bz2)
    dblp_xml: String,

    /// Path to the dblp DTD declaring the character entities
    dblp_dtd: String,

    /// Output directory for the result files
    #[arg(short, long, default_value = config::RESULTS_DIR)]
    output: PathBuf,

    /// JSON file listing the associations (built-in list if omitted and absent)
    #[arg(long)]
    associations: Option<PathBuf>,

    /// Seed for the synthetic affiliation draw
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ORCID-carrying persons to start from
    #[arg(long, default_value_t = config::SEED_COUNT)]
    seed_count: usize,

    /// Work-list size after which co-author discovery stops
    #[arg(long, default_value_t = config::MAX_AUTHORS)]
    max_authors: usize,

    /// Citations expanded per leaf publication
    #[arg(long, default_value_t = config::MAX_CITATIONS_PER_PUB)]
    max_citations: usize,

    /// Member edges emitted per context
    #[arg(long, default_value_t = config::MAX_CONTEXT_MEMBERS)]
    max_context_members: usize,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn load_associations(path: Option<&Path>) -> Result<AssociationPool> {
    if let Some(path) = path {
        return AssociationPool::load(path);
    }
    let default = Path::new(config::ASSOCIATIONS_FILE);
    if default.exists() {
        AssociationPool::load(default)
    } else {
        warn!(
            path = ?default,
            "Association file not found, using built-in list"
        );
        Ok(AssociationPool::builtin())
    }
}

fn run(cli: Cli) -> Result<()> {
    let pool = load_associations(cli.associations.as_deref())?;

    let start_store = Instant::now();
    let store = RecordStore::build(&cli.dblp_xml, &cli.dblp_dtd)?;
    let store_duration = start_store.elapsed();
    info!(duration_secs = store_duration.as_secs_f64(), "Store pass complete");

    let extract_config = ExtractConfig {
        seed_count: cli.seed_count,
        max_authors: cli.max_authors,
        max_citations: cli.max_citations,
        max_context_members: cli.max_context_members,
        rng_seed: cli.seed,
    };

    let start_extracting = Instant::now();
    let extraction = extract::run_extraction(&store, pool, &extract_config)?;
    writer::write_snapshot(&extraction.snapshot, &cli.output)?;
    let extraction_duration = start_extracting.elapsed();

    let snapshot = &extraction.snapshot;
    let stats = &extraction.stats;

    println!();
    println!("=== Summary ===");
    println!("Store time:         {:.2}s", store_duration.as_secs_f64());
    println!("Extraction time:    {:.2}s", extraction_duration.as_secs_f64());
    println!(
        "Total time:         {:.2}s",
        (store_duration + extraction_duration).as_secs_f64()
    );
    println!();
    println!("Authors:            {}", snapshot.authors.len());
    println!("Publications:       {}", snapshot.publications.len());
    println!("Contexts:           {}", snapshot.contexts.len());
    println!("Authored edges:     {}", snapshot.authored.len());
    println!("Publications filed: {}", stats.publications());
    println!("Citation edges:     {}", stats.citation_edges());
    println!("Member edges:       {}", stats.member_edges());
    println!("Crossrefs resolved: {}", stats.crossrefs());
    println!("Unresolved refs:    {}", stats.unresolved());
    println!("Output directory:   {}", cli.output.display());

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    match run(cli) {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
