use crate::association::AssociationPool;
use crate::config::{MAX_AUTHORS, MAX_CITATIONS_PER_PUB, MAX_CONTEXT_MEMBERS, SEED_COUNT};
use crate::context::ContextAggregator;
use crate::identity::IdentityRegistry;
use crate::models::PersonRecord;
use crate::snapshot::Snapshot;
use crate::stats::ExtractionStats;
use crate::store::RecordStore;
use anyhow::{bail, Result};
use std::time::Instant;
use tracing::{info, warn};

/// Caps and seeding for one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub seed_count: usize,
    pub max_authors: usize,
    pub max_citations: usize,
    pub max_context_members: usize,
    /// Seed for the affiliation draw; `None` draws from OS entropy.
    pub rng_seed: Option<u64>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            seed_count: SEED_COUNT,
            max_authors: MAX_AUTHORS,
            max_citations: MAX_CITATIONS_PER_PUB,
            max_context_members: MAX_CONTEXT_MEMBERS,
            rng_seed: None,
        }
    }
}

pub struct Extraction {
    pub snapshot: Snapshot,
    pub stats: ExtractionStats,
}

/// State of one run. Traversal and resolution live in their own modules as
/// further `impl` blocks over this struct.
pub struct Extractor<'a> {
    pub(crate) store: &'a RecordStore,
    pub(crate) config: &'a ExtractConfig,
    pub(crate) identities: IdentityRegistry,
    pub(crate) aggregator: ContextAggregator,
    pub(crate) snapshot: Snapshot,
    pub(crate) stats: ExtractionStats,
}

impl<'a> Extractor<'a> {
    pub fn new(store: &'a RecordStore, pool: AssociationPool, config: &'a ExtractConfig) -> Self {
        Self {
            store,
            config,
            identities: IdentityRegistry::new(pool, config.rng_seed),
            aggregator: ContextAggregator::new(),
            snapshot: Snapshot::new(),
            stats: ExtractionStats::new(),
        }
    }

    pub fn run(mut self) -> Extraction {
        let seeds = select_seeds(self.store, self.config.seed_count);
        if seeds.is_empty() {
            warn!("No person with an ORCID in the record store, snapshot will be empty");
        }
        info!(seeds = seeds.len(), max_authors = self.config.max_authors, "Starting traversal");

        let start = Instant::now();
        self.traverse(&seeds);
        self.resolve_references();
        self.emit_contexts();
        self.snapshot.add_associations(self.identities.pool());

        info!(
            duration_secs = start.elapsed().as_secs_f64(),
            authors = self.snapshot.authors.len(),
            publications = self.snapshot.publications.len(),
            contexts = self.snapshot.contexts.len(),
            "Snapshot assembled"
        );

        Extraction {
            snapshot: self.snapshot,
            stats: self.stats,
        }
    }
}

/// The first `count` persons carrying an ORCID, in store order.
pub fn select_seeds(store: &RecordStore, count: usize) -> Vec<&PersonRecord> {
    store
        .persons()
        .filter(|person| person.orcid().is_some())
        .take(count)
        .collect()
}

pub fn run_extraction(
    store: &RecordStore,
    pool: AssociationPool,
    config: &ExtractConfig,
) -> Result<Extraction> {
    if config.seed_count == 0 {
        bail!("Seed count must be at least 1");
    }
    Ok(Extractor::new(store, pool, config).run())
}
