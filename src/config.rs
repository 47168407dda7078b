/// Number of ORCID-carrying persons that seed the traversal
pub const SEED_COUNT: usize = 10;

/// Work-list size after which co-author discovery stops
pub const MAX_AUTHORS: usize = 500;

/// Citations kept per leaf publication
pub const MAX_CITATIONS_PER_PUB: usize = 5;

/// Member edges emitted per context
pub const MAX_CONTEXT_MEMBERS: usize = 10;

/// Placeholder dblp uses in `<cite>` for references it could not match
pub const CITE_PLACEHOLDER: &str = "...";

/// Default directory for the result files
pub const RESULTS_DIR: &str = "results";

/// Default association side file, looked up relative to the working directory
pub const ASSOCIATIONS_FILE: &str = "associations.json";

/// Progress update interval (tick every N records)
pub const PROGRESS_INTERVAL: u64 = 10_000;

/// Writer buffer size for result files
pub const WRITER_BUFFER_SIZE: usize = 128 * 1024;
