//! Ariadne: bounded relational snapshots of the dblp record graph
//!
//! This crate samples authors, publications and venues ("contexts") from the
//! dblp XML dump and writes them, with the edges between them, as headerless
//! CSV files ready for a graph database import:
//!
//! 1. **Store Pass** -- Stream the dump (plain or bzip2) once, decode DTD
//!    character entities, and build an immutable in-memory record store with
//!    person, name, key and table-of-contents lookups
//! 2. **Traversal Pass** -- Breadth-first walk over co-authorship starting at
//!    ORCID-carrying seed persons, closed by a visitor cap
//! 3. **Resolution Pass** -- Expand capped citation lists and crossrefs of the
//!    leaf publications without discovering further authors
//! 4. **Emission Pass** -- Render contexts with capped member edges and write
//!    all eight result files
//!
//! # Architecture
//!
//! - **Single owner** -- All working sets live in one [`extract::Extractor`]
//!   value; the store is only read after it is built
//! - **Identity by key** -- Authors, publications and contexts compare by
//!   natural key; synthetic affiliation and email are memoized per person
//! - **Venue merge by title** -- Articles of the same journal title fold into
//!   one context no matter when they are discovered
//! - **Atomic operations** -- Lock-free counters for run statistics
//!
//! # Key Modules
//!
//! - [`parser`] -- Streaming dblp XML reader with DTD entity decoding
//! - [`store`] -- Immutable record store and lookups
//! - [`models`] -- Person and publication records, name parsing
//! - [`association`] -- Synthetic institution pool
//! - [`identity`] -- Author/publication projections and email derivation
//! - [`context`] -- Conference and journal aggregation
//! - [`traversal`] -- Capped co-author walk
//! - [`resolver`] -- Citations, crossrefs and context emission
//! - [`snapshot`] -- De-duplicated row and edge tables
//! - [`writer`] -- CSV escaping and result files
//! - [`extract`] -- Pipeline driver
//! - [`stats`] -- Atomic counters for extraction metrics
//! - [`config`] -- Constants and CLI defaults
//!
//! # Example Usage
//!
//! ```bash
//! # Sample with the default caps into results/
//! ariadne dblp.xml.bz2 dblp.dtd -v
//!
//! # Reproducible run with a larger visitor cap
//! ariadne dblp.xml dblp.dtd -o out/ --seed 42 --max-authors 2000
//! ```

pub mod association;
pub mod config;
pub mod context;
pub mod extract;
pub mod identity;
pub mod models;
pub mod parser;
pub mod resolver;
pub mod snapshot;
pub mod stats;
pub mod store;
pub mod traversal;
pub mod writer;
