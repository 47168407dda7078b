use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics collected during the extraction process
#[derive(Default)]
pub struct ExtractionStats {
    pub authors_visited: AtomicU64,
    pub unresolved_names: AtomicU64,
    pub publications_filed: AtomicU64,
    pub citation_edges: AtomicU64,
    pub unresolved_citations: AtomicU64,
    pub crossrefs_resolved: AtomicU64,
    pub unresolved_crossrefs: AtomicU64,
    pub member_edges: AtomicU64,
    pub unresolved_members: AtomicU64,
}

impl ExtractionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_authors(&self) {
        self.authors_visited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_unresolved_names(&self) {
        self.unresolved_names.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_publications(&self) {
        self.publications_filed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_citation_edges(&self, count: u64) {
        self.citation_edges.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_unresolved_citations(&self) {
        self.unresolved_citations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_crossrefs(&self) {
        self.crossrefs_resolved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_unresolved_crossrefs(&self) {
        self.unresolved_crossrefs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_member_edges(&self, count: u64) {
        self.member_edges.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_unresolved_members(&self) {
        self.unresolved_members.fetch_add(1, Ordering::Relaxed);
    }

    pub fn authors(&self) -> u64 {
        self.authors_visited.load(Ordering::Relaxed)
    }

    pub fn unresolved_names(&self) -> u64 {
        self.unresolved_names.load(Ordering::Relaxed)
    }

    pub fn publications(&self) -> u64 {
        self.publications_filed.load(Ordering::Relaxed)
    }

    pub fn citation_edges(&self) -> u64 {
        self.citation_edges.load(Ordering::Relaxed)
    }

    pub fn unresolved_citations(&self) -> u64 {
        self.unresolved_citations.load(Ordering::Relaxed)
    }

    pub fn crossrefs(&self) -> u64 {
        self.crossrefs_resolved.load(Ordering::Relaxed)
    }

    pub fn unresolved_crossrefs(&self) -> u64 {
        self.unresolved_crossrefs.load(Ordering::Relaxed)
    }

    pub fn member_edges(&self) -> u64 {
        self.member_edges.load(Ordering::Relaxed)
    }

    pub fn unresolved_members(&self) -> u64 {
        self.unresolved_members.load(Ordering::Relaxed)
    }

    /// References of any kind that did not resolve in the record store
    pub fn unresolved(&self) -> u64 {
        self.unresolved_names()
            + self.unresolved_citations()
            + self.unresolved_crossrefs()
            + self.unresolved_members()
    }
}
