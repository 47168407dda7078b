//! Citation and cross-reference expansion, then context emission.
//!
//! Nothing here discovers authors. Records reached through a citation or a
//! crossref are filed with the aggregator and materialized as rows, but only
//! the leaves that existed when resolution started are expanded.

use crate::extract::Extractor;
use crate::models::PublicationRecord;
use tracing::{debug, info};

impl<'a> Extractor<'a> {
    pub(crate) fn resolve_references(&mut self) {
        let store = self.store;
        let leaves: Vec<String> = self.aggregator.leaves().to_vec();

        for key in &leaves {
            let Some(publication) = store.publication(key) else {
                continue;
            };
            self.resolve_citations(publication);
            self.resolve_crossref(publication);
        }

        info!(
            leaves = leaves.len(),
            citations = self.stats.citation_edges(),
            crossrefs = self.stats.crossrefs(),
            "References resolved"
        );
    }

    fn resolve_citations(&mut self, publication: &PublicationRecord) {
        let store = self.store;
        for cited in publication.citations().take(self.config.max_citations) {
            let Some(target) = store.publication(cited) else {
                self.stats.inc_unresolved_citations();
                debug!(key = %publication.key, cited, "Citation not in record store");
                continue;
            };
            if self.snapshot.citations.insert(&publication.key, &target.key) {
                self.stats.add_citation_edges(1);
            }
            self.snapshot.add_publication(target);
            self.aggregator.file(target, store);
        }
    }

    fn resolve_crossref(&mut self, publication: &PublicationRecord) {
        let store = self.store;
        let Some(crossref) = publication.crossref.as_deref() else {
            return;
        };
        match store.publication(crossref) {
            Some(target) => {
                let filing = self.aggregator.file(target, store);
                if filing.leaf {
                    self.snapshot.add_publication(target);
                }
                self.stats.inc_crossrefs();
            }
            None => {
                self.stats.inc_unresolved_crossrefs();
                debug!(key = %publication.key, crossref, "Crossref not in record store");
            }
        }
    }

    /// One row per context plus capped member edges; each emitted member is
    /// materialized as a publication row.
    pub(crate) fn emit_contexts(&mut self) {
        let store = self.store;
        let cap = self.config.max_context_members;

        for context in self.aggregator.contexts() {
            self.snapshot.contexts.insert(context.to_row());
            for member in context.members().iter().take(cap) {
                let Some(record) = store.publication(member) else {
                    self.stats.inc_unresolved_members();
                    debug!(context = context.key(), member = %member, "Context member not in record store");
                    continue;
                };
                if self.snapshot.context_members.insert(context.key(), &record.key) {
                    self.stats.add_member_edges(1);
                }
                self.snapshot.add_publication(record);
            }
        }

        info!(
            contexts = self.snapshot.contexts.len(),
            member_edges = self.stats.member_edges(),
            "Contexts emitted"
        );
    }
}
