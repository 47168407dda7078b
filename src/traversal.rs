//! Bounded breadth-first walk over the co-authorship graph.

use crate::extract::Extractor;
use crate::models::{PersonRecord, PublicationRecord};
use rustc_hash::FxHashSet;
use tracing::{debug, info};

/// FIFO queue of person ids. Each pid is queued at most once; once the queue
/// holds more than `cap` entries discovery closes for good.
#[derive(Debug)]
pub struct WorkList {
    queue: Vec<String>,
    queued: FxHashSet<String>,
    cap: usize,
    closed: bool,
}

impl WorkList {
    pub fn new(cap: usize) -> Self {
        Self {
            queue: Vec::new(),
            queued: FxHashSet::default(),
            cap,
            closed: false,
        }
    }

    /// Seeds bypass the cap.
    pub fn seed(&mut self, pid: &str) -> bool {
        self.push(pid)
    }

    /// Offers a discovered pid. The cap is checked first, but an offer that
    /// closes the list still lands so the batch in flight completes.
    pub fn offer(&mut self, pid: &str) -> bool {
        if !self.closed && self.queue.len() > self.cap {
            self.closed = true;
            info!(queued = self.queue.len(), cap = self.cap, "Visitor cap reached, discovery closed");
        }
        self.push(pid)
    }

    fn push(&mut self, pid: &str) -> bool {
        if !self.queued.insert(pid.to_string()) {
            return false;
        }
        self.queue.push(pid.to_string());
        true
    }

    pub fn is_open(&self) -> bool {
        !self.closed
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.queue.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<'a> Extractor<'a> {
    /// Visits every queued person once, in FIFO order.
    pub(crate) fn traverse(&mut self, seeds: &[&'a PersonRecord]) {
        let store = self.store;
        let mut work = WorkList::new(self.config.max_authors);
        for seed in seeds {
            work.seed(seed.pid());
        }

        let mut cursor = 0;
        while cursor < work.len() {
            let person = work.get(cursor).and_then(|pid| store.person(pid));
            cursor += 1;
            if let Some(person) = person {
                self.visit(person, &mut work);
            }
        }

        info!(
            queued = work.len(),
            visited = self.stats.authors(),
            "Traversal complete"
        );
    }

    fn visit(&mut self, person: &'a PersonRecord, work: &mut WorkList) {
        let store = self.store;
        let mut publications = store.publications_of(person).peekable();
        if publications.peek().is_none() {
            debug!(pid = person.pid(), "Person without publications skipped");
            return;
        }

        self.stats.inc_authors();
        let author = self.identities.author(person);
        self.snapshot.add_author(&author);

        for publication in publications {
            if work.is_open() {
                self.discover_coauthors(person, publication, work);
            }
            let filing = self.aggregator.file(publication, store);
            self.stats.inc_publications();
            if publication.is_proceedings() {
                continue;
            }
            self.snapshot.authored.insert(person.pid(), &publication.key);
            // Journal members get their row at context emission, under the cap.
            if filing.leaf {
                self.snapshot.add_publication(publication);
            }
        }
    }

    fn discover_coauthors(
        &mut self,
        person: &PersonRecord,
        publication: &PublicationRecord,
        work: &mut WorkList,
    ) {
        let store = self.store;
        for name in publication.coauthor_names(person.primary_name()) {
            match store.person_by_name(name) {
                Some(coauthor) => {
                    work.offer(coauthor.pid());
                }
                None => {
                    self.stats.inc_unresolved_names();
                    debug!(name, key = %publication.key, "Co-author not in record store");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pids_are_queued_once() {
        let mut work = WorkList::new(10);
        assert!(work.seed("a"));
        assert!(work.offer("b"));
        assert!(!work.offer("a"));
        assert_eq!(work.len(), 2);
        assert_eq!(work.get(1), Some("b"));
    }

    #[test]
    fn offer_that_crosses_cap_still_lands() {
        let mut work = WorkList::new(2);
        work.seed("a");
        for pid in ["b", "c", "d", "e", "f"] {
            assert!(work.offer(pid));
        }
        assert!(!work.is_open());
        assert_eq!(work.len(), 6);
    }

    #[test]
    fn stays_open_until_cap_exceeded() {
        let mut work = WorkList::new(2);
        work.seed("a");
        work.offer("b");
        work.offer("c");
        assert!(work.is_open());
        work.offer("d");
        assert!(!work.is_open());
    }

    #[test]
    fn seeds_ignore_cap() {
        let mut work = WorkList::new(0);
        for pid in ["a", "b", "c"] {
            assert!(work.seed(pid));
        }
        assert!(work.is_open());
        assert_eq!(work.len(), 3);
    }
}
