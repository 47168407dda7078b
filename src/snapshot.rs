use crate::association::AssociationPool;
use crate::identity::{Author, Publication};
use crate::models::PublicationRecord;
use rustc_hash::FxHashSet;

/// Rows keyed by their first column. The first row for a key wins and
/// insertion order is kept.
#[derive(Debug, Default)]
pub struct EntityTable {
    rows: Vec<Vec<String>>,
    keys: FxHashSet<String>,
}

impl EntityTable {
    pub fn insert(&mut self, row: Vec<String>) -> bool {
        let Some(key) = row.first() else {
            return false;
        };
        if !self.keys.insert(key.clone()) {
            return false;
        }
        self.rows.push(row);
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Set of directed pairs, kept in insertion order.
#[derive(Debug, Default)]
pub struct EdgeTable {
    pairs: Vec<(String, String)>,
    seen: FxHashSet<(String, String)>,
}

impl EdgeTable {
    pub fn insert(&mut self, from: &str, to: &str) -> bool {
        let pair = (from.to_string(), to.to_string());
        if self.seen.contains(&pair) {
            return false;
        }
        self.seen.insert(pair.clone());
        self.pairs.push(pair);
        true
    }

    pub fn contains(&self, from: &str, to: &str) -> bool {
        self.seen.contains(&(from.to_string(), to.to_string()))
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Targets of `from`, in insertion order.
    pub fn targets<'a>(&'a self, from: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(f, _)| f == from)
            .map(|(_, t)| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Everything one run emits, de-duplicated and ready to serialize.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub authors: EntityTable,
    pub associations: EntityTable,
    pub publications: EntityTable,
    pub contexts: EntityTable,
    pub authored: EdgeTable,
    pub affiliations: EdgeTable,
    pub citations: EdgeTable,
    pub context_members: EdgeTable,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the author row and its affiliation edge.
    pub fn add_author(&mut self, author: &Author) -> bool {
        if !self.authors.insert(author.to_row()) {
            return false;
        }
        self.affiliations
            .insert(&author.pid, &author.affiliation.association_id);
        true
    }

    /// Proceedings records are contexts and never get a publication row.
    pub fn add_publication(&mut self, record: &PublicationRecord) -> bool {
        if record.is_proceedings() || self.publications.contains(&record.key) {
            return false;
        }
        self.publications
            .insert(Publication::project(record).to_row())
    }

    pub fn add_associations(&mut self, pool: &AssociationPool) {
        for association in pool.iter() {
            self.associations.insert(association.to_row());
        }
    }
}
