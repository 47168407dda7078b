//! Venue aggregation.
//!
//! Conferences are keyed by their proceedings record and take their member
//! list from its table of contents. Journals are discovered one article at a
//! time and keyed by the first article's key prefix. Both are merged by venue
//! title: a title seen once always maps back to the same context.

use crate::identity::stable_hash;
use crate::models::{PublicationRecord, PublicationTag};
use crate::store::RecordStore;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct Conference {
    pub key: String,
    pub title: String,
    pub venue: String,
    pub year: Option<u32>,
    pub publisher: String,
    pub url: String,
    pub members: Vec<String>,
}

impl Conference {
    fn from_proceedings(proceedings: &PublicationRecord, store: &RecordStore) -> Self {
        let venue = proceedings
            .booktitle
            .as_deref()
            .or(proceedings.series.as_deref())
            .unwrap_or("");
        Self {
            key: proceedings.key.clone(),
            title: proceedings.title().to_string(),
            venue: venue.to_string(),
            year: proceedings.year,
            publisher: proceedings.publisher.clone().unwrap_or_default(),
            url: proceedings.url.clone().unwrap_or_default(),
            members: store.toc_members(proceedings),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Journal {
    pub key: String,
    pub title: String,
    pub members: Vec<String>,
}

impl Journal {
    fn from_article(article: &PublicationRecord, title: &str) -> Self {
        Self {
            key: journal_key(article, title),
            title: title.to_string(),
            members: vec![article.key.clone()],
        }
    }
}

/// `journals/tods/Codd70` -> `journals/tods`
fn journal_key(article: &PublicationRecord, title: &str) -> String {
    match article.key.rfind('/') {
        Some(idx) if idx > 0 => article.key[..idx].to_string(),
        _ => format!("journal/{}", stable_hash(title)),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Context {
    Conference(Conference),
    Journal(Journal),
}

impl Context {
    pub fn key(&self) -> &str {
        match self {
            Self::Conference(c) => &c.key,
            Self::Journal(j) => &j.key,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Conference(c) => &c.title,
            Self::Journal(j) => &j.title,
        }
    }

    /// Every member discovered so far, in discovery order. Uncapped.
    pub fn members(&self) -> &[String] {
        match self {
            Self::Conference(c) => &c.members,
            Self::Journal(j) => &j.members,
        }
    }

    /// Appends `key` unless it is already a member (or the context itself).
    pub fn insert_member(&mut self, key: &str) -> bool {
        if key == self.key() || self.members().iter().any(|m| m == key) {
            return false;
        }
        match self {
            Self::Conference(c) => c.members.push(key.to_string()),
            Self::Journal(j) => j.members.push(key.to_string()),
        }
        true
    }

    pub fn to_row(&self) -> Vec<String> {
        match self {
            Self::Conference(c) => vec![
                c.key.clone(),
                c.title.clone(),
                c.venue.clone(),
                c.year
                    .map(|y| itoa::Buffer::new().format(y).to_string())
                    .unwrap_or_default(),
                c.publisher.clone(),
                c.url.clone(),
            ],
            Self::Journal(j) => vec![j.key.clone(), j.title.clone()],
        }
    }
}

/// Outcome of filing one publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filing {
    /// The publication entered the leaf set on this call.
    pub leaf: bool,
    /// Key of the context the publication created or joined.
    pub context: Option<String>,
}

/// Classifies publications into leaves and venue contexts, merging venues
/// discovered at different times.
#[derive(Debug, Default)]
pub struct ContextAggregator {
    contexts: Vec<Context>,
    by_title: FxHashMap<String, usize>,
    by_key: FxHashMap<String, usize>,
    leaves: Vec<String>,
    leaf_keys: FxHashSet<String>,
}

impl ContextAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(&mut self, publication: &PublicationRecord, store: &RecordStore) -> Filing {
        match publication.tag {
            PublicationTag::Proceedings => Filing {
                leaf: false,
                context: Some(self.file_proceedings(publication, store)),
            },
            PublicationTag::Article => match publication.journal.as_deref() {
                Some(title) if !title.is_empty() => self.file_article(publication, title),
                _ => Filing {
                    leaf: self.add_leaf(&publication.key),
                    context: None,
                },
            },
            _ => Filing {
                leaf: self.add_leaf(&publication.key),
                context: None,
            },
        }
    }

    fn file_proceedings(&mut self, proceedings: &PublicationRecord, store: &RecordStore) -> String {
        // Untitled proceedings cannot merge by title; fall back to the key.
        let identity = match proceedings.title() {
            "" => proceedings.key.as_str(),
            title => title,
        };
        if let Some(&idx) = self.by_title.get(identity) {
            return self.contexts[idx].key().to_string();
        }
        if let Some(&idx) = self.by_key.get(&proceedings.key) {
            self.by_title.insert(identity.to_string(), idx);
            return proceedings.key.clone();
        }
        let conference = Conference::from_proceedings(proceedings, store);
        debug!(key = %conference.key, members = conference.members.len(), "New conference");
        self.push_context(identity, Context::Conference(conference))
    }

    fn file_article(&mut self, article: &PublicationRecord, title: &str) -> Filing {
        if let Some(&idx) = self.by_title.get(title) {
            let context = &mut self.contexts[idx];
            context.insert_member(&article.key);
            return Filing {
                leaf: false,
                context: Some(context.key().to_string()),
            };
        }

        let journal = Journal::from_article(article, title);
        // A second spelling of a known journal key joins the existing context.
        if let Some(&idx) = self.by_key.get(&journal.key) {
            self.by_title.insert(title.to_string(), idx);
            let context = &mut self.contexts[idx];
            context.insert_member(&article.key);
            return Filing {
                leaf: false,
                context: Some(context.key().to_string()),
            };
        }

        debug!(key = %journal.key, title, "New journal");
        let key = self.push_context(title, Context::Journal(journal));
        Filing {
            leaf: self.add_leaf(&article.key),
            context: Some(key),
        }
    }

    fn push_context(&mut self, identity: &str, context: Context) -> String {
        let idx = self.contexts.len();
        let key = context.key().to_string();
        self.by_title.insert(identity.to_string(), idx);
        self.by_key.insert(key.clone(), idx);
        self.contexts.push(context);
        key
    }

    fn add_leaf(&mut self, key: &str) -> bool {
        if !self.leaf_keys.insert(key.to_string()) {
            return false;
        }
        self.leaves.push(key.to_string());
        true
    }

    /// Leaf keys in filing order.
    pub fn leaves(&self) -> &[String] {
        &self.leaves
    }

    #[cfg(test)]
    pub fn is_leaf(&self, key: &str) -> bool {
        self.leaf_keys.contains(key)
    }

    pub fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    #[cfg(test)]
    pub fn context_of_title(&self, title: &str) -> Option<&Context> {
        self.by_title.get(title).map(|&idx| &self.contexts[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(key: &str, journal: Option<&str>) -> PublicationRecord {
        let mut p = PublicationRecord::new(key, PublicationTag::Article);
        p.set_field("title", format!("Paper {}", key));
        if let Some(journal) = journal {
            p.set_field("journal", journal.to_string());
        }
        p
    }

    fn toc_entry(key: &str, tag: PublicationTag, title: &str, page: &str) -> PublicationRecord {
        let mut p = PublicationRecord::new(key, tag);
        p.set_field("title", title.to_string());
        p.set_field("url", format!("{}#{}", page, key));
        p
    }

    fn conference_store() -> RecordStore {
        let mut proceedings = toc_entry("conf/c/2020", PublicationTag::Proceedings, "Proc. C 2020", "db/conf/c/c2020.html");
        proceedings.set_field("booktitle", "C".to_string());
        proceedings.set_field("year", "2020".to_string());
        proceedings.set_field("publisher", "ACM".to_string());
        RecordStore::from_records(
            Vec::new(),
            vec![
                proceedings,
                toc_entry("conf/c/P1", PublicationTag::InProceedings, "P1", "db/conf/c/c2020.html"),
                toc_entry("conf/c/P2", PublicationTag::InProceedings, "P2", "db/conf/c/c2020.html"),
            ],
        )
    }

    #[test]
    fn first_article_is_leaf_and_member() {
        let store = RecordStore::from_records(Vec::new(), Vec::new());
        let mut agg = ContextAggregator::new();
        let filing = agg.file(&article("journals/x/A", Some("X")), &store);
        assert_eq!(
            filing,
            Filing {
                leaf: true,
                context: Some("journals/x".to_string())
            }
        );
        assert_eq!(agg.leaves(), ["journals/x/A"]);
        assert_eq!(agg.contexts()[0].members(), ["journals/x/A"]);
    }

    #[test]
    fn later_articles_join_without_becoming_leaves() {
        let store = RecordStore::from_records(Vec::new(), Vec::new());
        let mut agg = ContextAggregator::new();
        agg.file(&article("journals/x/A", Some("X")), &store);
        let filing = agg.file(&article("journals/x/B", Some("X")), &store);
        assert!(!filing.leaf);
        assert_eq!(filing.context.as_deref(), Some("journals/x"));
        assert_eq!(agg.leaves(), ["journals/x/A"]);
        assert_eq!(agg.contexts().len(), 1);
        assert_eq!(agg.contexts()[0].members(), ["journals/x/A", "journals/x/B"]);
    }

    #[test]
    fn merge_is_idempotent() {
        let store = RecordStore::from_records(Vec::new(), Vec::new());
        let mut agg = ContextAggregator::new();
        let a = article("journals/x/A", Some("X"));
        let first = agg.file(&a, &store);
        let second = agg.file(&a, &store);
        assert_eq!(first.context, second.context);
        assert!(!second.leaf);
        assert_eq!(agg.contexts()[0].members(), ["journals/x/A"]);
    }

    #[test]
    fn same_title_different_keys_merge() {
        let store = RecordStore::from_records(Vec::new(), Vec::new());
        let mut agg = ContextAggregator::new();
        let p1 = agg.file(&article("journals/x/A", Some("Same Name")), &store);
        let p2 = agg.file(&article("journals/y/B", Some("Same Name")), &store);
        assert_eq!(p1.context, p2.context);
        assert_eq!(agg.contexts().len(), 1);
    }

    #[test]
    fn same_key_prefix_different_titles_merge() {
        let store = RecordStore::from_records(Vec::new(), Vec::new());
        let mut agg = ContextAggregator::new();
        agg.file(&article("journals/x/A", Some("J. X")), &store);
        let filing = agg.file(&article("journals/x/B", Some("Journal of X")), &store);
        assert!(!filing.leaf);
        assert_eq!(agg.contexts().len(), 1);
        assert_eq!(
            agg.context_of_title("Journal of X").map(Context::key),
            Some("journals/x")
        );
    }

    #[test]
    fn article_without_journal_is_leaf_only() {
        let store = RecordStore::from_records(Vec::new(), Vec::new());
        let mut agg = ContextAggregator::new();
        let filing = agg.file(&article("journals/x/A", None), &store);
        assert_eq!(filing, Filing { leaf: true, context: None });
        assert!(agg.contexts().is_empty());
    }

    #[test]
    fn other_tags_are_leaves() {
        let store = RecordStore::from_records(Vec::new(), Vec::new());
        let mut agg = ContextAggregator::new();
        let book = PublicationRecord::new("books/x/B", PublicationTag::Book);
        assert!(agg.file(&book, &store).leaf);
        assert!(!agg.file(&book, &store).leaf);
        assert_eq!(agg.leaves(), ["books/x/B"]);
    }

    #[test]
    fn proceedings_create_conference_from_toc() {
        let store = conference_store();
        let mut agg = ContextAggregator::new();
        let proceedings = store.publication("conf/c/2020").unwrap();
        let filing = agg.file(proceedings, &store);
        assert_eq!(filing.context.as_deref(), Some("conf/c/2020"));
        assert!(!filing.leaf);
        assert!(!agg.is_leaf("conf/c/2020"));

        let context = &agg.contexts()[0];
        assert_eq!(context.members(), ["conf/c/P1", "conf/c/P2"]);
        assert_eq!(
            context.to_row(),
            vec!["conf/c/2020", "Proc. C 2020", "C", "2020", "ACM", "db/conf/c/c2020.html#conf/c/2020"]
        );
    }

    #[test]
    fn repeated_proceedings_is_noop() {
        let store = conference_store();
        let mut agg = ContextAggregator::new();
        let proceedings = store.publication("conf/c/2020").unwrap();
        agg.file(proceedings, &store);
        agg.file(proceedings, &store);
        assert_eq!(agg.contexts().len(), 1);
        assert!(agg.leaves().is_empty());
    }

    #[test]
    fn inproceedings_is_leaf() {
        let store = conference_store();
        let mut agg = ContextAggregator::new();
        let paper = store.publication("conf/c/P1").unwrap();
        assert_eq!(agg.file(paper, &store), Filing { leaf: true, context: None });
    }

    #[test]
    fn journal_key_without_slash_hashes_title() {
        let a = article("orphan", Some("X"));
        assert_eq!(journal_key(&a, "X"), format!("journal/{}", stable_hash("X")));
    }

    #[test]
    fn insert_member_rejects_self_and_duplicates() {
        let mut context = Context::Journal(Journal {
            key: "journals/x".to_string(),
            title: "X".to_string(),
            members: vec!["journals/x/A".to_string()],
        });
        assert!(!context.insert_member("journals/x"));
        assert!(!context.insert_member("journals/x/A"));
        assert!(context.insert_member("journals/x/B"));
        assert_eq!(context.to_row(), vec!["journals/x", "X"]);
    }
}
