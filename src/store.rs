use crate::config::PROGRESS_INTERVAL;
use crate::models::{PersonRecord, PublicationRecord};
use crate::parser::{load_dtd_entities, DblpReader, DblpRecord};
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

/// Immutable in-memory view of the dblp dump: persons, publications and the
/// lookups the extractor needs. Built once, read-only afterwards.
pub struct RecordStore {
    persons: Vec<PersonRecord>,
    person_by_pid: FxHashMap<String, usize>,
    person_by_name: FxHashMap<String, usize>,
    publications: Vec<PublicationRecord>,
    publication_by_key: FxHashMap<String, usize>,
    publications_by_person: Vec<Vec<usize>>,
    toc: FxHashMap<String, Vec<usize>>,
}

impl RecordStore {
    pub fn build(xml_path: &str, dtd_path: &str) -> Result<Self> {
        let entities = load_dtd_entities(dtd_path)?;
        let reader = DblpReader::open(xml_path, entities)?;
        let pb = ProgressBar::new_spinner();

        info!("Building record store from: {}", xml_path);

        let mut persons = Vec::new();
        let mut publications = Vec::new();
        let mut seen: u64 = 0;

        for record in reader {
            match record.with_context(|| format!("Failed to parse dblp dump at: {}", xml_path))? {
                DblpRecord::Person(p) => persons.push(p),
                DblpRecord::Publication(p) => publications.push(p),
            }
            seen += 1;
            if seen % PROGRESS_INTERVAL == 0 {
                pb.tick();
            }
        }

        pb.finish_and_clear();

        let store = Self::from_records(persons, publications);
        info!(
            persons = store.num_persons(),
            publications = store.num_publications(),
            "Record store built successfully"
        );
        Ok(store)
    }

    /// Indexes already-parsed records. Duplicate keys keep the first record.
    pub fn from_records(persons: Vec<PersonRecord>, publications: Vec<PublicationRecord>) -> Self {
        let mut person_by_pid = FxHashMap::default();
        let mut person_by_name = FxHashMap::default();
        let mut kept_persons = Vec::with_capacity(persons.len());

        for person in persons {
            if person_by_pid.contains_key(person.pid()) {
                debug!(pid = person.pid(), "Duplicate person record");
                continue;
            }
            let idx = kept_persons.len();
            person_by_pid.insert(person.pid().to_string(), idx);
            for name in &person.names {
                person_by_name.entry(name.clone()).or_insert(idx);
            }
            kept_persons.push(person);
        }

        let mut publication_by_key = FxHashMap::default();
        let mut publications_by_person = vec![Vec::new(); kept_persons.len()];
        let mut toc: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        let mut kept_publications = Vec::with_capacity(publications.len());

        for publication in publications {
            if publication_by_key.contains_key(&publication.key) {
                debug!(key = %publication.key, "Duplicate publication record");
                continue;
            }
            let idx = kept_publications.len();
            publication_by_key.insert(publication.key.clone(), idx);

            for name in &publication.names {
                if let Some(&person_idx) = person_by_name.get(name) {
                    let list: &mut Vec<usize> = &mut publications_by_person[person_idx];
                    if list.last() != Some(&idx) {
                        list.push(idx);
                    }
                }
            }
            if let Some(page) = publication.toc_page() {
                toc.entry(page.to_string()).or_default().push(idx);
            }
            kept_publications.push(publication);
        }

        Self {
            persons: kept_persons,
            person_by_pid,
            person_by_name,
            publications: kept_publications,
            publication_by_key,
            publications_by_person,
            toc,
        }
    }

    pub fn person(&self, pid: &str) -> Option<&PersonRecord> {
        self.person_by_pid.get(pid).map(|&i| &self.persons[i])
    }

    pub fn person_by_name(&self, name: &str) -> Option<&PersonRecord> {
        self.person_by_name.get(name).map(|&i| &self.persons[i])
    }

    pub fn publication(&self, key: &str) -> Option<&PublicationRecord> {
        self.publication_by_key
            .get(key)
            .map(|&i| &self.publications[i])
    }

    /// All persons in dump order.
    pub fn persons(&self) -> impl Iterator<Item = &PersonRecord> {
        self.persons.iter()
    }

    /// Publications naming `person` as author or editor, in dump order.
    pub fn publications_of<'a>(
        &'a self,
        person: &PersonRecord,
    ) -> impl Iterator<Item = &'a PublicationRecord> + 'a {
        let indices: &'a [usize] = self
            .person_by_pid
            .get(person.pid())
            .map(|&i| self.publications_by_person[i].as_slice())
            .unwrap_or(&[]);
        indices.iter().map(move |&i| &self.publications[i])
    }

    /// Keys listed on the same table-of-contents page as `publication`,
    /// excluding the publication itself.
    pub fn toc_members(&self, publication: &PublicationRecord) -> Vec<String> {
        let Some(indices) = publication.toc_page().and_then(|page| self.toc.get(page)) else {
            return Vec::new();
        };
        indices
            .iter()
            .map(|&i| &self.publications[i].key)
            .filter(|key| **key != publication.key)
            .cloned()
            .collect()
    }

    pub fn num_persons(&self) -> usize {
        self.persons.len()
    }

    pub fn num_publications(&self) -> usize {
        self.publications.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PublicationTag;

    fn person(key: &str, names: &[&str]) -> PersonRecord {
        PersonRecord {
            key: format!("homepages/{}", key),
            names: names.iter().map(|n| n.to_string()).collect(),
            urls: Vec::new(),
        }
    }

    fn publication(key: &str, tag: PublicationTag, names: &[&str], url: Option<&str>) -> PublicationRecord {
        let mut p = PublicationRecord::new(key, tag);
        for n in names {
            p.set_field("author", n.to_string());
        }
        if let Some(url) = url {
            p.set_field("url", url.to_string());
        }
        p
    }

    fn make_store() -> RecordStore {
        RecordStore::from_records(
            vec![
                person("a/Alice", &["Alice", "Alice A. Alias"]),
                person("b/Bob", &["Bob"]),
            ],
            vec![
                publication("journals/x/1", PublicationTag::Article, &["Alice", "Bob"], None),
                publication("journals/x/2", PublicationTag::Article, &["Alice A. Alias"], None),
                publication(
                    "conf/c/2020",
                    PublicationTag::Proceedings,
                    &[],
                    Some("db/conf/c/c2020.html"),
                ),
                publication(
                    "conf/c/P1",
                    PublicationTag::InProceedings,
                    &["Bob", "Carol"],
                    Some("db/conf/c/c2020.html#P1"),
                ),
                publication(
                    "conf/c/P2",
                    PublicationTag::InProceedings,
                    &[],
                    Some("db/conf/c/c2020.html#P2"),
                ),
            ],
        )
    }

    #[test]
    fn lookup_by_pid_and_name() {
        let store = make_store();
        assert_eq!(store.person("a/Alice").map(|p| p.primary_name()), Some("Alice"));
        assert_eq!(store.person_by_name("Alice A. Alias").map(|p| p.pid()), Some("a/Alice"));
        assert!(store.person_by_name("Carol").is_none());
    }

    #[test]
    fn publications_follow_aliases() {
        let store = make_store();
        let alice = store.person("a/Alice").unwrap();
        let keys: Vec<_> = store.publications_of(alice).map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["journals/x/1", "journals/x/2"]);
    }

    #[test]
    fn unknown_person_has_no_publications() {
        let store = make_store();
        let stranger = person("z/Zed", &["Zed"]);
        assert_eq!(store.publications_of(&stranger).count(), 0);
    }

    #[test]
    fn toc_members_exclude_self() {
        let store = make_store();
        let proceedings = store.publication("conf/c/2020").unwrap();
        assert_eq!(store.toc_members(proceedings), vec!["conf/c/P1", "conf/c/P2"]);
    }

    #[test]
    fn toc_members_empty_without_url() {
        let store = make_store();
        let article = store.publication("journals/x/1").unwrap();
        assert!(store.toc_members(article).is_empty());
    }

    #[test]
    fn duplicate_keys_keep_first() {
        let store = RecordStore::from_records(
            vec![person("a/Alice", &["Alice"]), person("a/Alice", &["Other"])],
            vec![
                publication("k", PublicationTag::Book, &["Alice"], None),
                publication("k", PublicationTag::Article, &[], None),
            ],
        );
        assert_eq!(store.num_persons(), 1);
        assert_eq!(store.num_publications(), 1);
        assert_eq!(store.publication("k").map(|p| p.tag), Some(PublicationTag::Book));
        assert!(store.person_by_name("Other").is_none());
    }

    #[test]
    fn name_listed_twice_counts_once() {
        let store = RecordStore::from_records(
            vec![person("a/Alice", &["Alice"])],
            vec![publication("k", PublicationTag::Book, &["Alice", "Alice"], None)],
        );
        let alice = store.person("a/Alice").unwrap();
        assert_eq!(store.publications_of(alice).count(), 1);
    }

    #[test]
    fn missing_lookups_return_none() {
        let store = make_store();
        assert!(store.publication("nope").is_none());
        assert!(store.person("nope").is_none());
    }
}
