//! Canonical entity values projected from store records.
//!
//! Authors and publications compare and hash by natural key only. Synthetic
//! affiliation and email are drawn once per person id and memoized in
//! [`IdentityRegistry`], so every projection of the same person agrees.

use crate::association::AssociationPool;
use crate::models::{PersonName, PersonRecord, PublicationRecord, PublicationTag};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};
use unicode_normalization::UnicodeNormalization;

/// Synthetic attributes assigned to one author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Affiliation {
    pub association_id: String,
    pub email: String,
}

pub struct IdentityRegistry {
    pool: AssociationPool,
    rng: StdRng,
    assigned: FxHashMap<String, Affiliation>,
}

impl IdentityRegistry {
    /// `seed` fixes the affiliation draw; `None` seeds from the OS.
    pub fn new(pool: AssociationPool, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            pool,
            rng,
            assigned: FxHashMap::default(),
        }
    }

    pub fn pool(&self) -> &AssociationPool {
        &self.pool
    }

    pub fn affiliation(&mut self, person: &PersonRecord) -> &Affiliation {
        if !self.assigned.contains_key(person.pid()) {
            let association = self.pool.pick(&mut self.rng);
            let email = derive_email(&PersonName::parse(person.primary_name()), association.domain());
            let affiliation = Affiliation {
                association_id: association.id.clone(),
                email,
            };
            self.assigned.insert(person.pid().to_string(), affiliation);
        }
        &self.assigned[person.pid()]
    }

    pub fn author(&mut self, person: &PersonRecord) -> Author {
        let affiliation = self.affiliation(person).clone();
        Author::project(person, affiliation)
    }
}

#[derive(Debug, Clone)]
pub struct Author {
    pub pid: String,
    pub name: String,
    pub urls: Vec<String>,
    pub orcid: Option<String>,
    pub affiliation: Affiliation,
}

impl Author {
    pub fn project(person: &PersonRecord, affiliation: Affiliation) -> Self {
        Self {
            pid: person.pid().to_string(),
            name: person.primary_name().to_string(),
            urls: person.homepage_urls().map(str::to_string).collect(),
            orcid: person.orcid().map(str::to_string),
            affiliation,
        }
    }

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.pid.clone(),
            self.name.clone(),
            self.urls.join("|"),
            self.orcid.clone().unwrap_or_default(),
            self.affiliation.email.clone(),
        ]
    }
}

impl PartialEq for Author {
    fn eq(&self, other: &Self) -> bool {
        self.pid == other.pid
    }
}

impl Eq for Author {}

impl Hash for Author {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pid.hash(state);
    }
}

#[derive(Debug, Clone)]
pub struct Publication {
    pub key: String,
    pub tag: PublicationTag,
    pub title: String,
    pub external_id: String,
    pub year: Option<u32>,
    pub volume: String,
    pub pages: String,
    pub publisher: String,
    pub url: String,
    pub isbn: String,
    pub school: String,
}

impl Publication {
    pub fn project(record: &PublicationRecord) -> Self {
        let text = |field: &Option<String>| field.clone().unwrap_or_default();
        Self {
            key: record.key.clone(),
            tag: record.tag,
            title: record.title().to_string(),
            external_id: external_id(record),
            year: record.year,
            volume: text(&record.volume),
            pages: text(&record.pages),
            publisher: text(&record.publisher),
            url: text(&record.url),
            isbn: text(&record.isbn),
            school: text(&record.school),
        }
    }

    pub fn to_row(&self) -> Vec<String> {
        let year = self
            .year
            .map(|y| itoa::Buffer::new().format(y).to_string())
            .unwrap_or_default();
        vec![
            self.key.clone(),
            self.tag.as_str().to_string(),
            self.title.clone(),
            self.external_id.clone(),
            year,
            self.volume.clone(),
            self.pages.clone(),
            self.publisher.clone(),
            self.url.clone(),
            self.isbn.clone(),
            self.school.clone(),
        ]
    }
}

impl PartialEq for Publication {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Publication {}

impl Hash for Publication {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// DOI when the first electronic edition has one, else a stable title hash.
fn external_id(record: &PublicationRecord) -> String {
    match record.doi() {
        Some(doi) => doi.to_string(),
        None => stable_hash(record.title()).to_string(),
    }
}

/// Deterministic across runs (FxHasher is unseeded).
pub fn stable_hash(value: &str) -> u64 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

/// `first.last[.suffix]@domain`, ASCII only, lower case, no whitespace or hyphens.
pub fn derive_email(name: &PersonName, domain: &str) -> String {
    let local: Vec<String> = [Some(name.first.as_str()), Some(name.last.as_str()), name.suffix.as_deref()]
        .into_iter()
        .flatten()
        .map(|part| unaccent(part).trim_matches('.').to_string())
        .filter(|part| !part.is_empty())
        .collect();

    let mut email: String = format!("{}@{}", local.join("."), domain)
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    while email.contains("..") {
        email = email.replace("..", ".");
    }
    email.to_lowercase()
}

/// NFD-decomposes and drops everything non-ASCII, after spelling out the
/// few letters that have no decomposition.
pub fn unaccent(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.nfd() {
        if c.is_ascii() {
            out.push(c);
        } else if let Some(spelled) = transliterate(c) {
            out.push_str(spelled);
        }
    }
    out
}

fn transliterate(c: char) -> Option<&'static str> {
    Some(match c {
        'ß' => "ss",
        'ẞ' => "SS",
        'æ' => "ae",
        'Æ' => "AE",
        'œ' => "oe",
        'Œ' => "OE",
        'ø' => "o",
        'Ø' => "O",
        'ł' => "l",
        'Ł' => "L",
        'đ' => "d",
        'Đ' => "D",
        'þ' => "th",
        'Þ' => "Th",
        'ı' => "i",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::association::{Association, AssociationPool};
    use std::collections::HashSet;

    fn name(first: &str, last: &str, suffix: Option<&str>) -> PersonName {
        PersonName {
            first: first.to_string(),
            last: last.to_string(),
            suffix: suffix.map(str::to_string),
        }
    }

    fn person(pid: &str, display: &str) -> PersonRecord {
        PersonRecord {
            key: format!("homepages/{}", pid),
            names: vec![display.to_string()],
            urls: vec![
                "https://example.com/~me".to_string(),
                "https://orcid.org/0000-0002-1825-0097".to_string(),
                "https://me.example.org".to_string(),
            ],
        }
    }

    fn single_pool() -> AssociationPool {
        AssociationPool::new(vec![Association {
            id: String::new(),
            name: "Example".to_string(),
            country: None,
            address: None,
            website: Some("www.example.org".to_string()),
            funding: None,
        }])
        .unwrap()
    }

    #[test]
    fn email_strips_diacritics_and_hyphens() {
        // NFD drops the umlaut to a plain `u`, it is not spelled out as `ue`.
        let parsed = PersonName::parse("Jürgen Müller-Weiß");
        assert_eq!(
            derive_email(&parsed, "example.org"),
            "jurgen.mullerweiss@example.org"
        );
    }

    #[test]
    fn email_with_suffix() {
        assert_eq!(
            derive_email(&name("John", "Smith", Some("Jr.")), "mit.edu"),
            "john.smith.jr@mit.edu"
        );
    }

    #[test]
    fn email_removes_whitespace_and_collapses_dots() {
        assert_eq!(
            derive_email(&name("Jean. .Paul", "de la Roux", None), "cnr.it"),
            "jean.paul.delaroux@cnr.it"
        );
    }

    #[test]
    fn email_without_first_name() {
        assert_eq!(derive_email(&name("", "Madonna", None), "cern.ch"), "madonna@cern.ch");
    }

    #[test]
    fn unaccent_drops_unrepresentable() {
        assert_eq!(unaccent("Zoë Łukasz Øre"), "Zoe Lukasz Ore");
        assert_eq!(unaccent("田中"), "");
    }

    #[test]
    fn affiliation_memoized_per_pid() {
        let mut registry = IdentityRegistry::new(AssociationPool::builtin(), Some(42));
        let p = person("a/Alice", "Alice Smith");
        let first = registry.affiliation(&p).clone();
        for _ in 0..10 {
            assert_eq!(registry.affiliation(&p), &first);
        }
        // A fresh wrapper of the same record still hits the cache.
        let again = person("a/Alice", "Alice Smith");
        assert_eq!(registry.author(&again).affiliation, first);
    }

    #[test]
    fn seeded_registries_agree() {
        let mut a = IdentityRegistry::new(AssociationPool::builtin(), Some(9));
        let mut b = IdentityRegistry::new(AssociationPool::builtin(), Some(9));
        for i in 0..16 {
            let p = person(&format!("p/{}", i), "Some Body");
            assert_eq!(a.affiliation(&p), b.affiliation(&p));
        }
    }

    #[test]
    fn author_row_layout() {
        let mut registry = IdentityRegistry::new(single_pool(), Some(1));
        let author = registry.author(&person("s/Smith", "Alice Smith 0001"));
        assert_eq!(
            author.to_row(),
            vec![
                "s/Smith",
                "Alice Smith 0001",
                "https://example.com/~me|https://me.example.org",
                "0000-0002-1825-0097",
                "alice.smith@example.org",
            ]
        );
        assert_eq!(author.affiliation.association_id, "assoc/1");
    }

    #[test]
    fn authors_equal_by_pid_only() {
        let p = person("a/Alice", "Alice");
        let x = Author::project(
            &p,
            Affiliation {
                association_id: "assoc/1".to_string(),
                email: "x@a".to_string(),
            },
        );
        let y = Author::project(
            &p,
            Affiliation {
                association_id: "assoc/2".to_string(),
                email: "y@b".to_string(),
            },
        );
        assert_eq!(x, y);
        let set: HashSet<Author> = [x, y].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn publication_row_uses_doi() {
        let mut record = PublicationRecord::new("journals/x/A", PublicationTag::Article);
        record.set_field("title", "A Title".to_string());
        record.set_field("year", "1999".to_string());
        record.set_field("ee", "https://doi.org/10.1000/xyz".to_string());
        record.set_field("pages", "1-10".to_string());
        let row = Publication::project(&record).to_row();
        assert_eq!(
            row,
            vec!["journals/x/A", "article", "A Title", "10.1000/xyz", "1999", "", "1-10", "", "", "", ""]
        );
    }

    #[test]
    fn publication_without_doi_hashes_title() {
        let mut record = PublicationRecord::new("phd/Smith", PublicationTag::PhdThesis);
        record.set_field("title", "Thesis".to_string());
        record.set_field("school", "MIT".to_string());
        let publication = Publication::project(&record);
        assert_eq!(publication.external_id, stable_hash("Thesis").to_string());
        assert_eq!(publication.to_row()[10], "MIT");
        assert_eq!(publication.to_row()[4], "");
    }

    #[test]
    fn publications_equal_by_key() {
        let a = PublicationRecord::new("k", PublicationTag::Book);
        let mut b = PublicationRecord::new("k", PublicationTag::Book);
        b.set_field("title", "Different".to_string());
        assert_eq!(Publication::project(&a), Publication::project(&b));
    }
}
