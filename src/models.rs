use crate::config::CITE_PLACEHOLDER;
use once_cell::sync::Lazy;
use regex::Regex;

static ORCID_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://orcid\.org/(\d{4}-\d{4}-\d{4}-\d{3}[\dX])/?$").unwrap()
});

static DOI_URL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://(?:dx\.)?doi\.org/(10\..+)$").unwrap());

static HOMONYM_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+\d{4}$").unwrap());

const NAME_SUFFIXES: &[&str] = &["Jr.", "Sr.", "II", "III", "IV"];

/// Record element of a dblp publication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublicationTag {
    Article,
    InProceedings,
    Proceedings,
    Book,
    InCollection,
    PhdThesis,
    MastersThesis,
}

impl PublicationTag {
    pub fn from_element(name: &[u8]) -> Option<Self> {
        match name {
            b"article" => Some(Self::Article),
            b"inproceedings" => Some(Self::InProceedings),
            b"proceedings" => Some(Self::Proceedings),
            b"book" => Some(Self::Book),
            b"incollection" => Some(Self::InCollection),
            b"phdthesis" => Some(Self::PhdThesis),
            b"mastersthesis" => Some(Self::MastersThesis),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::InProceedings => "inproceedings",
            Self::Proceedings => "proceedings",
            Self::Book => "book",
            Self::InCollection => "incollection",
            Self::PhdThesis => "phdthesis",
            Self::MastersThesis => "mastersthesis",
        }
    }
}

/// A dblp homepage record (`<www key="homepages/...">`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonRecord {
    pub key: String,
    pub names: Vec<String>,
    pub urls: Vec<String>,
}

impl PersonRecord {
    pub fn pid(&self) -> &str {
        self.key.strip_prefix("homepages/").unwrap_or(&self.key)
    }

    pub fn primary_name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or("")
    }

    /// First ORCID listed among the homepage URLs, without the resolver prefix.
    pub fn orcid(&self) -> Option<&str> {
        self.urls.iter().find_map(|url| {
            ORCID_URL_REGEX
                .captures(url)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str())
        })
    }

    pub fn homepage_urls(&self) -> impl Iterator<Item = &str> {
        self.urls
            .iter()
            .map(String::as_str)
            .filter(|url| !ORCID_URL_REGEX.is_match(url))
    }
}

/// A dblp publication record. Single-valued fields keep the first value seen
/// in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicationRecord {
    pub key: String,
    pub tag: PublicationTag,
    /// `<author>` and `<editor>` names in source order
    pub names: Vec<String>,
    pub title: Option<String>,
    pub year: Option<u32>,
    pub journal: Option<String>,
    pub booktitle: Option<String>,
    pub volume: Option<String>,
    pub pages: Option<String>,
    pub publisher: Option<String>,
    pub url: Option<String>,
    pub isbn: Option<String>,
    pub school: Option<String>,
    pub series: Option<String>,
    pub crossref: Option<String>,
    pub ee: Vec<String>,
    pub cites: Vec<String>,
}

impl PublicationRecord {
    pub fn new(key: impl Into<String>, tag: PublicationTag) -> Self {
        Self {
            key: key.into(),
            tag,
            names: Vec::new(),
            title: None,
            year: None,
            journal: None,
            booktitle: None,
            volume: None,
            pages: None,
            publisher: None,
            url: None,
            isbn: None,
            school: None,
            series: None,
            crossref: None,
            ee: Vec::new(),
            cites: Vec::new(),
        }
    }

    /// Stores a child element's text. Unknown elements are ignored.
    pub fn set_field(&mut self, element: &str, value: String) {
        let slot = match element {
            "author" | "editor" => {
                self.names.push(value);
                return;
            }
            "ee" => {
                self.ee.push(value);
                return;
            }
            "cite" => {
                self.cites.push(value);
                return;
            }
            "year" => {
                if self.year.is_none() {
                    self.year = value.trim().parse().ok();
                }
                return;
            }
            "title" => &mut self.title,
            "journal" => &mut self.journal,
            "booktitle" => &mut self.booktitle,
            "volume" => &mut self.volume,
            "pages" => &mut self.pages,
            "publisher" => &mut self.publisher,
            "url" => &mut self.url,
            "isbn" => &mut self.isbn,
            "school" => &mut self.school,
            "series" => &mut self.series,
            "crossref" => &mut self.crossref,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn is_proceedings(&self) -> bool {
        self.tag == PublicationTag::Proceedings
    }

    /// Everyone on the record except `own_name`.
    pub fn coauthor_names<'a>(&'a self, own_name: &'a str) -> impl Iterator<Item = &'a str> {
        self.names
            .iter()
            .map(String::as_str)
            .filter(move |name| *name != own_name)
    }

    /// Cited keys with dblp's unmatched-reference placeholder removed.
    pub fn citations(&self) -> impl Iterator<Item = &str> {
        self.cites
            .iter()
            .map(String::as_str)
            .filter(|c| *c != CITE_PLACEHOLDER && !c.is_empty())
    }

    /// Table-of-contents page this record is listed on (`url` without fragment).
    pub fn toc_page(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(|url| url.split('#').next().unwrap_or(url))
            .filter(|page| !page.is_empty())
    }

    /// DOI of the first electronic edition, if it is a doi.org link.
    pub fn doi(&self) -> Option<&str> {
        self.ee.first().and_then(|ee| {
            DOI_URL_REGEX
                .captures(ee)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str())
        })
    }
}

/// Components of a dblp person name, used for email synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName {
    pub first: String,
    pub last: String,
    pub suffix: Option<String>,
}

impl PersonName {
    /// Splits "Given Names Last [Suffix] [0001]" into parts.
    pub fn parse(name: &str) -> Self {
        let name = HOMONYM_SUFFIX.replace(name.trim(), "");
        let mut tokens: Vec<&str> = name.split_whitespace().collect();

        let suffix = match tokens.last() {
            Some(tok) if tokens.len() > 1 && NAME_SUFFIXES.contains(tok) => {
                tokens.pop().map(str::to_string)
            }
            _ => None,
        };
        let last = tokens.pop().unwrap_or_default().to_string();

        Self {
            first: tokens.join(" "),
            last,
            suffix,
        }
    }
}
