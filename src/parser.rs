use crate::models::{PersonRecord, PublicationRecord, PublicationTag};
use anyhow::{bail, Context, Result};
use bzip2::read::BzDecoder;
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use regex::Regex;
use rustc_hash::FxHashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use tracing::{debug, info};

static ENTITY_DECL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<!ENTITY\s+([A-Za-z_][\w.-]*)\s+"([^"]*)"\s*>"#).unwrap());

static CHAR_REF_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#(?:x([0-9A-Fa-f]+)|([0-9]+));").unwrap());

/// General entities declared in the DTD, already decoded to their characters.
pub type EntityMap = FxHashMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub enum DblpRecord {
    Person(PersonRecord),
    Publication(PublicationRecord),
}

pub fn load_dtd_entities(path: &str) -> Result<EntityMap> {
    let dtd =
        fs::read_to_string(path).with_context(|| format!("Failed to read DTD at: {}", path))?;
    let entities = parse_entity_declarations(&dtd);
    info!(entities = entities.len(), "Loaded DTD entities");
    Ok(entities)
}

/// Collects `<!ENTITY name "value">` declarations. Parameter entities are skipped.
pub fn parse_entity_declarations(dtd: &str) -> EntityMap {
    ENTITY_DECL_REGEX
        .captures_iter(dtd)
        .map(|c| (c[1].to_string(), decode_char_refs(&c[2])))
        .collect()
}

fn decode_char_refs(value: &str) -> String {
    CHAR_REF_REGEX
        .replace_all(value, |c: &regex::Captures| {
            let code = match (c.get(1), c.get(2)) {
                (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
                (_, Some(dec)) => dec.as_str().parse().ok(),
                _ => None,
            };
            code.and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_default()
        })
        .into_owned()
}

fn resolve_entity<'a>(entities: &'a EntityMap, name: &str) -> Option<&'a str> {
    match name {
        "amp" => Some("&"),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "quot" => Some("\""),
        "apos" => Some("'"),
        _ => entities.get(name).map(String::as_str),
    }
}

/// Record being assembled between its start and end tags.
enum Pending {
    Person(PersonRecord),
    Publication(PublicationRecord),
    Skip,
}

impl Pending {
    fn open(name: &[u8], start: &BytesStart) -> Option<Self> {
        let tag = PublicationTag::from_element(name);
        if tag.is_none() && name != b"www" {
            return None;
        }

        let key = start
            .attributes()
            .flatten()
            .find(|attr| attr.key.as_ref() == b"key")
            .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
            .filter(|key| !key.is_empty());

        Some(match (tag, key) {
            (Some(tag), Some(key)) => Pending::Publication(PublicationRecord::new(key, tag)),
            (None, Some(key)) if key.starts_with("homepages/") => Pending::Person(PersonRecord {
                key,
                ..Default::default()
            }),
            _ => Pending::Skip,
        })
    }

    fn set_field(&mut self, element: &str, value: String) {
        match self {
            Pending::Person(p) => match element {
                "author" => p.names.push(value),
                "url" => p.urls.push(value),
                _ => {}
            },
            Pending::Publication(p) => p.set_field(element, value),
            Pending::Skip => {}
        }
    }

    fn finish(self) -> Option<DblpRecord> {
        match self {
            Pending::Person(p) => Some(DblpRecord::Person(p)),
            Pending::Publication(p) => Some(DblpRecord::Publication(p)),
            Pending::Skip => None,
        }
    }
}

/// Streams person and publication records out of a dblp XML dump.
pub struct DblpReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    entities: EntityMap,
    done: bool,
}

impl DblpReader<Box<dyn BufRead>> {
    /// Opens a plain or bzip2-compressed (`.bz2`) dump.
    pub fn open(path: &str, entities: EntityMap) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open dblp dump at: {}", path))?;
        let inner: Box<dyn BufRead> = if path.ends_with(".bz2") {
            Box::new(BufReader::with_capacity(256 * 1024, BzDecoder::new(file)))
        } else {
            Box::new(BufReader::with_capacity(256 * 1024, file))
        };
        Ok(Self::from_reader(inner, entities))
    }
}

impl<R: BufRead> DblpReader<R> {
    pub fn from_reader(inner: R, entities: EntityMap) -> Self {
        let mut reader = Reader::from_reader(inner);
        reader.trim_text(false);
        Self {
            reader,
            buf: Vec::with_capacity(8 * 1024),
            entities,
            done: false,
        }
    }

    fn next_record(&mut self) -> Result<Option<DblpRecord>> {
        let mut pending: Option<Pending> = None;
        // Child element of the record whose text is being collected.
        let mut field: Option<String> = None;
        // Inline markup depth inside that field (`<i>`, `<sub>`, ...).
        let mut nested = 0usize;
        let mut text = String::new();

        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(e) => bail!(
                    "Malformed dblp XML at byte {}: {}",
                    self.reader.buffer_position(),
                    e
                ),
            };

            match event {
                Event::Start(e) => {
                    if pending.is_none() {
                        pending = Pending::open(e.name().as_ref(), &e);
                    } else if field.is_none() {
                        field = Some(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                        text.clear();
                    } else {
                        nested += 1;
                    }
                }
                Event::Empty(e) => {
                    if pending.is_none() {
                        if let Some(record) =
                            Pending::open(e.name().as_ref(), &e).and_then(Pending::finish)
                        {
                            return Ok(Some(record));
                        }
                    }
                }
                Event::Text(e) => {
                    if field.is_some() {
                        let entities = &self.entities;
                        match e.unescape_with(|name| resolve_entity(entities, name)) {
                            Ok(s) => text.push_str(&s),
                            Err(err) => {
                                debug!(error = %err, "Unresolvable entity, keeping raw text");
                                text.push_str(&String::from_utf8_lossy(&e));
                            }
                        }
                    }
                }
                Event::CData(e) => {
                    if field.is_some() {
                        text.push_str(&String::from_utf8_lossy(&e));
                    }
                }
                Event::End(_) => {
                    if field.is_some() {
                        if nested > 0 {
                            nested -= 1;
                        } else if let (Some(record), Some(element)) = (pending.as_mut(), field.take())
                        {
                            let value = text.trim();
                            if !value.is_empty() {
                                record.set_field(&element, value.to_string());
                            }
                            text.clear();
                        }
                    } else if let Some(record) = pending.take() {
                        if let Some(record) = record.finish() {
                            return Ok(Some(record));
                        }
                    }
                }
                Event::Eof => {
                    if pending.is_some() {
                        bail!("dblp XML ended inside a record");
                    }
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for DblpReader<R> {
    type Item = Result<DblpRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.next_record().transpose();
        if !matches!(result, Some(Ok(_))) {
            self.done = true;
        }
        result
    }
}
