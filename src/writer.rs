use crate::config::WRITER_BUFFER_SIZE;
use crate::snapshot::{EdgeTable, EntityTable, Snapshot};
use anyhow::{bail, Context, Result};
use csv::{QuoteStyle, WriterBuilder};
use memchr::memchr3;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{error, info};

static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r\n|[\n\r\x0B\x0C\x{85}\x{2028}\x{2029}]").unwrap());

pub const AUTHORS_FILE: &str = "authors.csv";
pub const ASSOCIATIONS_FILE: &str = "associations.csv";
pub const AUTHORED_FILE: &str = "author_pubs_relation.csv";
pub const PUBLICATIONS_FILE: &str = "publications.csv";
pub const CITATIONS_FILE: &str = "pub_pubs_relation.csv";
pub const CONTEXT_MEMBERS_FILE: &str = "context_pubs_relation.csv";
pub const CONTEXTS_FILE: &str = "contexts.csv";
pub const AFFILIATIONS_FILE: &str = "author_association_relation.csv";

/// Result files in the order they are written.
pub const OUTPUT_FILES: [&str; 8] = [
    AUTHORS_FILE,
    ASSOCIATIONS_FILE,
    AUTHORED_FILE,
    PUBLICATIONS_FILE,
    CITATIONS_FILE,
    CONTEXT_MEMBERS_FILE,
    CONTEXTS_FILE,
    AFFILIATIONS_FILE,
];

enum Table<'s> {
    Entities(&'s EntityTable),
    Edges(&'s EdgeTable),
}

/// Line breaks become a single space; fields holding a comma or either quote
/// character are double-quoted with inner `"` doubled.
pub fn escape_field(field: &str) -> Cow<'_, str> {
    let flat = LINE_BREAK.replace_all(field, " ");
    if memchr3(b',', b'"', b'\'', flat.as_bytes()).is_none() {
        return flat;
    }
    let mut quoted = String::with_capacity(flat.len() + 2);
    quoted.push('"');
    for c in flat.chars() {
        if c == '"' {
            quoted.push('"');
        }
        quoted.push(c);
    }
    quoted.push('"');
    Cow::Owned(quoted)
}

fn write_table<W: Write>(sink: W, table: Table) -> Result<usize> {
    // Quoting is done by `escape_field`; the csv writer only frames.
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .flexible(true)
        .from_writer(sink);

    let written = match table {
        Table::Entities(entities) => {
            for row in entities.rows() {
                let fields: Vec<Cow<str>> = row.iter().map(|f| escape_field(f)).collect();
                writer.write_record(fields.iter().map(|f| f.as_bytes()))?;
            }
            entities.len()
        }
        Table::Edges(edges) => {
            for (from, to) in edges.pairs() {
                writer.write_record([escape_field(from).as_bytes(), escape_field(to).as_bytes()])?;
            }
            edges.len()
        }
    };

    writer.flush()?;
    Ok(written)
}

fn write_file(path: &Path, table: Table) -> Result<usize> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    write_table(BufWriter::with_capacity(WRITER_BUFFER_SIZE, file), table)
        .with_context(|| format!("Failed to write {:?}", path))
}

/// Writes every result file into `output_dir`. A failing file does not stop
/// the others; the error lists all files that failed.
pub fn write_snapshot(snapshot: &Snapshot, output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let tables = [
        (AUTHORS_FILE, Table::Entities(&snapshot.authors)),
        (ASSOCIATIONS_FILE, Table::Entities(&snapshot.associations)),
        (AUTHORED_FILE, Table::Edges(&snapshot.authored)),
        (PUBLICATIONS_FILE, Table::Entities(&snapshot.publications)),
        (CITATIONS_FILE, Table::Edges(&snapshot.citations)),
        (CONTEXT_MEMBERS_FILE, Table::Edges(&snapshot.context_members)),
        (CONTEXTS_FILE, Table::Entities(&snapshot.contexts)),
        (AFFILIATIONS_FILE, Table::Edges(&snapshot.affiliations)),
    ];

    let mut failed = Vec::new();
    for (name, table) in tables {
        match write_file(&output_dir.join(name), table) {
            Ok(rows) => info!(file = name, rows, "Result file written"),
            Err(e) => {
                error!(file = name, "{:#}", e);
                failed.push(name);
            }
        }
    }

    if !failed.is_empty() {
        bail!("Failed to write result files: {}", failed.join(", "));
    }
    Ok(())
}
