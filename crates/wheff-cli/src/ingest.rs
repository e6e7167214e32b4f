//! Spreadsheet ingestion: CSV reading and header alias resolution.
//!
//! Every report layout names its columns differently ("Picker", "Scan Time",
//! "Entered By", ...). Before rows reach the engine, headers are mapped onto
//! the canonical names in [`wheff_core::input::columns`].

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use wheff_core::InputTable;
use wheff_core::input::columns;

/// Report layouts with their own column vocabularies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Receiving,
    Putaway,
    Picking,
    #[default]
    Generic,
}

impl ReportKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Receiving => "receiving",
            Self::Putaway => "putaway",
            Self::Picking => "picking",
            Self::Generic => "generic",
        }
    }
}

type AliasTable = &'static [(&'static str, &'static [&'static str])];

/// Synonyms shared by every layout.
const COMMON_ALIASES: AliasTable = &[
    (
        columns::OPERATOR,
        &["operator", "operator name", "name", "user", "user id", "employee", "worker"],
    ),
    (
        columns::TIMESTAMP,
        &["timestamp", "time", "datetime", "date time", "scan time", "event time"],
    ),
    (
        columns::DATA_ENTRY_PERSON,
        &["data entry person", "data entry", "entered by", "created by", "clerk", "keyer"],
    ),
    (columns::DATE, &["date", "work date", "business date"]),
];

const RECEIVING_ALIASES: AliasTable = &[
    (columns::OPERATOR, &["receiver", "received by"]),
    (columns::TIMESTAMP, &["received at", "receipt time", "receive time"]),
];

const PUTAWAY_ALIASES: AliasTable = &[
    (columns::OPERATOR, &["putaway operator", "put away by"]),
    (columns::TIMESTAMP, &["putaway time", "put away time", "completed at"]),
];

const PICKING_ALIASES: AliasTable = &[
    (columns::OPERATOR, &["picker", "picked by"]),
    (columns::TIMESTAMP, &["pick time", "picked at"]),
];

const fn specific_aliases(kind: ReportKind) -> AliasTable {
    match kind {
        ReportKind::Receiving => RECEIVING_ALIASES,
        ReportKind::Putaway => PUTAWAY_ALIASES,
        ReportKind::Picking => PICKING_ALIASES,
        ReportKind::Generic => &[],
    }
}

/// Accepted synonyms per canonical column, layout-specific ones first.
pub fn aliases(kind: ReportKind) -> Vec<(&'static str, Vec<&'static str>)> {
    COMMON_ALIASES
        .iter()
        .map(|(canonical, common)| {
            let mut synonyms: Vec<&'static str> = specific_aliases(kind)
                .iter()
                .filter(|(c, _)| c == canonical)
                .flat_map(|(_, s)| s.iter().copied())
                .collect();
            synonyms.extend(common.iter().copied());
            (*canonical, synonyms)
        })
        .collect()
}

/// Lowercases, trims, and folds `_`/`-` and runs of whitespace into one space.
fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renames headers to canonical column names.
///
/// The first header matching a canonical column wins; later matches and
/// unknown headers are left untouched.
pub fn resolve_headers(headers: &[String], kind: ReportKind) -> Vec<String> {
    let table = aliases(kind);
    let mut claimed: Vec<&'static str> = Vec::new();

    headers
        .iter()
        .map(|header| {
            let normalized = normalize_header(header);
            let canonical = table.iter().find_map(|(canonical, synonyms)| {
                let hit = normalize_header(canonical) == normalized
                    || synonyms.iter().any(|s| *s == normalized);
                hit.then_some(*canonical)
            });

            match canonical {
                Some(name) if !claimed.contains(&name) => {
                    claimed.push(name);
                    name.to_string()
                }
                _ => header.clone(),
            }
        })
        .collect()
}

fn lossy_cell(cell: &[u8]) -> String {
    String::from_utf8_lossy(cell).into_owned()
}

/// Reads a CSV document into a canonical [`InputTable`].
pub fn read_csv<R: Read>(reader: R, kind: ReportKind) -> Result<InputTable> {
    let mut csv = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv
        .byte_headers()
        .context("failed to read CSV header row")?
        .iter()
        .map(lossy_cell)
        .collect();
    let headers = resolve_headers(&headers, kind);
    tracing::debug!(?headers, report = kind.as_str(), "resolved headers");

    // A record that is not valid UTF-8 is passed on blank so the engine
    // drops and counts it like any other unparseable row.
    let mut rows = Vec::new();
    for (idx, record) in csv.byte_records().enumerate() {
        let record = record.with_context(|| format!("failed to read CSV record {}", idx + 1))?;
        if std::str::from_utf8(record.as_slice()).is_ok() {
            rows.push(record.iter().map(lossy_cell).collect());
        } else {
            tracing::debug!(record = idx + 1, "blanking record that is not valid UTF-8");
            rows.push(vec![String::new(); record.len()]);
        }
    }

    Ok(InputTable::new(headers, rows))
}

/// Reads a CSV file, or standard input when `path` is `-`.
pub fn read_input(path: &Path, kind: ReportKind) -> Result<InputTable> {
    if path.as_os_str() == "-" {
        return read_csv(io::stdin().lock(), kind);
    }
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_csv(file, kind).with_context(|| format!("failed to parse {}", path.display()))
}
