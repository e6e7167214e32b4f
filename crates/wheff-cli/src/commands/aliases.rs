//! Aliases command: list accepted column names for a report layout.

use std::fmt::Write;

use crate::ingest::{ReportKind, aliases};

/// Formats the alias table for one layout.
pub fn format_aliases(kind: ReportKind) -> String {
    let mut output = String::new();
    writeln!(output, "COLUMN ALIASES: {}", kind.as_str()).unwrap();
    writeln!(output).unwrap();
    for (canonical, synonyms) in aliases(kind) {
        writeln!(output, "  {canonical:<18} {}", synonyms.join(", ")).unwrap();
    }
    output
}

pub fn run(kind: ReportKind) {
    print!("{}", format_aliases(kind));
}
