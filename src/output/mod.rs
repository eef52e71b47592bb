//! Output module for command results
//!
//! This module handles:
//! - Rendering import summaries for the one-shot command
//! - Rendering pages of stored records
//! - Printing trigger and status responses as JSON

use crate::crawler::ImportSummary;
use crate::storage::RecordPage;
use crate::SyncError;
use serde::Serialize;
use std::fmt::Write;

/// Renders the counts of one crawl-and-import pass
pub fn format_import_summary(summary: &ImportSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Import Summary ===\n");
    let _ = writeln!(out, "  Scraped:    {}", summary.scraped);
    let _ = writeln!(out, "  Imported:   {}", summary.imported);
    let _ = writeln!(out, "  Duplicates: {}", summary.duplicates);
    let _ = writeln!(out, "  Errors:     {}", summary.errors);
    out
}

pub fn print_import_summary(summary: &ImportSummary) {
    print!("{}", format_import_summary(summary));
}

/// Renders one page of stored records, one block per record
pub fn format_record_page(page: &RecordPage) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "=== Wanted Persons (page {} of {}, {} total) ===\n",
        page.page,
        page.total_pages.max(1),
        page.total
    );

    if page.data.is_empty() {
        let _ = writeln!(out, "  No records found");
        return out;
    }

    for person in &page.data {
        let born = person
            .birth_year
            .map_or_else(|| "?".to_string(), |y| y.to_string());
        let _ = writeln!(out, "{} (b. {})", person.name, born);
        let _ = writeln!(out, "  Crime: {}", person.crime);

        let optionals = [
            ("Address", &person.address),
            ("Parents", &person.parents),
            ("Decision", &person.decision_number),
            ("Issued by", &person.issuing_unit),
        ];
        for (label, value) in optionals {
            if let Some(value) = value {
                let _ = writeln!(out, "  {}: {}", label, value);
            }
        }
        let _ = writeln!(out, "  Id: {}", person.id);
        out.push('\n');
    }

    out
}

pub fn print_record_page(page: &RecordPage) {
    print!("{}", format_record_page(page));
}

/// Pretty-prints any response as JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<(), SyncError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
