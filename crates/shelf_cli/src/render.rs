//! Text rendering for console output.

use shelf_core::{Author, Book, CatalogError, DeleteReport, Genre, Record};

const MISSING_GENRE: &str = "Unknown";

/// One record as a single JSON line.
pub fn record(record: &Record) -> String {
    serde_json::to_string(record).unwrap_or_else(|err| {
        format!("<{} row {} not renderable: {err}>", record.kind(), record.id())
    })
}

pub fn book_author(book: &Book, author: &Author) -> String {
    format!("Book: {}, Author: {}", book.title, author.name)
}

pub fn book_genre(book: &Book, genre: Option<&Genre>) -> String {
    let genre = genre.map_or(MISSING_GENRE, |genre| genre.name.as_str());
    format!("Book: {}, Genre: {}", book.title, genre)
}

pub fn delete_report(report: &DeleteReport) -> String {
    if report.cascaded.is_empty() {
        return format!("Deleted {} row {}.", report.table, report.id);
    }
    let cascaded = report
        .cascaded
        .iter()
        .map(|(table, id)| format!("{table} row {id}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Deleted {} row {} and {} dependent row(s): {}.",
        report.table,
        report.id,
        report.cascaded.len(),
        cascaded
    )
}

/// Human message for each failure kind.
pub fn error(err: &CatalogError) -> String {
    match err {
        CatalogError::NotFound { table, id } => format!("Not found: no {table} row with id {id}."),
        CatalogError::ConstraintViolation(violation) => format!("Rejected: {violation}."),
        CatalogError::InvalidTableKind(selector) => {
            format!("Invalid table `{selector}`: use 7 (Book), 8 (Author) or 9 (Genre).")
        }
        CatalogError::Storage(err) => {
            format!("Storage error: {err}. Changes remain in memory and uncommitted.")
        }
    }
}
