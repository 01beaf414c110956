//! Parsing of multimodal-model output into the typed port DTOs.
//!
//! The model is instructed to answer with strict JSON; these parsers accept
//! that shape and tolerate missing optionals, but an answer with no
//! recognizable structure at all is a provider failure.

use bookdex_core::ports::providers::{CsvParsePayload, CsvRow, ScannedBook, ShelfScanPayload};
use serde_json::Value;

/// Parse a bookshelf-scan answer of shape `{"books": [...]}`.
pub(crate) fn parse_scan(raw: &Value) -> Option<ShelfScanPayload> {
    let books = raw.get("books")?.as_array()?;
    let books = books
        .iter()
        .filter_map(|book| {
            let title = book.get("title")?.as_str()?.trim();
            let author = book.get("author")?.as_str()?.trim();
            if title.is_empty() || author.is_empty() {
                return None;
            }
            Some(ScannedBook {
                title: title.to_string(),
                author: author.to_string(),
                isbn: book.get("isbn").and_then(Value::as_str).map(str::to_string),
                confidence: book.get("confidence").and_then(Value::as_f64),
            })
        })
        .collect();

    Some(ShelfScanPayload { books })
}

/// Parse a CSV-understanding answer of shape `{"rows": [...]}`.
///
/// Rows keep whatever the model saw; dropping incomplete rows is the
/// pipeline's decision, not the parser's.
pub(crate) fn parse_csv_rows(raw: &Value) -> Option<CsvParsePayload> {
    let rows = raw.get("rows")?.as_array()?;
    let rows = rows
        .iter()
        .filter_map(Value::as_object)
        .map(|row| {
            let field = |name: &str| row.get(name).and_then(Value::as_str).map(str::to_string);
            CsvRow { title: field("title"), author: field("author"), isbn: field("isbn") }
        })
        .collect();

    Some(CsvParsePayload { rows })
}
