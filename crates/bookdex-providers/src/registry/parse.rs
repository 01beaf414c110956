//! Parsing of raw ISBN-registry JSON into the typed port DTO.

use bookdex_core::ports::providers::RegistryBook;
use serde_json::Value;

/// Parse a registry lookup response of shape `{"book": {...}}`.
pub(crate) fn parse_book(raw: &Value) -> Option<RegistryBook> {
    let book = raw.get("book")?.as_object()?;
    let field = |name: &str| book.get(name).and_then(Value::as_str).map(str::to_string);
    let list = |name: &str| {
        book.get(name)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default()
    };

    Some(RegistryBook {
        isbn13: field("isbn13"),
        isbn10: field("isbn"),
        title: field("title").or_else(|| field("title_long")),
        authors: list("authors"),
        publisher: field("publisher"),
        date_published: field("date_published"),
        pages: book
            .get("pages")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok()),
        binding: field("binding"),
        language: field("language"),
        cover_url: field("image"),
        subjects: list("subjects"),
    })
}
