//! Parsing of raw volume-catalog JSON into the typed port DTOs.
//!
//! Total on the payloads the catalog is documented to emit: missing optional
//! fields become absent attributes, never errors.

use bookdex_core::ports::providers::{VolumeHit, VolumeSearchPayload};
use serde_json::Value;

/// Parse a search result page. Returns `None` only when the top level is not
/// an object at all.
pub(crate) fn parse_search(raw: &Value) -> Option<VolumeSearchPayload> {
    let obj = raw.as_object()?;
    let total_items = obj
        .get("totalItems")
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0);
    let items = obj
        .get("items")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_volume).collect())
        .unwrap_or_default();

    Some(VolumeSearchPayload { total_items, items })
}

/// Parse a single volume record.
pub(crate) fn parse_volume(raw: &Value) -> Option<VolumeHit> {
    let volume_id = raw.get("id")?.as_str()?.to_string();
    let info = raw.get("volumeInfo").and_then(Value::as_object);

    let field = |name: &str| {
        info.and_then(|i| i.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    let list = |name: &str| {
        info.and_then(|i| i.get(name))
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

    let (isbn_10s, isbn_13s) = split_identifiers(info.and_then(|i| i.get("industryIdentifiers")));

    Some(VolumeHit {
        volume_id,
        title: field("title"),
        subtitle: field("subtitle"),
        authors: list("authors"),
        publisher: field("publisher"),
        published_date: field("publishedDate"),
        description: field("description"),
        page_count: info
            .and_then(|i| i.get("pageCount"))
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok()),
        categories: list("categories"),
        language: field("language"),
        isbn_10s,
        isbn_13s,
        thumbnail: largest_image(info.and_then(|i| i.get("imageLinks"))),
        format_hint: field("printType"),
    })
}

/// Split `industryIdentifiers` into ISBN-10 and ISBN-13 buckets.
fn split_identifiers(raw: Option<&Value>) -> (Vec<String>, Vec<String>) {
    let mut isbn_10s = Vec::new();
    let mut isbn_13s = Vec::new();
    if let Some(identifiers) = raw.and_then(Value::as_array) {
        for identifier in identifiers {
            let kind = identifier.get("type").and_then(Value::as_str);
            let value = identifier.get("identifier").and_then(Value::as_str);
            match (kind, value) {
                (Some("ISBN_10"), Some(v)) => isbn_10s.push(v.to_string()),
                (Some("ISBN_13"), Some(v)) => isbn_13s.push(v.to_string()),
                _ => {}
            }
        }
    }
    (isbn_10s, isbn_13s)
}

/// Pick the largest image the catalog offers for a volume.
fn largest_image(links: Option<&Value>) -> Option<String> {
    let links = links?.as_object()?;
    ["extraLarge", "large", "medium", "small", "thumbnail"]
        .iter()
        .find_map(|size| links.get(*size).and_then(Value::as_str))
        .map(str::to_string)
}
