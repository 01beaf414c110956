//! Parsing of raw open-bib JSON into the typed port DTOs.

use bookdex_core::ports::providers::{OpenBibDoc, OpenBibSearchPayload};
use serde_json::Value;

fn string_list(raw: Option<&Value>) -> Vec<String> {
    raw.and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Parse one search document.
pub(crate) fn parse_doc(raw: &Value) -> Option<OpenBibDoc> {
    let key = raw.get("key")?.as_str()?.to_string();
    let field = |name: &str| raw.get(name).and_then(Value::as_str).map(str::to_string);

    Some(OpenBibDoc {
        key,
        title: field("title"),
        subtitle: field("subtitle"),
        author_names: string_list(raw.get("author_name")),
        first_publish_year: raw
            .get("first_publish_year")
            .and_then(Value::as_i64)
            .and_then(|y| i32::try_from(y).ok()),
        subjects: string_list(raw.get("subject")),
        isbns: string_list(raw.get("isbn")),
        publishers: string_list(raw.get("publisher")),
        publish_dates: string_list(raw.get("publish_date")),
        cover_id: raw.get("cover_i").and_then(Value::as_i64),
        number_of_pages: raw
            .get("number_of_pages_median")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok()),
        languages: string_list(raw.get("language")),
        edition_keys: string_list(raw.get("edition_key")),
    })
}

/// Parse a search result page.
pub(crate) fn parse_search(raw: &Value) -> Option<OpenBibSearchPayload> {
    let obj = raw.as_object()?;
    let num_found = obj
        .get("numFound")
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0);
    let docs = obj
        .get("docs")
        .and_then(Value::as_array)
        .map(|docs| docs.iter().filter_map(parse_doc).collect())
        .unwrap_or_default();

    Some(OpenBibSearchPayload { num_found, docs })
}

/// Parse a direct edition-lookup record. Edition records use a different
/// shape from search documents (scalar pages, nested language keys, covers
/// as an id array), so they are mapped here rather than reusing `parse_doc`.
pub(crate) fn parse_edition(raw: &Value) -> Option<OpenBibDoc> {
    let key = raw.get("key")?.as_str()?.to_string();
    let field = |name: &str| raw.get(name).and_then(Value::as_str).map(str::to_string);

    let mut isbns = string_list(raw.get("isbn_10"));
    isbns.extend(string_list(raw.get("isbn_13")));

    let languages = raw
        .get("languages")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.get("key").and_then(Value::as_str))
                .filter_map(|key| key.rsplit('/').next())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(OpenBibDoc {
        key,
        title: field("title"),
        subtitle: field("subtitle"),
        author_names: Vec::new(),
        first_publish_year: None,
        subjects: string_list(raw.get("subjects")),
        isbns,
        publishers: string_list(raw.get("publishers")),
        publish_dates: field("publish_date").map(|d| vec![d]).unwrap_or_default(),
        cover_id: raw
            .get("covers")
            .and_then(Value::as_array)
            .and_then(|covers| covers.first())
            .and_then(Value::as_i64),
        number_of_pages: raw
            .get("number_of_pages")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok()),
        languages,
        edition_keys: Vec::new(),
    })
}
