//! ISBN-registry normalizer.

use super::{
    ProviderRecords, authors_from_names, completeness_score, expand_isbns, primary_isbn13,
};
use bookdex_core::domain::{Edition, EditionFormat, ProviderId, Work};
use bookdex_core::normalize::normalize_image_url;
use bookdex_core::ports::providers::RegistryBook;

const PROVIDER: ProviderId = ProviderId::IsbnRegistry;

/// Normalize one registry record into canonical records.
#[must_use]
pub fn normalize_book(book: &RegistryBook) -> ProviderRecords {
    let cover = book
        .cover_url
        .as_deref()
        .map(normalize_image_url)
        .filter(|url| !url.is_empty());

    let work = book.title.as_deref().map(str::trim).filter(|t| !t.is_empty()).map(|title| {
        let mut work = Work::from_provider(title, PROVIDER);
        work.subject_tags = book.subjects.clone();
        work.cover_image_url = cover.clone();
        if let Some(id) = book.isbn13.clone().or_else(|| book.isbn10.clone()) {
            work.isbn_registry_ids = vec![id];
        }

        let present = [true, !work.subject_tags.is_empty(), work.cover_image_url.is_some()]
            .iter()
            .filter(|p| **p)
            .count();
        work.quality = completeness_score(present, 6);
        work
    });

    let isbns = expand_isbns(
        book.isbn13
            .iter()
            .chain(book.isbn10.iter())
            .map(String::as_str),
    );

    let mut edition = Edition::from_provider(PROVIDER);
    edition.isbn = primary_isbn13(&isbns);
    edition.isbns = isbns;
    edition.title = book.title.clone().map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    edition.publisher = book.publisher.clone().filter(|p| !p.trim().is_empty());
    edition.publication_date = book
        .date_published
        .clone()
        .filter(|d| d.chars().take(4).all(|c| c.is_ascii_digit()) && d.len() >= 4);
    edition.page_count = book.pages;
    edition.format = book
        .binding
        .as_deref()
        .map(EditionFormat::from_provider_hint)
        .unwrap_or_default();
    edition.language = book.language.clone();
    edition.cover_image_url = cover;
    if let Some(id) = book.isbn13.clone().or_else(|| book.isbn10.clone()) {
        edition.isbn_registry_ids = vec![id];
    }

    let present = [
        !edition.isbns.is_empty(),
        edition.publisher.is_some(),
        edition.publication_date.is_some(),
        edition.page_count.is_some(),
        edition.language.is_some(),
        edition.cover_image_url.is_some(),
    ]
    .iter()
    .filter(|p| **p)
    .count();
    edition.quality = completeness_score(present, 6);

    let editions = if edition.isbns.is_empty() && edition.title.is_none() {
        Vec::new()
    } else {
        vec![edition]
    };

    ProviderRecords {
        work,
        editions,
        authors: authors_from_names(book.authors.iter().map(String::as_str)),
    }
}
