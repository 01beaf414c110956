//! Volume-catalog normalizer.

use super::{
    ProviderRecords, authors_from_names, completeness_score, expand_isbns, primary_isbn13,
};
use bookdex_core::domain::{Edition, EditionFormat, ProviderId, Work};
use bookdex_core::normalize::normalize_image_url;
use bookdex_core::ports::providers::VolumeHit;

const PROVIDER: ProviderId = ProviderId::VolumeCatalog;

/// Normalize one catalog volume into canonical records.
#[must_use]
pub fn normalize_hit(hit: &VolumeHit) -> ProviderRecords {
    let cover = hit
        .thumbnail
        .as_deref()
        .map(normalize_image_url)
        .filter(|url| !url.is_empty());

    let work = hit.title.as_deref().map(str::trim).filter(|t| !t.is_empty()).map(|title| {
        let mut work = Work::from_provider(title, PROVIDER);
        work.subtitle = hit.subtitle.clone().filter(|s| !s.trim().is_empty());
        work.description = hit.description.clone().filter(|d| !d.trim().is_empty());
        work.first_publication_year = publication_year(hit.published_date.as_deref());
        work.subject_tags = hit.categories.clone();
        work.volume_catalog_ids = vec![hit.volume_id.clone()];
        work.cover_image_url = cover.clone();

        let present = [
            true, // title is guaranteed here
            work.subtitle.is_some(),
            work.description.is_some(),
            work.first_publication_year.is_some(),
            !work.subject_tags.is_empty(),
            work.cover_image_url.is_some(),
        ]
        .iter()
        .filter(|p| **p)
        .count();
        work.quality = completeness_score(present, 6);
        work
    });

    let isbns = expand_isbns(
        hit.isbn_13s
            .iter()
            .chain(hit.isbn_10s.iter())
            .map(String::as_str),
    );

    let mut edition = Edition::from_provider(PROVIDER);
    edition.isbn = primary_isbn13(&isbns);
    edition.isbns = isbns;
    edition.title = hit.title.clone().map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    edition.publisher = hit.publisher.clone().filter(|p| !p.trim().is_empty());
    edition.publication_date = valid_date(hit.published_date.as_deref());
    edition.page_count = hit.page_count;
    edition.format = hit
        .format_hint
        .as_deref()
        .map(EditionFormat::from_provider_hint)
        .unwrap_or_default();
    edition.language = hit.language.clone();
    edition.cover_image_url = cover;
    edition.volume_catalog_ids = vec![hit.volume_id.clone()];

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
        authors: authors_from_names(hit.authors.iter().map(String::as_str)),
    }
}

/// Leading four-digit year of an ISO-ish date string.
fn publication_year(date: Option<&str>) -> Option<i32> {
    let digits: String = date?.chars().take_while(char::is_ascii_digit).collect();
    if digits.len() == 4 { digits.parse().ok() } else { None }
}

/// Keep a date only when it starts with a plausible year; malformed dates
/// are dropped rather than coerced.
fn valid_date(date: Option<&str>) -> Option<String> {
    let date = date?.trim();
    publication_year(Some(date)).map(|_| date.to_string())
}
