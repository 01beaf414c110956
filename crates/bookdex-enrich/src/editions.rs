//! Edition matching and ranking for `enrich_editions`.

use bookdex_core::domain::Edition;
use bookdex_core::normalize::normalize_title;

/// Default result count when the caller does not specify one.
pub(crate) const DEFAULT_EDITION_LIMIT: u32 = 20;
/// Hard ceiling on requested result counts.
pub(crate) const MAX_EDITION_LIMIT: u32 = 100;

/// Fuzzy title match: containment in either direction on normalized titles.
///
/// Deliberately simple: a pure function of its inputs, which keeps
/// cache keys stable. Anything smarter (edit distance, token sets) must
/// preserve that property.
#[must_use]
pub(crate) fn fuzzy_title_match(query: &str, candidate: &str) -> bool {
    let query = normalize_title(query);
    let candidate = normalize_title(candidate);
    if query.is_empty() || candidate.is_empty() {
        return false;
    }
    candidate.contains(&query) || query.contains(&candidate)
}

/// Sort editions for display: format (hardcover first), then publication
/// date descending, then ISBN count descending.
pub(crate) fn sort_editions(editions: &mut [Edition]) {
    editions.sort_by(|a, b| {
        a.format
            .cmp(&b.format)
            .then_with(|| b.publication_date.cmp(&a.publication_date))
            .then_with(|| b.isbns.len().cmp(&a.isbns.len()))
    });
}

/// Clamp a requested limit into `[0, 100]`, defaulting to 20.
#[must_use]
pub(crate) fn clamp_limit(limit: Option<u32>) -> usize {
    limit.unwrap_or(DEFAULT_EDITION_LIMIT).min(MAX_EDITION_LIMIT) as usize
}
