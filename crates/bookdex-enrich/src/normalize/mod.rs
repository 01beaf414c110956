//! Per-provider normalizers: raw DTOs in, canonical records out.
//!
//! One normalizer per provider. All of them are total on the payloads the
//! provider is documented to emit: missing optional fields produce absent
//! attributes, never errors. Every emitted record is marked with its
//! provider, `contributors = [provider]`, `synthetic = false`, and a quality
//! score derived from field completeness.

mod openbib;
mod registry;
mod volume;

pub use openbib::normalize_doc;
pub use registry::normalize_book;
pub use volume::normalize_hit;

use bookdex_core::domain::{Author, Edition, ProviderId, Work};
use bookdex_core::normalize::{isbn10_to_isbn13, isbn13_to_isbn10, normalize_isbn};

/// Canonical records one provider contributed for one raw payload.
#[derive(Clone, Debug, Default)]
pub struct ProviderRecords {
    pub work: Option<Work>,
    pub editions: Vec<Edition>,
    pub authors: Vec<Author>,
}

impl ProviderRecords {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.work.is_none() && self.editions.is_empty() && self.authors.is_empty()
    }

    /// The provider that produced these records, when any record exists.
    #[must_use]
    pub fn provider(&self) -> Option<ProviderId> {
        self.work
            .as_ref()
            .map(|w| w.primary_provider)
            .or_else(|| self.editions.first().map(|e| e.primary_provider))
    }
}

/// Map field completeness onto the 0-100 quality scale.
pub(crate) fn completeness_score(present: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    u8::try_from((present * 100) / total).unwrap_or(100)
}

/// Normalize and deduplicate ISBNs, retaining both the ISBN-10 and ISBN-13
/// form of each number. Deduplication is on the literal normalized string;
/// input order is preserved, equivalents follow their source.
pub(crate) fn expand_isbns<'a, I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out: Vec<String> = Vec::new();
    let mut push = |isbn: String| {
        if !out.contains(&isbn) {
            out.push(isbn);
        }
    };

    for raw_isbn in raw {
        let Some(normalized) = normalize_isbn(raw_isbn) else {
            continue;
        };
        let equivalent = match normalized.len() {
            10 => isbn10_to_isbn13(&normalized),
            _ => isbn13_to_isbn10(&normalized),
        };
        push(normalized);
        if let Some(equivalent) = equivalent {
            push(equivalent);
        }
    }
    out
}

/// Primary ISBN: the first ISBN-13 in the list, when one exists.
pub(crate) fn primary_isbn13(isbns: &[String]) -> Option<String> {
    isbns.iter().find(|isbn| isbn.len() == 13).cloned()
}

/// Authors from a provider's name list. Empty arrays produce no records,
/// not placeholders.
pub(crate) fn authors_from_names<'a, I>(names: I) -> Vec<Author>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(Author::named)
        .collect()
}
