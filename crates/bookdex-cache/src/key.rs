//! Cache-key grammar: `<class>:<normalized-primary>[:<secondary>...]`.
//!
//! Keys are built exclusively from the normalization functions in
//! `bookdex-core`, so two callers asking the same question always produce
//! byte-identical keys and hit the same entry.

use bookdex_core::config::CacheTtls;
use bookdex_core::normalize::{normalize_author, normalize_title};
use std::fmt;

/// Data classes with distinct TTL policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheClass {
    Isbn,
    Title,
    Author,
    Advanced,
    CsvParse,
    Enrich,
}

impl CacheClass {
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Isbn => "isbn",
            Self::Title => "title",
            Self::Author => "author",
            Self::Advanced => "advanced",
            Self::CsvParse => "csv-parse",
            Self::Enrich => "enrich",
        }
    }

    /// TTL for this class. Enrichment entries are quality-dependent and use
    /// [`CoreConfig::enrich_ttl_for_quality`](bookdex_core::CoreConfig) instead.
    #[must_use]
    pub const fn ttl_seconds(&self, ttls: &CacheTtls) -> u64 {
        match self {
            Self::Isbn => ttls.isbn,
            Self::Title | Self::Author => ttls.title,
            Self::Advanced => ttls.advanced,
            Self::CsvParse => ttls.csv,
            Self::Enrich => ttls.enrich_high,
        }
    }
}

/// A fully-formed cache key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    class: CacheClass,
    key: String,
}

impl CacheKey {
    /// `isbn:<normalized>`. The caller must pass an already-normalized ISBN.
    #[must_use]
    pub fn isbn(normalized_isbn: &str) -> Self {
        Self { class: CacheClass::Isbn, key: format!("isbn:{normalized_isbn}") }
    }

    /// `title:<normalized>`
    #[must_use]
    pub fn title(raw_title: &str) -> Self {
        Self { class: CacheClass::Title, key: format!("title:{}", normalize_title(raw_title)) }
    }

    /// `author:<normalized>`
    #[must_use]
    pub fn author(raw_author: &str) -> Self {
        Self { class: CacheClass::Author, key: format!("author:{}", normalize_author(raw_author)) }
    }

    /// `advanced:t=<title>:a=<author>:y=<year>:p=<publisher>` with absent
    /// fields omitted; at least one field must be present (the orchestrator
    /// validates this before building a key).
    #[must_use]
    pub fn advanced(
        title: Option<&str>,
        author: Option<&str>,
        year: Option<i32>,
        publisher: Option<&str>,
    ) -> Self {
        let mut parts = vec!["advanced".to_string()];
        if let Some(t) = title {
            parts.push(format!("t={}", normalize_title(t)));
        }
        if let Some(a) = author {
            parts.push(format!("a={}", normalize_author(a)));
        }
        if let Some(y) = year {
            parts.push(format!("y={y}"));
        }
        if let Some(p) = publisher {
            parts.push(format!("p={}", normalize_title(p)));
        }
        Self { class: CacheClass::Advanced, key: parts.join(":") }
    }

    /// `csv-parse:<sha256>:v1`, content-addressed and versioned so a prompt or
    /// parser change can invalidate the whole class at once.
    #[must_use]
    pub fn csv_parse(sha256_hex: &str) -> Self {
        Self { class: CacheClass::CsvParse, key: format!("csv-parse:{sha256_hex}:v1") }
    }

    /// `enrich:editions:<title>:<author>`: edition listings for a work.
    #[must_use]
    pub fn editions(work_title: &str, author: &str) -> Self {
        Self {
            class: CacheClass::Enrich,
            key: format!(
                "enrich:editions:{}:{}",
                normalize_title(work_title),
                normalize_author(author)
            ),
        }
    }

    #[must_use]
    pub const fn class(&self) -> CacheClass {
        self.class
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isbn_key_shape() {
        assert_eq!(CacheKey::isbn("9780439708180").as_str(), "isbn:9780439708180");
    }

    #[test]
    fn test_title_key_is_normalized() {
        let a = CacheKey::title("The Dispossessed!");
        let b = CacheKey::title("  the DISPOSSESSED ");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "title:dispossessed");
    }

    #[test]
    fn test_advanced_key_omits_absent_fields() {
        let key = CacheKey::advanced(Some("Dune"), None, Some(1965), None);
        assert_eq!(key.as_str(), "advanced:t=dune:y=1965");
    }

    #[test]
    fn test_csv_key_is_versioned() {
        let key = CacheKey::csv_parse("abc123");
        assert_eq!(key.as_str(), "csv-parse:abc123:v1");
    }

    #[test]
    fn test_identical_queries_produce_identical_keys() {
        assert_eq!(
            CacheKey::editions("A Wizard of Earthsea", "Le Guin").as_str(),
            CacheKey::editions("a wizard of earthsea", "le guin").as_str()
        );
    }
}
