//! Canonical `Edition` record: a published manifestation of a work.

use super::provider::ProviderId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Physical/digital format of an edition.
///
/// The declaration order doubles as the sort order used when ranking
/// editions for display (hardcover first, unknown formats last).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EditionFormat {
    Hardcover,
    Paperback,
    #[serde(rename = "E-book")]
    Ebook,
    Audiobook,
    #[default]
    Other,
}

impl EditionFormat {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hardcover => "Hardcover",
            Self::Paperback => "Paperback",
            Self::Ebook => "E-book",
            Self::Audiobook => "Audiobook",
            Self::Other => "Other",
        }
    }

    /// Map loose provider format strings onto the closed set.
    #[must_use]
    pub fn from_provider_hint(hint: &str) -> Self {
        let lower = hint.to_lowercase();
        if lower.contains("hardcover") || lower.contains("hardback") {
            Self::Hardcover
        } else if lower.contains("paperback") || lower.contains("softcover") {
            Self::Paperback
        } else if lower.contains("ebook") || lower.contains("e-book") || lower.contains("kindle") {
            Self::Ebook
        } else if lower.contains("audio") {
            Self::Audiobook
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for EditionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EditionFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Hardcover" => Ok(Self::Hardcover),
            "Paperback" => Ok(Self::Paperback),
            "E-book" => Ok(Self::Ebook),
            "Audiobook" => Ok(Self::Audiobook),
            "Other" => Ok(Self::Other),
            _ => Err(()),
        }
    }
}

/// A specific published manifestation of a [`Work`](super::work::Work).
///
/// Invariants: if `isbn` is set it appears in `isbns`; `format` is always
/// present (`Other` when the provider gave no usable hint).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edition {
    /// Normalized ISBNs, deduplicated; both ISBN-10 and ISBN-13 forms kept.
    #[serde(default)]
    pub isbns: Vec<String>,
    /// Primary ISBN-13 when one is available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    /// Edition title, when it differs from the work title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    /// ISO date or bare year, as published by the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub format: EditionFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_catalog_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub open_bib_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub isbn_registry_ids: Vec<String>,
    /// Field-completeness quality score, 0-100.
    #[serde(rename = "isbndbQuality")]
    pub quality: u8,
    pub primary_provider: ProviderId,
    pub contributors: Vec<ProviderId>,
}

impl Edition {
    /// Create an empty edition attributed to a single provider.
    #[must_use]
    pub fn from_provider(provider: ProviderId) -> Self {
        Self {
            isbns: Vec::new(),
            isbn: None,
            title: None,
            publisher: None,
            publication_date: None,
            page_count: None,
            format: EditionFormat::Other,
            language: None,
            cover_image_url: None,
            volume_catalog_ids: Vec::new(),
            open_bib_ids: Vec::new(),
            isbn_registry_ids: Vec::new(),
            quality: 0,
            primary_provider: provider,
            contributors: vec![provider],
        }
    }

    /// Check the structural invariants that every emitted edition must satisfy.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let isbn_ok = self
            .isbn
            .as_ref()
            .is_none_or(|primary| self.isbns.iter().any(|i| i == primary));
        isbn_ok && self.contributors.contains(&self.primary_provider)
    }

    /// Year of publication, parsed from the leading digits of
    /// `publication_date` (handles both `2003` and `2003-04-01`).
    #[must_use]
    pub fn publication_year(&self) -> Option<i32> {
        let date = self.publication_date.as_deref()?;
        let digits: String = date.chars().take_while(char::is_ascii_digit).collect();
        if digits.len() == 4 { digits.parse().ok() } else { None }
    }
}
