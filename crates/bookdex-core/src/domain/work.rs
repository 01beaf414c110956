//! Canonical `Work` record: a book as an abstract intellectual object.

use super::provider::ProviderId;
use serde::{Deserialize, Serialize};

/// Editorial review status of a canonical record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Verified,
    #[default]
    Unverified,
    NeedsReview,
}

/// A conceptual book, independent of any particular edition.
///
/// Invariants (enforced by the merge layer, checked by [`Work::is_consistent`]):
/// `title` is non-empty and trimmed, and `primary_provider` appears in
/// `contributors`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Work {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_publication_year: Option<i32>,
    #[serde(default)]
    pub subject_tags: Vec<String>,
    pub primary_provider: ProviderId,
    pub contributors: Vec<ProviderId>,
    /// True iff constructed from partial data with no authoritative provider.
    #[serde(default)]
    pub synthetic: bool,
    #[serde(default)]
    pub review_status: ReviewStatus,
    /// External ids, one vector per provider namespace.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_catalog_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub open_bib_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub isbn_registry_ids: Vec<String>,
    /// Field-completeness quality score, 0-100.
    #[serde(rename = "isbndbQuality")]
    pub quality: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
}

impl Work {
    /// Create a work attributed to a single provider.
    #[must_use]
    pub fn from_provider(title: impl Into<String>, provider: ProviderId) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            description: None,
            first_publication_year: None,
            subject_tags: Vec::new(),
            primary_provider: provider,
            contributors: vec![provider],
            synthetic: false,
            review_status: ReviewStatus::Unverified,
            volume_catalog_ids: Vec::new(),
            open_bib_ids: Vec::new(),
            isbn_registry_ids: Vec::new(),
            quality: 0,
            cover_image_url: None,
        }
    }

    /// Check the structural invariants that every emitted work must satisfy.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        !self.title.trim().is_empty()
            && self.title.trim() == self.title
            && self.contributors.contains(&self.primary_provider)
    }
}
