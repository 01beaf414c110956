//! Canonical `Author` record.

use serde::{Deserialize, Serialize};

/// Author gender, as published by providers. Defaults to `Unknown`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Nonbinary,
    #[default]
    Unknown,
}

/// A contributor to a work.
///
/// Authors are deduplicated within a response by
/// [`author_key`](crate::normalize::author_key); two records with the same
/// key are the same person, and the higher-quality instance wins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl Author {
    /// Create an author with only a name; remaining fields default.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            gender: Gender::Unknown,
            birth_year: None,
            bio: None,
        }
    }

    /// Completeness score used when deduplication must pick one instance.
    #[must_use]
    pub fn completeness(&self) -> u8 {
        let mut score = 0;
        if self.gender != Gender::Unknown {
            score += 1;
        }
        if self.birth_year.is_some() {
            score += 1;
        }
        if self.bio.is_some() {
            score += 1;
        }
        score
    }
}
