//! Provider identity and precedence.
//!
//! Every canonical record tracks which upstream providers contributed to it.
//! `ProviderId` is the closed set of known providers; merge precedence is a
//! property of the id itself so every consumer ranks providers identically.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of upstream metadata providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    /// Commercial volume catalog (free-text, ISBN, and volume-id search).
    VolumeCatalog,
    /// Open bibliographic database (works, editions, authors).
    OpenBib,
    /// ISBN registry (ISBN lookup and cover images).
    IsbnRegistry,
    /// Multimodal model used for bookshelf scans and CSV understanding.
    VisionModel,
}

impl ProviderId {
    /// All providers that participate in text/ISBN enrichment, in rank order.
    pub const ENRICHMENT_ORDER: [Self; 3] = [Self::VolumeCatalog, Self::OpenBib, Self::IsbnRegistry];

    /// Stable wire identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::VolumeCatalog => "volume-catalog",
            Self::OpenBib => "open-bib",
            Self::IsbnRegistry => "isbn-registry",
            Self::VisionModel => "vision-model",
        }
    }

    /// Merge precedence: lower rank wins attribute conflicts.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::VolumeCatalog => 0,
            Self::OpenBib => 1,
            Self::IsbnRegistry => 2,
            Self::VisionModel => 3,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "volume-catalog" => Ok(Self::VolumeCatalog),
            "open-bib" => Ok(Self::OpenBib),
            "isbn-registry" => Ok(Self::IsbnRegistry),
            "vision-model" => Ok(Self::VisionModel),
            _ => Err(()),
        }
    }
}
