use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative verdict the evaluation backend attaches to a submission.
///
/// Variants are ordered weakest to strongest so callers can compare two
/// attempts directly. The wire form uses snake_case tags (`needs_support`,
/// `developing`, `strong`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assessment {
    NeedsSupport,
    Developing,
    Strong,
}

impl Assessment {
    /// Returns true when this verdict clears an exercise on its own.
    #[must_use]
    pub fn is_strong(&self) -> bool {
        matches!(self, Assessment::Strong)
    }
}

impl fmt::Display for Assessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Assessment::NeedsSupport => "needs_support",
            Assessment::Developing => "developing",
            Assessment::Strong => "strong",
        };
        write!(f, "{tag}")
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
