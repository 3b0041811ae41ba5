use std::fmt;

/// Per-type change-history policy.
///
/// Record types declare their mode as a string tag
/// ([`Storable::VERSIONING`](crate::Storable::VERSIONING)); it is parsed on
/// first use so an unknown tag surfaces as
/// [`StoreError::InvalidVersioningMode`](crate::StoreError::InvalidVersioningMode)
/// when a record of that type is saved or its history is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Versioning {
    /// No history is kept.
    None,
    /// Every changing save prepends a diff to `_version_hist`.
    DeltaHistory,
}

impl Versioning {
    pub const NONE: &'static str = "ver:none";
    pub const DELTA_HISTORY: &'static str = "ver:delta";

    /// Parse a declared tag. Returns `None` for unrecognized tags.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "ver:none" | "none" => Some(Versioning::None),
            "ver:delta" | "delta" => Some(Versioning::DeltaHistory),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Versioning::None => Self::NONE,
            Versioning::DeltaHistory => Self::DELTA_HISTORY,
        }
    }

    pub fn keeps_history(self) -> bool {
        self == Versioning::DeltaHistory
    }
}

impl fmt::Display for Versioning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
