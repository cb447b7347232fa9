//! Access levels and availability

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Declared visibility of a declaration, ordered from narrowest to widest
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Display)]
pub enum AccessLevel {
    /// Visible within the declaring context (and same-file extensions of it)
    #[display("private")]
    Private,
    /// Visible within the declaring file
    #[display("fileprivate")]
    FilePrivate,
    /// Visible within the declaring module
    #[display("internal")]
    Internal,
    /// Visible everywhere
    #[display("public")]
    Public,
    /// Visible everywhere, and overridable outside the module
    #[display("open")]
    Open,
}

impl AccessLevel {
    /// Whether this level is visible from any module
    pub fn is_public(self) -> bool {
        self >= Self::Public
    }
}

/// A language mode, e.g. `4.2` or `5.0`
#[derive(
    Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize, Display,
)]
#[display("{major}.{minor}")]
pub struct LanguageVersion {
    /// Major version
    pub major: u32,
    /// Minor version, `0` when omitted
    #[serde(default)]
    pub minor: u32,
}

impl LanguageVersion {
    /// Version `major.minor`
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl Default for LanguageVersion {
    fn default() -> Self {
        Self::new(5, 0)
    }
}

/// Availability attributes that influence lookup tie-breaking
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub struct Availability {
    /// Marked unavailable outright
    pub unavailable: bool,
    /// Unavailable from this language version onwards
    pub obsoleted_in: Option<LanguageVersion>,
}

impl Availability {
    /// No availability restrictions
    pub const AVAILABLE: Self = Self {
        unavailable: false,
        obsoleted_in: None,
    };

    /// Unavailable in every language version
    pub const UNAVAILABLE: Self = Self {
        unavailable: true,
        obsoleted_in: None,
    };

    /// Unavailable when compiling in `version` or later
    pub const fn obsoleted_in(version: LanguageVersion) -> Self {
        Self {
            unavailable: false,
            obsoleted_in: Some(version),
        }
    }

    /// Marked unavailable regardless of language version
    pub fn is_unavailable(&self) -> bool {
        self.unavailable
    }

    /// Unavailable in the active language version
    pub fn is_unavailable_in(&self, version: LanguageVersion) -> bool {
        self.obsoleted_in.is_some_and(|obsoleted| version >= obsoleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_ordering() {
        assert!(AccessLevel::Private < AccessLevel::FilePrivate);
        assert!(AccessLevel::Internal < AccessLevel::Public);
        assert!(AccessLevel::Open.is_public());
        assert!(!AccessLevel::Internal.is_public());
        assert_eq!(AccessLevel::FilePrivate.to_string(), "fileprivate");
    }

    #[test]
    fn test_version_specific_unavailability() {
        let availability = Availability::obsoleted_in(LanguageVersion::new(5, 0));
        assert!(!availability.is_unavailable());
        assert!(availability.is_unavailable_in(LanguageVersion::new(5, 0)));
        assert!(availability.is_unavailable_in(LanguageVersion::new(6, 0)));
        assert!(!availability.is_unavailable_in(LanguageVersion::new(4, 2)));
        assert!(!Availability::UNAVAILABLE.is_unavailable_in(LanguageVersion::new(5, 0)));
    }
}
