//! Typed `major.minor` version numbers.
//!
//! A document's versions form a gapless-by-rule sequence: the first
//! version is exactly `1.0`, and from `(major, minor)` the only legal
//! successors are the minor increment and the next major's `.0`. The
//! minor digit rolls over after 9 (`1.9` -> `2.0`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use docvault_core::AppError;

/// A `major.minor` version number with a single-digit minor component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionNumber {
    /// Major component.
    pub major: u32,
    /// Minor component, always in `0..=9`.
    pub minor: u8,
}

impl VersionNumber {
    /// The mandatory first version of every document.
    pub const INITIAL: Self = Self { major: 1, minor: 0 };

    /// Build a version number, rejecting minors above 9.
    pub fn new(major: u32, minor: u8) -> Result<Self, AppError> {
        if minor > 9 {
            return Err(AppError::validation(format!(
                "Version minor component must be a single digit, got {minor}"
            )));
        }
        Ok(Self { major, minor })
    }

    /// The minor-increment successor, rolling over to the next major
    /// when the minor digit is exhausted.
    pub fn next_minor(&self) -> Self {
        if self.minor == 9 {
            Self {
                major: self.major + 1,
                minor: 0,
            }
        } else {
            Self {
                major: self.major,
                minor: self.minor + 1,
            }
        }
    }

    /// The next major version (`X.0`).
    pub fn next_major(&self) -> Self {
        Self {
            major: self.major + 1,
            minor: 0,
        }
    }

    /// Whether `self` is a legal successor of `latest`.
    ///
    /// With no existing version the only legal start is `1.0`. From
    /// `(M, m < 9)` both `(M, m+1)` and `(M+1, 0)` are legal; from
    /// `(M, 9)` only `(M+1, 0)` is.
    pub fn follows(&self, latest: Option<VersionNumber>) -> bool {
        match latest {
            None => *self == Self::INITIAL,
            Some(prev) => *self == prev.next_minor() || *self == prev.next_major(),
        }
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for VersionNumber {
    type Err = AppError;

    /// Parse a decimal with exactly one fractional digit, e.g. `"1.4"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::validation(format!("Invalid version number format: '{s}'"));

        let (major_part, minor_part) = s.split_once('.').ok_or_else(invalid)?;
        if major_part.is_empty() || minor_part.len() != 1 {
            return Err(invalid());
        }

        let major: u32 = major_part.parse().map_err(|_| invalid())?;
        let minor = minor_part.chars().next().ok_or_else(invalid)?;
        let minor = minor.to_digit(10).ok_or_else(invalid)? as u8;

        Self::new(major, minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(major: u32, minor: u8) -> VersionNumber {
        VersionNumber::new(major, minor).unwrap()
    }

    #[test]
    fn test_parse_valid() {
        assert_eq!("1.0".parse::<VersionNumber>().unwrap(), v(1, 0));
        assert_eq!("10.9".parse::<VersionNumber>().unwrap(), v(10, 9));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in ["", "1", "1.", ".5", "1.23", "1.x", "a.1", "1.0.0", "-1.0", "NaN"] {
            assert!(raw.parse::<VersionNumber>().is_err(), "accepted '{raw}'");
        }
    }

    #[test]
    fn test_next_minor_rollover() {
        assert_eq!(v(1, 0).next_minor(), v(1, 1));
        assert_eq!(v(1, 9).next_minor(), v(2, 0));
    }

    #[test]
    fn test_follows_initial() {
        assert!(v(1, 0).follows(None));
        assert!(!v(1, 1).follows(None));
        assert!(!v(2, 0).follows(None));
    }

    #[test]
    fn test_follows_successors() {
        assert!(v(1, 1).follows(Some(v(1, 0))));
        assert!(v(2, 0).follows(Some(v(1, 0))));
        assert!(!v(1, 2).follows(Some(v(1, 0))));
        assert!(!v(3, 0).follows(Some(v(1, 0))));
        // From X.9 only the next major is legal.
        assert!(v(2, 0).follows(Some(v(1, 9))));
        assert!(!v(1, 9).follows(Some(v(1, 9))));
    }

    #[test]
    fn test_ordering() {
        assert!(v(2, 0) > v(1, 9));
        assert!(v(10, 0) > v(9, 9));
    }

    #[test]
    fn test_display() {
        assert_eq!(v(1, 0).to_string(), "1.0");
        assert_eq!(v(12, 3).to_string(), "12.3");
    }
}
