//! Archive identifier sanitization.
//!
//! The identifier arrives as an untrusted path segment and ends up both in
//! a filesystem path and in the archiver's argument vector. Parsing rejects
//! anything that could escape the source root or be read as an option.

use std::fmt;

use crate::archive::error::ArchiveError;

/// A sanitized archive identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveId(String);

impl ArchiveId {
    /// Parse an untrusted path segment into an identifier.
    ///
    /// Rejected: empty strings, path separators, NUL bytes, `.` and `..`,
    /// and a leading `-` (the archiver would parse it as an option).
    pub fn parse(raw: &str) -> Result<Self, ArchiveError> {
        let forbidden = raw.is_empty()
            || raw == "."
            || raw == ".."
            || raw.starts_with('-')
            || raw.contains(['/', '\\', '\0']);
        if forbidden {
            return Err(ArchiveError::InvalidIdentifier(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_names() {
        for raw in ["photos", "7kna", "archive_2024", "with.dot", "a b"] {
            assert_eq!(ArchiveId::parse(raw).unwrap().as_str(), raw);
        }
    }

    #[test]
    fn test_rejects_traversal_and_separators() {
        for raw in ["", ".", "..", "../etc", "a/b", "a\\b", "nested/../up"] {
            assert!(
                ArchiveId::parse(raw).is_err(),
                "{:?} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_rejects_option_like_names() {
        // A leading dash would reach the archiver as a flag.
        assert!(ArchiveId::parse("-r").is_err());
        assert!(ArchiveId::parse("--exclude").is_err());
    }

    #[test]
    fn test_rejects_nul() {
        assert!(ArchiveId::parse("a\0b").is_err());
    }
}
