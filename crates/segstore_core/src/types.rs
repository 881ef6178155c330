//! Core type definitions for SegStore.

use std::fmt;
use std::time::SystemTime;

/// Information about a segment, as returned by `get_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentInfo {
    /// Name of the segment.
    pub name: String,
    /// Current length in bytes.
    pub length: u64,
    /// Whether the segment is sealed.
    pub sealed: bool,
    /// Whether the segment has been deleted.
    ///
    /// Always `false` in results of `get_info`, which fails for deleted
    /// segments instead.
    pub deleted: bool,
    /// Name of the parent segment if this is a batch.
    pub parent: Option<String>,
    /// Time of the last successful modification.
    pub last_modified: SystemTime,
}

impl SegmentInfo {
    /// Returns true if the segment exists.
    #[must_use]
    pub const fn exists(&self) -> bool {
        !self.deleted
    }

    /// Returns true if the segment is a batch.
    #[must_use]
    pub fn is_batch(&self) -> bool {
        self.parent.is_some()
    }
}

impl fmt::Display for SegmentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (length {}", self.name, self.length)?;
        if self.sealed {
            write!(f, ", sealed")?;
        }
        if let Some(parent) = &self.parent {
            write!(f, ", batch of {parent}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_display() {
        let info = SegmentInfo {
            name: "orders#batch.1".into(),
            length: 12,
            sealed: true,
            deleted: false,
            parent: Some("orders".into()),
            last_modified: SystemTime::UNIX_EPOCH,
        };

        assert!(info.exists());
        assert!(info.is_batch());
        assert_eq!(
            info.to_string(),
            "orders#batch.1 (length 12, sealed, batch of orders)"
        );
    }
}
