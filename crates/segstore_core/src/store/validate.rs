//! Synchronous argument validation.

use crate::error::{SegmentError, SegmentResult};

/// Validates a name supplied for a new segment.
pub(crate) fn validate_new_name(name: &str, max_length: usize) -> SegmentResult<()> {
    validate_name(name)?;
    if name.len() > max_length {
        return Err(SegmentError::invalid_argument(format!(
            "segment name is {} bytes, maximum is {max_length}",
            name.len()
        )));
    }
    Ok(())
}

/// Validates a name referring to an existing segment or batch.
///
/// Batch names are derived from their parent's name and may exceed the
/// limit on new names, so no length limit applies here.
pub(crate) fn validate_name(name: &str) -> SegmentResult<()> {
    if name.is_empty() {
        return Err(SegmentError::invalid_argument("segment name is empty"));
    }
    if name.chars().any(char::is_control) {
        return Err(SegmentError::invalid_argument(format!(
            "segment name {name:?} contains control characters"
        )));
    }
    Ok(())
}

pub(crate) fn validate_payload(data: &[u8], max_length: usize) -> SegmentResult<()> {
    if data.is_empty() {
        return Err(SegmentError::invalid_argument("append payload is empty"));
    }
    if data.len() > max_length {
        return Err(SegmentError::invalid_argument(format!(
            "append payload is {} bytes, maximum is {max_length}",
            data.len()
        )));
    }
    Ok(())
}

pub(crate) fn validate_read_range(offset: u64, max_length: usize) -> SegmentResult<()> {
    if max_length == 0 {
        return Err(SegmentError::invalid_argument("read length must be positive"));
    }
    if offset.checked_add(max_length as u64).is_none() {
        return Err(SegmentError::invalid_argument(format!(
            "read range at offset {offset} with length {max_length} overflows"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert!(validate_name("orders").is_ok());
        assert!(validate_name("scope/stream/0.#epoch.1").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("bad\nname").is_err());

        assert!(validate_new_name("abcd", 4).is_ok());
        assert!(validate_new_name("abcde", 4).is_err());
    }

    #[test]
    fn payloads() {
        assert!(validate_payload(b"x", 1).is_ok());
        assert!(validate_payload(b"", 1).is_err());
        assert!(validate_payload(b"xy", 1).is_err());
    }

    #[test]
    fn read_ranges() {
        assert!(validate_read_range(0, 1).is_ok());
        assert!(validate_read_range(0, 0).is_err());
        assert!(validate_read_range(u64::MAX, 1).is_err());
        assert!(validate_read_range(u64::MAX - 1, 1).is_ok());
    }
}
