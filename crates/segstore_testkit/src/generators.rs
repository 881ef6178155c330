//! Property-based test generators using proptest.
//!
//! Provides strategies for generating valid store inputs.

use proptest::prelude::*;

/// Strategy for generating valid segment names.
pub fn segment_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_/.-]{0,31}").expect("Invalid regex")
}

/// Strategy for generating a non-empty append payload.
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..512)
}

/// Strategy for generating a sequence of append payloads.
pub fn payloads_strategy(max_appends: usize) -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(payload_strategy(), 1..=max_appends.max(1))
}

/// Strategy for generating a valid read window as `(offset, max_length)`.
pub fn read_window_strategy(max_offset: u64) -> impl Strategy<Value = (u64, usize)> {
    (0..=max_offset, 1usize..4096)
}

/// A single step in a store scenario.
#[derive(Debug, Clone)]
pub enum StoreOp {
    /// Append a payload to the segment.
    Append(Vec<u8>),
    /// Append a payload through a batch that is then sealed and merged.
    MergeBatch(Vec<u8>),
    /// Seal the segment.
    Seal,
}

/// Strategy for generating store scenarios.
pub fn store_ops_strategy(max_ops: usize) -> impl Strategy<Value = Vec<StoreOp>> {
    let op = prop_oneof![
        6 => payload_strategy().prop_map(StoreOp::Append),
        3 => payload_strategy().prop_map(StoreOp::MergeBatch),
        1 => Just(StoreOp::Seal),
    ];
    prop::collection::vec(op, 1..=max_ops.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_names_are_short_and_clean(name in segment_name_strategy()) {
            prop_assert!(!name.is_empty());
            prop_assert!(name.len() <= 32);
            prop_assert!(!name.chars().any(char::is_control));
        }

        #[test]
        fn generated_payloads_are_not_empty(payloads in payloads_strategy(8)) {
            prop_assert!(!payloads.is_empty());
            prop_assert!(payloads.iter().all(|p| !p.is_empty()));
        }

        #[test]
        fn generated_windows_are_valid((offset, len) in read_window_strategy(100)) {
            prop_assert!(offset <= 100);
            prop_assert!(len > 0);
        }
    }
}
