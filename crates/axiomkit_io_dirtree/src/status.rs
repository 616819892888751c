//! Uniform status signal for indexed collection access.

use std::fmt;

/// Outcome of one collection access.
///
/// Exactly one state holds per value; a processing-failure detail exists only
/// in the [`EnumErrorStatus::ProcessingFailure`] state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EnumErrorStatus {
    /// The access succeeded.
    #[default]
    ErrorFree,
    /// The index was negative or not below the current length.
    IndexOutOfBounds {
        /// Requested index.
        index: isize,
        /// Collection length at the time of the request.
        len: usize,
    },
    /// The collection holds no element. Terminal, not a failure.
    CollectionEmpty,
    /// Any other failure.
    ProcessingFailure(String),
}

impl EnumErrorStatus {
    /// True for [`EnumErrorStatus::ErrorFree`].
    pub fn is_error_free(&self) -> bool {
        matches!(self, Self::ErrorFree)
    }

    /// True for [`EnumErrorStatus::IndexOutOfBounds`].
    pub fn is_index_out_of_bounds(&self) -> bool {
        matches!(self, Self::IndexOutOfBounds { .. })
    }

    /// True for [`EnumErrorStatus::CollectionEmpty`].
    pub fn is_collection_empty(&self) -> bool {
        matches!(self, Self::CollectionEmpty)
    }

    /// True for [`EnumErrorStatus::ProcessingFailure`].
    pub fn is_processing_error(&self) -> bool {
        matches!(self, Self::ProcessingFailure(_))
    }

    /// Failure detail, present only for [`EnumErrorStatus::ProcessingFailure`].
    pub fn processing_error(&self) -> Option<&str> {
        match self {
            Self::ProcessingFailure(msg) => Some(msg),
            _ => None,
        }
    }
}

impl fmt::Display for EnumErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ErrorFree => f.write_str("error free"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds (len={len})")
            }
            Self::CollectionEmpty => f.write_str("collection is empty"),
            Self::ProcessingFailure(msg) => write!(f, "processing failure: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EnumErrorStatus;

    #[test]
    fn exactly_one_state_is_reported() {
        let l_status = [
            EnumErrorStatus::ErrorFree,
            EnumErrorStatus::IndexOutOfBounds { index: -1, len: 0 },
            EnumErrorStatus::CollectionEmpty,
            EnumErrorStatus::ProcessingFailure("boom".to_string()),
        ];
        for status in &l_status {
            let n_true = [
                status.is_error_free(),
                status.is_index_out_of_bounds(),
                status.is_collection_empty(),
                status.is_processing_error(),
            ]
            .iter()
            .filter(|b| **b)
            .count();
            assert_eq!(n_true, 1, "{status}");
            assert_eq!(
                status.processing_error().is_some(),
                status.is_processing_error()
            );
        }
    }

    #[test]
    fn display_mentions_index_and_len() {
        let status = EnumErrorStatus::IndexOutOfBounds { index: 7, len: 3 };
        assert_eq!(status.to_string(), "index 7 out of bounds (len=3)");
    }
}
