//! Cart error types.

use std::fmt;

use thiserror::Error;

use crate::catalog::ProductId;
use crate::clients::HttpError;
use crate::storage::StorageError;

/// A local line the backend did not accept during migration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedLine {
    /// The product of the line.
    pub product: ProductId,
    /// The quantity that was to be added.
    pub quantity: u32,
    /// Why the add call failed.
    pub reason: String,
}

/// Outcome of moving local lines into the backend cart.
///
/// Failed lines remain in local storage and are attempted again on the next
/// transition to the signed-in state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Products the backend confirmed.
    pub migrated: Vec<ProductId>,
    /// Lines that failed and were kept locally.
    pub failed: Vec<FailedLine>,
}

impl MigrationReport {
    /// Returns `true` if every line was migrated.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of lines attempted.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.migrated.len() + self.failed.len()
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} cart lines could not be moved to the account cart",
            self.failed.len(),
            self.attempted()
        )
    }
}

/// Errors returned by [`CartEngine`](crate::cart::CartEngine) operations.
///
/// After any error the engine keeps its last successfully loaded lines.
#[derive(Debug, Error)]
pub enum CartError {
    /// A backend call failed.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Local storage could not be read or written.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Some local lines could not be migrated; see the report.
    #[error("{0}")]
    PartialMigration(MigrationReport),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_message_counts_lines() {
        let report = MigrationReport {
            migrated: vec![ProductId(1), ProductId(2)],
            failed: vec![FailedLine {
                product: ProductId(3),
                quantity: 1,
                reason: "out of stock".to_string(),
            }],
        };

        assert!(!report.is_complete());
        assert_eq!(
            CartError::PartialMigration(report).to_string(),
            "1 of 3 cart lines could not be moved to the account cart"
        );
    }

    #[test]
    fn test_empty_report_is_complete() {
        assert!(MigrationReport::default().is_complete());
        assert_eq!(MigrationReport::default().attempted(), 0);
    }
}
