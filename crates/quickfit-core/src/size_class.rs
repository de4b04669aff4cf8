//! Size-class table.
//!
//! An ordered list of strictly ascending byte thresholds. A request belongs to
//! the first class whose threshold is at least the requested size. Both the
//! allocation and release paths classify through [`SizeClassTable::classify`],
//! so a block's stored size always maps back to the list it came from.

use crate::error::ConfigError;
use crate::header::BLOCK_HEADER_SIZE;

/// Default thresholds (bytes).
pub const DEFAULT_THRESHOLDS: [usize; 3] = [50, 100, 200];

/// Immutable, validated size-class table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeClassTable {
    thresholds: Box<[usize]>,
}

impl SizeClassTable {
    /// Builds a table from `thresholds`.
    ///
    /// The list must be non-empty, strictly ascending and contain no zero.
    /// Each threshold plus the header must be representable as a region length.
    pub fn new(thresholds: &[usize]) -> Result<Self, ConfigError> {
        if thresholds.is_empty() {
            return Err(ConfigError::Empty);
        }
        for (index, &threshold) in thresholds.iter().enumerate() {
            if threshold == 0 {
                return Err(ConfigError::ZeroThreshold { index });
            }
            if threshold.checked_add(BLOCK_HEADER_SIZE).is_none()
                || u64::try_from(threshold).is_err()
            {
                return Err(ConfigError::TooLarge { threshold });
            }
            if index > 0 && threshold <= thresholds[index - 1] {
                return Err(ConfigError::NotAscending {
                    index,
                    threshold,
                    previous: thresholds[index - 1],
                });
            }
        }
        Ok(Self {
            thresholds: thresholds.into(),
        })
    }

    /// Returns the index of the first class able to hold `size` bytes, or
    /// `None` when `size` exceeds every threshold.
    #[must_use]
    pub fn classify(&self, size: usize) -> Option<usize> {
        // Tables are small; a linear scan keeps first-fit-ascending obvious.
        self.thresholds.iter().position(|&threshold| size <= threshold)
    }

    /// Threshold of class `index`, if it exists.
    #[must_use]
    pub fn threshold(&self, index: usize) -> Option<usize> {
        self.thresholds.get(index).copied()
    }

    /// Largest supported request size.
    #[must_use]
    pub fn largest(&self) -> usize {
        // Construction rejects empty tables.
        self.thresholds.last().copied().unwrap_or(0)
    }

    /// Number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    /// Always false for a constructed table.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    #[must_use]
    pub fn thresholds(&self) -> &[usize] {
        &self.thresholds
    }
}

impl Default for SizeClassTable {
    fn default() -> Self {
        Self {
            thresholds: DEFAULT_THRESHOLDS.into(),
        }
    }
}
