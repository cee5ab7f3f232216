//! Configuration management for the seat map engine.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::engine::{ClassBoundaries, EligibilityRules, MAX_TOTAL_ROWS};
use crate::types::Money;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors detected by [`SeatMapConfig::validate`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No seat labels configured
    #[error("seat labels must not be empty")]
    EmptySeatLabels,

    /// The same column letter appears twice
    #[error("seat label '{0}' is configured more than once")]
    DuplicateSeatLabel(char),

    /// Row limit is zero or above what the engine can lay out
    #[error("max total rows must be between 1 and {MAX_TOTAL_ROWS}, got {0}")]
    InvalidMaxRows(u32),

    /// Default row count must be between 1 and the row limit
    #[error("default total rows must be between 1 and {max}, got {rows}")]
    InvalidDefaultRows {
        /// Configured default
        rows: u32,
        /// Configured limit
        max: u32,
    },

    /// Class boundaries must be strictly ascending and start at row 1 or later
    #[error("class boundaries must be ascending: first {first} < business {business} < premium {premium}")]
    UnorderedBoundaries {
        /// Last first-class row
        first: u32,
        /// Last business row
        business: u32,
        /// Last premium row
        premium: u32,
    },
}

/// Seat map configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatMapConfig {
    /// Rows to draw when the backend does not report a row count
    pub default_total_rows: u32,
    /// Largest row count accepted from the backend
    pub max_total_rows: u32,
    /// Column letters, left to right
    pub seat_labels: Vec<char>,
    /// Row ranges per cabin class
    pub boundaries: ClassBoundaries,
    /// Exit and extra legroom eligibility
    pub eligibility: EligibilityRules,
    /// Fallback price for ordinary seats
    pub base_price: Money,
    /// Fallback price for exit and extra legroom seats
    pub extra_legroom_price: Money,
    /// How long a rejection notice stays visible, in milliseconds
    pub notice_ttl_ms: u64,
    /// Log filter for the demo binary (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for SeatMapConfig {
    fn default() -> Self {
        Self {
            default_total_rows: 30,
            max_total_rows: 99,
            seat_labels: vec!['A', 'B', 'C', 'D', 'E', 'F'],
            boundaries: ClassBoundaries::default(),
            eligibility: EligibilityRules::default(),
            base_price: Money::ZERO,
            extra_legroom_price: Money::new(150_000),
            notice_ttl_ms: 4_000,
            log_level: "info,seatmap=debug".to_string(),
        }
    }
}

/// Reads and parses an environment variable, falling back on absence or parse failure
fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl SeatMapConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparseable variables keep their default value.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            default_total_rows: env_or("SEATMAP_DEFAULT_ROWS", defaults.default_total_rows),
            max_total_rows: env_or("SEATMAP_MAX_ROWS", defaults.max_total_rows),
            seat_labels: env::var("SEATMAP_SEAT_LABELS")
                .ok()
                .map(|s| {
                    s.chars()
                        .filter(char::is_ascii_alphabetic)
                        .map(|c| c.to_ascii_uppercase())
                        .collect()
                })
                .unwrap_or(defaults.seat_labels),
            boundaries: ClassBoundaries {
                first_last_row: env_or(
                    "SEATMAP_FIRST_LAST_ROW",
                    defaults.boundaries.first_last_row,
                ),
                business_last_row: env_or(
                    "SEATMAP_BUSINESS_LAST_ROW",
                    defaults.boundaries.business_last_row,
                ),
                premium_last_row: env_or(
                    "SEATMAP_PREMIUM_LAST_ROW",
                    defaults.boundaries.premium_last_row,
                ),
            },
            eligibility: EligibilityRules {
                min_exit_row_age: env_or(
                    "SEATMAP_MIN_EXIT_ROW_AGE",
                    defaults.eligibility.min_exit_row_age,
                ),
            },
            base_price: Money::new(env_or("SEATMAP_BASE_PRICE", defaults.base_price.amount())),
            extra_legroom_price: Money::new(env_or(
                "SEATMAP_EXTRA_LEGROOM_PRICE",
                defaults.extra_legroom_price.amount(),
            )),
            notice_ttl_ms: env_or("SEATMAP_NOTICE_TTL_MS", defaults.notice_ttl_ms),
            log_level: env::var("SEATMAP_LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    /// Check the invariants the engine relies on
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for empty or duplicate seat labels, for row
    /// counts outside `1..=max_total_rows` and for class boundaries that are
    /// not strictly ascending.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_total_rows == 0 || self.max_total_rows > MAX_TOTAL_ROWS {
            return Err(ConfigError::InvalidMaxRows(self.max_total_rows));
        }
        if self.default_total_rows == 0 || self.default_total_rows > self.max_total_rows {
            return Err(ConfigError::InvalidDefaultRows {
                rows: self.default_total_rows,
                max: self.max_total_rows,
            });
        }

        if self.seat_labels.is_empty() {
            return Err(ConfigError::EmptySeatLabels);
        }

        let mut seen = BTreeSet::new();
        for label in &self.seat_labels {
            if !seen.insert(*label) {
                return Err(ConfigError::DuplicateSeatLabel(*label));
            }
        }

        let b = &self.boundaries;
        if b.first_last_row == 0
            || b.first_last_row >= b.business_last_row
            || b.business_last_row >= b.premium_last_row
        {
            return Err(ConfigError::UnorderedBoundaries {
                first: b.first_last_row,
                business: b.business_last_row,
                premium: b.premium_last_row,
            });
        }

        Ok(())
    }

    /// Row count to lay out for a backend-reported count
    ///
    /// `None`, zero and counts above `max_total_rows` fall back to
    /// `default_total_rows`, itself capped at the limit.
    #[must_use]
    pub fn effective_total_rows(&self, reported: Option<u32>) -> u32 {
        let fallback = self.default_total_rows.min(self.max_total_rows);
        match reported {
            Some(rows) if (1..=self.max_total_rows).contains(&rows) => rows,
            Some(rows) => {
                tracing::warn!(
                    total_rows = rows,
                    max = self.max_total_rows,
                    fallback,
                    "Row count out of range, using default"
                );
                fallback
            },
            None => fallback,
        }
    }

    /// Rejection notice lifetime
    #[must_use]
    pub const fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_ttl_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SeatMapConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.default_total_rows, 30);
        assert_eq!(config.seat_labels.len(), 6);
        assert_eq!(config.notice_ttl(), Duration::from_secs(4));
    }

    #[test]
    fn validate_rejects_duplicate_labels() {
        let config = SeatMapConfig {
            seat_labels: vec!['A', 'B', 'A'],
            ..SeatMapConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::DuplicateSeatLabel('A')));
    }

    #[test]
    fn validate_rejects_empty_labels() {
        let config = SeatMapConfig {
            seat_labels: Vec::new(),
            ..SeatMapConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptySeatLabels));
    }

    #[test]
    fn validate_rejects_out_of_range_row_counts() {
        let zero_default = SeatMapConfig {
            default_total_rows: 0,
            ..SeatMapConfig::default()
        };
        assert_eq!(
            zero_default.validate(),
            Err(ConfigError::InvalidDefaultRows { rows: 0, max: 99 })
        );

        let above_limit = SeatMapConfig {
            default_total_rows: 4_000_000_000,
            ..SeatMapConfig::default()
        };
        assert!(matches!(
            above_limit.validate(),
            Err(ConfigError::InvalidDefaultRows { rows: 4_000_000_000, .. })
        ));

        let huge_limit = SeatMapConfig {
            max_total_rows: MAX_TOTAL_ROWS + 1,
            ..SeatMapConfig::default()
        };
        assert_eq!(
            huge_limit.validate(),
            Err(ConfigError::InvalidMaxRows(MAX_TOTAL_ROWS + 1))
        );
    }

    #[test]
    fn effective_total_rows_falls_back_outside_the_limit() {
        let config = SeatMapConfig::default();
        assert_eq!(config.effective_total_rows(Some(42)), 42);
        assert_eq!(config.effective_total_rows(Some(99)), 99);
        assert_eq!(config.effective_total_rows(Some(100)), 30);
        assert_eq!(config.effective_total_rows(Some(4_000_000_000)), 30);
        assert_eq!(config.effective_total_rows(None), 30);
    }

    #[test]
    fn validate_rejects_unordered_boundaries() {
        let config = SeatMapConfig {
            boundaries: ClassBoundaries {
                first_last_row: 8,
                business_last_row: 3,
                premium_last_row: 15,
            },
            ..SeatMapConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnorderedBoundaries { first: 8, .. })
        ));
    }
}
