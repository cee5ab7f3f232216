//! Domain types for the seat map engine.
//!
//! Value objects (seat ids, money, row attributes), the derived [`Seat`]
//! entity, and the passenger eligibility snapshot supplied by the booking
//! flow.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Identifiers
// ============================================================================

/// Identifier of a flight whose seat map is being shown
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlightId(String);

impl FlightId {
    /// Creates a new `FlightId`
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the flight id as a string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors produced when parsing a seat id such as `"12C"`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeatIdError {
    /// Input is not `<row digits><column letter>`
    #[error("malformed seat id '{0}'")]
    Malformed(String),

    /// Rows are 1-indexed
    #[error("seat id '{0}' has row 0")]
    ZeroRow(String),
}

/// Identifier of a seat: row number plus column letter (e.g. `12C`)
///
/// Ordering is row-major, then by column letter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SeatId {
    row: u32,
    column: char,
}

impl SeatId {
    /// Creates a `SeatId`; the column letter is upper-cased
    #[must_use]
    pub const fn new(row: u32, column: char) -> Self {
        Self {
            row,
            column: column.to_ascii_uppercase(),
        }
    }

    /// Row number (1-indexed)
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Column letter
    #[must_use]
    pub const fn column(&self) -> char {
        self.column
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.column)
    }
}

impl FromStr for SeatId {
    type Err = SeatIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| SeatIdError::Malformed(s.to_string()))?;
        let (digits, rest) = trimmed.split_at(split);

        let mut letters = rest.chars();
        let column = match (letters.next(), letters.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => c,
            _ => return Err(SeatIdError::Malformed(s.to_string())),
        };

        let row: u32 = digits
            .parse()
            .map_err(|_| SeatIdError::Malformed(s.to_string()))?;
        if row == 0 {
            return Err(SeatIdError::ZeroRow(s.to_string()));
        }

        Ok(Self::new(row, column))
    }
}

impl From<SeatId> for String {
    fn from(id: SeatId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for SeatId {
    type Error = SeatIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// Money Value Object (minor units to avoid floating point errors)
// ============================================================================

/// Price in the smallest currency unit
///
/// Never negative and never NaN; raw backend numbers enter through
/// [`Money::from_raw`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from minor units
    #[must_use]
    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    /// Converts an untrusted number, rounding to the nearest unit
    ///
    /// Returns `None` for NaN, infinities and negative values.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // range checked above, `as` saturates
    pub fn from_raw(raw: f64) -> Option<Self> {
        if !raw.is_finite() || raw < 0.0 {
            return None;
        }
        Some(Self(raw.round() as u64))
    }

    /// Returns the amount in minor units
    #[must_use]
    pub const fn amount(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl std::ops::Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, m| acc + m)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Seat classification
// ============================================================================

/// Cabin class, a pure function of the row number
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatClass {
    /// Front rows
    First,
    /// Rows after first class
    Business,
    /// Premium economy
    Premium,
    /// Everything behind premium
    Economy,
}

impl fmt::Display for SeatClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::First => "first",
            Self::Business => "business",
            Self::Premium => "premium",
            Self::Economy => "economy",
        };
        f.write_str(name)
    }
}

/// Per-seat status, derived from occupancy and the current selection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    /// Free to pick
    Available,
    /// Picked by the current user
    Selected,
    /// Sold to someone else
    Occupied,
    /// Blocked by the carrier
    Unavailable,
}

impl SeatStatus {
    /// Whether a user may pick (or un-pick) a seat in this status
    #[must_use]
    pub const fn is_selectable(&self) -> bool {
        matches!(self, Self::Available | Self::Selected)
    }
}

/// Row tag from the backend seat-map metadata
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowAttribute {
    /// Emergency exit row
    Exit,
    /// Extra legroom row
    Extra,
    /// Business seating tag
    Business,
}

impl RowAttribute {
    /// Parses a backend tag; unrecognized tags yield `None`
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "exit" => Some(Self::Exit),
            "extra" => Some(Self::Extra),
            "business" => Some(Self::Business),
            _ => None,
        }
    }

    /// Exit and extra legroom rows carry the surcharge and eligibility rules
    #[must_use]
    pub const fn is_special(&self) -> bool {
        matches!(self, Self::Exit | Self::Extra)
    }
}

/// Row number (1-indexed) to the set of tags on that row
pub type RowAttributes = BTreeMap<u32, BTreeSet<RowAttribute>>;

/// Sparse per-seat price overrides
pub type SeatPrices = BTreeMap<SeatId, Money>;

// ============================================================================
// Seat entity
// ============================================================================

/// A seat in the derived inventory
///
/// Never persisted; regenerated from backend data and the selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    /// Seat id (`12C`)
    pub id: SeatId,
    /// Row number
    pub row: u32,
    /// Column letter
    pub column: char,
    /// Cabin class derived from the row
    pub class: SeatClass,
    /// Derived status
    pub status: SeatStatus,
    /// Resolved price
    pub price: Money,
    /// Tags of the seat's row
    pub attributes: BTreeSet<RowAttribute>,
    /// Row is tagged `exit`
    pub is_exit_row: bool,
    /// Row is tagged `extra`
    pub is_extra_legroom: bool,
}

impl Seat {
    /// Exit or extra legroom seat
    #[must_use]
    pub const fn is_special(&self) -> bool {
        self.is_exit_row || self.is_extra_legroom
    }
}

// ============================================================================
// Passengers
// ============================================================================

/// Passenger age category from the booking
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassengerType {
    /// 12 years and older
    Adult,
    /// 2 to 11 years
    Child,
    /// Lap infant, no own seat
    Infant,
}

/// Eligibility snapshot of the passenger picking a seat
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerProfile {
    /// Age in whole years
    pub age: u32,
    /// Age category
    pub passenger_type: PassengerType,
    /// Pregnancy declared
    pub is_pregnant: bool,
    /// Travelling with a lap infant
    pub traveling_with_infant: bool,
    /// Needs mobility assistance
    pub reduced_mobility: bool,
}

impl PassengerProfile {
    /// Adult passenger with no special circumstances
    #[must_use]
    pub const fn adult(age: u32) -> Self {
        Self {
            age,
            passenger_type: PassengerType::Adult,
            is_pregnant: false,
            traveling_with_infant: false,
            reduced_mobility: false,
        }
    }

    /// Child passenger
    #[must_use]
    pub const fn child(age: u32) -> Self {
        Self {
            passenger_type: PassengerType::Child,
            ..Self::adult(age)
        }
    }

    /// Lap infant
    #[must_use]
    pub const fn infant() -> Self {
        Self {
            passenger_type: PassengerType::Infant,
            ..Self::adult(0)
        }
    }

    /// Whether this passenger occupies a seat of their own
    #[must_use]
    pub const fn is_seat_eligible(&self) -> bool {
        !matches!(self.passenger_type, PassengerType::Infant)
    }
}
