//! Seat map engine.
//!
//! Derives the full seat inventory of a flight from backend data and the
//! current selection, resolves prices, and decides whether a passenger may
//! pick a seat. Every function here is pure; the selection reducer in
//! [`crate::aggregates`] is the only caller that owns state.
//!
//! Seat status is never stored on its own: it is recomputed from occupancy,
//! blocked seats and the selection each time the inventory is generated.

use crate::types::{
    Money, PassengerProfile, PassengerType, RowAttribute, RowAttributes, Seat, SeatClass, SeatId,
    SeatPrices, SeatStatus,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

// ============================================================================
// Classification
// ============================================================================

/// Last row of each cabin class; rows after `premium_last_row` are economy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassBoundaries {
    /// Last first-class row
    pub first_last_row: u32,
    /// Last business row
    pub business_last_row: u32,
    /// Last premium economy row
    pub premium_last_row: u32,
}

impl Default for ClassBoundaries {
    fn default() -> Self {
        Self {
            first_last_row: 3,
            business_last_row: 8,
            premium_last_row: 15,
        }
    }
}

impl ClassBoundaries {
    /// Cabin class of a 1-indexed row
    #[must_use]
    pub const fn classify(&self, row: u32) -> SeatClass {
        if row <= self.first_last_row {
            SeatClass::First
        } else if row <= self.business_last_row {
            SeatClass::Business
        } else if row <= self.premium_last_row {
            SeatClass::Premium
        } else {
            SeatClass::Economy
        }
    }
}

/// Cabin class of a row under the default boundaries (1-3, 4-8, 9-15, 16+)
#[must_use]
pub fn classify_row(row: u32) -> SeatClass {
    ClassBoundaries::default().classify(row)
}

// ============================================================================
// Selection set
// ============================================================================

/// Seats picked by the current user, in the order they were picked
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    seats: Vec<SeatId>,
}

impl Selection {
    /// Empty selection
    #[must_use]
    pub const fn new() -> Self {
        Self { seats: Vec::new() }
    }

    /// Whether `id` is selected
    #[must_use]
    pub fn contains(&self, id: &SeatId) -> bool {
        self.seats.contains(id)
    }

    /// Number of selected seats
    #[must_use]
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    /// No seat selected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Selected ids in pick order
    pub fn iter(&self) -> impl Iterator<Item = &SeatId> {
        self.seats.iter()
    }

    /// Selected ids in pick order
    #[must_use]
    pub fn as_slice(&self) -> &[SeatId] {
        &self.seats
    }

    /// Appends `id`; returns `false` if it was already selected
    pub fn insert(&mut self, id: SeatId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.seats.push(id);
        true
    }

    /// Removes `id`; returns `false` if it was not selected
    pub fn remove(&mut self, id: &SeatId) -> bool {
        let before = self.seats.len();
        self.seats.retain(|s| s != id);
        self.seats.len() != before
    }

    /// Removes the most recently picked seat
    pub fn remove_last(&mut self) -> Option<SeatId> {
        self.seats.pop()
    }

    /// Deselects everything
    pub fn clear(&mut self) {
        self.seats.clear();
    }

    /// Keeps only the ids for which `keep` returns `true`, preserving order
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&SeatId) -> bool,
    {
        self.seats.retain(|id| keep(id));
    }

    /// Drops seats from the end until at most `max` remain
    pub fn truncate(&mut self, max: usize) -> Vec<SeatId> {
        if self.seats.len() <= max {
            return Vec::new();
        }
        self.seats.split_off(max)
    }
}

impl FromIterator<SeatId> for Selection {
    fn from_iter<I: IntoIterator<Item = SeatId>>(iter: I) -> Self {
        let mut selection = Self::new();
        for id in iter {
            selection.insert(id);
        }
        selection
    }
}

// ============================================================================
// Inventory generation
// ============================================================================

/// Largest row count [`generate_seats`] will lay out
pub const MAX_TOTAL_ROWS: u32 = 999;

/// Inputs of [`generate_seats`]
///
/// `total_rows == 0` means no seat map data has arrived yet. Counts above
/// [`MAX_TOTAL_ROWS`] are clamped.
#[derive(Clone, Copy, Debug)]
pub struct SeatMapInput<'a> {
    /// Number of rows
    pub total_rows: u32,
    /// Column letters, left to right
    pub seat_labels: &'a [char],
    /// Row tags; rows outside `1..=total_rows` are ignored
    pub row_attributes: &'a RowAttributes,
    /// Sold seats
    pub occupied: &'a BTreeSet<SeatId>,
    /// Seats blocked by the carrier
    pub unavailable: &'a BTreeSet<SeatId>,
    /// Current user's picks
    pub selected: &'a Selection,
    /// Sparse per-seat price overrides
    pub seat_prices: &'a SeatPrices,
    /// Fallback price for ordinary seats
    pub base_price: Option<Money>,
    /// Fallback price for exit and extra legroom seats
    pub extra_legroom_price: Option<Money>,
    /// Cabin class row ranges
    pub boundaries: ClassBoundaries,
}

/// Derives the complete seat inventory
///
/// Seats come out row by row, columns in label order (`1A, 1B, ... 2A`).
/// Repeated labels are collapsed so every id is unique. A seat that is both
/// occupied and selected is reported as occupied.
#[must_use]
pub fn generate_seats(input: &SeatMapInput<'_>) -> Vec<Seat> {
    if input.total_rows == 0 {
        return Vec::new();
    }

    let mut labels: Vec<char> = Vec::with_capacity(input.seat_labels.len());
    for label in input.seat_labels {
        let label = label.to_ascii_uppercase();
        if !labels.contains(&label) {
            labels.push(label);
        }
    }

    let total_rows = if input.total_rows > MAX_TOTAL_ROWS {
        tracing::warn!(
            total_rows = input.total_rows,
            max = MAX_TOTAL_ROWS,
            "Clamping row count to the largest supported seat map"
        );
        MAX_TOTAL_ROWS
    } else {
        input.total_rows
    };

    for row in input.row_attributes.keys() {
        if *row == 0 || *row > total_rows {
            tracing::debug!(
                row,
                total_rows,
                "Ignoring attributes for row outside the seat map"
            );
        }
    }

    let no_tags = BTreeSet::new();
    let mut seats = Vec::with_capacity((total_rows as usize).saturating_mul(labels.len()));

    for row in 1..=total_rows {
        let tags = input.row_attributes.get(&row).unwrap_or(&no_tags);
        let class = input.boundaries.classify(row);

        for &column in &labels {
            let id = SeatId::new(row, column);
            seats.push(Seat {
                id,
                row,
                column,
                class,
                status: derive_status(&id, input),
                price: resolve_seat_price(
                    &id,
                    input.row_attributes,
                    input.seat_prices,
                    input.base_price,
                    input.extra_legroom_price,
                ),
                attributes: tags.clone(),
                is_exit_row: tags.contains(&RowAttribute::Exit),
                is_extra_legroom: tags.contains(&RowAttribute::Extra),
            });
        }
    }

    tracing::trace!(seats = seats.len(), "Generated seat inventory");
    seats
}

/// Status precedence: occupied, unavailable, selected, available
fn derive_status(id: &SeatId, input: &SeatMapInput<'_>) -> SeatStatus {
    if input.occupied.contains(id) {
        SeatStatus::Occupied
    } else if input.unavailable.contains(id) {
        SeatStatus::Unavailable
    } else if input.selected.contains(id) {
        SeatStatus::Selected
    } else {
        SeatStatus::Available
    }
}

// ============================================================================
// Pricing
// ============================================================================

/// Resolves the price of one seat
///
/// Precedence: explicit per-seat price, then `extra_legroom_price` when the
/// row is tagged exit or extra, then `base_price`. A special row with no
/// extra price configured falls back to `base_price`; nothing configured at
/// all yields zero.
#[must_use]
pub fn resolve_seat_price(
    seat_id: &SeatId,
    row_attributes: &RowAttributes,
    seat_prices: &SeatPrices,
    base_price: Option<Money>,
    extra_legroom_price: Option<Money>,
) -> Money {
    if let Some(price) = seat_prices.get(seat_id) {
        return *price;
    }

    let special_row = row_attributes
        .get(&seat_id.row())
        .is_some_and(|tags| tags.iter().any(RowAttribute::is_special));

    let fallback = if special_row {
        extra_legroom_price.or(base_price)
    } else {
        base_price
    };

    fallback.unwrap_or(Money::ZERO)
}

// ============================================================================
// Eligibility
// ============================================================================

/// Restrictions on exit and extra legroom seats
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityRules {
    /// Youngest age allowed in an exit or extra legroom row
    pub min_exit_row_age: u32,
}

impl Default for EligibilityRules {
    fn default() -> Self {
        Self { min_exit_row_age: 15 }
    }
}

/// Why a seat could not be selected
///
/// These are expected outcomes shown to the user, not failures; the
/// `Display` text is the user-facing reason.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionRejection {
    /// Seat is occupied, blocked, or not on the map
    #[error("seat {seat} is not selectable")]
    NotSelectable {
        /// Rejected seat
        seat: SeatId,
    },

    /// Selection already holds one seat per seat-eligible passenger
    #[error("you can select at most {max_seats} seat(s) for this booking")]
    SeatLimitReached {
        /// Limit for this booking
        max_seats: usize,
    },

    /// No passenger snapshot to check special-seat rules against
    #[error("passenger information missing")]
    PassengerMissing,

    /// Passenger younger than the exit row minimum
    #[error("passenger must be at least {min_age} years old to sit in an exit or extra legroom row")]
    BelowMinimumAge {
        /// Minimum age
        min_age: u32,
    },

    /// Pregnant passenger
    #[error("pregnant passengers cannot sit in an exit or extra legroom row")]
    Pregnant,

    /// Passenger is, or travels with, an infant
    #[error("passengers travelling with an infant cannot sit in an exit or extra legroom row")]
    TravelingWithInfant,

    /// Passenger needs mobility assistance
    #[error("passengers with reduced mobility cannot sit in an exit or extra legroom row")]
    ReducedMobility,
}

impl SelectionRejection {
    /// User-facing explanation
    #[must_use]
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

/// Decides whether `seat` may be added to `selection`
///
/// Checks run in a fixed order and stop at the first failure: seat status,
/// capacity, then (for exit and extra legroom seats) the passenger. A seat
/// that is already selected always passes, since toggling it only removes it.
///
/// # Errors
///
/// Returns the [`SelectionRejection`] describing the first failed check.
pub fn can_select(
    seat: &Seat,
    selection: &Selection,
    max_seats: usize,
    passenger: Option<&PassengerProfile>,
    rules: &EligibilityRules,
) -> Result<(), SelectionRejection> {
    if !seat.status.is_selectable() {
        return Err(SelectionRejection::NotSelectable { seat: seat.id });
    }

    if selection.contains(&seat.id) {
        return Ok(());
    }

    if selection.len() >= max_seats {
        return Err(SelectionRejection::SeatLimitReached { max_seats });
    }

    if seat.is_special() {
        check_special_seat_eligibility(passenger, rules)?;
    }

    Ok(())
}

fn check_special_seat_eligibility(
    passenger: Option<&PassengerProfile>,
    rules: &EligibilityRules,
) -> Result<(), SelectionRejection> {
    let Some(passenger) = passenger else {
        return Err(SelectionRejection::PassengerMissing);
    };

    if passenger.age < rules.min_exit_row_age {
        return Err(SelectionRejection::BelowMinimumAge {
            min_age: rules.min_exit_row_age,
        });
    }
    if passenger.is_pregnant {
        return Err(SelectionRejection::Pregnant);
    }
    if passenger.traveling_with_infant || passenger.passenger_type == PassengerType::Infant {
        return Err(SelectionRejection::TravelingWithInfant);
    }
    if passenger.reduced_mobility {
        return Err(SelectionRejection::ReducedMobility);
    }

    Ok(())
}

// ============================================================================
// Selection transitions
// ============================================================================

/// Result of [`toggle_selection`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Seat was added to the selection
    Selected(SeatId),
    /// Seat was removed from the selection
    Deselected(SeatId),
    /// Selection is unchanged
    Rejected(SelectionRejection),
}

impl ToggleOutcome {
    /// The rejection, if the toggle was refused
    #[must_use]
    pub const fn rejection(&self) -> Option<&SelectionRejection> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            Self::Selected(_) | Self::Deselected(_) => None,
        }
    }
}

/// Selects or deselects `seat_id`
///
/// Removal is always allowed. Adding consults [`can_select`] and leaves the
/// selection untouched on rejection. Ids missing from `seats` cannot be added.
pub fn toggle_selection(
    seat_id: SeatId,
    seats: &[Seat],
    selection: &mut Selection,
    max_seats: usize,
    passenger: Option<&PassengerProfile>,
    rules: &EligibilityRules,
) -> ToggleOutcome {
    if selection.remove(&seat_id) {
        return ToggleOutcome::Deselected(seat_id);
    }

    let Some(seat) = seats.iter().find(|s| s.id == seat_id) else {
        return ToggleOutcome::Rejected(SelectionRejection::NotSelectable { seat: seat_id });
    };

    match can_select(seat, selection, max_seats, passenger, rules) {
        Ok(()) => {
            selection.insert(seat_id);
            ToggleOutcome::Selected(seat_id)
        },
        Err(rejection) => ToggleOutcome::Rejected(rejection),
    }
}

/// Intersects the selection with a freshly generated inventory
///
/// Ids that vanished or became occupied/unavailable are removed and
/// returned in selection order.
pub fn reconcile_selection(selection: &mut Selection, seats: &[Seat]) -> Vec<SeatId> {
    let statuses: BTreeMap<SeatId, SeatStatus> = seats.iter().map(|s| (s.id, s.status)).collect();

    let mut dropped = Vec::new();
    selection.retain(|id| {
        let keep = statuses.get(id).is_some_and(SeatStatus::is_selectable);
        if !keep {
            dropped.push(*id);
        }
        keep
    });
    dropped
}

/// Seat limit for a booking: one seat per seat-eligible passenger
#[must_use]
pub fn max_seats_for(passengers: &[PassengerProfile]) -> usize {
    passengers.iter().filter(|p| p.is_seat_eligible()).count()
}

/// Count and total price of the current selection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSummary {
    /// Selected seats found in the inventory
    pub count: usize,
    /// Sum of their prices
    pub total: Money,
}

/// Summarizes the selected seats present in `seats`
#[must_use]
pub fn summarize(selection: &Selection, seats: &[Seat]) -> SelectionSummary {
    let picked: Vec<&Seat> = seats.iter().filter(|s| selection.contains(&s.id)).collect();
    SelectionSummary {
        count: picked.len(),
        total: picked.iter().map(|s| s.price).sum(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const LABELS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

    fn id(s: &str) -> SeatId {
        s.parse().unwrap()
    }

    fn tags(pairs: &[(u32, RowAttribute)]) -> RowAttributes {
        let mut attributes = RowAttributes::new();
        for (row, tag) in pairs {
            attributes.entry(*row).or_default().insert(*tag);
        }
        attributes
    }

    struct Fixture {
        attributes: RowAttributes,
        occupied: BTreeSet<SeatId>,
        unavailable: BTreeSet<SeatId>,
        selected: Selection,
        prices: SeatPrices,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                attributes: tags(&[(10, RowAttribute::Exit), (12, RowAttribute::Extra)]),
                occupied: BTreeSet::new(),
                unavailable: BTreeSet::new(),
                selected: Selection::new(),
                prices: SeatPrices::new(),
            }
        }

        fn seats(&self, total_rows: u32) -> Vec<Seat> {
            generate_seats(&SeatMapInput {
                total_rows,
                seat_labels: &LABELS,
                row_attributes: &self.attributes,
                occupied: &self.occupied,
                unavailable: &self.unavailable,
                selected: &self.selected,
                seat_prices: &self.prices,
                base_price: Some(Money::new(50_000)),
                extra_legroom_price: Some(Money::new(150_000)),
                boundaries: ClassBoundaries::default(),
            })
        }
    }

    fn seat<'a>(seats: &'a [Seat], s: &str) -> &'a Seat {
        seats.iter().find(|seat| seat.id == id(s)).unwrap()
    }

    #[test]
    fn classify_row_boundaries() {
        assert_eq!(classify_row(1), SeatClass::First);
        assert_eq!(classify_row(3), SeatClass::First);
        assert_eq!(classify_row(4), SeatClass::Business);
        assert_eq!(classify_row(8), SeatClass::Business);
        assert_eq!(classify_row(9), SeatClass::Premium);
        assert_eq!(classify_row(15), SeatClass::Premium);
        assert_eq!(classify_row(16), SeatClass::Economy);
        assert_eq!(classify_row(30), SeatClass::Economy);
    }

    #[test]
    fn custom_boundaries_shift_classes() {
        let boundaries = ClassBoundaries {
            first_last_row: 1,
            business_last_row: 2,
            premium_last_row: 4,
        };
        assert_eq!(boundaries.classify(2), SeatClass::Business);
        assert_eq!(boundaries.classify(5), SeatClass::Economy);
    }

    #[test]
    fn generates_row_major_inventory() {
        let seats = Fixture::new().seats(30);
        assert_eq!(seats.len(), 180);
        assert_eq!(seats[0].id, id("1A"));
        assert_eq!(seats[5].id, id("1F"));
        assert_eq!(seats[6].id, id("2A"));
        assert_eq!(seats[179].id, id("30F"));

        let unique: BTreeSet<SeatId> = seats.iter().map(|s| s.id).collect();
        assert_eq!(unique.len(), seats.len());
    }

    #[test]
    fn zero_rows_means_no_data_yet() {
        assert!(Fixture::new().seats(0).is_empty());
    }

    #[test]
    fn oversized_row_count_is_clamped() {
        let seats = Fixture::new().seats(4_000_000_000);
        assert_eq!(seats.len(), MAX_TOTAL_ROWS as usize * LABELS.len());
        assert_eq!(seats.last().unwrap().row, MAX_TOTAL_ROWS);
    }

    #[test]
    fn repeated_labels_are_collapsed() {
        let fixture = Fixture::new();
        let seats = generate_seats(&SeatMapInput {
            total_rows: 2,
            seat_labels: &['A', 'B', 'a'],
            row_attributes: &fixture.attributes,
            occupied: &fixture.occupied,
            unavailable: &fixture.unavailable,
            selected: &fixture.selected,
            seat_prices: &fixture.prices,
            base_price: None,
            extra_legroom_price: None,
            boundaries: ClassBoundaries::default(),
        });
        let ids: Vec<String> = seats.iter().map(|s| s.id.to_string()).collect();
        assert_eq!(ids, vec!["1A", "1B", "2A", "2B"]);
    }

    #[test]
    fn generation_is_deterministic() {
        let fixture = Fixture::new();
        assert_eq!(fixture.seats(30), fixture.seats(30));
    }

    #[test]
    fn status_precedence() {
        let mut fixture = Fixture::new();
        fixture.occupied.insert(id("5B"));
        fixture.unavailable.insert(id("5C"));
        fixture.unavailable.insert(id("5B"));
        fixture.selected = [id("5B"), id("5C"), id("5D")].into_iter().collect();

        let seats = fixture.seats(30);
        assert_eq!(seat(&seats, "5B").status, SeatStatus::Occupied);
        assert_eq!(seat(&seats, "5C").status, SeatStatus::Unavailable);
        assert_eq!(seat(&seats, "5D").status, SeatStatus::Selected);
        assert_eq!(seat(&seats, "5E").status, SeatStatus::Available);
    }

    #[test]
    fn row_tags_flag_seats() {
        let seats = Fixture::new().seats(30);
        let exit = seat(&seats, "10A");
        assert!(exit.is_exit_row);
        assert!(!exit.is_extra_legroom);
        assert_eq!(exit.class, SeatClass::Premium);

        let extra = seat(&seats, "12F");
        assert!(extra.is_extra_legroom);
        assert!(extra.is_special());

        assert!(!seat(&seats, "11A").is_special());
    }

    #[test]
    fn out_of_range_row_attributes_are_ignored() {
        let mut fixture = Fixture::new();
        fixture.attributes = tags(&[(0, RowAttribute::Exit), (31, RowAttribute::Exit)]);
        let seats = fixture.seats(30);
        assert_eq!(seats.len(), 180);
        assert!(seats.iter().all(|s| !s.is_exit_row));
    }

    #[test]
    fn price_precedence() {
        let attributes = tags(&[(10, RowAttribute::Exit), (11, RowAttribute::Business)]);
        let mut prices = SeatPrices::new();
        prices.insert(id("10B"), Money::new(99_000));
        let base = Some(Money::new(50_000));
        let extra = Some(Money::new(150_000));

        let price = |seat: &str, base: Option<Money>, extra: Option<Money>| {
            resolve_seat_price(&id(seat), &attributes, &prices, base, extra)
        };

        assert_eq!(price("10B", base, extra), Money::new(99_000));
        assert_eq!(price("10A", base, extra), Money::new(150_000));
        assert_eq!(price("11A", base, extra), Money::new(50_000));
        assert_eq!(price("10A", base, None), Money::new(50_000));
        assert_eq!(price("20A", None, None), Money::ZERO);
    }

    #[test]
    fn occupied_and_unavailable_seats_are_not_selectable() {
        let mut fixture = Fixture::new();
        fixture.occupied.insert(id("2A"));
        fixture.unavailable.insert(id("2B"));
        let seats = fixture.seats(30);
        let adult = PassengerProfile::adult(30);
        let rules = EligibilityRules::default();

        for s in ["2A", "2B"] {
            assert_eq!(
                can_select(seat(&seats, s), &Selection::new(), 2, Some(&adult), &rules),
                Err(SelectionRejection::NotSelectable { seat: id(s) })
            );
        }
    }

    #[test]
    fn capacity_is_checked_before_eligibility() {
        let seats = Fixture::new().seats(30);
        let selection: Selection = [id("20A")].into_iter().collect();
        let result = can_select(
            seat(&seats, "10A"),
            &selection,
            1,
            Some(&PassengerProfile::child(8)),
            &EligibilityRules::default(),
        );
        assert_eq!(result, Err(SelectionRejection::SeatLimitReached { max_seats: 1 }));
        assert!(result.unwrap_err().reason().contains("at most 1"));
    }

    #[test]
    fn already_selected_seat_passes_even_at_capacity() {
        let mut fixture = Fixture::new();
        fixture.selected = [id("20A")].into_iter().collect();
        let seats = fixture.seats(30);
        let result = can_select(
            seat(&seats, "20A"),
            &fixture.selected,
            1,
            None,
            &EligibilityRules::default(),
        );
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn exit_row_age_limit() {
        let seats = Fixture::new().seats(30);
        let rules = EligibilityRules::default();
        let exit = seat(&seats, "10A");

        let child = PassengerProfile::child(14);
        let rejection = can_select(exit, &Selection::new(), 1, Some(&child), &rules).unwrap_err();
        assert_eq!(rejection, SelectionRejection::BelowMinimumAge { min_age: 15 });
        assert!(rejection.reason().contains("at least 15"));

        assert_eq!(
            can_select(exit, &Selection::new(), 1, Some(&PassengerProfile::adult(15)), &rules),
            Ok(())
        );
    }

    #[test]
    fn special_seat_disqualifiers_in_order() {
        let seats = Fixture::new().seats(30);
        let rules = EligibilityRules::default();
        let extra = seat(&seats, "12C");
        let check = |p: &PassengerProfile| can_select(extra, &Selection::new(), 1, Some(p), &rules);

        let everything = PassengerProfile {
            is_pregnant: true,
            traveling_with_infant: true,
            reduced_mobility: true,
            ..PassengerProfile::adult(30)
        };
        assert_eq!(check(&everything), Err(SelectionRejection::Pregnant));

        let infant_and_mobility = PassengerProfile {
            is_pregnant: false,
            ..everything.clone()
        };
        assert_eq!(check(&infant_and_mobility), Err(SelectionRejection::TravelingWithInfant));

        let mobility = PassengerProfile {
            traveling_with_infant: false,
            ..infant_and_mobility
        };
        assert_eq!(check(&mobility), Err(SelectionRejection::ReducedMobility));

        let infant = PassengerProfile {
            age: 20,
            ..PassengerProfile::infant()
        };
        assert_eq!(check(&infant), Err(SelectionRejection::TravelingWithInfant));
    }

    #[test]
    fn special_seat_requires_passenger() {
        let seats = Fixture::new().seats(30);
        let rules = EligibilityRules::default();
        assert_eq!(
            can_select(seat(&seats, "10C"), &Selection::new(), 1, None, &rules),
            Err(SelectionRejection::PassengerMissing)
        );
        assert_eq!(can_select(seat(&seats, "20C"), &Selection::new(), 1, None, &rules), Ok(()));
    }

    #[test]
    fn toggle_adds_then_removes() {
        let seats = Fixture::new().seats(30);
        let rules = EligibilityRules::default();
        let adult = PassengerProfile::adult(40);
        let mut selection: Selection = [id("20A")].into_iter().collect();
        let original = selection.clone();

        let first = toggle_selection(id("21C"), &seats, &mut selection, 2, Some(&adult), &rules);
        assert_eq!(first, ToggleOutcome::Selected(id("21C")));
        assert_eq!(selection.as_slice(), &[id("20A"), id("21C")]);

        let second = toggle_selection(id("21C"), &seats, &mut selection, 2, Some(&adult), &rules);
        assert_eq!(second, ToggleOutcome::Deselected(id("21C")));
        assert_eq!(selection, original);
    }

    #[test]
    fn toggle_off_ignores_limit_and_eligibility() {
        let mut fixture = Fixture::new();
        fixture.selected = [id("10A")].into_iter().collect();
        let seats = fixture.seats(30);
        let mut selection = fixture.selected.clone();

        let outcome = toggle_selection(
            id("10A"),
            &seats,
            &mut selection,
            0,
            Some(&PassengerProfile::child(5)),
            &EligibilityRules::default(),
        );
        assert_eq!(outcome, ToggleOutcome::Deselected(id("10A")));
        assert!(selection.is_empty());
    }

    #[test]
    fn rejected_toggle_leaves_selection_unchanged() {
        let seats = Fixture::new().seats(30);
        let mut selection = Selection::new();
        let outcome = toggle_selection(
            id("10A"),
            &seats,
            &mut selection,
            1,
            Some(&PassengerProfile::child(10)),
            &EligibilityRules::default(),
        );
        assert!(outcome.rejection().is_some());
        assert!(selection.is_empty());
    }

    #[test]
    fn toggle_unknown_seat_is_rejected() {
        let seats = Fixture::new().seats(30);
        let mut selection = Selection::new();
        let outcome = toggle_selection(
            id("31A"),
            &seats,
            &mut selection,
            1,
            None,
            &EligibilityRules::default(),
        );
        assert_eq!(
            outcome,
            ToggleOutcome::Rejected(SelectionRejection::NotSelectable { seat: id("31A") })
        );
    }

    #[test]
    fn reconcile_drops_occupied_and_vanished_seats() {
        let mut fixture = Fixture::new();
        fixture.selected = [id("3A"), id("25C"), id("4B")].into_iter().collect();
        fixture.occupied.insert(id("3A"));
        let seats = fixture.seats(20);

        let mut selection = fixture.selected.clone();
        let dropped = reconcile_selection(&mut selection, &seats);
        assert_eq!(dropped, vec![id("3A"), id("25C")]);
        assert_eq!(selection.as_slice(), &[id("4B")]);
    }

    #[test]
    fn selection_keeps_pick_order() {
        let mut selection = Selection::new();
        assert!(selection.insert(id("3A")));
        assert!(selection.insert(id("1A")));
        assert!(!selection.insert(id("3A")));
        assert_eq!(selection.remove_last(), Some(id("1A")));
        assert_eq!(selection.as_slice(), &[id("3A")]);
    }

    #[test]
    fn truncate_drops_latest_picks() {
        let mut selection: Selection = [id("1A"), id("1B"), id("1C")].into_iter().collect();
        assert_eq!(selection.truncate(1), vec![id("1B"), id("1C")]);
        assert!(selection.truncate(3).is_empty());
    }

    #[test]
    fn max_seats_excludes_lap_infants() {
        let passengers = [
            PassengerProfile::adult(35),
            PassengerProfile::child(6),
            PassengerProfile::infant(),
        ];
        assert_eq!(max_seats_for(&passengers), 2);
    }

    #[test]
    fn summary_totals_selected_prices() {
        let mut fixture = Fixture::new();
        fixture.selected = [id("10A"), id("20A")].into_iter().collect();
        let seats = fixture.seats(30);
        let summary = summarize(&fixture.selected, &seats);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.total, Money::new(200_000));
    }
}
