//! Seat selection aggregate.
//!
//! Owns the state behind a seat map screen: which flight is shown, the
//! latest backend data, the derived inventory, the passengers of the booking
//! and the seats they picked. Every change re-derives the inventory from
//! that state; seat status is never edited in place.
//!
//! Fetches run as [`Effect::Future`]s and are tagged with a generation
//! number. A result whose generation is no longer current belongs to a
//! superseded request and is dropped.

use crate::config::SeatMapConfig;
use crate::engine::{
    Selection, SelectionRejection, SelectionSummary, ToggleOutcome, generate_seats,
    max_seats_for, reconcile_selection, summarize, toggle_selection,
};
use crate::payload::SeatMapData;
use crate::types::{FlightId, PassengerProfile, Seat, SeatId};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use seatmap_core::{SmallVec, effect::Effect, environment::Clock, reducer::Reducer, smallvec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// Data source
// ============================================================================

/// Future returned by [`SeatMapSource::fetch_seat_map`]
pub type FetchFuture<'a> = BoxFuture<'a, Result<SeatMapData, String>>;

/// Where seat maps come from
///
/// Injected through the environment so the reducer never knows about HTTP.
/// Returns a boxed future to stay object safe.
pub trait SeatMapSource: Send + Sync {
    /// Fetches the current seat map of `flight_id`
    ///
    /// # Errors
    ///
    /// Returns a description of the failure if the backend is unreachable
    /// or has no seat map for this flight.
    fn fetch_seat_map(&self, flight_id: &FlightId) -> FetchFuture<'_>;
}

// ============================================================================
// State
// ============================================================================

/// Transient message explaining the last rejected pick
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Identifies the notice so a late dismissal cannot clear a newer one
    pub id: u64,
    /// Why the pick was refused
    pub rejection: SelectionRejection,
    /// User-facing text
    pub message: String,
    /// When the notice was raised
    pub raised_at: DateTime<Utc>,
}

/// State of one seat map screen
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatSelectionState {
    /// Flight currently shown
    pub flight_id: Option<FlightId>,
    /// Number of the latest fetch; older results are ignored
    pub generation: u64,
    /// A fetch is in flight
    pub loading: bool,
    /// Latest backend data
    pub data: Option<SeatMapData>,
    /// Derived inventory; empty until data arrives
    pub inventory: Vec<Seat>,
    /// Seats picked by the user
    pub selection: Selection,
    /// Passengers of the booking
    pub passengers: Vec<PassengerProfile>,
    /// Index into `passengers` whose eligibility applies to new picks
    pub active_passenger: Option<usize>,
    /// One seat per seat-eligible passenger
    pub max_seats: usize,
    /// Rejection shown to the user
    pub notice: Option<Notice>,
    /// Last fetch failure
    pub last_error: Option<String>,
    /// Id of the most recently raised notice
    pub last_notice_id: u64,
}

impl SeatSelectionState {
    /// Creates an empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seat by id
    #[must_use]
    pub fn seat(&self, id: &SeatId) -> Option<&Seat> {
        self.inventory.iter().find(|s| s.id == *id)
    }

    /// Passenger whose eligibility applies to new picks
    #[must_use]
    pub fn active_passenger_profile(&self) -> Option<&PassengerProfile> {
        self.active_passenger.and_then(|i| self.passengers.get(i))
    }

    /// Reason the last pick was refused, while the notice is visible
    #[must_use]
    pub fn rejection_reason(&self) -> Option<&str> {
        self.notice.as_ref().map(|n| n.message.as_str())
    }

    /// Count and total price of the selected seats
    #[must_use]
    pub fn summary(&self) -> SelectionSummary {
        summarize(&self.selection, &self.inventory)
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Inputs of the seat selection reducer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatSelectionAction {
    // Commands
    /// Show (or refresh) the seat map of a flight
    LoadSeatMap {
        /// Flight to show
        flight_id: FlightId,
    },
    /// Replace the passengers of the booking
    SetPassengers {
        /// Passengers in booking order
        passengers: Vec<PassengerProfile>,
    },
    /// Choose whose eligibility applies to new picks
    SetActivePassenger {
        /// Index into the passenger list
        index: usize,
    },
    /// Pick or un-pick a seat
    ToggleSeat {
        /// Seat clicked
        seat_id: SeatId,
    },
    /// Un-pick the most recent seat
    RemoveLastSeat,
    /// Un-pick everything
    ClearSelection,
    /// Hide a notice once its time is up
    DismissNotice {
        /// Notice to hide
        notice_id: u64,
    },

    // Fetch results
    /// Seat map arrived
    SeatMapLoaded {
        /// Flight fetched
        flight_id: FlightId,
        /// Generation of the fetch
        generation: u64,
        /// Decoded data
        data: SeatMapData,
    },
    /// Seat map fetch failed
    SeatMapLoadFailed {
        /// Flight fetched
        flight_id: FlightId,
        /// Generation of the fetch
        generation: u64,
        /// Failure description
        error: String,
    },
}

// ============================================================================
// Environment
// ============================================================================

/// Collaborators of the seat selection reducer
#[derive(Clone)]
pub struct SeatSelectionEnvironment {
    /// Clock for notice timestamps
    pub clock: Arc<dyn Clock>,
    /// Seat map backend
    pub source: Arc<dyn SeatMapSource>,
    /// Engine configuration
    pub config: SeatMapConfig,
}

impl SeatSelectionEnvironment {
    /// Creates a new `SeatSelectionEnvironment`
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        source: Arc<dyn SeatMapSource>,
        config: SeatMapConfig,
    ) -> Self {
        Self {
            clock,
            source,
            config,
        }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the seat selection aggregate
#[derive(Clone, Debug, Default)]
pub struct SeatSelectionReducer;

impl SeatSelectionReducer {
    /// Creates a new `SeatSelectionReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Re-derives the inventory from the current data and selection
    fn refresh_inventory(state: &mut SeatSelectionState, config: &SeatMapConfig) {
        state.inventory = match &state.data {
            Some(data) => generate_seats(&data.to_input(config, &state.selection)),
            None => Vec::new(),
        };
    }

    fn is_current(state: &SeatSelectionState, flight_id: &FlightId, generation: u64) -> bool {
        generation == state.generation && state.flight_id.as_ref() == Some(flight_id)
    }

    fn raise_notice(
        state: &mut SeatSelectionState,
        rejection: SelectionRejection,
        env: &SeatSelectionEnvironment,
    ) -> Effect<SeatSelectionAction> {
        state.last_notice_id += 1;
        let notice_id = state.last_notice_id;

        tracing::debug!(notice_id, reason = %rejection, "Seat selection rejected");

        state.notice = Some(Notice {
            id: notice_id,
            message: rejection.reason(),
            rejection,
            raised_at: env.clock.now(),
        });

        Effect::delay(
            env.config.notice_ttl(),
            SeatSelectionAction::DismissNotice { notice_id },
        )
    }
}

impl Reducer for SeatSelectionReducer {
    type State = SeatSelectionState;
    type Action = SeatSelectionAction;
    type Environment = SeatSelectionEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            SeatSelectionAction::LoadSeatMap { flight_id } => {
                if state.flight_id.as_ref() != Some(&flight_id) {
                    if !state.selection.is_empty() {
                        tracing::debug!(
                            flight_id = %flight_id,
                            dropped = state.selection.len(),
                            "Flight changed, clearing selection"
                        );
                    }
                    state.selection.clear();
                    state.data = None;
                    state.inventory.clear();
                    state.notice = None;
                    state.flight_id = Some(flight_id.clone());
                }

                state.generation += 1;
                state.loading = true;
                state.last_error = None;

                let generation = state.generation;
                let source = Arc::clone(&env.source);

                tracing::debug!(flight_id = %flight_id, generation, "Fetching seat map");

                smallvec![Effect::Future(Box::pin(async move {
                    match source.fetch_seat_map(&flight_id).await {
                        Ok(data) => Some(SeatSelectionAction::SeatMapLoaded {
                            flight_id,
                            generation,
                            data,
                        }),
                        Err(error) => Some(SeatSelectionAction::SeatMapLoadFailed {
                            flight_id,
                            generation,
                            error,
                        }),
                    }
                }))]
            },

            SeatSelectionAction::SeatMapLoaded {
                flight_id,
                generation,
                data,
            } => {
                if !Self::is_current(state, &flight_id, generation) {
                    tracing::debug!(
                        flight_id = %flight_id,
                        generation,
                        current = state.generation,
                        "Ignoring stale seat map"
                    );
                    return smallvec![Effect::None];
                }

                state.loading = false;
                state.last_error = None;
                state.data = Some(data);
                Self::refresh_inventory(state, &env.config);

                let dropped = reconcile_selection(&mut state.selection, &state.inventory);
                if !dropped.is_empty() {
                    tracing::debug!(
                        flight_id = %flight_id,
                        ?dropped,
                        "Dropped seats no longer available"
                    );
                }

                tracing::debug!(
                    flight_id = %flight_id,
                    generation,
                    seats = state.inventory.len(),
                    selected = state.selection.len(),
                    "Seat map loaded"
                );
                smallvec![Effect::None]
            },

            SeatSelectionAction::SeatMapLoadFailed {
                flight_id,
                generation,
                error,
            } => {
                if !Self::is_current(state, &flight_id, generation) {
                    tracing::debug!(
                        flight_id = %flight_id,
                        generation,
                        current = state.generation,
                        "Ignoring stale seat map failure"
                    );
                    return smallvec![Effect::None];
                }

                tracing::warn!(
                    flight_id = %flight_id,
                    error = %error,
                    "Seat map fetch failed"
                );
                state.loading = false;
                state.last_error = Some(error);
                smallvec![Effect::None]
            },

            SeatSelectionAction::SetPassengers { passengers } => {
                state.max_seats = max_seats_for(&passengers);
                state.passengers = passengers;

                let trimmed = state.selection.truncate(state.max_seats);
                if !trimmed.is_empty() {
                    tracing::debug!(
                        ?trimmed,
                        max_seats = state.max_seats,
                        "Selection trimmed to passenger count"
                    );
                    Self::refresh_inventory(state, &env.config);
                }

                let active_valid = state
                    .active_passenger
                    .and_then(|i| state.passengers.get(i))
                    .is_some_and(PassengerProfile::is_seat_eligible);
                if !active_valid {
                    state.active_passenger = state
                        .passengers
                        .iter()
                        .position(PassengerProfile::is_seat_eligible);
                }
                smallvec![Effect::None]
            },

            SeatSelectionAction::SetActivePassenger { index } => {
                match state.passengers.get(index) {
                    Some(passenger) if passenger.is_seat_eligible() => {
                        state.active_passenger = Some(index);
                    },
                    Some(_) => {
                        tracing::warn!(index, "Ignoring passenger who does not hold a seat");
                    },
                    None => {
                        tracing::warn!(
                            index,
                            passengers = state.passengers.len(),
                            "Ignoring unknown passenger index"
                        );
                    },
                }
                smallvec![Effect::None]
            },

            SeatSelectionAction::ToggleSeat { seat_id } => {
                let passenger = state.active_passenger.and_then(|i| state.passengers.get(i));
                let outcome = toggle_selection(
                    seat_id,
                    &state.inventory,
                    &mut state.selection,
                    state.max_seats,
                    passenger,
                    &env.config.eligibility,
                );

                match outcome {
                    ToggleOutcome::Selected(_) | ToggleOutcome::Deselected(_) => {
                        state.notice = None;
                        Self::refresh_inventory(state, &env.config);
                        smallvec![Effect::None]
                    },
                    ToggleOutcome::Rejected(rejection) => {
                        smallvec![Self::raise_notice(state, rejection, env)]
                    },
                }
            },

            SeatSelectionAction::RemoveLastSeat => {
                if state.selection.remove_last().is_some() {
                    Self::refresh_inventory(state, &env.config);
                }
                smallvec![Effect::None]
            },

            SeatSelectionAction::ClearSelection => {
                if !state.selection.is_empty() {
                    state.selection.clear();
                    Self::refresh_inventory(state, &env.config);
                }
                smallvec![Effect::None]
            },

            SeatSelectionAction::DismissNotice { notice_id } => {
                if state.notice.as_ref().is_some_and(|n| n.id == notice_id) {
                    state.notice = None;
                }
                smallvec![Effect::None]
            },
        }
    }
}
