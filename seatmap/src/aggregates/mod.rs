//! Aggregate reducers for the seat map engine.
//!
//! - Seat selection: seat map loading, passenger eligibility and the user's picks

pub mod seat_selection;

pub use seat_selection::{
    SeatSelectionAction, SeatSelectionEnvironment, SeatSelectionReducer, SeatSelectionState,
};
