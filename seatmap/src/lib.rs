//! Seat Map Engine - seat inventory, pricing and eligibility for flight seat selection
//!
//! Given the aircraft layout and the backend's occupancy, pricing and row
//! metadata, the engine derives the full seat inventory, prices every seat,
//! and decides whether a passenger may pick a seat. It is built on the
//! `seatmap-core` reducer model:
//!
//! - **Engine** ([`engine`]): pure functions. Inventory generation, class
//!   boundaries, price resolution, eligibility checks, selection toggling.
//! - **Payload** ([`payload`]): lenient decoding of the backend response.
//! - **Aggregate** ([`aggregates::seat_selection`]): the reducer behind a seat
//!   map screen. Fetches, passengers, picks and transient rejection notices.
//! - **Navigation** ([`navigation`]): arrow-key focus movement over the grid.
//!
//! # Architecture
//!
//! ```text
//!  backend JSON ──► SeatMapResponse::decode ──► SeatMapData
//!                                                   │
//!   passengers, selection, config ──────────────────┤
//!                                                   ▼
//!                                          generate_seats ──► Vec<Seat>
//!                                                   │
//!              ToggleSeat ──► can_select / toggle_selection ──► Selection
//! ```
//!
//! Seat status is derived, never stored: occupied beats unavailable beats
//! selected beats available, recomputed every time the inventory is built.
//!
//! # Rejections are values
//!
//! A refused pick is a [`engine::SelectionRejection`], not an error. The
//! reducer turns it into a notice that dismisses itself after
//! [`config::SeatMapConfig::notice_ttl`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregates;
pub mod config;
pub mod engine;
pub mod navigation;
pub mod payload;
pub mod source;
pub mod types;

pub use aggregates::{
    SeatSelectionAction, SeatSelectionEnvironment, SeatSelectionReducer, SeatSelectionState,
};
pub use config::{ConfigError, SeatMapConfig};
pub use engine::{
    ClassBoundaries, EligibilityRules, MAX_TOTAL_ROWS, SeatMapInput, Selection,
    SelectionRejection, SelectionSummary, ToggleOutcome, can_select, classify_row, generate_seats,
    max_seats_for, reconcile_selection, resolve_seat_price, summarize, toggle_selection,
};
pub use navigation::{Direction, SeatGrid};
pub use payload::{PayloadError, SeatMapData, SeatMapResponse};
pub use source::InMemorySeatMapSource;
pub use types::*;
