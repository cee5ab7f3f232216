//! Seat map sources for the selection reducer.
//!
//! The HTTP client that talks to the real backend lives outside this crate;
//! it only has to implement [`SeatMapSource`]. [`InMemorySeatMapSource`]
//! serves canned payloads for the demo binary and for tests.

use crate::aggregates::seat_selection::{FetchFuture, SeatMapSource};
use crate::payload::{PayloadError, SeatMapData};
use crate::types::FlightId;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Clone, Debug)]
struct Entry {
    result: Result<SeatMapData, String>,
    latency: Duration,
}

/// Seat map source backed by a map of canned responses
///
/// Unknown flights fail with a "not found" error.
#[derive(Debug, Default)]
pub struct InMemorySeatMapSource {
    flights: RwLock<HashMap<FlightId, Entry>>,
}

impl InMemorySeatMapSource {
    /// Creates an empty source
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `data` for `flight_id`
    #[must_use]
    pub fn with_flight(mut self, flight_id: FlightId, data: SeatMapData) -> Self {
        self.flights.get_mut().insert(
            flight_id,
            Entry {
                result: Ok(data),
                latency: Duration::ZERO,
            },
        );
        self
    }

    /// Serves the JSON document `json` for `flight_id`
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError`] if `json` is not a seat map document.
    pub fn with_json(self, flight_id: FlightId, json: &str) -> Result<Self, PayloadError> {
        let data = SeatMapData::from_json(json)?;
        Ok(self.with_flight(flight_id, data))
    }

    /// Fails every fetch of `flight_id` with `error`
    #[must_use]
    pub fn with_failure(mut self, flight_id: FlightId, error: impl Into<String>) -> Self {
        self.flights.get_mut().insert(
            flight_id,
            Entry {
                result: Err(error.into()),
                latency: Duration::ZERO,
            },
        );
        self
    }

    /// Delays responses for `flight_id` by `latency`
    #[must_use]
    pub fn with_latency(mut self, flight_id: &FlightId, latency: Duration) -> Self {
        if let Some(entry) = self.flights.get_mut().get_mut(flight_id) {
            entry.latency = latency;
        }
        self
    }

    /// Replaces the data served for `flight_id`, keeping its latency
    pub async fn update(&self, flight_id: FlightId, data: SeatMapData) {
        let mut flights = self.flights.write().await;
        let entry = flights.entry(flight_id).or_insert_with(|| Entry {
            result: Ok(SeatMapData::default()),
            latency: Duration::ZERO,
        });
        entry.result = Ok(data);
    }
}

impl SeatMapSource for InMemorySeatMapSource {
    fn fetch_seat_map(&self, flight_id: &FlightId) -> FetchFuture<'_> {
        let flight_id = flight_id.clone();
        Box::pin(async move {
            let entry = self.flights.read().await.get(&flight_id).cloned();
            let Some(entry) = entry else {
                return Err(format!("no seat map for flight {flight_id}"));
            };
            if !entry.latency.is_zero() {
                tokio::time::sleep(entry.latency).await;
            }
            entry.result
        })
    }
}
