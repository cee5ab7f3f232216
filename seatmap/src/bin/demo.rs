//! Seat Map Demo
//!
//! Walks through a seat selection session against an in-memory backend:
//! - Loading a seat map through the store
//! - Picking seats for a family of three
//! - An exit row pick refused for a child
//! - Keyboard-style focus movement across the grid
//!
//! # Usage
//!
//! ```bash
//! SEATMAP_LOG_LEVEL=debug cargo run --bin demo
//! ```

use seatmap::{
    Direction, FlightId, InMemorySeatMapSource, PassengerProfile, Seat, SeatGrid, SeatId,
    SeatMapConfig, SeatSelectionAction, SeatSelectionEnvironment, SeatSelectionReducer,
    SeatSelectionState, SeatStatus,
};
use seatmap_core::environment::SystemClock;
use seatmap_runtime::Store;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SAMPLE_SEAT_MAP: &str = r#"{
    "totalRows": 18,
    "occupiedSeats": ["1A", "1B", "4C", "9D", "10A", "10F", "14B", "14C", "17E"],
    "blockedSeats": ["2F", "18A"],
    "seatPrices": {"1C": 450000, "1D": "450000", "16A": 0},
    "rowAttributes": {"10": ["exit"], "11": ["extra"], "5": ["business"], "40": ["exit"]},
    "basePrice": 50000,
    "extraLegroomPrice": 150000
}"#;

type SeatStore =
    Store<SeatSelectionState, SeatSelectionAction, SeatSelectionEnvironment, SeatSelectionReducer>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let config = SeatMapConfig::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.log_level)
                .unwrap_or_else(|_| "info,seatmap=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    config.validate()?;

    println!("\n============================================");
    println!("   Seat Map Engine - Live Demo");
    println!("============================================\n");

    let flight = FlightId::new("SM2048");
    let source = InMemorySeatMapSource::new().with_json(flight.clone(), SAMPLE_SEAT_MAP)?;
    let labels = config.seat_labels.clone();
    let environment =
        SeatSelectionEnvironment::new(Arc::new(SystemClock), Arc::new(source), config);
    let store: SeatStore = Store::new(
        SeatSelectionState::new(),
        SeatSelectionReducer::new(),
        environment,
    );

    println!("1. Loading seat map for flight {flight}...");
    store
        .send_and_wait_for(
            SeatSelectionAction::LoadSeatMap {
                flight_id: flight.clone(),
            },
            |action| {
                matches!(
                    action,
                    SeatSelectionAction::SeatMapLoaded { .. }
                        | SeatSelectionAction::SeatMapLoadFailed { .. }
                )
            },
            Duration::from_secs(5),
        )
        .await?;

    if let Some(error) = store.state(|s| s.last_error.clone()).await {
        println!("   Seat map unavailable: {error}");
        return Ok(());
    }
    print_map(&store.state(|s| s.inventory.clone()).await, &labels);

    println!("\n2. Booking for two adults and a child of 9...");
    store
        .send(SeatSelectionAction::SetPassengers {
            passengers: vec![
                PassengerProfile::adult(41),
                PassengerProfile::adult(39),
                PassengerProfile::child(9),
            ],
        })
        .await;

    for seat in ["12A", "12B"] {
        toggle(&store, seat).await?;
    }

    println!("\n3. The child tries the exit row...");
    store.send(SeatSelectionAction::SetActivePassenger { index: 2 }).await;
    toggle(&store, "10B").await?;
    toggle(&store, "12C").await?;

    println!("\n4. A fourth seat is one too many...");
    toggle(&store, "13A").await?;

    let summary = store.state(SeatSelectionState::summary).await;
    println!("\n   Selected {} seat(s), total {}", summary.count, summary.total);
    print_map(&store.state(|s| s.inventory.clone()).await, &labels);

    println!("\n5. Moving focus with the arrow keys...");
    let inventory = store.state(|s| s.inventory.clone()).await;
    let grid = SeatGrid::new(&inventory, &labels);
    let mut focus = grid.first_focusable();
    print!("   start {}", focus.map_or_else(|| "-".to_string(), |id| id.to_string()));
    for direction in [Direction::Right, Direction::Right, Direction::Down, Direction::Left] {
        focus = focus.and_then(|id| grid.next_focus(id, direction)).or(focus);
        print!(" -> {}", focus.map_or_else(|| "-".to_string(), |id| id.to_string()));
    }
    println!();

    println!("\nDemo completed.");
    Ok(())
}

async fn toggle(store: &SeatStore, seat: &str) -> Result<(), Box<dyn std::error::Error>> {
    let seat_id: SeatId = seat.parse()?;
    store.send(SeatSelectionAction::ToggleSeat { seat_id }).await;

    let (selected, reason) = store
        .state(|s| {
            (
                s.selection.contains(&seat_id),
                s.rejection_reason().map(str::to_string),
            )
        })
        .await;

    match reason {
        Some(reason) if !selected => println!("   {seat_id}: refused ({reason})"),
        _ => println!("   {seat_id}: {}", if selected { "selected" } else { "released" }),
    }
    Ok(())
}

fn print_map(seats: &[Seat], labels: &[char]) {
    let header: String = labels.iter().map(|c| format!(" {c}")).collect();
    println!("\n        {header}");
    for row in seats.chunk_by(|a, b| a.row == b.row) {
        let Some(first) = row.first() else { continue };
        let cells: String = row
            .iter()
            .map(|seat| {
                let mark = match seat.status {
                    SeatStatus::Occupied => 'x',
                    SeatStatus::Unavailable => '#',
                    SeatStatus::Selected => '*',
                    SeatStatus::Available if seat.is_special() => '+',
                    SeatStatus::Available => '.',
                };
                format!(" {mark}")
            })
            .collect();
        println!("   {:>3} {:<9}{cells}", first.row, first.class.to_string());
    }
    println!("\n   . free  + exit/extra  * selected  x occupied  # blocked");
}
