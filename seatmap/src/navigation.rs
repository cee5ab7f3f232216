//! Focus movement across the seat grid.
//!
//! Arrow-key navigation is a walk over the derived inventory: each step moves
//! one row or one column and skips cells that cannot be picked.

use crate::types::{Seat, SeatId, SeatStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Direction of a focus move
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards row 1
    Up,
    /// Towards the last row
    Down,
    /// Towards the first column label
    Left,
    /// Towards the last column label
    Right,
}

/// Row/column index over a generated seat inventory
#[derive(Clone, Debug)]
pub struct SeatGrid {
    total_rows: u32,
    labels: Vec<char>,
    statuses: BTreeMap<SeatId, SeatStatus>,
}

impl SeatGrid {
    /// Indexes `seats` laid out in `labels` column order
    #[must_use]
    pub fn new(seats: &[Seat], labels: &[char]) -> Self {
        let mut columns: Vec<char> = Vec::with_capacity(labels.len());
        for label in labels {
            let label = label.to_ascii_uppercase();
            if !columns.contains(&label) {
                columns.push(label);
            }
        }

        Self {
            total_rows: seats.iter().map(|s| s.row).max().unwrap_or(0),
            labels: columns,
            statuses: seats.iter().map(|s| (s.id, s.status)).collect(),
        }
    }

    fn is_focusable(&self, id: &SeatId) -> bool {
        self.statuses.get(id).is_some_and(SeatStatus::is_selectable)
    }

    /// First selectable seat in row-major order
    #[must_use]
    pub fn first_focusable(&self) -> Option<SeatId> {
        (1..=self.total_rows)
            .flat_map(|row| self.labels.iter().map(move |&column| SeatId::new(row, column)))
            .find(|id| self.is_focusable(id))
    }

    /// Next selectable seat from `from` in `direction`
    ///
    /// Returns `None` when the walk reaches the grid edge without finding one,
    /// or when `from` is not on the grid.
    #[must_use]
    pub fn next_focus(&self, from: SeatId, direction: Direction) -> Option<SeatId> {
        let mut row = from.row();
        let mut column = self.labels.iter().position(|&c| c == from.column())?;
        if row == 0 || row > self.total_rows {
            return None;
        }

        loop {
            match direction {
                Direction::Up => row = row.checked_sub(1).filter(|r| *r >= 1)?,
                Direction::Down => row = Some(row + 1).filter(|r| *r <= self.total_rows)?,
                Direction::Left => column = column.checked_sub(1)?,
                Direction::Right => {
                    column = Some(column + 1).filter(|c| *c < self.labels.len())?;
                },
            }

            let candidate = SeatId::new(row, self.labels[column]);
            if self.is_focusable(&candidate) {
                return Some(candidate);
            }
        }
    }
}
