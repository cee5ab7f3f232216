//! Backend seat map payload.
//!
//! The backend response is decoded leniently: a malformed field is skipped
//! with a warning so a partially broken payload still renders a usable map.
//! Only a document that is not a JSON object of the expected shape fails.

use crate::config::SeatMapConfig;
use crate::engine::{SeatMapInput, Selection};
use crate::types::{Money, RowAttribute, RowAttributes, SeatId, SeatPrices};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Payload decoding errors
#[derive(Error, Debug)]
pub enum PayloadError {
    /// Document is not JSON or not an object of the response shape
    #[error("invalid seat map payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raw seat map response as sent by the backend
///
/// Every field is optional and loosely typed, so one mistyped field never
/// rejects the whole document. Row counts and prices may be numbers or
/// numeric strings. A row's tags may be a list or a single string.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeatMapResponse {
    /// Number of rows on the aircraft
    pub total_rows: Option<Value>,
    /// Sold seat ids
    #[serde(deserialize_with = "lenient")]
    pub occupied_seats: Option<Vec<Value>>,
    /// Seat ids blocked by the carrier
    #[serde(deserialize_with = "lenient")]
    pub blocked_seats: Option<Vec<Value>>,
    /// Per-seat prices keyed by seat id
    #[serde(deserialize_with = "lenient")]
    pub seat_prices: Option<BTreeMap<String, Value>>,
    /// Row tags keyed by row number
    #[serde(deserialize_with = "lenient")]
    pub row_attributes: Option<BTreeMap<String, Value>>,
    /// Price of an ordinary seat
    pub base_price: Option<Value>,
    /// Price of an exit or extra legroom seat
    pub extra_legroom_price: Option<Value>,
}

/// Deserializes a field, dropping it with a warning if it has the wrong shape
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(field) => Ok(Some(field)),
        Err(error) => {
            tracing::warn!(%error, "Ignoring malformed seat map field");
            Ok(None)
        },
    }
}

/// Validated seat map data
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatMapData {
    /// Row count, if the backend sent a usable one
    pub total_rows: Option<u32>,
    /// Sold seats
    pub occupied: BTreeSet<SeatId>,
    /// Blocked seats
    pub unavailable: BTreeSet<SeatId>,
    /// Per-seat price overrides
    pub seat_prices: SeatPrices,
    /// Row tags
    pub row_attributes: RowAttributes,
    /// Ordinary seat price
    pub base_price: Option<Money>,
    /// Exit and extra legroom seat price
    pub extra_legroom_price: Option<Money>,
}

impl SeatMapResponse {
    /// Converts the raw response, skipping every malformed entry
    #[must_use]
    pub fn decode(self) -> SeatMapData {
        let total_rows = self.total_rows.as_ref().and_then(row_count);

        let mut seat_prices = SeatPrices::new();
        for (raw_id, raw_price) in self.seat_prices.iter().flatten() {
            let Some(id) = parse_seat_id(raw_id, "seatPrices") else {
                continue;
            };
            match price_value(raw_price) {
                Some(price) => {
                    seat_prices.insert(id, price);
                },
                None if raw_price.is_null() => {},
                None => {
                    tracing::warn!(seat = %id, price = %raw_price, "Ignoring invalid seat price");
                },
            }
        }

        let mut row_attributes = RowAttributes::new();
        for (raw_row, raw_tags) in self.row_attributes.iter().flatten() {
            let row = match raw_row.trim().parse::<u32>() {
                Ok(row) if row >= 1 => row,
                _ => {
                    tracing::warn!(row = %raw_row, "Ignoring attributes for invalid row");
                    continue;
                },
            };
            let tags: &[Value] = match raw_tags {
                Value::Array(tags) => tags,
                Value::String(_) => std::slice::from_ref(raw_tags),
                Value::Null => continue,
                other => {
                    tracing::warn!(row, tags = %other, "Ignoring malformed row attributes");
                    continue;
                },
            };
            let parsed: BTreeSet<RowAttribute> = tags
                .iter()
                .filter_map(|tag| {
                    let attribute = tag.as_str().and_then(RowAttribute::parse);
                    if attribute.is_none() {
                        tracing::debug!(row, tag = %tag, "Discarding unknown row attribute");
                    }
                    attribute
                })
                .collect();
            if !parsed.is_empty() {
                row_attributes.entry(row).or_default().extend(parsed);
            }
        }

        SeatMapData {
            total_rows,
            occupied: parse_seat_ids(self.occupied_seats.as_deref(), "occupiedSeats"),
            unavailable: parse_seat_ids(self.blocked_seats.as_deref(), "blockedSeats"),
            seat_prices,
            row_attributes,
            base_price: self.base_price.as_ref().and_then(|v| fallback_price(v, "basePrice")),
            extra_legroom_price: self
                .extra_legroom_price
                .as_ref()
                .and_then(|v| fallback_price(v, "extraLegroomPrice")),
        }
    }
}

fn parse_seat_id(raw: &str, field: &'static str) -> Option<SeatId> {
    match raw.parse() {
        Ok(id) => Some(id),
        Err(error) => {
            tracing::warn!(field, %error, "Ignoring malformed seat id");
            None
        },
    }
}

fn parse_seat_ids(raw: Option<&[Value]>, field: &'static str) -> BTreeSet<SeatId> {
    raw.unwrap_or_default()
        .iter()
        .filter_map(|value| match value {
            Value::String(s) => parse_seat_id(s, field),
            other => {
                tracing::warn!(field, seat = %other, "Ignoring non-string seat id");
                None
            },
        })
        .collect()
}

/// Whole, non-negative row count from a number or numeric string
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::float_cmp)]
fn row_count(value: &Value) -> Option<u32> {
    let rows = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    let rows = rows.and_then(|rows| u32::try_from(rows).ok());
    if rows.is_none() && !value.is_null() {
        tracing::warn!(total_rows = %value, "Ignoring invalid row count");
    }
    rows
}

fn price_value(value: &Value) -> Option<Money> {
    match value {
        Value::Number(n) => n.as_f64().and_then(Money::from_raw),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(Money::from_raw),
        _ => None,
    }
}

fn fallback_price(value: &Value, field: &'static str) -> Option<Money> {
    let price = price_value(value);
    if price.is_none() && !value.is_null() {
        tracing::warn!(field, price = %value, "Ignoring invalid price");
    }
    price
}

impl SeatMapData {
    /// Parses and decodes a JSON seat map document
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Json`] if the document is not a JSON object of
    /// the response shape. Malformed fields inside a valid document are
    /// skipped instead.
    pub fn from_json(json: &str) -> Result<Self, PayloadError> {
        let response: SeatMapResponse = serde_json::from_str(json)?;
        Ok(response.decode())
    }

    /// Engine input for this data, filling gaps from `config`
    ///
    /// A row count outside `1..=config.max_total_rows` is replaced by
    /// `config.default_total_rows`.
    #[must_use]
    pub fn to_input<'a>(
        &'a self,
        config: &'a SeatMapConfig,
        selection: &'a Selection,
    ) -> SeatMapInput<'a> {
        SeatMapInput {
            total_rows: config.effective_total_rows(self.total_rows),
            seat_labels: &config.seat_labels,
            row_attributes: &self.row_attributes,
            occupied: &self.occupied,
            unavailable: &self.unavailable,
            selected: selection,
            seat_prices: &self.seat_prices,
            base_price: Some(self.base_price.unwrap_or(config.base_price)),
            extra_legroom_price: Some(
                self.extra_legroom_price
                    .unwrap_or(config.extra_legroom_price),
            ),
            boundaries: config.boundaries,
        }
    }
}
