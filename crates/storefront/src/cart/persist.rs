//! Stored representation of the cart.
//!
//! The cart is kept as a JSON array of
//! `{"id", "name", "price", "image", "quantity", "size"}` objects. Data
//! written by older releases may be loosely typed, so validation coerces
//! each field and drops entries without an integer `id` and a string `name`.

use floa_core::{Price, ProductId, ShoeSize};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::line::{CartLine, NewCartLine, merge_into};
use crate::storage::{Rejection, StorageError, Stored, Validated, encode_json};

/// The persisted cart line collection.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct CartLines(pub(crate) Vec<CartLine>);

#[derive(Serialize)]
struct StoredLine<'a> {
    id: i64,
    name: &'a str,
    #[serde(serialize_with = "price_as_number")]
    price: Decimal,
    image: Option<&'a str>,
    quantity: u32,
    size: Option<&'a str>,
}

impl<'a> From<&'a CartLine> for StoredLine<'a> {
    fn from(line: &'a CartLine) -> Self {
        Self {
            id: line.product_id().as_i64(),
            name: line.name(),
            price: line.unit_price().amount(),
            image: line.image(),
            quantity: line.quantity(),
            size: line.variant().map(ShoeSize::as_str),
        }
    }
}

/// Write `price` as a JSON number.
///
/// The value goes through `f64`, so it is exact only up to 15 significant
/// digits. Longer prices are stored rounded to the nearest `f64`.
fn price_as_number<S: Serializer>(price: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    let number = price.to_string().parse::<f64>().unwrap_or(0.0);
    serializer.serialize_f64(number)
}

/// Encode cart lines in their stored form.
pub(crate) fn encode_lines(lines: &[CartLine]) -> Result<String, StorageError> {
    let stored: Vec<StoredLine<'_>> = lines.iter().map(StoredLine::from).collect();
    encode_json(&stored)
}

impl Stored for CartLines {
    fn validate(raw: &str) -> Validated<Self> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => return Validated::UseDefault(Rejection::Unparseable(e.to_string())),
        };
        let Value::Array(entries) = value else {
            return Validated::UseDefault(Rejection::WrongShape("an array of cart lines"));
        };

        let mut lines = Vec::with_capacity(entries.len());
        let mut dropped = 0_usize;
        for entry in &entries {
            match coerce_line(entry) {
                Some(line) => merge_into(&mut lines, line),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            tracing::debug!(dropped, kept = lines.len(), "Dropped malformed cart entries");
        }

        Validated::Valid(Self(lines))
    }

    fn encode(&self) -> Result<String, StorageError> {
        encode_lines(&self.0)
    }
}

fn coerce_line(entry: &Value) -> Option<CartLine> {
    let fields = entry.as_object()?;
    let id = fields.get("id").and_then(as_integer)?;
    let name = fields.get("name")?.as_str()?;

    let unit_price = fields
        .get("price")
        .and_then(as_decimal)
        .map_or(Price::ZERO, Price::saturating);
    let quantity = fields.get("quantity").map_or(1, as_quantity);
    let image = fields
        .get("image")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let variant = fields.get("size").and_then(as_size);

    let item = NewCartLine {
        product_id: ProductId::new(id),
        name: name.to_owned(),
        unit_price,
        image,
        variant,
    };
    Some(CartLine::new(item, quantity))
}

#[allow(clippy::cast_possible_truncation)]
fn as_integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
            .map(|f| f as i64)
    })
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) if s.trim().is_empty() => Some(Decimal::ZERO),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    s.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn as_quantity(value: &Value) -> u32 {
    match value {
        Value::Number(n) => n.as_i64().map_or_else(
            || n.as_f64().map_or(u32::MAX, clamp_quantity),
            |i| u32::try_from(i.max(1)).unwrap_or(u32::MAX),
        ),
        Value::String(s) => s.trim().parse::<f64>().map_or(1, clamp_quantity),
        _ => 1,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_quantity(value: f64) -> u32 {
    if value.is_nan() || value < 1.0 {
        1
    } else if value >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        value as u32
    }
}

fn as_size(value: &Value) -> Option<ShoeSize> {
    match value {
        Value::String(s) => ShoeSize::parse(s).ok(),
        Value::Number(n) => ShoeSize::parse(&n.to_string()).ok(),
        _ => None,
    }
}
