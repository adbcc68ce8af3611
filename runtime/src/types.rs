//! Core value types: the region key, a validated price reading, and the
//! sensor record written to the hub.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;

// ─── Plausibility range ───────────────────────────────────────────────────────

/// Lowest price ($/gal) accepted as a real reading.
pub const MIN_PLAUSIBLE_PRICE: f64 = 1.00;

/// Highest price ($/gal) accepted as a real reading.
pub const MAX_PLAUSIBLE_PRICE: f64 = 10.00;

/// Prefix of the generated sensor object id.
pub const SENSOR_PREFIX: &str = "heating_oil_price";

/// Label written into the `source` attribute.
pub const SOURCE_LABEL: &str = "codoil.com";

/// Unit written into the `unit_of_measurement` attribute.
pub const UNIT_OF_MEASUREMENT: &str = "$/gal";

/// Hub device class for the sensor.
pub const DEVICE_CLASS: &str = "monetary";

/// Returns true when `value` lies inside the inclusive plausibility range.
pub fn is_plausible(value: f64) -> bool {
    value.is_finite() && (MIN_PLAUSIBLE_PRICE..=MAX_PLAUSIBLE_PRICE).contains(&value)
}

// ─── RegionKey ────────────────────────────────────────────────────────────────

/// Postal/zip code identifying the price region to query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegionKey(String);

impl RegionKey {
    /// Build a region key from raw input. Returns `None` when the trimmed
    /// value is empty.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Sensor object id, e.g. `heating_oil_price_06001`.
    pub fn sensor_object_id(&self) -> String {
        format!("{SENSOR_PREFIX}_{}", self.0)
    }

    /// Full hub entity id, e.g. `sensor.heating_oil_price_06001`.
    pub fn entity_id(&self) -> String {
        format!("sensor.{}", self.sensor_object_id())
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── PriceReading ─────────────────────────────────────────────────────────────

/// A heating-oil price in dollars per gallon.
///
/// Only constructible through [`PriceReading::new`], so every value in
/// circulation is finite and inside `[1.00, 10.00]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct PriceReading(f64);

impl PriceReading {
    /// Validate a raw value. Returns `None` for NaN, infinities, and anything
    /// outside the plausibility range.
    pub fn new(value: f64) -> Option<Self> {
        if is_plausible(value) {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Render as the hub state string. Always carries a fractional part, so
    /// `3.0` stays `"3.0"` rather than `"3"`.
    pub fn state_string(&self) -> String {
        let s = self.0.to_string();
        if s.contains('.') {
            s
        } else {
            format!("{s}.0")
        }
    }
}

impl fmt::Display for PriceReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}/gal", self.state_string())
    }
}

// ─── SensorRecord ─────────────────────────────────────────────────────────────

/// Attributes attached to the published sensor state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorAttributes {
    pub unit_of_measurement: String,
    pub friendly_name: String,
    pub zipcode: String,
    pub device_class: String,
    pub last_updated: String,
    pub source: String,
}

/// One state write for the hub: `{"state": ..., "attributes": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorRecord {
    #[serde(skip)]
    pub entity_id: String,
    pub state: String,
    pub attributes: SensorAttributes,
}

impl SensorRecord {
    /// Build a record for `region` stamped with `now`.
    pub fn new(region: &RegionKey, price: PriceReading, now: DateTime<Local>) -> Self {
        Self {
            entity_id: region.entity_id(),
            state: price.state_string(),
            attributes: SensorAttributes {
                unit_of_measurement: UNIT_OF_MEASUREMENT.to_string(),
                friendly_name: format!("Heating Oil Price ({region})"),
                zipcode: region.as_str().to_string(),
                device_class: DEVICE_CLASS.to_string(),
                last_updated: now.to_rfc3339(),
                source: SOURCE_LABEL.to_string(),
            },
        }
    }

    /// Build a record stamped with the current local time.
    pub fn now(region: &RegionKey, price: PriceReading) -> Self {
        Self::new(region, price, Local::now())
    }
}
