//! Settings snapshot
//!
//! The saved form is a flat JSON object of field name to string/number.
//! Loading never fails: each field that is missing or does not read as a
//! usable value falls back to its default on its own.

use super::trade::{Direction, NumericInput, TradeInputs};
use serde_json::{Map, Value};

/// Field names used in the saved snapshot.
pub mod keys {
    pub const DIRECTION: &str = "direction";
    pub const MANUAL_LEVERAGE: &str = "manualLeverageInput";
    pub const FUNDS: &str = "fundsInput";
    pub const POSITION_PERCENT: &str = "positionPercent";
    pub const ENTRY_PRICE: &str = "entryPriceInput";
    pub const LIQUIDATION_PRICE: &str = "liqPresetInput";
    pub const TARGET_PRICE: &str = "targetPriceInput";
    pub const SAVED_AT: &str = "savedAt";
}

impl TradeInputs {
    /// Flatten the inputs into the persisted record.
    pub fn to_snapshot(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(keys::DIRECTION.into(), Value::String(self.direction.to_string()));
        map.insert(keys::MANUAL_LEVERAGE.into(), optional_value(&self.manual_leverage));
        map.insert(keys::FUNDS.into(), numeric_value(&self.funds));
        map.insert(keys::POSITION_PERCENT.into(), numeric_value(&self.position_percent));
        map.insert(keys::ENTRY_PRICE.into(), numeric_value(&self.entry_price));
        map.insert(
            keys::LIQUIDATION_PRICE.into(),
            optional_value(&self.preset_liquidation_price),
        );
        map.insert(keys::TARGET_PRICE.into(), optional_value(&self.target_price));
        map.insert(
            keys::SAVED_AT.into(),
            Value::from(chrono::Utc::now().timestamp_millis()),
        );
        map
    }

    /// Rebuild inputs from a persisted record, defaulting field by field.
    pub fn from_snapshot(map: &Map<String, Value>) -> Self {
        let defaults = TradeInputs::default();

        let direction = map
            .get(keys::DIRECTION)
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<Direction>().ok())
            .unwrap_or(defaults.direction);

        Self {
            direction,
            funds: read_numeric(map, keys::FUNDS).unwrap_or(defaults.funds),
            position_percent: read_numeric(map, keys::POSITION_PERCENT)
                .unwrap_or(defaults.position_percent),
            entry_price: read_numeric(map, keys::ENTRY_PRICE).unwrap_or(defaults.entry_price),
            manual_leverage: read_numeric(map, keys::MANUAL_LEVERAGE),
            preset_liquidation_price: read_numeric(map, keys::LIQUIDATION_PRICE),
            target_price: read_numeric(map, keys::TARGET_PRICE),
        }
    }

    /// Parse a persisted JSON string. Anything that is not a JSON object
    /// yields `None` so the caller can decide how loudly to fall back.
    pub fn from_snapshot_str(raw: &str) -> Option<Self> {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Some(Self::from_snapshot(&map)),
            _ => None,
        }
    }
}

fn numeric_value(input: &NumericInput) -> Value {
    match input {
        NumericInput::Number(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(String::new())),
        NumericInput::Text(s) => Value::String(s.clone()),
    }
}

fn optional_value(input: &Option<NumericInput>) -> Value {
    input
        .as_ref()
        .map(numeric_value)
        .unwrap_or_else(|| Value::String(String::new()))
}

/// A stored field is usable when it is a finite number or text that reads
/// as one. Blank text counts as absent.
fn read_numeric(map: &Map<String, Value>, key: &str) -> Option<NumericInput> {
    match map.get(key)? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).map(NumericInput::Number),
        Value::String(s) => {
            let input = NumericInput::Text(s.trim().to_string());
            input.as_finite().map(|_| input)
        }
        _ => None,
    }
}
