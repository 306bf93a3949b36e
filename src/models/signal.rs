//! # models::signal
//!
//! Defines [`Signal`], one trade instruction published by a Master, and
//! [`SubmitSignal`], the loosely-typed body the Master POSTs to `/signal`.
//!
//! MT5 EAs build JSON by hand, so numbers regularly arrive as strings and
//! optional fields arrive as `null`, `""` or not at all.  Trade parameters
//! therefore never reject a request: they fall back to a safe default.
//! Only `producer_id`, `ticket`, `action` (and `symbol` for OPEN / MODIFY)
//! are load-bearing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lot size used when the Master omits `lot_size` or sends garbage.
pub const DEFAULT_LOT_SIZE: f64 = 0.01;

// ─── Action ───────────────────────────────────────────────────────────────────

/// What the Slave should do with the position identified by `ticket`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Open,
    Close,
    Modify,
}

impl Action {
    /// Parses the wire form.  Only the exact upper-case names are accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "OPEN" => Some(Action::Open),
            "CLOSE" => Some(Action::Close),
            "MODIFY" => Some(Action::Modify),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Open => "OPEN",
            Action::Close => "CLOSE",
            Action::Modify => "MODIFY",
        }
    }

    /// OPEN and MODIFY address an instrument; CLOSE only needs the ticket.
    #[inline]
    pub fn requires_symbol(self) -> bool {
        matches!(self, Action::Open | Action::Modify)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Side ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    #[default]
    Buy,
    Sell,
}

impl Side {
    /// Accepts `"BUY"` / `"SELL"` in any case, or the MT5 `ORDER_TYPE_*`
    /// codes `0` / `1` (as numbers or strings).  Anything else is BUY.
    pub fn coerce(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) => match s.trim().to_ascii_uppercase().as_str() {
                "SELL" | "1" => Side::Sell,
                _ => Side::Buy,
            },
            Some(Value::Number(n)) if n.as_i64() == Some(1) => Side::Sell,
            _ => Side::Buy,
        }
    }
}

// ─── Signal ───────────────────────────────────────────────────────────────────

/// A trade instruction as stored in the signal log.
///
/// Immutable once appended: the log hands out `Arc<Signal>` and never
/// exposes a mutable path to a stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// `{producer}_{ticket}_{ACTION}_{millis}_{seq}`, assigned at append.
    pub id: String,

    /// The Master that published this signal.
    pub producer_id: String,

    /// Order ticket on the Master's terminal.
    pub ticket: i64,

    /// `None` is only possible for CLOSE.
    pub symbol: Option<String>,

    pub action: Action,
    pub instrument_side: Side,
    pub lot_size: f64,
    pub open_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,

    pub created_at: DateTime<Utc>,
}

// ─── SubmitSignal ─────────────────────────────────────────────────────────────

/// Raw body of `POST /signal`.
///
/// Every field is optional at the serde level so that a missing field
/// surfaces as a validation message instead of a deserialisation failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitSignal {
    #[serde(default, alias = "master_id")]
    pub producer_id: Option<Value>,
    #[serde(default)]
    pub ticket: Option<Value>,
    #[serde(default)]
    pub action: Option<Value>,
    #[serde(default)]
    pub symbol: Option<Value>,
    #[serde(default, alias = "type")]
    pub instrument_side: Option<Value>,
    #[serde(default, alias = "lots")]
    pub lot_size: Option<Value>,
    #[serde(default, alias = "price")]
    pub open_price: Option<Value>,
    #[serde(default, alias = "sl")]
    pub stop_loss: Option<Value>,
    #[serde(default, alias = "tp")]
    pub take_profit: Option<Value>,
}

/// Trimmed, non-empty string content of a JSON value.
///
/// Numbers are rendered so that `"producer_id": 7` still identifies a Master.
pub(crate) fn non_empty_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `i64::MIN` and `-i64::MIN` as floats; both are exact powers of two.
const I64_FLOAT_MIN: f64 = -9_223_372_036_854_775_808.0;
const I64_FLOAT_END: f64 = 9_223_372_036_854_775_808.0;

/// Integer content of a JSON number or numeric string.
///
/// Values outside `i64` are `None` rather than saturated, so two distinct
/// oversized tickets never collapse onto the same position.
pub(crate) fn coerce_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && (I64_FLOAT_MIN..I64_FLOAT_END).contains(f))
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Float content of a JSON number or numeric string, or `default`.
pub(crate) fn coerce_f64(value: Option<&Value>, default: f64) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite()).unwrap_or(default)
}
