// Device status domain model
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Presence marker reported by the device when a charger is attached
pub const CHARGER_PRESENT: &str = "connected";

/// Last status payload reported by the device.
///
/// Kept as a raw mapping: the device adds fields over time and only a few
/// of them drive connectivity. An empty mapping means "no status yet".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceStatus {
    fields: Map<String, Value>,
}

impl DeviceStatus {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn charger_presence(&self) -> Option<&str> {
        self.fields.get("charger_presence").and_then(Value::as_str)
    }

    /// Channel count, accepting numbers or numeric strings. Anything else is 0.
    pub fn channel_count(&self) -> i64 {
        self.fields
            .get("channel_count")
            .and_then(as_integer)
            .unwrap_or(0)
    }

    pub fn device_id(&self) -> Option<i64> {
        self.fields.get("device_id").and_then(as_integer)
    }

    /// Reject a `channel_count` that is present but not a whole number in
    /// `0..=max_channels`
    pub fn check_channel_count(&self, max_channels: usize) -> Result<(), String> {
        let Some(raw) = self.fields.get("channel_count") else {
            return Ok(());
        };
        let count = as_integer(raw).ok_or_else(|| format!("channel_count {raw} is not an integer"))?;
        match usize::try_from(count) {
            Ok(n) if n > max_channels => Err(format!(
                "channel_count {n} exceeds the limit of {max_channels}"
            )),
            _ => Ok(()),
        }
    }

    /// Presence is the literal marker and at least one channel is reported
    pub fn reports_charger(&self) -> bool {
        self.charger_presence() == Some(CHARGER_PRESENT) && self.channel_count() > 0
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            // whole floats only, and only where f64 is still exact
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() <= 9_007_199_254_740_992.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
