//! MPRIS value parsing

use std::collections::HashMap;

use zbus::zvariant::{OwnedValue, Value};

use crate::player::{PlaybackStatus, MPRIS_PREFIX};

/// Metadata key for the track title
pub const TITLE_KEY: &str = "xesam:title";

/// Metadata key for the track length in microseconds
pub const LENGTH_KEY: &str = "mpris:length";

/// Track metadata as returned by the `Metadata` property
pub type Metadata = HashMap<String, OwnedValue>;

/// Parse the `PlaybackStatus` property
pub fn parse_status(status: &str) -> PlaybackStatus {
    match status {
        "Playing" => PlaybackStatus::Playing,
        "Paused" => PlaybackStatus::Paused,
        "Stopped" => PlaybackStatus::Stopped,
        _ => PlaybackStatus::Unknown,
    }
}

/// Whether a bus name belongs to an MPRIS player
pub fn is_player_name(name: &str) -> bool {
    name.starts_with(MPRIS_PREFIX) && name.len() > MPRIS_PREFIX.len()
}

pub fn title_from_metadata(metadata: &Metadata) -> Option<String> {
    metadata.get(TITLE_KEY).and_then(|v| value_as_string(v))
}

pub fn length_from_metadata(metadata: &Metadata) -> Option<i64> {
    metadata.get(LENGTH_KEY).and_then(|v| value_as_micros(v))
}

/// String value (`s`)
pub fn value_as_string(value: &Value<'_>) -> Option<String> {
    match value {
        Value::Str(s) => Some(s.as_str().to_string()),
        Value::Value(inner) => value_as_string(inner),
        _ => None,
    }
}

/// Microsecond value. MPRIS defines `x`, but plenty of players send `t`
/// or even `i`/`u`.
pub fn value_as_micros(value: &Value<'_>) -> Option<i64> {
    match value {
        Value::I64(v) => Some(*v),
        Value::U64(v) => i64::try_from(*v).ok(),
        Value::I32(v) => Some(i64::from(*v)),
        Value::U32(v) => Some(i64::from(*v)),
        Value::Value(inner) => value_as_micros(inner),
        _ => None,
    }
}
