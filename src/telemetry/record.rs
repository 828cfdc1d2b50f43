//! # Normalized Record
//!
//! The flat per-poll record written to session logs.

use serde::{Deserialize, Serialize};

/// One normalized telemetry sample
///
/// Every field except `timestamp` is optional; a field whose source path is
/// missing from the snapshot serializes as `null`. Keys are camelCase on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    /// Name of the participant currently being viewed
    pub participant_name: Option<String>,
    pub participant_race_position: Option<i64>,
    pub participant_current_lap: Option<i64>,
    /// Distance into the current lap, in meters
    pub participant_lap_distance: Option<f64>,
    pub translated_track_variation: Option<String>,
    pub car_class_name: Option<String>,
    /// Capture time, milliseconds since the Unix epoch with sub-millisecond precision
    pub timestamp: f64,
    /// Session duration minus event time remaining, in seconds
    pub time_elapsed: Option<f64>,
    pub time_remaining: Option<f64>,
    pub game_state: Option<i64>,
    pub session_state: Option<i64>,
    pub race_state: Option<i64>,
    /// Degrees Celsius
    pub ambient_temperature: Option<f64>,
    /// Degrees Celsius
    pub track_temperature: Option<f64>,
    /// 0.0 (dry) to 1.0
    pub rain_density: Option<f64>,
}

impl NormalizedRecord {
    /// A record with only a capture time set
    pub fn empty(timestamp: f64) -> Self {
        Self {
            participant_name: None,
            participant_race_position: None,
            participant_current_lap: None,
            participant_lap_distance: None,
            translated_track_variation: None,
            car_class_name: None,
            timestamp,
            time_elapsed: None,
            time_remaining: None,
            game_state: None,
            session_state: None,
            race_state: None,
            ambient_temperature: None,
            track_temperature: None,
            rain_density: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_serializes_camel_case_keys() {
        let mut record = NormalizedRecord::empty(1_700_000_000_123.5);
        record.participant_name = Some("J. Doe".to_string());
        record.session_state = Some(5);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["participantName"], json!("J. Doe"));
        assert_eq!(value["sessionState"], json!(5));
        assert_eq!(value["timestamp"], json!(1_700_000_000_123.5));
    }

    #[test]
    fn test_missing_fields_serialize_as_null() {
        let value = serde_json::to_value(NormalizedRecord::empty(1.0)).unwrap();
        let object = value.as_object().unwrap();

        // All fifteen keys are always present
        assert_eq!(object.len(), 15);
        for key in [
            "participantName",
            "participantRacePosition",
            "participantCurrentLap",
            "participantLapDistance",
            "translatedTrackVariation",
            "carClassName",
            "timeElapsed",
            "timeRemaining",
            "gameState",
            "sessionState",
            "raceState",
            "ambientTemperature",
            "trackTemperature",
            "rainDensity",
        ] {
            assert_eq!(object.get(key), Some(&Value::Null), "{} should be null", key);
        }
    }
}
