//! # Field Extractor
//!
//! Maps one raw snapshot to one [`NormalizedRecord`]. Every field is an
//! independent path lookup, so a missing section only nulls the fields that
//! live under it.

use chrono::Utc;

use crate::crest::snapshot::RawSnapshot;
use crate::path;

use super::record::NormalizedRecord;

/// Current wall-clock time in milliseconds since the Unix epoch, microsecond precision
pub fn precision_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1000.0
}

/// Extract a record stamped with the current time
pub fn extract(snapshot: &RawSnapshot) -> NormalizedRecord {
    extract_at(snapshot, precision_timestamp())
}

/// Extract a record with an explicit capture time
pub fn extract_at(snapshot: &RawSnapshot, timestamp: f64) -> NormalizedRecord {
    let participant = viewed_participant(snapshot);
    let participant_path = |field: &'static str| {
        participant.map(|index| path!["participants", "mParticipantInfo", index, field])
    };

    NormalizedRecord {
        participant_name: participant_path("mName")
            .and_then(|p| snapshot.str_at(&p).map(str::to_string)),
        participant_race_position: participant_path("mRacePosition")
            .and_then(|p| snapshot.int_at(&p)),
        participant_current_lap: participant_path("mCurrentLap")
            .and_then(|p| snapshot.int_at(&p)),
        participant_lap_distance: participant_path("mCurrentLapDistance")
            .and_then(|p| snapshot.float_at(&p)),
        translated_track_variation: snapshot
            .str_at(&path!["eventInformation", "mTranslatedTrackVariation"])
            .map(str::to_string),
        car_class_name: snapshot
            .str_at(&path!["vehicleInformation", "mCarName"])
            .map(str::to_string),
        timestamp,
        time_elapsed: time_elapsed(snapshot),
        time_remaining: snapshot.float_at(&path!["timings", "mEventTimeRemaining"]),
        game_state: snapshot.int_at(&path!["gameStates", "mGameState"]),
        session_state: snapshot.int_at(&path!["gameStates", "mSessionState"]),
        race_state: snapshot.int_at(&path!["gameStates", "mRaceState"]),
        ambient_temperature: snapshot.float_at(&path!["weather", "mAmbientTemperature"]),
        track_temperature: snapshot.float_at(&path!["weather", "mTrackTemperature"]),
        rain_density: snapshot.float_at(&path!["weather", "mRainDensity"]),
    }
}

/// Index of the viewed participant, if both the index and the list are present
fn viewed_participant(snapshot: &RawSnapshot) -> Option<usize> {
    snapshot.get(&path!["participants", "mParticipantInfo"])?.as_array()?;
    let index = snapshot.int_at(&path!["participants", "mViewedParticipantIndex"])?;
    usize::try_from(index).ok()
}

fn time_elapsed(snapshot: &RawSnapshot) -> Option<f64> {
    let remaining = snapshot.float_at(&path!["timings", "mEventTimeRemaining"])?;
    let duration = snapshot.float_at(&path!["eventInformation", "mSessionDuration"])?;
    Some(duration - remaining)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn full_snapshot() -> Value {
        json!({
            "timestamp": 1_700_000_000,
            "gameStates": {"mGameState": 2, "mSessionState": 5, "mRaceState": 2},
            "participants": {
                "mViewedParticipantIndex": 1,
                "mParticipantInfo": [
                    {
                        "mName": "AI Driver",
                        "mRacePosition": 1,
                        "mCurrentLap": 4,
                        "mCurrentLapDistance": 120.5
                    },
                    {
                        "mName": "Player One",
                        "mRacePosition": 3,
                        "mCurrentLap": 3,
                        "mCurrentLapDistance": 2011.25
                    }
                ]
            },
            "eventInformation": {
                "mTranslatedTrackVariation": "Interlagos GP",
                "mSessionDuration": 1800.0
            },
            "vehicleInformation": {"mCarName": "Formula Vintage Gen2"},
            "timings": {"mEventTimeRemaining": 600.0},
            "weather": {"mAmbientTemperature": 24.0, "mTrackTemperature": 35.5, "mRainDensity": 0.0}
        })
    }

    fn extract_value(value: Value) -> NormalizedRecord {
        extract_at(&RawSnapshot::from_value(value).unwrap(), 42.0)
    }

    fn remove(value: &mut Value, section: &str, field: &str) {
        value[section].as_object_mut().unwrap().remove(field);
    }

    #[test]
    fn test_full_snapshot() {
        let record = extract_value(full_snapshot());

        assert_eq!(record.participant_name.as_deref(), Some("Player One"));
        assert_eq!(record.participant_race_position, Some(3));
        assert_eq!(record.participant_current_lap, Some(3));
        assert_eq!(record.participant_lap_distance, Some(2011.25));
        assert_eq!(record.translated_track_variation.as_deref(), Some("Interlagos GP"));
        assert_eq!(record.car_class_name.as_deref(), Some("Formula Vintage Gen2"));
        assert_eq!(record.timestamp, 42.0);
        assert_eq!(record.time_elapsed, Some(1200.0));
        assert_eq!(record.time_remaining, Some(600.0));
        assert_eq!(record.game_state, Some(2));
        assert_eq!(record.session_state, Some(5));
        assert_eq!(record.race_state, Some(2));
        assert_eq!(record.ambient_temperature, Some(24.0));
        assert_eq!(record.track_temperature, Some(35.5));
        assert_eq!(record.rain_density, Some(0.0));
    }

    #[test]
    fn test_bare_snapshot_is_all_null() {
        let record = extract_value(json!({"timestamp": 1}));
        assert_eq!(record, NormalizedRecord::empty(42.0));
    }

    #[test]
    fn test_each_missing_leaf_only_nulls_itself() {
        let full = serde_json::to_value(extract_value(full_snapshot())).unwrap();

        let cases = [
            ("weather", "mRainDensity", "rainDensity"),
            ("weather", "mTrackTemperature", "trackTemperature"),
            ("weather", "mAmbientTemperature", "ambientTemperature"),
            ("gameStates", "mRaceState", "raceState"),
            ("gameStates", "mSessionState", "sessionState"),
            ("gameStates", "mGameState", "gameState"),
            ("vehicleInformation", "mCarName", "carClassName"),
            ("eventInformation", "mTranslatedTrackVariation", "translatedTrackVariation"),
        ];

        for (section, field, key) in cases {
            let mut value = full_snapshot();
            remove(&mut value, section, field);
            let record = serde_json::to_value(extract_value(value)).unwrap();

            assert_eq!(record[key], Value::Null, "{}.{} should extract as null", section, field);

            // Everything else still matches the full extraction
            let mut expected = full.clone();
            expected[key] = Value::Null;
            assert_eq!(record, expected);
        }
    }

    #[test]
    fn test_elapsed_needs_both_inputs() {
        let mut value = full_snapshot();
        remove(&mut value, "eventInformation", "mSessionDuration");
        let record = extract_value(value);
        assert_eq!(record.time_elapsed, None);
        assert_eq!(record.time_remaining, Some(600.0));

        let mut value = full_snapshot();
        remove(&mut value, "timings", "mEventTimeRemaining");
        let record = extract_value(value);
        assert_eq!(record.time_elapsed, None);
        assert_eq!(record.time_remaining, None);
    }

    #[test]
    fn test_missing_viewed_index_nulls_participant_fields() {
        let mut value = full_snapshot();
        remove(&mut value, "participants", "mViewedParticipantIndex");
        let record = extract_value(value);

        assert_eq!(record.participant_name, None);
        assert_eq!(record.participant_race_position, None);
        assert_eq!(record.participant_current_lap, None);
        assert_eq!(record.participant_lap_distance, None);
        // Non-participant fields are unaffected
        assert_eq!(record.car_class_name.as_deref(), Some("Formula Vintage Gen2"));
    }

    #[test]
    fn test_missing_participant_list_nulls_participant_fields() {
        let mut value = full_snapshot();
        remove(&mut value, "participants", "mParticipantInfo");
        let record = extract_value(value);

        assert_eq!(record.participant_name, None);
        assert_eq!(record.participant_lap_distance, None);
    }

    #[test]
    fn test_out_of_range_index_nulls_participant_fields() {
        let mut value = full_snapshot();
        value["participants"]["mViewedParticipantIndex"] = json!(12);
        let record = extract_value(value.clone());
        assert_eq!(record.participant_name, None);

        value["participants"]["mViewedParticipantIndex"] = json!(-1);
        let record = extract_value(value);
        assert_eq!(record.participant_name, None);
    }

    #[test]
    fn test_participant_missing_single_field() {
        let mut value = full_snapshot();
        value["participants"]["mParticipantInfo"][1]
            .as_object_mut()
            .unwrap()
            .remove("mRacePosition");
        let record = extract_value(value);

        assert_eq!(record.participant_race_position, None);
        assert_eq!(record.participant_name.as_deref(), Some("Player One"));
        assert_eq!(record.participant_current_lap, Some(3));
    }

    #[test]
    fn test_wrong_leaf_type_is_null() {
        let mut value = full_snapshot();
        value["weather"]["mRainDensity"] = json!("heavy");
        value["gameStates"]["mGameState"] = json!({"code": 2});
        let record = extract_value(value);

        assert_eq!(record.rain_density, None);
        assert_eq!(record.game_state, None);
    }

    #[test]
    fn test_extract_stamps_current_time() {
        let before = precision_timestamp();
        let record = extract(&RawSnapshot::from_value(full_snapshot()).unwrap());
        let after = precision_timestamp();

        assert!(record.timestamp >= before && record.timestamp <= after);
        // Milliseconds since the epoch, not seconds
        assert!(record.timestamp > 1_600_000_000_000.0);
    }
}
