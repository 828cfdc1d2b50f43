//! # Session Classifier
//!
//! Derives connectivity, readiness and session boundaries from consecutive
//! snapshots.
//!
//! ## Game state codes
//!
//! CREST2 mirrors the shared-memory enums of the game:
//!
//! | Field | Code | Meaning |
//! |---|---|---|
//! | `mGameState` | 1 | front end (menus) |
//! | `mGameState` | 7 | replay |
//! | `mSessionState` | 5 | race |
//! | `mRaceState` | 2 | racing |
//!
//! Only two combinations are special-cased. Everything else counts as ready,
//! including snapshots with no `gameStates` at all. That default is
//! permissive and may let records through during game states nobody has
//! classified yet.

use serde_json::Value;
use tracing::debug;

use crate::crest::snapshot::{is_truthy, RawSnapshot};
use crate::path;

/// `mGameState` while the game sits in its menus
pub const GAME_STATE_FRONT_END: i64 = 1;

/// `mGameState` while a replay is playing
pub const GAME_STATE_REPLAY: i64 = 7;

/// `mSessionState` of a race session
pub const SESSION_STATE_RACE: i64 = 5;

/// `mRaceState` while racing
pub const RACE_STATE_RACING: i64 = 2;

/// Stateful session classifier
///
/// Holds the last seen session state so that `is_new_session` fires once per
/// change. The retained value starts as JSON `null`.
#[derive(Debug, Default)]
pub struct SessionClassifier {
    previous_session_state: Value,
}

impl SessionClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a snapshot was obtained at all
    pub fn is_connected(snapshot: Option<&RawSnapshot>) -> bool {
        snapshot.is_some()
    }

    /// Whether this snapshot starts a new session
    ///
    /// Returns `false` if `gameStates.mSessionState` is absent or equals the
    /// retained value. Otherwise retains the new value and returns `true`.
    /// Call at most once per snapshot.
    pub fn is_new_session(&mut self, snapshot: &RawSnapshot) -> bool {
        let Some(session_state) = snapshot.get(&path!["gameStates", "mSessionState"]) else {
            return false;
        };

        if same_state(session_state, &self.previous_session_state) {
            return false;
        }

        debug!(
            "Session state changed from {} to {}",
            self.previous_session_state, session_state
        );
        self.previous_session_state = session_state.clone();
        true
    }

    /// Whether the game is showing drivable content worth logging
    pub fn is_ready(snapshot: &RawSnapshot) -> bool {
        let game_state = snapshot.int_at(&path!["gameStates", "mGameState"]);
        let session_state = snapshot.get(&path!["gameStates", "mSessionState"]);
        let race_state = snapshot.get(&path!["gameStates", "mRaceState"]);

        if game_state == Some(GAME_STATE_REPLAY)
            && snapshot.int_at(&path!["gameStates", "mSessionState"]) == Some(SESSION_STATE_RACE)
            && snapshot.int_at(&path!["gameStates", "mRaceState"]) == Some(RACE_STATE_RACING)
        {
            return true;
        }

        if game_state == Some(GAME_STATE_FRONT_END)
            && !is_truthy(session_state)
            && !is_truthy(race_state)
        {
            return false;
        }

        true
    }

    /// The session state retained from the last boundary
    pub fn previous_session_state(&self) -> &Value {
        &self.previous_session_state
    }
}

/// Strict equality of two state values; `5` and `5.0` are the same number
fn same_state(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(game_states: Value) -> RawSnapshot {
        RawSnapshot::from_value(json!({"timestamp": 1, "gameStates": game_states})).unwrap()
    }

    fn bare_snapshot() -> RawSnapshot {
        RawSnapshot::from_value(json!({"timestamp": 1})).unwrap()
    }

    #[test]
    fn test_is_connected() {
        assert!(!SessionClassifier::is_connected(None));
        assert!(SessionClassifier::is_connected(Some(&bare_snapshot())));
    }

    #[test]
    fn test_ready_replay() {
        let s = snapshot(json!({"mGameState": 7, "mSessionState": 5, "mRaceState": 2}));
        assert!(SessionClassifier::is_ready(&s));
    }

    #[test]
    fn test_not_ready_front_end_without_session() {
        let s = snapshot(json!({"mGameState": 1}));
        assert!(!SessionClassifier::is_ready(&s));
    }

    #[test]
    fn test_not_ready_front_end_with_zero_states() {
        let s = snapshot(json!({"mGameState": 1, "mSessionState": 0, "mRaceState": 0}));
        assert!(!SessionClassifier::is_ready(&s));

        let s = snapshot(json!({"mGameState": 1, "mSessionState": null, "mRaceState": null}));
        assert!(!SessionClassifier::is_ready(&s));
    }

    #[test]
    fn test_front_end_with_session_state_is_ready() {
        let s = snapshot(json!({"mGameState": 1, "mSessionState": 3}));
        assert!(SessionClassifier::is_ready(&s));

        let s = snapshot(json!({"mGameState": 1, "mRaceState": 1}));
        assert!(SessionClassifier::is_ready(&s));
    }

    #[test]
    fn test_ready_default_case() {
        let s = snapshot(json!({"mGameState": 3, "mSessionState": 2, "mRaceState": 1}));
        assert!(SessionClassifier::is_ready(&s));
    }

    #[test]
    fn test_ready_when_game_states_absent() {
        assert!(SessionClassifier::is_ready(&bare_snapshot()));
    }

    #[test]
    fn test_partial_replay_falls_through_to_default() {
        let s = snapshot(json!({"mGameState": 7, "mSessionState": 4, "mRaceState": 2}));
        assert!(SessionClassifier::is_ready(&s));
    }

    #[test]
    fn test_new_session_fires_once_per_change() {
        let mut classifier = SessionClassifier::new();
        let two = snapshot(json!({"mSessionState": 2}));
        let five = snapshot(json!({"mSessionState": 5}));

        assert!(classifier.is_new_session(&two));
        assert!(!classifier.is_new_session(&two));
        assert!(!classifier.is_new_session(&two));
        assert!(classifier.is_new_session(&five));
        assert!(!classifier.is_new_session(&five));
        assert!(classifier.is_new_session(&two));
        assert_eq!(classifier.previous_session_state(), &json!(2));
    }

    #[test]
    fn test_new_session_absent_field_is_never_new() {
        let mut classifier = SessionClassifier::new();

        assert!(!classifier.is_new_session(&bare_snapshot()));
        assert!(!classifier.is_new_session(&snapshot(json!({"mGameState": 2}))));
        assert_eq!(classifier.previous_session_state(), &Value::Null);
    }

    #[test]
    fn test_new_session_absent_field_keeps_retained_value() {
        let mut classifier = SessionClassifier::new();
        let five = snapshot(json!({"mSessionState": 5}));

        assert!(classifier.is_new_session(&five));
        assert!(!classifier.is_new_session(&bare_snapshot()));
        // Same value after a gap is not a new session
        assert!(!classifier.is_new_session(&five));
    }

    #[test]
    fn test_new_session_null_matches_initial_state() {
        let mut classifier = SessionClassifier::new();
        let null_state = snapshot(json!({"mSessionState": null}));

        assert!(!classifier.is_new_session(&null_state));
    }

    #[test]
    fn test_integral_float_is_same_session() {
        let mut classifier = SessionClassifier::new();

        assert!(classifier.is_new_session(&snapshot(json!({"mSessionState": 5}))));
        assert!(!classifier.is_new_session(&snapshot(json!({"mSessionState": 5.0}))));
        assert!(classifier.is_new_session(&snapshot(json!({"mSessionState": 5.5}))));
        // A string is never equal to a number
        assert!(classifier.is_new_session(&snapshot(json!({"mSessionState": "5.5"}))));
    }
}
