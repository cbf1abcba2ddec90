use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::trackables::dto::TrackingType;

/// A habit log's value, tagged by the habit's tracking type. The storage
/// layer keeps three nullable columns; this union guarantees exactly one is
/// populated and that it is the right one for the type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HabitValue {
    Boolean(bool),
    Numeric(f64),
    Duration(i32),
}

impl HabitValue {
    pub fn tracking_type(&self) -> TrackingType {
        match self {
            HabitValue::Boolean(_) => TrackingType::Boolean,
            HabitValue::Numeric(_) => TrackingType::Numeric,
            HabitValue::Duration(_) => TrackingType::Duration,
        }
    }

    /// Builds the union from the three nullable fields; None unless exactly
    /// the field dictated by `tracking_type` is present.
    pub fn from_fields(
        tracking_type: TrackingType,
        boolean: Option<bool>,
        numeric: Option<f64>,
        duration: Option<i32>,
    ) -> Option<Self> {
        match (tracking_type, boolean, numeric, duration) {
            (TrackingType::Boolean, Some(v), None, None) => Some(HabitValue::Boolean(v)),
            (TrackingType::Numeric, None, Some(v), None) => Some(HabitValue::Numeric(v)),
            (TrackingType::Duration, None, None, Some(v)) => Some(HabitValue::Duration(v)),
            _ => None,
        }
    }

    pub fn into_fields(self) -> (Option<bool>, Option<f64>, Option<i32>) {
        match self {
            HabitValue::Boolean(v) => (Some(v), None, None),
            HabitValue::Numeric(v) => (None, Some(v), None),
            HabitValue::Duration(v) => (None, None, Some(v)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSymptomLogRequest {
    pub symptom_id: Uuid,
    pub severity: i32,
    pub notes: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub logged_at: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMoodLogRequest {
    pub mood_score: i32,
    pub energy_level: Option<i32>,
    pub stress_level: Option<i32>,
    pub notes: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub logged_at: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMedicationLogRequest {
    pub medication_id: Uuid,
    pub taken: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub taken_at: Option<OffsetDateTime>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateHabitLogRequest {
    pub habit_id: Uuid,
    pub value_boolean: Option<bool>,
    pub value_numeric: Option<f64>,
    pub value_duration: Option<i32>,
    pub notes: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub logged_at: Option<OffsetDateTime>,
}

/// Shared list query: optional date bounds plus pagination.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogListQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn habit_value_requires_the_matching_field() {
        assert_eq!(
            HabitValue::from_fields(TrackingType::Boolean, Some(true), None, None),
            Some(HabitValue::Boolean(true))
        );
        assert_eq!(
            HabitValue::from_fields(TrackingType::Numeric, None, Some(2.5), None),
            Some(HabitValue::Numeric(2.5))
        );
        assert_eq!(
            HabitValue::from_fields(TrackingType::Duration, None, None, Some(30)),
            Some(HabitValue::Duration(30))
        );
    }

    #[test]
    fn habit_value_rejects_mismatched_or_extra_fields() {
        // Numeric habit fed a boolean value.
        assert_eq!(
            HabitValue::from_fields(TrackingType::Numeric, Some(true), None, None),
            None
        );
        // Two fields at once is ambiguous.
        assert_eq!(
            HabitValue::from_fields(TrackingType::Boolean, Some(true), Some(1.0), None),
            None
        );
        assert_eq!(
            HabitValue::from_fields(TrackingType::Duration, None, None, None),
            None
        );
    }

    #[test]
    fn habit_value_field_round_trip() {
        let v = HabitValue::Duration(45);
        let (b, n, d) = v.into_fields();
        assert_eq!(
            HabitValue::from_fields(TrackingType::Duration, b, n, d),
            Some(v)
        );
    }
}
