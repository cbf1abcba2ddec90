use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which series `/insights/trends` aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendMetric {
    Mood,
    Energy,
    Stress,
    Symptom,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendQuery {
    pub metric: TrendMetric,
    /// Required when `metric=symptom`, ignored otherwise.
    pub symptom_id: Option<Uuid>,
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub days: Option<i64>,
}

/// One day's average for a trend series. Days without samples are omitted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendPoint {
    pub date: String,
    pub avg: f64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ActivityPoint {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakResponse {
    pub current_streak: u32,
}
