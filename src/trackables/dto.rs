use serde::{Deserialize, Serialize};

/// How a habit's log value is shaped. Stored as text, parsed at the edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingType {
    Boolean,
    Numeric,
    Duration,
}

impl TrackingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingType::Boolean => "boolean",
            TrackingType::Numeric => "numeric",
            TrackingType::Duration => "duration",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "boolean" => Some(TrackingType::Boolean),
            "numeric" => Some(TrackingType::Numeric),
            "duration" => Some(TrackingType::Duration),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSymptomRequest {
    pub name: String,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSymptomRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMedicationRequest {
    pub name: String,
    pub dosage: Option<String>,
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMedicationRequest {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub unit: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateHabitRequest {
    pub name: String,
    pub tracking_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateHabitRequest {
    pub name: Option<String>,
    pub active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_type_round_trips_through_text() {
        for t in [
            TrackingType::Boolean,
            TrackingType::Numeric,
            TrackingType::Duration,
        ] {
            assert_eq!(TrackingType::parse(t.as_str()), Some(t));
        }
        assert_eq!(TrackingType::parse("weekly"), None);
    }
}
