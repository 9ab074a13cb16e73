use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HvacMode {
    Off,
    Heat,
    Cool,
}

impl HvacMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Heat => "HEAT",
            Self::Cool => "COOL",
        }
    }
}

/// Outcome of one engine evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Decision {
    #[default]
    #[serde(rename = "nothing")]
    None,
    #[serde(rename = "turnOn")]
    On,
    #[serde(rename = "turnOff")]
    Off,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "nothing",
            Self::On => "turnOn",
            Self::Off => "turnOff",
        }
    }

    pub fn is_switch(self) -> bool {
        self != Self::None
    }
}

/// One caller-supplied observation. Temperatures and the mode are optional
/// because the surrounding thermostat may not know them yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub mode: Option<HvacMode>,
    #[serde(rename = "previousMode", default)]
    pub previous_mode: Option<HvacMode>,
    #[serde(rename = "targetTemp")]
    pub target_temp: Option<f64>,
    #[serde(rename = "currentTemp")]
    pub current_temp: Option<f64>,
    #[serde(rename = "slopePerMinute", default)]
    pub slope_per_minute: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineDiagnostics {
    pub name: String,
    pub level: &'static str,
    #[serde(rename = "lookaheadMinutes")]
    pub lookahead_minutes: Option<f64>,
    #[serde(rename = "errorThreshold")]
    pub error_threshold: Option<f64>,
    #[serde(rename = "accumulatedError")]
    pub accumulated_error: f64,
    #[serde(rename = "lastCalculationTime")]
    pub last_calculation_time: Option<DateTime<Utc>>,
    #[serde(rename = "lastSwitchTime")]
    pub last_switch_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sample_reads_camel_case_json() {
        let sample: Sample = serde_json::from_str(
            r#"{"mode":"off","previousMode":"heat","targetTemp":20.0,"currentTemp":19.5,
               "slopePerMinute":-0.25,"timestamp":"2026-01-05T08:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(sample.mode, Some(HvacMode::Off));
        assert_eq!(sample.previous_mode, Some(HvacMode::Heat));
        assert_eq!(sample.target_temp, Some(20.0));
        assert_eq!(sample.slope_per_minute, -0.25);
    }

    #[test]
    fn sample_tolerates_unknown_temperatures() {
        let sample: Sample = serde_json::from_str(
            r#"{"mode":"heat","targetTemp":null,"currentTemp":null,"timestamp":"2026-01-05T08:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(sample.previous_mode, None);
        assert_eq!(sample.target_temp, None);
        assert_eq!(sample.slope_per_minute, 0.0);
    }

    #[test]
    fn decision_uses_action_names() {
        assert_eq!(serde_json::to_string(&Decision::On).unwrap(), "\"turnOn\"");
        assert_eq!(serde_json::to_string(&Decision::Off).unwrap(), "\"turnOff\"");
        assert_eq!(Decision::None.as_str(), "nothing");
        assert!(!Decision::None.is_switch());
    }
}
