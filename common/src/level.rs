use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("unknown auto start/stop level `{0}`")]
    Unknown(String),
}

/// How eagerly the engine anticipates a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SensitivityLevel {
    #[default]
    Disabled,
    Slow,
    Medium,
    Fast,
}

/// Constants driven by a non-disabled level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelParams {
    /// Prediction horizon, also used as the minimum dwell between switches.
    pub lookahead_minutes: f64,
    /// Bound of the accumulated error, in degree-cycles.
    pub error_threshold: f64,
}

impl SensitivityLevel {
    pub const ALL: [Self; 4] = [Self::Disabled, Self::Slow, Self::Medium, Self::Fast];

    pub fn params(self) -> Option<LevelParams> {
        let (lookahead_minutes, error_threshold) = match self {
            Self::Disabled => return None,
            // 10 cycles 1° off target, or 5 cycles 2° off.
            Self::Slow => (30.0, 10.0),
            Self::Medium => (15.0, 5.0),
            Self::Fast => (7.0, 2.0),
        };
        Some(LevelParams {
            lookahead_minutes,
            error_threshold,
        })
    }

    pub fn is_enabled(self) -> bool {
        self != Self::Disabled
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "DISABLED",
            Self::Slow => "SLOW",
            Self::Medium => "MEDIUM",
            Self::Fast => "FAST",
        }
    }
}

impl fmt::Display for SensitivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensitivityLevel {
    type Err = LevelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let short = normalized
            .strip_prefix("auto_start_stop_")
            .unwrap_or(&normalized);

        match short {
            "none" | "disabled" => Ok(Self::Disabled),
            "slow" => Ok(Self::Slow),
            "medium" => Ok(Self::Medium),
            "fast" => Ok(Self::Fast),
            _ => Err(LevelError::Unknown(value.to_string())),
        }
    }
}

impl TryFrom<String> for SensitivityLevel {
    type Error = LevelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SensitivityLevel> for String {
    fn from(level: SensitivityLevel) -> Self {
        level.as_str().to_string()
    }
}
