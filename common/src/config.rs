use serde::{Deserialize, Serialize};

use crate::level::SensitivityLevel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Label of the controlled device, only used in logs and diagnostics.
    pub name: String,
    #[serde(default)]
    pub level: SensitivityLevel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: "thermostat".to_string(),
            level: SensitivityLevel::Disabled,
        }
    }
}

impl EngineConfig {
    pub fn sanitize(&mut self) {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            self.name = Self::default().name;
        } else if trimmed.len() != self.name.len() {
            self.name = trimmed.to_string();
        }
    }
}
