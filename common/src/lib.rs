pub mod config;
pub mod engine;
pub mod level;
pub mod types;

pub use config::EngineConfig;
pub use engine::AutoStartStopEngine;
pub use level::{LevelError, LevelParams, SensitivityLevel};
pub use types::{Decision, EngineDiagnostics, HvacMode, Sample};
