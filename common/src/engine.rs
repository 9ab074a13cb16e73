use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::{
    config::EngineConfig,
    level::{LevelParams, SensitivityLevel},
    types::{Decision, EngineDiagnostics, HvacMode, Sample},
};

/// Nominal interval between two evaluations by the caller.
const CYCLE_SECS: f64 = 120.0;
/// Samples closer than this fraction of a cycle (24 s) to the previous one are dropped.
const MIN_CYCLE_FRACTION: f64 = 0.2;
/// Margin around the target the prediction has to clear before switching.
const TEMP_HYSTERESIS: f64 = 0.5;

/// Predicts whether a heating/cooling device can be stopped early, or must be
/// restarted ahead of need, from the integrated temperature error and the
/// current temperature slope.
///
/// The engine never reads a clock: every timestamp comes from the caller, so
/// one instance is expected to be driven by a single control loop.
#[derive(Debug, Clone)]
pub struct AutoStartStopEngine {
    name: String,
    level: SensitivityLevel,
    params: Option<LevelParams>,
    accumulated_error: f64,
    last_calculation_time: Option<DateTime<Utc>>,
    last_switch_time: Option<DateTime<Utc>>,
}

impl AutoStartStopEngine {
    pub fn new(level: SensitivityLevel, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level,
            params: level.params(),
            accumulated_error: 0.0,
            last_calculation_time: None,
            last_switch_time: None,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.level, config.name.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> SensitivityLevel {
        self.level
    }

    pub fn level_name(&self) -> &'static str {
        self.level.as_str()
    }

    pub fn lookahead_minutes(&self) -> Option<f64> {
        self.params.map(|params| params.lookahead_minutes)
    }

    pub fn error_threshold(&self) -> Option<f64> {
        self.params.map(|params| params.error_threshold)
    }

    pub fn accumulated_error(&self) -> f64 {
        self.accumulated_error
    }

    pub fn last_calculation_time(&self) -> Option<DateTime<Utc>> {
        self.last_calculation_time
    }

    pub fn last_switch_time(&self) -> Option<DateTime<Utc>> {
        self.last_switch_time
    }

    /// Changes the sensitivity. The integral restarts from zero on a real
    /// change; sample and switch timestamps are kept.
    pub fn set_level(&mut self, level: SensitivityLevel) -> bool {
        if self.level == level {
            return false;
        }

        debug!("{self}: level {} -> {level}", self.level);
        self.level = level;
        self.params = level.params();
        self.accumulated_error = 0.0;
        true
    }

    pub fn evaluate(&mut self, sample: &Sample) -> Decision {
        self.calculate_action(
            sample.mode,
            sample.previous_mode,
            sample.target_temp,
            sample.current_temp,
            sample.slope_per_minute,
            sample.timestamp,
        )
    }

    /// Feeds one sample and returns whether the device should be switched.
    ///
    /// `previous_mode` is the mode the device ran in before it was stopped;
    /// it only matters while `mode` is [`HvacMode::Off`].
    pub fn calculate_action(
        &mut self,
        mode: Option<HvacMode>,
        previous_mode: Option<HvacMode>,
        target_temp: Option<f64>,
        current_temp: Option<f64>,
        slope_per_minute: f64,
        now: DateTime<Utc>,
    ) -> Decision {
        let Some(params) = self.params else {
            debug!("{self}: auto start/stop is disabled");
            return Decision::None;
        };

        let target_temp = target_temp.filter(|value| value.is_finite());
        let current_temp = current_temp.filter(|value| value.is_finite());
        let (Some(mode), Some(target_temp), Some(current_temp)) = (mode, target_temp, current_temp)
        else {
            debug!("{self}: mode, target or current temperature unknown, skipping");
            return Decision::None;
        };

        let mut error = target_temp - current_temp;

        if let Some(last) = self.last_calculation_time {
            let elapsed_cycles = (now - last).num_milliseconds() as f64 / 1000.0 / CYCLE_SECS;
            if elapsed_cycles <= MIN_CYCLE_FRACTION {
                debug!("{self}: sample at {now} too close to previous one at {last}, ignored");
                return Decision::None;
            }
            error *= elapsed_cycles;
        }

        // Trend reversed: discharge half of the integral instead of flipping it at once.
        if error * self.accumulated_error < 0.0 {
            self.accumulated_error /= 2.0;
        }
        self.accumulated_error = (self.accumulated_error + error)
            .clamp(-params.error_threshold, params.error_threshold);
        self.last_calculation_time = Some(now);

        let predicted_temp = current_temp + slope_per_minute * params.lookahead_minutes;
        let can_switch = self.can_switch(now, params.lookahead_minutes);

        debug!(
            mode = mode.as_str(),
            previous_mode = previous_mode.map(HvacMode::as_str),
            target_temp,
            current_temp,
            slope_per_minute,
            accumulated_error = self.accumulated_error,
            predicted_temp,
            can_switch,
            "{self}: evaluated sample"
        );

        let threshold = params.error_threshold;
        let decision = match (mode, previous_mode) {
            (HvacMode::Heat, _) => {
                if self.accumulated_error <= -threshold
                    && predicted_temp >= target_temp + TEMP_HYSTERESIS
                    && can_switch
                {
                    info!("{self}: heating will not be needed for a while, stopping");
                    Decision::Off
                } else {
                    Decision::None
                }
            }
            (HvacMode::Cool, _) => {
                if self.accumulated_error >= threshold
                    && predicted_temp <= target_temp - TEMP_HYSTERESIS
                    && can_switch
                {
                    info!("{self}: cooling will not be needed for a while, stopping");
                    Decision::Off
                } else {
                    Decision::None
                }
            }
            (HvacMode::Off, Some(HvacMode::Heat)) => {
                if predicted_temp <= target_temp - TEMP_HYSTERESIS && can_switch {
                    info!("{self}: heating will be needed soon, starting");
                    Decision::On
                } else {
                    Decision::None
                }
            }
            (HvacMode::Off, Some(HvacMode::Cool)) => {
                if predicted_temp >= target_temp + TEMP_HYSTERESIS && can_switch {
                    info!("{self}: cooling will be needed soon, starting");
                    Decision::On
                } else {
                    Decision::None
                }
            }
            (HvacMode::Off, _) => Decision::None,
        };

        if decision.is_switch() {
            self.last_switch_time = Some(now);
        }
        decision
    }

    pub fn diagnostics(&self) -> EngineDiagnostics {
        EngineDiagnostics {
            name: self.name.clone(),
            level: self.level_name(),
            lookahead_minutes: self.lookahead_minutes(),
            error_threshold: self.error_threshold(),
            accumulated_error: self.accumulated_error,
            last_calculation_time: self.last_calculation_time,
            last_switch_time: self.last_switch_time,
        }
    }

    fn can_switch(&self, now: DateTime<Utc>, dwell_minutes: f64) -> bool {
        self.last_switch_time
            .map(|last| (now - last).num_milliseconds() as f64 / 60_000.0 >= dwell_minutes)
            .unwrap_or(true)
    }
}

impl fmt::Display for AutoStartStopEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AutoStartStop-{}", self.name)
    }
}
