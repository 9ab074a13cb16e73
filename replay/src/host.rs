use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use autostart_common::{
    AutoStartStopEngine, Decision, EngineConfig, EngineDiagnostics, Sample, SensitivityLevel,
};

const DEFAULT_NAME: &str = "replay";

#[derive(Debug, Serialize)]
struct ReplayRecord {
    timestamp: DateTime<Utc>,
    decision: Decision,
    diagnostics: EngineDiagnostics,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ReplaySummary {
    samples: usize,
    switches: usize,
}

pub fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = engine_config(
        std::env::var("AUTOSTART_NAME").ok(),
        std::env::var("AUTOSTART_LEVEL").ok(),
    )?;
    let mut engine = AutoStartStopEngine::from_config(&config);

    let input = std::env::args().nth(1);
    let reader: Box<dyn BufRead> = match input.as_deref() {
        None | Some("-") => Box::new(io::stdin().lock()),
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("failed to open sample log {path}"))?;
            Box::new(BufReader::new(file))
        }
    };

    info!("replaying samples through {engine} at level {}", engine.level());

    let stdout = io::stdout();
    let summary = replay(&mut engine, reader, &mut stdout.lock())?;

    info!(
        "replay finished: {} samples, {} switch decisions",
        summary.samples, summary.switches
    );
    Ok(())
}

fn engine_config(name: Option<String>, level: Option<String>) -> anyhow::Result<EngineConfig> {
    let mut config = EngineConfig {
        name: name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
        level: SensitivityLevel::Medium,
    };

    if let Some(level) = level {
        config.level = level
            .parse()
            .with_context(|| format!("invalid AUTOSTART_LEVEL `{level}`"))?;
    }

    config.sanitize();
    Ok(config)
}

fn replay<R: BufRead, W: Write>(
    engine: &mut AutoStartStopEngine,
    reader: R,
    out: &mut W,
) -> anyhow::Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for (index, line) in reader.lines().enumerate() {
        let number = index + 1;
        let line = line.with_context(|| format!("failed to read line {number}"))?;
        let Some(sample) = parse_line(number, &line)? else {
            continue;
        };

        let decision = engine.evaluate(&sample);
        summary.samples += 1;
        if decision.is_switch() {
            summary.switches += 1;
        }
        debug!("line {number}: {}", decision.as_str());

        let record = ReplayRecord {
            timestamp: sample.timestamp,
            decision,
            diagnostics: engine.diagnostics(),
        };
        serde_json::to_writer(&mut *out, &record)
            .with_context(|| format!("failed to write decision for line {number}"))?;
        writeln!(out).context("failed to write output")?;
    }

    out.flush().context("failed to flush output")?;
    Ok(summary)
}

fn parse_line(number: usize, line: &str) -> anyhow::Result<Option<Sample>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let sample = serde_json::from_str(trimmed)
        .with_context(|| format!("malformed sample on line {number}"))?;
    Ok(Some(sample))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LOG: &str = r#"# lounge, heating paused by auto start/stop
{"mode":"off","previousMode":"heat","targetTemp":20.0,"currentTemp":20.0,"slopePerMinute":-1.0,"timestamp":"2026-01-05T08:00:00Z"}

{"mode":"off","previousMode":"heat","targetTemp":20.0,"currentTemp":19.8,"slopePerMinute":-1.0,"timestamp":"2026-01-05T08:02:00Z"}
{"mode":"heat","targetTemp":null,"currentTemp":19.8,"timestamp":"2026-01-05T08:04:00Z"}
"#;

    #[test]
    fn replays_log_and_emits_one_record_per_sample() {
        let mut engine = AutoStartStopEngine::new(SensitivityLevel::Fast, "lounge");
        let mut out = Vec::new();

        let summary = replay(&mut engine, LOG.as_bytes(), &mut out).unwrap();

        assert_eq!(
            summary,
            ReplaySummary {
                samples: 3,
                switches: 1
            }
        );

        let records: Vec<serde_json::Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        let decisions: Vec<&str> = records
            .iter()
            .map(|record| record["decision"].as_str().unwrap())
            .collect();

        assert_eq!(decisions, vec!["turnOn", "nothing", "nothing"]);
        assert_eq!(records[0]["diagnostics"]["level"], "FAST");
        assert_eq!(
            records[0]["diagnostics"]["lastSwitchTime"],
            "2026-01-05T08:00:00Z"
        );
    }

    #[test]
    fn malformed_line_reports_its_number() {
        let mut engine = AutoStartStopEngine::new(SensitivityLevel::Fast, "lounge");
        let input = "# header\n{\"mode\":\"heat\"}\n";

        let err = replay(&mut engine, input.as_bytes(), &mut Vec::new()).unwrap_err();

        assert_eq!(err.to_string(), "malformed sample on line 2");
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        assert!(parse_line(1, "   ").unwrap().is_none());
        assert!(parse_line(2, "# note").unwrap().is_none());
    }

    #[test]
    fn config_defaults_and_level_parsing() {
        let config = engine_config(None, None).unwrap();
        assert_eq!(config.name, "replay");
        assert_eq!(config.level, SensitivityLevel::Medium);

        let config = engine_config(
            Some(" bedroom ".to_string()),
            Some("auto_start_stop_fast".to_string()),
        )
        .unwrap();
        assert_eq!(config.name, "bedroom");
        assert_eq!(config.level, SensitivityLevel::Fast);

        let err = engine_config(None, Some("sometimes".to_string())).unwrap_err();
        assert_eq!(err.to_string(), "invalid AUTOSTART_LEVEL `sometimes`");
    }
}
