use clap::Parser;
use serde::Serialize;
use serde_json::{json, Value};
use silentproof_monitor::classroom_store::validate_classroom;
use silentproof_monitor::engine::{status_for_score, SimulationEngine};
use silentproof_monitor::server_utils::normalize_seed;
use silentproof_monitor::types::{Alert, ClassroomConfig, Severity, Snapshot};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Saved classroom JSON; the demo hall is used when omitted.
    #[arg(long)]
    classroom: Option<PathBuf>,
    /// Seconds to play; defaults to ten seconds past the last trigger.
    #[arg(long)]
    seconds: Option<u64>,
    #[arg(long, allow_negative_numbers = true)]
    seed: Option<i64>,
    #[arg(long)]
    session_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct AlertLine {
    #[serde(rename = "elapsedSecs")]
    elapsed_secs: u64,
    #[serde(rename = "eventIndex")]
    event_index: usize,
    alert: Alert,
    #[serde(rename = "integrityScore")]
    integrity_score: String,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "sessionId")]
    session_id: String,
    source: String,
    seed: u32,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "elapsedSecs")]
    elapsed_secs: u64,
    #[serde(rename = "firedEvents")]
    fired_events: usize,
    #[serde(rename = "unfiredEvents")]
    unfired_events: Vec<usize>,
    #[serde(rename = "severityCounts")]
    severity_counts: BTreeMap<String, usize>,
    #[serde(rename = "finalIntegrity")]
    final_integrity: String,
    #[serde(rename = "lowestIntegrity")]
    lowest_integrity: String,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "sessionId")]
    session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

fn main() {
    let cli = Cli::parse();
    let started_at_ms = now_ms();
    let seed = normalize_seed(cli.seed.unwrap_or(started_at_ms as i64));
    let session_id = cli
        .session_id
        .clone()
        .unwrap_or_else(|| default_session_id(seed, started_at_ms));

    let (source, mut engine) = match cli.classroom.as_ref() {
        None => ("demo".to_string(), SimulationEngine::demo(seed)),
        Some(path) => match load_classroom(path) {
            Ok(config) => (
                format!("classroom:{}", config.id),
                SimulationEngine::from_classroom(&config, seed),
            ),
            Err(error) => {
                emit_log(
                    "error",
                    "classroom_load_failed",
                    &session_id,
                    None,
                    json!({
                        "path": path.to_string_lossy(),
                        "error": error.to_string(),
                    }),
                );
                std::process::exit(2);
            }
        },
    };

    let trigger_times: Vec<u32> = engine.events().iter().map(|event| event.trigger_time).collect();
    let seconds = cli.seconds.unwrap_or_else(|| default_duration(&trigger_times));

    emit_log(
        "info",
        "session_started",
        &session_id,
        None,
        json!({
            "source": source,
            "seed": seed,
            "seconds": seconds,
            "events": engine.events().len(),
            "integrity": engine.integrity_score(),
        }),
    );

    let mut anomalies = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut lowest_integrity = engine.integrity_score();
    let mut severity_counts: BTreeMap<String, usize> = BTreeMap::new();

    engine.start();
    for _ in 0..seconds {
        let report = engine.tick();
        let snapshot = engine.snapshot(report.fired.len(), 0);
        for message in collect_snapshot_anomalies(&snapshot) {
            push_anomaly(&mut anomalies, &mut anomaly_seen, report.elapsed_secs, message);
        }

        // alerts are most-recent-first; walk back to print them in firing order
        for (alert, event_index) in snapshot.alerts.iter().rev().zip(report.fired.iter()) {
            *severity_counts
                .entry(severity_key(alert.severity).to_string())
                .or_insert(0) += 1;
            let line = AlertLine {
                elapsed_secs: report.elapsed_secs,
                event_index: *event_index,
                alert: alert.clone(),
                integrity_score: snapshot.integrity_score.clone(),
            };
            println!(
                "{}",
                serde_json::to_string(&line).expect("alert line should serialize")
            );
        }

        if integrity_value(&snapshot.integrity_score) < integrity_value(&lowest_integrity) {
            lowest_integrity = snapshot.integrity_score.clone();
        }
    }
    engine.pause();

    let unfired_events: Vec<usize> = (0..engine.events().len())
        .filter(|index| !engine.has_fired(*index))
        .collect();
    let summary = RunSummary {
        session_id: session_id.clone(),
        source,
        seed,
        started_at_ms,
        finished_at_ms: now_ms(),
        elapsed_secs: engine.elapsed_secs(),
        fired_events: engine.fired_count(),
        unfired_events,
        severity_counts,
        final_integrity: engine.integrity_score(),
        lowest_integrity,
        anomalies: anomalies.iter().map(|a: &AnomalyRecord| a.message.clone()).collect(),
    };

    for anomaly in &anomalies {
        emit_log(
            "warn",
            "anomaly_detected",
            &session_id,
            Some(anomaly.tick),
            json!({ "message": anomaly.message }),
        );
    }

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &session_id,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "session_finished",
        &session_id,
        Some(summary.elapsed_secs),
        json!({
            "firedEvents": summary.fired_events,
            "unfiredEvents": summary.unfired_events,
            "finalIntegrity": summary.final_integrity,
            "lowestIntegrity": summary.lowest_integrity,
            "anomalyCount": anomalies.len(),
            "summaryOut": summary_out_written,
        }),
    );

    if !anomalies.is_empty() {
        std::process::exit(1);
    }
}

fn load_classroom(path: &Path) -> io::Result<ClassroomConfig> {
    let text = std::fs::read_to_string(path)?;
    let config: ClassroomConfig = serde_json::from_str(&text)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;
    validate_classroom(&config)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;
    Ok(config)
}

fn default_duration(trigger_times: &[u32]) -> u64 {
    trigger_times
        .iter()
        .copied()
        .max()
        .map(|last| u64::from(last) + 10)
        .unwrap_or(60)
}

fn collect_snapshot_anomalies(snapshot: &Snapshot) -> Vec<String> {
    let mut anomalies = Vec::new();
    for seat in &snapshot.seats {
        if !(0..=100).contains(&seat.score) {
            anomalies.push(format!("seat {} score out of range: {}", seat.id, seat.score));
        }
        if seat.status.is_occupied() {
            if seat.status != status_for_score(seat.score) {
                anomalies.push(format!(
                    "seat {} status {:?} does not match score {}",
                    seat.id, seat.status, seat.score
                ));
            }
        } else if seat.score != 0 || !seat.student_id.is_empty() {
            anomalies.push(format!("vacant seat {} carries data", seat.id));
        }
    }
    if snapshot.fired_events > snapshot.total_events {
        anomalies.push(format!(
            "fired {} of {} events",
            snapshot.fired_events, snapshot.total_events
        ));
    }
    if integrity_value(&snapshot.integrity_score) > 100.0 {
        anomalies.push(format!("integrity above 100: {}", snapshot.integrity_score));
    }
    anomalies
}

fn integrity_value(score: &str) -> f64 {
    score.parse::<f64>().unwrap_or(0.0)
}

fn severity_key(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => "low",
        Severity::Medium => "medium",
        Severity::High => "high",
    }
}

fn push_anomaly(
    anomalies: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(AnomalyRecord { tick, message });
    }
}

fn default_session_id(seed: u32, timestamp_ms: u64) -> String {
    format!("session-{seed}-{timestamp_ms}")
}

fn emit_log(level: &str, event: &str, session_id: &str, tick: Option<u64>, details: Value) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        session_id: session_id.to_string(),
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}
