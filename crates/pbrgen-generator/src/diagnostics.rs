//! Run diagnostics: per-task timing for one generation run.
//!
//! These diagnostics are permanent instrumentation intended for
//! tuning the task graph and spotting scheduling stalls. Every run
//! records a span per task; because tasks overlap, the per-task
//! durations do not sum to the run's wall-clock total.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement
//! serde traits.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Timing for one task within a run.
///
/// `started_at` is measured from the run's start, so spans from the
/// same run can be compared to reconstruct the schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDiagnostics {
    /// Task name, stable across runs.
    pub name: String,
    /// Offset from run start to when the task's worker began executing.
    #[serde(with = "duration_serde")]
    pub started_at: Duration,
    /// Wall-clock duration of the task body, dependency wait excluded.
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

impl TaskDiagnostics {
    /// Offset from run start to when the task finished.
    #[must_use]
    pub fn finished_at(&self) -> Duration {
        self.started_at + self.duration
    }
}

/// Diagnostics collected from one completed generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunDiagnostics {
    /// One span per task that ran to completion.
    pub tasks: Vec<TaskDiagnostics>,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

/// Shared recorder the task workers report spans into.
#[derive(Debug)]
pub(crate) struct DiagnosticsRecorder {
    epoch: Instant,
    spans: Mutex<Vec<TaskDiagnostics>>,
}

impl DiagnosticsRecorder {
    pub(crate) fn new() -> Self {
        Self {
            epoch: Instant::now(),
            spans: Mutex::new(Vec::new()),
        }
    }

    /// Offset of `instant` from the run's start.
    pub(crate) fn offset(&self, instant: Instant) -> Duration {
        instant.duration_since(self.epoch)
    }

    pub(crate) fn record(&self, name: &'static str, started: Instant, finished: Instant) {
        let span = TaskDiagnostics {
            name: name.to_owned(),
            started_at: self.offset(started),
            duration: finished.duration_since(started),
        };
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(span);
    }

    /// Consume the recorder into a report, sorted by start offset.
    pub(crate) fn finish(&self) -> RunDiagnostics {
        let mut tasks = std::mem::take(
            &mut *self.spans.lock().unwrap_or_else(PoisonError::into_inner),
        );
        tasks.sort_by_key(|span| span.started_at);
        RunDiagnostics {
            tasks,
            total_duration: self.epoch.elapsed(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn finished_at_is_start_plus_duration() {
        let span = TaskDiagnostics {
            name: "height_base".to_owned(),
            started_at: Duration::from_millis(10),
            duration: Duration::from_millis(25),
        };
        assert_eq!(span.finished_at(), Duration::from_millis(35));
    }

    #[test]
    fn recorder_sorts_spans_by_start() {
        let recorder = DiagnosticsRecorder::new();
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_millis(5);
        let t2 = t0 + Duration::from_millis(9);
        recorder.record("later", t1, t2);
        recorder.record("earlier", t0, t1);
        let report = recorder.finish();
        let names: Vec<_> = report.tasks.iter().map(|span| span.name.as_str()).collect();
        assert_eq!(names, ["earlier", "later"]);
    }

    #[test]
    fn durations_round_trip_as_fractional_seconds() {
        let report = RunDiagnostics {
            tasks: vec![TaskDiagnostics {
                name: "occlusion_low".to_owned(),
                started_at: Duration::from_millis(250),
                duration: Duration::from_millis(1500),
            }],
            total_duration: Duration::from_secs(2),
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("1.5"), "duration should serialize as seconds: {json}");
        let back: RunDiagnostics = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tasks[0].duration, Duration::from_millis(1500));
        assert_eq!(back.total_duration, Duration::from_secs(2));
    }

    #[test]
    fn negative_duration_seconds_rejected() {
        let result: Result<RunDiagnostics, _> =
            serde_json::from_str(r#"{"tasks": [], "total_duration": -1.0}"#);
        assert!(result.is_err(), "negative seconds must not deserialize");
    }
}
