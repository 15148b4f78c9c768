//! Metrics collection and reporting using metrics-rs.
//!
//! Library code records through the `metrics` macros; the binary installs a
//! [`CliRecorder`] when `--metrics` is given and prints a summary at exit.

use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};
use std::sync::Arc;

use kanata_log::Trace;
use metrics::{
    Counter, CounterFn, Gauge, GaugeFn, Histogram, Key, KeyName, Metadata, Recorder, SharedString,
    Unit, counter, describe_counter, describe_gauge, gauge,
};
use parking_lot::RwLock;

// ============================================================================
// Metric descriptions
// ============================================================================

/// Initialize metric descriptions.
///
/// Call this once at startup to register metric descriptions.
pub fn init() {
    describe_counter!(
        "kanata_lines_total",
        Unit::Count,
        "Trace lines read, including ignored ones"
    );
    describe_counter!(
        "kanata_parse_warnings_total",
        Unit::Count,
        "Trace lines skipped as malformed"
    );
    describe_counter!(
        "kanata_instructions_total",
        Unit::Count,
        "Instructions loaded per trace"
    );
    describe_counter!(
        "kanata_instructions_checked_total",
        Unit::Count,
        "Distinct instruction ids compared"
    );
    describe_counter!(
        "kanata_divergences_total",
        Unit::Count,
        "Comparison findings by kind"
    );
    describe_gauge!(
        "kanata_parse_seconds",
        Unit::Seconds,
        "Wall-clock time spent loading a trace"
    );
}

/// Record the result of loading one trace.
pub fn record_load(side: &str, trace: &Trace, secs: f64) {
    let labels = [("trace", side.to_string())];
    counter!("kanata_instructions_total", &labels).absolute(trace.len() as u64);
    gauge!("kanata_parse_seconds", &labels).set(secs);
}

// ============================================================================
// CLI Recorder for terminal output
// ============================================================================

/// Values recorded so far, keyed by [`key_to_string`].
#[derive(Default)]
struct Store {
    counters: RwLock<HashMap<String, u64>>,
    gauges: RwLock<HashMap<String, f64>>,
}

/// One registered metric. Counters and gauges share the same slot type and
/// differ only in which map of the store they touch.
struct Slot {
    key: String,
    store: Arc<Store>,
}

impl CounterFn for Slot {
    fn increment(&self, value: u64) {
        *self.store.counters.write().entry(self.key.clone()).or_insert(0) += value;
    }

    fn absolute(&self, value: u64) {
        self.store.counters.write().insert(self.key.clone(), value);
    }
}

impl GaugeFn for Slot {
    fn increment(&self, value: f64) {
        *self.store.gauges.write().entry(self.key.clone()).or_insert(0.0) += value;
    }

    fn decrement(&self, value: f64) {
        *self.store.gauges.write().entry(self.key.clone()).or_insert(0.0) -= value;
    }

    fn set(&self, value: f64) {
        self.store.gauges.write().insert(self.key.clone(), value);
    }
}

/// Recorder that keeps counters and gauges in memory for the `--metrics`
/// summary.
///
/// Histograms are not used by this tool and are dropped.
#[derive(Default)]
pub struct CliRecorder {
    store: Arc<Store>,
}

impl CliRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install this recorder as the global metrics recorder.
    ///
    /// Returns `None` if a global recorder is already installed.
    #[must_use]
    pub fn install(self) -> Option<CliRecorderHandle> {
        let handle = self.handle();
        metrics::set_global_recorder(self).ok()?;
        Some(handle)
    }

    /// Handle sharing this recorder's storage, without installing it.
    #[must_use]
    pub fn handle(&self) -> CliRecorderHandle {
        CliRecorderHandle {
            store: Arc::clone(&self.store),
        }
    }

    fn slot(&self, key: &Key) -> Arc<Slot> {
        Arc::new(Slot {
            key: key_to_string(key),
            store: Arc::clone(&self.store),
        })
    }
}

/// Flatten a key to `name` or `name{label=value,...}`.
fn key_to_string(key: &Key) -> String {
    let labels: Vec<String> = key
        .labels()
        .map(|label| format!("{}={}", label.key(), label.value()))
        .collect();
    if labels.is_empty() {
        key.name().to_string()
    } else {
        format!("{}{{{}}}", key.name(), labels.join(","))
    }
}

impl Recorder for CliRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        Counter::from_arc(self.slot(key))
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::from_arc(self.slot(key))
    }

    fn register_histogram(&self, _key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}

/// Handle for reading metrics recorded by a [`CliRecorder`].
pub struct CliRecorderHandle {
    store: Arc<Store>,
}

impl CliRecorderHandle {
    /// Counter value by flattened key, e.g. `kanata_instructions_total{trace=left}`.
    #[must_use]
    pub fn counter(&self, key: &str) -> Option<u64> {
        self.store.counters.read().get(key).copied()
    }

    #[must_use]
    pub fn gauge(&self, key: &str) -> Option<f64> {
        self.store.gauges.read().get(key).copied()
    }

    /// Write all collected metrics, sorted by key.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `out` fails.
    pub fn write_summary<W: Write>(&self, mut out: W) -> io::Result<()> {
        let counters = sorted(&self.store.counters);
        let gauges = sorted(&self.store.gauges);

        if counters.is_empty() && gauges.is_empty() {
            return writeln!(out, "No metrics collected.");
        }

        writeln!(out)?;
        writeln!(out, "## Metrics Summary")?;
        writeln!(out)?;
        if !counters.is_empty() {
            writeln!(out, "### Counters")?;
            for (key, value) in &counters {
                writeln!(out, "  {key}: {value}")?;
            }
            writeln!(out)?;
        }
        if !gauges.is_empty() {
            writeln!(out, "### Gauges")?;
            for (key, value) in &gauges {
                writeln!(out, "  {key}: {value:.6}")?;
            }
            writeln!(out)?;
        }
        out.flush()
    }

    /// Print the summary to stderr. Stdout carries the report.
    pub fn print_summary(&self) {
        let _ = self.write_summary(io::stderr().lock());
    }
}

/// Copy a value map out from under its lock, ordered by key.
fn sorted<T: Copy>(values: &RwLock<HashMap<String, T>>) -> BTreeMap<String, T> {
    values.read().iter().map(|(key, value)| (key.clone(), *value)).collect()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::Path;

    use metrics::Label;

    use super::*;
    use crate::{StageSet, diff_traces};

    fn load(text: &str) -> Trace {
        kanata_log::load_reader(Cursor::new(text), Path::new("t.kanata")).unwrap()
    }

    #[test]
    fn test_key_to_string() {
        assert_eq!(key_to_string(&Key::from_name("kanata_lines_total")), "kanata_lines_total");

        let key = Key::from_parts("kanata_parse_seconds", vec![Label::new("trace", "left")]);
        assert_eq!(key_to_string(&key), "kanata_parse_seconds{trace=left}");

        let key = Key::from_parts(
            "m",
            vec![Label::new("kind", "presence"), Label::new("trace", "right")],
        );
        assert_eq!(key_to_string(&key), "m{kind=presence,trace=right}");
    }

    #[test]
    fn test_recorder_collects_load_and_diff() {
        let recorder = CliRecorder::new();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            let left = load("S\t1\t0\tIF\nS\t2\t0\tIF\nC\t1\nS\t2\t0\tEX\n");
            let right = load("S\t1\t0\tIF\nS\t2\t0\tIF\nC\t2\nS\t2\t0\tEX\nS\t3\n");
            record_load("left", &left, 0.25);
            record_load("right", &right, 0.5);
            diff_traces(&left, &right, &StageSet::default());
        });

        assert_eq!(handle.counter("kanata_lines_total"), Some(9));
        assert_eq!(handle.counter("kanata_parse_warnings_total"), Some(1));
        assert_eq!(handle.counter("kanata_instructions_total{trace=left}"), Some(2));
        assert_eq!(handle.counter("kanata_instructions_total{trace=right}"), Some(2));
        assert_eq!(handle.counter("kanata_instructions_checked_total"), Some(2));
        assert_eq!(handle.counter("kanata_divergences_total{kind=stage_timing}"), Some(1));
        assert_eq!(handle.counter("kanata_divergences_total{kind=presence}"), None);
        assert_eq!(handle.gauge("kanata_parse_seconds{trace=right}"), Some(0.5));
    }

    #[test]
    fn test_gauge_and_absolute_counter_updates() {
        let recorder = CliRecorder::new();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            counter!("c").increment(3);
            counter!("c").absolute(10);
            counter!("c").increment(1);
            gauge!("g").set(2.0);
            gauge!("g").increment(1.5);
            gauge!("g").decrement(0.5);
        });

        assert_eq!(handle.counter("c"), Some(11));
        assert_eq!(handle.gauge("g"), Some(3.0));
    }

    #[test]
    fn test_summary_is_sorted() {
        let recorder = CliRecorder::new();
        let handle = recorder.handle();

        let mut out = Vec::new();
        handle.write_summary(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No metrics collected.\n");

        metrics::with_local_recorder(&recorder, || {
            counter!("b_total").increment(2);
            counter!("a_total").increment(1);
            gauge!("g_seconds").set(0.125);
        });

        let mut out = Vec::new();
        handle.write_summary(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\n## Metrics Summary\n\n\
             ### Counters\n  a_total: 1\n  b_total: 2\n\n\
             ### Gauges\n  g_seconds: 0.125000\n\n"
        );
    }
}
