use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use metrics::counter;
use tracing::{debug, warn};

use crate::{Cycle, Event, LineError, ParseWarning, Result, Trace, TraceError};

/// Incremental builder that folds Kanata events into a [`Trace`].
///
/// The running cycle counter lives here, so every loader starts from cycle 0
/// and two loads never share state.
#[derive(Debug)]
pub struct TraceLoader {
    cycle: Cycle,
    line: usize,
    trace: Trace,
}

impl TraceLoader {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            cycle: 0,
            line: 0,
            trace: Trace::new(source),
        }
    }

    /// Current value of the running cycle counter.
    #[must_use]
    pub const fn cycle(&self) -> Cycle {
        self.cycle
    }

    /// Feed the next line of the log.
    ///
    /// Malformed lines are logged, recorded as a [`ParseWarning`] and
    /// otherwise ignored.
    pub fn feed_line(&mut self, line: &str) {
        self.line += 1;
        let result = Event::parse(line).and_then(|event| event.map_or(Ok(()), |e| self.apply(e)));
        if let Err(error) = result {
            warn!(
                file = %self.trace.source,
                line = self.line,
                "skipping malformed line `{}`: {error}",
                line.trim_end()
            );
            self.trace.push_warning(ParseWarning {
                line: self.line,
                text: line.to_string(),
                error,
            });
        }
    }

    fn apply(&mut self, event: Event<'_>) -> std::result::Result<(), LineError> {
        match event {
            Event::CycleAdvance(delta) => {
                self.cycle = self.offset(delta)?;
            }
            Event::CycleSet(value) => {
                self.cycle = value;
            }
            Event::Init { id } => {
                self.trace.record_mut(id);
            }
            Event::Label { id, text } => {
                self.trace.record_mut(id).label = text;
            }
            Event::Stage {
                id,
                relative,
                stage,
            } => {
                let absolute = self.offset(relative)?;
                self.trace.record_mut(id).enter_stage(stage, absolute);
            }
        }
        Ok(())
    }

    fn offset(&self, delta: Cycle) -> std::result::Result<Cycle, LineError> {
        self.cycle
            .checked_add(delta)
            .ok_or(LineError::CycleOverflow {
                base: self.cycle,
                delta,
            })
    }

    /// Finish loading and return the trace.
    #[must_use]
    pub fn finish(mut self) -> Trace {
        self.trace.set_lines(self.line);
        debug!(
            file = %self.trace.source,
            lines = self.line,
            instructions = self.trace.len(),
            warnings = self.trace.warnings().len(),
            final_cycle = self.cycle,
            "trace loaded"
        );
        counter!("kanata_lines_total").increment(self.line as u64);
        counter!("kanata_parse_warnings_total").increment(self.trace.warnings().len() as u64);
        self.trace
    }
}

/// Load a Kanata log from `path`.
///
/// # Errors
///
/// Returns [`TraceError::FileAccess`] if the file cannot be opened and
/// [`TraceError::Read`] if it cannot be read to the end.
pub fn load(path: &Path) -> Result<Trace> {
    let file = File::open(path).map_err(|source| TraceError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    load_reader(BufReader::new(file), path)
}

/// Load a Kanata log from any buffered reader.
///
/// `path` is only used to name the source in diagnostics.
///
/// # Errors
///
/// Returns [`TraceError::Read`] if a line cannot be read.
pub fn load_reader<R: BufRead>(reader: R, path: &Path) -> Result<Trace> {
    let mut loader = TraceLoader::new(path.display().to_string());
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| TraceError::Read {
            path: path.to_path_buf(),
            line: index + 1,
            source,
        })?;
        loader.feed_line(&line);
    }
    Ok(loader.finish())
}
