//! Kanata trace diff.
//!
//! Loads two Kanata pipeline traces and finds the first instruction (by id)
//! whose presence or stage timing differs between them.
//!
//! # Example
//!
//! ```ignore
//! use kanata_diff::{StageSet, compare_files};
//!
//! let stages = StageSet::default();
//! let code = compare_files(
//!     "base.kanata".as_ref(),
//!     "new.kanata".as_ref(),
//!     &stages,
//!     std::io::stdout(),
//! )?;
//! ```

mod compare;
mod error;
pub mod metrics;
mod report;
mod stages;

pub use compare::*;
pub use error::*;
pub use report::*;
pub use stages::*;

pub use kanata_log::{InstrId, InstructionRecord, Trace, TraceError};

use std::io::Write;
use std::path::Path;
use std::time::Instant;

use tracing::info_span;

/// Load both traces, compare them and write the report to `out`.
///
/// Returns the exit code of the comparison: [`EXIT_IDENTICAL`] or
/// [`EXIT_DIVERGED`].
///
/// # Errors
///
/// Returns an error if either trace cannot be loaded or the report cannot
/// be written.
pub fn compare_files<W: Write>(
    left: &Path,
    right: &Path,
    stages: &StageSet,
    out: W,
) -> Result<i32> {
    let reporter = Reporter::new(
        out,
        left.display().to_string(),
        right.display().to_string(),
    );
    compare_files_with(reporter, left, right, stages)
}

/// Like [`compare_files`], with a preconfigured [`Reporter`].
///
/// # Errors
///
/// See [`compare_files`].
pub fn compare_files_with<W: Write>(
    mut reporter: Reporter<W>,
    left: &Path,
    right: &Path,
    stages: &StageSet,
) -> Result<i32> {
    reporter.stages(stages)?;

    reporter.parsing(Side::Left)?;
    let left_trace = load_timed(left, "left")?;
    reporter.parsing(Side::Right)?;
    let right_trace = load_timed(right, "right")?;
    reporter.counts(&left_trace, &right_trace)?;

    let result = {
        let _span = info_span!("compare", stages = %stages).entered();
        diff_traces(&left_trace, &right_trace, stages)
    };
    reporter.comparison(&result)?;
    Ok(result.exit_code())
}

fn load_timed(path: &Path, side: &'static str) -> Result<Trace> {
    let _span = info_span!("load", file = %path.display()).entered();
    let start = Instant::now();
    let trace = kanata_log::load(path)?;
    metrics::record_load(side, &trace, start.elapsed().as_secs_f64());
    Ok(trace)
}
