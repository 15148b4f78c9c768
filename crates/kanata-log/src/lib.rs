//! Kanata pipeline-trace loader.
//!
//! Reads the tab-delimited event log written by the simulator's instruction
//! timing tracer and folds it into one [`InstructionRecord`] per dynamic
//! instruction, holding the absolute cycle at which each pipeline stage was
//! first entered.

mod event;
mod loader;
mod record;

pub use event::*;
pub use loader::*;
pub use record::*;

use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

/// Instruction identifier as written by the tracer.
pub type InstrId = i64;

/// Absolute or relative simulation cycle.
pub type Cycle = i64;

/// File-level trace errors.
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("cannot open {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("read error in {} at line {line}: {source}", path.display())]
    Read {
        path: PathBuf,
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, TraceError>;

/// Reasons a single trace line is rejected.
///
/// These never escape the loader; they are turned into [`ParseWarning`]s.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    #[error("`{code}` event needs at least {expected} argument(s), got {actual}")]
    MissingField {
        code: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("invalid {field} `{value}`: {source}")]
    InvalidInteger {
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("cycle counter overflow ({base} + {delta})")]
    CycleOverflow { base: Cycle, delta: Cycle },
}
