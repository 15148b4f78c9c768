use kanata_log::TraceError;
use thiserror::Error;

/// Exit code when both traces agree.
pub const EXIT_IDENTICAL: i32 = 0;
/// Exit code when at least one instruction differs.
pub const EXIT_DIVERGED: i32 = 1;
/// Exit code when an input file cannot be opened.
pub const EXIT_FILE_ACCESS: i32 = 2;
/// Exit code for any other failure.
pub const EXIT_UNEXPECTED: i32 = 3;

/// Trace comparison errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Trace(#[from] TraceError),
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Map the error onto the process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Trace(TraceError::FileAccess { .. }) => EXIT_FILE_ACCESS,
            Self::Trace(TraceError::Read { .. }) | Self::Io(_) => EXIT_UNEXPECTED,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
