use thiserror::Error;

pub type KernelResult<T> = Result<T, KernelError>;

/// Failures reported by the kernel and its collaborators.
///
/// The admission errors (`NoFreeEntry` through `TooBigProcess`) are local to
/// the long-term scheduler: they are reported and the next program is tried.
/// `NoReadyProcess` and `MissingIdleProcess` are fatal for the simulation.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("process table is full")]
    NoFreeEntry,

    #[error("program does not exist")]
    ProgramDoesNotExist,

    #[error("invalid priority or size")]
    ProgramNotValid,

    #[error("program is too big")]
    TooBigProcess,

    #[error("{0} queue is full")]
    QueueFull(&'static str),

    #[error("no process is ready to run")]
    NoReadyProcess,

    #[error("missing {0} program")]
    MissingIdleProcess(String),

    #[error("program file line {line}: {reason}")]
    ProgramFile { line: usize, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl KernelError {
    /// Numeric diagnostics code used when the error is reported.
    pub fn code(&self) -> i32 {
        match self {
            KernelError::NoFreeEntry => 103,
            KernelError::ProgramDoesNotExist | KernelError::ProgramNotValid => 104,
            KernelError::TooBigProcess => 105,
            _ => 99,
        }
    }
}
