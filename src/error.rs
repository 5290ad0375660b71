use std::fmt;

use crate::tape::Tape;

/// Which way a bracket scan was walking when it ran out of program.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScanDirection {
    /// Searching for the `]` that closes a `[`.
    Forward,
    /// Searching for the `[` that opens a `]`.
    Backward,
}

impl fmt::Display for ScanDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Backward => write!(f, "backward"),
        }
    }
}

/// A terminal run error. Every fault aborts the run at the point it is detected.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fault {
    /// A bracket scan exhausted the program without the depth returning to zero.
    UnmatchedBracket {
        /// Position of the bracket the scan started from.
        position: usize,
        direction: ScanDirection,
    },
    /// The data pointer would leave `[0, capacity)` under the reject policy.
    OutOfBoundsAccess {
        /// The index that was requested. Negative when moving left of cell 0.
        index: i64,
        capacity: usize,
    },
    /// The instruction ceiling was reached before the program finished.
    InstructionBudgetExceeded { budget: u64 },
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnmatchedBracket {
                position,
                direction,
            } => {
                let bracket = match direction {
                    ScanDirection::Forward => '[',
                    ScanDirection::Backward => ']',
                };
                write!(
                    f,
                    "unmatched '{bracket}' at position {position} ({direction} scan ran off the program)"
                )
            }
            Self::OutOfBoundsAccess { index, capacity } => {
                write!(f, "tape index {index} out of bounds (capacity {capacity})")
            }
            Self::InstructionBudgetExceeded { budget } => {
                write!(f, "instruction budget of {budget} exceeded")
            }
        }
    }
}

impl std::error::Error for Fault {}

/// Machine state captured at the instruction that faulted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub pc: usize,
    pub pointer: usize,
    pub steps: u64,
    pub tape: Tape,
}

/// A failed run: the fault plus the state the machine was in when it hit it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunError {
    fault: Fault,
    snapshot: Snapshot,
}

impl RunError {
    pub(crate) fn new(fault: Fault, snapshot: Snapshot) -> Self {
        Self { fault, snapshot }
    }

    pub fn fault(&self) -> Fault {
        self.fault
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn into_snapshot(self) -> Snapshot {
        self.snapshot
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run failed at pc={} pointer={} after {} steps: {}",
            self.snapshot.pc, self.snapshot.pointer, self.snapshot.steps, self.fault
        )
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.fault)
    }
}

/// Rejected machine configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The tape must hold at least one cell.
    ZeroCapacity,
    /// The initial data pointer does not address a cell of the tape.
    PointerOutOfRange { pointer: usize, capacity: usize },
    /// An instruction ceiling must allow at least one instruction.
    ZeroBudget,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCapacity => write!(f, "tape capacity must be positive"),
            Self::PointerOutOfRange { pointer, capacity } => write!(
                f,
                "initial pointer {pointer} outside tape of capacity {capacity}"
            ),
            Self::ZeroBudget => write!(f, "instruction budget must be positive"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Failure of a run on a caller-supplied tape: either the tape did not fit
/// the machine, or the program faulted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Config(ConfigError),
    Run(RunError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
            Self::Run(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Run(e) => Some(e),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<RunError> for Error {
    fn from(e: RunError) -> Self {
        Self::Run(e)
    }
}
