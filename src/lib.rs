pub mod error;
pub mod tape;
pub mod program;
pub mod machine;
pub mod batch;

pub use error::{ConfigError, Error, Fault, RunError, ScanDirection, Snapshot};
pub use machine::{Machine, MachineConfig, Outcome, run};
pub use program::Program;
pub use tape::{BoundsPolicy, Tape};
