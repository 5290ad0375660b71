use log::{debug, warn};

use crate::error::{ConfigError, Error, Fault, RunError, Snapshot};
use crate::program::{COMMA, DOT, GREATER, LBRACKET, LESS, MINUS, PLUS, Program, RBRACKET};
use crate::tape::{BoundsPolicy, Tape};

/// Configuration for a tape machine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MachineConfig {
    /// Number of cells on a freshly allocated tape.
    pub tape_capacity: usize,
    /// Starting data pointer. `None` centres it at `capacity / 2`.
    pub initial_pointer: Option<usize>,
    /// What a pointer move past either end of the tape does.
    pub policy: BoundsPolicy,
    /// Maximum number of instructions a run may execute (`None` for no ceiling).
    /// Must be positive when set.
    pub instruction_budget: Option<u64>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            tape_capacity: 100,
            initial_pointer: None,
            policy: BoundsPolicy::Reject,
            instruction_budget: None,
        }
    }
}

/// The result of a run that reached the end of its program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    /// Value of the cell under the data pointer at termination.
    pub value: i32,
    pub pointer: usize,
    pub steps: u64,
    pub tape: Tape,
}

/// Executes programs against a tape.
///
/// A machine holds only its configuration: every run owns its own tape and
/// counters, so one machine can be shared freely across threads.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Machine {
    config: MachineConfig,
}

/// Run `program` on a default machine (100 cells, centred pointer, reject policy)
/// and return the final cell value.
pub fn run(program: &Program) -> Result<i32, RunError> {
    Machine::default().run(program).map(|outcome| outcome.value)
}

impl Machine {
    pub fn new(config: MachineConfig) -> Result<Self, ConfigError> {
        if config.tape_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if config.instruction_budget == Some(0) {
            return Err(ConfigError::ZeroBudget);
        }
        start_pointer(&config, config.tape_capacity)?;
        debug!("machine configured: {config:?}");
        Ok(Self { config })
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Run on a fresh zero-filled tape of the configured capacity.
    pub fn run(&self, program: &Program) -> Result<Outcome, RunError> {
        self.execute(program, Tape::new(self.config.tape_capacity), self.start())
    }

    /// Run on a caller-supplied tape. The tape's own length is its capacity.
    ///
    /// Fails with [`Error::Config`] before executing anything if the tape is
    /// empty or the configured initial pointer does not fit it.
    pub fn run_on(&self, program: &Program, tape: Tape) -> Result<Outcome, Error> {
        if tape.is_empty() {
            return Err(ConfigError::ZeroCapacity.into());
        }
        let pointer = start_pointer(&self.config, tape.len())?;
        Ok(self.execute(program, tape, pointer)?)
    }

    fn start(&self) -> usize {
        self.config
            .initial_pointer
            .unwrap_or(self.config.tape_capacity / 2)
    }

    fn execute(
        &self,
        program: &Program,
        mut tape: Tape,
        mut pointer: usize,
    ) -> Result<Outcome, RunError> {
        let capacity = tape.len();
        let policy = self.config.policy;
        let budget = self.config.instruction_budget;
        let mut pc: usize = 0;
        let mut steps: u64 = 0;

        debug!(
            "run start: {} instructions, {capacity} cells, pointer {pointer}, {policy}",
            program.len()
        );

        while let Some(op) = program.fetch(pc) {
            let result = match budget {
                Some(limit) if steps >= limit => {
                    Err(Fault::InstructionBudgetExceeded { budget: limit })
                }
                _ => step(program, &mut tape, &mut pc, &mut pointer, op, policy),
            };
            if let Err(fault) = result {
                warn!("run aborted at pc={pc} pointer={pointer} after {steps} steps: {fault}");
                return Err(RunError::new(
                    fault,
                    Snapshot {
                        pc,
                        pointer,
                        steps,
                        tape,
                    },
                ));
            }
            steps += 1;
            pc += 1;
        }

        // The pointer never leaves the tape, so this read cannot fail.
        let value = tape.cells()[pointer];
        debug!("run finished after {steps} steps: value {value} at pointer {pointer}");
        Ok(Outcome {
            value,
            pointer,
            steps,
            tape,
        })
    }
}

/// Execute the single instruction `op` at `pc`.
///
/// Jumps leave `pc` on the matching bracket; the caller's advance moves past it.
fn step(
    program: &Program,
    tape: &mut Tape,
    pc: &mut usize,
    pointer: &mut usize,
    op: u8,
    policy: BoundsPolicy,
) -> Result<(), Fault> {
    match op {
        PLUS => tape.increment(*pointer)?,
        MINUS => tape.decrement(*pointer)?,
        GREATER => *pointer = policy.shift(*pointer, 1, tape.len())?,
        LESS => *pointer = policy.shift(*pointer, -1, tape.len())?,
        // Reserved for output and input; no device is attached.
        DOT | COMMA => {}
        LBRACKET => {
            if tape.read(*pointer)? == 0 {
                *pc = program.match_forward(*pc)?;
            }
        }
        RBRACKET => {
            if tape.read(*pointer)? != 0 {
                *pc = program.match_backward(*pc)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn start_pointer(config: &MachineConfig, capacity: usize) -> Result<usize, ConfigError> {
    let pointer = config.initial_pointer.unwrap_or(capacity / 2);
    if pointer >= capacity {
        return Err(ConfigError::PointerOutOfRange { pointer, capacity });
    }
    Ok(pointer)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    proptest! {
        #[test]
        fn straight_line_value_is_net_change_at_final_cell(source in "[+\\-<>]{0,200}") {
            let m = Machine::new(MachineConfig {
                tape_capacity: 1000,
                ..Default::default()
            })
            .unwrap();
            let outcome = m.run(&Program::new(&source)).unwrap();

            let mut offset: i64 = 0;
            let mut net: HashMap<i64, i32> = HashMap::new();
            for c in source.chars() {
                match c {
                    '+' => *net.entry(offset).or_default() += 1,
                    '-' => *net.entry(offset).or_default() -= 1,
                    '>' => offset += 1,
                    '<' => offset -= 1,
                    _ => unreachable!(),
                }
            }
            prop_assert_eq!(outcome.pointer as i64, 500 + offset);
            prop_assert_eq!(outcome.value, net.get(&offset).copied().unwrap_or(0));
        }

        #[test]
        fn runs_are_idempotent(source in "[+\\-<>.,\\[\\]a]{0,64}") {
            let m = Machine::new(MachineConfig {
                tape_capacity: 16,
                instruction_budget: Some(2048),
                ..Default::default()
            })
            .unwrap();
            let program = Program::new(&source);
            prop_assert_eq!(m.run(&program), m.run(&program));
        }

        #[test]
        fn pointer_stays_on_tape_under_every_policy(
            source in "[<>+\\-\\[\\]]{0,64}",
            policy in prop_oneof![
                Just(BoundsPolicy::Reject),
                Just(BoundsPolicy::Wrap),
                Just(BoundsPolicy::Saturate),
            ]
        ) {
            let m = Machine::new(MachineConfig {
                tape_capacity: 8,
                policy,
                instruction_budget: Some(4096),
                ..Default::default()
            })
            .unwrap();
            let program = Program::new(&source);
            match m.run(&program) {
                Ok(outcome) => {
                    prop_assert!(outcome.pointer < 8);
                    prop_assert!(outcome.steps <= 4096);
                }
                Err(err) => {
                    prop_assert!(err.snapshot().pointer < 8);
                    prop_assert!(err.snapshot().pc <= program.len());
                }
            }
        }
    }
}
