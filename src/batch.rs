use rand::Rng;
use rand::rngs::SmallRng;
use rayon::prelude::*;

use crate::error::{Fault, RunError};
use crate::machine::{Machine, Outcome};
use crate::program::{ALPHABET, Program};

/// Filler byte mixed into random programs so they contain no-ops too.
const NOOP: u8 = b' ';

/// Draw a random program of `len` symbols from the instruction alphabet plus
/// a no-op filler. Brackets are not balanced; unmatched ones are expected.
pub fn random_program(rng: &mut SmallRng, len: usize) -> Program {
    let code: Vec<u8> = (0..len)
        .map(|_| {
            let i = rng.gen_range(0..=ALPHABET.len());
            ALPHABET.get(i).copied().unwrap_or(NOOP)
        })
        .collect();
    Program::new(code)
}

/// Run every program on its own tape, in parallel.
///
/// Results are in the same order as `programs`.
pub fn run_batch(machine: &Machine, programs: &[Program]) -> Vec<Result<Outcome, RunError>> {
    programs
        .par_iter()
        .map(|program| machine.run(program))
        .collect()
}

/// Counts of how a batch of runs ended.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub completed: usize,
    pub unmatched_bracket: usize,
    pub out_of_bounds: usize,
    pub budget_exceeded: usize,
    /// Instructions executed across all runs, faulted ones included.
    pub total_steps: u64,
}

impl BatchStats {
    pub fn tally(results: &[Result<Outcome, RunError>]) -> Self {
        let mut stats = Self::default();
        for result in results {
            match result {
                Ok(outcome) => {
                    stats.completed += 1;
                    stats.total_steps += outcome.steps;
                }
                Err(err) => {
                    match err.fault() {
                        Fault::UnmatchedBracket { .. } => stats.unmatched_bracket += 1,
                        Fault::OutOfBoundsAccess { .. } => stats.out_of_bounds += 1,
                        Fault::InstructionBudgetExceeded { .. } => stats.budget_exceeded += 1,
                    }
                    stats.total_steps += err.snapshot().steps;
                }
            }
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.completed + self.unmatched_bracket + self.out_of_bounds + self.budget_exceeded
    }
}
