use std::path::PathBuf;

use anyhow::{Context as _, bail};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tapevm::batch::{BatchStats, random_program, run_batch};
use tapevm::{BoundsPolicy, Machine, MachineConfig, Program};

/// Step limit applied to benchmark runs when `--budget` is not given.
const BENCHMARK_BUDGET: u64 = 1 << 13;

#[derive(Parser)]
#[command(name = "tapevm", about = "Bracket-matched tape machine")]
struct Cli {
    /// Program text to run.
    program: Option<String>,

    /// Read the program from a file instead of the command line.
    #[arg(long, conflicts_with = "program")]
    file: Option<PathBuf>,

    /// Number of cells on the tape.
    #[arg(long, default_value_t = 100)]
    capacity: usize,

    /// Initial data pointer (defaults to the middle of the tape).
    #[arg(long)]
    pointer: Option<usize>,

    /// What moving off either end of the tape does (reject, wrap, saturate).
    #[arg(long, default_value_t = BoundsPolicy::Reject)]
    policy: BoundsPolicy,

    /// Abort after this many instructions.
    #[arg(long)]
    budget: Option<u64>,

    /// Print the non-zero cells of the final tape to stderr.
    #[arg(long)]
    dump: bool,

    /// Run randomly generated programs in parallel and print throughput stats.
    #[arg(long)]
    benchmark: bool,

    /// Random seed for benchmark program generation.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Number of programs to generate in benchmark mode.
    #[arg(long, default_value_t = 1 << 14)]
    programs: usize,

    /// Symbols per generated program.
    #[arg(long, default_value_t = 64)]
    program_size: usize,
}

impl Cli {
    fn machine_config(&self) -> MachineConfig {
        let budget = match (self.budget, self.benchmark) {
            (None, true) => Some(BENCHMARK_BUDGET),
            (budget, _) => budget,
        };
        MachineConfig {
            tape_capacity: self.capacity,
            initial_pointer: self.pointer,
            policy: self.policy,
            instruction_budget: budget,
        }
    }

    fn load_program(&self) -> anyhow::Result<Program> {
        match (&self.program, &self.file) {
            (Some(text), None) => Ok(Program::new(text)),
            (None, Some(path)) => {
                let source = std::fs::read(path)
                    .with_context(|| format!("failed to read program from {}", path.display()))?;
                Ok(Program::new(source))
            }
            _ => bail!("expected a program argument or --file"),
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let machine = Machine::new(cli.machine_config()).context("invalid machine configuration")?;

    if cli.benchmark {
        run_benchmark(&machine, cli.seed, cli.programs, cli.program_size);
        return Ok(());
    }

    let program = cli.load_program()?;
    match machine.run(&program) {
        Ok(outcome) => {
            if cli.dump {
                eprint!("{}", outcome.tape);
            }
            println!("{}", outcome.value);
            Ok(())
        }
        Err(err) => {
            if cli.dump {
                eprint!("{}", err.snapshot().tape);
            }
            Err(err).context("program failed")
        }
    }
}

fn run_benchmark(machine: &Machine, seed: u64, count: usize, program_size: usize) {
    if count == 0 {
        eprintln!("Benchmark skipped: no programs to run");
        return;
    }

    let mut rng = SmallRng::seed_from_u64(seed);
    let programs: Vec<Program> = (0..count)
        .map(|_| random_program(&mut rng, program_size))
        .collect();

    let start = std::time::Instant::now();
    let results = run_batch(machine, &programs);
    let elapsed = start.elapsed();

    let stats = BatchStats::tally(&results);
    let runs_per_sec = count as f64 / elapsed.as_secs_f64();
    let steps_per_sec = stats.total_steps as f64 / elapsed.as_secs_f64();

    eprintln!("Benchmark results:");
    eprintln!("  Programs:          {count}");
    eprintln!("  Program size:      {program_size}");
    eprintln!("  Completed:         {}", stats.completed);
    eprintln!("  Unmatched bracket: {}", stats.unmatched_bracket);
    eprintln!("  Out of bounds:     {}", stats.out_of_bounds);
    eprintln!("  Budget exceeded:   {}", stats.budget_exceeded);
    eprintln!("  Total steps:       {}", stats.total_steps);
    eprintln!("  Elapsed:           {elapsed:.2?}");
    eprintln!("  Runs/sec:          {runs_per_sec:.0}");
    eprintln!("  Steps/sec:         {steps_per_sec:.0}");
}
