//! A thin CLI host over the `variant_sudoku` library (spec.md section 6,
//! "integration surface"). Reads a puzzle from a file or stdin (`-`) in the
//! short-string digit form and drives one of the four solve modes. Grounded
//! on the teacher's `main.rs` + `io/input.rs` + `io/output.rs` for the
//! read-solve-print shape, `clap` for argument parsing, `indicatif` for the
//! progress bar, and `ctrlc` for Ctrl-C cancellation, matching the crates the
//! teacher already depends on.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use variant_sudoku::{
    codec, CancelToken, Config, ConstraintSpec, Mask16, Solver, SnapshotCallback, StateSnapshot,
    ValueSet,
};

fn read(filename: &str) -> io::Result<String> {
    if filename == "-" {
        use std::io::Read;
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        Ok(input)
    } else {
        std::fs::read_to_string(filename)
    }
}

#[derive(Parser)]
#[clap(
    name = "variant_sudoku",
    about = "Solve a variant-Sudoku puzzle given in short-string form."
)]
struct Cli {
    /// Puzzle file, or "-" to read from stdin.
    filename: String,

    /// Count every solution instead of printing the first.
    #[clap(long, conflicts_with = "all_possibilities")]
    count_only: bool,

    /// Print the union of every cell's candidates across all solutions,
    /// instead of a single solution.
    #[clap(long)]
    all_possibilities: bool,

    /// Stop looking after this many milliseconds and report what was found
    /// so far; 0 (the default) means no deadline.
    #[clap(long, default_value_t = 0)]
    deadline_ms: u64,

    /// How often (in guesses) to refresh the progress bar.
    #[clap(long, default_value_t = 1 << 10)]
    log_update_frequency: u64,
}

fn spec_from_short_text(text: &str) -> Result<ConstraintSpec, codec::CodecError> {
    let (shape, fixed_values) = codec::decode_short_text(text)?;
    Ok(ConstraintSpec {
        shape,
        fixed_values,
        sudoku_x: false,
        no_boxes: false,
        nodes: Vec::new(),
    })
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar
}

fn snapshot_message(snapshot: &StateSnapshot<Mask16>) -> String {
    format!(
        "guesses: {} backtracks: {} solutions: {} ({} ms)",
        snapshot.counters.guesses,
        snapshot.counters.backtracks,
        snapshot.counters.solutions,
        snapshot.time_ms,
    )
}

fn run(cli: Cli) -> Result<(), String> {
    let input = read(&cli.filename).map_err(|e| format!("could not read {}: {e}", cli.filename))?;
    let spec = spec_from_short_text(&input).map_err(|e| e.to_string())?;
    let shape = spec.shape;

    let config = Config::default().with_log_update_frequency(cli.log_update_frequency);
    let solver = Solver::<Mask16>::new(spec, config).map_err(|e| e.to_string())?;

    let cancel = CancelToken::new();
    if cli.deadline_ms > 0 {
        let deadline = cli.deadline_ms;
        let deadline_cancel = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(deadline));
            deadline_cancel.cancel();
        });
    }
    let ctrlc_cancel = cancel.clone();
    ctrlc::set_handler(move || ctrlc_cancel.cancel())
        .map_err(|e| format!("could not install Ctrl-C handler: {e}"))?;

    let bar = progress_bar();
    let bar_for_callback = bar.clone();
    let callback: Box<SnapshotCallback<Mask16>> = Box::new(move |snapshot: &StateSnapshot<Mask16>| {
        bar_for_callback.set_message(snapshot_message(snapshot));
        bar_for_callback.tick();
    });

    if cli.count_only {
        let count = solver.count_solutions(cancel, Some(callback));
        bar.finish_and_clear();
        match count {
            Some(n) => println!("{n} solution(s)"),
            None => println!("cancelled before the count finished"),
        }
    } else if cli.all_possibilities {
        let pencilmarks = solver.solve_all_possibilities(cancel, Some(callback));
        bar.finish_and_clear();
        match pencilmarks {
            Some(marks) => {
                for (cell, mark) in marks.iter().enumerate() {
                    println!("{cell}: {:04b}", mark.to_bits());
                }
            }
            None => println!("cancelled before every possibility was found"),
        }
    } else {
        let solution = solver.nth_solution(0, cancel, Some(callback));
        bar.finish_and_clear();
        match solution {
            Some(solution) => {
                print!("{}", codec::render_grid(&shape, &solution));
                println!("{}", codec::encode_short_text(&solution));
            }
            None => println!("no solution (or cancelled before one was found)"),
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}
