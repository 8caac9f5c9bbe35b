//! Dice Box entry point
//!
//! Rolls a notation headlessly and prints the result.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;

use dice_box::notation::add_percentile_companions;
use dice_box::settings::SettingsError;
use dice_box::{
    DiceBox, FnHooks, FrameStatus, NotationError, RollOutcome, RollRequest, Settings,
};

/// Dice Box - polyhedral dice thrown in a simulated box
#[derive(Parser, Debug)]
#[command(name = "dice-box")]
#[command(author, version, about = "Roll polyhedral dice with a physics simulation")]
struct Cli {
    /// Dice notation, e.g. "2d6+1d4+3" or "4d6@2 2 2 2"
    notation: String,

    /// Seed for a reproducible throw
    #[arg(long)]
    seed: Option<u64>,

    /// Settings JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Desired results, comma separated (overrides any "@" results)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    results: Option<Vec<i32>>,

    /// Add a d9 tens die for every d100
    #[arg(long)]
    percentile: bool,

    /// Animate on the wall clock instead of as fast as possible
    #[arg(long)]
    realtime: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Notation(#[from] NotationError),
    #[error("failed to encode outcome: {0}")]
    Json(#[from] serde_json::Error),
    #[error("nothing to roll in \"{0}\"")]
    NothingToRoll(String),
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let mut dice_box = match cli.seed {
        Some(seed) => DiceBox::with_seed(settings, seed),
        None => DiceBox::new(settings),
    };

    let notation = if cli.percentile {
        add_percentile_companions(&cli.notation)
    } else {
        cli.notation.clone()
    };
    dice_box.set_dice(&notation)?;

    let results = cli.results.clone();
    let hooks = FnHooks::new(
        move |_: &RollRequest| results.clone(),
        |request: &RollRequest, outcome: &RollOutcome| {
            log::debug!("{request} -> {:?}", outcome.values);
        },
    );
    if !dice_box.start_throw(hooks) {
        return Err(CliError::NothingToRoll(notation));
    }

    let outcome = if cli.realtime {
        roll_realtime(&mut dice_box)
    } else {
        dice_box.roll_to_completion()
    };
    let Some(outcome) = outcome else {
        return Err(CliError::NothingToRoll(notation));
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else if outcome.is_fault() {
        println!("Dice fell off the table, roll again");
    } else {
        println!("{}", outcome.display);
    }
    Ok(())
}

/// Drive frames against the wall clock, one nominal frame apart
fn roll_realtime(dice_box: &mut DiceBox) -> Option<RollOutcome> {
    let frame = Duration::from_secs_f32(dice_box.driver().frame_rate());
    let start = Instant::now();
    loop {
        match dice_box.frame(start.elapsed().as_secs_f64()) {
            FrameStatus::Running { delay } => std::thread::sleep(delay.unwrap_or(frame)),
            FrameStatus::Finished(outcome) => return Some(outcome),
            FrameStatus::Idle => return None,
        }
    }
}
