// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`   - trains the classifier on a labelled CSV
//   2. `predict` - loads a checkpoint and classifies one string
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

use crate::domain::traits::TextClassifier;

#[derive(Parser, Debug)]
#[command(
    name = "gru-text-classifier",
    version = "0.1.0",
    about = "Train a GRU text classifier on labelled snippets, then classify new text."
)]
pub struct Cli {
    /// The subcommand to run (train or predict)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin: it only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on '{}'", args.data);
    let checkpoint_dir = args.checkpoint_dir.clone();

    let report = TrainUseCase::new(args.into()).execute()?;

    println!("Final Loss: {:.6}", report.final_loss);
    if let Some(val) = report.validation {
        println!("Validation: loss={:.4} accuracy={:.1}%", val.loss, val.accuracy * 100.0);
    }
    println!("Training complete. Checkpoint saved to '{checkpoint_dir}'.");
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let text = args.text.clone();
    let use_case = PredictUseCase::new(&args.into())?;
    let prediction = use_case.classify(&text)?;

    println!("\nClass: {} (p = {:.3})", prediction.label, prediction.confidence);
    Ok(())
}
