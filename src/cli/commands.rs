// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `predict`, and all
// their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, enum, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::{predict_use_case::PredictConfig, train_use_case::TrainConfig};
use crate::ml::backend::BackendKind;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the GRU classifier on a labelled CSV file
    Train(TrainArgs),

    /// Classify a piece of text with a trained checkpoint
    Predict(PredictArgs),
}

/// Tensor backend to run on
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendArg {
    /// GPU through wgpu
    Wgpu,
    /// Pure-Rust CPU backend
    Ndarray,
}

impl From<BackendArg> for BackendKind {
    fn from(b: BackendArg) -> Self {
        match b {
            BackendArg::Wgpu    => BackendKind::Wgpu,
            BackendArg::Ndarray => BackendKind::NdArray,
        }
    }
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// CSV file with a header and `content`, `label` columns
    #[arg(long)]
    pub data: String,

    /// Pretrained word vectors in GloVe text format
    #[arg(long)]
    pub embeddings: String,

    /// Directory to save the model, vocabulary and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Number of documents per optimisation step
    #[arg(long, default_value_t = 50)]
    pub batch_size: usize,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 100)]
    pub epochs: usize,

    /// Width of the GRU hidden state
    #[arg(long, default_value_t = 64)]
    pub hidden_size: usize,

    /// Share of documents held out to report validation loss and
    /// accuracy every epoch (0 trains on everything)
    #[arg(long, default_value_t = 0.0)]
    pub validation_fraction: f64,

    /// Let the optimiser update the pretrained vectors too
    #[arg(long)]
    pub train_embedding: bool,

    /// Continue from the checkpoint in --checkpoint-dir if there is one
    #[arg(long)]
    pub resume: bool,

    #[arg(long, value_enum, default_value_t = BackendArg::Wgpu)]
    pub backend: BackendArg,

    /// Never use the accelerator, even when one is available
    #[arg(long)]
    pub cpu: bool,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2:
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_path:           a.data,
            embeddings_path:     a.embeddings,
            checkpoint_dir:      a.checkpoint_dir,
            batch_size:          a.batch_size,
            epochs:              a.epochs,
            hidden_size:         a.hidden_size,
            validation_fraction: a.validation_fraction,
            train_embedding:     a.train_embedding,
            resume:              a.resume,
            backend:             a.backend.into(),
            accelerator:         !a.cpu,
            ..TrainConfig::default()
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// The text to classify
    #[arg(long)]
    pub text: String,

    /// Directory where `train` saved its checkpoint
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, value_enum, default_value_t = BackendArg::Wgpu)]
    pub backend: BackendArg,

    /// Never use the accelerator, even when one is available
    #[arg(long)]
    pub cpu: bool,

    /// Drop words the model never saw instead of failing
    #[arg(long)]
    pub skip_unknown: bool,
}

impl From<PredictArgs> for PredictConfig {
    fn from(a: PredictArgs) -> Self {
        PredictConfig {
            checkpoint_dir: a.checkpoint_dir,
            backend:        a.backend.into(),
            accelerator:    !a.cpu,
            skip_unknown:   a.skip_unknown,
        }
    }
}
