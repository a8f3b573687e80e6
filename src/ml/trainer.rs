// ============================================================
// Layer 5 — Training Run
// ============================================================
// Builds the classifier for the chosen backend and drives the
// shared epoch loop from `Trainable::update`.
//
// Per run:
//   1. save classifier_config.json so `predict` can rebuild it
//   2. build the classifier (optionally resume from model.mpk)
//   3. train; after every epoch log metrics.csv and, with a
//      validation split, report held-out loss and accuracy
//   4. save model.mpk
//
// Key Burn 0.20 insight:
//   - Training uses Autodiff<_> for gradients
//   - Validation goes through model.valid(), the inner backend,
//     so held-out batches never build an autodiff graph
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{module::AutodiffModule, tensor::backend::AutodiffBackend};
use std::marker::PhantomData;

use crate::application::train_use_case::TrainConfig;
use crate::data::{dataset::EncodedDataset, embeddings::WeightMatrix};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::backend::{self, BackendKind, NdArrayTrainBackend, WgpuTrainBackend};
use crate::ml::classifier::SequenceClassifierConfig;
use crate::ml::device::ExecutionDevice;
use crate::ml::trainable::{EpochObserver, Evaluation, FitOptions, ScoreNetwork, Trainable};

/// What a finished run reports back to the CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    pub final_loss: f64,
    pub validation: Option<Evaluation>,
    pub resumed:    bool,
}

/// Everything the run needs besides the config.
pub struct TrainingInputs<'a> {
    pub weights:     &'a WeightMatrix,
    pub num_classes: usize,
    pub train:       &'a EncodedDataset,
    pub validation:  Option<&'a EncodedDataset>,
}

pub fn run_training(
    cfg:          &TrainConfig,
    inputs:       TrainingInputs<'_>,
    ckpt_manager: &CheckpointManager,
) -> Result<TrainReport> {
    match cfg.backend {
        BackendKind::Wgpu => {
            let device = backend::wgpu_device(cfg.accelerator);
            train_loop::<WgpuTrainBackend>(cfg, inputs, ckpt_manager, device)
        }
        BackendKind::NdArray => {
            let device = backend::ndarray_device();
            train_loop::<NdArrayTrainBackend>(cfg, inputs, ckpt_manager, device)
        }
    }
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:          &TrainConfig,
    inputs:       TrainingInputs<'_>,
    ckpt_manager: &CheckpointManager,
    device:       ExecutionDevice<B::Device>,
) -> Result<TrainReport> {

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = SequenceClassifierConfig::new(
        inputs.weights.rows(),
        inputs.weights.dim(),
        inputs.num_classes,
    )
    .with_hidden_size(cfg.hidden_size)
    .with_train_embedding(cfg.train_embedding)
    .with_learning_rate(cfg.learning_rate);
    ckpt_manager.save_classifier_config(&model_cfg)?;

    let mut model = model_cfg.init::<B>(inputs.weights, device)?;

    let model_path = ckpt_manager.model_path();
    let resumed = cfg.resume && model.load(&model_path)?;
    if cfg.resume && !resumed {
        tracing::warn!("--resume given but no checkpoint found; starting from scratch");
    }

    // ── Epoch loop ────────────────────────────────────────────────────────────
    let options = FitOptions { batch_size: cfg.batch_size, epochs: cfg.epochs, quiet: false };
    let logger = if resumed {
        MetricsLogger::new(ckpt_manager.dir())?
    } else {
        MetricsLogger::create(ckpt_manager.dir())?
    };
    let mut observer = MetricsObserver::<B>::new(
        logger,
        inputs.validation,
        cfg.batch_size,
        cfg.epochs,
    );

    tracing::info!(
        "Training on {} documents for {} epochs (batch size {})",
        inputs.train.len(),
        cfg.epochs,
        cfg.batch_size
    );
    let final_loss = model.update(inputs.train, &options, &mut rand::thread_rng(), &mut observer)?;

    model.save(&model_path)?;
    tracing::info!("Checkpoint saved to '{}'", model_path.display());

    Ok(TrainReport { final_loss, validation: observer.last, resumed })
}

// ─── Per-epoch metrics ────────────────────────────────────────────────────────
struct MetricsObserver<'a, B> {
    logger:        MetricsLogger,
    validation:    Option<&'a EncodedDataset>,
    batch_size:    usize,
    epochs:        usize,
    best_val_loss: f64,
    last:          Option<Evaluation>,
    _backend:      PhantomData<B>,
}

impl<'a, B> MetricsObserver<'a, B> {
    fn new(
        logger:     MetricsLogger,
        validation: Option<&'a EncodedDataset>,
        batch_size: usize,
        epochs:     usize,
    ) -> Self {
        Self {
            logger,
            validation,
            batch_size,
            epochs,
            best_val_loss: f64::INFINITY,
            last: None,
            _backend: PhantomData,
        }
    }
}

impl<'a, B, M> EpochObserver<M> for MetricsObserver<'a, B>
where
    B: AutodiffBackend,
    M: Trainable<B>,
    <M::Network as AutodiffModule<B>>::InnerModule: ScoreNetwork<B::InnerBackend>,
{
    fn on_epoch_end(&mut self, model: &M, epoch: usize, mean_loss: f64) -> Result<()> {
        let mut metrics = EpochMetrics::new(epoch, mean_loss);

        if let Some(val) = self.validation {
            let eval = model.evaluate(val, self.batch_size)?;
            metrics = metrics.with_validation(eval.loss, eval.accuracy);

            println!(
                "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | val_acc={:.1}%",
                epoch, self.epochs, mean_loss, eval.loss, eval.accuracy * 100.0,
            );
            if metrics.is_improvement(self.best_val_loss) {
                self.best_val_loss = eval.loss;
                tracing::debug!("New best validation loss {:.4} at epoch {}", eval.loss, epoch);
            }
            self.last = Some(eval);
        }

        self.logger.log(&metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::EncodedSample;
    use burn::backend::{Autodiff, NdArray};

    fn dataset(copies: usize) -> EncodedDataset {
        let samples = (0..copies)
            .flat_map(|_| [EncodedSample::new(vec![0, 2], 0), EncodedSample::new(vec![1, 2], 1)])
            .collect();
        EncodedDataset::new(samples, 2)
    }

    fn config(dir: &std::path::Path) -> TrainConfig {
        TrainConfig {
            checkpoint_dir: dir.display().to_string(),
            batch_size: 4,
            epochs: 3,
            hidden_size: 8,
            backend: BackendKind::NdArray,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_run_writes_snapshot_config_and_metrics() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(tmp.path());
        let ckpt = CheckpointManager::new(tmp.path()).unwrap();
        let weights = WeightMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 0.0]]).unwrap();
        let train = dataset(4);
        let val = dataset(1);

        let inputs = TrainingInputs { weights: &weights, num_classes: 2, train: &train, validation: Some(&val) };
        let report = train_loop::<Autodiff<NdArray>>(
            &cfg,
            inputs,
            &ckpt,
            ExecutionDevice::host_only(Default::default()),
        )
        .unwrap();

        assert!(report.final_loss.is_finite());
        assert!(report.validation.is_some());
        assert!(!report.resumed);
        assert!(ckpt.has_model());
        assert_eq!(ckpt.load_classifier_config().unwrap().hidden_size, 8);

        let metrics = std::fs::read_to_string(tmp.path().join("metrics.csv")).unwrap();
        assert_eq!(metrics.lines().count(), 1 + cfg.epochs);
    }

    #[test]
    fn test_resume_picks_up_saved_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = config(tmp.path());
        let ckpt = CheckpointManager::new(tmp.path()).unwrap();
        let weights = WeightMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 0.0]]).unwrap();
        let train = dataset(2);

        let run = |cfg: &TrainConfig| {
            let inputs = TrainingInputs { weights: &weights, num_classes: 2, train: &train, validation: None };
            train_loop::<Autodiff<NdArray>>(cfg, inputs, &ckpt, ExecutionDevice::host_only(Default::default()))
                .unwrap()
        };

        cfg.resume = true;
        assert!(!run(&cfg).resumed);
        assert!(run(&cfg).resumed);

        let metrics = std::fs::read_to_string(tmp.path().join("metrics.csv")).unwrap();
        assert_eq!(metrics.lines().count(), 1 + 2 * cfg.epochs);
    }

    #[test]
    fn test_fresh_run_replaces_previous_metrics() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(tmp.path());
        let ckpt = CheckpointManager::new(tmp.path()).unwrap();
        let weights = WeightMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 0.0]]).unwrap();
        let train = dataset(2);

        for _ in 0..2 {
            let inputs = TrainingInputs { weights: &weights, num_classes: 2, train: &train, validation: None };
            train_loop::<Autodiff<NdArray>>(&cfg, inputs, &ckpt, ExecutionDevice::host_only(Default::default()))
                .unwrap();
        }

        let metrics = std::fs::read_to_string(tmp.path().join("metrics.csv")).unwrap();
        let lines: Vec<&str> = metrics.lines().collect();
        assert_eq!(lines.len(), 1 + cfg.epochs);
        assert_eq!(lines[0], "epoch,train_loss,val_loss,val_acc");
        assert!(lines[1].starts_with("1,"));
    }
}
