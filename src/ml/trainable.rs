// ============================================================
// Layer 5 — Trainable Model Contract
// ============================================================
// Everything a training loop needs from a model, split in two:
//
//   Required (each concrete model supplies them)
//     forward        inputs → raw class scores [batch, classes]
//     loss           the loss evaluator
//     optimizer      the optimizer handle
//     network / set_network / learning_rate / device
//
//   Provided (written once here, shared by every model)
//     step           forward → loss → backward → optimizer step
//     update         epoch loop over fresh shuffled batches
//     validation     loss with gradient tracking disabled
//     evaluate       loss + accuracy over a whole dataset
//     save / load    parameter snapshot I/O
//
// Key Burn 0.20 insight:
//   - Gradients live in the value returned by `backward()`, so
//     there is nothing to zero between steps
//   - The optimizer takes the module BY VALUE and hands back the
//     updated one; `set_network` swaps it in
//   - `network().valid()` is the same module on the inner
//     backend: no autodiff graph, no parameter updates
//
// Reference: Burn Book §5 (Custom Training Loop)

use anyhow::{bail, Result};
use burn::{
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::{seq::SliceRandom, Rng};
use std::{io::Write, path::Path};

use crate::data::{batcher::ClassificationBatcher, dataset::EncodedDataset};
use crate::infra::checkpoint;
use crate::ml::device::ExecutionDevice;

/// Glyphs cycled at the end of every progress line.
const SPINNER: [char; 3] = ['\\', '/', '—'];

// ─── Supporting traits ────────────────────────────────────────────────────────
/// Scores predictions against integer class targets.
pub trait LossFunction {
    /// Mean loss over the batch, as a one-element tensor.
    fn evaluate<B: Backend>(&self, scores: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Tensor<B, 1>;
}

/// Categorical cross-entropy over raw scores, averaged over the batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoricalCrossEntropy;

impl LossFunction for CategoricalCrossEntropy {
    fn evaluate<B: Backend>(&self, scores: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Tensor<B, 1> {
        CrossEntropyLossConfig::new()
            .init(&scores.device())
            .forward(scores, targets)
    }
}

/// A network that maps index sequences to raw class scores. Both the
/// autodiff module and its `valid()` counterpart implement it.
pub trait ScoreNetwork<B: Backend> {
    fn scores(&self, inputs: Tensor<B, 2, Int>) -> Tensor<B, 2>;
}

/// Called after every epoch with the model, the 1-based epoch and
/// the epoch's mean training loss. An error aborts training.
pub trait EpochObserver<M: ?Sized> {
    fn on_epoch_end(&mut self, model: &M, epoch: usize, mean_loss: f64) -> Result<()>;
}

impl<M: ?Sized> EpochObserver<M> for () {
    fn on_epoch_end(&mut self, _model: &M, _epoch: usize, _mean_loss: f64) -> Result<()> {
        Ok(())
    }
}

// ─── Options / results ────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    pub batch_size: usize,
    pub epochs:     usize,
    /// Suppress the per-batch progress line
    pub quiet:      bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self { batch_size: 50, epochs: 100, quiet: false }
    }
}

/// Loss and accuracy over a dataset, computed without gradients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss:     f64,
    pub accuracy: f64,
}

// ─── Batch index generation ───────────────────────────────────────────────────
/// Shuffle `0..dataset_size` and cut it into batches of `batch_size`.
///
/// Every index appears exactly once. All batches are full except
/// possibly the last, which holds the `dataset_size % batch_size`
/// leftovers. Each call draws a new permutation.
pub fn batch_indices<R: Rng + ?Sized>(
    dataset_size: usize,
    batch_size:   usize,
    rng:          &mut R,
) -> Result<Vec<Vec<usize>>> {
    if batch_size == 0 {
        bail!("batch size must be at least 1");
    }

    let mut order: Vec<usize> = (0..dataset_size).collect();
    order.shuffle(rng);
    Ok(order.chunks(batch_size).map(<[usize]>::to_vec).collect())
}

// ─── Trainable ────────────────────────────────────────────────────────────────
pub trait Trainable<B: AutodiffBackend> {
    type Network: AutodiffModule<B> + ScoreNetwork<B>;
    type Loss: LossFunction;
    type Optim: Optimizer<Self::Network, B>;

    /// Raw class scores, gradients tracked.
    fn forward(&self, inputs: Tensor<B, 2, Int>) -> Tensor<B, 2>;

    fn loss(&self) -> &Self::Loss;

    fn optimizer(&mut self) -> &mut Self::Optim;

    fn network(&self) -> &Self::Network;

    fn set_network(&mut self, network: Self::Network);

    fn learning_rate(&self) -> f64;

    fn device(&self) -> &ExecutionDevice<B::Device>;

    /// One optimisation step on one batch. Returns the batch loss.
    fn step(&mut self, inputs: Tensor<B, 2, Int>, targets: Tensor<B, 1, Int>) -> f64 {
        let scores = self.forward(inputs);
        let loss = self.loss().evaluate(scores, targets);
        let value = loss.clone().into_scalar().elem::<f64>();

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, self.network());

        let lr = self.learning_rate();
        let network = self.network().clone();
        let network = self.optimizer().step(lr, network, grads);
        self.set_network(network);

        value
    }

    /// Train for `options.epochs` epochs. Each epoch walks a fresh
    /// random partition of `dataset` with one `step` per batch.
    /// Returns the mean loss of the final epoch.
    fn update<R, O>(
        &mut self,
        dataset:  &EncodedDataset,
        options:  &FitOptions,
        rng:      &mut R,
        observer: &mut O,
    ) -> Result<f64>
    where
        Self: Sized,
        R: Rng,
        O: EpochObserver<Self>,
    {
        if dataset.is_empty() {
            bail!("cannot train on an empty dataset");
        }
        if options.epochs == 0 {
            bail!("epochs must be at least 1");
        }

        let placement = self.device().clone();
        let batcher = ClassificationBatcher::<B>::new(placement.host().clone(), dataset.padding_index());
        let progress = Progress { epochs: options.epochs, quiet: options.quiet };
        let mut stdout = std::io::stdout();
        let mut epoch_loss = f64::NAN;

        for epoch in 0..options.epochs {
            let batches = batch_indices(dataset.len(), options.batch_size, rng)?;
            let mut total = 0.0f64;

            for (i, indices) in batches.iter().enumerate() {
                let mut batch = batcher.batch(&dataset.select(indices));
                let loss = placement.run(&mut batch, |b| {
                    self.step(b.inputs.clone(), b.targets.clone())
                });
                total += loss;
                progress.line(&mut stdout, epoch, i, batches.len(), total / (i + 1) as f64);
            }

            epoch_loss = total / batches.len() as f64;
            progress.finish_epoch(&mut stdout, epoch, batches.len(), epoch_loss);
            tracing::debug!("Epoch {} mean loss {:.6}", epoch + 1, epoch_loss);

            observer.on_epoch_end(self, epoch + 1, epoch_loss)?;
        }

        Ok(epoch_loss)
    }

    /// Loss on one batch with gradient tracking disabled.
    /// Parameters are never touched.
    fn validation(&self, inputs: Tensor<B, 2, Int>, targets: Tensor<B, 1, Int>) -> f64
    where
        <Self::Network as AutodiffModule<B>>::InnerModule: ScoreNetwork<B::InnerBackend>,
    {
        let network = self.network().valid();
        let mut args = (inputs, targets);
        self.device().run(&mut args, |(inputs, targets)| {
            let scores = network.scores(inputs.clone().inner());
            self.loss()
                .evaluate(scores, targets.clone().inner())
                .into_scalar()
                .elem::<f64>()
        })
    }

    /// Sample-weighted mean loss and accuracy over `dataset`,
    /// without gradients.
    fn evaluate(&self, dataset: &EncodedDataset, batch_size: usize) -> Result<Evaluation>
    where
        <Self::Network as AutodiffModule<B>>::InnerModule: ScoreNetwork<B::InnerBackend>,
    {
        if dataset.is_empty() {
            bail!("cannot evaluate an empty dataset");
        }
        if batch_size == 0 {
            bail!("batch size must be at least 1");
        }

        let network = self.network().valid();
        let batcher = ClassificationBatcher::<B>::new(self.device().host().clone(), dataset.padding_index());
        let order: Vec<usize> = (0..dataset.len()).collect();

        let mut loss_sum = 0.0f64;
        let mut correct = 0usize;

        for chunk in order.chunks(batch_size) {
            let mut batch = batcher.batch(&dataset.select(chunk));
            let (loss, hits) = self.device().run(&mut batch, |b| {
                let scores = network.scores(b.inputs.clone().inner());
                let targets = b.targets.clone().inner();

                let loss = self
                    .loss()
                    .evaluate(scores.clone(), targets.clone())
                    .into_scalar()
                    .elem::<f64>();

                // argmax(1) returns [batch, 1]; flatten before comparing
                let hits = scores
                    .argmax(1)
                    .flatten::<1>(0, 1)
                    .equal(targets)
                    .int()
                    .sum()
                    .into_scalar()
                    .elem::<i64>();

                (loss, hits as usize)
            });

            loss_sum += loss * chunk.len() as f64;
            correct += hits;
        }

        let n = dataset.len() as f64;
        Ok(Evaluation { loss: loss_sum / n, accuracy: correct as f64 / n })
    }

    /// Fraction of `dataset` whose argmax prediction equals the label.
    fn accuracy(&self, dataset: &EncodedDataset, batch_size: usize) -> Result<f64>
    where
        <Self::Network as AutodiffModule<B>>::InnerModule: ScoreNetwork<B::InnerBackend>,
    {
        Ok(self.evaluate(dataset, batch_size)?.accuracy)
    }

    /// Write the full parameter snapshot to `path` (".mpk" appended).
    fn save(&self, path: &Path) -> Result<()> {
        checkpoint::save_module::<B, _>(self.network(), path)
    }

    /// Replace the parameters with the snapshot at `path`. Returns
    /// `false` and leaves the parameters alone when there is none.
    fn load(&mut self, path: &Path) -> Result<bool> {
        let device = self.device().target().clone();
        match checkpoint::load_module::<B, _>(self.network().clone(), path, &device)? {
            Some(network) => {
                self.set_network(network);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ─── Progress line ────────────────────────────────────────────────────────────
// Iteration and batch counters are 0-based, matching what the
// line has always shown: "Iteration 0/100 Batch 3/7".
struct Progress {
    epochs: usize,
    quiet:  bool,
}

impl Progress {
    fn line(&self, out: &mut impl Write, epoch: usize, batch: usize, batches: usize, loss: f64) {
        if self.quiet {
            return;
        }
        let _ = write!(
            out,
            "\rIteration {}/{} Batch {}/{}: Loss Value: {:.6} {}",
            epoch,
            self.epochs,
            batch,
            batches.saturating_sub(1),
            loss,
            SPINNER[batch % SPINNER.len()],
        );
        let _ = out.flush();
    }

    fn finish_epoch(&self, out: &mut impl Write, epoch: usize, batches: usize, loss: f64) {
        if self.quiet {
            return;
        }
        self.line(out, epoch, batches.saturating_sub(1), batches, loss);
        let _ = writeln!(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    #[test]
    fn test_batch_indices_cover_every_index_once() {
        let mut rng = StdRng::seed_from_u64(3);
        let batches = batch_indices(23, 5, &mut rng).unwrap();

        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![5, 5, 5, 5, 3]);

        let flat: Vec<usize> = batches.into_iter().flatten().collect();
        let distinct: HashSet<usize> = flat.iter().copied().collect();
        assert_eq!(flat.len(), 23);
        assert_eq!(distinct, (0..23).collect());
    }

    #[test]
    fn test_batch_indices_exact_multiple_has_no_short_batch() {
        let mut rng = StdRng::seed_from_u64(3);
        let batches = batch_indices(20, 5, &mut rng).unwrap();
        assert_eq!(batches.len(), 4);
        assert!(batches.iter().all(|b| b.len() == 5));
    }

    #[test]
    fn test_batch_indices_reshuffle_each_call() {
        let mut rng = StdRng::seed_from_u64(11);
        let first = batch_indices(50, 50, &mut rng).unwrap();
        let second = batch_indices(50, 50, &mut rng).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_batch_indices_edge_cases() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(batch_indices(10, 0, &mut rng).is_err());
        assert!(batch_indices(0, 4, &mut rng).unwrap().is_empty());
        assert_eq!(batch_indices(3, 10, &mut rng).unwrap().len(), 1);
    }

    #[test]
    fn test_cross_entropy_of_uniform_scores_is_ln_classes() {
        use burn::backend::NdArray;

        let device = Default::default();
        let scores = Tensor::<NdArray, 2>::zeros([4, 2], &device);
        let targets = Tensor::<NdArray, 1, Int>::from_ints([0, 1, 1, 0], &device);
        let loss = CategoricalCrossEntropy
            .evaluate(scores, targets)
            .into_scalar()
            .elem::<f64>();
        assert!((loss - std::f64::consts::LN_2).abs() < 1e-5);
    }

    #[test]
    fn test_progress_line_counts_from_zero_and_cycles_spinner() {
        let progress = Progress { epochs: 100, quiet: false };
        let mut out = Vec::new();
        progress.line(&mut out, 0, 3, 7, 0.5);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\rIteration 0/100 Batch 3/6: Loss Value: 0.500000 \\"
        );

        let glyphs: Vec<char> = (0..4)
            .map(|batch| {
                let mut out = Vec::new();
                progress.line(&mut out, 1, batch, 4, 1.0);
                String::from_utf8(out).unwrap().chars().last().unwrap()
            })
            .collect();
        assert_eq!(glyphs, vec!['\\', '/', '—', '\\']);
    }

    #[test]
    fn test_progress_finish_epoch_ends_line_and_quiet_writes_nothing() {
        let mut out = Vec::new();
        Progress { epochs: 2, quiet: false }.finish_epoch(&mut out, 1, 3, 0.25);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\rIteration 1/2 Batch 2/2: Loss Value: 0.250000 —\n"
        );

        let mut silent = Vec::new();
        Progress { epochs: 2, quiet: true }.finish_epoch(&mut silent, 1, 3, 0.25);
        assert!(silent.is_empty());
    }
}
