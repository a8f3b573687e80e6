// ============================================================
// Layer 5 — GRU Sequence Classifier
// ============================================================
// Architecture:
//
//   input [batch, seq] (vocabulary indices, right-padded)
//     │
//     ▼
//   Embedding (pretrained weight matrix, frozen by default)
//     │  × mask   ← padding positions forced to zero
//     ▼
//   GRU, one layer, batch-major, h₀ = 0 every call
//     │  keep the LAST time step only
//     ▼
//   Linear hidden → classes
//     │
//     ▼
//   raw scores [batch, classes]     (softmax only in predict_proba)
//
// The last step is taken even for short documents in a padded
// batch: the GRU keeps running over the zero vectors of the
// padded tail before its final state is read.
//
// Loss: categorical cross-entropy. Optimizer: one Adam instance
// created at construction and kept for the classifier's life.
//
// Reference: Cho et al. (2014) GRU
//            Burn Book §3 (Building Blocks)

use anyhow::{bail, Result};
use burn::{
    module::{AutodiffModule, Param},
    nn::{
        gru::{Gru, GruConfig},
        Embedding, EmbeddingConfig, Linear, LinearConfig,
    },
    optim::{AdamConfig, Optimizer},
    prelude::*,
    tensor::{activation::softmax, backend::AutodiffBackend},
};

use crate::data::embeddings::WeightMatrix;
use crate::ml::device::ExecutionDevice;
use crate::ml::trainable::{CategoricalCrossEntropy, ScoreNetwork, Trainable};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally: do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct SequenceClassifierConfig {
    /// Rows of the weight matrix, padding row included
    pub vocab_size:    usize,
    pub embedding_dim: usize,
    pub num_classes:   usize,
    #[config(default = 64)]
    pub hidden_size:   usize,
    /// Let the optimizer update the pretrained vectors
    #[config(default = false)]
    pub train_embedding: bool,
    #[config(default = 1e-3)]
    pub learning_rate: f64,
}

impl SequenceClassifierConfig {
    /// The padding index is always the last vocabulary row.
    pub fn padding_index(&self) -> usize {
        self.vocab_size.saturating_sub(1)
    }

    /// Adam with epsilon 1e-8 (burn's default is 1e-5).
    pub fn optimizer_config() -> AdamConfig {
        AdamConfig::new().with_epsilon(1e-8)
    }

    /// Build the bare network with `weights` as its embedding table.
    pub fn init_network<B: Backend>(
        &self,
        weights: &WeightMatrix,
        device:  &B::Device,
    ) -> Result<GruClassifierNetwork<B>> {
        if weights.rows() != self.vocab_size || weights.dim() != self.embedding_dim {
            bail!(
                "weight matrix is {}×{} but the classifier expects {}×{}",
                weights.rows(),
                weights.dim(),
                self.vocab_size,
                self.embedding_dim
            );
        }
        if self.num_classes == 0 {
            bail!("a classifier needs at least one class");
        }

        let table = Tensor::<B, 2>::from_data(
            TensorData::new(weights.as_slice().to_vec(), [weights.rows(), weights.dim()]),
            device,
        );
        let mut embedding = EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device);
        embedding.weight = Param::from_tensor(table).set_require_grad(self.train_embedding);

        let gru = GruConfig::new(self.embedding_dim, self.hidden_size, true).init(device);
        let output = LinearConfig::new(self.hidden_size, self.num_classes).init(device);

        Ok(GruClassifierNetwork {
            embedding,
            gru,
            output,
            padding_index: self.padding_index(),
            hidden_size: self.hidden_size,
        })
    }

    /// Build the trainable classifier: network on the execution
    /// device's target, a fresh Adam optimizer, cross-entropy loss.
    pub fn init<B: AutodiffBackend>(
        &self,
        weights: &WeightMatrix,
        device:  ExecutionDevice<B::Device>,
    ) -> Result<SequenceClassifier<B, impl Optimizer<GruClassifierNetwork<B>, B>>> {
        let network = self.init_network::<B>(weights, device.target())?;
        let optimizer = Self::optimizer_config().init::<B, GruClassifierNetwork<B>>();

        tracing::info!(
            "Classifier ready: vocab={} embedding_dim={} hidden={} classes={} train_embedding={}",
            self.vocab_size,
            self.embedding_dim,
            self.hidden_size,
            self.num_classes,
            self.train_embedding
        );

        Ok(SequenceClassifier {
            network,
            optimizer,
            loss: CategoricalCrossEntropy,
            learning_rate: self.learning_rate,
            device,
        })
    }
}

// ─── Network ──────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct GruClassifierNetwork<B: Backend> {
    pub embedding:     Embedding<B>,
    pub gru:           Gru<B>,
    pub output:        Linear<B>,
    pub padding_index: usize,
    pub hidden_size:   usize,
}

impl<B: Backend> GruClassifierNetwork<B> {
    /// Embedding lookup with every padding position zeroed.
    /// [batch, seq] → [batch, seq, embedding_dim]
    pub fn embed(&self, inputs: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let mask = inputs
            .clone()
            .not_equal_elem(self.padding_index as i64)
            .float()
            .unsqueeze_dim::<3>(2);
        self.embedding.forward(inputs) * mask
    }

    /// Raw class scores for the last time step.
    /// [batch, seq] → [batch, classes]
    pub fn forward(&self, inputs: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let [batch, seq] = inputs.dims();
        let device = inputs.device();

        let embedded = self.embed(inputs);
        let initial = Tensor::<B, 2>::zeros([batch, self.hidden_size], &device);
        let states = self.gru.forward(embedded, Some(initial));

        let last = states
            .slice([0..batch, seq - 1..seq, 0..self.hidden_size])
            .reshape([batch, self.hidden_size]);
        self.output.forward(last)
    }

    /// Row-wise class probabilities.
    pub fn predict_proba(&self, inputs: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        softmax(self.forward(inputs), 1)
    }
}

impl<B: Backend> ScoreNetwork<B> for GruClassifierNetwork<B> {
    fn scores(&self, inputs: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        self.forward(inputs)
    }
}

// ─── Trainable classifier ─────────────────────────────────────────────────────
pub struct SequenceClassifier<B: AutodiffBackend, O> {
    network:       GruClassifierNetwork<B>,
    optimizer:     O,
    loss:          CategoricalCrossEntropy,
    learning_rate: f64,
    device:        ExecutionDevice<B::Device>,
}

impl<B: AutodiffBackend, O> SequenceClassifier<B, O> {
    /// Class probabilities in evaluation mode (no autodiff graph).
    pub fn predict_proba(&self, inputs: Tensor<B, 2, Int>) -> Tensor<B::InnerBackend, 2> {
        let network = self.network.valid();
        let mut inputs = inputs;
        self.device.run(&mut inputs, |x| network.predict_proba(x.clone().inner()))
    }
}

impl<B, O> Trainable<B> for SequenceClassifier<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<GruClassifierNetwork<B>, B>,
{
    type Network = GruClassifierNetwork<B>;
    type Loss = CategoricalCrossEntropy;
    type Optim = O;

    fn forward(&self, inputs: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let mut inputs = inputs;
        self.device.run(&mut inputs, |x| self.network.forward(x.clone()))
    }

    fn loss(&self) -> &CategoricalCrossEntropy {
        &self.loss
    }

    fn optimizer(&mut self) -> &mut O {
        &mut self.optimizer
    }

    fn network(&self) -> &GruClassifierNetwork<B> {
        &self.network
    }

    fn set_network(&mut self, network: GruClassifierNetwork<B>) {
        self.network = network;
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn device(&self) -> &ExecutionDevice<B::Device> {
        &self.device
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::{EncodedDataset, EncodedSample};
    use crate::ml::trainable::{EpochObserver, FitOptions};
    use burn::backend::{Autodiff, NdArray};
    use rand::{rngs::StdRng, SeedableRng};

    type TB = Autodiff<NdArray>;

    /// good = 0, bad = 1, <pad> = 2
    fn weights() -> WeightMatrix {
        WeightMatrix::from_rows(vec![
            vec![1.0, 0.0, 1.0, 0.0],
            vec![0.0, 1.0, 0.0, 1.0],
            vec![0.0, 0.0, 0.0, 0.0],
        ])
        .unwrap()
    }

    fn config() -> SequenceClassifierConfig {
        SequenceClassifierConfig::new(3, 4, 2)
    }

    fn host() -> ExecutionDevice<<TB as Backend>::Device> {
        ExecutionDevice::host_only(Default::default())
    }

    fn good_bad_dataset(copies: usize) -> EncodedDataset {
        let mut samples = Vec::new();
        for _ in 0..copies {
            samples.push(EncodedSample::new(vec![0, 2, 2], 0));
            samples.push(EncodedSample::new(vec![1, 2, 2], 1));
        }
        EncodedDataset::new(samples, 2)
    }

    fn sample_inputs() -> Tensor<TB, 2, Int> {
        Tensor::<TB, 1, Int>::from_ints([0, 2, 2, 1, 2, 2], &Default::default()).reshape([2, 3])
    }

    fn as_vec(t: Tensor<NdArray, 2>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    fn quiet(epochs: usize, batch_size: usize) -> FitOptions {
        FitOptions { batch_size, epochs, quiet: true }
    }

    #[derive(Default)]
    struct LossLog(Vec<f64>);

    impl<M> EpochObserver<M> for LossLog {
        fn on_epoch_end(&mut self, _model: &M, _epoch: usize, mean_loss: f64) -> anyhow::Result<()> {
            self.0.push(mean_loss);
            Ok(())
        }
    }

    #[test]
    fn test_optimizer_uses_small_epsilon() {
        let adam = SequenceClassifierConfig::optimizer_config();
        assert_eq!(adam.epsilon, 1e-8);
    }

    #[test]
    fn test_forward_shapes_and_probabilities() {
        let model = config().with_hidden_size(8).init::<TB>(&weights(), host()).unwrap();

        assert_eq!(model.forward(sample_inputs()).dims(), [2, 2]);

        let probs = as_vec(model.predict_proba(sample_inputs()));
        for row in probs.chunks(2) {
            assert!((row.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_padding_positions_embed_to_zero() {
        // non-zero padding row, so only the mask can zero it
        let rows = WeightMatrix::from_rows((0..3).map(|i| vec![0.5 + i as f32; 4]).collect()).unwrap();
        let network = config().init_network::<NdArray>(&rows, &Default::default()).unwrap();

        let inputs = Tensor::<NdArray, 1, Int>::from_ints([0, 2], &Default::default()).reshape([1, 2]);
        let embedded = network.embed(inputs).into_data().to_vec::<f32>().unwrap();

        assert_eq!(&embedded[..4], &[0.5; 4]);
        assert_eq!(&embedded[4..], &[0.0; 4]);
    }

    #[test]
    fn test_mismatched_weights_are_rejected() {
        let wrong = WeightMatrix::zeros(5, 4);
        assert!(config().init_network::<NdArray>(&wrong, &Default::default()).is_err());
    }

    #[test]
    fn test_frozen_embedding_survives_a_step() {
        let dataset = good_bad_dataset(2);
        let mut model = config().init::<TB>(&weights(), host()).unwrap();
        let before = model.network().embedding.weight.val().inner().into_data().to_vec::<f32>().unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        model.update(&dataset, &quiet(2, 2), &mut rng, &mut ()).unwrap();

        let after = model.network().embedding.weight.val().inner().into_data().to_vec::<f32>().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_trainable_embedding_moves() {
        let dataset = good_bad_dataset(2);
        let cfg = config().with_train_embedding(true);
        let mut model = cfg.init::<TB>(&weights(), host()).unwrap();
        let before = model.network().embedding.weight.val().inner().into_data().to_vec::<f32>().unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        model.update(&dataset, &quiet(2, 2), &mut rng, &mut ()).unwrap();

        let after = model.network().embedding.weight.val().inner().into_data().to_vec::<f32>().unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_loss_decreases_on_separable_data() {
        let dataset = good_bad_dataset(10);
        let mut model = config().init::<TB>(&weights(), host()).unwrap();
        let mut log = LossLog::default();
        let mut rng = StdRng::seed_from_u64(5);

        let last = model.update(&dataset, &quiet(50, 8), &mut rng, &mut log).unwrap();

        assert_eq!(log.0.len(), 50);
        assert_eq!(last, log.0[49]);
        assert!(log.0[49] < log.0[0], "loss went from {} to {}", log.0[0], log.0[49]);
    }

    #[test]
    fn test_learns_good_versus_bad() {
        let dataset = good_bad_dataset(20);
        let mut model = config().init::<TB>(&weights(), host()).unwrap();
        let mut rng = StdRng::seed_from_u64(9);

        model.update(&dataset, &quiet(80, 8), &mut rng, &mut ()).unwrap();

        let probs = as_vec(model.predict_proba(sample_inputs()));
        assert!(probs[0] > 0.6, "p(good | [0,2,2]) = {}", probs[0]);
        assert!(probs[3] > 0.6, "p(bad | [1,2,2]) = {}", probs[3]);
        assert_eq!(model.accuracy(&dataset, 16).unwrap(), 1.0);
    }

    #[test]
    fn test_validation_does_not_update_parameters() {
        let model = config().init::<TB>(&weights(), host()).unwrap();
        let before = as_vec(model.predict_proba(sample_inputs()));

        let targets = Tensor::<TB, 1, Int>::from_ints([0, 1], &Default::default());
        let loss = model.validation(sample_inputs(), targets);

        assert!(loss.is_finite() && loss > 0.0);
        assert_eq!(as_vec(model.predict_proba(sample_inputs())), before);
    }

    #[test]
    fn test_checkpoint_round_trip_reproduces_outputs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("model");

        let mut trained = config().init::<TB>(&weights(), host()).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        trained.update(&good_bad_dataset(4), &quiet(3, 4), &mut rng, &mut ()).unwrap();
        trained.save(&path).unwrap();

        let mut fresh = config().init::<TB>(&weights(), host()).unwrap();
        assert!(fresh.load(&path).unwrap());

        let expected = as_vec(trained.predict_proba(sample_inputs()));
        let actual = as_vec(fresh.predict_proba(sample_inputs()));
        for (a, b) in expected.iter().zip(&actual) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_missing_checkpoint_leaves_parameters_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let mut model = config().init::<TB>(&weights(), host()).unwrap();
        let before = as_vec(model.predict_proba(sample_inputs()));

        assert!(!model.load(&tmp.path().join("absent")).unwrap());
        assert_eq!(as_vec(model.predict_proba(sample_inputs())), before);
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let mut model = config().init::<TB>(&weights(), host()).unwrap();
        let empty = EncodedDataset::new(Vec::new(), 2);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(model.update(&empty, &quiet(1, 4), &mut rng, &mut ()).is_err());
    }
}
