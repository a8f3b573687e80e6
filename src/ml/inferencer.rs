// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Rebuilds the classifier from `classifier_config.json`, loads
// the trained snapshot into it and scores encoded documents.
//
// The embedding table starts as zeros: the snapshot carries the
// pretrained vectors, so the GloVe file is not needed again.
use anyhow::{anyhow, Result};
use burn::prelude::*;

use crate::data::{batcher::ClassificationBatcher, embeddings::WeightMatrix};
use crate::domain::prediction::Prediction;
use crate::infra::checkpoint::{self, CheckpointManager};
use crate::ml::backend::{self, BackendKind};
use crate::ml::classifier::GruClassifierNetwork;
use crate::ml::device::ExecutionDevice;

type WgpuBackend    = burn::backend::Wgpu;
type NdArrayBackend = burn::backend::NdArray;

pub struct Inferencer<B: Backend> {
    network: GruClassifierNetwork<B>,
    batcher: ClassificationBatcher<B>,
    device:  ExecutionDevice<B::Device>,
}

impl<B: Backend> Inferencer<B> {
    pub fn from_checkpoint(ckpt: &CheckpointManager, device: ExecutionDevice<B::Device>) -> Result<Self> {
        let cfg = ckpt.load_classifier_config()?;
        let placeholder = WeightMatrix::zeros(cfg.vocab_size, cfg.embedding_dim);
        let network = cfg.init_network::<B>(&placeholder, device.target())?;

        let path = ckpt.model_path();
        let network = checkpoint::load_module::<B, _>(network, &path, device.target())?
            .ok_or_else(|| {
                anyhow!(
                    "No trained model at '{}'. Have you run 'train' first?",
                    checkpoint::snapshot_file(&path).display()
                )
            })?;

        tracing::info!("Model loaded from checkpoint");
        Ok(Self::new(network, device))
    }

    pub fn new(network: GruClassifierNetwork<B>, device: ExecutionDevice<B::Device>) -> Self {
        let batcher = ClassificationBatcher::new(device.host().clone(), network.padding_index);
        Self { network, batcher, device }
    }

    pub fn padding_index(&self) -> usize {
        self.network.padding_index
    }

    /// Class probabilities for one encoded document.
    pub fn probabilities(&self, indices: &[usize]) -> Result<Vec<f32>> {
        let mut inputs = self.batcher.inputs(&[indices]);
        let probs = self.device.run(&mut inputs, |x| self.network.predict_proba(x.clone()));

        probs
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read probabilities: {e:?}"))
    }

    /// Most likely class and its probability.
    pub fn predict(&self, indices: &[usize]) -> Result<Prediction> {
        let probs = self.probabilities(indices)?;
        tracing::debug!("Class probabilities: {:?}", probs);
        Prediction::from_probabilities(&probs).ok_or_else(|| anyhow!("model produced no classes"))
    }
}

// ─── Backend dispatch ─────────────────────────────────────────────────────────
/// An inferencer on whichever backend the user picked.
pub enum LoadedClassifier {
    Wgpu(Inferencer<WgpuBackend>),
    NdArray(Inferencer<NdArrayBackend>),
}

impl LoadedClassifier {
    pub fn load(ckpt: &CheckpointManager, kind: BackendKind, accelerator: bool) -> Result<Self> {
        Ok(match kind {
            BackendKind::Wgpu => {
                Self::Wgpu(Inferencer::from_checkpoint(ckpt, backend::wgpu_device(accelerator))?)
            }
            BackendKind::NdArray => {
                Self::NdArray(Inferencer::from_checkpoint(ckpt, backend::ndarray_device())?)
            }
        })
    }

    pub fn predict(&self, indices: &[usize]) -> Result<Prediction> {
        match self {
            Self::Wgpu(inf)    => inf.predict(indices),
            Self::NdArray(inf) => inf.predict(indices),
        }
    }
}
