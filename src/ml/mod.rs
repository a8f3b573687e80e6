// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All model code lives here. The data layer only builds Int
// tensors; everything with parameters, gradients or devices is
// in this layer.
//
//   device.rs     - moves call arguments to the execution device
//                   and back, so model code never places tensors
//
//   trainable.rs  - the contract every trainable model meets,
//                   plus the shared step / epoch loop /
//                   validation / checkpoint behaviour built on it
//
//   classifier.rs - embedding → GRU → linear text classifier
//
//   backend.rs    - the concrete Burn backends and their devices
//
//   trainer.rs    - one training run on the chosen backend
//
//   inferencer.rs - loads a trained classifier and scores text
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Device transfer adapter
pub mod device;

/// Trainable model contract and generic training loop
pub mod trainable;

/// GRU sequence classifier
pub mod classifier;

/// Backend choice (wgpu / ndarray)
pub mod backend;

/// Training run: metrics, resume, final snapshot
pub mod trainer;

/// Inference engine: loads checkpoint and predicts a class
pub mod inferencer;
