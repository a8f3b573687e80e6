// ============================================================
// Layer 5 — Backend Selection
// ============================================================
// The only place concrete Burn backends are named.
//
//   wgpu     Autodiff<Wgpu>     batches built on wgpu's CPU adapter,
//                               moved to the default adapter for
//                               each call; `--cpu` stays on the CPU
//   ndarray  Autodiff<NdArray>  pure CPU, always available
//
// Everything downstream is generic over `B: Backend` and only
// sees the `ExecutionDevice` built here.

use burn::backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ml::device::ExecutionDevice;

pub type WgpuTrainBackend    = Autodiff<Wgpu>;
pub type NdArrayTrainBackend = Autodiff<NdArray>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Wgpu,
    NdArray,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Wgpu    => write!(f, "wgpu"),
            BackendKind::NdArray => write!(f, "ndarray"),
        }
    }
}

/// Host is wgpu's CPU adapter; calls run on the default adapter
/// when `accelerator` is set.
pub fn wgpu_device(accelerator: bool) -> ExecutionDevice<WgpuDevice> {
    let device = ExecutionDevice::new(WgpuDevice::Cpu, WgpuDevice::DefaultDevice, accelerator);
    tracing::info!("Using WGPU device: {:?}", device.target());
    device
}

pub fn ndarray_device() -> ExecutionDevice<NdArrayDevice> {
    tracing::info!("Using NdArray CPU backend");
    ExecutionDevice::host_only(NdArrayDevice::Cpu)
}
