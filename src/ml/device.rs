// ============================================================
// Layer 5 — Device Transfer Adapter
// ============================================================
// Keeps placement logic out of model code.
//
// A call is wrapped like this:
//
//   args on their own devices
//        │  DeviceGuard::new  → record each origin, move to target
//        ▼
//   f(&args)                  → runs on the execution device
//        │  Drop              → move each arg back to its origin
//        ▼
//   args where they started, f's result untouched
//
// The return value is deliberately NOT relocated: whoever
// calls `run` decides where results should live.
//
// Restoration happens in `Drop`, so it also runs when `f`
// returns early through `?` or unwinds from a panic.
//
// Only types implementing `Relocatable` can be moved. Anything
// else a call needs is captured by the closure and passes
// through untouched.

use burn::prelude::*;
use burn::tensor::BasicOps;
use std::{fmt::Debug, marker::PhantomData, ops::Deref};

use crate::data::batcher::ClassificationBatch;

// ─── Relocatable ──────────────────────────────────────────────────────────────
/// A value whose physical placement can change without changing
/// its logical contents.
pub trait Relocatable<D>: Clone {
    /// Where the value lived before relocation. Composite values
    /// record one origin per component.
    type Origin;

    fn origin(&self) -> Self::Origin;

    fn relocate(self, device: &D) -> Self;

    fn restore(self, origin: &Self::Origin) -> Self;
}

impl<B, const N: usize, K> Relocatable<B::Device> for Tensor<B, N, K>
where
    B: Backend,
    K: BasicOps<B>,
{
    type Origin = B::Device;

    fn origin(&self) -> Self::Origin {
        self.device()
    }

    fn relocate(self, device: &B::Device) -> Self {
        self.to_device(device)
    }

    fn restore(self, origin: &Self::Origin) -> Self {
        self.to_device(origin)
    }
}

impl<D, T: Relocatable<D>> Relocatable<D> for Option<T> {
    type Origin = Option<T::Origin>;

    fn origin(&self) -> Self::Origin {
        self.as_ref().map(T::origin)
    }

    fn relocate(self, device: &D) -> Self {
        self.map(|v| v.relocate(device))
    }

    fn restore(self, origin: &Self::Origin) -> Self {
        match (self, origin) {
            (Some(v), Some(o)) => Some(v.restore(o)),
            (v, _) => v,
        }
    }
}

impl<D, T: Relocatable<D>> Relocatable<D> for Vec<T> {
    type Origin = Vec<T::Origin>;

    fn origin(&self) -> Self::Origin {
        self.iter().map(T::origin).collect()
    }

    fn relocate(self, device: &D) -> Self {
        self.into_iter().map(|v| v.relocate(device)).collect()
    }

    fn restore(self, origin: &Self::Origin) -> Self {
        self.into_iter().zip(origin).map(|(v, o)| v.restore(o)).collect()
    }
}

impl<D, A: Relocatable<D>, C: Relocatable<D>> Relocatable<D> for (A, C) {
    type Origin = (A::Origin, C::Origin);

    fn origin(&self) -> Self::Origin {
        (self.0.origin(), self.1.origin())
    }

    fn relocate(self, device: &D) -> Self {
        (self.0.relocate(device), self.1.relocate(device))
    }

    fn restore(self, origin: &Self::Origin) -> Self {
        (self.0.restore(&origin.0), self.1.restore(&origin.1))
    }
}

impl<D, A, C, E> Relocatable<D> for (A, C, E)
where
    A: Relocatable<D>,
    C: Relocatable<D>,
    E: Relocatable<D>,
{
    type Origin = (A::Origin, C::Origin, E::Origin);

    fn origin(&self) -> Self::Origin {
        (self.0.origin(), self.1.origin(), self.2.origin())
    }

    fn relocate(self, device: &D) -> Self {
        (self.0.relocate(device), self.1.relocate(device), self.2.relocate(device))
    }

    fn restore(self, origin: &Self::Origin) -> Self {
        (
            self.0.restore(&origin.0),
            self.1.restore(&origin.1),
            self.2.restore(&origin.2),
        )
    }
}

impl<B: Backend> Relocatable<B::Device> for ClassificationBatch<B> {
    type Origin = (B::Device, B::Device);

    fn origin(&self) -> Self::Origin {
        (self.inputs.device(), self.targets.device())
    }

    fn relocate(self, device: &B::Device) -> Self {
        Self {
            inputs:  self.inputs.to_device(device),
            targets: self.targets.to_device(device),
        }
    }

    fn restore(self, origin: &Self::Origin) -> Self {
        Self {
            inputs:  self.inputs.to_device(&origin.0),
            targets: self.targets.to_device(&origin.1),
        }
    }
}

// ─── ExecutionDevice ──────────────────────────────────────────────────────────
/// The process-wide choice of where computation runs, passed
/// explicitly to everything that places tensors.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionDevice<D> {
    host:        D,
    accelerator: Option<D>,
}

impl<D: Clone + Debug> ExecutionDevice<D> {
    /// Run everything on the host.
    pub fn host_only(host: D) -> Self {
        Self { host, accelerator: None }
    }

    /// Use `accelerator` when `available`, otherwise stay on `host`.
    pub fn new(host: D, accelerator: D, available: bool) -> Self {
        let accelerator = available.then_some(accelerator);
        tracing::debug!("Execution device: host={:?} accelerator={:?}", host, accelerator);
        Self { host, accelerator }
    }

    /// Where freshly built data lives before a call.
    pub fn host(&self) -> &D {
        &self.host
    }

    /// Where calls execute.
    pub fn target(&self) -> &D {
        self.accelerator.as_ref().unwrap_or(&self.host)
    }

    pub fn is_accelerated(&self) -> bool {
        self.accelerator.is_some()
    }

    /// Move `args` to the target until the returned guard drops.
    pub fn place<'a, T: Relocatable<D>>(&self, args: &'a mut T) -> DeviceGuard<'a, D, T> {
        DeviceGuard::new(args, self.target())
    }

    /// Call `f` with `args` placed on the target device, then put
    /// them back. `f`'s result is returned as-is.
    pub fn run<T, R, F>(&self, args: &mut T, f: F) -> R
    where
        T: Relocatable<D>,
        F: FnOnce(&T) -> R,
    {
        let placed = self.place(args);
        f(&*placed)
    }
}

// ─── DeviceGuard ──────────────────────────────────────────────────────────────
/// Scoped relocation of one argument set. Not reentrant: the same
/// value must not be placed by two overlapping guards.
pub struct DeviceGuard<'a, D, T: Relocatable<D>> {
    slot:    &'a mut T,
    origin:  Option<T::Origin>,
    _device: PhantomData<fn(&D)>,
}

impl<'a, D, T: Relocatable<D>> DeviceGuard<'a, D, T> {
    pub fn new(slot: &'a mut T, target: &D) -> Self {
        let origin = slot.origin();
        *slot = slot.clone().relocate(target);
        Self { slot, origin: Some(origin), _device: PhantomData }
    }
}

impl<'a, D, T: Relocatable<D>> Deref for DeviceGuard<'a, D, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.slot
    }
}

impl<'a, D, T: Relocatable<D>> Drop for DeviceGuard<'a, D, T> {
    fn drop(&mut self) {
        if let Some(origin) = self.origin.take() {
            *self.slot = self.slot.clone().restore(&origin);
        }
    }
}
