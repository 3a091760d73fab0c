use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const FREE: u64 = 0;

/// Non-reentrant "expansion in progress" flag.
///
/// Holding the gate is represented by a [`GateGuard`]; dropping the guard
/// releases it on every exit path, including unwinding. Each acquisition gets
/// a fresh generation so a guard outlived by [`ExpansionGate::force_release`]
/// can tell it is no longer current.
#[derive(Debug, Default)]
pub struct ExpansionGate {
    holder: AtomicU64,
    generations: AtomicU64,
}

impl ExpansionGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn try_acquire(self: &Arc<Self>) -> Option<GateGuard> {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        self.holder
            .compare_exchange(FREE, generation, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GateGuard {
                gate: Arc::clone(self),
                generation,
            })
    }

    pub fn is_held(&self) -> bool {
        self.holder.load(Ordering::Acquire) != FREE
    }

    /// Clear the gate regardless of who holds it
    pub fn force_release(&self) {
        self.holder.store(FREE, Ordering::Release);
    }
}

#[derive(Debug)]
pub struct GateGuard {
    gate: Arc<ExpansionGate>,
    generation: u64,
}

impl GateGuard {
    /// Whether this guard still owns the gate
    pub fn is_current(&self) -> bool {
        self.gate.holder.load(Ordering::Acquire) == self.generation
    }
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        // only release what we still own
        let _ = self.gate.holder.compare_exchange(
            self.generation,
            FREE,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}
