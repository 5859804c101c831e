use sessionpulse_types::ViolationKind;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lifetime threshold-violation counters, one per label.
///
/// Unlike the windowed counts in performance reports these never age out.
#[derive(Debug, Default)]
pub struct ViolationCounters {
    mtba: AtomicU64,
    ttft: AtomicU64,
    e2e_latency: AtomicU64,
}

impl ViolationCounters {
    fn slot(&self, kind: ViolationKind) -> &AtomicU64 {
        match kind {
            ViolationKind::Mtba => &self.mtba,
            ViolationKind::Ttft => &self.ttft,
            ViolationKind::E2eLatency => &self.e2e_latency,
        }
    }

    pub fn increment(&self, kind: ViolationKind) {
        self.slot(kind).fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, kind: ViolationKind) -> u64 {
        self.slot(kind).load(Ordering::Relaxed)
    }
}
