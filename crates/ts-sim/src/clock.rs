//! Millisecond time sources.
//!
//! Dispensing integrates over whatever elapsed time the clock reports, so the
//! same controller runs in real time ([`SystemClock`]) or as fast as the host
//! can tick it ([`ManualClock`]).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of "now" in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> f64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        chrono::Utc::now().timestamp_millis() as f64
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same time, so a test (or a batch run) can keep one handle
/// and give another to the engine.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start_ms.to_bits())),
        }
    }

    pub fn set(&self, now_ms: f64) {
        self.bits.store(now_ms.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: f64) {
        // Single writer in practice; a CAS loop keeps concurrent advances exact.
        let mut current = self.bits.load(Ordering::SeqCst);
        loop {
            let next = (f64::from_bits(current) + delta_ms).to_bits();
            match self
                .bits
                .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_ms(&self) -> f64 {
        (**self).now_ms()
    }
}
