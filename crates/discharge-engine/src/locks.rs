//! Per-Reading Lock Pool

use std::sync::{Mutex, MutexGuard};

/// Striped mutex pool keyed by reading id.
///
/// Holding the stripe for a reading makes its delete-then-recompute
/// sequence atomic with respect to other events for the same reading.
/// Distinct readings almost always map to distinct stripes and proceed
/// in parallel; a hash collision only costs some extra serialization,
/// never correctness.
pub struct LockPool {
    stripes: Vec<Mutex<()>>,
}

impl LockPool {
    pub fn new(stripes: usize) -> Self {
        let count = stripes.max(1);
        Self {
            stripes: (0..count).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Acquire the stripe guarding `reading_id`, blocking until free.
    pub fn lock(&self, reading_id: i64) -> MutexGuard<'_, ()> {
        match self.stripes[self.index(reading_id)].lock() {
            Ok(guard) => guard,
            // A panic while holding the stripe poisons it; the () state
            // cannot be corrupt, so keep serving.
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn index(&self, reading_id: i64) -> usize {
        reading_id.unsigned_abs() as usize % self.stripes.len()
    }
}
