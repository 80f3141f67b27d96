//! Batched persistence of crawled pages
//!
//! Workers hand finished pages to the batcher instead of writing to the
//! database directly. Units accumulate in a buffer that is flushed when it
//! reaches the batch size, and on a timer driven by the orchestrator, so a
//! slow crawl still persists promptly. Each unit is one transaction: the
//! page row plus its links and images commit together or not at all.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::storage::{PageUnit, Storage};

/// Buffers page units and writes them in batches
pub struct PersistenceBatcher<S: Storage> {
    storage: Arc<Mutex<S>>,
    buffer: Mutex<Vec<PageUnit>>,
    batch_size: usize,
    inserted: AtomicU64,
    dropped: AtomicU64,
}

impl<S: Storage> PersistenceBatcher<S> {
    pub fn new(storage: Arc<Mutex<S>>, batch_size: usize) -> Self {
        Self {
            storage,
            buffer: Mutex::new(Vec::new()),
            batch_size: batch_size.max(1),
            inserted: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Queues a page unit, flushing if the buffer is full
    pub fn submit(&self, unit: PageUnit) {
        let should_flush = {
            let mut buffer = lock(&self.buffer);
            buffer.push(unit);
            buffer.len() >= self.batch_size
        };
        if should_flush {
            self.flush();
        }
    }

    /// Writes all buffered units, returning the number persisted
    ///
    /// A failed insert is retried once; a unit that fails twice is logged
    /// and dropped so one bad page cannot wedge the batch.
    pub fn flush(&self) -> usize {
        let units: Vec<PageUnit> = {
            let mut buffer = lock(&self.buffer);
            buffer.drain(..).collect()
        };
        if units.is_empty() {
            return 0;
        }

        let mut persisted = 0;
        let mut storage = lock(&self.storage);
        for unit in &units {
            match storage.insert_page_unit(unit) {
                Ok(_) => persisted += 1,
                Err(first) => match storage.insert_page_unit(unit) {
                    Ok(_) => persisted += 1,
                    Err(second) => {
                        warn!(
                            url = %unit.page.url,
                            first_error = %first,
                            retry_error = %second,
                            "dropping page unit after failed retry"
                        );
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                    }
                },
            }
        }
        drop(storage);

        self.inserted.fetch_add(persisted as u64, Ordering::Relaxed);
        debug!(persisted, "flushed page batch");
        persisted as usize
    }

    /// Total pages persisted so far
    pub fn inserted(&self) -> u64 {
        self.inserted.load(Ordering::Relaxed)
    }

    /// Total units dropped after a failed retry
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Number of units waiting in the buffer
    pub fn pending(&self) -> usize {
        lock(&self.buffer).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
