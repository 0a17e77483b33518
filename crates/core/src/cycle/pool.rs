//! Bounded task pool.
//!
//! Caps how many store tasks are in flight at once. Admission is gated by a
//! semaphore: `submit` suspends the caller until a slot frees up, then spawns
//! the task on the tokio runtime holding that slot until it finishes.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, warn};

/// Pool of spawned tasks with at most `capacity` running concurrently.
///
/// The pool only tracks completion. Tasks report their own outcome.
pub struct BoundedTaskPool {
    capacity: usize,
    semaphore: Arc<Semaphore>,
    tasks: JoinSet<()>,
    submitted: u64,
}

impl BoundedTaskPool {
    /// Creates a pool admitting `capacity` concurrent tasks (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            warn!("Task pool capacity of 0 requested, using 1");
            1
        } else {
            capacity
        };

        Self {
            capacity,
            semaphore: Arc::new(Semaphore::new(capacity)),
            tasks: JoinSet::new(),
            submitted: 0,
        }
    }

    /// Maximum number of concurrently running tasks.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tasks currently holding a slot.
    pub fn outstanding(&self) -> usize {
        self.capacity
            .saturating_sub(self.semaphore.available_permits())
    }

    /// Total tasks admitted since creation.
    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    /// Admits `task`, waiting for a free slot if the pool is full.
    pub async fn submit<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // Reap finished tasks so the join set does not grow with the run.
        while let Some(result) = self.tasks.try_join_next() {
            Self::log_join(result);
        }

        // The semaphore is never closed, so acquisition only fails if that changes.
        let permit = match Arc::clone(&self.semaphore).acquire_owned().await {
            Ok(permit) => Some(permit),
            Err(e) => {
                error!("Task pool semaphore unavailable, running task unbounded: {}", e);
                None
            }
        };

        self.submitted += 1;
        self.tasks.spawn(async move {
            let _permit = permit;
            task.await;
        });
    }

    /// Waits until every admitted task has finished.
    pub async fn drain(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            Self::log_join(result);
        }
    }

    fn log_join(result: Result<(), JoinError>) {
        if let Err(e) = result {
            if e.is_panic() {
                error!("Pooled task panicked: {}", e);
            } else {
                warn!("Pooled task did not complete: {}", e);
            }
        }
    }
}

impl Drop for BoundedTaskPool {
    fn drop(&mut self) {
        // Dropping a JoinSet aborts its tasks; the pool never cancels work.
        self.tasks.detach_all();
    }
}
