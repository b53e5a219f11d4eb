//! Task spawning and structured fan-out.
//!
//! [`spawn`] is a thin wrapper over `tokio::task::spawn`. [`TaskGroup`] adds
//! structured concurrency on top of `tokio::task::JoinSet`: every task spawned
//! into a group is awaited by [`TaskGroup::join_all`] before it returns, so a
//! caller never leaves work running behind its back.
//!
//! # Examples
//!
//! ```rust
//! use core_async::task::{self, TaskGroup};
//!
//! # core_async::runtime::block_on(async {
//! let handle = task::spawn(async { 42 });
//! assert_eq!(handle.await.unwrap(), 42);
//!
//! let mut group = TaskGroup::new();
//! group.spawn(async { "left" });
//! group.spawn(async { "right" });
//! assert_eq!(group.join_all().await.unwrap(), vec!["left", "right"]);
//! # });
//! ```

use std::fmt;
use std::future::Future;

use tokio::task::JoinSet;

pub use tokio::task::{spawn_blocking, yield_now, JoinError, JoinHandle};

/// Result type for task operations.
pub type Result<T> = std::result::Result<T, JoinError>;

/// Spawns a new asynchronous task on the current Tokio runtime.
///
/// The spawned task may run on a different thread; the returned
/// `JoinHandle` can be awaited for its output.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

/// A launch-all-then-await-all group of tasks.
///
/// Tasks run concurrently and may finish in any order, but
/// [`join_all`](Self::join_all) hands the outputs back in spawn order.
/// `join_all` always drains the whole group, even after a task has panicked,
/// so no sibling is abandoned mid-flight.
///
/// Dropping a group without joining it aborts the tasks still running.
pub struct TaskGroup<T> {
    tasks: JoinSet<(usize, T)>,
    spawned: usize,
}

impl<T> TaskGroup<T>
where
    T: Send + 'static,
{
    /// Creates an empty group.
    pub fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
            spawned: 0,
        }
    }

    /// Spawns `future` as a member of this group.
    pub fn spawn<F>(&mut self, future: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let index = self.spawned;
        self.spawned += 1;
        self.tasks.spawn(async move { (index, future.await) });
    }

    /// Number of tasks that have not been joined yet.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for every task and returns their outputs in spawn order.
    ///
    /// # Errors
    ///
    /// Returns the first `JoinError` observed (a panicked task) once all
    /// remaining tasks have completed.
    pub async fn join_all(mut self) -> Result<Vec<T>> {
        let mut slots: Vec<Option<T>> = (0..self.spawned).map(|_| None).collect();
        let mut first_error = None;

        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok((index, output)) => slots[index] = Some(output),
                Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(slots.into_iter().flatten().collect()),
        }
    }
}

impl<T> Default for TaskGroup<T>
where
    T: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TaskGroup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskGroup")
            .field("pending", &self.tasks.len())
            .field("spawned", &self.spawned)
            .finish()
    }
}
