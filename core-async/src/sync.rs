//! Synchronization primitives.
//!
//! All primitives are async-aware Tokio types: they are `Send + Sync`, never
//! block the executor, and can be shared across spawned tasks.
//!
//! `OnceCell` is the single-flight latch used for lazily initialized shared
//! resources: concurrent first callers of `get_or_try_init` wait on the one
//! initializer in flight instead of each running their own.
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::OnceCell;
//!
//! # core_async::runtime::block_on(async {
//! let cell: OnceCell<u32> = OnceCell::new();
//! let value = cell
//!     .get_or_try_init(|| async { Ok::<_, ()>(7) })
//!     .await
//!     .unwrap();
//! assert_eq!(*value, 7);
//! # });
//! ```

pub use tokio::sync::{
    mpsc, oneshot, AcquireError, Mutex, MutexGuard, OnceCell, OwnedSemaphorePermit, RwLock,
    RwLockReadGuard, RwLockWriteGuard, Semaphore, SemaphorePermit,
};
