//! Async runtime abstraction layer for sandboxfs.
//!
//! Every other crate in the workspace goes through this crate instead of
//! depending on Tokio directly, so the executor surface stays in one place.
//!
//! # Modules
//!
//! - `task`: Task spawning and the structured [`TaskGroup`](task::TaskGroup)
//! - `sync`: Synchronization primitives (OnceCell, Semaphore, Mutex, RwLock)
//! - `io`: Async read/write traits and extension helpers
//! - `runtime`: Runtime handles and a lightweight `block_on`
//!
//! # Examples
//!
//! ```rust
//! use core_async::task::TaskGroup;
//!
//! # core_async::runtime::block_on(async {
//! let mut group = TaskGroup::new();
//! for n in 0..4u32 {
//!     group.spawn(async move { n * 2 });
//! }
//! let doubled = group.join_all().await.unwrap();
//! assert_eq!(doubled, vec![0, 2, 4, 6]);
//! # });
//! ```

pub mod io;
pub mod runtime;
pub mod sync;
pub mod task;

pub use task::{spawn, TaskGroup};
