//! Workspace facade crate.
//!
//! Re-exports the public surface of `core-storage` so host applications can
//! depend on `sandboxfs-workspace` alone and toggle the documented features
//! (`desktop-shims`) without wiring each workspace crate individually.

pub use core_storage::*;
