//! Sync engine subsystem.
//!
//! # Data Flow
//! ```text
//! start():
//!     bootstrap fetch (all groups) → notify on_full_refresh → record digests
//!     → spawn poll worker
//!
//! poll worker:
//!     listen(current digests) → changed groups → fetch(changed)
//!     → notify on_incremental_update → record digests → repeat
//!
//! stop():
//!     broadcast shutdown → in-flight listen cancelled → join worker
//! ```

pub mod backoff;
pub mod engine;

pub use engine::SyncEngine;
