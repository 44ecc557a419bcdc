//! Type aliases for commonly used shared-state types.
//!
//! Complex types like `Arc<RwLock<Arc<ToolpathPlan>>>` are hard to read at a
//! glance; the aliases give them names that say how they are meant to be used.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dowelkit_core::types::*;
//!
//! // Instead of: Arc<RwLock<Snapshot>>
//! let state: ThreadSafeRw<Snapshot> = thread_safe_rw(Snapshot::default());
//! ```

use parking_lot::RwLock;
use std::sync::Arc;

/// A thread-safe reader-writer lock wrapper for read-heavy workloads.
///
/// Use when reads greatly outnumber writes, such as a render loop reading the
/// most recently published toolpath while edits arrive occasionally.
pub type ThreadSafeRw<T> = Arc<RwLock<T>>;

/// Create a new `ThreadSafeRw<T>` from a value.
#[inline]
pub fn thread_safe_rw<T>(value: T) -> ThreadSafeRw<T> {
    Arc::new(RwLock::new(value))
}
