//! Fixed-size, reference-counted audio blocks.
//!
//! Blocks come from an [`AudioBlockPool`] (normally a `static`). An
//! [`AudioBlockMut`] is the unique writable handle to a freshly allocated
//! block; [`AudioBlockMut::into_shared`] turns it into a cloneable
//! [`AudioBlockRef`]. Dropping the last handle returns the slot to its pool.

pub mod pool;
mod ref_types;

pub use pool::{AudioBlockData, AudioBlockPool};
pub use ref_types::{AudioBlockMut, AudioBlockRef};
