//! # DEEPSHAFT Core
//!
//! Memory primitives shared by the world engine and its hosts.
//!
//! Everything in here is sized once at construction. A pool that runs out of
//! slots reports it through `None` instead of growing, so callers decide how
//! to degrade (the world engine simply retries next tick).
//!
//! ## Example
//!
//! ```rust
//! use deepshaft_core::PoolAllocator;
//!
//! let mut rocks: PoolAllocator<f32> = PoolAllocator::new(2);
//! let a = rocks.allocate(1.0);
//! let b = rocks.allocate(2.0);
//! assert!(a.is_some() && b.is_some());
//! assert!(rocks.allocate(3.0).is_none());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod memory;

pub use memory::{PoolAllocator, PoolHandle};
