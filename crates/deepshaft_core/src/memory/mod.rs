//! # Memory Management
//!
//! Pre-allocated pools for short-lived gameplay objects.
//!
//! All slots are allocated once when the pool is built. During gameplay
//! allocation and release only move indices around a free list.

mod pool;

pub use pool::{PoolAllocator, PoolHandle};
