//! # Pool Allocator
//!
//! Bounded slot pool for objects that are spawned and retired frequently
//! (falling rocks, debris, short-lived effects).

/// A fixed-capacity pool of `T`.
///
/// Slots are reserved up front. `allocate` hands out the lowest free slot and
/// fails with `None` once every slot is occupied; the pool never grows.
///
/// # Thread Safety
///
/// Not thread-safe. The world engine owns its pool and mutates it from the
/// game tick only.
///
/// # Example
///
/// ```rust
/// use deepshaft_core::PoolAllocator;
///
/// let mut pool: PoolAllocator<u32> = PoolAllocator::new(4);
/// let handle = pool.allocate(7).unwrap();
/// assert_eq!(pool.get(handle), Some(&7));
/// assert_eq!(pool.free(handle), Some(7));
/// ```
#[derive(Debug, Clone)]
pub struct PoolAllocator<T> {
    /// Slot storage; `None` marks a free slot.
    slots: Box<[Option<T>]>,
    /// Indices of free slots, lowest index on top.
    free_list: Vec<usize>,
}

/// Handle to an occupied slot in a pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolHandle {
    index: usize,
}

impl PoolHandle {
    /// Slot index this handle refers to.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }
}

impl<T> PoolAllocator<T> {
    /// Creates a pool with `capacity` slots, all free.
    ///
    /// A zero-capacity pool is valid and rejects every allocation.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let slots: Vec<Option<T>> = (0..capacity).map(|_| None).collect();
        Self {
            slots: slots.into_boxed_slice(),
            free_list: (0..capacity).rev().collect(),
        }
    }

    /// Total number of slots.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    #[inline]
    #[must_use]
    pub fn allocated_count(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// True when no slot is free.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.free_list.is_empty()
    }

    /// Stores `value` in a free slot.
    ///
    /// Returns `None` when the pool is full; `value` is dropped in that case.
    pub fn allocate(&mut self, value: T) -> Option<PoolHandle> {
        let index = self.free_list.pop()?;
        self.slots[index] = Some(value);
        Some(PoolHandle { index })
    }

    /// Releases a slot, returning its value.
    ///
    /// Stale or foreign handles return `None`.
    pub fn free(&mut self, handle: PoolHandle) -> Option<T> {
        let value = self.slots.get_mut(handle.index)?.take()?;
        self.release_index(handle.index);
        Some(value)
    }

    /// Shared access to an occupied slot.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.slots.get(handle.index)?.as_ref()
    }

    /// Visits every occupied slot; slots for which `keep` returns `false`
    /// are released and their values passed to `on_release`.
    ///
    /// Slots are visited in index order.
    pub fn retain_mut<K, R>(&mut self, mut keep: K, mut on_release: R)
    where
        K: FnMut(&mut T) -> bool,
        R: FnMut(T),
    {
        for index in 0..self.slots.len() {
            let release = match self.slots[index].as_mut() {
                Some(value) => !keep(value),
                None => false,
            };
            if release {
                if let Some(value) = self.slots[index].take() {
                    self.release_index(index);
                    on_release(value);
                }
            }
        }
    }

    /// Releases every slot.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.free_list.clear();
        self.free_list.extend((0..self.slots.len()).rev());
    }

    /// Iterates over occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (PoolHandle, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|v| (PoolHandle { index }, v)))
    }

    /// Puts `index` back on the free list keeping the lowest index on top.
    fn release_index(&mut self, index: usize) {
        let at = self
            .free_list
            .iter()
            .position(|&free| free < index)
            .unwrap_or(self.free_list.len());
        self.free_list.insert(at, index);
    }
}
