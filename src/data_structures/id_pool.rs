use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// A pool for efficient allocation and reuse of `u32` identifiers.
///
/// Freed IDs are stored in a min-heap and reused such that the lowest
/// available IDs are allocated first. This keeps slot arenas indexed by
/// these IDs densely packed.
#[derive(Clone, Debug, Default)]
pub struct IdPool {
    /// A min-heap of free IDs. The lowest free IDs are allocated first.
    free_ids: BinaryHeap<Reverse<u32>>,
    /// The next ID to be allocated. Only incremented when no free IDs are available.
    next_index: u32,
}

impl IdPool {
    /// Creates a new empty [`IdPool`].
    #[inline]
    pub const fn new() -> Self {
        Self {
            free_ids: BinaryHeap::new(),
            next_index: 0,
        }
    }

    /// Allocates a new ID.
    ///
    /// If there are free IDs available, the lowest free ID is reused.
    #[inline]
    pub fn alloc(&mut self) -> u32 {
        if let Some(id) = self.free_ids.pop() {
            id.0
        } else {
            let id = self.next_index;
            self.next_index += 1;
            id
        }
    }

    /// Frees an ID, making it available for reuse.
    ///
    /// The ID is assumed to not already be freed.
    #[inline]
    pub fn free(&mut self, id: u32) {
        debug_assert!(id < self.next_index);
        self.free_ids.push(Reverse(id));
    }

    /// Returns the number of IDs handed out so far, including freed ones.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.next_index as usize
    }

    /// Returns the number of freed IDs waiting to be reused.
    #[inline]
    pub fn free_count(&self) -> usize {
        self.free_ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuses_lowest_freed_id_first() {
        let mut pool = IdPool::new();
        assert_eq!(pool.alloc(), 0);
        assert_eq!(pool.alloc(), 1);
        assert_eq!(pool.alloc(), 2);

        pool.free(2);
        pool.free(0);

        assert_eq!(pool.alloc(), 0);
        assert_eq!(pool.alloc(), 2);
        assert_eq!(pool.alloc(), 3);
    }
}
