//! Project: GuardBSD Winter Saga version 1.0.0
//! Package: spm_log
//! Copyright © 2025 Cartesian School. Developed by Siergej Sobolewski.
//! License: BSD-3-Clause
//!
//! Pierścień o stałej pojemności, nadpisujący najstarsze elementy.

/// Fixed-capacity ring that overwrites its oldest entry when full.
///
/// Used for both the record ring and the byte backend. Callers serialize
/// access themselves (a critical section); the ring has no locking of its own.
pub struct Ring<T: Copy, const N: usize> {
    slots: [T; N],
    /// Next slot to write.
    head: usize,
    /// Entries currently held, at most `N`.
    count: usize,
    /// Entries lost to overwrite since creation.
    overwritten: u32,
}

impl<T: Copy, const N: usize> Ring<T, N> {
    pub const fn new(fill: T) -> Self {
        Self {
            slots: [fill; N],
            head: 0,
            count: 0,
            overwritten: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn overwritten(&self) -> u32 {
        self.overwritten
    }

    pub fn push(&mut self, item: T) {
        self.slots[self.head] = item;
        self.head = (self.head + 1) % N;
        if self.count == N {
            self.overwritten = self.overwritten.wrapping_add(1);
        } else {
            self.count += 1;
        }
    }

    pub fn extend_from_slice(&mut self, items: &[T]) {
        for &item in items {
            self.push(item);
        }
    }

    fn oldest(&self) -> usize {
        (self.head + N - self.count) % N
    }

    /// Copy out up to `out.len()` entries, oldest first, without consuming.
    pub fn peek_into(&self, out: &mut [T]) -> usize {
        let n = self.count.min(out.len());
        let start = self.oldest();
        for (i, slot) in out[..n].iter_mut().enumerate() {
            *slot = self.slots[(start + i) % N];
        }
        n
    }

    /// Drop up to `n` of the oldest entries.
    pub fn consume(&mut self, n: usize) {
        self.count -= n.min(self.count);
    }
}
