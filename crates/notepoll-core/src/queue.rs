//! Fixed-capacity FIFO with drop-oldest overflow.
//!
//! Shared by the decoded event queue and the raw trace queue. The queue is not
//! split into producer/consumer halves; callers that share it across threads
//! put it behind their own lock.

use std::num::NonZeroUsize;

use ringbuf::{traits::*, HeapRb};
use smallvec::SmallVec;

use crate::event::NoteEvent;

pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Raw bytes of one packet as delivered by the device, plus its delta-time.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPacket {
    pub bytes: SmallVec<[u8; 4]>,
    pub timestamp: f64,
}

impl RawPacket {
    pub fn new(bytes: &[u8], timestamp: f64) -> Self {
        Self {
            bytes: SmallVec::from_slice(bytes),
            timestamp,
        }
    }

    #[inline]
    pub fn status(&self) -> Option<u8> {
        self.bytes.first().copied()
    }
}

pub struct BoundedQueue<T> {
    inner: HeapRb<T>,
    evicted: u64,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: HeapRb::new(capacity.get()),
            evicted: 0,
        }
    }

    /// Append `item`. When the queue is full the oldest item is removed first
    /// and returned.
    #[inline]
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = self.inner.push_overwrite(item);
        if evicted.is_some() {
            self.evicted += 1;
        }
        evicted
    }

    #[inline]
    pub fn pop_front(&mut self) -> Option<T> {
        self.inner.try_pop()
    }

    #[inline]
    pub fn peek_front(&self) -> Option<&T> {
        self.inner.iter().next()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.inner.iter()
    }

    /// Remove everything, oldest first.
    pub fn drain(&mut self) -> Vec<T> {
        let mut items = Vec::with_capacity(self.len());
        while let Some(item) = self.inner.try_pop() {
            items.push(item);
        }
        items
    }

    pub fn clear(&mut self) {
        while self.inner.try_pop().is_some() {}
    }

    /// Empty the queue and zero the eviction counter.
    pub fn reset(&mut self) {
        self.clear();
        self.evicted = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.occupied_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity().get()
    }

    /// Items dropped to make room since construction.
    #[inline]
    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}

impl BoundedQueue<NoteEvent> {
    /// Oldest queued event in the packed 32-bit form, without removing it.
    pub fn peek_packed_u32(&self) -> Option<u32> {
        self.peek_front().map(NoteEvent::packed_u32)
    }
}

impl<T> Default for BoundedQueue<T> {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_QUEUE_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}

impl<T> std::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("evicted", &self.evicted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn queue(capacity: usize) -> BoundedQueue<u32> {
        BoundedQueue::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_fifo_order() {
        let mut q = queue(4);
        assert!(q.push(1).is_none());
        assert!(q.push(2).is_none());
        assert_eq!(q.peek_front(), Some(&1));
        assert_eq!(q.pop_front(), Some(1));
        assert_eq!(q.pop_front(), Some(2));
        assert_eq!(q.pop_front(), None);
    }

    #[test]
    fn test_drop_oldest_when_full() {
        let mut q = queue(3);
        for i in 0..3 {
            q.push(i);
        }
        assert!(q.is_full());

        assert_eq!(q.push(3), Some(0));
        assert_eq!(q.push(4), Some(1));
        assert_eq!(q.len(), 3);
        assert_eq!(q.evicted(), 2);
        assert_eq!(q.drain(), vec![2, 3, 4]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_reset_zeroes_eviction_count() {
        let mut q = BoundedQueue::new(NonZeroUsize::new(2).unwrap());
        for i in 0..5 {
            q.push(i);
        }
        assert_eq!(q.evicted(), 3);

        q.clear();
        assert_eq!(q.evicted(), 3);

        q.push(7);
        q.reset();
        assert!(q.is_empty());
        assert_eq!(q.evicted(), 0);
    }

    #[test]
    fn test_default_capacity() {
        let q: BoundedQueue<u8> = BoundedQueue::default();
        assert_eq!(q.capacity(), DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_clear_keeps_eviction_count() {
        let mut q = queue(1);
        q.push(1);
        q.push(2);
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.evicted(), 1);
    }

    #[test]
    fn test_peek_packed() {
        let mut q: BoundedQueue<NoteEvent> = BoundedQueue::default();
        assert_eq!(q.peek_packed_u32(), None);

        q.push(NoteEvent::note_on(60, 100, 0.5));
        q.push(NoteEvent::note_off(60, 0.1));
        assert_eq!(q.peek_packed_u32(), Some(0x903C_6400));
        // Peeking does not consume
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_raw_packet_copies_bytes() {
        let bytes = vec![0xF8];
        let packet = RawPacket::new(&bytes, 0.01);
        drop(bytes);
        assert_eq!(packet.status(), Some(0xF8));
        assert_eq!(packet.bytes.as_slice(), &[0xF8]);
        assert_eq!(RawPacket::new(&[], 0.0).status(), None);
    }

    proptest! {
        #[test]
        fn prop_keeps_most_recent_items(
            capacity in 1usize..64,
            items in proptest::collection::vec(any::<u32>(), 0..256),
        ) {
            let mut q = queue(capacity);
            for &item in &items {
                q.push(item);
                prop_assert!(q.len() <= capacity);
            }

            let keep = items.len().min(capacity);
            let expected = items[items.len() - keep..].to_vec();
            prop_assert_eq!(q.evicted() as usize, items.len() - keep);
            prop_assert_eq!(q.drain(), expected);
        }
    }
}
