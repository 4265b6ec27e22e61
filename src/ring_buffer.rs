use std::collections::VecDeque;

/// Fixed capacity buffer that drops its oldest element when a new one no longer fits.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// # Panics
    ///
    /// - if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer needs room for at least one element");
        RingBuffer {
            items: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Appends `item`, returning the evicted element if the buffer was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        self.items.push_back(item);
        if self.items.len() > self.capacity {
            self.items.pop_front()
        } else {
            None
        }
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn latest_mut(&mut self) -> Option<&mut T> {
        self.items.back_mut()
    }

    /// The element pushed right before the latest one.
    pub fn previous(&self) -> Option<&T> {
        let n = self.items.len();
        if n < 2 {
            return None;
        }
        self.items.get(n - 2)
    }

    /// Borrows the previous element and mutably borrows the latest one.
    pub fn previous_and_latest_mut(&mut self) -> Option<(&T, &mut T)> {
        let n = self.items.len();
        if n < 2 {
            return None;
        }
        let (front, back) = self.items.as_mut_slices();
        // The two elements may sit in different halves of the deque.
        match back.len() {
            0 => {
                let (head, tail) = front.split_at_mut(n - 1);
                Some((&head[n - 2], &mut tail[0]))
            }
            1 => Some((front.last()?, &mut back[0])),
            m => {
                let (head, tail) = back.split_at_mut(m - 1);
                Some((&head[m - 2], &mut tail[0]))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_last_elements_in_order() {
        let mut buffer = RingBuffer::new(3);
        for i in 0..2 {
            assert_eq!(buffer.push(i), None);
        }
        assert!(!buffer.is_full());
        assert_eq!(buffer.push(2), None);
        assert!(buffer.is_full());
        assert_eq!(buffer.push(3), Some(0));
        assert_eq!(buffer.push(4), Some(1));
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(buffer.latest(), Some(&4));
        assert_eq!(buffer.previous(), Some(&3));
    }

    #[test]
    fn previous_needs_two_elements() {
        let mut buffer = RingBuffer::new(2);
        assert_eq!(buffer.latest(), None);
        assert_eq!(buffer.previous(), None);
        buffer.push("a");
        assert_eq!(buffer.latest(), Some(&"a"));
        assert_eq!(buffer.previous(), None);
        assert!(buffer.previous_and_latest_mut().is_none());
    }

    #[test]
    fn capacity_one_only_has_latest() {
        let mut buffer = RingBuffer::new(1);
        buffer.push(1);
        assert_eq!(buffer.push(2), Some(1));
        assert_eq!(buffer.latest(), Some(&2));
        assert_eq!(buffer.previous(), None);
    }

    #[test]
    fn previous_and_latest_across_wraparound() {
        for capacity in 2..5 {
            let mut buffer = RingBuffer::new(capacity);
            for i in 0..(3 * capacity) {
                buffer.push(i);
                if i == 0 {
                    continue;
                }
                let (prev, latest) = buffer.previous_and_latest_mut().unwrap();
                assert_eq!(*prev, i - 1);
                assert_eq!(*latest, i);
                *latest += 100;
                assert_eq!(buffer.latest(), Some(&(i + 100)));
                *buffer.latest_mut().unwrap() -= 100;
            }
        }
    }

    #[test]
    #[should_panic]
    fn zero_capacity_panics() {
        RingBuffer::<u8>::new(0);
    }
}
