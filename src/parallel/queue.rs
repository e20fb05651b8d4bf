use std::collections::VecDeque;

/// Unbounded FIFO of pending jobs.
///
/// Owned by the dispatcher thread, which is its only pusher and popper, so
/// it carries no locking. FIFO order keeps traversal fair; nothing depends
/// on it for correctness.
#[derive(Debug)]
pub struct WorkQueue<T> {
    items: VecDeque<T>,
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Append to the tail
    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
    }

    /// Remove the head, if any
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
