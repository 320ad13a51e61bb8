//! One-shot readiness queue.

/// Observers waiting for a one-time "ready" transition.
///
/// Items pushed before [`ReadyQueue::resolve`] are handed back in
/// registration order exactly once; items pushed afterwards are returned to
/// the caller straight away so it can run them immediately.
#[derive(Debug)]
pub struct ReadyQueue<T> {
    waiting: Vec<T>,
    resolved: bool,
}

impl<T> Default for ReadyQueue<T> {
    fn default() -> Self {
        Self {
            waiting: Vec::new(),
            resolved: false,
        }
    }
}

impl<T> ReadyQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }

    /// Queue `item`, or hand it back if the queue already resolved.
    #[must_use]
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.resolved {
            Some(item)
        } else {
            self.waiting.push(item);
            None
        }
    }

    /// Mark resolved and take every waiting item. Later calls return nothing.
    pub fn resolve(&mut self) -> Vec<T> {
        self.resolved = true;
        std::mem::take(&mut self.waiting)
    }

    /// Back to unresolved with nothing waiting.
    pub fn reset(&mut self) {
        self.resolved = false;
        self.waiting.clear();
    }

    /// Drop waiting items, keeping the resolved flag.
    pub fn clear(&mut self) {
        self.waiting.clear();
    }
}
