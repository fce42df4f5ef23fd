use std::collections::{HashSet, VecDeque};

use commentwatch_common::Comment;
use tracing::debug;

/// Bounded, insertion-ordered registry of accepted comments.
///
/// Doubles as the session's accepted-comments log. Membership is answered
/// from a hash index; the deque keeps arrival order for FIFO eviction.
#[derive(Debug)]
pub struct DedupStore {
    capacity: usize,
    comments: VecDeque<Comment>,
    ids: HashSet<String>,
    evicted: u64,
}

impl DedupStore {
    /// `capacity` is clamped to at least one slot.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            comments: VecDeque::with_capacity(capacity),
            ids: HashSet::with_capacity(capacity),
            evicted: 0,
        }
    }

    /// Admit a comment unless its id is already stored. Returns whether it was admitted.
    pub fn admit(&mut self, comment: Comment) -> bool {
        if self.ids.contains(&comment.id) {
            return false;
        }

        self.ids.insert(comment.id.clone());
        self.comments.push_back(comment);

        if self.comments.len() > self.capacity {
            if let Some(oldest) = self.comments.pop_front() {
                self.ids.remove(&oldest.id);
                self.evicted += 1;
                debug!(id = oldest.id.as_str(), "Evicted oldest comment from dedup store");
            }
        }

        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of comments pushed out by the capacity bound.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Stored comments, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Comment> {
        self.comments.iter()
    }
}
