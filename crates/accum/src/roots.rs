//! Bounded history of recent accumulator roots.

use primitives::FieldElem;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Ring buffer of the last `depth` distinct roots.
///
/// Transactions are built against a root that may be a few blocks stale by
/// the time they land; the window defines the tolerance. Once the buffer is
/// full the oldest root is silently evicted and becomes permanently invalid.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct RootStore {
    window: VecDeque<FieldElem>,
    depth: usize,
}

impl RootStore {
    /// Store holding up to `depth` roots, seeded with the genesis root.
    pub fn new(depth: usize, genesis: FieldElem) -> Self {
        let depth = depth.max(1);
        let mut window = VecDeque::with_capacity(depth);
        window.push_back(genesis);
        Self { window, depth }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Record a new root, evicting the oldest once the window is full.
    /// Roots already present are not re-added; the window holds distinct
    /// values, so a block that leaves the tree unchanged does not consume a
    /// slot.
    pub fn push(&mut self, root: FieldElem) {
        if self.contains(root) {
            return;
        }
        if self.window.len() == self.depth {
            self.window.pop_front();
        }
        self.window.push_back(root);
    }

    /// Whether `root` is currently inside the validity window.
    pub fn contains(&self, root: FieldElem) -> bool {
        self.window.contains(&root)
    }

    /// Most recently recorded root.
    pub fn latest(&self) -> FieldElem {
        self.window.back().copied().unwrap_or_default()
    }
}
