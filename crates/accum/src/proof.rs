//! Membership proofs for the records tree.

use primitives::{FieldElem, NodeHash};
use serde::{Deserialize, Serialize};

use crate::frontier::leaf_hash;

/// Position of a node among its parent's three children.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug, Default)]
pub enum NodePos {
    #[default]
    Left,
    Middle,
    Right,
}

impl From<NodePos> for u8 {
    fn from(pos: NodePos) -> Self {
        match pos {
            NodePos::Left => 0,
            NodePos::Middle => 1,
            NodePos::Right => 2,
        }
    }
}

/// One level of an authentication path: the two sibling values in
/// left-to-right slot order, and the path node's own position.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct PathNode {
    pub sibling1: FieldElem,
    pub sibling2: FieldElem,
    pub pos: NodePos,
}

/// Authentication path from leaf to root.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug, Default)]
pub struct MerklePath {
    pub nodes: Vec<PathNode>,
}

impl MerklePath {
    pub fn height(&self) -> usize {
        self.nodes.len()
    }
}

/// Verify that `elem` sits at `index` under `root`.
///
/// The claimed positions must agree with the base-3 decomposition of the
/// index, which also pins the index inside the tree's capacity.
pub fn verify_path<H: NodeHash>(
    hasher: &H,
    root: FieldElem,
    index: u64,
    elem: FieldElem,
    path: &MerklePath,
) -> bool {
    let mut cur = leaf_hash(hasher, index, elem);
    let mut pos = index;
    for node in &path.nodes {
        let digit = (pos % 3) as u8;
        pos /= 3;
        if u8::from(node.pos) != digit {
            return false;
        }
        cur = match node.pos {
            NodePos::Left => hasher.hash3(cur, node.sibling1, node.sibling2),
            NodePos::Middle => hasher.hash3(node.sibling1, cur, node.sibling2),
            NodePos::Right => hasher.hash3(node.sibling1, node.sibling2, cur),
        };
    }
    pos == 0 && cur == root
}
