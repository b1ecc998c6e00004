//! A bulk-loaded, static k-d tree index.
//!
//! Arena-allocated nodes, leaves holding a contiguous span of entries, and a
//! predicate-guarded `walk` that lets callers prune branches by bounding box.

mod build;
mod node;

use rand::thread_rng;

pub use node::NodeId;
use node::Node;

use crate::hyperbox::{Hyperbox, ScopedSplit};
use crate::point::Point;

/// A `(coord, label)` pair stored in the tree.
#[derive(Debug, Clone)]
pub struct Entry<T, const N: usize, L> {
    /// The (possibly reduced) coordinate of this entry.
    pub coord: Point<T, N>,
    /// The label associated with this entry.
    pub label: L,
}

/// A bulk-loaded, static k-d tree over `Entry<T, N, L>` values.
///
/// Built once via [`KdTree::build`]; nodes and entries are immutable and
/// never freed for the tree's lifetime. [`KdTree::walk`] is the only way to
/// traverse it, and is also the mechanism [`crate::classifier::Classifier`]
/// uses internally for adaptive-radius search.
pub struct KdTree<T, const N: usize, L> {
    entries: Vec<Entry<T, N, L>>,
    arena: Vec<Node<T>>,
    root: NodeId,
    root_box: Hyperbox<T, N>,
}

impl<T, const N: usize, L> KdTree<T, N, L>
where
    T: num_traits::Float,
{
    /// Bulk-builds a tree over `entries`, partitioning them in place.
    ///
    /// # Panics
    ///
    /// Panics if `entries` is empty; callers (the classifier) are expected
    /// to reject empty training sets before reaching this point.
    #[must_use]
    pub fn build(mut entries: Vec<Entry<T, N, L>>) -> Self {
        assert!(!entries.is_empty(), "cannot build a k-d tree over zero entries");
        ftlog::debug!("Building a k-d tree over {} entries in {N} dimensions", entries.len());

        let coords: Vec<Point<T, N>> = entries.iter().map(|e| e.coord).collect();
        let root_box = Hyperbox::of(&coords);

        let mut arena = Vec::new();
        let mut rng = thread_rng();
        let root = build::build_node(&mut entries, 0, 0, &mut arena, &mut rng);

        ftlog::debug!("Finished building the tree: {} nodes in the arena", arena.len());
        Self { entries, arena, root, root_box }
    }

    /// The number of entries stored in this tree.
    #[must_use]
    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    /// The bounding box of the root of the tree.
    #[must_use]
    pub const fn root_box(&self) -> &Hyperbox<T, N> {
        &self.root_box
    }

    /// Walks the tree, starting from the root bounding box.
    ///
    /// At each inner node, in deterministic left-then-right order, the
    /// node's split is applied to the current box (via a scoped split),
    /// `box_predicate` is invoked, and the recursion descends into that
    /// child only if it returned true; the box is restored before visiting
    /// the sibling. At each leaf, `visit_entry` is invoked on every
    /// contained entry, in array order.
    ///
    /// `box_predicate` is the only pruning mechanism and must be a
    /// conservative over-approximation: it must never return false for a
    /// box that could contain a relevant point.
    pub fn walk(&self, mut visit_entry: impl FnMut(&Entry<T, N, L>), mut box_predicate: impl FnMut(&Hyperbox<T, N>) -> bool) {
        let mut box_ = self.root_box;
        self.walk_node(self.root, &mut box_, &mut visit_entry, &mut box_predicate);
    }

    fn walk_node(
        &self,
        node: NodeId,
        box_: &mut Hyperbox<T, N>,
        visit_entry: &mut impl FnMut(&Entry<T, N, L>),
        box_predicate: &mut impl FnMut(&Hyperbox<T, N>) -> bool,
    ) {
        match &self.arena[node.0 as usize] {
            Node::Leaf(range) => {
                for entry in &self.entries[range.clone()] {
                    visit_entry(entry);
                }
            }
            Node::Inner { split, left, right } => {
                {
                    let mut guard = ScopedSplit::left(box_, *split);
                    if box_predicate(guard.as_box()) {
                        self.walk_node(*left, guard.as_box_mut(), visit_entry, box_predicate);
                    }
                    // `guard` drops here, restoring `box_`'s high corner.
                }
                {
                    let mut guard = ScopedSplit::right(box_, *split);
                    if box_predicate(guard.as_box()) {
                        self.walk_node(*right, guard.as_box_mut(), visit_entry, box_predicate);
                    }
                    // `guard` drops here, restoring `box_`'s low corner.
                }
            }
        }
    }
}
