//! Arena node representation for [`super::KdTree`].

use std::ops::Range;

use crate::hyperbox::Split;

/// Opaque reference to a node within a [`super::KdTree`]'s arena.
///
/// A `Vec<Node<..>>` never needs pointer-stability tricks because children
/// are referenced by id, not by address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(pub(crate) u32);

/// A node in the k-d tree's arena: either a leaf holding a contiguous run of
/// entries, or an inner node holding an axis-aligned split and two
/// children.
#[derive(Debug)]
pub enum Node<T> {
    /// A leaf: a contiguous, non-empty range into the tree's entry array.
    Leaf(Range<usize>),
    /// An inner node: entries with `coord[axis] < value` are reachable
    /// through `left`; entries with `coord[axis] >= value` are reachable
    /// through `right`.
    Inner {
        /// The split plane.
        split: Split<T>,
        /// The left child, holding entries with `coord[axis] < value`.
        left: NodeId,
        /// The right child, holding entries with `coord[axis] >= value`.
        right: NodeId,
    },
}
