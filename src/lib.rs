//! A generic k-nearest-neighbor classifier built on a k-d tree spatial
//! index, with an optional linear dimensionality-reduction front end.
//!
//! Exact kNN label prediction over bulk-loaded, static point sets in
//! arbitrary (compile-time-known) dimension, using adaptive radius search
//! that prunes large portions of the space via axis-aligned box pruning.
//!
//! ## Modules
//!
//! - [`point`] / [`hyperbox`]: the fixed-dimension coordinate type and its
//!   axis-aligned bounding box.
//! - [`metric`]: the Minkowski-p distance family and its pruning predicate.
//! - [`tree`]: the bulk-loaded k-d tree index and its `walk` traversal.
//! - [`reducer`]: the dimensionality-reduction contract (with an in-core
//!   identity reducer; a real PCA reducer is an external collaborator).
//! - [`classifier`]: the adaptive-radius predictor built on top of the
//!   above.

pub mod classifier;
pub mod error;
pub mod hyperbox;
pub mod metric;
pub mod point;
pub mod reducer;
pub mod tree;

pub use classifier::{Classifier, Stats};
pub use error::Error;
pub use hyperbox::Hyperbox;
pub use metric::{Euclidean, Manhattan, Metric, Minkowski};
pub use point::Point;
pub use reducer::{Identity, Reducer};
pub use tree::{Entry, KdTree};
