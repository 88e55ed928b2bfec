//! Hierarchical clustering of distance matrices into partitions.

mod hierarchy;
mod partition;

pub use hierarchy::{Dendrogram, HierarchicalClusterer, Linkage, Merge};
pub use partition::Partition;
