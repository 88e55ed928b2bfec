//! Agglomerative hierarchical clustering with a distance cut.
//!
//! The merge tree is an arena: leaves are nodes `0..n`, the `k`-th merge
//! creates node `n + k`. Merging uses per-row nearest-neighbour caches with
//! Lance-Williams distance updates, which keeps the common case close to
//! O(n²) instead of rescanning the full matrix on every merge.
//!
//! Ties between equally distant candidate pairs are broken by the smallest
//! pair of point identifiers (each cluster represented by its lowest id),
//! so results do not depend on the order in which points were drawn.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ClusterConfig;
use crate::distance::DistanceMatrix;
use crate::error::{Result, StabilityError};
use crate::types::PointId;

use super::Partition;

/// Rule defining the distance between two clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// Mean of all pairwise point distances (UPGMA).
    #[default]
    Average,
    /// Largest pairwise point distance.
    Complete,
    /// Smallest pairwise point distance.
    Single,
}

impl Linkage {
    /// Lance-Williams update: distance from the union of `a` and `b` to a
    /// third cluster, given the distances from `a` and `b` to it.
    #[inline]
    fn update(self, d_ak: f64, d_bk: f64, size_a: usize, size_b: usize) -> f64 {
        match self {
            Linkage::Single => d_ak.min(d_bk),
            Linkage::Complete => d_ak.max(d_bk),
            Linkage::Average => {
                let (na, nb) = (size_a as f64, size_b as f64);
                let mean = (na * d_ak + nb * d_bk) / (na + nb);
                // Rounding must not push the mean outside its operands
                mean.clamp(d_ak.min(d_bk), d_ak.max(d_bk))
            }
        }
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Linkage::Average => "average",
            Linkage::Complete => "complete",
            Linkage::Single => "single",
        };
        f.write_str(name)
    }
}

impl FromStr for Linkage {
    type Err = StabilityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "average" => Ok(Linkage::Average),
            "complete" => Ok(Linkage::Complete),
            "single" => Ok(Linkage::Single),
            other => Err(StabilityError::config(format!("unknown linkage '{}'", other))),
        }
    }
}

/// One agglomeration step of the merge tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Merge {
    /// Smaller node id of the merged pair.
    pub left: usize,
    /// Larger node id of the merged pair.
    pub right: usize,
    /// Linkage distance between the two merged clusters.
    pub distance: f64,
    /// Cophenetic height: the largest merge distance inside the new node.
    pub height: f64,
    /// Number of points in the new node.
    pub size: usize,
}

/// Full merge history over the points of a distance matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dendrogram {
    ids: Vec<PointId>,
    merges: Vec<Merge>,
}

impl Dendrogram {
    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the tree has no leaves.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Leaf identifiers by position.
    pub fn ids(&self) -> &[PointId] {
        &self.ids
    }

    /// Merges in the order they were performed (`n − 1` of them).
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Cut the tree: two points share a cluster iff the merge joining them
    /// happens at a height of at most `max_d`.
    ///
    /// A non-positive `max_d` accepts no merge and yields singletons.
    pub fn cut(&self, max_d: f64) -> Partition {
        let n = self.len();
        let mut forest = DisjointSet::new(n);
        let mut leaf_of_node: Vec<usize> = (0..n).collect();
        leaf_of_node.reserve(self.merges.len());

        for merge in &self.merges {
            let (a, b) = (leaf_of_node[merge.left], leaf_of_node[merge.right]);
            if max_d > 0.0 && merge.height <= max_d {
                forest.union(a, b);
            }
            leaf_of_node.push(a);
        }

        let roots: Vec<usize> = (0..n).map(|i| forest.find(i)).collect();
        Partition::from_unique(self.ids.clone(), &roots)
    }

    /// Cophenetic distance between the leaves at positions `i` and `j`.
    ///
    /// Returns `None` for an out-of-range position.
    pub fn cophenetic(&self, i: usize, j: usize) -> Option<f64> {
        let n = self.len();
        if i >= n || j >= n {
            return None;
        }
        if i == j {
            return Some(0.0);
        }
        let mut forest = DisjointSet::new(n);
        let mut leaf_of_node: Vec<usize> = (0..n).collect();
        for merge in &self.merges {
            let (a, b) = (leaf_of_node[merge.left], leaf_of_node[merge.right]);
            forest.union(a, b);
            leaf_of_node.push(a);
            if forest.find(i) == forest.find(j) {
                return Some(merge.height);
            }
        }
        None
    }
}

/// Union-find over leaf positions with path halving.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Lower root wins so labels follow leaf order
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}

/// Hierarchical agglomerative clusterer cut at a cophenetic distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HierarchicalClusterer {
    max_d: f64,
    linkage: Linkage,
}

impl HierarchicalClusterer {
    /// Clusterer with the given threshold and average linkage.
    pub fn new(max_d: f64) -> Self {
        Self {
            max_d,
            linkage: Linkage::default(),
        }
    }

    /// Clusterer from a validated configuration.
    pub fn from_config(config: &ClusterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            max_d: config.max_d,
            linkage: config.linkage,
        })
    }

    /// Set the linkage rule.
    pub fn linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    /// Set the cut threshold.
    pub fn max_d(mut self, max_d: f64) -> Self {
        self.max_d = max_d;
        self
    }

    /// The configured cut threshold.
    pub fn threshold(&self) -> f64 {
        self.max_d
    }

    /// The configured linkage rule.
    pub fn linkage_rule(&self) -> Linkage {
        self.linkage
    }

    /// The configuration this clusterer runs with.
    pub fn config(&self) -> ClusterConfig {
        ClusterConfig {
            max_d: self.max_d,
            linkage: self.linkage,
        }
    }

    /// Cluster the points of `matrix`.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a NaN threshold, `Clustering` for fewer than two
    /// points and `InvalidDistance` for non-finite or negative entries.
    pub fn cluster(&self, matrix: &DistanceMatrix) -> Result<Partition> {
        if self.max_d.is_nan() {
            return Err(StabilityError::config("max_d must not be NaN"));
        }
        let tree = self.linkage_tree(matrix)?;
        let partition = tree.cut(self.max_d);
        debug!(
            points = partition.len(),
            nclusters = partition.nclusters(),
            max_d = self.max_d,
            linkage = %self.linkage,
            "clustering resulted in {} clusters",
            partition.nclusters()
        );
        Ok(partition)
    }

    /// Build the complete merge tree of `matrix`.
    pub fn linkage_tree(&self, matrix: &DistanceMatrix) -> Result<Dendrogram> {
        let n = matrix.len();
        if n < 2 {
            return Err(StabilityError::clustering(format!(
                "need at least 2 points to cluster, got {}",
                n
            )));
        }
        matrix.check_finite()?;

        let mut state = Agglomeration::new(matrix);
        let mut merges = Vec::with_capacity(n - 1);
        let mut heights = vec![0.0; n];
        heights.reserve(n - 1);

        for step in 0..n - 1 {
            let (a, b) = state.closest_pair();
            let distance = state.dist(a, b);
            let (node_a, node_b) = (state.node[a], state.node[b]);
            let (left, right) = if node_a < node_b { (node_a, node_b) } else { (node_b, node_a) };
            let height = distance.max(heights[left]).max(heights[right]);
            let size = state.size[a] + state.size[b];

            merges.push(Merge {
                left,
                right,
                distance,
                height,
                size,
            });
            heights.push(height);
            state.merge(a, b, n + step, self.linkage);
        }

        Ok(Dendrogram {
            ids: matrix.ids().to_vec(),
            merges,
        })
    }
}

/// Working state of the agglomeration: a dense distance table over slots,
/// one slot per live cluster.
struct Agglomeration {
    n: usize,
    dist: Vec<f64>,
    active: Vec<bool>,
    size: Vec<usize>,
    node: Vec<usize>,
    rep: Vec<PointId>,
    nearest: Vec<Option<usize>>,
}

impl Agglomeration {
    fn new(matrix: &DistanceMatrix) -> Self {
        let n = matrix.len();
        let mut dist = vec![0.0; n * n];
        for i in 0..n {
            for j in i + 1..n {
                let d = matrix.get(i, j);
                dist[i * n + j] = d;
                dist[j * n + i] = d;
            }
        }
        let mut state = Self {
            n,
            dist,
            active: vec![true; n],
            size: vec![1; n],
            node: (0..n).collect(),
            rep: matrix.ids().to_vec(),
            nearest: vec![None; n],
        };
        for i in 0..n {
            state.nearest[i] = state.row_nearest(i);
        }
        state
    }

    #[inline]
    fn dist(&self, i: usize, j: usize) -> f64 {
        self.dist[i * self.n + j]
    }

    /// Ordering key of a candidate pair: distance, then the pair of
    /// representative ids.
    #[inline]
    fn key_cmp(&self, (i, j): (usize, usize), (k, l): (usize, usize)) -> Ordering {
        let ordered = |a: PointId, b: PointId| if a <= b { (a, b) } else { (b, a) };
        self.dist(i, j)
            .total_cmp(&self.dist(k, l))
            .then_with(|| ordered(self.rep[i], self.rep[j]).cmp(&ordered(self.rep[k], self.rep[l])))
    }

    fn row_nearest(&self, i: usize) -> Option<usize> {
        let mut best: Option<usize> = None;
        for j in 0..self.n {
            if j == i || !self.active[j] {
                continue;
            }
            best = match best {
                Some(b) if self.key_cmp((i, b), (i, j)) != Ordering::Greater => Some(b),
                _ => Some(j),
            };
        }
        best
    }

    fn closest_pair(&self) -> (usize, usize) {
        let mut best: Option<(usize, usize)> = None;
        for i in 0..self.n {
            if !self.active[i] {
                continue;
            }
            let Some(j) = self.nearest[i] else { continue };
            best = match best {
                Some(pair) if self.key_cmp(pair, (i, j)) != Ordering::Greater => Some(pair),
                _ => Some((i, j)),
            };
        }
        // At least two slots stay active until the final merge
        best.unwrap_or((0, 1))
    }

    /// Merge slot `b` into slot `a`, which becomes tree node `node`.
    fn merge(&mut self, a: usize, b: usize, node: usize, linkage: Linkage) {
        let n = self.n;
        for k in 0..n {
            if !self.active[k] || k == a || k == b {
                continue;
            }
            let d = linkage.update(self.dist(a, k), self.dist(b, k), self.size[a], self.size[b]);
            self.dist[a * n + k] = d;
            self.dist[k * n + a] = d;
        }

        self.active[b] = false;
        self.nearest[b] = None;
        self.size[a] += self.size[b];
        self.rep[a] = self.rep[a].min(self.rep[b]);
        self.node[a] = node;

        for k in 0..n {
            if !self.active[k] || k == a {
                continue;
            }
            match self.nearest[k] {
                Some(nn) if nn == a || nn == b => self.nearest[k] = self.row_nearest(k),
                Some(nn) => {
                    if self.key_cmp((k, a), (k, nn)) == Ordering::Less {
                        self.nearest[k] = Some(a);
                    }
                }
                None => self.nearest[k] = self.row_nearest(k),
            }
        }
        self.nearest[a] = self.row_nearest(a);
    }
}
