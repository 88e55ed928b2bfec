//! Clustering and comparison through the public API.

use cluster_stability::{
    compare, AdjustedRandIndex, DistanceMatrix, HierarchicalClusterer, Linkage, Manhattan, Partition, PointId,
    SampleStore, StabilityError,
};

/// Points on a line at 0, 1, 3 and 7.
fn line() -> SampleStore {
    let features = vec![vec![0.0], vec![1.0], vec![3.0], vec![7.0]];
    SampleStore::from_rows(vec![vec![]; 4], features).unwrap()
}

fn heights(clusterer: &HierarchicalClusterer, store: &SampleStore) -> Vec<f64> {
    let matrix = DistanceMatrix::full(store, &Manhattan).unwrap();
    clusterer
        .linkage_tree(&matrix)
        .unwrap()
        .merges()
        .iter()
        .map(|m| m.height)
        .collect()
}

#[test]
fn merge_heights_per_linkage() {
    let store = line();
    let single = heights(&HierarchicalClusterer::new(1.0).linkage(Linkage::Single), &store);
    let complete = heights(&HierarchicalClusterer::new(1.0).linkage(Linkage::Complete), &store);
    let average = heights(&HierarchicalClusterer::new(1.0).linkage(Linkage::Average), &store);

    assert_eq!(single, vec![1.0, 2.0, 4.0]);
    assert_eq!(complete, vec![1.0, 3.0, 7.0]);
    assert_eq!(average[..2], [1.0, 2.5]);
    assert!((average[2] - 17.0 / 3.0).abs() < 1e-12);
}

#[test]
fn cut_depends_on_linkage() {
    let matrix = DistanceMatrix::full(&line(), &Manhattan).unwrap();
    let count = |linkage| {
        HierarchicalClusterer::new(2.6)
            .linkage(linkage)
            .cluster(&matrix)
            .unwrap()
            .nclusters()
    };
    assert_eq!(count(Linkage::Single), 2);
    assert_eq!(count(Linkage::Average), 2);
    assert_eq!(count(Linkage::Complete), 3);
}

#[test]
fn threshold_extremes() {
    let matrix = DistanceMatrix::full(&line(), &Manhattan).unwrap();
    let singletons = HierarchicalClusterer::new(0.0).cluster(&matrix).unwrap();
    assert_eq!(singletons.nclusters(), 4);
    assert_eq!(singletons.labels(), &[0, 1, 2, 3]);

    let everything = HierarchicalClusterer::new(100.0).cluster(&matrix).unwrap();
    assert_eq!(everything.nclusters(), 1);
}

#[test]
fn cophenetic_distances_are_ultrametric() {
    let features: Vec<Vec<f64>> = (0..9).map(|i| vec![(i * i) as f64 * 0.37, (i % 3) as f64]).collect();
    let store = SampleStore::from_rows(vec![vec![]; 9], features).unwrap();
    let matrix = DistanceMatrix::full(&store, &cluster_stability::Euclidean).unwrap();
    let tree = HierarchicalClusterer::new(1.0).linkage_tree(&matrix).unwrap();

    for i in 0..9 {
        for j in 0..9 {
            for k in 0..9 {
                let ij = tree.cophenetic(i, j).unwrap();
                let ik = tree.cophenetic(i, k).unwrap();
                let kj = tree.cophenetic(k, j).unwrap();
                assert!(ij <= ik.max(kj) + 1e-12);
            }
        }
    }
    assert!(tree.cophenetic(0, 9).is_none());
}

#[test]
fn clustering_a_subset_keeps_point_ids() {
    let store = line();
    let matrix = DistanceMatrix::build(&store, &[1, 3], &Manhattan).unwrap();
    let partition = HierarchicalClusterer::new(1.0).cluster(&matrix).unwrap();
    assert_eq!(partition.ids(), &[PointId(1), PointId(3)]);
    assert_eq!(partition.nclusters(), 2);
}

#[test]
fn custom_dissimilarity_closure() {
    let store = line();
    let coarse = |a: &[f64], b: &[f64]| if (a[0] - b[0]).abs() < 2.5 { 0.1 } else { 5.0 };
    let matrix = DistanceMatrix::full(&store, &coarse).unwrap();
    let partition = HierarchicalClusterer::new(1.0)
        .linkage(Linkage::Single)
        .cluster(&matrix)
        .unwrap();
    assert_eq!(partition.labels(), &[0, 0, 0, 1]);
}

#[test]
fn invalid_distances_are_rejected() {
    let ids: Vec<PointId> = (0..3).map(PointId).collect();
    let matrix = DistanceMatrix::from_condensed(ids, vec![1.0, f64::NAN, 2.0]).unwrap();
    let err = HierarchicalClusterer::new(1.0).cluster(&matrix).unwrap_err();
    assert!(matches!(err, StabilityError::InvalidDistance { .. }));
}

#[test]
fn single_point_cannot_be_clustered() {
    let store = line();
    let err = DistanceMatrix::build(&store, &[2], &Manhattan).unwrap_err();
    assert!(matches!(err, StabilityError::InsufficientData { required: 2, actual: 1 }));
}

#[test]
fn compare_restricts_reference() {
    let ids: Vec<PointId> = (0..6).map(PointId).collect();
    let reference = Partition::from_labels(ids, &[0, 0, 0, 1, 1, 1]).unwrap();
    let trial = Partition::from_labels(vec![PointId(0), PointId(2), PointId(4), PointId(5)], &[3, 3, 8, 8]).unwrap();

    let comparison = compare(&reference, &trial, &AdjustedRandIndex).unwrap();
    assert_eq!(comparison.fom, 1.0);
    assert_eq!(comparison.nclusters, 2);

    let stranger = Partition::from_labels(vec![PointId(0), PointId(42)], &[0, 1]).unwrap();
    assert!(matches!(
        compare(&reference, &stranger, &AdjustedRandIndex),
        Err(StabilityError::Comparison(_))
    ));
}
