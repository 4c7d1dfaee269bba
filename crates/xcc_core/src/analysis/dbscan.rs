//! Density-based clustering (DBSCAN) over an arbitrary distance metric.
//!
//! A point is a core point when at least `min_samples` points, itself
//! included, lie within `eps`. Clusters grow from core points through
//! density-reachable neighbours; points reachable from no core point are
//! noise. Points are visited in index order, so labels are deterministic:
//! clusters are numbered from 0 in order of their first core point, and a
//! border point shared by two clusters joins the earlier one.
//!
//! A cluster left with fewer than `min_samples` members after its border
//! points went to an earlier cluster is relabelled noise, and the remaining
//! labels are renumbered without gaps.

use super::metric::{DistanceMetric, FeaturePoint};
use super::types::NOISE;

/// Cluster `points` and return one label per point (`NOISE` = -1).
pub fn dbscan(
    points: &[FeaturePoint],
    metric: &dyn DistanceMetric,
    eps: f64,
    min_samples: usize,
) -> Vec<i32> {
    let n = points.len();
    if n == 0 {
        return vec![];
    }

    let neighbours: Vec<Vec<usize>> = (0..n)
        .map(|i| {
            (0..n)
                .filter(|&j| metric.distance(&points[i], &points[j]) <= eps)
                .collect()
        })
        .collect();
    let is_core = |i: usize| neighbours[i].len() >= min_samples;

    // None = unvisited
    let mut labels: Vec<Option<i32>> = vec![None; n];
    let mut cluster_id = 0i32;

    for i in 0..n {
        if labels[i].is_some() {
            continue;
        }

        if !is_core(i) {
            // May still be claimed as a border point later
            labels[i] = Some(NOISE);
            continue;
        }

        labels[i] = Some(cluster_id);

        // Expand cluster using a queue
        let mut queue: Vec<usize> = neighbours[i].clone();
        let mut queue_idx = 0;

        while queue_idx < queue.len() {
            let j = queue[queue_idx];
            queue_idx += 1;

            match labels[j] {
                Some(NOISE) => {
                    labels[j] = Some(cluster_id);
                    continue;
                }
                Some(_) => continue,
                None => {}
            }

            labels[j] = Some(cluster_id);

            if is_core(j) {
                queue.extend(neighbours[j].iter().copied().filter(|&k| labels[k].is_none()));
            }
        }

        cluster_id += 1;
    }

    let labels: Vec<i32> = labels.into_iter().map(|l| l.unwrap_or(NOISE)).collect();
    drop_small_clusters(labels, cluster_id as usize, min_samples)
}

/// Relabel clusters smaller than `min_samples` as noise and renumber the rest densely.
fn drop_small_clusters(mut labels: Vec<i32>, clusters: usize, min_samples: usize) -> Vec<i32> {
    let mut sizes = vec![0usize; clusters];
    for &l in labels.iter().filter(|&&l| l >= 0) {
        sizes[l as usize] += 1;
    }

    let mut next = 0i32;
    let remap: Vec<i32> = sizes
        .iter()
        .map(|&size| {
            if size < min_samples {
                NOISE
            } else {
                next += 1;
                next - 1
            }
        })
        .collect();

    for l in labels.iter_mut().filter(|l| **l >= 0) {
        *l = remap[*l as usize];
    }
    labels
}

/// Number of distinct non-noise labels.
pub fn cluster_count(labels: &[i32]) -> usize {
    labels
        .iter()
        .filter(|&&l| l >= 0)
        .collect::<std::collections::BTreeSet<_>>()
        .len()
}
