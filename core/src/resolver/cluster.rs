//! Greedy pairwise clustering, used for Temple TGT positions and arena
//! anchor fallback candidates. Spec §9 Design Notes: "O(n²) but n is <100
//! in practice; do not over-engineer."

use crate::world::GridPos;

/// Greedily merge `points` into clusters whose members are pairwise within
/// `radius` of the cluster's first member, and return each cluster's first
/// member (the spec's "pick first" rule for Temple TGT clustering).
pub fn cluster_first(points: &[GridPos], radius: f32) -> Vec<GridPos> {
    let mut clusters: Vec<GridPos> = Vec::new();
    'points: for &p in points {
        for anchor in &clusters {
            if anchor.distance_to(p) <= radius {
                continue 'points;
            }
        }
        clusters.push(p);
    }
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_nearby_points_into_one_cluster() {
        let points = vec![
            GridPos::new(0.0, 0.0),
            GridPos::new(10.0, 10.0),
            GridPos::new(500.0, 500.0),
        ];
        let clusters = cluster_first(&points, 100.0);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0], GridPos::new(0.0, 0.0));
        assert_eq!(clusters[1], GridPos::new(500.0, 500.0));
    }

    #[test]
    fn empty_input_yields_no_clusters() {
        assert!(cluster_first(&[], 100.0).is_empty());
    }
}
