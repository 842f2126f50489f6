//! Property tests for projection and clustering invariants

use proptest::prelude::*;
use std::collections::HashSet;

use reqmap::layout::{
    project_to_2d, ClusterOrchestrator, ClusterPolicy, KMeansOptions, Layout, LayoutPolicy,
    Point2D, ProjectionOptions, StrategyKind,
};

fn seeded_policy() -> LayoutPolicy {
    LayoutPolicy {
        clustering: ClusterPolicy {
            kmeans: KMeansOptions {
                seed: Some(5),
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    }
}

fn vector_sets(max_n: usize) -> impl Strategy<Value = Vec<Vec<f32>>> {
    (1usize..=max_n, 2usize..=6).prop_flat_map(|(n, dims)| {
        prop::collection::vec(prop::collection::vec(-5.0f32..5.0, dims), n)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn projection_keeps_count_and_is_finite(vectors in vector_sets(40)) {
        let points = project_to_2d(&vectors, &ProjectionOptions::default()).unwrap();
        prop_assert_eq!(points.len(), vectors.len());
        prop_assert!(points.iter().all(Point2D::is_finite));
    }

    #[test]
    fn projection_captures_at_least_the_widest_coordinate(vectors in vector_sets(40)) {
        let n = vectors.len() as f64;
        let dims = vectors[0].len();
        let widest = (0..dims)
            .map(|j| {
                let mean = vectors.iter().map(|v| v[j] as f64).sum::<f64>() / n;
                vectors.iter().map(|v| (v[j] as f64 - mean).powi(2)).sum::<f64>()
            })
            .fold(0.0, f64::max);

        let points = project_to_2d(&vectors, &ProjectionOptions::default()).unwrap();
        let captured: f64 = points.iter().map(|p| p.x * p.x + p.y * p.y).sum();

        if vectors.len() >= 2 {
            prop_assert!(captured + 1e-6 * (1.0 + widest) >= widest);
        }
    }

    #[test]
    fn partition_is_disjoint_and_in_bounds(vectors in vector_sets(45)) {
        let n = vectors.len();
        let layout = Layout::compute(&vectors, &seeded_policy()).unwrap();
        let partition = &layout.outcome.partition;

        prop_assert!(partition.validate(n).is_ok());

        let mut seen = HashSet::new();
        for (_, members) in partition.iter() {
            prop_assert!(!members.is_empty());
            for &index in members {
                prop_assert!(index < n);
                prop_assert!(seen.insert(index), "index {} in two clusters", index);
            }
        }

        // Ids are compacted to 0..k
        let ids: Vec<usize> = partition.ids().collect();
        prop_assert_eq!(ids, (0..partition.len()).collect::<Vec<_>>());

        // Fallback never produces more than half as many clusters as points
        if layout.outcome.strategy == StrategyKind::Fallback {
            prop_assert!(partition.len() <= (n / 2).max(1));
        }
    }

    #[test]
    fn summaries_cover_their_members(vectors in vector_sets(30)) {
        let layout = Layout::compute(&vectors, &seeded_policy()).unwrap();
        let summaries = layout.summaries();
        prop_assert_eq!(summaries.len(), layout.outcome.partition.len());

        for summary in &summaries {
            let members = layout.outcome.partition.members(summary.id).unwrap();
            let centre = Point2D::new(summary.cx, summary.cy);
            for &index in members {
                prop_assert!(layout.points[index].distance(&centre) <= summary.radius + 1e-9);
            }
        }
    }
}

#[test]
fn dense_blob_of_forty_falls_back_to_several_clusters() {
    let points: Vec<Point2D> = (0..40)
        .map(|i| Point2D::new((i % 8) as f64 * 0.02, (i / 8) as f64 * 0.02))
        .collect();
    let orchestrator = ClusterOrchestrator::new(seeded_policy().clustering);

    let outcome = orchestrator.run(&points).unwrap();

    assert_eq!(outcome.strategy, StrategyKind::Fallback);
    assert!(outcome.density_skipped);
    assert!(outcome.partition.len() >= 2);
    assert!(outcome.partition.len() <= 20);
}
