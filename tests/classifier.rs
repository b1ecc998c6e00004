//! End-to-end scenarios for `Classifier::predict`.

use kd_knn::reducer::Reducer;
use kd_knn::{Classifier, Euclidean, Identity, Point};

fn lcg(seed: u64) -> impl FnMut() -> f64 {
    let mut state = seed.wrapping_mul(2_862_933_555_777_941_757).wrapping_add(1);
    move || {
        state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
        ((state >> 33) as f64) / (u32::MAX as f64)
    }
}

#[test]
fn adaptive_growth_converges_and_updates_warm_up_radius() {
    let mut rng = lcg(2026);
    let training: Vec<(Point<f64, 3>, usize)> = (0..1_000)
        .map(|i| (Point([rng(), rng(), rng()]), i % 5))
        .collect();

    let mut clf: Classifier<f64, 3, 3, usize, Identity, Euclidean> = Classifier::new(training.into_iter()).unwrap();

    let query = Point([0.5, 0.5, 0.5]);
    let label = clf.predict(&query, 10, Some(0.01), None);
    assert!(label.is_ok());

    let radius = clf.default_search_radius();
    assert!(radius.is_finite());
    assert!(radius > 0.0);
}

/// A reducer that keeps only the first two of five input axes, so the
/// tree ends up with a lower dimensionality than the input space.
struct DropLastThree;

impl Reducer<f64, 5, 2> for DropLastThree {
    fn fit(_positions: impl ExactSizeIterator<Item = Point<f64, 5>>) -> Self {
        Self
    }

    fn reduce(&self, p: &Point<f64, 5>) -> Point<f64, 2> {
        Point([p[0], p[1]])
    }
}

#[test]
fn reducer_integration_drops_dimensions_before_indexing() {
    let mut rng = lcg(7);
    let training: Vec<(Point<f64, 5>, bool)> = (0..100)
        .map(|i| (Point([rng(), rng(), rng(), rng(), rng()]), i % 2 == 0))
        .collect();

    let mut clf: Classifier<f64, 5, 2, bool, DropLastThree, Euclidean> = Classifier::new(training.into_iter()).unwrap();

    let query = Point([0.2, 0.8, 0.0, 0.0, 0.0]);
    let result = clf.predict(&query, 3, None, None);
    assert!(result.is_ok());
}

#[test]
fn empty_training_set_fails_fast() {
    let training: Vec<(Point<f64, 2>, &'static str)> = Vec::new();
    let result: Result<Classifier<f64, 2, 2, &'static str, Identity, Euclidean>, _> = Classifier::new(training.into_iter());
    assert!(result.is_err());
}

#[test]
fn k_greater_than_num_entries_still_predicts() {
    let training = vec![(Point([0.0, 0.0]), "a"), (Point([1.0, 1.0]), "b"), (Point([2.0, 2.0]), "a")];
    let mut clf: Classifier<f64, 2, 2, &'static str, Identity, Euclidean> = Classifier::new(training.into_iter()).unwrap();
    let result = clf.predict(&Point([0.0, 0.0]), 1_000, None, None);
    assert!(result.is_ok());
}

#[test]
fn manhattan_metric_end_to_end_scenario() {
    use kd_knn::Manhattan;

    let training = vec![(Point([0.0, 0.0]), "X"), (Point([3.0, 4.0]), "Y"), (Point([5.0, 0.0]), "Z")];
    let mut clf: Classifier<f64, 2, 2, &'static str, Identity, Manhattan> = Classifier::new(training.into_iter()).unwrap();
    let label = clf.predict(&Point([0.0, 0.0]), 1, None, None).unwrap();
    assert_eq!(label, "X");
}
