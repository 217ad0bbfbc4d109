//! Integration tests for the sequential batch aggregator

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use drive_routes::{
    BatchAggregator, Coordinate, LoadError, NoticeLevel, OdPair, PairSource, RouteSummary,
    RoutingError, RoutingProvider, TabularPairs,
};
use proptest::prelude::*;

/// Scripted provider: fails for the listed call numbers (0-based), otherwise
/// returns a straight line whose duration is `base_seconds + call * 60`.
struct ScriptedProvider {
    fail_on: Vec<usize>,
    base_seconds: f64,
    calls: AtomicUsize,
    seen: Mutex<Vec<(Coordinate, Coordinate)>>,
}

impl ScriptedProvider {
    fn new(fail_on: Vec<usize>, base_seconds: f64) -> Self {
        Self {
            fail_on,
            base_seconds,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RoutingProvider for ScriptedProvider {
    fn get_directions(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<RouteSummary, RoutingError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push((start, end));
        if self.fail_on.contains(&call) {
            return Err(RoutingError::NoRoute("Route could not be found".to_string()));
        }
        Ok(RouteSummary {
            duration_seconds: self.base_seconds + call as f64 * 60.0,
            geometry: vec![start, end],
        })
    }
}

fn pairs(n: usize) -> Vec<OdPair> {
    let rows: Vec<((f64, f64), (f64, f64))> = (0..n)
        .map(|i| {
            let shift = i as f64 * 0.01;
            ((25.0 + shift, 55.0), (25.2, 55.3 + shift))
        })
        .collect();
    drive_routes::ManualPairs::new(rows).load().unwrap().pairs
}

#[test]
fn test_middle_failure_keeps_neighbours_in_order() {
    let provider = ScriptedProvider::new(vec![1], 600.0);
    let input = pairs(3);
    let outcome = BatchAggregator::new(&provider).run(&input);

    assert_eq!(provider.calls(), 3);
    assert_eq!(outcome.rows.len(), 2);
    assert_eq!(outcome.rows[0].pair_id.label, "Pair 1");
    assert_eq!(outcome.rows[1].pair_id.label, "Pair 3");
    assert_eq!(outcome.failures.len(), 1);

    let (failed_pair, err) = &outcome.failures[0];
    assert_eq!(failed_pair, &input[1]);
    assert_eq!(err.pair.label, "Pair 2");
    assert!(matches!(err.cause, RoutingError::NoRoute(_)));

    let levels: Vec<NoticeLevel> = outcome.notices.iter().map(|n| n.level).collect();
    assert_eq!(
        levels,
        vec![NoticeLevel::Info, NoticeLevel::Warning, NoticeLevel::Info]
    );
    assert!(outcome.notices[1].to_string().contains("Pair 2"));
}

#[test]
fn test_rows_and_items_correspond() {
    let provider = ScriptedProvider::new(vec![0, 3], 120.0);
    let input = pairs(5);
    let outcome = BatchAggregator::new(&provider).run(&input);

    assert_eq!(outcome.rows.len(), outcome.items.len());
    for (row, item) in outcome.rows.iter().zip(&outcome.items) {
        assert_eq!(row.pair_id, item.pair_id);
        let pair = &input[row.pair_id.index];
        assert_eq!(item.origin, pair.origin);
        assert_eq!(item.destination, pair.destination);
        assert_eq!(item.geometry, vec![pair.origin, pair.destination]);
    }
}

#[test]
fn test_pairs_are_routed_in_input_order() {
    let provider = ScriptedProvider::new(vec![], 60.0);
    let input = pairs(4);
    BatchAggregator::new(&provider).run(&input);

    let seen = provider.seen.lock().unwrap();
    let expected: Vec<(Coordinate, Coordinate)> =
        input.iter().map(|p| (p.origin, p.destination)).collect();
    assert_eq!(*seen, expected);
}

#[test]
fn test_drive_time_is_seconds_over_sixty() {
    let provider = ScriptedProvider::new(vec![], 754.0);
    let outcome = BatchAggregator::new(&provider).run(&pairs(1));
    assert_eq!(outcome.rows[0].drive_time_minutes, 754.0 / 60.0);
    assert_eq!(outcome.rows[0].formatted_drive_time(), "12.57");
}

#[test]
fn test_empty_batch_makes_no_calls() {
    let provider = ScriptedProvider::new(vec![], 60.0);
    let outcome = BatchAggregator::new(&provider).run(&[]);
    assert_eq!(provider.calls(), 0);
    assert!(outcome.is_empty());
    assert!(outcome.items.is_empty());
    assert!(outcome.failures.is_empty());
}

#[test]
fn test_all_failures_leave_nothing_to_render() {
    let provider = ScriptedProvider::new(vec![0, 1], 60.0);
    let outcome = BatchAggregator::new(&provider).run(&pairs(2));
    assert!(outcome.is_empty());
    assert_eq!(outcome.failures.len(), 2);
    assert_eq!(outcome.processed(), 2);
}

#[test]
fn test_missing_column_means_zero_routing_calls() {
    let provider = ScriptedProvider::new(vec![], 60.0);
    let data = "Origin,Origin_Lat,Destination,Destination_Lat,Destination_Lon\nA,1,B,2,3\n";

    let result = TabularPairs::from_bytes(data.as_bytes().to_vec())
        .load()
        .map(|load| BatchAggregator::new(&provider).run(&load.pairs));

    assert!(matches!(result, Err(LoadError::Parse(_))));
    assert_eq!(provider.calls(), 0);
}

#[test]
fn test_boxed_provider_is_usable() {
    let provider: Box<dyn RoutingProvider> = Box::new(ScriptedProvider::new(vec![], 60.0));
    let outcome = BatchAggregator::new(provider.as_ref()).run(&pairs(2));
    assert_eq!(outcome.rows.len(), 2);
}

proptest! {
    #[test]
    fn prop_every_pair_is_either_routed_or_failed(
        n in 0usize..=10,
        fail_mask in proptest::collection::vec(any::<bool>(), 10),
    ) {
        let fail_on: Vec<usize> = (0..n).filter(|i| fail_mask[*i]).collect();
        let expected_failures = fail_on.len();
        let provider = ScriptedProvider::new(fail_on, 30.0);
        let input = pairs(n);

        let outcome = BatchAggregator::new(&provider).run(&input);

        prop_assert_eq!(outcome.rows.len() + outcome.failures.len(), n);
        prop_assert_eq!(outcome.failures.len(), expected_failures);
        prop_assert_eq!(outcome.rows.len(), outcome.items.len());
        prop_assert_eq!(outcome.notices.len(), n);
        let indices: Vec<usize> = outcome.rows.iter().map(|r| r.pair_id.index).collect();
        let mut sorted = indices.clone();
        sorted.sort_unstable();
        prop_assert_eq!(indices, sorted);
    }
}
