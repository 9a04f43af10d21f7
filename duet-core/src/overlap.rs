//! Group events into overlap clusters for side-by-side rendering.

use serde::{Deserialize, Serialize};

use crate::event::TimelineEvent;

/// Anything with a half-open `[start_key, end_key)` range.
pub trait Interval {
    fn start_key(&self) -> i64;
    fn end_key(&self) -> i64;
}

impl Interval for TimelineEvent {
    fn start_key(&self) -> i64 {
        self.start.timestamp()
    }

    fn end_key(&self) -> i64 {
        self.visible_end().timestamp()
    }
}

impl<T: Interval> Interval for &T {
    fn start_key(&self) -> i64 {
        (*self).start_key()
    }

    fn end_key(&self) -> i64 {
        (*self).end_key()
    }
}

/// How consecutive events are merged into a cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingStrategy {
    /// Join when the start does not exceed the *previous* event's end.
    ///
    /// Misses an event that overlaps an earlier, longer cluster member but
    /// not its immediate predecessor.
    Adjacent,
    /// Join when the start is before the running maximum end of the cluster.
    #[default]
    Sweep,
}

pub type Cluster<'a, T> = Vec<&'a T>;

/// Partition `items` into overlap clusters.
///
/// Items are ordered by start (then longer first) before grouping, so callers
/// may pass them in any order. Every item ends up in exactly one cluster.
pub fn group<T: Interval>(items: &[T], strategy: GroupingStrategy) -> Vec<Cluster<'_, T>> {
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by(|a, b| {
        a.start_key()
            .cmp(&b.start_key())
            .then(b.end_key().cmp(&a.end_key()))
    });

    let mut clusters: Vec<Cluster<'_, T>> = Vec::new();
    let mut current: Cluster<'_, T> = Vec::new();
    let mut cluster_end = i64::MIN;

    for item in sorted {
        let joins = match (strategy, current.last()) {
            (_, None) => true,
            (GroupingStrategy::Adjacent, Some(prev)) => item.start_key() <= prev.end_key(),
            (GroupingStrategy::Sweep, Some(_)) => item.start_key() < cluster_end,
        };

        if !joins {
            clusters.push(std::mem::take(&mut current));
            cluster_end = i64::MIN;
        }

        cluster_end = cluster_end.max(item.end_key());
        current.push(item);
    }

    if !current.is_empty() {
        clusters.push(current);
    }

    clusters
}

fn overlaps<T: Interval>(a: &T, b: &T) -> bool {
    a.start_key() < b.end_key() && b.start_key() < a.end_key()
}

/// True when every pair of members intersects.
pub fn is_pairwise_overlapping<T: Interval>(cluster: &[&T]) -> bool {
    cluster
        .iter()
        .enumerate()
        .all(|(i, a)| cluster[i + 1..].iter().all(|b| overlaps(*a, *b)))
}

/// True when no member of one cluster intersects a member of another.
pub fn clusters_are_disjoint<T: Interval>(clusters: &[Cluster<'_, T>]) -> bool {
    clusters.iter().enumerate().all(|(i, a)| {
        clusters[i + 1..]
            .iter()
            .all(|b| a.iter().all(|x| b.iter().all(|y| !overlaps(*x, *y))))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Span(i64, i64);

    impl Interval for Span {
        fn start_key(&self) -> i64 {
            self.0
        }

        fn end_key(&self) -> i64 {
            self.1
        }
    }

    fn shape(clusters: &[Cluster<'_, Span>]) -> Vec<Vec<(i64, i64)>> {
        clusters
            .iter()
            .map(|c| c.iter().map(|s| (s.0, s.1)).collect())
            .collect()
    }

    #[test]
    fn test_empty_input_has_no_clusters() {
        let spans: Vec<Span> = vec![];
        assert!(group(&spans, GroupingStrategy::Sweep).is_empty());
    }

    #[test]
    fn test_separate_events_get_separate_clusters() {
        let spans = vec![Span(540, 600), Span(660, 720)];
        let clusters = group(&spans, GroupingStrategy::Sweep);
        assert_eq!(shape(&clusters), vec![vec![(540, 600)], vec![(660, 720)]]);
    }

    #[test]
    fn test_unsorted_input_is_sorted_first() {
        let spans = vec![Span(600, 660), Span(540, 620)];
        let clusters = group(&spans, GroupingStrategy::Sweep);
        assert_eq!(shape(&clusters), vec![vec![(540, 620), (600, 660)]]);
    }

    #[test]
    fn test_every_item_lands_in_exactly_one_cluster() {
        let spans = vec![
            Span(0, 30),
            Span(10, 20),
            Span(25, 60),
            Span(90, 120),
            Span(100, 100),
            Span(200, 260),
        ];
        for strategy in [GroupingStrategy::Adjacent, GroupingStrategy::Sweep] {
            let clusters = group(&spans, strategy);
            let total: usize = clusters.iter().map(Vec::len).sum();
            assert_eq!(total, spans.len(), "{strategy:?}");
        }
    }

    #[test]
    fn test_adjacent_strategy_misses_transitive_overlap() {
        // A long event, a short one inside it, then one that overlaps only A.
        let spans = vec![Span(540, 720), Span(570, 600), Span(660, 690)];

        let adjacent = group(&spans, GroupingStrategy::Adjacent);
        assert_eq!(
            shape(&adjacent),
            vec![vec![(540, 720), (570, 600)], vec![(660, 690)]]
        );
        // (660, 690) still intersects (540, 720) across clusters
        assert!(!clusters_are_disjoint(&adjacent));

        let sweep = group(&spans, GroupingStrategy::Sweep);
        assert_eq!(sweep.len(), 1);
        assert!(clusters_are_disjoint(&sweep));
    }

    #[test]
    fn test_sweep_cluster_is_connected_but_not_pairwise() {
        // A chain: first overlaps second, second overlaps third
        let spans = vec![Span(0, 60), Span(30, 90), Span(75, 120)];
        let clusters = group(&spans, GroupingStrategy::Sweep);

        assert_eq!(clusters.len(), 1);
        assert!(!is_pairwise_overlapping(&clusters[0]));
    }

    #[test]
    fn test_adjacent_joins_touching_events_sweep_does_not() {
        let spans = vec![Span(540, 600), Span(600, 660)];
        assert_eq!(group(&spans, GroupingStrategy::Adjacent).len(), 1);
        assert_eq!(group(&spans, GroupingStrategy::Sweep).len(), 2);
    }

    #[test]
    fn test_sweep_clusters_are_disjoint() {
        let spans = vec![
            Span(0, 45),
            Span(15, 30),
            Span(40, 50),
            Span(50, 55),
            Span(54, 80),
            Span(120, 180),
        ];
        let clusters = group(&spans, GroupingStrategy::Sweep);
        assert!(clusters_are_disjoint(&clusters));
        assert_eq!(clusters.len(), 3);
    }
}
