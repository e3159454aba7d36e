// Line network merging: join fragmented segments that meet at shared
// endpoints into longer continuous paths before a label is placed along
// them. Road networks arrive split per tile or per attribute row; a label
// placed on one fragment of "Main St" would otherwise repeat on every
// fragment.

use geo::{Coord, EuclideanLength, LineString};
use std::collections::{BinaryHeap, HashMap};

// Endpoints join only when exactly coincident. Keying on the raw bit
// patterns keeps -0.0 and 0.0 distinct, matching the exact-equality join
// rule of the node table.
type NodeKey = (u64, u64);

fn node_key(c: Coord<f64>) -> NodeKey {
    (c.x.to_bits(), c.y.to_bits())
}

#[derive(PartialEq)]
struct Ranked {
    length: f64,
    slot: usize,
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.length
            .total_cmp(&other.length)
            .then_with(|| self.slot.cmp(&other.slot))
    }
}

struct Network {
    slots: Vec<Option<LineString<f64>>>,
    nodes: HashMap<NodeKey, Vec<usize>>,
    heap: BinaryHeap<Ranked>,
}

impl Network {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            nodes: HashMap::new(),
            heap: BinaryHeap::new(),
        }
    }

    fn insert(&mut self, line: LineString<f64>) {
        let slot = self.slots.len();
        let length = line.euclidean_length();
        self.register(&line, slot);
        self.slots.push(Some(line));
        self.heap.push(Ranked { length, slot });
    }

    fn register(&mut self, line: &LineString<f64>, slot: usize) {
        let (start, end) = endpoints(line);
        self.nodes.entry(node_key(start)).or_default().push(slot);
        if node_key(end) != node_key(start) {
            self.nodes.entry(node_key(end)).or_default().push(slot);
        }
    }

    fn unregister(&mut self, line: &LineString<f64>, slot: usize) {
        let (start, end) = endpoints(line);
        for key in [node_key(start), node_key(end)] {
            if let Some(incident) = self.nodes.get_mut(&key) {
                incident.retain(|&s| s != slot);
                if incident.is_empty() {
                    self.nodes.remove(&key);
                }
            }
        }
    }

    /// Longest live line incident to `at`, excluding already-taken slots.
    fn longest_incident(&self, at: Coord<f64>) -> Option<usize> {
        let incident = self.nodes.get(&node_key(at))?;
        incident
            .iter()
            .copied()
            .filter(|&slot| self.slots[slot].is_some())
            .max_by(|&a, &b| {
                let la = self.slots[a].as_ref().map(|l| l.euclidean_length()).unwrap_or(0.0);
                let lb = self.slots[b].as_ref().map(|l| l.euclidean_length()).unwrap_or(0.0);
                la.total_cmp(&lb).then_with(|| a.cmp(&b))
            })
    }

    fn take(&mut self, slot: usize) -> Option<LineString<f64>> {
        let line = self.slots[slot].take()?;
        self.unregister(&line, slot);
        Some(line)
    }
}

fn endpoints(line: &LineString<f64>) -> (Coord<f64>, Coord<f64>) {
    (line.0[0], line.0[line.0.len() - 1])
}

/// Concatenate two paths sharing an endpoint, reversing orientation as
/// needed so the shared coordinate appears once. `None` when they do not
/// touch.
fn join(a: &LineString<f64>, b: &LineString<f64>) -> Option<LineString<f64>> {
    let (a0, a1) = endpoints(a);
    let (b0, b1) = endpoints(b);
    let mut coords = a.0.clone();
    if node_key(a1) == node_key(b0) {
        coords.extend(b.0.iter().skip(1).copied());
    } else if node_key(a1) == node_key(b1) {
        coords.extend(b.0.iter().rev().skip(1).copied());
    } else if node_key(a0) == node_key(b1) {
        let mut joined = b.0.clone();
        joined.extend(coords.into_iter().skip(1));
        coords = joined;
    } else if node_key(a0) == node_key(b0) {
        let mut joined: Vec<Coord<f64>> = b.0.iter().rev().copied().collect();
        joined.extend(coords.into_iter().skip(1));
        coords = joined;
    } else {
        return None;
    }
    Some(LineString::from(coords))
}

/// Greedy longest-first merge of a fragmented line network.
///
/// Lines are popped longest-first; each is extended at both endpoints with
/// the longest remaining incident line until neither endpoint touches
/// anything, then emitted. At junctions of degree three or more the
/// longest-first choice is a heuristic: it is order-dependent and not an
/// optimal matching, and that behavior is intentional.
pub fn merge_line_network(input: Vec<LineString<f64>>) -> Vec<LineString<f64>> {
    let mut network = Network::new();
    for line in input {
        if line.0.len() < 2 {
            continue;
        }
        network.insert(line);
    }

    let mut merged = Vec::new();
    while let Some(Ranked { slot, .. }) = network.heap.pop() {
        // Stale heap entries point at slots consumed by an earlier merge.
        let Some(mut line) = network.take(slot) else {
            continue;
        };
        loop {
            let (start, end) = endpoints(&line);
            let next = network
                .longest_incident(end)
                .or_else(|| network.longest_incident(start));
            let Some(other_slot) = next else {
                break;
            };
            let Some(other) = network.take(other_slot) else {
                break;
            };
            match join(&line, &other) {
                Some(combined) => line = combined,
                // Unreachable for a table-consistent neighbor.
                None => break,
            }
        }
        merged.push(line);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    #[test]
    fn single_line_is_unchanged() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 5.0, y: 0.0), (x: 9.0, y: 3.0)];
        let before = line.euclidean_length();
        let merged = merge_line_network(vec![line.clone()]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0], line);
        assert_eq!(merged[0].euclidean_length(), before);
    }

    #[test]
    fn closed_ring_is_unchanged() {
        let ring = line_string![
            (x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 0.0)
        ];
        let merged = merge_line_network(vec![ring.clone()]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0], ring);
    }

    #[test]
    fn two_touching_segments_become_one_path() {
        let a = line_string![(x: 0.0, y: 0.0), (x: 5.0, y: 0.0)];
        let b = line_string![(x: 5.0, y: 0.0), (x: 9.0, y: 0.0)];
        let merged = merge_line_network(vec![a, b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].0.len(), 3);
        assert_eq!(merged[0].euclidean_length(), 9.0);
    }

    #[test]
    fn reversed_orientation_still_joins() {
        let a = line_string![(x: 0.0, y: 0.0), (x: 5.0, y: 0.0)];
        // Shares the endpoint (5, 0) but runs toward it.
        let b = line_string![(x: 9.0, y: 0.0), (x: 5.0, y: 0.0)];
        let merged = merge_line_network(vec![a, b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].euclidean_length(), 9.0);
    }

    #[test]
    fn disjoint_segments_stay_separate() {
        let a = line_string![(x: 0.0, y: 0.0), (x: 5.0, y: 0.0)];
        let b = line_string![(x: 20.0, y: 0.0), (x: 25.0, y: 0.0)];
        let merged = merge_line_network(vec![a, b]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn t_junction_joins_the_two_longest_arms() {
        // Three segments meet at (10, 0); the two long colinear arms join
        // and the short spur remains on its own.
        let west = line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)];
        let east = line_string![(x: 10.0, y: 0.0), (x: 22.0, y: 0.0)];
        let spur = line_string![(x: 10.0, y: 0.0), (x: 10.0, y: 3.0)];
        let merged = merge_line_network(vec![west, east, spur]);
        assert_eq!(merged.len(), 2);
        let longest = merged
            .iter()
            .map(|l| l.euclidean_length())
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(longest, 22.0);
    }

    #[test]
    fn chain_of_fragments_collapses_to_one() {
        let mut fragments = Vec::new();
        for i in 0..10 {
            let x0 = i as f64 * 3.0;
            fragments.push(line_string![(x: x0, y: 0.0), (x: x0 + 3.0, y: 0.0)]);
        }
        let merged = merge_line_network(fragments);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].euclidean_length(), 30.0);
        assert_eq!(merged[0].0.len(), 11);
    }

    #[test]
    fn degenerate_lines_are_dropped() {
        let empty = LineString::<f64>::from(Vec::<Coord<f64>>::new());
        let solo = LineString::from(vec![Coord { x: 1.0, y: 1.0 }]);
        let real = line_string![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0)];
        let merged = merge_line_network(vec![empty, solo, real.clone()]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0], real);
    }
}
