// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline flattening: a logical-time-ordered, single-pass replay
//! schedule for a step's action graph.

use crate::graph::ActionGraph;

/// One scheduled application of a node in a flattened timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedVisit {
    /// Node index into the owning graph
    pub node: usize,
    /// Logical application time, seconds from graph start
    pub time_point: f32,
}

/// Flatten a graph into its logical-time application schedule.
///
/// Every node reachable from an entry edge is recorded once per
/// distinct path (multi-in nodes are not deduplicated), with
/// `time_point(successor) = time_point(node) + node.effective_elapse()`
/// and entry nodes at zero. The result is stable-sorted ascending by
/// time point, so ties keep their discovery order - entry edges first
/// in declaration order, then successors in edge-declaration order.
///
/// Applying the records in order reproduces the end-state live
/// execution converges to, with no reliance on wall-clock waiting.
/// The computation is pure: the same graph always yields the same
/// schedule.
pub fn flatten(graph: &ActionGraph) -> Vec<TimedVisit> {
    let mut visits = Vec::new();
    let mut path = Vec::new();
    for to in graph.entry_edges().map(|e| e.to).collect::<Vec<_>>() {
        visit(graph, to, 0.0, &mut path, &mut visits);
    }
    visits.sort_by(|a, b| a.time_point.total_cmp(&b.time_point));
    visits
}

/// Timeline length of a graph: the latest flattened time point plus
/// that node's own delay. Zero for a graph with no entry edge.
pub fn total_duration(graph: &ActionGraph) -> f32 {
    flatten(graph)
        .iter()
        .filter_map(|v| {
            let node = graph.node(v.node)?;
            Some(v.time_point + node.effective_elapse())
        })
        .fold(0.0, f32::max)
}

fn visit(
    graph: &ActionGraph,
    index: usize,
    time: f32,
    path: &mut Vec<usize>,
    out: &mut Vec<TimedVisit>,
) {
    let Some(node) = graph.node(index) else {
        tracing::error!(index, "Edge points at a missing node; path abandoned");
        return;
    };
    if path.contains(&index) {
        tracing::error!(index, "Cycle in action graph; path abandoned");
        return;
    }

    out.push(TimedVisit {
        node: index,
        time_point: time,
    });

    path.push(index);
    let next = time + node.effective_elapse();
    for to in graph.edges_from(index).map(|e| e.to).collect::<Vec<_>>() {
        visit(graph, to, next, path, out);
    }
    path.pop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionNode, ActionOp};
    use crate::edge::Edge;

    fn node(id: &str, op: ActionOp, elapse: f32) -> ActionNode {
        ActionNode::new(id, op).with_elapse(elapse)
    }

    /// entry -> A (move, 2.0s); A -> B, A -> C (recolor). B and C land
    /// at the same time point and keep edge-declaration order.
    fn fan_out_graph() -> ActionGraph {
        let mut graph = ActionGraph::new();
        let a = graph.add_node(node("action-1", ActionOp::Move { to: [0.0, 1.0, 0.0] }, 2.0));
        let b = graph.add_node(node(
            "action-2",
            ActionOp::Recolor {
                color: [1.0, 0.0, 0.0, 1.0],
            },
            1.0,
        ));
        let c = graph.add_node(node(
            "action-3",
            ActionOp::Recolor {
                color: [0.0, 1.0, 0.0, 1.0],
            },
            1.0,
        ));
        graph.add_edge(Edge::entry(a)).unwrap();
        graph.add_edge(Edge::between(a, b)).unwrap();
        graph.add_edge(Edge::between(a, c)).unwrap();
        graph
    }

    #[test]
    fn test_fan_out_time_points_and_order() {
        let graph = fan_out_graph();
        let visits = flatten(&graph);

        assert_eq!(visits.len(), 3);
        assert_eq!(visits[0], TimedVisit { node: 0, time_point: 0.0 });
        assert_eq!(visits[1], TimedVisit { node: 1, time_point: 2.0 });
        assert_eq!(visits[2], TimedVisit { node: 2, time_point: 2.0 });
    }

    #[test]
    fn test_flatten_is_pure() {
        let graph = fan_out_graph();
        assert_eq!(flatten(&graph), flatten(&graph));
    }

    #[test]
    fn test_instant_nodes_contribute_no_delay() {
        let mut graph = ActionGraph::new();
        let a = graph.add_node(node("action-1", ActionOp::Delay, 5.0).with_instant(true));
        let b = graph.add_node(node("action-2", ActionOp::Delay, 1.0));
        graph.add_edge(Edge::entry(a)).unwrap();
        graph.add_edge(Edge::between(a, b)).unwrap();

        let visits = flatten(&graph);
        assert_eq!(visits[0].time_point, 0.0);
        assert_eq!(visits[1].time_point, 0.0);
    }

    #[test]
    fn test_diamond_records_one_visit_per_path() {
        let mut graph = ActionGraph::new();
        let a = graph.add_node(node("action-1", ActionOp::Delay, 1.0));
        let b = graph.add_node(node("action-2", ActionOp::Delay, 2.0));
        let c = graph.add_node(node("action-3", ActionOp::Delay, 3.0));
        let d = graph.add_node(node("action-4", ActionOp::Delay, 0.0));
        graph.add_edge(Edge::entry(a)).unwrap();
        graph.add_edge(Edge::between(a, b)).unwrap();
        graph.add_edge(Edge::between(a, c)).unwrap();
        graph.add_edge(Edge::between(b, d)).unwrap();
        graph.add_edge(Edge::between(c, d)).unwrap();

        let visits = flatten(&graph);
        let d_visits: Vec<_> = visits.iter().filter(|v| v.node == d).collect();
        assert_eq!(d_visits.len(), 2);
        assert_eq!(d_visits[0].time_point, 3.0);
        assert_eq!(d_visits[1].time_point, 4.0);
    }

    #[test]
    fn test_unreachable_nodes_are_not_visited() {
        let mut graph = ActionGraph::new();
        let a = graph.add_node(node("action-1", ActionOp::Delay, 1.0));
        let orphan = graph.add_node(node("action-2", ActionOp::Delay, 1.0));
        graph.add_edge(Edge::entry(a)).unwrap();

        let visits = flatten(&graph);
        assert!(visits.iter().all(|v| v.node != orphan));
    }

    #[test]
    fn test_cycle_terminates() {
        let mut graph = ActionGraph::new();
        let a = graph.add_node(node("action-1", ActionOp::Delay, 1.0));
        let b = graph.add_node(node("action-2", ActionOp::Delay, 1.0));
        graph.add_edge(Edge::entry(a)).unwrap();
        graph.add_edge(Edge::between(a, b)).unwrap();
        graph.add_edge(Edge::between(b, a)).unwrap();

        let visits = flatten(&graph);
        assert_eq!(visits.len(), 2);
    }

    #[test]
    fn test_total_duration() {
        let graph = fan_out_graph();
        assert_eq!(total_duration(&graph), 3.0);
        assert_eq!(total_duration(&ActionGraph::new()), 0.0);
    }
}
