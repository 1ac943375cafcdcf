// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph execution: live, accelerated, and instantaneous replay of a
//! step's actions.

use crate::action::ActionNode;
use crate::graph::ActionGraph;
use crate::schedule::Scheduler;
use crate::timeline;

/// How an action's effect is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApplyMode {
    /// Animated at the authored duration
    Live,
    /// Animated, durations divided by the acceleration factor
    Skip {
        /// Acceleration factor, greater than one speeds up
        multiple: f32,
    },
    /// Instantaneous, non-animated
    Immediate,
}

/// A node's effect could not be applied to its target.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    /// The target lacks a capability the operation requires
    #[error("Capability absent on target: {0}")]
    Absent(String),

    /// The node's target reference never resolved to a live entity
    #[error("Action has no resolved target")]
    UnresolvedTarget,
}

/// Applies action effects to the outside world.
///
/// The engine logs a failed application and carries on with the walk;
/// a single bad node never aborts its step.
pub trait ActionApplier {
    /// Apply `node`'s effect in `mode`
    fn apply(&mut self, node: &ActionNode, mode: ApplyMode) -> Result<(), CapabilityError>;
}

/// In-flight replay of one step's action graph.
///
/// Starting a run applies the entry actions immediately; instant nodes
/// chain into their successors in the same call, and everything else is
/// parked on the internal scheduler. Drive the remainder with
/// [`GraphRun::tick`] until [`GraphRun::is_finished`].
///
/// A node reached by several activated incoming edges applies once per
/// activation; [`ActionGraph::execute_twice`] lets authors audit for
/// that.
#[derive(Debug)]
pub struct GraphRun {
    mode: ApplyMode,
    pending: Scheduler<usize>,
}

impl GraphRun {
    /// Start a live run: authored durations, animated effects
    pub fn execute(graph: &ActionGraph, applier: &mut dyn ActionApplier) -> Self {
        Self::start(graph, ApplyMode::Live, applier)
    }

    /// Start an accelerated run: continuation delays and animation
    /// durations are divided by `multiple`
    pub fn skip(graph: &ActionGraph, multiple: f32, applier: &mut dyn ActionApplier) -> Self {
        let multiple = if multiple > 0.0 {
            multiple
        } else {
            tracing::warn!(multiple, "Non-positive skip multiple; falling back to 1");
            1.0
        };
        Self::start(graph, ApplyMode::Skip { multiple }, applier)
    }

    /// Apply the whole graph instantaneously, in flattened timeline
    /// order (see [`timeline::flatten`]); nothing is scheduled
    pub fn skip_immediate(graph: &ActionGraph, applier: &mut dyn ActionApplier) {
        for visit in timeline::flatten(graph) {
            let Some(node) = graph.node(visit.node) else {
                continue;
            };
            apply_logged(node, ApplyMode::Immediate, applier);
        }
    }

    fn start(graph: &ActionGraph, mode: ApplyMode, applier: &mut dyn ActionApplier) -> Self {
        let mut run = Self {
            mode,
            pending: Scheduler::new(),
        };
        let mut path = Vec::new();
        for to in graph.entry_edges().map(|e| e.to).collect::<Vec<_>>() {
            run.activate(graph, to, applier, &mut path);
        }
        run
    }

    /// Advance pending continuations by `dt` seconds of host time
    pub fn tick(&mut self, dt: f32, graph: &ActionGraph, applier: &mut dyn ActionApplier) {
        let mut path = Vec::new();
        for index in self.pending.tick(dt) {
            for to in graph.edges_from(index).map(|e| e.to).collect::<Vec<_>>() {
                self.activate(graph, to, applier, &mut path);
            }
        }
    }

    /// No pending continuations remain
    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }

    fn activate(
        &mut self,
        graph: &ActionGraph,
        index: usize,
        applier: &mut dyn ActionApplier,
        path: &mut Vec<usize>,
    ) {
        let Some(node) = graph.node(index) else {
            tracing::error!(index, "Edge points at a missing node; activation dropped");
            return;
        };
        if path.contains(&index) {
            tracing::error!(index, "Cycle of instant actions; activation dropped");
            return;
        }

        apply_logged(node, self.mode, applier);

        if node.instant {
            path.push(index);
            for to in graph.edges_from(index).map(|e| e.to).collect::<Vec<_>>() {
                self.activate(graph, to, applier, path);
            }
            path.pop();
        } else {
            self.pending.schedule(self.delay_for(node), index);
        }
    }

    fn delay_for(&self, node: &ActionNode) -> f32 {
        match self.mode {
            ApplyMode::Live | ApplyMode::Immediate => node.elapse_time,
            ApplyMode::Skip { multiple } => node.elapse_time / multiple,
        }
    }
}

fn apply_logged(node: &ActionNode, mode: ApplyMode, applier: &mut dyn ActionApplier) {
    if let Err(err) = applier.apply(node, mode) {
        tracing::error!(node = %node.id, kind = ?node.kind(), %err, "Action effect skipped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionOp, ActionNode};
    use crate::edge::Edge;

    /// Applier that records node IDs in application order and can be
    /// told to fail specific nodes.
    #[derive(Default)]
    struct RecordingApplier {
        applied: Vec<(String, ApplyMode)>,
        failing: Vec<String>,
    }

    impl ActionApplier for RecordingApplier {
        fn apply(&mut self, node: &ActionNode, mode: ApplyMode) -> Result<(), CapabilityError> {
            if self.failing.iter().any(|id| *id == node.id) {
                return Err(CapabilityError::Absent("tween".to_string()));
            }
            self.applied.push((node.id.clone(), mode));
            Ok(())
        }
    }

    fn ids(applier: &RecordingApplier) -> Vec<&str> {
        applier.applied.iter().map(|(id, _)| id.as_str()).collect()
    }

    fn delay(id: &str, secs: f32) -> ActionNode {
        ActionNode::new(id, ActionOp::Delay).with_elapse(secs)
    }

    /// entry -> A (2.0s) -> B, C.
    fn fan_out() -> ActionGraph {
        let mut graph = ActionGraph::new();
        let a = graph.add_node(delay("a", 2.0));
        let b = graph.add_node(delay("b", 1.0));
        let c = graph.add_node(delay("c", 1.0));
        graph.add_edge(Edge::entry(a)).unwrap();
        graph.add_edge(Edge::between(a, b)).unwrap();
        graph.add_edge(Edge::between(a, c)).unwrap();
        graph
    }

    #[test]
    fn test_execute_applies_entries_immediately() {
        let graph = fan_out();
        let mut applier = RecordingApplier::default();
        let run = GraphRun::execute(&graph, &mut applier);

        assert_eq!(ids(&applier), vec!["a"]);
        assert!(!run.is_finished());
    }

    #[test]
    fn test_execute_fires_successors_after_elapse() {
        let graph = fan_out();
        let mut applier = RecordingApplier::default();
        let mut run = GraphRun::execute(&graph, &mut applier);

        run.tick(1.9, &graph, &mut applier);
        assert_eq!(ids(&applier), vec!["a"]);

        run.tick(0.1, &graph, &mut applier);
        assert_eq!(ids(&applier), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_instant_chain_applies_in_one_call() {
        let mut graph = ActionGraph::new();
        let a = graph.add_node(delay("a", 5.0).with_instant(true));
        let b = graph.add_node(delay("b", 5.0).with_instant(true));
        let c = graph.add_node(delay("c", 0.0).with_instant(true));
        graph.add_edge(Edge::entry(a)).unwrap();
        graph.add_edge(Edge::between(a, b)).unwrap();
        graph.add_edge(Edge::between(b, c)).unwrap();

        let mut applier = RecordingApplier::default();
        let run = GraphRun::execute(&graph, &mut applier);

        assert_eq!(ids(&applier), vec!["a", "b", "c"]);
        assert!(run.is_finished());
    }

    #[test]
    fn test_skip_divides_continuation_delay() {
        let graph = fan_out();
        let mut applier = RecordingApplier::default();
        let mut run = GraphRun::skip(&graph, 4.0, &mut applier);

        // 2.0s of authored delay becomes 0.5s under skip x4.
        run.tick(0.4, &graph, &mut applier);
        assert_eq!(ids(&applier), vec!["a"]);

        run.tick(0.1, &graph, &mut applier);
        assert_eq!(ids(&applier), vec!["a", "b", "c"]);
        assert_eq!(applier.applied[1].1, ApplyMode::Skip { multiple: 4.0 });
    }

    #[test]
    fn test_failed_node_does_not_abort_the_walk() {
        let mut graph = ActionGraph::new();
        let a = graph.add_node(delay("a", 0.0).with_instant(true));
        let b = graph.add_node(delay("b", 0.0).with_instant(true));
        let c = graph.add_node(delay("c", 0.0).with_instant(true));
        graph.add_edge(Edge::entry(a)).unwrap();
        graph.add_edge(Edge::between(a, b)).unwrap();
        graph.add_edge(Edge::between(b, c)).unwrap();

        let mut applier = RecordingApplier {
            failing: vec!["b".to_string()],
            ..Default::default()
        };
        GraphRun::execute(&graph, &mut applier);

        // b's effect is skipped but its successors still activate.
        assert_eq!(ids(&applier), vec!["a", "c"]);
    }

    #[test]
    fn test_multi_in_node_applies_once_per_activation() {
        let mut graph = ActionGraph::new();
        let a = graph.add_node(delay("a", 0.0).with_instant(true));
        let b = graph.add_node(delay("b", 0.0).with_instant(true));
        let c = graph.add_node(delay("c", 1.0));
        graph.add_edge(Edge::entry(a)).unwrap();
        graph.add_edge(Edge::entry(b)).unwrap();
        graph.add_edge(Edge::between(a, c)).unwrap();
        graph.add_edge(Edge::between(b, c)).unwrap();

        let mut applier = RecordingApplier::default();
        GraphRun::execute(&graph, &mut applier);

        assert_eq!(ids(&applier), vec!["a", "c", "b", "c"]);
    }

    #[test]
    fn test_skip_immediate_applies_in_timeline_order() {
        let graph = fan_out();
        let mut applier = RecordingApplier::default();
        GraphRun::skip_immediate(&graph, &mut applier);

        assert_eq!(ids(&applier), vec!["a", "b", "c"]);
        assert!(applier
            .applied
            .iter()
            .all(|(_, mode)| *mode == ApplyMode::Immediate));
    }

    #[test]
    fn test_terminal_delay_keeps_run_alive_until_it_elapses() {
        let mut graph = ActionGraph::new();
        let a = graph.add_node(delay("a", 1.0));
        graph.add_edge(Edge::entry(a)).unwrap();

        let mut applier = RecordingApplier::default();
        let mut run = GraphRun::execute(&graph, &mut applier);
        assert!(!run.is_finished());

        run.tick(1.0, &graph, &mut applier);
        assert!(run.is_finished());
    }
}
