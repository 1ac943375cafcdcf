// SPDX-License-Identifier: MIT OR Apache-2.0
//! Step and sequence data model.

use crate::param::ParameterSet;
use crate::scene::ControlMode;
use praxis_graph::action::{EntityId, Vec3};
use praxis_graph::graph::ActionGraph;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a step sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceId(pub Uuid);

impl SequenceId {
    /// Create a new random sequence ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SequenceId {
    fn default() -> Self {
        Self::new()
    }
}

/// Condition gating advancement past a step's entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TriggerKind {
    /// Confirm input resolving to the step target
    #[default]
    MouseClick,
    /// The step's bound UI button fired
    ButtonClick,
    /// The target's tag state reached `Done`
    StateChange,
    /// Advance unconditionally
    AutoExecute,
}

impl TriggerKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::MouseClick => "Mouse Click",
            Self::ButtonClick => "Button Click",
            Self::StateChange => "State Change",
            Self::AutoExecute => "Auto Execute",
        }
    }
}

/// Viewpoint hints applied when a step begins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewHint {
    /// Best viewing angle, euler degrees
    pub best_angle: Vec3,
    /// Offset from the target while viewing
    pub view_offset: Vec3,
    /// Preferred camera position
    pub best_position: Vec3,
    /// Control mode handed to the camera on step begin
    pub control_mode: ControlMode,
}

impl Default for ViewHint {
    fn default() -> Self {
        Self {
            best_angle: [0.0; 3],
            view_offset: [0.0; 3],
            best_position: [0.0; 3],
            control_mode: ControlMode::Free,
        }
    }
}

/// Reference to a step's target entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepTargetRef {
    /// Stable entity ID
    pub id: String,
    /// Scene path of the target, kept as an authoring hint
    pub path: String,
    /// Cached resolution, filled when the sequence is resolved
    #[serde(skip)]
    pub handle: Option<EntityId>,
}

impl StepTargetRef {
    /// Reference an entity by stable ID and scene path
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            handle: None,
        }
    }
}

/// Sentinel strategy name meaning "no strategy bound".
pub const NO_STRATEGY: &str = "<None>";

/// One stage of a guided procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepNode {
    /// Stable ID, allocated by the owning sequence
    pub id: String,
    /// Display name
    pub name: String,
    /// Detail text shown while the step is current
    pub detail: String,
    /// Free-form ancillary text
    pub ancillary: String,
    /// Target entity reference
    pub target: StepTargetRef,
    /// Condition gating advancement
    pub trigger: TriggerKind,
    /// Seconds between executing this step and beginning the next
    pub elapse_time: f32,
    /// Begin the next step in the same tick, ignoring `elapse_time`
    pub instant: bool,
    /// Viewpoint hints
    pub view: ViewHint,
    /// Disabled steps are excluded from the resolved run list
    pub enabled: bool,
    /// Strategy type name; [`NO_STRATEGY`] when unbound
    pub strategy: String,
    /// Named parameters surfaced to the strategy
    pub parameters: ParameterSet,
    /// The step's action graph
    pub graph: ActionGraph,
}

impl StepNode {
    /// Create a new enabled, strategy-less step
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            detail: String::new(),
            ancillary: String::new(),
            target: StepTargetRef::default(),
            trigger: TriggerKind::default(),
            elapse_time: 0.0,
            instant: false,
            view: ViewHint::default(),
            enabled: true,
            strategy: NO_STRATEGY.to_string(),
            parameters: ParameterSet::new(),
            graph: ActionGraph::new(),
        }
    }

    /// Set the target reference
    pub fn with_target(mut self, id: impl Into<String>, path: impl Into<String>) -> Self {
        self.target = StepTargetRef::new(id, path);
        self
    }

    /// Set the trigger kind
    pub fn with_trigger(mut self, trigger: TriggerKind) -> Self {
        self.trigger = trigger;
        self
    }

    /// Set the elapse time in seconds
    pub fn with_elapse(mut self, secs: f32) -> Self {
        self.elapse_time = secs;
        self
    }

    /// Set the instant flag
    pub fn with_instant(mut self, instant: bool) -> Self {
        self.instant = instant;
        self
    }

    /// Bind a strategy type by name
    pub fn with_strategy(mut self, name: impl Into<String>) -> Self {
        self.strategy = name.into();
        self
    }

    /// Whether a strategy type is bound
    pub fn has_strategy(&self) -> bool {
        !self.strategy.is_empty() && self.strategy != NO_STRATEGY
    }
}

/// Current format version written by [`StepSequence::to_ron`].
pub const SEQUENCE_FORMAT_VERSION: u32 = 1;

/// Ordered steps of one procedure, plus the ID-allocation counters the
/// authoring tool draws from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSequence {
    /// Format version for persisted sequences
    pub version: u32,
    /// Unique sequence ID
    pub id: SequenceId,
    /// Display name
    pub name: String,
    steps: Vec<StepNode>,
    next_step_serial: u64,
    next_action_serial: u64,
}

impl StepSequence {
    /// Create a new empty sequence
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: SEQUENCE_FORMAT_VERSION,
            id: SequenceId::new(),
            name: name.into(),
            steps: Vec::new(),
            next_step_serial: 1,
            next_action_serial: 1,
        }
    }

    /// Allocate a stable step ID
    pub fn allocate_step_id(&mut self) -> String {
        let id = format!("step-{}", self.next_step_serial);
        self.next_step_serial += 1;
        id
    }

    /// Allocate a stable action ID
    pub fn allocate_action_id(&mut self) -> String {
        let id = format!("action-{}", self.next_action_serial);
        self.next_action_serial += 1;
        id
    }

    /// Append a step
    pub fn add_step(&mut self, step: StepNode) -> usize {
        self.steps.push(step);
        self.steps.len() - 1
    }

    /// Remove a step by index
    pub fn remove_step(&mut self, index: usize) -> Option<StepNode> {
        if index < self.steps.len() {
            Some(self.steps.remove(index))
        } else {
            None
        }
    }

    /// Get a step by index
    pub fn step(&self, index: usize) -> Option<&StepNode> {
        self.steps.get(index)
    }

    /// Get a mutable step by index
    pub fn step_mut(&mut self, index: usize) -> Option<&mut StepNode> {
        self.steps.get_mut(index)
    }

    /// All steps in procedure order
    pub fn steps(&self) -> &[StepNode] {
        &self.steps
    }

    /// Number of steps
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Enable or disable a step. Takes effect at the next sequence
    /// resolve, not mid-run.
    pub fn set_enabled(&mut self, index: usize, enabled: bool) -> bool {
        match self.steps.get_mut(index) {
            Some(step) => {
                step.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Deep-copy the step at `index`, giving the copy and every one of
    /// its actions fresh counter-allocated IDs. The copy is inserted
    /// right after the original; returns its index.
    pub fn duplicate_step(&mut self, index: usize) -> Option<usize> {
        let source = self.steps.get(index)?.clone();
        let mut copy = source;
        copy.id = self.allocate_step_id();
        copy.name = format!("{} Copy", copy.name);
        copy.target.handle = None;
        for node in copy.graph.nodes_mut() {
            node.id = self.allocate_action_id();
            node.target.handle = None;
        }
        self.steps.insert(index + 1, copy);
        Some(index + 1)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Parse from RON
    pub fn from_ron(s: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(s)
    }
}

impl Default for StepSequence {
    fn default() -> Self {
        Self::new("Untitled Procedure")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use praxis_graph::action::{ActionNode, ActionOp};
    use praxis_graph::edge::Edge;

    #[test]
    fn test_id_allocation_is_monotonic() {
        let mut sequence = StepSequence::new("Test");
        assert_eq!(sequence.allocate_step_id(), "step-1");
        assert_eq!(sequence.allocate_step_id(), "step-2");
        assert_eq!(sequence.allocate_action_id(), "action-1");
        assert_eq!(sequence.allocate_action_id(), "action-2");
    }

    #[test]
    fn test_new_step_defaults() {
        let step = StepNode::new("step-1", "Open the valve");
        assert!(step.enabled);
        assert!(!step.has_strategy());
        assert_eq!(step.trigger, TriggerKind::MouseClick);
    }

    #[test]
    fn test_duplicate_step_reallocates_ids() {
        let mut sequence = StepSequence::new("Test");
        let step_id = sequence.allocate_step_id();
        let action_id = sequence.allocate_action_id();

        let mut step = StepNode::new(step_id, "Tighten").with_target("bolt-1", "/rig/bolt-1");
        let a = step
            .graph
            .add_node(ActionNode::new(action_id, ActionOp::Activate { active: true }));
        step.graph.add_edge(Edge::entry(a)).unwrap();
        sequence.add_step(step);

        let copy_index = sequence.duplicate_step(0).unwrap();
        assert_eq!(copy_index, 1);

        let copy = sequence.step(copy_index).unwrap();
        assert_eq!(copy.id, "step-2");
        assert_eq!(copy.name, "Tighten Copy");
        assert_eq!(copy.graph.node(0).unwrap().id, "action-2");
        // Payload and wiring are preserved.
        assert_eq!(copy.graph.node(0).unwrap().op, ActionOp::Activate { active: true });
        assert_eq!(copy.graph.edge_count(), 1);
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut sequence = StepSequence::new("Pump teardown");
        let id = sequence.allocate_step_id();
        sequence.add_step(
            StepNode::new(id, "Drain")
                .with_target("drain-valve", "/pump/drain-valve")
                .with_trigger(TriggerKind::StateChange)
                .with_elapse(1.5),
        );

        let ron_str = sequence.to_ron().unwrap();
        let loaded = StepSequence::from_ron(&ron_str).unwrap();
        assert_eq!(loaded, sequence);
        assert_eq!(loaded.version, SEQUENCE_FORMAT_VERSION);
    }
}
