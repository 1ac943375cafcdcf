// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-step runtime strategies.
//!
//! A strategy is an optional, short-lived object bound to one step:
//! created when the step becomes current (or transiently during skip
//! and restore), discarded when the step is left. It covers behavior
//! the generic action graph cannot express - multi-entity puzzles,
//! custom completion criteria, bespoke undo logic.

use crate::param::ParameterSet;
use crate::scene::{MutationService, ViewpointService};
use indexmap::IndexMap;
use praxis_graph::action::EntityId;
use std::fmt;

/// Mode a strategy instance is bound in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyMode {
    /// Bound to the current step during forward execution
    Execute,
    /// Bound transiently while the step is replayed in a skip
    Skip,
    /// Bound transiently while rewinding past the step
    Restore,
}

/// Additional targets a strategy accepts confirm hits on.
///
/// Hits on these entities are neither an advance nor a wrong-target
/// anomaly.
#[derive(Debug, Default)]
pub struct AuxiliarySet {
    targets: Vec<EntityId>,
}

impl AuxiliarySet {
    /// Register an acceptable target
    pub fn add(&mut self, entity: EntityId) {
        if !self.targets.contains(&entity) {
            self.targets.push(entity);
        }
    }

    /// Deregister a target
    pub fn remove(&mut self, entity: EntityId) -> bool {
        let before = self.targets.len();
        self.targets.retain(|t| *t != entity);
        self.targets.len() != before
    }

    /// Whether an entity is registered
    pub fn contains(&self, entity: EntityId) -> bool {
        self.targets.contains(&entity)
    }

    /// Registered targets in insertion order
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.targets.iter().copied()
    }

    /// Number of registered targets
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Remove every registered target
    pub fn clear(&mut self) {
        self.targets.clear();
    }
}

/// Context handed to every strategy hook.
pub struct StrategyContext<'a> {
    /// Resolved step target, when resolution succeeded
    pub target: Option<EntityId>,
    /// Binding mode of this instance
    pub mode: StrategyMode,
    /// The step's named parameters
    pub params: &'a ParameterSet,
    /// Auxiliary acceptable targets, consulted by wrong-target
    /// detection
    pub auxiliary: &'a mut AuxiliarySet,
    /// Animation/mutation capability on the live scene
    pub mutator: &'a mut dyn MutationService,
    /// Viewpoint requests
    pub viewpoint: &'a mut dyn ViewpointService,
}

/// Optional per-step runtime behavior beyond the generic action graph.
///
/// Lifecycle: `on_init` once when the step becomes current, `on_update`
/// every tick while awaiting the trigger, `on_termination` exactly once
/// when the instance is discarded. `on_skip`/`on_skip_immediate`/
/// `on_restore` fire only on instances bound in the corresponding mode.
pub trait StepStrategy {
    /// Called once when the step becomes current
    fn on_init(&mut self, _ctx: &mut StrategyContext) {}

    /// Called every tick while the step is current and not yet
    /// executing
    fn on_update(&mut self, _ctx: &mut StrategyContext, _dt: f32) {}

    /// Re-highlight / re-frame the step's target on demand
    fn on_guide(&mut self, _ctx: &mut StrategyContext) {}

    /// Called while the step is replayed in accelerated skip
    fn on_skip(&mut self, _ctx: &mut StrategyContext) {}

    /// Called while the step is replayed instantaneously
    fn on_skip_immediate(&mut self, _ctx: &mut StrategyContext) {}

    /// Called while rewinding past this step; restoring the entity
    /// state the step mutated is entirely this hook's responsibility
    fn on_restore(&mut self, _ctx: &mut StrategyContext) {}

    /// Always called exactly once when the instance is discarded
    fn on_termination(&mut self, _ctx: &mut StrategyContext) {}

    /// Seconds the strategy's own skip animation needs before the
    /// sequencer may proceed past the step
    fn skip_life_time(&self) -> f32 {
        0.0
    }

    /// Whether the sequencer may skip this step at all
    fn allow_skip(&self) -> bool {
        true
    }

    /// Whether `on_update` should run
    fn enable_update(&self) -> bool {
        true
    }
}

/// Factory producing fresh strategy instances.
pub type StrategyFactory = Box<dyn Fn() -> Box<dyn StepStrategy>>;

/// Registry of strategy types by name.
///
/// Steps reference strategies by string name; the registry resolves
/// those names at run time. Unknown names are reported by the caller
/// and the step proceeds without a strategy.
#[derive(Default)]
pub struct StrategyRegistry {
    factories: IndexMap<String, StrategyFactory>,
}

impl StrategyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: IndexMap::new(),
        }
    }

    /// Register a strategy type under a name
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn() -> Box<dyn StepStrategy> + 'static,
    ) {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Whether a type is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Create an instance of the named type
    pub fn create(&self, name: &str) -> Option<Box<dyn StepStrategy>> {
        self.factories.get(name).map(|f| f())
    }

    /// Registered type names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("types", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
