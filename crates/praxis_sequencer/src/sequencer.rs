// SPDX-License-Identifier: MIT OR Apache-2.0
//! The orchestrating sequencer state machine.
//!
//! The sequencer owns one resolved run of a [`StepSequence`]: it walks
//! the steps forward, gates each on its trigger, launches the step's
//! action graph, and handles accelerated skip and backward restore.
//! Everything is driven from [`Sequencer::tick`] on the host's update
//! loop - all waiting is a scheduled resumption, nothing blocks.

use crate::effects::SceneApplier;
use crate::event::SequencerEvent;
use crate::scene::{
    MutationService, PointerHit, PointerService, SceneService, ViewRequest, ViewpointService,
};
use crate::step::{StepNode, StepSequence, TriggerKind, ViewHint};
use crate::strategy::{
    AuxiliarySet, StepStrategy, StrategyContext, StrategyMode, StrategyRegistry,
};
use praxis_graph::action::{EntityId, TagState};
use praxis_graph::run::GraphRun;
use praxis_graph::schedule::Scheduler;

/// Configuration handed to the sequencer at construction.
#[derive(Debug, Clone)]
pub struct SequencerConfig {
    /// Acceleration factor applied to delays during accelerated skip
    pub skip_multiple: f32,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self { skip_multiple: 4.0 }
    }
}

/// Boundary services the sequencer drives.
pub struct SequencerServices {
    /// Stable-ID resolution and tag state
    pub scene: Box<dyn SceneService>,
    /// Confirm-input hit tests
    pub pointer: Box<dyn PointerService>,
    /// Camera/viewpoint requests
    pub viewpoint: Box<dyn ViewpointService>,
    /// Animation/mutation capability
    pub mutator: Box<dyn MutationService>,
}

/// A step bound to its resolved target for one run.
#[derive(Debug, Clone)]
struct RunStep {
    step: StepNode,
    target: Option<EntityId>,
}

/// An in-flight action graph replay, keyed by its run-list index.
struct RunEntry {
    step: usize,
    run: GraphRun,
}

/// Deferred work parked on the step scheduler.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Deferred {
    /// Begin this run-list index
    BeginStep(usize),
    /// Continue the in-progress skip replay
    SkipNext,
}

/// Progress of a ranged skip.
#[derive(Debug, Clone, Copy)]
struct SkipState {
    cursor: usize,
    from: usize,
    target: usize,
}

/// A live strategy instance together with its binding.
struct ActiveStrategy {
    strategy: Box<dyn StepStrategy>,
    mode: StrategyMode,
    target: Option<EntityId>,
    params: crate::param::ParameterSet,
    auxiliary: AuxiliarySet,
}

/// Strategy hook selector for [`run_hook`].
enum Hook {
    Init,
    Update(f32),
    Guide,
    Skip,
    SkipImmediate,
    Restore,
    Termination,
}

fn run_hook(active: &mut ActiveStrategy, services: &mut SequencerServices, hook: Hook) {
    let mut ctx = StrategyContext {
        target: active.target,
        mode: active.mode,
        params: &active.params,
        auxiliary: &mut active.auxiliary,
        mutator: &mut *services.mutator,
        viewpoint: &mut *services.viewpoint,
    };
    match hook {
        Hook::Init => active.strategy.on_init(&mut ctx),
        Hook::Update(dt) => active.strategy.on_update(&mut ctx, dt),
        Hook::Guide => active.strategy.on_guide(&mut ctx),
        Hook::Skip => active.strategy.on_skip(&mut ctx),
        Hook::SkipImmediate => active.strategy.on_skip_immediate(&mut ctx),
        Hook::Restore => active.strategy.on_restore(&mut ctx),
        Hook::Termination => active.strategy.on_termination(&mut ctx),
    }
}

fn view_request(target: Option<EntityId>, view: &ViewHint) -> ViewRequest {
    ViewRequest {
        target,
        angle: view.best_angle,
        offset: view.view_offset,
        position: Some(view.best_position),
        control_mode: Some(view.control_mode),
    }
}

/// Drives a resolved step sequence against the live scene.
pub struct Sequencer {
    config: SequencerConfig,
    services: SequencerServices,
    strategies: StrategyRegistry,

    steps: Vec<RunStep>,
    current: Option<usize>,
    ongoing: bool,
    running: bool,
    skip: Option<SkipState>,
    active: Option<ActiveStrategy>,

    button_armed: bool,
    button_fired: bool,
    pending_hit: Option<PointerHit>,

    graph_runs: Vec<RunEntry>,
    timers: Scheduler<Deferred>,
    events: Vec<SequencerEvent>,
}

impl Sequencer {
    /// Create a sequencer over the given boundary services
    pub fn new(config: SequencerConfig, services: SequencerServices) -> Self {
        Self {
            config,
            services,
            strategies: StrategyRegistry::new(),
            steps: Vec::new(),
            current: None,
            ongoing: false,
            running: false,
            skip: None,
            active: None,
            button_armed: false,
            button_fired: false,
            pending_hit: None,
            graph_runs: Vec::new(),
            timers: Scheduler::new(),
            events: Vec::new(),
        }
    }

    /// The construction-time configuration
    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// The strategy registry
    pub fn strategies(&self) -> &StrategyRegistry {
        &self.strategies
    }

    /// Mutable access to the strategy registry
    pub fn strategies_mut(&mut self) -> &mut StrategyRegistry {
        &mut self.strategies
    }

    /// Whether a sequence run is active
    pub fn is_ongoing(&self) -> bool {
        self.ongoing
    }

    /// Whether a forward execution, skip, or restore is in flight
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Run-list index of the current step
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The current step, if a run is active
    pub fn current_step(&self) -> Option<&StepNode> {
        self.current.and_then(|i| self.steps.get(i)).map(|rs| &rs.step)
    }

    /// Number of steps in the resolved run list
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Drain the events raised since the last call
    pub fn take_events(&mut self) -> Vec<SequencerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Resolve a sequence against the scene and begin its first step.
    ///
    /// Disabled steps are excluded from the run list here, not skipped
    /// at run time. A step whose target does not resolve is kept with a
    /// null target and logged; later operations on it degrade to no-ops
    /// rather than failing the run.
    ///
    /// Returns `false` when a run is already ongoing.
    pub fn begin_sequence(&mut self, sequence: &StepSequence) -> bool {
        if self.ongoing {
            tracing::warn!("begin_sequence rejected: a run is already ongoing");
            return false;
        }
        self.reset_run_state();

        for step in sequence.steps().iter().filter(|s| s.enabled) {
            let mut step = step.clone();
            let target = self.services.scene.resolve(&step.target.id);
            if target.is_none() {
                tracing::error!(
                    step = %step.id,
                    target = %step.target.id,
                    "Step target did not resolve; step keeps a null target"
                );
            }
            step.target.handle = target;
            for node in step.graph.nodes_mut() {
                node.target.handle = self.services.scene.resolve(&node.target.id);
            }
            self.steps.push(RunStep { step, target });
        }

        self.ongoing = true;
        self.events.push(SequencerEvent::SequenceBegan);
        tracing::info!(steps = self.steps.len(), "Sequence began");
        self.begin_step(0);
        true
    }

    /// Abort the run in place.
    ///
    /// Discards the active strategy and every pending continuation.
    /// Does not raise [`SequencerEvent::SequenceEnded`] - that event
    /// means the run walked past its last step.
    pub fn stop(&mut self) -> bool {
        if !self.ongoing {
            return false;
        }
        if let Some(mut active) = self.active.take() {
            run_hook(&mut active, &mut self.services, Hook::Termination);
        }
        self.reset_run_state();
        tracing::info!("Sequence stopped");
        true
    }

    /// Advance the sequencer by `dt` seconds of host time.
    ///
    /// Polls the pointer service, drives in-flight graph replays and
    /// scheduled continuations, runs the strategy update, and evaluates
    /// the current step's trigger. Trigger evaluation always precedes
    /// the advance it causes.
    pub fn tick(&mut self, dt: f32) {
        self.pending_hit = self.services.pointer.poll_confirm();

        self.tick_graph_runs(dt);

        for deferred in self.timers.tick(dt) {
            match deferred {
                Deferred::BeginStep(index) => self.begin_step(index),
                Deferred::SkipNext => self.continue_skip(),
            }
        }

        if self.ongoing && !self.running {
            self.update_strategy(dt);
            self.evaluate_trigger();
        }

        // Inputs are one tick wide.
        self.button_fired = false;
        self.pending_hit = None;
    }

    /// Report that the step's bound UI button was clicked.
    ///
    /// Consumed by the next trigger evaluation; ignored unless the
    /// current step armed a button subscription.
    pub fn notify_button_clicked(&mut self) {
        if self.button_armed {
            self.button_fired = true;
        }
    }

    /// Mark the current step's target tag as done, satisfying a
    /// state-change trigger on the next evaluation
    pub fn complete_current_step(&mut self) -> bool {
        if !self.ongoing {
            return false;
        }
        let Some(index) = self.current else {
            return false;
        };
        let Some(target) = self.steps[index].target else {
            tracing::warn!(index, "complete_current_step: step has no resolved target");
            return false;
        };
        self.services.scene.set_tag_state(target, TagState::Done);
        true
    }

    /// Re-frame the viewpoint toward the current step's target and let
    /// the strategy re-highlight it
    pub fn guide_current_step(&mut self) -> bool {
        if !self.ongoing {
            return false;
        }
        let Some(index) = self.current else {
            return false;
        };
        let (target, view) = {
            let rs = &self.steps[index];
            (rs.target, rs.step.view.clone())
        };
        self.services.viewpoint.reframe(view_request(target, &view));
        if let Some(active) = self.active.as_mut() {
            run_hook(active, &mut self.services, Hook::Guide);
        }
        true
    }

    /// Skip just the current step
    pub fn skip_current_step(&mut self) -> bool {
        match self.current {
            Some(index) => self.skip_step(index + 1),
            None => false,
        }
    }

    /// Replay steps `[current, target)` in accelerated skip, then
    /// begin `target` normally.
    ///
    /// Each replayed step is gated by the larger of its strategy's
    /// skip life time and its own elapse time, divided by the
    /// configured skip multiple. Legal only while awaiting a trigger
    /// (`ongoing && !running`) and when the current strategy allows
    /// skipping; returns `false` otherwise.
    pub fn skip_step(&mut self, target: usize) -> bool {
        if !self.ongoing || self.running {
            tracing::warn!("skip_step rejected: not awaiting a trigger");
            return false;
        }
        let Some(current) = self.current else {
            return false;
        };
        if target <= current || target > self.steps.len() {
            tracing::warn!(current, target, "skip_step rejected: target out of range");
            return false;
        }
        if let Some(active) = &self.active {
            if !active.strategy.allow_skip() {
                tracing::warn!(current, "skip_step rejected: strategy disallows skipping");
                return false;
            }
        }

        self.supersede_continuations();
        self.running = true;
        self.skip = Some(SkipState {
            cursor: current,
            from: current,
            target,
        });
        self.skip_one();
        true
    }

    /// Replay steps `[current, target)` instantaneously - flattened
    /// timelines, no pacing - then begin `target` normally.
    ///
    /// Same legality rules as [`Sequencer::skip_step`].
    pub fn skip_step_immediate(&mut self, target: usize) -> bool {
        if !self.ongoing || self.running {
            tracing::warn!("skip_step_immediate rejected: not awaiting a trigger");
            return false;
        }
        let Some(current) = self.current else {
            return false;
        };
        if target <= current || target > self.steps.len() {
            tracing::warn!(current, target, "skip_step_immediate rejected: target out of range");
            return false;
        }
        if let Some(active) = &self.active {
            if !active.strategy.allow_skip() {
                tracing::warn!(current, "skip_step_immediate rejected: strategy disallows skipping");
                return false;
            }
        }

        self.supersede_continuations();
        for index in current..target {
            let mut strategy = self.detach_strategy_for(index, StrategyMode::Skip);
            if let Some(active) = strategy.as_mut() {
                run_hook(active, &mut self.services, Hook::SkipImmediate);
            }
            {
                let steps = &self.steps;
                let services = &mut self.services;
                let events = &mut self.events;
                let mut applier = SceneApplier {
                    scene: &mut *services.scene,
                    mutator: &mut *services.mutator,
                    viewpoint: &mut *services.viewpoint,
                    events,
                };
                GraphRun::skip_immediate(&steps[index].step.graph, &mut applier);
            }
            if let Some(mut active) = strategy {
                run_hook(&mut active, &mut self.services, Hook::Termination);
            }
            let step_id = self.steps[index].step.id.clone();
            self.events.push(SequencerEvent::StepSkipped { index, step_id });
            tracing::debug!(index, "Step fast-forwarded");
        }
        if target > current + 1 {
            self.events.push(SequencerEvent::SkipRangeDone {
                from: current,
                to: target,
            });
        }
        self.begin_step(target);
        true
    }

    /// Rewind to `target`: walk backward from the current step, let
    /// each visited step's strategy restore its effects, then begin
    /// `target` normally.
    ///
    /// Restore never touches the forward action graph - a step without
    /// a strategy has nothing to restore its effects with. Legal only
    /// while awaiting a trigger and for `target < current`; returns
    /// `false` otherwise without changing any state.
    pub fn restore_step(&mut self, target: usize) -> bool {
        if !self.ongoing || self.running {
            tracing::warn!("restore_step rejected: not awaiting a trigger");
            return false;
        }
        let Some(current) = self.current else {
            return false;
        };
        if target >= current {
            tracing::warn!(current, target, "restore_step rejected: target must precede the current step");
            return false;
        }

        self.supersede_continuations();
        self.running = true;
        for index in (target..=current).rev() {
            let mut strategy = self.detach_strategy_for(index, StrategyMode::Restore);
            match strategy.as_mut() {
                Some(active) => run_hook(active, &mut self.services, Hook::Restore),
                None => tracing::debug!(index, "Step has no strategy; nothing restores its effects"),
            }
            if let Some(mut active) = strategy {
                run_hook(&mut active, &mut self.services, Hook::Termination);
            }
            let step_id = self.steps[index].step.id.clone();
            self.events.push(SequencerEvent::StepRestored { index, step_id });
            tracing::debug!(index, "Step restored");
        }
        self.running = false;
        self.begin_step(target);
        true
    }

    fn reset_run_state(&mut self) {
        self.steps.clear();
        self.current = None;
        self.ongoing = false;
        self.running = false;
        self.skip = None;
        self.active = None;
        self.button_armed = false;
        self.button_fired = false;
        self.pending_hit = None;
        self.graph_runs.clear();
        self.timers.clear();
    }

    /// Entering a skip or restore supersedes every in-flight
    /// continuation of the previous mode.
    fn supersede_continuations(&mut self) {
        self.timers.clear();
        self.graph_runs.clear();
    }

    fn tick_graph_runs(&mut self, dt: f32) {
        let steps = &self.steps;
        let services = &mut self.services;
        let events = &mut self.events;
        self.graph_runs.retain_mut(|entry| {
            let Some(run_step) = steps.get(entry.step) else {
                return false;
            };
            let mut applier = SceneApplier {
                scene: &mut *services.scene,
                mutator: &mut *services.mutator,
                viewpoint: &mut *services.viewpoint,
                events: &mut *events,
            };
            entry.run.tick(dt, &run_step.step.graph, &mut applier);
            !entry.run.is_finished()
        });
    }

    fn update_strategy(&mut self, dt: f32) {
        if let Some(active) = self.active.as_mut() {
            if active.strategy.enable_update() {
                run_hook(active, &mut self.services, Hook::Update(dt));
            }
        }
    }

    fn begin_step(&mut self, index: usize) {
        if index >= self.steps.len() {
            self.end_sequence();
            return;
        }

        self.current = Some(index);
        self.running = false;
        self.button_armed = false;
        self.button_fired = false;

        let run_step = &self.steps[index];
        let step = &run_step.step;
        let target = run_step.target;

        match step.trigger {
            TriggerKind::ButtonClick => self.button_armed = true,
            TriggerKind::StateChange => {
                if let Some(entity) = target {
                    self.services.scene.set_tag_state(entity, TagState::Normal);
                }
            }
            TriggerKind::MouseClick | TriggerKind::AutoExecute => {}
        }

        if step.has_strategy() {
            match self.strategies.create(&step.strategy) {
                Some(strategy) => {
                    let mut active = ActiveStrategy {
                        strategy,
                        mode: StrategyMode::Execute,
                        target,
                        params: step.parameters.clone(),
                        auxiliary: AuxiliarySet::default(),
                    };
                    run_hook(&mut active, &mut self.services, Hook::Init);
                    self.active = Some(active);
                }
                None => tracing::error!(
                    step = %step.id,
                    strategy = %step.strategy,
                    "Unknown step strategy; step proceeds without one"
                ),
            }
        }

        self.services.viewpoint.reframe(view_request(target, &step.view));
        self.events.push(SequencerEvent::StepBegun {
            index,
            step_id: step.id.clone(),
        });
        tracing::debug!(index, step = %step.id, trigger = ?step.trigger, "Step began");
    }

    fn end_sequence(&mut self) {
        if let Some(mut active) = self.active.take() {
            run_hook(&mut active, &mut self.services, Hook::Termination);
        }
        self.current = None;
        self.ongoing = false;
        self.running = false;
        self.skip = None;
        self.events.push(SequencerEvent::SequenceEnded);
        tracing::info!("Sequence ended");
    }

    fn evaluate_trigger(&mut self) {
        loop {
            if !self.ongoing || self.running {
                break;
            }
            let Some(index) = self.current else {
                break;
            };
            let (trigger, target) = {
                let rs = &self.steps[index];
                (rs.step.trigger, rs.target)
            };

            if trigger != TriggerKind::AutoExecute {
                self.detect_wrong_target(index, target);
            }

            let advance = match trigger {
                TriggerKind::AutoExecute => true,
                TriggerKind::MouseClick => self.hit_matches(target),
                TriggerKind::ButtonClick => self.button_fired,
                TriggerKind::StateChange => {
                    target.and_then(|t| self.services.scene.tag_state(t)) == Some(TagState::Done)
                }
            };
            if !advance {
                break;
            }

            // One input advances at most one step.
            self.pending_hit = None;
            self.button_fired = false;
            self.execute_current_step();
        }
    }

    fn hit_matches(&self, target: Option<EntityId>) -> bool {
        match (self.pending_hit, target) {
            (Some(hit), Some(entity)) => hit.target == Some(entity),
            _ => false,
        }
    }

    fn detect_wrong_target(&mut self, index: usize, target: Option<EntityId>) {
        let Some(hit) = self.pending_hit else {
            return;
        };
        let Some(hit_entity) = hit.target else {
            return;
        };
        if Some(hit_entity) == target {
            return;
        }
        if self
            .active
            .as_ref()
            .is_some_and(|a| a.auxiliary.contains(hit_entity))
        {
            return;
        }
        // Only hits on some other step's flagged target count as wrong.
        if self.steps.iter().any(|rs| rs.target == Some(hit_entity)) {
            self.events.push(SequencerEvent::WrongTargetClicked {
                index,
                target: hit_entity,
            });
            tracing::debug!(index, "Wrong target clicked");
        }
    }

    /// Commit the current step: launch its graph live, discard the
    /// strategy, raise the event, and line up the next step.
    fn execute_current_step(&mut self) {
        let Some(index) = self.current else {
            return;
        };
        self.running = true;

        {
            let steps = &self.steps;
            let services = &mut self.services;
            let events = &mut self.events;
            let mut applier = SceneApplier {
                scene: &mut *services.scene,
                mutator: &mut *services.mutator,
                viewpoint: &mut *services.viewpoint,
                events,
            };
            let run = GraphRun::execute(&steps[index].step.graph, &mut applier);
            if !run.is_finished() {
                self.graph_runs.push(RunEntry { step: index, run });
            }
        }

        self.button_armed = false;
        self.button_fired = false;
        if let Some(mut active) = self.active.take() {
            run_hook(&mut active, &mut self.services, Hook::Termination);
        }

        let (step_id, instant, elapse) = {
            let step = &self.steps[index].step;
            (step.id.clone(), step.instant, step.elapse_time)
        };
        self.events.push(SequencerEvent::StepExecuted { index, step_id });
        tracing::debug!(index, "Step executed");

        if instant {
            self.begin_step(index + 1);
        } else {
            self.timers.schedule(elapse, Deferred::BeginStep(index + 1));
        }
    }

    fn skip_one(&mut self) {
        let Some(state) = self.skip else {
            return;
        };
        let index = state.cursor;

        let mut strategy = self.detach_strategy_for(index, StrategyMode::Skip);
        let mut gate = {
            let step = &self.steps[index].step;
            if step.instant {
                0.0
            } else {
                step.elapse_time
            }
        };
        if let Some(active) = strategy.as_mut() {
            gate = gate.max(active.strategy.skip_life_time());
            run_hook(active, &mut self.services, Hook::Skip);
        }

        {
            let steps = &self.steps;
            let services = &mut self.services;
            let events = &mut self.events;
            let mut applier = SceneApplier {
                scene: &mut *services.scene,
                mutator: &mut *services.mutator,
                viewpoint: &mut *services.viewpoint,
                events,
            };
            let run = GraphRun::skip(
                &steps[index].step.graph,
                self.config.skip_multiple,
                &mut applier,
            );
            if !run.is_finished() {
                self.graph_runs.push(RunEntry { step: index, run });
            }
        }

        if let Some(mut active) = strategy {
            run_hook(&mut active, &mut self.services, Hook::Termination);
        }

        let step_id = self.steps[index].step.id.clone();
        self.events.push(SequencerEvent::StepSkipped { index, step_id });
        tracing::debug!(index, "Step skipped");

        let multiple = self.config.skip_multiple.max(f32::EPSILON);
        self.timers.schedule(gate / multiple, Deferred::SkipNext);
    }

    fn continue_skip(&mut self) {
        let Some(mut state) = self.skip else {
            return;
        };
        state.cursor += 1;
        self.skip = Some(state);

        if state.cursor >= state.target {
            self.skip = None;
            self.running = false;
            if state.target > state.from + 1 {
                self.events.push(SequencerEvent::SkipRangeDone {
                    from: state.from,
                    to: state.target,
                });
            }
            self.begin_step(state.target);
        } else {
            self.skip_one();
        }
    }

    /// The strategy instance to run a skip/restore hook on for `index`:
    /// the active instance when that step is current (rebound to
    /// `mode`), otherwise a transient instance created in `mode`.
    fn detach_strategy_for(&mut self, index: usize, mode: StrategyMode) -> Option<ActiveStrategy> {
        if self.current == Some(index) {
            if let Some(mut active) = self.active.take() {
                active.mode = mode;
                return Some(active);
            }
        }
        let rs = &self.steps[index];
        let step = &rs.step;
        if !step.has_strategy() {
            return None;
        }
        let Some(strategy) = self.strategies.create(&step.strategy) else {
            tracing::error!(
                step = %step.id,
                strategy = %step.strategy,
                "Unknown step strategy; hook skipped"
            );
            return None;
        };
        Some(ActiveStrategy {
            strategy,
            mode,
            target: rs.target,
            params: step.parameters.clone(),
            auxiliary: AuxiliarySet::default(),
        })
    }
}
