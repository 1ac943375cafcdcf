// SPDX-License-Identifier: MIT OR Apache-2.0
//! Procedure sequencer runtime for Praxis.
//!
//! This crate drives an operator through an ordered set of guided
//! steps, each one a timed action graph applied to entities in a live
//! scene:
//! - Step and sequence data model with RON persistence
//! - Four trigger semantics gating advancement
//! - Pluggable per-step strategies with typed named parameters
//! - Accelerated skip, instantaneous fast-forward, and backward
//!   restore
//!
//! ## Architecture
//!
//! The runtime is built on:
//! - The [`praxis_graph`] action graph engine
//! - Boundary service traits for scene, input, viewpoint, and
//!   mutation (the host supplies implementations)
//! - A single-threaded, tick-driven [`Sequencer`] state machine that
//!   raises lifecycle events drained by the host

pub mod event;
pub mod param;
pub mod scene;
pub mod sequencer;
pub mod step;
pub mod strategy;

mod effects;

pub use event::SequencerEvent;
pub use param::{ParamKind, ParamValue, ParameterSet, StepParameter};
pub use scene::{
    ControlMode, Mutation, MutationService, PointerHit, PointerService, SceneService, ViewRequest,
    ViewpointService,
};
pub use sequencer::{Sequencer, SequencerConfig, SequencerServices};
pub use step::{
    SequenceId, StepNode, StepSequence, StepTargetRef, TriggerKind, ViewHint, NO_STRATEGY,
    SEQUENCE_FORMAT_VERSION,
};
pub use strategy::{
    AuxiliarySet, StepStrategy, StrategyContext, StrategyFactory, StrategyMode, StrategyRegistry,
};

pub use praxis_graph::action::{EntityId, TagState};
