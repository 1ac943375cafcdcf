// SPDX-License-Identifier: MIT OR Apache-2.0
//! Boundary contracts to the host's scene, input, and camera systems.
//!
//! Everything the sequencer knows about the outside world goes through
//! these traits; the host supplies implementations at construction.

use praxis_graph::action::{EntityId, Rgba, TagState, Vec3};
use praxis_graph::run::CapabilityError;
use serde::{Deserialize, Serialize};

/// Camera control mode requested when a step begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ControlMode {
    /// Operator keeps free camera control
    #[default]
    Free,
    /// Orbit around the step target
    Orbit,
    /// Follow the step target
    Follow,
    /// Camera locked to the authored view
    Locked,
}

/// Fire-and-forget viewpoint request.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRequest {
    /// Desired look target
    pub target: Option<EntityId>,
    /// Look angle, euler degrees
    pub angle: Vec3,
    /// Offset from the look target
    pub offset: Vec3,
    /// Camera position to settle at, when the request carries one
    pub position: Option<Vec3>,
    /// Control mode to hand the camera controller, when requested
    pub control_mode: Option<ControlMode>,
}

/// Scene mutation request applied to one entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Move to a world position
    MoveTo(Vec3),
    /// Rotate to an orientation (euler degrees)
    RotateTo(Vec3),
    /// Scale to a size
    ScaleTo(Vec3),
    /// Change color
    RecolorTo(Rgba),
    /// Activate or deactivate
    SetActive(bool),
    /// Set display text
    SetText(String),
    /// Invoke a named handler
    Invoke(String),
    /// Enable or disable a named capability
    ToggleCapability {
        /// Capability name
        capability: String,
        /// Desired enabled state
        enabled: bool,
    },
}

/// Confirm-input hit test result for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerHit {
    /// Tagged target under the pointer, if any
    pub target: Option<EntityId>,
}

/// Resolves stable IDs to live tagged entities and owns their tag
/// state.
pub trait SceneService {
    /// Resolve a stable entity ID to a live handle
    fn resolve(&self, id: &str) -> Option<EntityId>;

    /// Current tag state, if the entity carries a tag
    fn tag_state(&self, entity: EntityId) -> Option<TagState>;

    /// Set the tag state on an entity
    fn set_tag_state(&mut self, entity: EntityId, state: TagState);
}

/// Reports confirm-input edges and what they hit.
pub trait PointerService {
    /// The confirm edge that fired this tick, if any
    fn poll_confirm(&mut self) -> Option<PointerHit>;
}

/// Accepts viewpoint requests; fire-and-forget.
pub trait ViewpointService {
    /// Reposition the viewpoint
    fn reframe(&mut self, request: ViewRequest);
}

/// Animation/mutation capability on scene entities.
pub trait MutationService {
    /// Tween toward the requested state over `duration` seconds
    fn animate(
        &mut self,
        target: EntityId,
        mutation: Mutation,
        duration: f32,
    ) -> Result<(), CapabilityError>;

    /// Apply the requested state instantaneously
    fn apply(&mut self, target: EntityId, mutation: Mutation) -> Result<(), CapabilityError>;
}
