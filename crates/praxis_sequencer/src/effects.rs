// SPDX-License-Identifier: MIT OR Apache-2.0
//! Bridges action nodes to the boundary services.

use crate::event::SequencerEvent;
use crate::scene::{Mutation, MutationService, SceneService, ViewRequest, ViewpointService};
use praxis_graph::action::{ActionNode, ActionOp, EntityId};
use praxis_graph::run::{ActionApplier, ApplyMode, CapabilityError};

/// [`ActionApplier`] over the live boundary services.
///
/// Built fresh for each engine call; borrows the sequencer's services
/// and event queue for the duration of the walk.
pub(crate) struct SceneApplier<'a> {
    pub scene: &'a mut dyn SceneService,
    pub mutator: &'a mut dyn MutationService,
    pub viewpoint: &'a mut dyn ViewpointService,
    pub events: &'a mut Vec<SequencerEvent>,
}

impl SceneApplier<'_> {
    fn resolve_target(&self, node: &ActionNode) -> Option<EntityId> {
        node.target
            .handle
            .or_else(|| self.scene.resolve(&node.target.id))
    }
}

impl ActionApplier for SceneApplier<'_> {
    fn apply(&mut self, node: &ActionNode, mode: ApplyMode) -> Result<(), CapabilityError> {
        let mutation = match &node.op {
            ActionOp::Delay => return Ok(()),
            ActionOp::ShowPrompt { message } => {
                self.events.push(SequencerEvent::PromptShown {
                    message: message.clone(),
                });
                return Ok(());
            }
            ActionOp::CameraReframe { angle, offset } => {
                self.viewpoint.reframe(ViewRequest {
                    target: self.resolve_target(node),
                    angle: *angle,
                    offset: *offset,
                    position: None,
                    control_mode: None,
                });
                return Ok(());
            }
            ActionOp::SwitchState { state } => {
                let target = self
                    .resolve_target(node)
                    .ok_or(CapabilityError::UnresolvedTarget)?;
                self.scene.set_tag_state(target, *state);
                return Ok(());
            }
            ActionOp::Move { to } => Mutation::MoveTo(*to),
            ActionOp::Rotate { to } => Mutation::RotateTo(*to),
            ActionOp::Scale { to } => Mutation::ScaleTo(*to),
            ActionOp::Recolor { color } => Mutation::RecolorTo(*color),
            ActionOp::Activate { active } => Mutation::SetActive(*active),
            ActionOp::InvokeHandler { handler } => Mutation::Invoke(handler.clone()),
            ActionOp::SetText { text } => Mutation::SetText(text.clone()),
            ActionOp::ToggleCapability {
                capability,
                enabled,
            } => Mutation::ToggleCapability {
                capability: capability.clone(),
                enabled: *enabled,
            },
        };

        let target = self
            .resolve_target(node)
            .ok_or(CapabilityError::UnresolvedTarget)?;

        match mode {
            ApplyMode::Live if !node.instant => {
                self.mutator.animate(target, mutation, node.elapse_time)
            }
            ApplyMode::Skip { multiple } if !node.instant => {
                self.mutator
                    .animate(target, mutation, node.elapse_time / multiple)
            }
            // Instant nodes and immediate replay take the
            // non-animated variant.
            _ => self.mutator.apply(target, mutation),
        }
    }
}
