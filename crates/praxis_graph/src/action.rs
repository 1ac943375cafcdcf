// SPDX-License-Identifier: MIT OR Apache-2.0
//! Action definitions for procedure step graphs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 3D vector payload (`[x, y, z]`).
pub type Vec3 = [f32; 3];

/// RGBA color payload, components in `0.0..=1.0`.
pub type Rgba = [f32; 4];

/// Runtime handle to a live scene entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Create a new random entity ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// State of a procedure target marker.
///
/// `Done` is the signal consumed by state-change triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TagState {
    /// The target has not been operated yet
    #[default]
    Normal,
    /// The target has been operated
    Done,
}

/// Operation kind of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Move the target to a position
    Move,
    /// Rotate the target to an orientation
    Rotate,
    /// Scale the target
    Scale,
    /// Change the target's color
    Recolor,
    /// Activate or deactivate the target
    Activate,
    /// Invoke a named handler on the target
    InvokeHandler,
    /// Re-frame the camera toward the target
    CameraReframe,
    /// Set display text on the target
    SetText,
    /// Show a prompt message to the operator
    ShowPrompt,
    /// Switch the target's tag state
    SwitchState,
    /// Wait without touching the scene
    Delay,
    /// Enable or disable a named capability on the target
    ToggleCapability,
}

impl ActionKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Move => "Move",
            Self::Rotate => "Rotate",
            Self::Scale => "Scale",
            Self::Recolor => "Recolor",
            Self::Activate => "Activate",
            Self::InvokeHandler => "Invoke Handler",
            Self::CameraReframe => "Camera Reframe",
            Self::SetText => "Set Text",
            Self::ShowPrompt => "Show Prompt",
            Self::SwitchState => "Switch State",
            Self::Delay => "Delay",
            Self::ToggleCapability => "Toggle Capability",
        }
    }
}

/// An action's operation together with its kind-specific payload.
///
/// The operation of a node never changes after creation; duplicating a
/// step deep-copies the payload under a fresh node ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionOp {
    /// Tween the target to a world position
    Move {
        /// Destination position
        to: Vec3,
    },
    /// Tween the target to an orientation (euler degrees)
    Rotate {
        /// Destination orientation
        to: Vec3,
    },
    /// Tween the target to a scale
    Scale {
        /// Destination scale
        to: Vec3,
    },
    /// Tween the target's color
    Recolor {
        /// Destination color
        color: Rgba,
    },
    /// Activate or deactivate the target
    Activate {
        /// Desired active state
        active: bool,
    },
    /// Invoke a named handler on the target
    InvokeHandler {
        /// Handler name
        handler: String,
    },
    /// Re-frame the camera toward the target
    CameraReframe {
        /// Look angle, euler degrees
        angle: Vec3,
        /// Offset from the look target
        offset: Vec3,
    },
    /// Set display text on the target
    SetText {
        /// New text
        text: String,
    },
    /// Show a prompt message to the operator
    ShowPrompt {
        /// Prompt text
        message: String,
    },
    /// Switch the target's tag state
    SwitchState {
        /// New tag state
        state: TagState,
    },
    /// Wait out the elapse time without touching the scene
    Delay,
    /// Enable or disable a named capability on the target
    ToggleCapability {
        /// Capability name
        capability: String,
        /// Desired enabled state
        enabled: bool,
    },
}

impl ActionOp {
    /// The payload-free kind tag of this operation
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Move { .. } => ActionKind::Move,
            Self::Rotate { .. } => ActionKind::Rotate,
            Self::Scale { .. } => ActionKind::Scale,
            Self::Recolor { .. } => ActionKind::Recolor,
            Self::Activate { .. } => ActionKind::Activate,
            Self::InvokeHandler { .. } => ActionKind::InvokeHandler,
            Self::CameraReframe { .. } => ActionKind::CameraReframe,
            Self::SetText { .. } => ActionKind::SetText,
            Self::ShowPrompt { .. } => ActionKind::ShowPrompt,
            Self::SwitchState { .. } => ActionKind::SwitchState,
            Self::Delay => ActionKind::Delay,
            Self::ToggleCapability { .. } => ActionKind::ToggleCapability,
        }
    }
}

/// Reference to a scene entity by stable ID, with the cached runtime
/// resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetRef {
    /// Stable entity ID
    pub id: String,
    /// Cached resolution, filled when the owning sequence is resolved
    #[serde(skip)]
    pub handle: Option<EntityId>,
}

impl TargetRef {
    /// Reference an entity by its stable ID
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            handle: None,
        }
    }
}

/// One atomic, timed operation inside a step's action graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionNode {
    /// Stable ID, allocated by the owning sequence's counters
    pub id: String,
    /// Display name
    pub name: String,
    /// Editor canvas anchor, ignored at runtime
    pub anchor: [f32; 2],
    /// Entity the operation applies to
    pub target: TargetRef,
    /// Seconds before successors activate (also the tween duration)
    pub elapse_time: f32,
    /// Continue to successors in the same tick, ignoring `elapse_time`
    pub instant: bool,
    /// Operation and payload
    pub op: ActionOp,
}

impl ActionNode {
    /// Create a new action with a stable ID
    pub fn new(id: impl Into<String>, op: ActionOp) -> Self {
        let name = op.kind().name().to_string();
        Self {
            id: id.into(),
            name,
            anchor: [0.0, 0.0],
            target: TargetRef::default(),
            elapse_time: 0.0,
            instant: false,
            op,
        }
    }

    /// Set the target entity ID
    pub fn with_target(mut self, id: impl Into<String>) -> Self {
        self.target = TargetRef::new(id);
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

    /// Set the editor canvas anchor
    pub fn with_anchor(mut self, x: f32, y: f32) -> Self {
        self.anchor = [x, y];
        self
    }

    /// Delay before successors activate; zero when instant
    pub fn effective_elapse(&self) -> f32 {
        if self.instant {
            0.0
        } else {
            self.elapse_time
        }
    }

    /// The payload-free kind tag of this action
    pub fn kind(&self) -> ActionKind {
        self.op.kind()
    }

    /// Deep value copy under a fresh ID (step duplication)
    pub fn duplicate(&self, new_id: impl Into<String>) -> Self {
        let mut copy = self.clone();
        copy.id = new_id.into();
        copy.target.handle = None;
        copy
    }
}
