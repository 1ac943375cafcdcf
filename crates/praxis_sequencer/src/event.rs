// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lifecycle events raised by the sequencer.

use praxis_graph::action::EntityId;

/// Event raised by the [`crate::sequencer::Sequencer`].
///
/// Events accumulate during a tick and are drained with
/// [`crate::sequencer::Sequencer::take_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum SequencerEvent {
    /// A sequence was resolved and its run started
    SequenceBegan,
    /// A step became current
    StepBegun {
        /// Run-list index
        index: usize,
        /// Authored step ID
        step_id: String,
    },
    /// A step's action graph was launched and the step committed
    StepExecuted {
        /// Run-list index
        index: usize,
        /// Authored step ID
        step_id: String,
    },
    /// A step was replayed in accelerated skip
    StepSkipped {
        /// Run-list index
        index: usize,
        /// Authored step ID
        step_id: String,
    },
    /// A ranged skip finished
    SkipRangeDone {
        /// First replayed run-list index
        from: usize,
        /// Index begun afterwards, one past the last replayed step
        to: usize,
    },
    /// A step's strategy restored its effects during a rewind
    StepRestored {
        /// Run-list index
        index: usize,
        /// Authored step ID
        step_id: String,
    },
    /// A show-prompt action applied
    PromptShown {
        /// Prompt text
        message: String,
    },
    /// Confirm input hit a flagged step target other than the current
    /// one
    WrongTargetClicked {
        /// Current run-list index
        index: usize,
        /// The entity that was hit
        target: EntityId,
    },
    /// The run walked past the last step
    SequenceEnded,
}
