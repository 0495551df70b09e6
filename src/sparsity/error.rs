// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with channel sparsity.

use thiserror::Error;

use crate::Id;

#[derive(Error, Debug)]
pub enum SparsityError {
    #[error("The sparsity mask has shape {mask:?}, but there are {num_units} unit ids and {num_channels} channel ids")]
    MaskShape {
        mask: (usize, usize),
        num_units: usize,
        num_channels: usize,
    },

    #[error("The {kind} ids contain a duplicate: {id}")]
    DuplicateId { kind: &'static str, id: Id },

    #[error("Unit id {0} is not part of this sparsity")]
    UnknownUnitId(Id),

    #[error("Channel id {0} is not part of this sparsity")]
    UnknownChannelId(Id),

    #[error("Unit id {0} has no entry in the unit-id-to-channel-ids dictionary")]
    MissingDictEntry(Id),

    #[error("Waveforms must have at least one dimension (the channel axis)")]
    NoChannelAxis,

    #[error("Expected templates with {expected} units, but got {got}")]
    TemplateUnitCount { expected: usize, got: usize },

    #[error("Waveforms for unit {unit_id} have {got} channels, but the unit has {num_active} active channels")]
    TooFewChannels {
        unit_id: Id,
        num_active: usize,
        got: usize,
    },

    #[error("Waveforms for unit {unit_id} are not sparse, but also not dense: expected {num_channels} channels, got {got}")]
    NotDense {
        unit_id: Id,
        num_channels: usize,
        got: usize,
    },

    #[error("Waveforms do not seem to be in the sparsity shape for unit {unit_id}. The number of active channels is {num_active}, but the waveform has non-zero values outside of those active channels:\n{excess}")]
    NotSparse {
        unit_id: Id,
        num_active: usize,
        excess: String,
    },
}
