// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with estimating sparsity from a recording.

use thiserror::Error;

use crate::{
    recording::RecordingError, source::SourceError, ComputeSparsityError, SparsityMethod,
};

#[derive(Error, Debug)]
pub enum EstimateSparsityError {
    #[error("Sparsity can only be estimated from a recording with the 'radius' or 'best_channels' methods, not '{0}'")]
    UnsupportedMethod(SparsityMethod),

    #[error("The 'radius' method needs a recording with exactly one probe, but it has {0}")]
    ProbeCount(usize),

    #[error(transparent)]
    Recording(#[from] RecordingError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Compute(#[from] ComputeSparsityError),
}
