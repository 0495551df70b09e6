// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with estimating sparsity.

use thiserror::Error;

use crate::{source::SourceError, Id, SparsityError};

#[derive(Error, Debug)]
pub enum EstimatorError {
    #[error("To compute sparsity with the '{method}' method you need a dense {kind}, but it already has a sparsity")]
    DenseSourceRequired {
        method: &'static str,
        kind: &'static str,
    },

    #[error("To compute sparsity with the '{method}' method from a {kind} you need noise levels; supply them or compute them first")]
    NoiseLevelsRequired {
        method: &'static str,
        kind: &'static str,
    },

    #[error("Expected {expected} noise levels (one per channel), but got {got}")]
    NoiseLevelCount { expected: usize, got: usize },

    #[error("Unit property value {value} (property '{property}') cannot be found in the recording properties")]
    PropertyValueWithoutChannels { property: String, value: Id },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Sparsity(#[from] SparsityError),
}
