// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with sources of templates and their capabilities.

use thiserror::Error;

use crate::SparsityError;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("The {kind} does not provide '{extension}'; compute it first")]
    MissingExtension {
        kind: &'static str,
        extension: &'static str,
    },

    #[error("Noise levels must be scaled to physical units (e.g. uV) to compute sparsity from thresholds")]
    NoiseLevelsNotScaled,

    #[error("Expected {expected} noise levels (one per channel), but got {got}")]
    NoiseLevelCount { expected: usize, got: usize },

    #[error("The {0} has no probe attached, so channel locations are unavailable")]
    NoProbe(&'static str),

    #[error("Expected the probe to have 2D contact positions, but they have {0} dimensions")]
    ProbeNotTwoDimensional(usize),

    #[error("Expected {expected} channel locations (one per channel), but the probe has {got}")]
    ChannelLocationCount { expected: usize, got: usize },

    #[error("Property '{property}' is not a {side} property")]
    MissingProperty {
        side: &'static str,
        property: String,
    },

    #[error("Property '{property}' has {got} values, but there are {expected} {side}")]
    PropertyLength {
        property: String,
        side: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Expected the templates array to have dimensions {expected:?}, but it has {got:?}")]
    TemplateShape {
        expected: (usize, usize, usize),
        got: (usize, usize, usize),
    },

    #[error("nbefore ({nbefore}) can't be more than the number of template samples ({num_samples})")]
    BadNbefore { nbefore: usize, num_samples: usize },

    #[error("Expected waveforms for {expected} units, but got {got}")]
    WaveformUnitCount { expected: usize, got: usize },

    #[error("Waveforms of unit {unit_index} have {got} samples, but nbefore + nafter is {expected}")]
    WaveformSampleCount {
        unit_index: usize,
        expected: usize,
        got: usize,
    },

    #[error("The {what} ids of the {kind} don't match the ids of its sparsity")]
    SparsityIdMismatch {
        what: &'static str,
        kind: &'static str,
    },

    #[error(transparent)]
    Sparsity(#[from] SparsityError),
}
