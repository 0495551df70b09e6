// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all errors surfaced by the `chansparse` binary. This should
//! be the *only* error enum that the binary sees.

use thiserror::Error;

use super::files::InputFileError;
use crate::{
    sparsity::SparsityDictFileError, ComputeSparsityError, EstimateSparsityError, SparsityError,
};

/// The *only* error surfaced by the `chansparse` binary. Each variant carries
/// the message of the error it was converted from.
#[derive(Error, Debug)]
pub enum ChansparseError {
    /// An error related to choosing or running a sparsity method.
    #[error("{0}\n\nSupported methods and their parameters are listed by 'chansparse compute --help'")]
    Compute(String),

    /// An error related to a sparsity value or file.
    #[error("{0}")]
    Sparsity(String),

    /// An error related to a templates or recording input file.
    #[error("{0}\n\nInput files are json; see 'chansparse compute --help' and 'chansparse estimate --help'")]
    InputFile(String),

    /// An error related to argument files.
    #[error("{0}")]
    ArgFile(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

impl From<ComputeSparsityError> for ChansparseError {
    fn from(e: ComputeSparsityError) -> Self {
        let s = e.to_string();
        match e {
            ComputeSparsityError::UnknownMethod(_)
            | ComputeSparsityError::MissingParameter { .. }
            | ComputeSparsityError::Estimator(_) => Self::Compute(s),
        }
    }
}

impl From<EstimateSparsityError> for ChansparseError {
    fn from(e: EstimateSparsityError) -> Self {
        let s = e.to_string();
        match e {
            EstimateSparsityError::Compute(e) => Self::from(e),
            EstimateSparsityError::UnsupportedMethod(_)
            | EstimateSparsityError::ProbeCount(_)
            | EstimateSparsityError::Recording(_)
            | EstimateSparsityError::Source(_) => Self::Compute(s),
        }
    }
}

impl From<SparsityError> for ChansparseError {
    fn from(e: SparsityError) -> Self {
        Self::Sparsity(e.to_string())
    }
}

impl From<SparsityDictFileError> for ChansparseError {
    fn from(e: SparsityDictFileError) -> Self {
        let s = e.to_string();
        match e {
            SparsityDictFileError::UnrecognisedExtension(_)
            | SparsityDictFileError::Json { .. }
            | SparsityDictFileError::TomlDe { .. }
            | SparsityDictFileError::TomlSer(_) => Self::Sparsity(s),
            SparsityDictFileError::IO(e) => Self::from(e),
        }
    }
}

impl From<InputFileError> for ChansparseError {
    fn from(e: InputFileError) -> Self {
        Self::InputFile(e.to_string())
    }
}

impl From<std::io::Error> for ChansparseError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
