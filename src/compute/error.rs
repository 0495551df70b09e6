// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with dispatching sparsity estimation.

use thiserror::Error;

use super::{SparsityMethod, SPARSITY_METHODS_COMMA_SEPARATED};
use crate::estimators::EstimatorError;

#[derive(Error, Debug)]
pub enum ComputeSparsityError {
    #[error("Sparsity method '{0}' is not valid; supported methods are: {}", *SPARSITY_METHODS_COMMA_SEPARATED)]
    UnknownMethod(String),

    #[error("The '{method}' sparsity method needs a value for '{parameter}'")]
    MissingParameter {
        method: SparsityMethod,
        parameter: &'static str,
    },

    #[error(transparent)]
    Estimator(#[from] EstimatorError),
}
