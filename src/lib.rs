// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Channel sparsity for multi-channel electrophysiological recordings.

For each unit (putative neuron) of a spike sorting, a [`ChannelSparsity`]
records which recording channels carry meaningful signal; every other channel
is treated as zero. Sparsity can be estimated from templates with several
policies (see [`compute_sparsity`]) or directly from a recording and a sorting
(see [`estimate_sparsity`]).
 */

pub mod cli;
pub mod compute;
pub mod constants;
pub mod estimate;
pub mod estimators;
mod ids;
pub mod recording;
pub mod source;
pub mod sparsity;

// Re-exports.
pub use cli::{Chansparse, ChansparseError};
pub use compute::{compute_sparsity, ComputeSparsityError, SparsityMethod, SparsityParams};
pub use estimate::{estimate_sparsity, EstimateSparsityError, EstimateSparsityParams};
pub use ids::Id;
pub use source::{PeakSign, Probe, SortingResult, SparsitySource, Templates};
pub use sparsity::{ChannelSparsity, SparsityDict, SparsityError};

use crossbeam_utils::atomic::AtomicCell;

/// Should we be drawing progress bars? Set by the binary; library users get
/// no progress bars unless they ask for them.
pub static PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);
