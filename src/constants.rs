// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Useful constants.
//!
//! All defaults used by `chansparse` should go in here.

/// The default number of channels kept per unit by the "best_channels"
/// method.
pub const DEFAULT_NUM_CHANNELS: usize = 5;

/// The default radius around a unit's extremum channel used by the "radius"
/// method \[micrometres\].
pub const DEFAULT_RADIUS_UM: f64 = 100.0;

/// The default threshold used by the "snr", "ptp" and "energy" methods (in
/// units of noise levels).
pub const DEFAULT_THRESHOLD: f64 = 5.0;

/// The default number of spikes per unit averaged by `estimate_sparsity`.
pub const DEFAULT_NUM_SPIKES_FOR_SPARSITY: usize = 100;

/// The default cut-out before each spike \[milliseconds\].
pub const DEFAULT_MS_BEFORE: f64 = 1.0;

/// The default cut-out after each spike \[milliseconds\].
pub const DEFAULT_MS_AFTER: f64 = 2.5;

/// The seed used when randomly selecting spikes in `estimate_sparsity`. Fixed
/// so that sparsity estimates are reproducible.
pub const SPIKE_SELECTION_SEED: u64 = 2205;
