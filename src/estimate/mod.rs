// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Estimating sparsity straight from a recording and its sorting, without
//! extracting waveforms first.

mod error;

pub use error::EstimateSparsityError;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    compute::compute_sparsity_with_method,
    constants::*,
    recording::{estimate_templates_average, random_spikes_selection, Recording, Sorting, Spike},
    ChannelSparsity, PeakSign, SparsityMethod, SparsityParams, Templates,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateSparsityParams {
    /// The maximum number of spikes per unit averaged into its template.
    pub num_spikes_for_sparsity: usize,

    /// The cut-out before each spike \[milliseconds\].
    pub ms_before: f64,

    /// The cut-out after each spike \[milliseconds\].
    pub ms_after: f64,

    /// Only "radius" and "best_channels" are supported.
    pub method: SparsityMethod,

    pub peak_sign: PeakSign,

    /// Used by "radius" \[micrometres\].
    pub radius_um: f64,

    /// Used by "best_channels".
    pub num_channels: usize,
}

impl Default for EstimateSparsityParams {
    fn default() -> Self {
        EstimateSparsityParams {
            num_spikes_for_sparsity: DEFAULT_NUM_SPIKES_FOR_SPARSITY,
            ms_before: DEFAULT_MS_BEFORE,
            ms_after: DEFAULT_MS_AFTER,
            method: SparsityMethod::Radius,
            peak_sign: PeakSign::default(),
            radius_um: DEFAULT_RADIUS_UM,
            num_channels: DEFAULT_NUM_CHANNELS,
        }
    }
}

/// Estimate sparsity by averaging a random subset of each unit's spikes into
/// templates, then running the "radius" or "best_channels" method on them.
///
/// Spikes are selected with a fixed seed, so the result is reproducible.
/// Traces are averaged as they are stored (i.e. unscaled).
pub fn estimate_sparsity(
    recording: &dyn Recording,
    sorting: &Sorting,
    params: &EstimateSparsityParams,
) -> Result<ChannelSparsity, EstimateSparsityError> {
    match params.method {
        SparsityMethod::Radius => {
            let num_probes = recording.probes().len();
            if num_probes != 1 {
                return Err(EstimateSparsityError::ProbeCount(num_probes));
            }
        }
        SparsityMethod::BestChannels => (),
        method => return Err(EstimateSparsityError::UnsupportedMethod(method)),
    }

    let sampling_frequency = recording.sampling_frequency();
    // Truncation is intended.
    let nbefore = (params.ms_before * sampling_frequency / 1000.0) as usize;
    let nafter = (params.ms_after * sampling_frequency / 1000.0) as usize;
    debug!("Estimating sparsity with {nbefore} samples before and {nafter} after each spike");

    let num_samples = recording.all_num_samples()?;
    let selected = random_spikes_selection(
        sorting,
        &num_samples,
        params.num_spikes_for_sparsity,
        Some(nbefore.max(nafter)),
        SPIKE_SELECTION_SEED,
    )?;
    let spike_vector = sorting.to_spike_vector();
    let spikes: Vec<Spike> = selected.into_iter().map(|i| spike_vector[i]).collect();

    let templates_array =
        estimate_templates_average(recording, &spikes, sorting.unit_ids(), nbefore, nafter)?;
    let probe = match recording.probes() {
        [probe] => Some(probe.clone()),
        _ => None,
    };
    let templates = Templates::new(
        templates_array,
        sampling_frequency,
        nbefore,
        None,
        recording.channel_ids().to_vec(),
        sorting.unit_ids().to_vec(),
        probe,
    )?;

    let sparsity_params = SparsityParams {
        peak_sign: params.peak_sign,
        num_channels: Some(params.num_channels),
        radius_um: Some(params.radius_um),
        ..Default::default()
    };
    Ok(compute_sparsity_with_method(
        &templates,
        params.method,
        &sparsity_params,
    )?)
}
