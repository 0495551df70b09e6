// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Functions to estimate channel sparsity from a [`SparsitySource`].
//!
//! Each function implements one policy for choosing a unit's active channels.
//! Most callers should go through [`crate::compute_sparsity`], which validates
//! the parameters of each policy.

mod error;
#[cfg(test)]
mod tests;

pub use error::EstimatorError;

use log::{debug, trace, warn};
use ndarray::prelude::*;

use crate::{
    source::{template_ptps, SourceError, SparsitySource},
    ChannelSparsity, PeakSign,
};

/// Keep the `num_channels` channels with the largest template amplitudes.
/// Channels with equal amplitudes keep their original order, so the lower
/// channel index wins a tie.
pub fn from_best_channels(
    source: &dyn SparsitySource,
    num_channels: usize,
    peak_sign: PeakSign,
) -> Result<ChannelSparsity, EstimatorError> {
    debug!(
        "Estimating sparsity from the {num_channels} best channels ({peak_sign}) of {} units",
        source.num_units()
    );
    let amplitudes = source.template_amplitudes(peak_sign)?;
    let mut mask = empty_mask(source);
    for (unit_amps, mut unit_mask) in amplitudes.outer_iter().zip(mask.outer_iter_mut()) {
        let mut chan_inds: Vec<usize> = (0..unit_amps.len()).collect();
        // `sort_by` is stable.
        chan_inds.sort_by(|&a, &b| unit_amps[b].abs().total_cmp(&unit_amps[a].abs()));
        for &i_chan in chan_inds.iter().take(num_channels) {
            unit_mask[i_chan] = true;
        }
    }
    finish(mask, source, "best_channels")
}

/// Keep every channel within `radius_um` (inclusive) of the unit's extremum
/// channel.
pub fn from_radius(
    source: &dyn SparsitySource,
    radius_um: f64,
    peak_sign: PeakSign,
) -> Result<ChannelSparsity, EstimatorError> {
    debug!(
        "Estimating sparsity within {radius_um} um of the extremum channel ({peak_sign}) of {} units",
        source.num_units()
    );
    let distances = channel_distances(source.channel_locations()?);
    let best_chans = source.extremum_channel_indices(peak_sign)?;
    let mut mask = empty_mask(source);
    if source.num_channels() == 0 {
        return finish(mask, source, "radius");
    }
    for (&best_chan, mut unit_mask) in best_chans.iter().zip(mask.outer_iter_mut()) {
        trace!("Extremum channel index: {best_chan}");
        unit_mask.assign(&distances.row(best_chan).mapv(|d| d <= radius_um));
    }
    finish(mask, source, "radius")
}

/// Keep channels where the template's signal-to-noise ratio (|peak
/// amplitude| / noise level) is at least `threshold`.
///
/// If `noise_levels` aren't supplied, the source's noise levels are used;
/// these must be scaled. The source must be dense.
pub fn from_snr(
    source: &dyn SparsitySource,
    threshold: f64,
    noise_levels: Option<ArrayView1<f64>>,
    peak_sign: PeakSign,
) -> Result<ChannelSparsity, EstimatorError> {
    require_dense(source, "snr")?;
    let noise_levels = get_noise_levels(source, noise_levels, "snr")?;
    debug!(
        "Estimating sparsity from an SNR threshold of {threshold} ({peak_sign}) for {} units",
        source.num_units()
    );

    let amplitudes = source.template_amplitudes(peak_sign)?;
    let snrs = amplitudes.mapv(f64::abs) / &noise_levels;
    finish(snrs.mapv(|snr| snr >= threshold), source, "snr")
}

/// Keep channels where the template's peak-to-peak value divided by the
/// noise level is at least `threshold`.
///
/// If `noise_levels` aren't supplied, the source's noise levels are used;
/// these must be scaled. The source must be dense.
pub fn from_ptp(
    source: &dyn SparsitySource,
    threshold: f64,
    noise_levels: Option<ArrayView1<f64>>,
) -> Result<ChannelSparsity, EstimatorError> {
    require_dense(source, "ptp")?;
    let noise_levels = get_noise_levels(source, noise_levels, "ptp")?;
    debug!(
        "Estimating sparsity from a PTP threshold of {threshold} for {} units",
        source.num_units()
    );

    let templates = source.dense_templates()?;
    let ratios = template_ptps(templates.view()) / &noise_levels;
    finish(ratios.mapv(|r| r >= threshold), source, "ptp")
}

/// Keep channels where the energy of a unit's waveforms is at least
/// `threshold` times the energy expected from noise alone.
///
/// The energy of a channel is the L2 norm of all of a unit's waveforms on
/// that channel. Noise contributes `sqrt(num_samples * num_waveforms) *
/// noise_level` to it. The source must be dense and must have scaled noise
/// levels and waveforms.
pub fn from_energy(source: &dyn SparsitySource, threshold: f64) -> Result<ChannelSparsity, EstimatorError> {
    require_dense(source, "energy")?;
    let noise_levels = get_noise_levels(source, None, "energy")?;
    let waveforms = source.waveforms().ok_or(SourceError::MissingExtension {
        kind: source.kind(),
        extension: "waveforms",
    })?;
    debug!(
        "Estimating sparsity from an energy threshold of {threshold} for {} units",
        source.num_units()
    );

    let noise = noise_levels.mapv(|n| n * (waveforms.num_samples() as f64).sqrt());
    let mut mask = empty_mask(source);
    for (i_unit, (unit_id, mut unit_mask)) in source
        .unit_ids()
        .iter()
        .zip(mask.outer_iter_mut())
        .enumerate()
    {
        let wfs = waveforms.get_waveforms_one_unit(i_unit, unit_id, true)?;
        let num_wfs = wfs.len_of(Axis(0)) as f64;
        let energies = wfs
            .mapv(|v| v * v)
            .sum_axis(Axis(0))
            .sum_axis(Axis(0))
            .mapv_into(f64::sqrt);
        trace!("Unit {unit_id} energies: {energies}");
        let ratios = energies / (&noise * num_wfs.sqrt());
        unit_mask.assign(&ratios.mapv(|r| r >= threshold));
    }
    finish(mask, source, "energy")
}

/// Give each unit the channels that share its value of a property (e.g.
/// "group"). Both the channels and the units must have the property.
pub fn from_property(source: &dyn SparsitySource, by_property: &str) -> Result<ChannelSparsity, EstimatorError> {
    let groups = source.channel_groups(by_property)?;
    let unit_values = source
        .unit_property(by_property)
        .ok_or_else(|| SourceError::MissingProperty {
            side: "sorting",
            property: by_property.to_string(),
        })?;
    if unit_values.len() != source.num_units() {
        return Err(SourceError::PropertyLength {
            property: by_property.to_string(),
            side: "units",
            expected: source.num_units(),
            got: unit_values.len(),
        }
        .into());
    }
    debug!(
        "Estimating sparsity by property '{by_property}' ({} channel groups)",
        groups.len()
    );

    let mut mask = empty_mask(source);
    for (value, mut unit_mask) in unit_values.iter().zip(mask.outer_iter_mut()) {
        let chan_inds =
            groups
                .get(value)
                .ok_or_else(|| EstimatorError::PropertyValueWithoutChannels {
                    property: by_property.to_string(),
                    value: value.clone(),
                })?;
        for &i_chan in chan_inds {
            unit_mask[i_chan] = true;
        }
    }
    finish(mask, source, "by_property")
}

/// Create a sparsity where every channel is active for every unit of the
/// source.
pub fn create_dense(source: &dyn SparsitySource) -> Result<ChannelSparsity, EstimatorError> {
    Ok(ChannelSparsity::create_dense(
        source.unit_ids(),
        source.channel_ids(),
    )?)
}

/// Get the Euclidean distance between every pair of channels. `locations`
/// has dimensions (num_channels, 2).
pub(crate) fn channel_distances(locations: ArrayView2<f64>) -> Array2<f64> {
    let num_channels = locations.len_of(Axis(0));
    Array2::from_shape_fn((num_channels, num_channels), |(i, j)| {
        let dx = locations[(i, 0)] - locations[(j, 0)];
        let dy = locations[(i, 1)] - locations[(j, 1)];
        dx.hypot(dy)
    })
}

fn empty_mask(source: &dyn SparsitySource) -> Array2<bool> {
    Array2::from_elem((source.num_units(), source.num_channels()), false)
}

fn require_dense(source: &dyn SparsitySource, method: &'static str) -> Result<(), EstimatorError> {
    match source.sparsity() {
        Some(_) => Err(EstimatorError::DenseSourceRequired {
            method,
            kind: source.kind(),
        }),
        None => Ok(()),
    }
}

/// Use the supplied noise levels, or fall back on the source's (which must be
/// scaled).
fn get_noise_levels(
    source: &dyn SparsitySource,
    supplied: Option<ArrayView1<f64>>,
    method: &'static str,
) -> Result<Array1<f64>, EstimatorError> {
    let noise_levels = match (supplied, source.noise_levels()) {
        (Some(supplied), _) => supplied.to_owned(),
        (None, Some(nl)) if nl.scaled => nl.values.clone(),
        (None, Some(_)) => return Err(SourceError::NoiseLevelsNotScaled.into()),
        (None, None) => {
            return Err(EstimatorError::NoiseLevelsRequired {
                method,
                kind: source.kind(),
            })
        }
    };
    if noise_levels.len() != source.num_channels() {
        return Err(EstimatorError::NoiseLevelCount {
            expected: source.num_channels(),
            got: noise_levels.len(),
        });
    }
    Ok(noise_levels)
}

fn finish(
    mask: Array2<bool>,
    source: &dyn SparsitySource,
    method: &'static str,
) -> Result<ChannelSparsity, EstimatorError> {
    let sparsity = ChannelSparsity::new(mask, source.unit_ids().to_vec(), source.channel_ids().to_vec())?;
    debug!("{method}: {sparsity}");
    for (unit_id, chan_inds) in sparsity.unit_id_to_channel_indices() {
        if chan_inds.is_empty() {
            warn!("Unit {unit_id} has no active channels with the '{method}' method");
        }
    }
    Ok(sparsity)
}
