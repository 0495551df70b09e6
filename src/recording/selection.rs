// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Choosing a subset of spikes.

use log::{debug, trace};
use rand::{seq::index, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{RecordingError, Sorting};

/// Uniformly select up to `max_spikes_per_unit` spikes of every unit of
/// `sorting`. The results are indices into [`Sorting::to_spike_vector`], in
/// ascending order.
///
/// `num_samples` has the number of samples of every segment. If
/// `margin_size` is given, spikes closer than that to either edge of their
/// segment are never selected. The same `seed` always gives the same
/// selection.
pub fn random_spikes_selection(
    sorting: &Sorting,
    num_samples: &[usize],
    max_spikes_per_unit: usize,
    margin_size: Option<usize>,
    seed: u64,
) -> Result<Vec<usize>, RecordingError> {
    let mut unit_spike_indices: Vec<Vec<usize>> = vec![vec![]; sorting.num_units()];
    for (i_spike, spike) in sorting.to_spike_vector().iter().enumerate() {
        let segment_num_samples =
            *num_samples
                .get(spike.segment_index)
                .ok_or(RecordingError::SegmentOutOfRange {
                    segment_index: spike.segment_index,
                    num_segments: num_samples.len(),
                })?;
        if let Some(margin) = margin_size {
            if spike.sample_index < margin || spike.sample_index + margin >= segment_num_samples {
                continue;
            }
        }
        unit_spike_indices[spike.unit_index].push(i_spike);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut selected = Vec::with_capacity(sorting.num_units() * max_spikes_per_unit);
    for (unit_id, spike_indices) in sorting.unit_ids().iter().zip(unit_spike_indices) {
        if spike_indices.len() > max_spikes_per_unit {
            trace!(
                "Unit {unit_id}: selecting {max_spikes_per_unit} of {} spikes",
                spike_indices.len()
            );
            selected.extend(
                index::sample(&mut rng, spike_indices.len(), max_spikes_per_unit)
                    .into_iter()
                    .map(|i| spike_indices[i]),
            );
        } else {
            trace!("Unit {unit_id}: keeping all {} spikes", spike_indices.len());
            selected.extend(spike_indices);
        }
    }
    selected.sort_unstable();
    debug!(
        "Selected {} of {} spikes",
        selected.len(),
        sorting.to_spike_vector().len()
    );
    Ok(selected)
}
