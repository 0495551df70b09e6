// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Averaging spike waveforms into templates.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, warn};
use ndarray::prelude::*;
use rayon::prelude::*;

use super::{Recording, RecordingError, Spike};
use crate::{Id, PROGRESS_BARS};

/// Average the waveforms of `spikes` into one template per unit. Each
/// waveform is cut out of the recording's traces from `nbefore` samples
/// before its spike to `nafter` samples after (the spike sample itself is
/// the first of the `nafter` samples).
///
/// The result has dimensions (num_units, nbefore + nafter, num_channels).
/// Units without any spikes get an all-zero template. Units are averaged in
/// parallel.
pub fn estimate_templates_average(
    recording: &dyn Recording,
    spikes: &[Spike],
    unit_ids: &[Id],
    nbefore: usize,
    nafter: usize,
) -> Result<Array3<f64>, RecordingError> {
    let num_samples = recording.all_num_samples()?;
    let mut unit_spikes: Vec<Vec<Spike>> = vec![vec![]; unit_ids.len()];
    for spike in spikes {
        unit_spikes
            .get_mut(spike.unit_index)
            .ok_or(RecordingError::UnitIndex {
                unit_index: spike.unit_index,
                num_units: unit_ids.len(),
            })?
            .push(*spike);
    }

    debug!(
        "Averaging {} spikes into {} templates ({nbefore}+{nafter} samples)",
        spikes.len(),
        unit_ids.len()
    );
    let progress = ProgressBar::with_draw_target(
        Some(unit_ids.len() as _),
        if PROGRESS_BARS.load() {
            ProgressDrawTarget::stdout()
        } else {
            ProgressDrawTarget::hidden()
        },
    )
    .with_style(
        ProgressStyle::default_bar()
            .template("{msg:17}: [{wide_bar:.blue}] {pos:3}/{len:3} units ({elapsed_precise}<{eta_precise})")
            .unwrap()
            .progress_chars("=> "),
    )
    .with_position(0)
    .with_message("Averaging");

    let mut templates = Array3::zeros((unit_ids.len(), nbefore + nafter, recording.num_channels()));
    templates
        .outer_iter_mut()
        .into_par_iter()
        .zip(unit_spikes.par_iter())
        .try_for_each(|(mut template, spikes)| {
            for spike in spikes {
                let segment_num_samples = *num_samples.get(spike.segment_index).ok_or(
                    RecordingError::SegmentOutOfRange {
                        segment_index: spike.segment_index,
                        num_segments: num_samples.len(),
                    },
                )?;
                if spike.sample_index < nbefore || spike.sample_index + nafter > segment_num_samples {
                    return Err(RecordingError::SpikeWindow {
                        sample_index: spike.sample_index,
                        segment_index: spike.segment_index,
                        num_samples: segment_num_samples,
                        nbefore,
                        nafter,
                    });
                }
                let traces = recording.get_traces(
                    spike.segment_index,
                    spike.sample_index - nbefore,
                    spike.sample_index + nafter,
                )?;
                template += &traces;
            }
            if !spikes.is_empty() {
                template /= spikes.len() as f64;
            }
            progress.inc(1);
            Ok(())
        })?;
    progress.finish();

    for (unit_id, spikes) in unit_ids.iter().zip(&unit_spikes) {
        if spikes.is_empty() {
            warn!("Unit {unit_id} has no spikes; its template is all zeros");
        }
    }
    Ok(templates)
}
