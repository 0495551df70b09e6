// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Spike sortings.

use super::RecordingError;
use crate::Id;

/// A single spike. The field order matters; spikes sort by segment, then
/// sample, then unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Spike {
    pub segment_index: usize,
    pub sample_index: usize,
    pub unit_index: usize,
}

/// The units found by a spike sorter and when each of them fired.
#[derive(Debug, Clone)]
pub struct Sorting {
    unit_ids: Vec<Id>,

    /// Sorted.
    spikes: Vec<Spike>,
}

impl Sorting {
    pub fn new(unit_ids: Vec<Id>, mut spikes: Vec<Spike>) -> Result<Sorting, RecordingError> {
        if let Some(spike) = spikes.iter().find(|s| s.unit_index >= unit_ids.len()) {
            return Err(RecordingError::UnitIndex {
                unit_index: spike.unit_index,
                num_units: unit_ids.len(),
            });
        }
        spikes.sort_unstable();
        Ok(Sorting { unit_ids, spikes })
    }

    /// Create a [`Sorting`] from spike trains. `spike_trains[segment][unit]`
    /// holds the sample indices of that unit's spikes in that segment.
    pub fn from_spike_trains(
        unit_ids: Vec<Id>,
        spike_trains: &[Vec<Vec<usize>>],
    ) -> Result<Sorting, RecordingError> {
        let spikes = spike_trains
            .iter()
            .enumerate()
            .flat_map(|(segment_index, segment)| {
                segment
                    .iter()
                    .enumerate()
                    .flat_map(move |(unit_index, train)| {
                        train.iter().map(move |&sample_index| Spike {
                            segment_index,
                            sample_index,
                            unit_index,
                        })
                    })
            })
            .collect();
        Sorting::new(unit_ids, spikes)
    }

    pub fn unit_ids(&self) -> &[Id] {
        &self.unit_ids
    }

    pub fn num_units(&self) -> usize {
        self.unit_ids.len()
    }

    /// All spikes, sorted by segment, then sample, then unit.
    pub fn to_spike_vector(&self) -> &[Spike] {
        &self.spikes
    }
}
