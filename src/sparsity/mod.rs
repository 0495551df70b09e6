// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Channel sparsity for a set of units.
//!
//! For every unit, a [`ChannelSparsity`] indicates which channels are used to
//! represent its waveforms; the rest of the channels are assumed to be zero.
//! Internally, sparsity is stored as a boolean mask with dimensions
//! (num_units, num_channels). Two other representations are derived from it
//! on demand:
//!
//! * [`ChannelSparsity::unit_id_to_channel_ids`]
//! * [`ChannelSparsity::unit_id_to_channel_indices`]
//!
//! Waveforms can be converted between the "dense" layout (the last axis has
//! one element per channel) and a unit's "sparse" layout (the last axis only
//! has the unit's active channels, in ascending channel order).

mod dict;
mod error;
#[cfg(test)]
mod tests;

pub use dict::{SparsityDict, SparsityDictFileError, SparsityDictFileType};
pub use error::SparsityError;

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use log::trace;
use ndarray::{prelude::*, CowArray, Data, RemoveAxis, Slice};
use num_traits::Zero;
use once_cell::sync::OnceCell;

use crate::Id;

/// Which channels are active for each unit.
///
/// A `ChannelSparsity` is never mutated after construction. The derived
/// lookup views are computed on first access and cached; the caches are
/// initialised at most once, even when first accessed from several threads.
#[derive(Debug, Clone)]
pub struct ChannelSparsity {
    /// The unit ids. Each corresponds to a row of `mask`.
    unit_ids: Vec<Id>,

    /// The channel ids. Each corresponds to a column of `mask`.
    channel_ids: Vec<Id>,

    /// `true` where a channel is active for a unit. The dimensions are
    /// (num_units, num_channels).
    mask: Array2<bool>,

    /// The largest number of active channels over all units (0 if there are
    /// no units).
    max_num_active_channels: usize,

    unit_id_to_channel_ids: OnceCell<IndexMap<Id, Vec<Id>>>,
    unit_id_to_channel_indices: OnceCell<IndexMap<Id, Vec<usize>>>,
}

impl ChannelSparsity {
    /// Create a new [`ChannelSparsity`] from a boolean mask. The mask must have
    /// dimensions (num_units, num_channels), and neither the unit ids nor the
    /// channel ids may contain duplicates.
    pub fn new(
        mask: Array2<bool>,
        unit_ids: Vec<Id>,
        channel_ids: Vec<Id>,
    ) -> Result<ChannelSparsity, SparsityError> {
        if mask.dim() != (unit_ids.len(), channel_ids.len()) {
            return Err(SparsityError::MaskShape {
                mask: mask.dim(),
                num_units: unit_ids.len(),
                num_channels: channel_ids.len(),
            });
        }
        check_unique("unit", &unit_ids)?;
        check_unique("channel", &channel_ids)?;

        // An empty sorting (no units) has no active channels.
        let max_num_active_channels = mask
            .outer_iter()
            .map(|row| row.iter().filter(|&&active| active).count())
            .max()
            .unwrap_or(0);

        Ok(ChannelSparsity {
            unit_ids,
            channel_ids,
            mask,
            max_num_active_channels,
            unit_id_to_channel_ids: OnceCell::new(),
            unit_id_to_channel_indices: OnceCell::new(),
        })
    }

    /// Create a sparsity where every channel is active for every unit.
    pub fn create_dense(unit_ids: &[Id], channel_ids: &[Id]) -> Result<ChannelSparsity, SparsityError> {
        let mask = Array2::from_elem((unit_ids.len(), channel_ids.len()), true);
        ChannelSparsity::new(mask, unit_ids.to_vec(), channel_ids.to_vec())
    }

    /// Create a sparsity from a map of unit ids to their active channel ids.
    /// Units that aren't in the map have no active channels.
    pub fn from_unit_id_to_channel_ids(
        unit_id_to_channel_ids: &IndexMap<Id, Vec<Id>>,
        unit_ids: Vec<Id>,
        channel_ids: Vec<Id>,
    ) -> Result<ChannelSparsity, SparsityError> {
        let mut mask = Array2::from_elem((unit_ids.len(), channel_ids.len()), false);
        for (unit_id, chan_ids) in unit_id_to_channel_ids {
            let i_unit = unit_ids
                .iter()
                .position(|u| u == unit_id)
                .ok_or_else(|| SparsityError::UnknownUnitId(unit_id.clone()))?;
            for chan_id in chan_ids {
                let i_chan = channel_ids
                    .iter()
                    .position(|c| c == chan_id)
                    .ok_or_else(|| SparsityError::UnknownChannelId(chan_id.clone()))?;
                mask[(i_unit, i_chan)] = true;
            }
        }
        ChannelSparsity::new(mask, unit_ids, channel_ids)
    }

    /// Get a serialisable dictionary of this sparsity.
    pub fn to_dict(&self) -> SparsityDict {
        SparsityDict {
            unit_id_to_channel_ids: self.unit_id_to_channel_ids().clone(),
            channel_ids: self.channel_ids.clone(),
            unit_ids: self.unit_ids.clone(),
        }
    }

    /// Re-create a sparsity from its dictionary form. Serialisation formats
    /// like JSON turn integer unit ids into strings when they're map keys, so
    /// if a unit id isn't found as-is, its string form is tried.
    pub fn from_dict(dict: &SparsityDict) -> Result<ChannelSparsity, SparsityError> {
        let mut unit_id_to_channel_ids = IndexMap::with_capacity(dict.unit_ids.len());
        for unit_id in &dict.unit_ids {
            let chan_ids = dict
                .unit_id_to_channel_ids
                .get(unit_id)
                .or_else(|| dict.unit_id_to_channel_ids.get(&unit_id.stringified()))
                .ok_or_else(|| SparsityError::MissingDictEntry(unit_id.clone()))?;
            unit_id_to_channel_ids.insert(unit_id.clone(), chan_ids.clone());
        }

        ChannelSparsity::from_unit_id_to_channel_ids(
            &unit_id_to_channel_ids,
            dict.unit_ids.clone(),
            dict.channel_ids.clone(),
        )
    }

    pub fn unit_ids(&self) -> &[Id] {
        &self.unit_ids
    }

    pub fn channel_ids(&self) -> &[Id] {
        &self.channel_ids
    }

    pub fn mask(&self) -> ArrayView2<bool> {
        self.mask.view()
    }

    pub fn num_units(&self) -> usize {
        self.unit_ids.len()
    }

    pub fn num_channels(&self) -> usize {
        self.channel_ids.len()
    }

    pub fn max_num_active_channels(&self) -> usize {
        self.max_num_active_channels
    }

    /// The fraction of the mask that is active. An empty mask has a density
    /// of 0.
    pub fn density(&self) -> f64 {
        if self.mask.is_empty() {
            return 0.0;
        }
        let num_active = self.mask.iter().filter(|&&active| active).count();
        num_active as f64 / self.mask.len() as f64
    }

    /// A map of each unit id to the ids of its active channels.
    pub fn unit_id_to_channel_ids(&self) -> &IndexMap<Id, Vec<Id>> {
        self.unit_id_to_channel_ids.get_or_init(|| {
            self.unit_id_to_channel_indices()
                .iter()
                .map(|(unit_id, indices)| {
                    let chan_ids = indices
                        .iter()
                        .map(|&i_chan| self.channel_ids[i_chan].clone())
                        .collect();
                    (unit_id.clone(), chan_ids)
                })
                .collect()
        })
    }

    /// A map of each unit id to the (ascending) indices of its active
    /// channels.
    pub fn unit_id_to_channel_indices(&self) -> &IndexMap<Id, Vec<usize>> {
        self.unit_id_to_channel_indices.get_or_init(|| {
            trace!("Populating unit-id-to-channel-indices cache");
            self.unit_ids
                .iter()
                .zip(self.mask.outer_iter())
                .map(|(unit_id, row)| {
                    let indices = row
                        .iter()
                        .enumerate()
                        .filter(|(_, &active)| active)
                        .map(|(i_chan, _)| i_chan)
                        .collect();
                    (unit_id.clone(), indices)
                })
                .collect()
        })
    }

    /// The indices of a unit's active channels.
    pub fn channel_indices(&self, unit_id: &Id) -> Result<&[usize], SparsityError> {
        self.unit_id_to_channel_indices()
            .get(unit_id)
            .map(|v| v.as_slice())
            .ok_or_else(|| SparsityError::UnknownUnitId(unit_id.clone()))
    }

    /// The ids of a unit's active channels.
    pub fn channel_ids_of(&self, unit_id: &Id) -> Result<&[Id], SparsityError> {
        self.unit_id_to_channel_ids()
            .get(unit_id)
            .map(|v| v.as_slice())
            .ok_or_else(|| SparsityError::UnknownUnitId(unit_id.clone()))
    }

    pub fn num_active_channels(&self, unit_id: &Id) -> Result<usize, SparsityError> {
        self.channel_indices(unit_id).map(|indices| indices.len())
    }

    /// Are these waveforms in the dense layout, i.e. does the last axis have
    /// one element per channel?
    pub fn are_waveforms_dense<S, D>(&self, waveforms: &ArrayBase<S, D>) -> bool
    where
        S: Data,
        D: Dimension,
    {
        waveforms.shape().last() == Some(&self.num_channels())
    }

    /// Are these waveforms in the sparse layout of the given unit? This is
    /// true when everything beyond the unit's number of active channels (along
    /// the last axis) sums to exactly zero.
    ///
    /// This can't tell a dense waveform apart from a sparse one when all
    /// channels are active for the unit; every waveform looks sparse then.
    pub fn are_waveforms_sparse<S, D>(
        &self,
        waveforms: &ArrayBase<S, D>,
        unit_id: &Id,
    ) -> Result<bool, SparsityError>
    where
        S: Data,
        S::Elem: Clone + Zero + PartialEq,
        D: Dimension,
    {
        let num_active = self.num_active_channels(unit_id)?;
        let last = channel_axis(waveforms)?;
        if num_active >= waveforms.len_of(last) {
            return Ok(true);
        }

        let excess_sum = waveforms
            .slice_axis(last, Slice::from(num_active..))
            .iter()
            .fold(S::Elem::zero(), |acc, v| acc + v.clone());
        Ok(excess_sum == S::Elem::zero())
    }

    /// Select only the active channels of a unit from dense waveforms. The
    /// waveforms may have any number of dimensions, e.g. (num_waveforms,
    /// num_samples, num_channels) or a single template with (num_samples,
    /// num_channels); the last axis is always the channel axis.
    ///
    /// Waveforms that are already sparse for this unit are returned unchanged
    /// (borrowed).
    pub fn sparsify_waveforms<'a, T, D>(
        &self,
        waveforms: ArrayView<'a, T, D>,
        unit_id: &Id,
    ) -> Result<CowArray<'a, T, D>, SparsityError>
    where
        T: Clone + Zero + PartialEq,
        D: RemoveAxis,
    {
        if self.are_waveforms_sparse(&waveforms, unit_id)? {
            return Ok(CowArray::from(waveforms));
        }
        if !self.are_waveforms_dense(&waveforms) {
            return Err(SparsityError::NotDense {
                unit_id: unit_id.clone(),
                num_channels: self.num_channels(),
                got: waveforms.shape().last().copied().unwrap_or(0),
            });
        }

        let last = channel_axis(&waveforms)?;
        let indices = self.channel_indices(unit_id)?;
        Ok(CowArray::from(waveforms.select(last, indices)))
    }

    /// The inverse of [`ChannelSparsity::sparsify_waveforms`]: place sparse
    /// waveforms of a unit back into a zero-filled dense array.
    ///
    /// It is an error for the waveforms to have non-zero values beyond the
    /// unit's active channels; this is a consistency check on the data, and
    /// nothing is repaired.
    pub fn densify_waveforms<T, D>(
        &self,
        waveforms: ArrayView<T, D>,
        unit_id: &Id,
    ) -> Result<Array<T, D>, SparsityError>
    where
        T: Clone + Zero + PartialEq + fmt::Debug,
        D: RemoveAxis,
    {
        let last = channel_axis(&waveforms)?;
        let indices = self.channel_indices(unit_id)?;
        let num_active = indices.len();

        if !self.are_waveforms_sparse(&waveforms, unit_id)? {
            let excess = waveforms.slice_axis(last, Slice::from(num_active..));
            return Err(SparsityError::NotSparse {
                unit_id: unit_id.clone(),
                num_active,
                excess: format!("{excess:?}"),
            });
        }
        let got = waveforms.len_of(last);
        if got < num_active {
            return Err(SparsityError::TooFewChannels {
                unit_id: unit_id.clone(),
                num_active,
                got,
            });
        }

        let mut dense_dim = waveforms.raw_dim();
        dense_dim[last.index()] = self.num_channels();
        let mut dense = Array::zeros(dense_dim);
        // Map the active channels to their original indices.
        for (i_sparse, &i_dense) in indices.iter().enumerate() {
            dense
                .index_axis_mut(last, i_dense)
                .assign(&waveforms.index_axis(last, i_sparse));
        }

        Ok(dense)
    }

    /// Sparsify the templates of all units into a single array with
    /// dimensions (num_units, num_samples, max_num_active_channels). Units
    /// with fewer active channels than the maximum are zero-padded.
    pub fn sparsify_templates<T>(&self, templates: ArrayView3<T>) -> Result<Array3<T>, SparsityError>
    where
        T: Clone + Zero + PartialEq,
    {
        let (num_units, num_samples, _) = templates.dim();
        if num_units != self.num_units() {
            return Err(SparsityError::TemplateUnitCount {
                expected: self.num_units(),
                got: num_units,
            });
        }

        let mut sparse_templates =
            Array3::zeros((num_units, num_samples, self.max_num_active_channels));
        for ((unit_id, template), mut sparse_slot) in self
            .unit_ids
            .iter()
            .zip(templates.outer_iter())
            .zip(sparse_templates.outer_iter_mut())
        {
            let num_active = self.num_active_channels(unit_id)?;
            let sparse_template = self.sparsify_waveforms(template, unit_id)?;
            let got = sparse_template.len_of(Axis(1));
            if got < num_active {
                return Err(SparsityError::TooFewChannels {
                    unit_id: unit_id.clone(),
                    num_active,
                    got,
                });
            }
            sparse_slot
                .slice_mut(s![.., ..num_active])
                .assign(&sparse_template.slice(s![.., ..num_active]));
        }

        Ok(sparse_templates)
    }
}

impl PartialEq for ChannelSparsity {
    fn eq(&self, other: &Self) -> bool {
        self.unit_ids == other.unit_ids
            && self.channel_ids == other.channel_ids
            && self.mask == other.mask
    }
}

impl fmt::Display for ChannelSparsity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ChannelSparsity - units: {} - channels: {} - density, P(x=1): {:.2}",
            self.num_units(),
            self.num_channels(),
            self.density()
        )
    }
}

fn check_unique(kind: &'static str, ids: &[Id]) -> Result<(), SparsityError> {
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id) {
            return Err(SparsityError::DuplicateId {
                kind,
                id: id.clone(),
            });
        }
    }
    Ok(())
}

/// The channel axis of waveforms is always the last one.
fn channel_axis<S, D>(waveforms: &ArrayBase<S, D>) -> Result<Axis, SparsityError>
where
    S: Data,
    D: Dimension,
{
    match waveforms.ndim() {
        0 => Err(SparsityError::NoChannelAxis),
        n => Ok(Axis(n - 1)),
    }
}
