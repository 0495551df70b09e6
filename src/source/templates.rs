// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Average waveforms (templates) of units, with the metadata needed to
//! estimate sparsity from them.

use log::trace;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use super::{SourceError, SparsitySource};
use crate::{ChannelSparsity, Id};

/// The geometry of a probe; only contact positions are needed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    /// The 2D position of every contact \[micrometres\]. The dimensions are
    /// (num_contacts, 2), and contacts are in channel order.
    contact_positions: Array2<f64>,
}

impl Probe {
    pub fn new(contact_positions: Array2<f64>) -> Result<Probe, SourceError> {
        let num_dims = contact_positions.len_of(Axis(1));
        if num_dims != 2 {
            return Err(SourceError::ProbeNotTwoDimensional(num_dims));
        }
        Ok(Probe { contact_positions })
    }

    pub fn contact_positions(&self) -> ArrayView2<f64> {
        self.contact_positions.view()
    }

    pub fn num_contacts(&self) -> usize {
        self.contact_positions.len_of(Axis(0))
    }

    /// Get the contact positions, checking that there's one per channel.
    pub(crate) fn channel_locations(&self, num_channels: usize) -> Result<ArrayView2<f64>, SourceError> {
        if self.num_contacts() != num_channels {
            return Err(SourceError::ChannelLocationCount {
                expected: num_channels,
                got: self.num_contacts(),
            });
        }
        Ok(self.contact_positions.view())
    }
}

/// One average waveform per unit.
///
/// When a sparsity mask is attached, the templates array is sparse: its last
/// axis has `max_num_active_channels` elements, and each unit's template
/// occupies the first of them (see [`ChannelSparsity::sparsify_templates`]).
#[derive(Debug, Clone)]
pub struct Templates {
    /// The dimensions are (num_units, num_samples, num_channels), or
    /// (num_units, num_samples, max_num_active_channels) if sparse.
    templates_array: Array3<f64>,

    /// \[Hz\]
    sampling_frequency: f64,

    /// The number of samples before the spike peak.
    nbefore: usize,

    sparsity: Option<ChannelSparsity>,

    channel_ids: Vec<Id>,

    unit_ids: Vec<Id>,

    probe: Option<Probe>,
}

impl Templates {
    /// Create new [`Templates`]. If `sparsity_mask` is given, the templates
    /// array must be sparse in that mask.
    pub fn new(
        templates_array: Array3<f64>,
        sampling_frequency: f64,
        nbefore: usize,
        sparsity_mask: Option<Array2<bool>>,
        channel_ids: Vec<Id>,
        unit_ids: Vec<Id>,
        probe: Option<Probe>,
    ) -> Result<Templates, SourceError> {
        let sparsity = match sparsity_mask {
            Some(mask) => Some(ChannelSparsity::new(
                mask,
                unit_ids.clone(),
                channel_ids.clone(),
            )?),
            None => None,
        };

        let (num_units, num_samples, num_columns) = templates_array.dim();
        let expected_columns = sparsity
            .as_ref()
            .map(|s| s.max_num_active_channels())
            .unwrap_or(channel_ids.len());
        if num_units != unit_ids.len() || num_columns != expected_columns {
            return Err(SourceError::TemplateShape {
                expected: (unit_ids.len(), num_samples, expected_columns),
                got: templates_array.dim(),
            });
        }
        if nbefore > num_samples {
            return Err(SourceError::BadNbefore {
                nbefore,
                num_samples,
            });
        }

        Ok(Templates {
            templates_array,
            sampling_frequency,
            nbefore,
            sparsity,
            channel_ids,
            unit_ids,
            probe,
        })
    }

    pub fn templates_array(&self) -> ArrayView3<f64> {
        self.templates_array.view()
    }

    pub fn sampling_frequency(&self) -> f64 {
        self.sampling_frequency
    }

    pub fn nbefore(&self) -> usize {
        self.nbefore
    }

    /// The number of samples after the spike peak (including it). This is 0
    /// if the templates end at the peak.
    pub fn nafter(&self) -> usize {
        self.num_samples() - self.nbefore
    }

    pub fn num_samples(&self) -> usize {
        self.templates_array.len_of(Axis(1))
    }

    pub fn probe(&self) -> Option<&Probe> {
        self.probe.as_ref()
    }

    /// Get the templates with dimensions (num_units, num_samples,
    /// num_channels), densifying them if they're sparse.
    pub fn get_dense_templates(&self) -> Result<Array3<f64>, SourceError> {
        let sparsity = match &self.sparsity {
            None => return Ok(self.templates_array.clone()),
            Some(s) => s,
        };

        trace!("Densifying {} sparse templates", self.unit_ids.len());
        let mut dense = Array3::zeros((
            self.unit_ids.len(),
            self.num_samples(),
            self.channel_ids.len(),
        ));
        for ((unit_id, template), mut dense_template) in self
            .unit_ids
            .iter()
            .zip(self.templates_array.outer_iter())
            .zip(dense.outer_iter_mut())
        {
            dense_template.assign(&sparsity.densify_waveforms(template, unit_id)?);
        }
        Ok(dense)
    }
}

impl SparsitySource for Templates {
    fn kind(&self) -> &'static str {
        "Templates"
    }

    fn unit_ids(&self) -> &[Id] {
        &self.unit_ids
    }

    fn channel_ids(&self) -> &[Id] {
        &self.channel_ids
    }

    fn sparsity(&self) -> Option<&ChannelSparsity> {
        self.sparsity.as_ref()
    }

    fn dense_templates(&self) -> Result<Array3<f64>, SourceError> {
        self.get_dense_templates()
    }

    fn channel_locations(&self) -> Result<ArrayView2<f64>, SourceError> {
        self.probe
            .as_ref()
            .ok_or(SourceError::NoProbe("Templates"))?
            .channel_locations(self.channel_ids.len())
    }
}
