// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A sorting paired with its recording's metadata, plus any extensions that
//! have been computed for them.

use indexmap::IndexMap;
use log::{debug, trace};
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use super::{Probe, SourceError, SparsitySource};
use crate::{ChannelSparsity, Id};

/// Per-channel noise levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseLevels {
    /// One value per channel.
    pub values: Array1<f64>,

    /// Are the values in physical units (e.g. uV) rather than raw ADC units?
    /// Threshold-based sparsity needs scaled noise levels.
    pub scaled: bool,
}

/// The metadata of a recording that sparsity estimation needs.
#[derive(Debug, Clone)]
pub struct RecordingInfo {
    pub channel_ids: Vec<Id>,

    /// \[Hz\]
    pub sampling_frequency: f64,

    pub probe: Option<Probe>,

    /// Named channel properties (e.g. "group"); each has one value per
    /// channel.
    pub properties: IndexMap<String, Vec<Id>>,
}

/// The metadata of a sorting that sparsity estimation needs.
#[derive(Debug, Clone)]
pub struct SortingInfo {
    pub unit_ids: Vec<Id>,

    /// Named unit properties; each has one value per unit.
    pub properties: IndexMap<String, Vec<Id>>,
}

/// Per-spike waveforms extracted for every unit.
#[derive(Debug, Clone)]
pub struct WaveformsExtension {
    /// The number of samples before each spike.
    pub nbefore: usize,

    /// The number of samples after each spike (including it).
    pub nafter: usize,

    /// One array per unit, with dimensions (num_waveforms, num_samples,
    /// num_channels). If `sparsity` is set, the last axis is instead the
    /// unit's number of active channels.
    waveforms: Vec<Array3<f64>>,

    sparsity: Option<ChannelSparsity>,
}

impl WaveformsExtension {
    pub fn new(
        nbefore: usize,
        nafter: usize,
        waveforms: Vec<Array3<f64>>,
        sparsity: Option<ChannelSparsity>,
    ) -> Result<WaveformsExtension, SourceError> {
        for (unit_index, unit_wfs) in waveforms.iter().enumerate() {
            let got = unit_wfs.len_of(Axis(1));
            if got != nbefore + nafter {
                return Err(SourceError::WaveformSampleCount {
                    unit_index,
                    expected: nbefore + nafter,
                    got,
                });
            }
        }
        Ok(WaveformsExtension {
            nbefore,
            nafter,
            waveforms,
            sparsity,
        })
    }

    pub fn num_samples(&self) -> usize {
        self.nbefore + self.nafter
    }

    pub fn num_units(&self) -> usize {
        self.waveforms.len()
    }

    /// Get the waveforms of a unit. If `force_dense` is set and the waveforms
    /// are stored sparsely, they're densified first.
    pub fn get_waveforms_one_unit(
        &self,
        unit_index: usize,
        unit_id: &Id,
        force_dense: bool,
    ) -> Result<Array3<f64>, SourceError> {
        let wfs = self
            .waveforms
            .get(unit_index)
            .ok_or(SourceError::WaveformUnitCount {
                expected: unit_index + 1,
                got: self.waveforms.len(),
            })?;
        match (&self.sparsity, force_dense) {
            (Some(sparsity), true) => Ok(sparsity.densify_waveforms(wfs.view(), unit_id)?),
            _ => Ok(wfs.clone()),
        }
    }

    /// Average every unit's dense waveforms into a template. The dimensions
    /// of the result are (num_units, num_samples, num_channels). Units without
    /// waveforms get a zero template.
    pub fn average_templates(
        &self,
        unit_ids: &[Id],
        num_channels: usize,
    ) -> Result<Array3<f64>, SourceError> {
        let mut templates = Array3::zeros((unit_ids.len(), self.num_samples(), num_channels));
        for (unit_index, (unit_id, mut template)) in unit_ids
            .iter()
            .zip(templates.outer_iter_mut())
            .enumerate()
        {
            let wfs = self.get_waveforms_one_unit(unit_index, unit_id, true)?;
            if let Some(mean) = wfs.mean_axis(Axis(0)) {
                if mean.dim() != template.dim() {
                    return Err(SourceError::TemplateShape {
                        expected: (unit_ids.len(), self.num_samples(), num_channels),
                        got: (unit_ids.len(), mean.nrows(), mean.ncols()),
                    });
                }
                template.assign(&mean);
            }
        }
        Ok(templates)
    }
}

/// A sorting and its recording, and any extensions computed for them.
///
/// Extensions are attached with the `with_*` methods; they're what gives a
/// `SortingResult` more capabilities than [`super::Templates`] (noise levels,
/// waveforms and properties).
#[derive(Debug, Clone)]
pub struct SortingResult {
    recording: RecordingInfo,
    sorting: SortingInfo,
    sparsity: Option<ChannelSparsity>,
    noise_levels: Option<NoiseLevels>,
    waveforms: Option<WaveformsExtension>,

    /// Dense templates with dimensions (num_units, num_samples,
    /// num_channels).
    templates: Option<Array3<f64>>,
}

impl SortingResult {
    pub fn new(
        recording: RecordingInfo,
        sorting: SortingInfo,
        sparsity: Option<ChannelSparsity>,
    ) -> Result<SortingResult, SourceError> {
        for (property, values) in &recording.properties {
            check_property_length(property, "channels", recording.channel_ids.len(), values)?;
        }
        for (property, values) in &sorting.properties {
            check_property_length(property, "units", sorting.unit_ids.len(), values)?;
        }
        if let Some(sparsity) = &sparsity {
            if sparsity.unit_ids() != sorting.unit_ids.as_slice() {
                return Err(SourceError::SparsityIdMismatch {
                    what: "unit",
                    kind: "SortingResult",
                });
            }
            if sparsity.channel_ids() != recording.channel_ids.as_slice() {
                return Err(SourceError::SparsityIdMismatch {
                    what: "channel",
                    kind: "SortingResult",
                });
            }
        }

        Ok(SortingResult {
            recording,
            sorting,
            sparsity,
            noise_levels: None,
            waveforms: None,
            templates: None,
        })
    }

    pub fn with_noise_levels(mut self, noise_levels: NoiseLevels) -> Result<SortingResult, SourceError> {
        let got = noise_levels.values.len();
        if got != self.recording.channel_ids.len() {
            return Err(SourceError::NoiseLevelCount {
                expected: self.recording.channel_ids.len(),
                got,
            });
        }
        self.noise_levels = Some(noise_levels);
        Ok(self)
    }

    pub fn with_waveforms(mut self, waveforms: WaveformsExtension) -> Result<SortingResult, SourceError> {
        if waveforms.num_units() != self.sorting.unit_ids.len() {
            return Err(SourceError::WaveformUnitCount {
                expected: self.sorting.unit_ids.len(),
                got: waveforms.num_units(),
            });
        }
        self.waveforms = Some(waveforms);
        Ok(self)
    }

    pub fn with_templates(mut self, templates: Array3<f64>) -> Result<SortingResult, SourceError> {
        let (num_units, num_samples, num_channels) = templates.dim();
        let expected = (
            self.sorting.unit_ids.len(),
            num_samples,
            self.recording.channel_ids.len(),
        );
        if (num_units, num_samples, num_channels) != expected {
            return Err(SourceError::TemplateShape {
                expected,
                got: templates.dim(),
            });
        }
        self.templates = Some(templates);
        Ok(self)
    }

    pub fn recording(&self) -> &RecordingInfo {
        &self.recording
    }

    pub fn sorting(&self) -> &SortingInfo {
        &self.sorting
    }
}

impl SparsitySource for SortingResult {
    fn kind(&self) -> &'static str {
        "SortingResult"
    }

    fn unit_ids(&self) -> &[Id] {
        &self.sorting.unit_ids
    }

    fn channel_ids(&self) -> &[Id] {
        &self.recording.channel_ids
    }

    fn sparsity(&self) -> Option<&ChannelSparsity> {
        self.sparsity.as_ref()
    }

    fn dense_templates(&self) -> Result<Array3<f64>, SourceError> {
        if let Some(templates) = &self.templates {
            return Ok(templates.clone());
        }
        match &self.waveforms {
            Some(waveforms) => {
                debug!("No templates extension; averaging templates from waveforms");
                waveforms.average_templates(&self.sorting.unit_ids, self.recording.channel_ids.len())
            }
            None => Err(SourceError::MissingExtension {
                kind: "SortingResult",
                extension: "templates",
            }),
        }
    }

    fn channel_locations(&self) -> Result<ArrayView2<f64>, SourceError> {
        self.recording
            .probe
            .as_ref()
            .ok_or(SourceError::NoProbe("recording"))?
            .channel_locations(self.recording.channel_ids.len())
    }

    fn noise_levels(&self) -> Option<&NoiseLevels> {
        self.noise_levels.as_ref()
    }

    fn waveforms(&self) -> Option<&WaveformsExtension> {
        self.waveforms.as_ref()
    }

    fn channel_property(&self, name: &str) -> Option<&[Id]> {
        trace!("Looking up recording property '{name}'");
        self.recording.properties.get(name).map(|v| v.as_slice())
    }

    fn unit_property(&self, name: &str) -> Option<&[Id]> {
        trace!("Looking up sorting property '{name}'");
        self.sorting.properties.get(name).map(|v| v.as_slice())
    }
}

fn check_property_length(
    property: &str,
    side: &'static str,
    expected: usize,
    values: &[Id],
) -> Result<(), SourceError> {
    if values.len() != expected {
        return Err(SourceError::PropertyLength {
            property: property.to_string(),
            side,
            expected,
            got: values.len(),
        });
    }
    Ok(())
}
