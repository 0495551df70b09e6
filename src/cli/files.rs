// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The json input files understood by `chansparse`.

use std::{fs::File, io::BufReader, path::Path};

use indexmap::IndexMap;
use log::debug;
use ndarray::prelude::*;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::{
    recording::{InMemoryRecording, RecordingError, Sorting},
    source::{RecordingInfo, SortingInfo, SourceError},
    Id, Probe, SortingResult, SparsitySource, Templates,
};

#[derive(Error, Debug)]
pub enum InputFileError {
    #[error("No {0} file was supplied")]
    NoFile(&'static str),

    #[error("Couldn't decode json from '{file}': {err}")]
    Json {
        file: String,
        err: serde_json::Error,
    },

    #[error("The {what} in '{file}' don't all have the same dimensions")]
    Ragged { file: String, what: &'static str },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Recording(#[from] RecordingError),

    #[error("Couldn't open '{file}': {err}")]
    IO { file: String, err: std::io::Error },
}

/// Templates and the metadata needed to estimate sparsity from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesFile {
    /// Dense templates, indexed by unit, then sample, then channel.
    pub templates: Vec<Vec<Vec<f64>>>,

    /// \[Hz\]
    pub sampling_frequency: f64,

    pub nbefore: usize,

    pub channel_ids: Vec<Id>,

    pub unit_ids: Vec<Id>,

    /// One (x, y) position per channel \[micrometres\].
    #[serde(default)]
    pub channel_locations: Option<Vec<[f64; 2]>>,

    /// Scaled noise levels, one per channel.
    #[serde(default)]
    pub noise_levels: Option<Vec<f64>>,

    #[serde(default)]
    pub channel_properties: IndexMap<String, Vec<Id>>,

    #[serde(default)]
    pub unit_properties: IndexMap<String, Vec<Id>>,
}

impl TemplatesFile {
    pub fn read(path: &Path) -> Result<TemplatesFile, InputFileError> {
        read_json(path)
    }

    /// Turn the file's contents into something that sparsity can be estimated
    /// from. Without any properties, plain [`Templates`] suffice; otherwise a
    /// [`SortingResult`] carries them.
    pub fn into_source(self, path: &Path) -> Result<Box<dyn SparsitySource>, InputFileError> {
        // A file without units still has nbefore samples.
        let templates = nested_to_array3(&self.templates, (self.nbefore, self.channel_ids.len())).ok_or_else(
            || InputFileError::Ragged {
                file: path.display().to_string(),
                what: "templates",
            },
        )?;
        let probe = match self.channel_locations {
            Some(locations) => Some(Probe::new(Array2::from(locations))?),
            None => None,
        };

        if self.channel_properties.is_empty() && self.unit_properties.is_empty() {
            debug!("Using plain templates");
            Ok(Box::new(Templates::new(
                templates,
                self.sampling_frequency,
                self.nbefore,
                None,
                self.channel_ids,
                self.unit_ids,
                probe,
            )?))
        } else {
            debug!("Templates have properties; using a sorting result");
            let recording = RecordingInfo {
                channel_ids: self.channel_ids,
                sampling_frequency: self.sampling_frequency,
                probe,
                properties: self.channel_properties,
            };
            let sorting = SortingInfo {
                unit_ids: self.unit_ids,
                properties: self.unit_properties,
            };
            Ok(Box::new(
                SortingResult::new(recording, sorting, None)?.with_templates(templates)?,
            ))
        }
    }
}

/// A small recording held entirely in the file, along with its spikes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingFile {
    /// \[Hz\]
    pub sampling_frequency: f64,

    pub channel_ids: Vec<Id>,

    /// Indexed by segment, then sample, then channel.
    pub traces: Vec<Vec<Vec<f64>>>,

    /// One (x, y) position per channel \[micrometres\]. If given, these make
    /// up a single probe.
    #[serde(default)]
    pub channel_locations: Option<Vec<[f64; 2]>>,

    pub unit_ids: Vec<Id>,

    /// Spike sample indices, indexed by segment, then unit.
    pub spike_trains: Vec<Vec<Vec<usize>>>,
}

impl RecordingFile {
    pub fn read(path: &Path) -> Result<RecordingFile, InputFileError> {
        read_json(path)
    }

    pub fn into_recording_and_sorting(
        self,
        path: &Path,
    ) -> Result<(InMemoryRecording, Sorting), InputFileError> {
        let num_channels = self.channel_ids.len();
        let segments = self
            .traces
            .iter()
            .map(|segment| nested_to_array2(segment, num_channels))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| InputFileError::Ragged {
                file: path.display().to_string(),
                what: "traces",
            })?;
        let mut recording = InMemoryRecording::new(self.sampling_frequency, self.channel_ids, segments)?;
        if let Some(locations) = self.channel_locations {
            recording = recording.with_probes(vec![Probe::new(Array2::from(locations))?]);
        }
        let sorting = Sorting::from_spike_trains(self.unit_ids, &self.spike_trains)?;
        Ok((recording, sorting))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, InputFileError> {
    debug!("Reading {}", path.display());
    let f = BufReader::new(File::open(path).map_err(|err| InputFileError::IO {
        file: path.display().to_string(),
        err,
    })?);
    serde_json::from_reader(f).map_err(|err| InputFileError::Json {
        file: path.display().to_string(),
        err,
    })
}

/// Returns `None` if the rows don't all have the same length. If there are no
/// rows, the result has `num_columns_if_empty` columns.
fn nested_to_array2(nested: &[Vec<f64>], num_columns_if_empty: usize) -> Option<Array2<f64>> {
    let num_columns = nested.first().map(|r| r.len()).unwrap_or(num_columns_if_empty);
    if nested.iter().any(|r| r.len() != num_columns) {
        return None;
    }
    let flat = nested.iter().flatten().copied().collect();
    Array2::from_shape_vec((nested.len(), num_columns), flat).ok()
}

/// Returns `None` if the nested vectors don't make up a cuboid. If there are
/// no outer elements, the inner dimensions are `dims_if_empty`.
fn nested_to_array3(nested: &[Vec<Vec<f64>>], dims_if_empty: (usize, usize)) -> Option<Array3<f64>> {
    let dim1 = nested.first().map(|a| a.len()).unwrap_or(dims_if_empty.0);
    let dim2 = nested
        .first()
        .and_then(|a| a.first())
        .map(|b| b.len())
        .unwrap_or(dims_if_empty.1);
    if nested
        .iter()
        .any(|a| a.len() != dim1 || a.iter().any(|b| b.len() != dim2))
    {
        return None;
    }
    let flat = nested.iter().flatten().flatten().copied().collect();
    Array3::from_shape_vec((nested.len(), dim1, dim2), flat).ok()
}
