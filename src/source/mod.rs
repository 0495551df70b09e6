// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to abstract over the things that sparsity can be estimated from.
//!
//! [`SparsitySource`] is a trait detailing the capabilities that sparsity
//! estimators need (templates, channel locations, noise levels, waveforms,
//! properties). There are two implementors:
//!
//! * [`Templates`], a set of average waveforms with some metadata; and
//! * [`SortingResult`], a sorting paired with its recording's metadata and
//!   any computed extensions (noise levels, waveforms, templates).
//!
//! Capabilities that an implementor doesn't have are reported as
//! [`SourceError`]s at this boundary, before an estimator does any work.

mod error;
mod sorting_result;
mod templates;

pub use error::SourceError;
pub use sorting_result::{NoiseLevels, RecordingInfo, SortingInfo, SortingResult, WaveformsExtension};
pub use templates::{Probe, Templates};

use indexmap::IndexMap;
use itertools::Itertools;
use lazy_static::lazy_static;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::{ChannelSparsity, Id};

lazy_static! {
    pub(crate) static ref PEAK_SIGNS_COMMA_SEPARATED: String = PeakSign::iter().join(", ");
}

/// Which part of a template counts as its peak.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PeakSign {
    /// The most negative value.
    #[default]
    #[strum(serialize = "neg")]
    Neg,

    /// The most positive value.
    #[strum(serialize = "pos")]
    Pos,

    /// The value with the largest magnitude.
    #[strum(serialize = "both")]
    Both,
}

/// A trait abstracting the things that channel sparsity can be estimated
/// from.
pub trait SparsitySource {
    /// A short name of the kind of source, used in messages.
    fn kind(&self) -> &'static str;

    fn unit_ids(&self) -> &[Id];

    fn channel_ids(&self) -> &[Id];

    /// The sparsity already attached to this source, if any. Some estimators
    /// require a dense source (i.e. this returns `None`).
    fn sparsity(&self) -> Option<&ChannelSparsity>;

    /// Get dense templates with dimensions (num_units, num_samples,
    /// num_channels). Channels outside of an attached sparsity are zero.
    fn dense_templates(&self) -> Result<Array3<f64>, SourceError>;

    /// Get the 2D location of every channel \[micrometres\]. The dimensions
    /// are (num_channels, 2).
    fn channel_locations(&self) -> Result<ArrayView2<f64>, SourceError>;

    /// Noise levels computed for this source, if there are any.
    fn noise_levels(&self) -> Option<&NoiseLevels> {
        None
    }

    /// Per-spike waveforms of every unit, if they've been extracted.
    fn waveforms(&self) -> Option<&WaveformsExtension> {
        None
    }

    /// The values of a named property of the channels (e.g. "group"), one per
    /// channel.
    fn channel_property(&self, _name: &str) -> Option<&[Id]> {
        None
    }

    /// The values of a named property of the units, one per unit.
    fn unit_property(&self, _name: &str) -> Option<&[Id]> {
        None
    }

    fn num_units(&self) -> usize {
        self.unit_ids().len()
    }

    fn num_channels(&self) -> usize {
        self.channel_ids().len()
    }

    /// The peak amplitude of every unit's template on every channel. The
    /// dimensions are (num_units, num_channels).
    fn template_amplitudes(&self, peak_sign: PeakSign) -> Result<Array2<f64>, SourceError> {
        let templates = self.dense_templates()?;
        Ok(template_amplitudes(templates.view(), peak_sign))
    }

    /// The index of every unit's extremum channel, i.e. the channel with the
    /// largest-magnitude peak.
    fn extremum_channel_indices(&self, peak_sign: PeakSign) -> Result<Vec<usize>, SourceError> {
        let amplitudes = self.template_amplitudes(peak_sign)?;
        Ok(extremum_channels(amplitudes.view()))
    }

    /// Split the channels into groups by the value of a channel property. The
    /// groups are in order of first appearance, and the channel indices of
    /// each group are ascending.
    fn channel_groups(&self, property: &str) -> Result<IndexMap<Id, Vec<usize>>, SourceError> {
        let values = self
            .channel_property(property)
            .ok_or_else(|| SourceError::MissingProperty {
                side: "recording",
                property: property.to_string(),
            })?;
        Ok(group_indices_by(values))
    }
}

/// Get the peak amplitude of every template on every channel. `templates` has
/// dimensions (num_units, num_samples, num_channels); the result has
/// dimensions (num_units, num_channels).
///
/// * [`PeakSign::Neg`]: the negated minimum
/// * [`PeakSign::Pos`]: the maximum
/// * [`PeakSign::Both`]: the maximum absolute value
pub fn template_amplitudes(templates: ArrayView3<f64>, peak_sign: PeakSign) -> Array2<f64> {
    let (num_units, num_samples, num_channels) = templates.dim();
    if num_samples == 0 {
        return Array2::zeros((num_units, num_channels));
    }
    match peak_sign {
        PeakSign::Neg => templates
            .fold_axis(Axis(1), f64::INFINITY, |&acc, &v| acc.min(v))
            .mapv_into(|v| -v),
        PeakSign::Pos => templates.fold_axis(Axis(1), f64::NEG_INFINITY, |&acc, &v| acc.max(v)),
        PeakSign::Both => templates.fold_axis(Axis(1), 0.0, |&acc, &v| acc.max(v.abs())),
    }
}

/// Get the peak-to-peak value (max - min over samples) of every template on
/// every channel.
pub fn template_ptps(templates: ArrayView3<f64>) -> Array2<f64> {
    let (num_units, num_samples, num_channels) = templates.dim();
    if num_samples == 0 {
        return Array2::zeros((num_units, num_channels));
    }
    let max = templates.fold_axis(Axis(1), f64::NEG_INFINITY, |&acc, &v| acc.max(v));
    let min = templates.fold_axis(Axis(1), f64::INFINITY, |&acc, &v| acc.min(v));
    max - min
}

/// For each row of amplitudes (one per unit), get the index of the
/// largest-magnitude value. Ties go to the lowest index.
pub fn extremum_channels(amplitudes: ArrayView2<f64>) -> Vec<usize> {
    amplitudes
        .outer_iter()
        .map(|unit_amps| {
            unit_amps
                .iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |(i_best, best), (i, &a)| {
                    if a.abs() > best {
                        (i, a.abs())
                    } else {
                        (i_best, best)
                    }
                })
                .0
        })
        .collect()
}

/// Group indices by their values. Groups are in order of first appearance.
pub(crate) fn group_indices_by(values: &[Id]) -> IndexMap<Id, Vec<usize>> {
    let mut groups: IndexMap<Id, Vec<usize>> = IndexMap::new();
    for (i, value) in values.iter().enumerate() {
        groups.entry(value.clone()).or_default().push(i);
    }
    groups
}
