// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Choosing and running a sparsity estimator by name.

mod error;

pub use error::ComputeSparsityError;

use std::str::FromStr;

use itertools::Itertools;
use lazy_static::lazy_static;
use log::debug;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    constants::{DEFAULT_NUM_CHANNELS, DEFAULT_RADIUS_UM, DEFAULT_THRESHOLD},
    estimators, ChannelSparsity, PeakSign, SparsitySource,
};

lazy_static! {
    pub static ref SPARSITY_METHODS_COMMA_SEPARATED: String = SparsityMethod::iter().join(", ");
}

/// All of the supported ways of estimating sparsity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, Serialize, Deserialize)]
pub enum SparsityMethod {
    /// Keep a fixed number of channels with the largest amplitudes.
    #[strum(serialize = "best_channels")]
    #[serde(rename = "best_channels")]
    BestChannels,

    /// Keep channels near the extremum channel.
    #[strum(serialize = "radius")]
    #[serde(rename = "radius")]
    Radius,

    /// Threshold the templates' signal-to-noise ratios.
    #[strum(serialize = "snr")]
    #[serde(rename = "snr")]
    Snr,

    /// Threshold the templates' peak-to-peak values relative to noise.
    #[strum(serialize = "ptp")]
    #[serde(rename = "ptp")]
    Ptp,

    /// Threshold the waveforms' energies relative to noise.
    #[strum(serialize = "energy")]
    #[serde(rename = "energy")]
    Energy,

    /// Group channels and units by a shared property.
    #[strum(serialize = "by_property")]
    #[serde(rename = "by_property")]
    ByProperty,
}

/// The parameters of every sparsity method. Each method only reads the ones
/// it needs; unset parameters that a method needs cause an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SparsityParams {
    /// Used by "best_channels", "radius" and "snr".
    pub peak_sign: PeakSign,

    /// Used by "best_channels".
    pub num_channels: Option<usize>,

    /// Used by "radius" \[micrometres\].
    pub radius_um: Option<f64>,

    /// Used by "snr", "ptp" and "energy".
    pub threshold: Option<f64>,

    /// The property used by "by_property".
    pub by_property: Option<String>,

    /// Scaled noise levels (one per channel) used by "snr" and "ptp". If
    /// these aren't set, the source's noise levels are used.
    pub noise_levels: Option<Vec<f64>>,
}

impl Default for SparsityParams {
    fn default() -> Self {
        SparsityParams {
            peak_sign: PeakSign::default(),
            num_channels: Some(DEFAULT_NUM_CHANNELS),
            radius_um: Some(DEFAULT_RADIUS_UM),
            threshold: Some(DEFAULT_THRESHOLD),
            by_property: None,
            noise_levels: None,
        }
    }
}

/// Estimate sparsity from `source` with the method named by `method` (one of
/// [`SparsityMethod`]'s strings, e.g. "radius").
///
/// The method name is checked first, then the parameters that the method
/// needs, and then the estimator's own requirements of the source.
pub fn compute_sparsity(
    source: &dyn SparsitySource,
    method: &str,
    params: &SparsityParams,
) -> Result<ChannelSparsity, ComputeSparsityError> {
    let method = SparsityMethod::from_str(method)
        .map_err(|_| ComputeSparsityError::UnknownMethod(method.to_string()))?;
    compute_sparsity_with_method(source, method, params)
}

/// Like [`compute_sparsity`], but with an already-parsed method.
pub fn compute_sparsity_with_method(
    source: &dyn SparsitySource,
    method: SparsityMethod,
    params: &SparsityParams,
) -> Result<ChannelSparsity, ComputeSparsityError> {
    let noise_levels = params.noise_levels.as_deref().map(ArrayView1::from);

    debug!(
        "Computing sparsity of a {} with the '{method}' method",
        source.kind()
    );
    let sparsity = match method {
        SparsityMethod::BestChannels => {
            let num_channels = require(params.num_channels, method, "num_channels")?;
            estimators::from_best_channels(source, num_channels, params.peak_sign)?
        }

        SparsityMethod::Radius => {
            let radius_um = require(params.radius_um, method, "radius_um")?;
            estimators::from_radius(source, radius_um, params.peak_sign)?
        }

        SparsityMethod::Snr => {
            let threshold = require(params.threshold, method, "threshold")?;
            estimators::from_snr(source, threshold, noise_levels, params.peak_sign)?
        }

        SparsityMethod::Ptp => {
            let threshold = require(params.threshold, method, "threshold")?;
            estimators::from_ptp(source, threshold, noise_levels)?
        }

        SparsityMethod::Energy => {
            let threshold = require(params.threshold, method, "threshold")?;
            estimators::from_energy(source, threshold)?
        }

        SparsityMethod::ByProperty => {
            let by_property = require(params.by_property.as_deref(), method, "by_property")?;
            estimators::from_property(source, by_property)?
        }
    };
    Ok(sparsity)
}

fn require<T>(
    value: Option<T>,
    method: SparsityMethod,
    parameter: &'static str,
) -> Result<T, ComputeSparsityError> {
    value.ok_or(ComputeSparsityError::MissingParameter { method, parameter })
}
