// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{
    common::ARG_FILE_HELP,
    compute::parse_peak_sign,
    files::{InputFileError, RecordingFile},
    log_sparsity, ChansparseError,
};
use crate::{
    constants::*, estimate_sparsity, recording::Recording, ComputeSparsityError,
    EstimateSparsityParams, SparsityMethod,
};

lazy_static::lazy_static! {
    static ref NUM_SPIKES_HELP: String =
        format!("The maximum number of spikes per unit averaged into its template. Default: {DEFAULT_NUM_SPIKES_FOR_SPARSITY}");

    static ref MS_BEFORE_HELP: String =
        format!("The cut-out before each spike [milliseconds]. Default: {DEFAULT_MS_BEFORE}");

    static ref MS_AFTER_HELP: String =
        format!("The cut-out after each spike [milliseconds]. Default: {DEFAULT_MS_AFTER}");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct EstimateArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    /// Path to the json recording file (traces, channel ids and locations,
    /// unit ids and spike trains).
    #[clap(short, long, parse(from_os_str), help_heading = "INPUT FILES")]
    pub(super) recording: Option<PathBuf>,

    /// The sparsity method; only radius and best_channels are supported.
    /// Default: radius
    #[clap(short, long, help_heading = "SPARSITY")]
    pub(super) method: Option<String>,

    /// Which part of a template counts as its peak. Default: neg
    #[clap(long, help_heading = "SPARSITY")]
    pub(super) peak_sign: Option<String>,

    #[clap(long, help = NUM_SPIKES_HELP.as_str(), help_heading = "TEMPLATES")]
    pub(super) num_spikes_for_sparsity: Option<usize>,

    #[clap(long, help = MS_BEFORE_HELP.as_str(), help_heading = "TEMPLATES")]
    pub(super) ms_before: Option<f64>,

    #[clap(long, help = MS_AFTER_HELP.as_str(), help_heading = "TEMPLATES")]
    pub(super) ms_after: Option<f64>,

    /// Used by the radius method [micrometres]. Default: 100
    #[clap(long, help_heading = "SPARSITY")]
    pub(super) radius_um: Option<f64>,

    /// Used by the best_channels method. Default: 5
    #[clap(long, help_heading = "SPARSITY")]
    pub(super) num_channels: Option<usize>,

    /// Write the sparsity to this file. Supported formats: json, toml.
    #[clap(short, long, parse(from_os_str), help_heading = "OUTPUT FILES")]
    pub(super) output: Option<PathBuf>,
}

impl EstimateArgs {
    /// Consolidate the command-line arguments with those in the argument file,
    /// preferring the command line.
    pub(super) fn merge(self) -> Result<EstimateArgs, ChansparseError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let EstimateArgs {
                args_file: _,
                recording,
                method,
                peak_sign,
                num_spikes_for_sparsity,
                ms_before,
                ms_after,
                radius_um,
                num_channels,
                output,
            } = unpack_arg_file!(arg_file);

            Ok(EstimateArgs {
                args_file: None,
                recording: cli_args.recording.or(recording),
                method: cli_args.method.or(method),
                peak_sign: cli_args.peak_sign.or(peak_sign),
                num_spikes_for_sparsity: cli_args
                    .num_spikes_for_sparsity
                    .or(num_spikes_for_sparsity),
                ms_before: cli_args.ms_before.or(ms_before),
                ms_after: cli_args.ms_after.or(ms_after),
                radius_um: cli_args.radius_um.or(radius_um),
                num_channels: cli_args.num_channels.or(num_channels),
                output: cli_args.output.or(output),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), ChansparseError> {
        debug!("{:#?}", self);

        let EstimateArgs {
            args_file: _,
            recording,
            method,
            peak_sign,
            num_spikes_for_sparsity,
            ms_before,
            ms_after,
            radius_um,
            num_channels,
            output,
        } = self;

        let defaults = EstimateSparsityParams::default();
        let method = match method {
            Some(m) => SparsityMethod::from_str(&m).map_err(|_| ComputeSparsityError::UnknownMethod(m))?,
            None => defaults.method,
        };
        let params = EstimateSparsityParams {
            num_spikes_for_sparsity: num_spikes_for_sparsity
                .unwrap_or(defaults.num_spikes_for_sparsity),
            ms_before: ms_before.unwrap_or(defaults.ms_before),
            ms_after: ms_after.unwrap_or(defaults.ms_after),
            method,
            peak_sign: parse_peak_sign(peak_sign)?,
            radius_um: radius_um.unwrap_or(defaults.radius_um),
            num_channels: num_channels.unwrap_or(defaults.num_channels),
        };

        let recording_path = recording.ok_or(InputFileError::NoFile("recording"))?;
        let (recording, sorting) =
            RecordingFile::read(&recording_path)?.into_recording_and_sorting(&recording_path)?;
        info!(
            "Recording: {} channels, {} segments, {} Hz; sorting: {} units",
            recording.num_channels(),
            recording.num_segments(),
            recording.sampling_frequency(),
            sorting.num_units()
        );
        info!("Sparsity method: {}", params.method);

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let sparsity = estimate_sparsity(&recording, &sorting, &params)?;
        log_sparsity(&sparsity);

        if let Some(output) = output {
            sparsity.to_dict().write(&output)?;
            info!("Sparsity written to {}", output.display());
        }
        Ok(())
    }
}
