// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{
    common::ARG_FILE_HELP,
    files::{InputFileError, TemplatesFile},
    log_sparsity, ChansparseError,
};
use crate::{
    compute::{compute_sparsity_with_method, SPARSITY_METHODS_COMMA_SEPARATED},
    constants::{DEFAULT_NUM_CHANNELS, DEFAULT_RADIUS_UM, DEFAULT_THRESHOLD},
    source::PEAK_SIGNS_COMMA_SEPARATED,
    ComputeSparsityError, PeakSign, SparsityMethod, SparsityParams,
};

lazy_static::lazy_static! {
    static ref METHOD_HELP: String =
        format!("The sparsity method. Supported methods: {}. Default: radius", *SPARSITY_METHODS_COMMA_SEPARATED);

    static ref PEAK_SIGN_HELP: String =
        format!("Which part of a template counts as its peak. Supported values: {}. Default: {}", *PEAK_SIGNS_COMMA_SEPARATED, PeakSign::default());

    static ref NUM_CHANNELS_HELP: String =
        format!("The number of channels kept per unit by the best_channels method. Default: {DEFAULT_NUM_CHANNELS}");

    static ref RADIUS_HELP: String =
        format!("The radius around each unit's extremum channel used by the radius method [micrometres]. Default: {DEFAULT_RADIUS_UM}");

    static ref THRESHOLD_HELP: String =
        format!("The threshold used by the snr, ptp and energy methods [noise levels]. Default: {DEFAULT_THRESHOLD}");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct ComputeArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    /// Path to the json templates file.
    #[clap(short, long, parse(from_os_str), help_heading = "INPUT FILES")]
    pub(super) templates: Option<PathBuf>,

    #[clap(short, long, help = METHOD_HELP.as_str(), help_heading = "SPARSITY")]
    pub(super) method: Option<String>,

    #[clap(long, help = PEAK_SIGN_HELP.as_str(), help_heading = "SPARSITY")]
    pub(super) peak_sign: Option<String>,

    #[clap(long, help = NUM_CHANNELS_HELP.as_str(), help_heading = "SPARSITY")]
    pub(super) num_channels: Option<usize>,

    #[clap(long, help = RADIUS_HELP.as_str(), help_heading = "SPARSITY")]
    pub(super) radius_um: Option<f64>,

    #[clap(long, help = THRESHOLD_HELP.as_str(), help_heading = "SPARSITY")]
    pub(super) threshold: Option<f64>,

    /// The property that groups channels and units for the by_property
    /// method (e.g. "group").
    #[clap(long, help_heading = "SPARSITY")]
    pub(super) by_property: Option<String>,

    /// Write the sparsity to this file. Supported formats: json, toml. If this
    /// isn't given, the sparsity is only printed.
    #[clap(short, long, parse(from_os_str), help_heading = "OUTPUT FILES")]
    pub(super) output: Option<PathBuf>,
}

impl ComputeArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    pub(super) fn merge(self) -> Result<ComputeArgs, ChansparseError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let ComputeArgs {
                args_file: _,
                templates,
                method,
                peak_sign,
                num_channels,
                radius_um,
                threshold,
                by_property,
                output,
            } = unpack_arg_file!(arg_file);

            Ok(ComputeArgs {
                args_file: None,
                templates: cli_args.templates.or(templates),
                method: cli_args.method.or(method),
                peak_sign: cli_args.peak_sign.or(peak_sign),
                num_channels: cli_args.num_channels.or(num_channels),
                radius_um: cli_args.radius_um.or(radius_um),
                threshold: cli_args.threshold.or(threshold),
                by_property: cli_args.by_property.or(by_property),
                output: cli_args.output.or(output),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), ChansparseError> {
        debug!("{:#?}", self);

        let ComputeArgs {
            args_file: _,
            templates,
            method,
            peak_sign,
            num_channels,
            radius_um,
            threshold,
            by_property,
            output,
        } = self;

        let method_str = method.unwrap_or_else(|| SparsityMethod::Radius.to_string());
        let method = SparsityMethod::from_str(&method_str)
            .map_err(|_| ComputeSparsityError::UnknownMethod(method_str))?;
        let peak_sign = parse_peak_sign(peak_sign)?;

        let templates_path = templates.ok_or(InputFileError::NoFile("templates"))?;
        let templates_file = TemplatesFile::read(&templates_path)?;
        let params = SparsityParams {
            peak_sign,
            num_channels: num_channels.or(Some(DEFAULT_NUM_CHANNELS)),
            radius_um: radius_um.or(Some(DEFAULT_RADIUS_UM)),
            threshold: threshold.or(Some(DEFAULT_THRESHOLD)),
            by_property,
            noise_levels: templates_file.noise_levels.clone(),
        };
        let source = templates_file.into_source(&templates_path)?;
        info!(
            "Templates: {} units, {} channels",
            source.num_units(),
            source.num_channels()
        );
        info!("Sparsity method: {method}");

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let sparsity = compute_sparsity_with_method(source.as_ref(), method, &params)?;
        log_sparsity(&sparsity);

        if let Some(output) = output {
            sparsity.to_dict().write(&output)?;
            info!("Sparsity written to {}", output.display());
        }
        Ok(())
    }
}

pub(super) fn parse_peak_sign(peak_sign: Option<String>) -> Result<PeakSign, ChansparseError> {
    match peak_sign {
        None => Ok(PeakSign::default()),
        Some(s) => PeakSign::from_str(&s).map_err(|_| {
            ChansparseError::Compute(format!(
                "Peak sign '{s}' is not valid; supported values are: {}",
                *PEAK_SIGNS_COMMA_SEPARATED
            ))
        }),
    }
}
