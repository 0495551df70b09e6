// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The `chansparse` binary. Each subcommand has its own module.
//!
//! Subcommand arguments can come from the command line or a toml/json file,
//! so every non-flag argument is an `Option` and every flag is
//! `#[serde(default)]`.

#[macro_use]
mod common;
mod compute;
mod error;
mod estimate;
mod files;
mod info;

pub use error::ChansparseError;

use std::path::PathBuf;

use clap::{AppSettings, Args, Parser, Subcommand};
use itertools::Itertools;
use log::{debug, info};

use crate::{ChannelSparsity, PROGRESS_BARS};

// Add build-time information from the "built" crate.
include!(concat!(env!("OUT_DIR"), "/built.rs"));

#[derive(Debug, Parser)]
#[clap(
    version,
    author,
    about = "Estimate which recording channels carry each spike-sorted unit's signal"
)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
#[clap(disable_help_subcommand = true)]
#[clap(infer_subcommands = true)]
#[clap(propagate_version = true)]
#[clap(infer_long_args = true)]
pub struct Chansparse {
    #[clap(flatten)]
    global_opts: GlobalArgs,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Hide the per-unit progress bars.
    #[clap(long)]
    #[clap(global = true)]
    no_progress_bars: bool,

    /// Log more. -v shows debug messages, -vv trace messages and -vvv adds
    /// source lines.
    #[clap(short, long, parse(from_occurrences))]
    #[clap(global = true)]
    verbosity: u8,

    /// Read the inputs and report what would be done, but don't estimate or
    /// write a sparsity.
    #[clap(long)]
    #[clap(global = true)]
    dry_run: bool,

    /// Write the merged subcommand arguments to this toml file. It can be
    /// passed back as an arguments file.
    #[clap(long)]
    #[clap(global = true)]
    save_toml: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
#[clap(arg_required_else_help = true)]
enum Command {
    #[clap(about = "Compute the sparsity of templates with one of the sparsity methods.")]
    Compute(compute::ComputeArgs),

    #[clap(
        about = "Estimate sparsity from a recording and its spikes, averaging templates from a random subset of spikes."
    )]
    Estimate(estimate::EstimateArgs),

    #[clap(about = "Print the active channels of every unit in a sparsity file.")]
    Info(info::InfoArgs),
}

impl Chansparse {
    pub fn run(self) -> Result<(), ChansparseError> {
        // Set up logging.
        let GlobalArgs {
            verbosity,
            dry_run,
            no_progress_bars,
            save_toml,
        } = self.global_opts;
        setup_logging(verbosity)
            .map_err(|e| ChansparseError::Generic(format!("Failed to initialise logging: {e}")))?;
        // Enable progress bars if the user didn't say "no progress bars".
        if !no_progress_bars {
            PROGRESS_BARS.store(true);
        }

        // Print the version of chansparse and its build-time information.
        let sub_command = match &self.command {
            Command::Compute(_) => "compute",
            Command::Estimate(_) => "estimate",
            Command::Info(_) => "info",
        };
        info!("chansparse {} {}", sub_command, env!("CARGO_PKG_VERSION"));
        display_build_info();

        macro_rules! merge_save_run {
            ($args:expr) => {{
                let args = $args.merge()?;
                if let Some(toml) = save_toml {
                    use std::{
                        fs::File,
                        io::{BufWriter, Write},
                    };

                    let mut f = BufWriter::new(File::create(toml)?);
                    let toml_str = toml::to_string(&args).map_err(|e| {
                        ChansparseError::ArgFile(format!("Couldn't serialise arguments as toml: {e}"))
                    })?;
                    f.write_all(toml_str.as_bytes())?;
                }
                args.run(dry_run)?;
            }};
        }

        match self.command {
            Command::Compute(args) => merge_save_run!(args),
            Command::Estimate(args) => merge_save_run!(args),
            Command::Info(args) => args.run()?,
        }

        info!("chansparse {} complete.", sub_command);
        Ok(())
    }
}

/// Log a summary of a sparsity, then every unit's active channels.
fn log_sparsity(sparsity: &ChannelSparsity) {
    info!("{sparsity}");
    info!(
        "Max. number of active channels: {}",
        sparsity.max_num_active_channels()
    );
    for (unit_id, channel_ids) in sparsity.unit_id_to_channel_ids() {
        info!(
            "    Unit {unit_id:>4}: {:>3} channels [{}]",
            channel_ids.len(),
            channel_ids.iter().join(", ")
        );
    }
    debug!("Density: {}", sparsity.density());
}

/// Log to stdout at a level set by the number of -v flags. RUST_LOG is read
/// first; the -v level overrides it.
fn setup_logging(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stdout);
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Info),
        1 => builder.filter_level(log::LevelFilter::Debug),
        2 => builder.filter_level(log::LevelFilter::Trace),
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
            builder.format(|buf, record| {
                use std::io::Write;

                let timestamp = buf.timestamp();
                let level = record.level();
                let target = record.target();
                let line = record.line().unwrap_or(0);
                let message = record.args();

                writeln!(buf, "[{timestamp} {level} {target}:{line}] {message}")
            })
        }
    };
    builder.try_init()
}

/// Write info-level log lines of how this executable was compiled.
fn display_build_info() {
    info!("Compiled {} ({} profile)", BUILT_TIME_UTC, PROFILE);
    info!("         with compiler {}", RUSTC_VERSION);
    info!("");
}
