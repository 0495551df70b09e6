// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use clap::Parser;

use super::{log_sparsity, ChansparseError};
use crate::{ChannelSparsity, SparsityDict};

#[derive(Parser, Debug, Clone)]
pub(super) struct InfoArgs {
    /// Path to a sparsity file (json or toml).
    #[clap(name = "SPARSITY_FILE", parse(from_os_str))]
    pub(super) file: PathBuf,
}

impl InfoArgs {
    pub(super) fn run(self) -> Result<(), ChansparseError> {
        let dict = SparsityDict::read(&self.file)?;
        let sparsity = ChannelSparsity::from_dict(&dict)?;
        log_sparsity(&sparsity);
        Ok(())
    }
}
