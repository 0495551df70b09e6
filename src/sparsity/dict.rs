// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The plain dictionary form of a [`super::ChannelSparsity`].

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{Display, EnumIter, EnumString};

use crate::Id;

/// A serialisable representation of channel sparsity. This is the only data
/// format that `chansparse` defines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparsityDict {
    /// All channel ids, in mask-column order.
    pub channel_ids: Vec<Id>,

    /// All unit ids, in mask-row order.
    pub unit_ids: Vec<Id>,

    /// Each unit id mapped to the ids of its active channels. Keys are
    /// always written as strings (not every format allows other key types),
    /// so integer unit ids come back as strings when deserialised. This
    /// table comes last so that toml can write it.
    #[serde(serialize_with = "serialize_stringified_keys")]
    pub unit_id_to_channel_ids: IndexMap<Id, Vec<Id>>,
}

/// File formats that a [`SparsityDict`] can be written to and read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum SparsityDictFileType {
    #[strum(serialize = "json")]
    Json,

    #[strum(serialize = "toml")]
    Toml,
}

#[derive(thiserror::Error, Debug)]
pub enum SparsityDictFileError {
    #[error("Sparsity file '{0}' doesn't have a recognised extension; valid extensions are: json, toml")]
    UnrecognisedExtension(String),

    #[error("Couldn't handle json for '{file}': {err}")]
    Json {
        file: String,
        err: serde_json::Error,
    },

    #[error("Couldn't decode toml from '{file}': {err}")]
    TomlDe { file: String, err: toml::de::Error },

    #[error("Couldn't encode sparsity as toml: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

impl SparsityDictFileType {
    pub fn from_path(path: &Path) -> Result<SparsityDictFileType, SparsityDictFileError> {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| e.parse().ok())
            .ok_or_else(|| SparsityDictFileError::UnrecognisedExtension(path.display().to_string()))
    }
}

impl SparsityDict {
    /// Write this dictionary to a file; the format is determined by the file
    /// extension.
    pub fn write(&self, path: &Path) -> Result<(), SparsityDictFileError> {
        let file_type = SparsityDictFileType::from_path(path)?;
        debug!("Writing sparsity as {file_type} to {}", path.display());
        let mut f = BufWriter::new(File::create(path)?);
        match file_type {
            SparsityDictFileType::Json => {
                serde_json::to_writer_pretty(&mut f, self).map_err(|err| {
                    SparsityDictFileError::Json {
                        file: path.display().to_string(),
                        err,
                    }
                })?;
            }
            SparsityDictFileType::Toml => {
                f.write_all(toml::to_string_pretty(self)?.as_bytes())?;
            }
        }
        f.flush()?;
        Ok(())
    }

    /// Read a dictionary from a file; the format is determined by the file
    /// extension.
    pub fn read(path: &Path) -> Result<SparsityDict, SparsityDictFileError> {
        let file_type = SparsityDictFileType::from_path(path)?;
        debug!("Reading sparsity as {file_type} from {}", path.display());
        let mut f = BufReader::new(File::open(path)?);
        match file_type {
            SparsityDictFileType::Json => {
                serde_json::from_reader(f).map_err(|err| SparsityDictFileError::Json {
                    file: path.display().to_string(),
                    err,
                })
            }
            SparsityDictFileType::Toml => {
                let mut contents = String::new();
                f.read_to_string(&mut contents)?;
                toml::from_str(&contents).map_err(|err| SparsityDictFileError::TomlDe {
                    file: path.display().to_string(),
                    err,
                })
            }
        }
    }
}

fn serialize_stringified_keys<S: Serializer>(
    map: &IndexMap<Id, Vec<Id>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(map.iter().map(|(unit_id, chan_ids)| (unit_id.to_string(), chan_ids)))
}
