// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to read in sky-model source list files.

use std::{
    fs::File,
    io::BufReader,
    path::Path,
};

use log::{debug, trace};

use super::{
    bbs, type_from_extension, ReadSourceListError, SourceList, SourceListType,
};

/// Read a source list file, optionally with a given type. If the type isn't
/// given, it is guessed from the file extension, and failing that, all
/// parsers are attempted.
pub(crate) fn read_source_list_file(
    path: &Path,
    sl_type: Option<SourceListType>,
) -> Result<(SourceList, SourceListType), ReadSourceListError> {
    debug!("Attempting to read source list {}", path.display());
    if !path.exists() {
        return Err(ReadSourceListError::DoesntExist {
            path: path.to_path_buf().into_boxed_path(),
        });
    }

    let sl_type = sl_type.or_else(|| type_from_extension(path));

    match sl_type {
        Some(SourceListType::Yaml) => {
            let f = BufReader::new(File::open(path)?);
            let source_list = from_yaml(f)?;
            Ok((source_list, SourceListType::Yaml))
        }
        Some(SourceListType::Json) => {
            let f = BufReader::new(File::open(path)?);
            let source_list = from_json(f)?;
            Ok((source_list, SourceListType::Json))
        }
        Some(SourceListType::Bbs) => {
            let f = BufReader::new(File::open(path)?);
            let source_list = bbs::parse_source_list(f)?;
            Ok((source_list, SourceListType::Bbs))
        }
        None => {
            // An unhelpful extension; try all parsers.
            trace!("Unknown source-list extension; trying yaml, json, bbs in turn");
            if let Ok(source_list) = from_yaml(BufReader::new(File::open(path)?)) {
                return Ok((source_list, SourceListType::Yaml));
            }
            if let Ok(source_list) = from_json(BufReader::new(File::open(path)?)) {
                return Ok((source_list, SourceListType::Json));
            }
            if let Ok(source_list) = bbs::parse_source_list(BufReader::new(File::open(path)?)) {
                return Ok((source_list, SourceListType::Bbs));
            }
            Err(ReadSourceListError::UnknownType {
                path: path.to_path_buf().into_boxed_path(),
            })
        }
    }
}

pub(crate) fn from_yaml<R: std::io::BufRead>(
    reader: R,
) -> Result<SourceList, ReadSourceListError> {
    let source_list: SourceList = serde_yaml::from_reader(reader)?;
    validate(source_list)
}

pub(crate) fn from_json<R: std::io::BufRead>(
    reader: R,
) -> Result<SourceList, ReadSourceListError> {
    let source_list: SourceList = serde_json::from_reader(reader)?;
    validate(source_list)
}

/// Common sanity checks after deserialisation.
fn validate(source_list: SourceList) -> Result<SourceList, ReadSourceListError> {
    if source_list.is_empty() {
        return Err(ReadSourceListError::Empty);
    }
    for (name, source) in source_list.iter() {
        if source.components.is_empty() {
            return Err(ReadSourceListError::NoComponents { name: name.clone() });
        }
        for comp in source.components.iter() {
            let fd = comp.estimate_at_freq(150e6);
            if fd.i < 0.0 {
                return Err(ReadSourceListError::NegativeFluxDensity {
                    name: name.clone(),
                    i: fd.i,
                });
            }
        }
    }
    Ok(source_list)
}
