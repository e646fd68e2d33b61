// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to write out sky-model source lists.

use std::{
    fs::File,
    io::BufWriter,
    path::Path,
};

use log::info;

use super::{
    bbs, type_from_extension, SourceList, SourceListType, WriteSourceListError,
};

/// Write a source list file in the given type. If the type isn't given, it
/// is guessed from the file extension.
pub(crate) fn write_source_list(
    sl: &SourceList,
    path: &Path,
    sl_type: Option<SourceListType>,
) -> Result<(), WriteSourceListError> {
    let sl_type = match sl_type.or_else(|| type_from_extension(path)) {
        Some(t) => t,
        None => {
            return Err(WriteSourceListError::UnknownType {
                path: path.to_path_buf().into_boxed_path(),
            })
        }
    };

    let mut f = BufWriter::new(File::create(path)?);
    match sl_type {
        SourceListType::Yaml => serde_yaml::to_writer(&mut f, sl)?,
        SourceListType::Json => serde_json::to_writer_pretty(&mut f, sl)?,
        SourceListType::Bbs => bbs::write_source_list(&mut f, sl)?,
    }

    info!(
        "Wrote {} sources to the {sl_type} source list {}",
        sl.len(),
        path.display()
    );
    Ok(())
}
