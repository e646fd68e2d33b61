// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code for sky-model source lists.

pub(crate) mod bbs;
pub(crate) mod generate;
pub(crate) mod read;
pub(crate) mod types;
mod write;

mod error;
#[cfg(test)]
mod tests;

pub(crate) use error::*;
pub(crate) use types::*;
pub(crate) use write::write_source_list;

use itertools::Itertools;
use strum::IntoEnumIterator;

/// All of the possible sky-model source list types.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum_macros::Display,
    strum_macros::EnumIter,
    strum_macros::EnumString,
)]
pub(crate) enum SourceListType {
    #[strum(serialize = "yaml")]
    Yaml,

    #[strum(serialize = "json")]
    Json,

    /// The LOFAR BBS/makesourcedb plain-text format.
    #[strum(serialize = "bbs")]
    Bbs,
}

lazy_static::lazy_static! {
    pub(crate) static ref SOURCE_LIST_TYPES_COMMA_SEPARATED: String =
        SourceListType::iter().join(", ");
}

/// Guess a source-list type from a file's extension.
pub(crate) fn type_from_extension(path: &std::path::Path) -> Option<SourceListType> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("yaml") | Some("yml") => Some(SourceListType::Yaml),
        Some("json") => Some(SourceListType::Json),
        Some("skymodel") | Some("txt") => Some(SourceListType::Bbs),
        _ => None,
    }
}
