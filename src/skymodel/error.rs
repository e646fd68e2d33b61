// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error types associated with sky-model source lists.

use std::path::Path;

use thiserror::Error;

use super::SOURCE_LIST_TYPES_COMMA_SEPARATED;

#[derive(Error, Debug)]
pub(crate) enum ReadSourceListError {
    #[error("Source list file '{path}' doesn't exist", path = path.display())]
    DoesntExist { path: Box<Path> },

    #[error("Couldn't determine the type of '{path}' from its extension; please specify one of: {}", *SOURCE_LIST_TYPES_COMMA_SEPARATED, path = path.display())]
    UnknownType { path: Box<Path> },

    #[error("Source {name} has no components")]
    NoComponents { name: String },

    #[error("Source {name} has a component with a negative Stokes I ({i} Jy)")]
    NegativeFluxDensity { name: String, i: f64 },

    #[error("Line {line}: {message}")]
    ParseLine { line: usize, message: String },

    #[error("The source list contains no sources")]
    Empty,

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub(crate) enum WriteSourceListError {
    #[error("Couldn't determine the type of '{path}' from its extension; please specify one of: {}", *SOURCE_LIST_TYPES_COMMA_SEPARATED, path = path.display())]
    UnknownType { path: Box<Path> },

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
