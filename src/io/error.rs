// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! File input/output errors.

use std::path::PathBuf;

use thiserror::Error;

use super::write::VIS_OUTPUT_EXTENSIONS;

#[derive(Error, Debug)]
pub(crate) enum GlobError {
    #[error("No files matched the glob '{glob}'")]
    NoMatches { glob: String },

    #[error("More than one file matched the glob '{glob}', but only one may")]
    MoreThanOneMatch { glob: String },

    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    #[error(transparent)]
    GlobCrate(#[from] glob::GlobError),
}

#[derive(Error, Debug)]
pub(crate) enum VisWriteError {
    #[error("An invalid output format was specified ({0}). Supported: {}", *VIS_OUTPUT_EXTENSIONS)]
    InvalidOutputFormat(String),

    #[error(transparent)]
    FileWrite(#[from] FileWriteError),

    #[error(transparent)]
    UvfitsWrite(#[from] marlu::UvfitsWriteError),

    #[error(transparent)]
    MsWrite(#[from] marlu::io::MeasurementSetWriteError),

    #[error(transparent)]
    MarluIO(#[from] marlu::io::error::IOError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub(crate) enum FileWriteError {
    #[error("Cannot write to the specified file '{file}'. Do you have write permissions set?")]
    FileNotWritable { file: String },

    #[error(
        "Couldn't create directory '{0}' for output files. Do you have write permissions set?"
    )]
    NewDirectory(PathBuf),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
