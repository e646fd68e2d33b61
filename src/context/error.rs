// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors when building observation contexts.

use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum ObsContextError {
    #[error("Line {line} of the station table is malformed")]
    BadStationRow { line: usize },

    #[error("No stations remain after selection")]
    NoStations,

    #[error("Right Ascension was not within 0 to 360!")]
    RaInvalid,

    #[error("Declination was not within -90 to 90!")]
    DecInvalid,

    #[error("The frequency resolution cannot be 0 or negative!")]
    FreqResTooSmall,

    #[error("The time resolution cannot be 0 or negative!")]
    TimeResTooSmall,

    #[error("Number of timesteps cannot be 0!")]
    ZeroTimesteps,

    #[error("Number of fine channels cannot be 0!")]
    ZeroChannels,

    #[error("Couldn't read observation descriptor '{path}': {err}", path = path.display())]
    DescriptorIo {
        path: Box<Path>,
        err: std::io::Error,
    },

    #[error("Couldn't decode observation descriptor '{path}': {message}", path = path.display())]
    DescriptorParse { path: Box<Path>, message: String },
}
