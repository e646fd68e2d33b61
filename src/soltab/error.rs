// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors when reading or writing solution tables.

use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum SolTabError {
    #[error("Solution table {name} has dimensions {dims}, expected {expected}")]
    BadShape {
        name: String,
        dims: String,
        expected: String,
    },

    #[error("HDU {hdu} has an unrecognised SOLTYPE '{sol_type}'; expected one of: {}", *super::SOL_TYPES_COMMA_SEPARATED)]
    UnknownSolType { hdu: String, sol_type: String },

    #[error("The solutions file contains no solution tables")]
    Empty,

    #[error("The solutions file has no stations")]
    NoStations,

    #[error("The solutions file has no timestamps")]
    NoTimes,

    #[error(transparent)]
    Fitsio(#[from] fitsio::errors::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
