// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors when parsing quantities with units.

use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum UnitParseError {
    #[error("Successfully parsed a unit ({unit}) on '{input}', but could not parse the numerical component")]
    GotTimeUnitButCantParse { input: String, unit: &'static str },

    #[error("Successfully parsed a frequency unit on '{0}', but could not parse the numerical component")]
    GotFreqUnitButCantParse(String),

    #[error("Could not parse '{input}' as a number or quantity of {unit_type}")]
    Unknown {
        input: String,
        unit_type: &'static str,
    },
}
