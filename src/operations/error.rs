// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from corruption operations.

use thiserror::Error;

use crate::screens::ScreenError;

#[derive(Error, Debug)]
pub(crate) enum OpError {
    #[error("The tec operation's 'screen' method needs a screen_file")]
    MissingScreenFile,

    #[error("The phase centre is at {el_deg:.1}° elevation at timestep {timestep}; ionospheric screens need at least {min_el_deg:.0}°")]
    LowElevation {
        timestep: usize,
        el_deg: f64,
        min_el_deg: f64,
    },

    #[error("{op}: {message}")]
    BadParam { op: &'static str, message: String },

    #[error(transparent)]
    Screen(#[from] ScreenError),
}
