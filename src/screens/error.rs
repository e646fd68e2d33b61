// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors when generating, reading or sampling TEC screens.

use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum ScreenError {
    #[error("A pierce point at ({east_m:.0} m E, {north_m:.0} m N) falls off the {extent_m:.0} m screen; use a bigger --size or a higher elevation pointing")]
    PiercePointOffScreen {
        east_m: f64,
        north_m: f64,
        extent_m: f64,
    },

    #[error("The screen FITS file has {n_times} times but the cube's first axis is {n_planes}")]
    MismatchedTimes { n_times: usize, n_planes: usize },

    #[error("The screen cube must have at least one plane")]
    Empty,

    #[error("Screen sizes must be at least 2 pixels")]
    TooSmall,

    #[error("When rendering a TEC screen plot: {0}")]
    Plotting(String),

    #[error(transparent)]
    Fitsio(#[from] fitsio::errors::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
