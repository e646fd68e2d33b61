// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parameters for each of the losito executables. "Parameters" are
//! validated and ready to be used, whereas the structs in [`crate::cli`]
//! are raw user inputs.

pub(crate) mod pipeline;
pub(crate) mod sky_model;
pub(crate) mod synth_ms;
pub(crate) mod tec_screen;

use std::path::PathBuf;

use vec1::Vec1;

use crate::io::write::VisOutputType;

/// Parameters for visibility outputs.
#[derive(Debug, Clone)]
pub(crate) struct OutputVisParams {
    /// The output files and their formats.
    pub(crate) output_files: Vec1<(PathBuf, VisOutputType)>,
}

/// Parameters controlling the sky modeller.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ModellingParams {
    pub(crate) apply_precession: bool,
}
