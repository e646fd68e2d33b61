// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Simulation tool for the LOFAR radio telescope.

LoSiTo generates synthetic LOFAR observations with realistic
direction-independent corruptions. The [`operations`] module contains the
individual corruption simulators; everything else is plumbing to feed them
(observation contexts, sky models, ionospheric screens) and to record their
products (solution tables, visibilities).
 */

pub mod cli;
pub(crate) mod constants;
pub(crate) mod context;
pub(crate) mod io;
pub(crate) mod math;
pub(crate) mod model;
pub(crate) mod operations;
pub(crate) mod params;
pub(crate) mod parset;
pub(crate) mod screens;
pub(crate) mod skymodel;
pub(crate) mod soltab;
pub(crate) mod unit_parsing;

pub use cli::LositoError;

use crossbeam_utils::atomic::AtomicCell;

/// Are progress bars being drawn?
pub(crate) static PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);
