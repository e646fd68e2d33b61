// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Solution tables: the recorded form of simulated corruptions.
//!
//! A solutions file carries the observation's station and time axes once,
//! plus one table per corruption. Tables are 4-dimensional (time, station,
//! frequency, polarisation); frequency-independent quantities (e.g. clock
//! delays) have a frequency axis of length 1.

pub(crate) mod fits;

mod error;
#[cfg(test)]
mod tests;

pub(crate) use error::*;

use hifitime::Epoch;
use itertools::Itertools;
use ndarray::prelude::*;
use strum::IntoEnumIterator;
use vec1::Vec1;

/// The quantity a solution table holds.
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
pub(crate) enum SolType {
    /// \[radians\]
    #[strum(serialize = "phase")]
    Phase,

    /// Dimensionless gain amplitudes.
    #[strum(serialize = "amplitude")]
    Amplitude,

    /// \[seconds\]
    #[strum(serialize = "clock")]
    Clock,

    /// \[TECU\]
    #[strum(serialize = "tec")]
    Tec,

    /// \[rad m⁻²\]
    #[strum(serialize = "rotationmeasure")]
    RotationMeasure,
}

lazy_static::lazy_static! {
    pub(crate) static ref SOL_TYPES_COMMA_SEPARATED: String = SolType::iter().join(", ");
}

/// One solution table.
#[derive(Debug, Clone)]
pub(crate) struct SolTab {
    /// e.g. "tec000".
    pub(crate) name: String,

    pub(crate) sol_type: SolType,

    /// The fine-channel frequencies, when the table varies with frequency
    /// \[Hz\].
    pub(crate) freqs: Option<Vec1<f64>>,

    /// Polarisation labels, e.g. \["XX", "YY"\]. Empty means the values
    /// apply to all polarisations (the polarisation axis has length 1).
    pub(crate) pols: Vec<String>,

    /// The solution values, (time, station, frequency, polarisation).
    pub(crate) values: Array4<f64>,
}

impl SolTab {
    /// Sanity-check the value dimensions against the axes.
    pub(crate) fn check_dims(
        &self,
        num_times: usize,
        num_stations: usize,
    ) -> Result<(), SolTabError> {
        let (n_t, n_s, n_f, n_p) = self.values.dim();
        let expected_freqs = self.freqs.as_ref().map(|f| f.len()).unwrap_or(1);
        let expected_pols = self.pols.len().max(1);
        if n_t != num_times || n_s != num_stations || n_f != expected_freqs || n_p != expected_pols
        {
            return Err(SolTabError::BadShape {
                name: self.name.clone(),
                dims: format!("({n_t}, {n_s}, {n_f}, {n_p})"),
                expected: format!(
                    "({num_times}, {num_stations}, {expected_freqs}, {expected_pols})"
                ),
            });
        }
        Ok(())
    }
}

/// All solution tables for one observation.
#[derive(Debug, Clone)]
pub(crate) struct Solutions {
    pub(crate) station_names: Vec1<String>,

    /// The centroid timestamps the solutions apply to.
    pub(crate) times: Vec1<Epoch>,

    pub(crate) soltabs: Vec<SolTab>,
}

impl Solutions {
    pub(crate) fn new(station_names: Vec1<String>, times: Vec1<Epoch>) -> Solutions {
        Solutions {
            station_names,
            times,
            soltabs: vec![],
        }
    }

    /// Add a table, naming it after its type and position ("tec000",
    /// "tec001", ...).
    pub(crate) fn push(&mut self, sol_type: SolType, soltab: SolTab) -> Result<(), SolTabError> {
        let index = self
            .soltabs
            .iter()
            .filter(|t| t.sol_type == sol_type)
            .count();
        let mut soltab = soltab;
        soltab.name = format!("{sol_type}{index:03}");
        soltab.check_dims(self.times.len(), self.station_names.len())?;
        self.soltabs.push(soltab);
        Ok(())
    }
}
