// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Corruption operations.
//!
//! Every operation simulates one instrumental or propagation effect for an
//! observation. Most yield per-station direction-independent Jones gains on
//! the (time, station, channel) grid; the noise operation instead yields a
//! per-channel visibility noise level. All of them record what they did as
//! solution tables.

pub(crate) mod bandpass;
pub(crate) mod clock;
pub(crate) mod faraday;
pub(crate) mod noise;
pub(crate) mod polmisalign;
pub(crate) mod tec;

mod error;
#[cfg(test)]
mod tests;

pub(crate) use error::OpError;

use itertools::Itertools;
use marlu::Jones;
use ndarray::{azip, prelude::*};
use strum::IntoEnumIterator;

use crate::{context::Observation, soltab::{SolTab, SolType}};

/// All of the possible operation types.
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
pub(crate) enum OperationType {
    #[strum(serialize = "tec")]
    Tec,

    #[strum(serialize = "clock")]
    Clock,

    #[strum(serialize = "faraday")]
    Faraday,

    #[strum(serialize = "polmisalign")]
    PolMisalign,

    #[strum(serialize = "bandpass")]
    Bandpass,

    #[strum(serialize = "noise")]
    Noise,
}

lazy_static::lazy_static! {
    pub(crate) static ref OPERATION_TYPES_COMMA_SEPARATED: String =
        OperationType::iter().join(", ");
}

/// What one operation contributes to the simulation.
pub(crate) struct OpOutput {
    /// Per-station direction-independent gains, (time, station, channel).
    /// `None` when the operation doesn't touch the signal chain (e.g.
    /// noise).
    pub(crate) gains: Option<Array3<Jones<f64>>>,

    /// Per-channel visibility noise standard deviation \[Jy\].
    pub(crate) noise_sigma_jy: Option<Vec<f64>>,

    /// Solution tables recording the corruption.
    pub(crate) soltabs: Vec<(SolType, SolTab)>,
}

/// A corruption operation.
pub(crate) trait Operation: Sync + Send {
    /// The operation's type name (e.g. "tec").
    fn name(&self) -> &'static str;

    /// Simulate this operation for an observation.
    fn simulate(&self, obs: &Observation) -> Result<OpOutput, OpError>;
}

/// Diagonal Jones gains from equal phases on both polarisations.
pub(crate) fn phase_to_jones(phase_rad: f64) -> Jones<f64> {
    let g = marlu::c64::cis(phase_rad);
    Jones::from([g, marlu::c64::new(0.0, 0.0), marlu::c64::new(0.0, 0.0), g])
}

/// Compose gains in application order: the later operation is applied
/// after (i.e. to the left of) the earlier ones.
pub(crate) fn compose_gains(
    total: &mut Array3<Jones<f64>>,
    op_gains: &Array3<Jones<f64>>,
) {
    azip!((total in &mut *total, &op in op_gains) *total = op * *total);
}

/// Parse a bundled two-column CSV table (frequency, value).
pub(crate) fn parse_two_column_table(raw: &str) -> (Vec<f64>, Vec<f64>) {
    let mut xs = vec![];
    let mut ys = vec![];
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut elems = line.split(',');
        if let (Some(x), Some(y)) = (elems.next(), elems.next()) {
            // The bundled tables are well formed; skip anything that isn't.
            if let (Ok(x), Ok(y)) = (x.trim().parse(), y.trim().parse()) {
                xs.push(x);
                ys.push(y);
            }
        }
    }
    (xs, ys)
}

/// The east/north components of every station's position, relative to the
/// array centre \[metres\]. Used to anchor screens and turbulence scaling.
pub(crate) fn station_east_norths(obs: &Observation) -> Vec<(f64, f64)> {
    let (s_lat, c_lat) = obs.array_position.latitude_rad.sin_cos();
    obs.station_xyzs
        .iter()
        .map(|xyz| {
            let enh = xyz.to_enh_inner(s_lat, c_lat);
            (enh.e, enh.n)
        })
        .collect()
}
