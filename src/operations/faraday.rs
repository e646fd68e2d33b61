// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The Faraday rotation operation: differential polarisation rotation from
//! the magnetised ionosphere.
//!
//! The rotation measure follows the same turbulent differential TEC the
//! `tec` operation models, coupled to a constant line-of-sight magnetic
//! field; the rotation angle scales with wavelength squared.

use marlu::{c64, Jones};
use ndarray::prelude::*;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{station_east_norths, OpError, OpOutput, Operation};
use crate::{
    constants::{DEFAULT_B_PARALLEL_T, FARADAY_CONST, VEL_C},
    context::Observation,
    screens::turbulent_dtec_series,
    soltab::{SolTab, SolType},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FaradayConfig {
    /// The rms differential TEC at 10 km from the array centre \[TECU\].
    pub(crate) rms_tecu: f64,

    /// The line-of-sight magnetic field \[tesla\].
    pub(crate) b_parallel_t: f64,

    pub(crate) seed: Option<u64>,
}

impl Default for FaradayConfig {
    fn default() -> Self {
        FaradayConfig {
            rms_tecu: 0.05,
            b_parallel_t: DEFAULT_B_PARALLEL_T,
            seed: None,
        }
    }
}

pub(crate) struct FaradayOp {
    config: FaradayConfig,
    seed: u64,
}

impl FaradayOp {
    pub(crate) fn new(config: FaradayConfig, default_seed: u64) -> FaradayOp {
        let seed = config.seed.unwrap_or(default_seed);
        FaradayOp { config, seed }
    }
}

/// A real rotation by `chi` \[radians\] as a Jones matrix.
fn rotation_jones(chi: f64) -> Jones<f64> {
    let (s, c) = chi.sin_cos();
    Jones::from([
        c64::new(c, 0.0),
        c64::new(-s, 0.0),
        c64::new(s, 0.0),
        c64::new(c, 0.0),
    ])
}

impl Operation for FaradayOp {
    fn name(&self) -> &'static str {
        "faraday"
    }

    fn simulate(&self, obs: &Observation) -> Result<OpOutput, OpError> {
        let num_times = obs.timestamps.len();
        let num_stations = obs.num_stations();
        let mut rng = StdRng::seed_from_u64(self.seed);

        // Rotation measure per (time, station) [rad/m^2].
        let mut rm = Array2::zeros((num_times, num_stations));
        for (i_station, (east_m, north_m)) in station_east_norths(obs).iter().enumerate() {
            let dist_m = east_m.hypot(*north_m).max(100.0);
            let rms = self.config.rms_tecu * (dist_m / 10e3).powf(5.0 / 6.0);
            let series = turbulent_dtec_series(&mut rng, num_times, rms);
            rm.slice_mut(s![.., i_station])
                .iter_mut()
                .zip(series)
                .for_each(|(r, dtec)| *r = FARADAY_CONST * dtec * self.config.b_parallel_t);
        }
        for mut row in rm.outer_iter_mut() {
            let mean = row.mean().expect("at least one station");
            row.mapv_inplace(|v| v - mean);
        }

        let gains = Array3::from_shape_fn(
            (num_times, num_stations, obs.fine_chan_freqs.len()),
            |(i_t, i_s, i_f)| {
                let lambda = VEL_C / obs.fine_chan_freqs[i_f];
                rotation_jones(rm[(i_t, i_s)] * lambda * lambda)
            },
        );

        let soltab = SolTab {
            name: String::new(),
            sol_type: SolType::RotationMeasure,
            freqs: None,
            pols: vec![],
            values: rm.insert_axis(Axis(2)).insert_axis(Axis(3)),
        };

        Ok(OpOutput {
            gains: Some(gains),
            noise_sigma_jy: None,
            soltabs: vec![(SolType::RotationMeasure, soltab)],
        })
    }
}
