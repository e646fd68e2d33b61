// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The clock operation: station clock offsets and drifts.
//!
//! LOFAR's core stations share a single clock, so by default only remote
//! stations get offsets.

use ndarray::prelude::*;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{phase_to_jones, OpError, OpOutput, Operation};
use crate::{
    constants::TAU,
    context::{is_core_station, Observation},
    math::sample_standard_normal,
    soltab::{SolTab, SolType},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ClockConfig {
    /// The rms of the initial clock offsets \[seconds\].
    pub(crate) offset_sigma_s: f64,

    /// The rms of the random-walk step per root-second \[s/√s\].
    pub(crate) drift_sigma_s: f64,

    /// Also give core stations independent clocks.
    pub(crate) all_stations: bool,

    pub(crate) seed: Option<u64>,
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig {
            offset_sigma_s: 2e-8,
            drift_sigma_s: 1e-10,
            all_stations: false,
            seed: None,
        }
    }
}

pub(crate) struct ClockOp {
    config: ClockConfig,
    seed: u64,
}

impl ClockOp {
    pub(crate) fn new(config: ClockConfig, default_seed: u64) -> ClockOp {
        let seed = config.seed.unwrap_or(default_seed);
        ClockOp { config, seed }
    }

    /// The clock offset per (time, station) \[seconds\].
    fn simulate_delays(&self, obs: &Observation) -> Array2<f64> {
        let num_times = obs.timestamps.len();
        let num_stations = obs.num_stations();
        let dt_sqrt = obs.time_res.to_seconds().sqrt();
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut delays = Array2::zeros((num_times, num_stations));
        for (i_station, name) in obs.station_names.iter().enumerate() {
            if is_core_station(name) && !self.config.all_stations {
                continue;
            }
            let mut tau = self.config.offset_sigma_s * sample_standard_normal(&mut rng);
            for i_time in 0..num_times {
                delays[(i_time, i_station)] = tau;
                tau += self.config.drift_sigma_s * dt_sqrt * sample_standard_normal(&mut rng);
            }
        }
        delays
    }
}

impl Operation for ClockOp {
    fn name(&self) -> &'static str {
        "clock"
    }

    fn simulate(&self, obs: &Observation) -> Result<OpOutput, OpError> {
        let delays = self.simulate_delays(obs);
        let (num_times, num_stations) = delays.dim();

        let gains = Array3::from_shape_fn(
            (num_times, num_stations, obs.fine_chan_freqs.len()),
            |(i_t, i_s, i_f)| {
                phase_to_jones(TAU * obs.fine_chan_freqs[i_f] * delays[(i_t, i_s)])
            },
        );

        let soltab = SolTab {
            name: String::new(),
            sol_type: SolType::Clock,
            freqs: None,
            pols: vec![],
            values: delays.insert_axis(Axis(2)).insert_axis(Axis(3)),
        };

        Ok(OpOutput {
            gains: Some(gains),
            noise_sigma_jy: None,
            soltabs: vec![(SolType::Clock, soltab)],
        })
    }
}
