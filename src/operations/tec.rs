// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The ionospheric TEC operation: dispersive delays from differential TEC
//! along each station's line of sight.

use std::path::PathBuf;

use log::debug;
use ndarray::prelude::*;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{phase_to_jones, station_east_norths, OpError, OpOutput, Operation};
use crate::{
    constants::TEC_PHASE_CONST,
    context::Observation,
    screens::{self, pierce_point, turbulent_dtec_series},
    soltab::{SolTab, SolType},
};

/// Screens are unusable near the horizon.
const MIN_ELEVATION_DEG: f64 = 10.0;

/// How the differential TEC is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TecMethod {
    /// Per-station turbulent time series, scaled with distance from the
    /// array centre.
    Turbulence,

    /// Sample a rasterised screen (from the `tecscreen` tool) at each
    /// station's pierce point.
    Screen,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct TecConfig {
    pub(crate) method: TecMethod,

    /// The screen FITS file; required for the screen method.
    pub(crate) screen_file: Option<PathBuf>,

    /// The rms differential TEC at 10 km from the array centre \[TECU\].
    /// Only used by the turbulence method.
    pub(crate) rms_tecu: f64,

    pub(crate) seed: Option<u64>,
}

impl Default for TecConfig {
    fn default() -> Self {
        TecConfig {
            method: TecMethod::Turbulence,
            screen_file: None,
            rms_tecu: 0.05,
            seed: None,
        }
    }
}

pub(crate) struct TecOp {
    config: TecConfig,
    seed: u64,
}

impl TecOp {
    pub(crate) fn new(config: TecConfig, default_seed: u64) -> TecOp {
        let seed = config.seed.unwrap_or(default_seed);
        TecOp { config, seed }
    }

    /// The differential TEC per (time, station) \[TECU\].
    fn simulate_dtec(&self, obs: &Observation) -> Result<Array2<f64>, OpError> {
        let num_times = obs.timestamps.len();
        let num_stations = obs.num_stations();
        let east_norths = station_east_norths(obs);

        let mut dtec = Array2::zeros((num_times, num_stations));
        match self.config.method {
            TecMethod::Turbulence => {
                let mut rng = StdRng::seed_from_u64(self.seed);
                for (i_station, (east_m, north_m)) in east_norths.iter().enumerate() {
                    // Kolmogorov scaling: fluctuations grow with the 5/6
                    // power of the distance from the reference position.
                    let dist_m = east_m.hypot(*north_m).max(100.0);
                    let rms = self.config.rms_tecu * (dist_m / 10e3).powf(5.0 / 6.0);
                    let series = turbulent_dtec_series(&mut rng, num_times, rms);
                    dtec.slice_mut(s![.., i_station])
                        .iter_mut()
                        .zip(series)
                        .for_each(|(d, v)| *d = v);
                }
            }

            TecMethod::Screen => {
                let screen_file = self
                    .config
                    .screen_file
                    .as_ref()
                    .ok_or(OpError::MissingScreenFile)?;
                let cube = screens::fits::read(screen_file)?;
                debug!(
                    "Read a {}-plane, {}-pixel screen from {}",
                    cube.times.len(),
                    cube.spec.size,
                    screen_file.display()
                );
                for (i_time, timestamp) in obs.timestamps.iter().enumerate() {
                    let azel = obs.phase_centre_azel(*timestamp);
                    if azel.el.to_degrees() < MIN_ELEVATION_DEG {
                        return Err(OpError::LowElevation {
                            timestep: i_time,
                            el_deg: azel.el.to_degrees(),
                            min_el_deg: MIN_ELEVATION_DEG,
                        });
                    }
                    for (i_station, (east_m, north_m)) in east_norths.iter().enumerate() {
                        let (pp_east, pp_north) =
                            pierce_point(*east_m, *north_m, azel, cube.spec.height_m);
                        dtec[(i_time, i_station)] =
                            cube.sample(pp_east, pp_north, *timestamp)?;
                    }
                }
            }
        }

        // Make the TEC differential: remove the array-mean TEC each
        // timestep, which an interferometer cannot see.
        for mut row in dtec.outer_iter_mut() {
            let mean = row.mean().expect("at least one station");
            row.mapv_inplace(|v| v - mean);
        }
        Ok(dtec)
    }
}

impl Operation for TecOp {
    fn name(&self) -> &'static str {
        "tec"
    }

    fn simulate(&self, obs: &Observation) -> Result<OpOutput, OpError> {
        let dtec = self.simulate_dtec(obs)?;
        let (num_times, num_stations) = dtec.dim();

        let gains = Array3::from_shape_fn(
            (num_times, num_stations, obs.fine_chan_freqs.len()),
            |(i_t, i_s, i_f)| {
                let phase = -TEC_PHASE_CONST * dtec[(i_t, i_s)] / obs.fine_chan_freqs[i_f];
                phase_to_jones(phase)
            },
        );

        let soltab = SolTab {
            name: String::new(),
            sol_type: SolType::Tec,
            freqs: None,
            pols: vec![],
            values: dtec.insert_axis(Axis(2)).insert_axis(Axis(3)),
        };

        Ok(OpOutput {
            gains: Some(gains),
            noise_sigma_jy: None,
            soltabs: vec![(SolType::Tec, soltab)],
        })
    }
}
