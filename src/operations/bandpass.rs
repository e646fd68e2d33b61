// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The bandpass operation: frequency-dependent station amplitudes around
//! the bundled median bandpass of the receiving system.

use marlu::{c64, Jones};
use ndarray::prelude::*;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{parse_two_column_table, OpError, OpOutput, Operation};
use crate::{
    context::{Observation, Telescope},
    math::{linear_interp, sample_standard_normal},
    soltab::{SolTab, SolType},
};

const LBA_BANDPASS: &str = include_str!("../../data/bandpass/lba.csv");
const HBA_BANDPASS: &str = include_str!("../../data/bandpass/hba.csv");

/// The median bandpass amplitude of a telescope at a frequency.
pub(crate) fn median_bandpass(telescope: Telescope, freq_hz: f64) -> f64 {
    let raw = match telescope {
        Telescope::Lba => LBA_BANDPASS,
        Telescope::Hba => HBA_BANDPASS,
    };
    let (freqs, amps) = parse_two_column_table(raw);
    linear_interp(&freqs, &amps, freq_hz)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct BandpassConfig {
    /// The log-normal scatter of per-station gains around the median
    /// bandpass.
    pub(crate) scatter: f64,

    pub(crate) seed: Option<u64>,
}

impl Default for BandpassConfig {
    fn default() -> Self {
        BandpassConfig {
            scatter: 0.05,
            seed: None,
        }
    }
}

pub(crate) struct BandpassOp {
    config: BandpassConfig,
    seed: u64,
}

impl BandpassOp {
    pub(crate) fn new(config: BandpassConfig, default_seed: u64) -> BandpassOp {
        let seed = config.seed.unwrap_or(default_seed);
        BandpassOp { config, seed }
    }
}

impl Operation for BandpassOp {
    fn name(&self) -> &'static str {
        "bandpass"
    }

    fn simulate(&self, obs: &Observation) -> Result<OpOutput, OpError> {
        let num_times = obs.timestamps.len();
        let num_stations = obs.num_stations();
        let num_freqs = obs.fine_chan_freqs.len();
        let mut rng = StdRng::seed_from_u64(self.seed);

        let (table_freqs, table_amps) = parse_two_column_table(match obs.telescope {
            Telescope::Lba => LBA_BANDPASS,
            Telescope::Hba => HBA_BANDPASS,
        });

        // Per-station log-normal scatter, constant in time and frequency.
        let station_factors: Vec<f64> = (0..num_stations)
            .map(|_| (self.config.scatter * sample_standard_normal(&mut rng)).exp())
            .collect();
        let median: Vec<f64> = obs
            .fine_chan_freqs
            .iter()
            .map(|f| linear_interp(&table_freqs, &table_amps, *f))
            .collect();

        let amps =
            Array3::from_shape_fn((num_times, num_stations, num_freqs), |(_, i_s, i_f)| {
                median[i_f] * station_factors[i_s]
            });

        let gains = amps.mapv(|a| {
            Jones::from([
                c64::new(a, 0.0),
                c64::new(0.0, 0.0),
                c64::new(0.0, 0.0),
                c64::new(a, 0.0),
            ])
        });

        let soltab = SolTab {
            name: String::new(),
            sol_type: SolType::Amplitude,
            freqs: Some(obs.fine_chan_freqs.clone()),
            pols: vec![],
            values: amps.insert_axis(Axis(3)),
        };

        Ok(OpOutput {
            gains: Some(gains),
            noise_sigma_jy: None,
            soltabs: vec![(SolType::Amplitude, soltab)],
        })
    }
}
