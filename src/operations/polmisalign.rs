// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The polarisation misalignment operation: a constant delay between each
//! station's X and Y signal chains.

use marlu::{c64, Jones};
use ndarray::prelude::*;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{OpError, OpOutput, Operation};
use crate::{
    constants::TAU,
    context::Observation,
    math::sample_standard_normal,
    soltab::{SolTab, SolType},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PolMisalignConfig {
    /// The rms of the per-station Y-versus-X delays \[seconds\].
    pub(crate) sigma_s: f64,

    pub(crate) seed: Option<u64>,
}

impl Default for PolMisalignConfig {
    fn default() -> Self {
        PolMisalignConfig {
            sigma_s: 1e-9,
            seed: None,
        }
    }
}

pub(crate) struct PolMisalignOp {
    config: PolMisalignConfig,
    seed: u64,
}

impl PolMisalignOp {
    pub(crate) fn new(config: PolMisalignConfig, default_seed: u64) -> PolMisalignOp {
        let seed = config.seed.unwrap_or(default_seed);
        PolMisalignOp { config, seed }
    }
}

impl Operation for PolMisalignOp {
    fn name(&self) -> &'static str {
        "polmisalign"
    }

    fn simulate(&self, obs: &Observation) -> Result<OpOutput, OpError> {
        let num_times = obs.timestamps.len();
        let num_stations = obs.num_stations();
        let mut rng = StdRng::seed_from_u64(self.seed);

        // The misalignment is constant in time.
        let delays: Vec<f64> = (0..num_stations)
            .map(|_| self.config.sigma_s * sample_standard_normal(&mut rng))
            .collect();

        let gains = Array3::from_shape_fn(
            (num_times, num_stations, obs.fine_chan_freqs.len()),
            |(_, i_s, i_f)| {
                let phase = TAU * obs.fine_chan_freqs[i_f] * delays[i_s];
                Jones::from([
                    c64::new(1.0, 0.0),
                    c64::new(0.0, 0.0),
                    c64::new(0.0, 0.0),
                    c64::cis(phase),
                ])
            },
        );

        // Record as phases per polarisation: X is the reference.
        let freqs = obs.fine_chan_freqs.clone();
        let values = Array4::from_shape_fn(
            (num_times, num_stations, freqs.len(), 2),
            |(_, i_s, i_f, i_p)| match i_p {
                0 => 0.0,
                _ => TAU * freqs[i_f] * delays[i_s],
            },
        );
        let soltab = SolTab {
            name: String::new(),
            sol_type: SolType::Phase,
            freqs: Some(freqs),
            pols: vec!["XX".to_string(), "YY".to_string()],
            values,
        };

        Ok(OpOutput {
            gains: Some(gains),
            noise_sigma_jy: None,
            soltabs: vec![(SolType::Phase, soltab)],
        })
    }
}
