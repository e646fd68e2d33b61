// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The noise operation: thermal visibility noise from the bundled SEFD
//! tables via the radiometer equation.

use serde::{Deserialize, Serialize};

use super::{parse_two_column_table, OpError, OpOutput, Operation};
use crate::{
    context::{Observation, Telescope},
    math::linear_interp,
};

const LBA_SEFD: &str = include_str!("../../data/sefd/lba.csv");
const HBA_SEFD: &str = include_str!("../../data/sefd/hba.csv");

/// The median station SEFD of a telescope at a frequency \[Jy\].
pub(crate) fn station_sefd(telescope: Telescope, freq_hz: f64) -> f64 {
    let raw = match telescope {
        Telescope::Lba => LBA_SEFD,
        Telescope::Hba => HBA_SEFD,
    };
    let (freqs, sefds) = parse_two_column_table(raw);
    linear_interp(&freqs, &sefds, freq_hz)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct NoiseConfig {
    /// Scale the noise level by this factor.
    pub(crate) factor: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        NoiseConfig { factor: 1.0 }
    }
}

pub(crate) struct NoiseOp {
    config: NoiseConfig,
}

impl NoiseOp {
    pub(crate) fn new(config: NoiseConfig) -> NoiseOp {
        NoiseOp { config }
    }
}

impl Operation for NoiseOp {
    fn name(&self) -> &'static str {
        "noise"
    }

    fn simulate(&self, obs: &Observation) -> Result<OpOutput, OpError> {
        if self.config.factor < 0.0 {
            return Err(OpError::BadParam {
                op: "noise",
                message: format!("factor must be non-negative, got {}", self.config.factor),
            });
        }

        // sigma = SEFD / sqrt(2 * dt * dnu), per baseline, per
        // polarisation.
        let dt = obs.time_res.to_seconds();
        let dnu = obs.freq_res_hz;
        let noise_sigma_jy = obs
            .fine_chan_freqs
            .iter()
            .map(|freq| {
                self.config.factor * station_sefd(obs.telescope, *freq)
                    / (2.0 * dt * dnu).sqrt()
            })
            .collect();

        Ok(OpOutput {
            gains: None,
            noise_sigma_jy: Some(noise_sigma_jy),
            soltabs: vec![],
        })
    }
}
