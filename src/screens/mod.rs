// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turbulent ionospheric TEC screens.
//!
//! A screen is a thin layer at a fixed height carrying differential-TEC
//! fluctuations with von Kármán statistics, advected across the array by
//! frozen flow. Rather than filtering white noise with an FFT, screens are
//! synthesised as a finite sum of randomised Fourier modes; this makes
//! frozen-flow translation exact at any time offset (each mode picks up a
//! phase shift) and lets the pipeline evaluate the screen at arbitrary
//! pierce points without rasterising first.

pub(crate) mod fits;
#[cfg(feature = "plotting")]
pub(crate) mod plot;

mod error;
#[cfg(test)]
mod tests;

pub(crate) use error::ScreenError;

use hifitime::Epoch;
use marlu::AzEl;
use ndarray::{parallel::prelude::*, prelude::*};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{TAU, TEC_PHASE_CONST},
    math::sample_standard_normal,
};

/// The frequency at which the diffractive scale r0 is defined \[Hz\].
pub(crate) const R0_REFERENCE_FREQ_HZ: f64 = 150e6;

/// The geometry and turbulence parameters of a screen. These are enough to
/// reproduce it exactly (generation is deterministic under the seed).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(crate) struct ScreenSpec {
    /// The number of pixels along one side of a rasterised screen.
    pub(crate) size: usize,

    /// Metres per pixel at the screen height.
    pub(crate) pixel_scale_m: f64,

    /// The height of the thin layer \[metres\].
    pub(crate) height_m: f64,

    /// The diffractive scale at 150 MHz \[metres\].
    pub(crate) r0_m: f64,

    /// The outer scale of the turbulence \[metres\].
    pub(crate) outer_scale_m: f64,

    /// The frozen-flow velocity, east component \[m/s\].
    pub(crate) velocity_east_mps: f64,

    /// The frozen-flow velocity, north component \[m/s\].
    pub(crate) velocity_north_mps: f64,

    /// The seed used for mode generation.
    pub(crate) seed: u64,
}

impl ScreenSpec {
    /// The physical extent of a rasterised screen \[metres\].
    pub(crate) fn extent_m(&self) -> f64 {
        self.size as f64 * self.pixel_scale_m
    }
}

/// One Fourier mode of the turbulent field.
#[derive(Debug, Clone, Copy)]
struct Mode {
    kx: f64,
    ky: f64,
    /// dTEC amplitude \[TECU\].
    amp: f64,
    phase: f64,
}

/// A realisation of a turbulent TEC screen, evaluable at any position and
/// time.
#[derive(Debug, Clone)]
pub(crate) struct TecScreen {
    pub(crate) spec: ScreenSpec,
    modes: Vec<Mode>,
}

/// Cap on the half-plane mode grid; beyond this the smallest scales are
/// below anything the pipeline samples.
const MAX_MODE_GRID: usize = 64;

impl TecScreen {
    /// Realise a screen from its spec.
    pub(crate) fn new(spec: ScreenSpec) -> TecScreen {
        let mut rng = StdRng::seed_from_u64(spec.seed);

        let n_k = spec.size.min(MAX_MODE_GRID) as i64;
        let dk = TAU / spec.extent_m();
        let k0 = TAU / spec.outer_scale_m;
        // Phase-spectrum normalisation at the r0 reference frequency; TEC
        // amplitudes follow by dividing out the dispersive constant.
        let phase_norm = 0.023 * spec.r0_m.powf(-5.0 / 3.0);
        let tec_per_rad = R0_REFERENCE_FREQ_HZ / TEC_PHASE_CONST;

        let mut modes = Vec::with_capacity((n_k * n_k / 2) as usize);
        for j in 0..=n_k / 2 {
            for i in -n_k / 2..=n_k / 2 {
                // Half-plane only: the other half is implied by the field
                // being real.
                if j == 0 && i <= 0 {
                    continue;
                }
                let kx = i as f64 * dk;
                let ky = j as f64 * dk;
                let k2 = kx * kx + ky * ky;
                let power = phase_norm * (k2 + k0 * k0).powf(-11.0 / 6.0);
                // Two Gaussian quadratures -> Rayleigh amplitude + uniform
                // phase; each half-plane mode carries double spectral power.
                let g1 = sample_standard_normal(&mut rng);
                let g2 = sample_standard_normal(&mut rng);
                let sigma = (2.0 * power * dk * dk).sqrt();
                modes.push(Mode {
                    kx,
                    ky,
                    amp: sigma * (g1 * g1 + g2 * g2).sqrt() * tec_per_rad,
                    phase: f64::atan2(g2, g1),
                });
            }
        }

        TecScreen { spec, modes }
    }

    /// The differential TEC at a position (east, north, metres from the
    /// screen centre) and a time offset from the screen epoch \[TECU\].
    pub(crate) fn dtec_at(&self, east_m: f64, north_m: f64, offset_s: f64) -> f64 {
        let x = east_m - self.spec.velocity_east_mps * offset_s;
        let y = north_m - self.spec.velocity_north_mps * offset_s;
        self.modes
            .iter()
            .map(|m| m.amp * (m.kx * x + m.ky * y - m.phase).cos())
            .sum()
    }

    /// Rasterise the screen at the given timestamps into a (time, y, x)
    /// cube.
    pub(crate) fn rasterise(&self, epoch: Epoch, times: &[Epoch]) -> Array3<f64> {
        let size = self.spec.size;
        let half_extent = self.spec.extent_m() / 2.0;
        let mut cube = Array3::zeros((times.len(), size, size));
        cube.outer_iter_mut()
            .into_par_iter()
            .zip(times.par_iter())
            .for_each(|(mut plane, time)| {
                let offset_s = (*time - epoch).to_seconds();
                plane.indexed_iter_mut().for_each(|((i_y, i_x), value)| {
                    let east_m = i_x as f64 * self.spec.pixel_scale_m - half_extent;
                    let north_m = i_y as f64 * self.spec.pixel_scale_m - half_extent;
                    *value = self.dtec_at(east_m, north_m, offset_s);
                });
            });
        cube
    }
}

/// A rasterised screen cube, as stored in a FITS file.
pub(crate) struct TecScreenCube {
    pub(crate) spec: ScreenSpec,

    /// The timestamps of the cube planes.
    pub(crate) times: Vec<Epoch>,

    /// dTEC values, (time, y, x) \[TECU\].
    pub(crate) data: Array3<f64>,
}

impl TecScreenCube {
    /// Sample the cube at a position (east, north, metres from the screen
    /// centre), bilinearly in space and at the nearest cube plane in time.
    pub(crate) fn sample(
        &self,
        east_m: f64,
        north_m: f64,
        timestamp: Epoch,
    ) -> Result<f64, ScreenError> {
        let i_time = self
            .times
            .iter()
            .enumerate()
            .min_by(|(_, t1), (_, t2)| {
                let d1 = (**t1 - timestamp).abs();
                let d2 = (**t2 - timestamp).abs();
                d1.partial_cmp(&d2).expect("durations are not NaN")
            })
            .map(|(i, _)| i)
            .expect("cube has at least one plane");

        let half_extent = self.spec.extent_m() / 2.0;
        let x = (east_m + half_extent) / self.spec.pixel_scale_m;
        let y = (north_m + half_extent) / self.spec.pixel_scale_m;
        let max = (self.spec.size - 1) as f64;
        if !(0.0..=max).contains(&x) || !(0.0..=max).contains(&y) {
            return Err(ScreenError::PiercePointOffScreen {
                east_m,
                north_m,
                extent_m: self.spec.extent_m(),
            });
        }

        let (x0, y0) = (x.floor() as usize, y.floor() as usize);
        let (x1, y1) = ((x0 + 1).min(self.spec.size - 1), (y0 + 1).min(self.spec.size - 1));
        let (fx, fy) = (x - x0 as f64, y - y0 as f64);
        let plane = self.data.index_axis(Axis(0), i_time);
        Ok(plane[(y0, x0)] * (1.0 - fx) * (1.0 - fy)
            + plane[(y0, x1)] * fx * (1.0 - fy)
            + plane[(y1, x0)] * (1.0 - fx) * fy
            + plane[(y1, x1)] * fx * fy)
    }
}

/// Where a line of sight at `azel` from a station at (east, north) pierces
/// a thin layer at `height_m`, in screen coordinates \[metres\].
pub(crate) fn pierce_point(station_east_m: f64, station_north_m: f64, azel: AzEl, height_m: f64) -> (f64, f64) {
    // A low-elevation line of sight runs off any finite screen; the
    // operations reject such pointings before getting here.
    let horizontal = height_m * (1.0 / azel.el.tan());
    (
        station_east_m + horizontal * azel.az.sin(),
        station_north_m + horizontal * azel.az.cos(),
    )
}

/// Generate a per-station turbulent dTEC time series directly, without a
/// screen: a damped random walk whose step size follows from the
/// requested rms. Used by the TEC operation's "turbulence" method.
pub(crate) fn turbulent_dtec_series(
    rng: &mut impl Rng,
    num_times: usize,
    rms_tecu: f64,
) -> Vec<f64> {
    // Mean-reverting so long series stay bounded around zero.
    const REVERSION: f64 = 0.05;
    let step = rms_tecu * (2.0 * REVERSION).sqrt();
    let mut series = Vec::with_capacity(num_times);
    let mut value = rms_tecu * sample_standard_normal(rng);
    for _ in 0..num_times {
        series.push(value);
        value += -REVERSION * value + step * sample_standard_normal(rng);
    }
    series
}
