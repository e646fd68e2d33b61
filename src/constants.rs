// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

All constants *must* be double precision. `losito` should do as many
calculations as possible in double precision before converting to a lower
precision, if it is ever required.
 */

pub(crate) use std::f64::consts::TAU;

pub(crate) use marlu::constants::VEL_C;

/// The Earth longitude of the LOFAR core \[degrees\].
pub(crate) const LOFAR_LONG_DEG: f64 = 6.869837;
/// The Earth latitude of the LOFAR core \[degrees\].
pub(crate) const LOFAR_LAT_DEG: f64 = 52.915122;
/// The Earth height of the LOFAR core \[metres\].
pub(crate) const LOFAR_HEIGHT_M: f64 = 49.344;

/// Dispersive phase constant \[rad Hz TECU⁻¹\]. The ionospheric phase on a
/// channel at frequency ν is -TEC_PHASE_CONST · dTEC / ν.
pub(crate) const TEC_PHASE_CONST: f64 = 8.44797245e9;

/// Faraday rotation measure per unit TEC and parallel magnetic field
/// \[rad m⁻² TECU⁻¹ T⁻¹\]: RM = FARADAY_CONST · dTEC · B∥.
pub(crate) const FARADAY_CONST: f64 = 2.62e3;

/// Default magnitude of the magnetic field component along the line of sight
/// \[tesla\]. Representative of the mid-latitude ionosphere.
pub(crate) const DEFAULT_B_PARALLEL_T: f64 = 4.5e-5;

/// When a sky-model component has a single flux density, this spectral index
/// is used for scaling to other frequencies.
pub(crate) const DEFAULT_SPEC_INDEX: f64 = -0.8;

/// Default height of the thin-layer ionospheric screen \[metres\].
pub(crate) const DEFAULT_SCREEN_HEIGHT_M: f64 = 200e3;

/// Default diffractive scale of the ionospheric turbulence \[metres\].
pub(crate) const DEFAULT_SCREEN_R0_M: f64 = 10e3;

/// Default outer scale of the ionospheric turbulence \[metres\].
pub(crate) const DEFAULT_SCREEN_OUTER_SCALE_M: f64 = 100e3;

/// Default frozen-flow velocity of the ionospheric screen \[m/s\].
pub(crate) const DEFAULT_SCREEN_VELOCITY_MPS: f64 = 20.0;
