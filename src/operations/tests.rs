// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use marlu::Jones;
use ndarray::prelude::*;
use serial_test::serial;

use super::{
    bandpass::{BandpassConfig, BandpassOp},
    clock::{ClockConfig, ClockOp},
    faraday::{FaradayConfig, FaradayOp},
    noise::{station_sefd, NoiseConfig, NoiseOp},
    polmisalign::{PolMisalignConfig, PolMisalignOp},
    tec::{TecConfig, TecOp},
    *,
};
use crate::{
    constants::{TEC_PHASE_CONST, VEL_C},
    context::tests::simple_obs,
    screens::{fits as screen_fits, ScreenSpec, TecScreen, TecScreenCube},
};

#[test]
fn tec_phases_scale_inversely_with_frequency() {
    let obs = simple_obs(6, 4, 8);
    // A small rms keeps the phases away from the wrapping boundary, so
    // they can be compared directly.
    let config = TecConfig {
        rms_tecu: 0.002,
        ..Default::default()
    };
    let op = TecOp::new(config.clone(), 11);
    let out = op.simulate(&obs).unwrap();
    let gains = out.gains.unwrap();
    assert_eq!(gains.dim(), (4, 6, 8));

    // Recover the dTEC from the soltab, then check a gain phase against
    // the dispersive law on two channels.
    let (_, soltab) = &out.soltabs[0];
    let dtec = soltab.values[(2, 3, 0, 0)];
    let f0 = obs.fine_chan_freqs[0];
    let f5 = obs.fine_chan_freqs[5];
    let phase0 = gains[(2, 3, 0)][0].arg();
    let phase5 = gains[(2, 3, 5)][0].arg();
    assert_abs_diff_eq!(phase0, -TEC_PHASE_CONST * dtec / f0, epsilon = 1e-9);
    assert_abs_diff_eq!(phase5, -TEC_PHASE_CONST * dtec / f5, epsilon = 1e-9);

    // Differential TEC sums to zero over the array at every timestep.
    for i_t in 0..4 {
        let sum: f64 = (0..6).map(|i_s| soltab.values[(i_t, i_s, 0, 0)]).sum();
        assert_abs_diff_eq!(sum, 0.0, epsilon = 1e-12);
    }

    // Determinism.
    let out2 = TecOp::new(config, 11).simulate(&obs).unwrap();
    assert_abs_diff_eq!(
        soltab.values.as_slice().unwrap(),
        out2.soltabs[0].1.values.as_slice().unwrap(),
        epsilon = 1e-15
    );
}

// cfitsio may not be compiled thread-safe.
#[test]
#[serial(fitsio)]
fn tec_screen_method_samples_the_cube() {
    // A high-declination phase centre keeps the elevation usable from
    // LOFAR's latitude at any LST.
    let mut obs = simple_obs(6, 3, 4);
    obs.phase_centre = marlu::RADec::from_degrees(10.0, 89.0);

    let spec = ScreenSpec {
        size: 128,
        pixel_scale_m: 5000.0,
        height_m: 200e3,
        r0_m: 10e3,
        outer_scale_m: 100e3,
        velocity_east_mps: 20.0,
        velocity_north_mps: 5.0,
        seed: 3,
    };
    let screen = TecScreen::new(spec);
    let times: Vec<_> = obs.timestamps.iter().copied().collect();
    let cube = TecScreenCube {
        spec,
        data: screen.rasterise(times[0], &times),
        times,
    };
    let tmp_dir = tempfile::tempdir().unwrap();
    let screen_file = tmp_dir.path().join("screen.fits");
    screen_fits::write(&cube, &screen_file).unwrap();

    let op = TecOp::new(
        TecConfig {
            method: super::tec::TecMethod::Screen,
            screen_file: Some(screen_file),
            ..Default::default()
        },
        0,
    );
    let out = op.simulate(&obs).unwrap();
    let (_, soltab) = &out.soltabs[0];

    // Stations see different TEC, and the array mean is removed.
    let mut distinct = false;
    for i_t in 0..3 {
        let values: Vec<f64> = (0..6).map(|i_s| soltab.values[(i_t, i_s, 0, 0)]).collect();
        let sum: f64 = values.iter().sum();
        assert_abs_diff_eq!(sum, 0.0, epsilon = 1e-12);
        if values.iter().any(|v| (v - values[0]).abs() > 1e-9) {
            distinct = true;
        }
    }
    assert!(distinct, "screen sampling produced identical station TEC");
}

#[test]
fn missing_screen_file_is_an_error() {
    let obs = simple_obs(3, 1, 1);
    let op = TecOp::new(
        TecConfig {
            method: super::tec::TecMethod::Screen,
            ..Default::default()
        },
        0,
    );
    assert!(matches!(
        op.simulate(&obs),
        Err(OpError::MissingScreenFile)
    ));
}

#[test]
fn core_stations_share_the_clock() {
    // 26 stations spans the core/remote boundary of the bundled layout.
    let obs = simple_obs(26, 5, 2);
    let op = ClockOp::new(ClockConfig::default(), 5);
    let out = op.simulate(&obs).unwrap();
    let (_, soltab) = &out.soltabs[0];

    let mut saw_remote_delay = false;
    for (i_s, name) in obs.station_names.iter().enumerate() {
        for i_t in 0..5 {
            let delay = soltab.values[(i_t, i_s, 0, 0)];
            if name.starts_with("CS") {
                assert_abs_diff_eq!(delay, 0.0);
            } else if delay.abs() > 0.0 {
                saw_remote_delay = true;
            }
        }
    }
    assert!(saw_remote_delay);

    // With all_stations, core stations drift too.
    let op = ClockOp::new(
        ClockConfig {
            all_stations: true,
            ..Default::default()
        },
        5,
    );
    let out = op.simulate(&obs).unwrap();
    let (_, soltab) = &out.soltabs[0];
    let core_delay = soltab.values[(0, 0, 0, 0)];
    assert!(core_delay.abs() > 0.0);
}

#[test]
fn faraday_gains_are_rotations_with_lambda_squared_angles() {
    let obs = simple_obs(6, 2, 4);
    let op = FaradayOp::new(FaradayConfig::default(), 21);
    let out = op.simulate(&obs).unwrap();
    let gains = out.gains.unwrap();
    let (_, soltab) = &out.soltabs[0];

    for i_f in [0, 3] {
        let jones: Jones<f64> = gains[(1, 4, i_f)];
        // A real rotation matrix: orthogonal columns, unit determinant.
        let det = jones[0] * jones[3] - jones[1] * jones[2];
        assert_abs_diff_eq!(det.re, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(det.im, 0.0, epsilon = 1e-12);

        let lambda = VEL_C / obs.fine_chan_freqs[i_f];
        let expected_chi = soltab.values[(1, 4, 0, 0)] * lambda * lambda;
        let chi = f64::atan2(jones[2].re, jones[0].re);
        assert_abs_diff_eq!(chi, expected_chi, epsilon = 1e-9);
    }
}

#[test]
fn polmisalign_only_delays_y() {
    let obs = simple_obs(4, 2, 3);
    let op = PolMisalignOp::new(PolMisalignConfig::default(), 31);
    let out = op.simulate(&obs).unwrap();
    let gains = out.gains.unwrap();
    let (_, soltab) = &out.soltabs[0];
    assert_eq!(soltab.pols, ["XX", "YY"]);

    for i_s in 0..4 {
        for i_f in 0..3 {
            let jones = gains[(0, i_s, i_f)];
            assert_abs_diff_eq!(jones[0].re, 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(jones[0].im, 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(jones[3].norm(), 1.0, epsilon = 1e-12);
            // The XX phase record is zero; the YY record matches the gain.
            assert_abs_diff_eq!(soltab.values[(0, i_s, i_f, 0)], 0.0);
            // Compare wrapped phases.
            let recorded = soltab.values[(0, i_s, i_f, 1)];
            assert_abs_diff_eq!(
                jones[3].arg().sin(),
                recorded.sin(),
                epsilon = 1e-9
            );
        }
        // Constant in time.
        assert_abs_diff_eq!(
            soltab.values[(0, i_s, 1, 1)],
            soltab.values[(1, i_s, 1, 1)],
            epsilon = 1e-15
        );
    }
}

#[test]
fn bandpass_amplitudes_are_positive_and_deterministic() {
    let obs = simple_obs(5, 2, 6);
    let op = BandpassOp::new(BandpassConfig::default(), 41);
    let out = op.simulate(&obs).unwrap();
    let (_, soltab) = &out.soltabs[0];

    for v in soltab.values.iter() {
        assert!(*v > 0.0 && *v < 2.0, "bandpass amplitude {v} out of range");
    }

    let out2 = BandpassOp::new(BandpassConfig::default(), 41)
        .simulate(&obs)
        .unwrap();
    assert_abs_diff_eq!(
        soltab.values.as_slice().unwrap(),
        out2.soltabs[0].1.values.as_slice().unwrap(),
        epsilon = 1e-15
    );

    // The LBA dipole resonance: the bandpass at 58 MHz beats 30 MHz.
    assert!(
        median_bandpass_ratio() > 1.5,
        "the LBA bandpass should peak near the resonance"
    );
}

fn median_bandpass_ratio() -> f64 {
    use super::bandpass::median_bandpass;
    use crate::context::Telescope;
    median_bandpass(Telescope::Lba, 58e6) / median_bandpass(Telescope::Lba, 30e6)
}

#[test]
fn noise_follows_the_radiometer_equation() {
    let obs = simple_obs(4, 2, 3);
    let op = NoiseOp::new(NoiseConfig { factor: 2.0 });
    let out = op.simulate(&obs).unwrap();
    assert!(out.gains.is_none());
    assert!(out.soltabs.is_empty());

    let sigmas = out.noise_sigma_jy.unwrap();
    assert_eq!(sigmas.len(), 3);
    let dt = obs.time_res.to_seconds();
    let dnu = obs.freq_res_hz;
    for (sigma, freq) in sigmas.iter().zip(obs.fine_chan_freqs.iter()) {
        let expected = 2.0 * station_sefd(obs.telescope, *freq) / (2.0 * dt * dnu).sqrt();
        assert_abs_diff_eq!(*sigma, expected, epsilon = 1e-9);
    }

    assert!(matches!(
        NoiseOp::new(NoiseConfig { factor: -1.0 }).simulate(&obs),
        Err(OpError::BadParam { .. })
    ));
}

#[test]
fn gain_composition_applies_later_ops_on_the_left() {
    let diag = Jones::from([
        marlu::c64::new(2.0, 0.0),
        marlu::c64::new(0.0, 0.0),
        marlu::c64::new(0.0, 0.0),
        marlu::c64::new(1.0, 0.0),
    ]);
    let rot = Jones::from([
        marlu::c64::new(0.0, 0.0),
        marlu::c64::new(-1.0, 0.0),
        marlu::c64::new(1.0, 0.0),
        marlu::c64::new(0.0, 0.0),
    ]);

    let mut total = Array3::from_elem((1, 1, 1), diag);
    let op = Array3::from_elem((1, 1, 1), rot);
    compose_gains(&mut total, &op);

    // rot * diag, not diag * rot.
    let expected = rot * diag;
    let got: Jones<f64> = total[(0, 0, 0)];
    for i in 0..4 {
        assert_abs_diff_eq!(got[i].re, expected[i].re, epsilon = 1e-15);
        assert_abs_diff_eq!(got[i].im, expected[i].im, epsilon = 1e-15);
    }
}
