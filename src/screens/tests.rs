// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use hifitime::{Duration, Epoch};
use marlu::AzEl;
use rand::{rngs::StdRng, SeedableRng};
use serial_test::serial;

use super::*;

fn test_spec() -> ScreenSpec {
    ScreenSpec {
        size: 32,
        pixel_scale_m: 2000.0,
        height_m: 200e3,
        r0_m: 10e3,
        outer_scale_m: 50e3,
        velocity_east_mps: 20.0,
        velocity_north_mps: 0.0,
        seed: 123,
    }
}

#[test]
fn screens_are_deterministic_under_seed() {
    let s1 = TecScreen::new(test_spec());
    let s2 = TecScreen::new(test_spec());
    assert_abs_diff_eq!(s1.dtec_at(1234.0, -500.0, 10.0), s2.dtec_at(1234.0, -500.0, 10.0));

    let s3 = TecScreen::new(ScreenSpec {
        seed: 124,
        ..test_spec()
    });
    assert!((s1.dtec_at(0.0, 0.0, 0.0) - s3.dtec_at(0.0, 0.0, 0.0)).abs() > 1e-12);
}

#[test]
fn frozen_flow_translates_the_pattern() {
    let screen = TecScreen::new(test_spec());
    // After t seconds the pattern at x has moved to x + v*t.
    let v = test_spec().velocity_east_mps;
    let t = 25.0;
    assert_abs_diff_eq!(
        screen.dtec_at(0.0, 1000.0, 0.0),
        screen.dtec_at(v * t, 1000.0, t),
        epsilon = 1e-9
    );
}

#[test]
fn screen_mean_is_small_and_structure_grows_with_separation() {
    let screen = TecScreen::new(test_spec());
    let epoch = Epoch::from_gpst_seconds(1.3e9);
    let cube = screen.rasterise(epoch, &[epoch]);

    let mean = cube.mean().unwrap();
    let rms = (cube.mapv(|v| v * v).mean().unwrap()).sqrt();
    assert!(
        mean.abs() < 0.5 * rms.max(1e-9),
        "screen mean {mean} is not small relative to rms {rms}"
    );

    // The structure function over small vs large separations: turbulence
    // has more power on large scales.
    let plane = cube.index_axis(ndarray::Axis(0), 0);
    let mut d_small = 0.0;
    let mut d_large = 0.0;
    let n = plane.nrows();
    let mut count = 0.0;
    for y in 0..n {
        for x in 0..n - 8 {
            d_small += (plane[(y, x + 1)] - plane[(y, x)]).powi(2);
            d_large += (plane[(y, x + 8)] - plane[(y, x)]).powi(2);
            count += 1.0;
        }
    }
    assert!(d_large / count > d_small / count);
}

// cfitsio may not be compiled thread-safe.
#[test]
#[serial(fitsio)]
fn fits_round_trip() {
    let screen = TecScreen::new(test_spec());
    let epoch = Epoch::from_gpst_seconds(1.3e9);
    let times: Vec<Epoch> = (0..3)
        .map(|i| epoch + Duration::from_seconds(30.0) * i as i64)
        .collect();
    let cube = TecScreenCube {
        spec: test_spec(),
        data: screen.rasterise(epoch, &times),
        times,
    };

    let tmp_dir = tempfile::tempdir().unwrap();
    let file = tmp_dir.path().join("screen.fits");
    fits::write(&cube, &file).unwrap();
    let cube2 = fits::read(&file).unwrap();

    assert_eq!(cube.spec, cube2.spec);
    assert_eq!(cube.data.dim(), cube2.data.dim());
    assert_abs_diff_eq!(
        cube.data.as_slice().unwrap(),
        cube2.data.as_slice().unwrap(),
        epsilon = 1e-12
    );
    assert_abs_diff_eq!(
        cube.times[1].to_gpst_seconds(),
        cube2.times[1].to_gpst_seconds(),
        epsilon = 1e-6
    );
}

#[test]
fn cube_sampling_matches_pixels() {
    let screen = TecScreen::new(test_spec());
    let epoch = Epoch::from_gpst_seconds(1.3e9);
    let cube = TecScreenCube {
        spec: test_spec(),
        data: screen.rasterise(epoch, &[epoch]),
        times: vec![epoch],
    };

    // Sampling exactly on a pixel centre returns the pixel value.
    let half_extent = test_spec().extent_m() / 2.0;
    let pixel = test_spec().pixel_scale_m;
    let east = 5.0 * pixel - half_extent;
    let north = 7.0 * pixel - half_extent;
    let sampled = cube.sample(east, north, epoch).unwrap();
    assert_abs_diff_eq!(sampled, cube.data[(0, 7, 5)], epsilon = 1e-12);

    // Off-screen positions are rejected.
    assert!(cube.sample(1e9, 0.0, epoch).is_err());
}

#[test]
fn pierce_points_move_away_from_zenith() {
    let zenith = AzEl::from_radians(0.0, std::f64::consts::FRAC_PI_2);
    let (e, n) = pierce_point(100.0, 200.0, zenith, 200e3);
    assert_abs_diff_eq!(e, 100.0, epsilon = 1e-6);
    assert_abs_diff_eq!(n, 200.0, epsilon = 1e-6);

    // 45 degrees elevation due east: the pierce point is a screen-height
    // east of the station.
    let east_45 = AzEl::from_radians(std::f64::consts::FRAC_PI_2, std::f64::consts::FRAC_PI_4);
    let (e, n) = pierce_point(0.0, 0.0, east_45, 200e3);
    assert_abs_diff_eq!(e, 200e3, epsilon = 1e-3);
    assert_abs_diff_eq!(n, 0.0, epsilon = 1e-3);
}

#[test]
fn turbulent_series_is_bounded_and_deterministic() {
    let mut rng = StdRng::seed_from_u64(7);
    let series = turbulent_dtec_series(&mut rng, 1000, 0.1);
    assert_eq!(series.len(), 1000);
    let max = series.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    assert!(max < 1.0, "series wandered to {max} TECU");

    let mut rng = StdRng::seed_from_u64(7);
    let series2 = turbulent_dtec_series(&mut rng, 1000, 0.1);
    assert_eq!(series, series2);
}
