// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use hifitime::{Duration, Epoch};
use ndarray::prelude::*;
use serial_test::serial;
use vec1::{vec1, Vec1};

use super::*;

fn test_solutions() -> Solutions {
    let start = Epoch::from_gpst_seconds(1.3e9);
    let times = vec1![start, start + Duration::from_seconds(4.0)];
    let station_names = vec1![
        "CS001LBA".to_string(),
        "CS002LBA".to_string(),
        "RS106LBA".to_string()
    ];
    let mut sols = Solutions::new(station_names, times);

    sols.push(
        SolType::Tec,
        SolTab {
            name: String::new(),
            sol_type: SolType::Tec,
            freqs: None,
            pols: vec![],
            values: Array4::from_shape_fn((2, 3, 1, 1), |(t, s, _, _)| {
                0.01 * (t as f64 + 1.0) * (s as f64 - 1.0)
            }),
        },
    )
    .unwrap();

    let freqs = Vec1::try_from_vec((0..4).map(|i| 54e6 + 48828.125 * i as f64).collect()).unwrap();
    sols.push(
        SolType::Amplitude,
        SolTab {
            name: String::new(),
            sol_type: SolType::Amplitude,
            freqs: Some(freqs),
            pols: vec!["XX".to_string(), "YY".to_string()],
            values: Array4::from_elem((2, 3, 4, 2), 0.75),
        },
    )
    .unwrap();

    sols
}

#[test]
fn soltabs_are_named_by_type_and_index() {
    let mut sols = test_solutions();
    assert_eq!(sols.soltabs[0].name, "tec000");
    assert_eq!(sols.soltabs[1].name, "amplitude000");

    sols.push(
        SolType::Tec,
        SolTab {
            name: String::new(),
            sol_type: SolType::Tec,
            freqs: None,
            pols: vec![],
            values: Array4::zeros((2, 3, 1, 1)),
        },
    )
    .unwrap();
    assert_eq!(sols.soltabs[2].name, "tec001");
}

#[test]
fn bad_shapes_are_rejected() {
    let mut sols = test_solutions();
    let result = sols.push(
        SolType::Clock,
        SolTab {
            name: String::new(),
            sol_type: SolType::Clock,
            freqs: None,
            pols: vec![],
            // Wrong number of stations.
            values: Array4::zeros((2, 2, 1, 1)),
        },
    );
    assert!(matches!(result, Err(SolTabError::BadShape { .. })));
}

// cfitsio may not be compiled thread-safe.
#[test]
#[serial(fitsio)]
fn fits_round_trip() {
    let sols = test_solutions();
    let tmp_dir = tempfile::tempdir().unwrap();
    let file = tmp_dir.path().join("solutions.fits");
    fits::write(&sols, &file).unwrap();
    let sols2 = fits::read(&file).unwrap();

    assert_eq!(sols.station_names, sols2.station_names);
    assert_eq!(sols.soltabs.len(), sols2.soltabs.len());
    assert_abs_diff_eq!(
        sols.times.first().to_gpst_seconds(),
        sols2.times.first().to_gpst_seconds(),
        epsilon = 1e-6
    );

    for (t1, t2) in sols.soltabs.iter().zip(sols2.soltabs.iter()) {
        assert_eq!(t1.name, t2.name);
        assert_eq!(t1.sol_type, t2.sol_type);
        assert_eq!(t1.pols, t2.pols);
        assert_eq!(t1.values.dim(), t2.values.dim());
        assert_abs_diff_eq!(
            t1.values.as_slice().unwrap(),
            t2.values.as_slice().unwrap(),
            epsilon = 1e-12
        );
        match (&t1.freqs, &t2.freqs) {
            (Some(f1), Some(f2)) => {
                assert_abs_diff_eq!(f1.as_slice(), f2.as_slice(), epsilon = 1e-6)
            }
            (None, None) => (),
            _ => panic!("frequency axes did not round trip"),
        }
    }
}
