// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use hifitime::{Duration, Epoch};
use marlu::RADec;
use vec1::Vec1;

use super::*;

/// A small observation used by tests all over the crate.
pub(crate) fn simple_obs(num_stations: usize, num_timesteps: usize, num_channels: usize) -> Observation {
    let (all_names, all_itrfs) =
        load_station_layout(Telescope::Lba, StationSelection::All).unwrap();
    assert!(num_stations <= all_names.len());
    let station_names = Vec1::try_from_vec(all_names[..num_stations].to_vec()).unwrap();
    let station_itrfs = all_itrfs[..num_stations].to_vec();
    let array_position = lofar_array_position();
    let station_xyzs = Observation::itrfs_to_geodetic(&station_itrfs, array_position);

    let time_res = Duration::from_seconds(4.0);
    let start = Epoch::from_gpst_seconds(1_300_000_000.0);
    let timestamps =
        Vec1::try_from_vec((0..num_timesteps).map(|i| start + time_res * i as i64).collect())
            .unwrap();
    let freq_res_hz = 48828.125;
    let fine_chan_freqs = Vec1::try_from_vec(
        (0..num_channels).map(|i| 54e6 + freq_res_hz * i as f64).collect(),
    )
    .unwrap();

    Observation {
        telescope: Telescope::Lba,
        station_names,
        station_itrfs,
        station_xyzs,
        array_position,
        phase_centre: RADec::from_degrees(123.0, 52.0),
        timestamps,
        time_res,
        fine_chan_freqs,
        freq_res_hz,
        dut1: Duration::default(),
    }
}

#[test]
fn station_layout_selections() {
    let (all, _) = load_station_layout(Telescope::Lba, StationSelection::All).unwrap();
    let (core, _) = load_station_layout(Telescope::Lba, StationSelection::Core).unwrap();
    let (remote, _) = load_station_layout(Telescope::Hba, StationSelection::Remote).unwrap();

    assert_eq!(all.len(), core.len() + remote.len());
    assert!(core.iter().all(|n| n.starts_with("CS") && n.ends_with("LBA")));
    assert!(remote.iter().all(|n| n.starts_with("RS") && n.ends_with("HBA")));
}

#[test]
fn station_positions_are_near_the_core() {
    let (names, itrfs) = load_station_layout(Telescope::Lba, StationSelection::Core).unwrap();
    let xyzs = Observation::itrfs_to_geodetic(&itrfs, lofar_array_position());
    // Core stations are within a few km of the array reference position.
    for (name, xyz) in names.iter().zip(&xyzs) {
        let dist = (xyz.x.powi(2) + xyz.y.powi(2) + xyz.z.powi(2)).sqrt();
        assert!(dist < 5e3, "{name} is {dist} m from the array centre");
    }
}

#[test]
fn descriptor_round_trip() {
    let obs = simple_obs(5, 10, 16);
    let descriptor = ObsDescriptor::from_observation(&obs);
    let obs2 = descriptor.into_observation().unwrap();

    assert_eq!(obs.station_names, obs2.station_names);
    assert_eq!(obs.timestamps.len(), obs2.timestamps.len());
    assert_abs_diff_eq!(
        obs.timestamps.first().to_gpst_seconds(),
        obs2.timestamps.first().to_gpst_seconds(),
        epsilon = 1e-6
    );
    assert_abs_diff_eq!(obs.phase_centre.ra, obs2.phase_centre.ra, epsilon = 1e-12);
    assert_abs_diff_eq!(
        *obs.fine_chan_freqs.last(),
        *obs2.fine_chan_freqs.last(),
        epsilon = 1e-6
    );
}

#[test]
fn descriptor_file_round_trip() {
    let obs = simple_obs(3, 2, 4);
    let tmp = tempfile::Builder::new().suffix(".obs.toml").tempfile().unwrap();
    obs.write_descriptor_file(tmp.path()).unwrap();
    let obs2 = Observation::from_descriptor_file(tmp.path()).unwrap();
    assert_eq!(obs.station_names, obs2.station_names);
    assert_eq!(obs.num_cross_baselines(), obs2.num_cross_baselines());
}

#[test]
fn bad_descriptor_values_are_rejected() {
    let obs = simple_obs(3, 2, 4);
    let mut descriptor = ObsDescriptor::from_observation(&obs);
    descriptor.dec_deg = -100.0;
    assert!(matches!(
        descriptor.into_observation(),
        Err(ObsContextError::DecInvalid)
    ));

    let mut descriptor = ObsDescriptor::from_observation(&obs);
    descriptor.stations.clear();
    assert!(matches!(
        descriptor.into_observation(),
        Err(ObsContextError::NoStations)
    ));
}
