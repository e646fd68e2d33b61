// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Observation contexts: the stations, times, frequencies and pointing that
//! every simulation product hangs off.

mod error;
#[cfg(test)]
pub(crate) mod tests;

pub(crate) use error::ObsContextError;

use std::path::Path;

use hifitime::{Duration, Epoch};
use itertools::Itertools;
use marlu::{
    precession::get_lmst, AzEl, LatLngHeight, RADec, XyzGeocentric, XyzGeodetic,
};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use vec1::Vec1;

use crate::{
    constants::{LOFAR_HEIGHT_M, LOFAR_LAT_DEG, LOFAR_LONG_DEG},
    math::num_cross_baselines,
};

/// The bundled LOFAR station reference positions.
const LOFAR_STATION_TABLE: &str = include_str!("../../data/stations/lofar.csv");

/// Supported LOFAR antenna sets.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumIter,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Telescope {
    /// The low-band antennas (10-90 MHz).
    #[strum(serialize = "lba")]
    Lba,

    /// The high-band antennas (110-240 MHz).
    #[strum(serialize = "hba")]
    Hba,
}

impl Telescope {
    /// The suffix appended to station names for this antenna set.
    pub(crate) fn station_suffix(self) -> &'static str {
        match self {
            Telescope::Lba => "LBA",
            Telescope::Hba => "HBA",
        }
    }

    /// The default centre frequency of the band \[Hz\].
    pub(crate) fn default_centre_freq_hz(self) -> f64 {
        match self {
            Telescope::Lba => 54e6,
            Telescope::Hba => 150e6,
        }
    }
}

/// Which stations of the array to use.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumIter,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
pub(crate) enum StationSelection {
    /// Core stations only (shared clock).
    #[strum(serialize = "core")]
    Core,

    /// Remote stations only.
    #[strum(serialize = "remote")]
    Remote,

    /// All Dutch stations.
    #[strum(serialize = "all")]
    All,
}

lazy_static::lazy_static! {
    pub(crate) static ref TELESCOPES_COMMA_SEPARATED: String = Telescope::iter().join(", ");

    pub(crate) static ref STATION_SELECTIONS_COMMA_SEPARATED: String =
        StationSelection::iter().join(", ");
}

/// The Earth position of the LOFAR core.
pub(crate) fn lofar_array_position() -> LatLngHeight {
    LatLngHeight {
        longitude_rad: LOFAR_LONG_DEG.to_radians(),
        latitude_rad: LOFAR_LAT_DEG.to_radians(),
        height_metres: LOFAR_HEIGHT_M,
    }
}

/// Is this a core station (i.e. on the shared single-clock fibre)?
pub(crate) fn is_core_station(name: &str) -> bool {
    name.starts_with("CS")
}

/// Read the bundled station table, returning names and ITRF positions for
/// the wanted antenna set and station selection.
pub(crate) fn load_station_layout(
    telescope: Telescope,
    selection: StationSelection,
) -> Result<(Vec<String>, Vec<XyzGeocentric>), ObsContextError> {
    let mut names = vec![];
    let mut positions = vec![];
    for (i_line, line) in LOFAR_STATION_TABLE.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut elems = line.split(',');
        let (name, x, y, z) = match (elems.next(), elems.next(), elems.next(), elems.next()) {
            (Some(name), Some(x), Some(y), Some(z)) => (name, x, y, z),
            _ => return Err(ObsContextError::BadStationRow { line: i_line + 1 }),
        };
        let parse = |s: &str| -> Result<f64, ObsContextError> {
            s.trim()
                .parse()
                .map_err(|_| ObsContextError::BadStationRow { line: i_line + 1 })
        };
        let keep = match selection {
            StationSelection::Core => is_core_station(name),
            StationSelection::Remote => !is_core_station(name),
            StationSelection::All => true,
        };
        if !keep {
            continue;
        }
        names.push(format!("{name}{}", telescope.station_suffix()));
        positions.push(XyzGeocentric {
            x: parse(x)?,
            y: parse(y)?,
            z: parse(z)?,
        });
    }
    if names.is_empty() {
        return Err(ObsContextError::NoStations);
    }
    Ok((names, positions))
}

/// Everything needed to describe a simulated observation.
#[derive(Debug, Clone)]
pub(crate) struct Observation {
    /// Which antenna set is observing.
    pub(crate) telescope: Telescope,

    /// The names of the stations, e.g. "CS001LBA".
    pub(crate) station_names: Vec1<String>,

    /// The ITRF positions of the stations \[metres\].
    pub(crate) station_itrfs: Vec<XyzGeocentric>,

    /// The geodetic positions of the stations, ready for UVW calculations.
    pub(crate) station_xyzs: Vec<XyzGeodetic>,

    /// The Earth position of the array.
    pub(crate) array_position: LatLngHeight,

    /// The phase centre.
    pub(crate) phase_centre: RADec,

    /// The centroid timestamps of the observation.
    pub(crate) timestamps: Vec1<Epoch>,

    /// The time resolution.
    pub(crate) time_res: Duration,

    /// The centre frequency of each fine channel \[Hz\].
    pub(crate) fine_chan_freqs: Vec1<f64>,

    /// The frequency resolution of the fine channels \[Hz\].
    pub(crate) freq_res_hz: f64,

    /// UT1 - UTC.
    pub(crate) dut1: Duration,
}

impl Observation {
    pub(crate) fn num_stations(&self) -> usize {
        self.station_names.len()
    }

    pub(crate) fn num_cross_baselines(&self) -> usize {
        num_cross_baselines(self.num_stations())
    }

    /// The local mean sidereal time at a timestamp \[radians\].
    pub(crate) fn lst_rad(&self, timestamp: Epoch) -> f64 {
        get_lmst(self.array_position.longitude_rad, timestamp, self.dut1)
    }

    /// Where the phase centre is in the sky at a timestamp.
    pub(crate) fn phase_centre_azel(&self, timestamp: Epoch) -> AzEl {
        self.phase_centre
            .to_hadec(self.lst_rad(timestamp))
            .to_azel(self.array_position.latitude_rad)
    }

    /// Convert ITRF station positions to geodetic ones.
    pub(crate) fn itrfs_to_geodetic(
        itrfs: &[XyzGeocentric],
        array_position: LatLngHeight,
    ) -> Vec<XyzGeodetic> {
        let vec = XyzGeocentric::get_geocentric_vector(array_position);
        let (s_long, c_long) = array_position.longitude_rad.sin_cos();
        itrfs
            .iter()
            .map(|gc| gc.to_geodetic_inner(vec, s_long, c_long))
            .collect()
    }

    /// Read an observation descriptor file.
    pub(crate) fn from_descriptor_file(path: &Path) -> Result<Observation, ObsContextError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ObsContextError::DescriptorIo {
                path: path.to_path_buf().into_boxed_path(),
                err: e,
            })?;
        let descriptor: ObsDescriptor =
            toml::from_str(&contents).map_err(|e| ObsContextError::DescriptorParse {
                path: path.to_path_buf().into_boxed_path(),
                message: e.to_string(),
            })?;
        descriptor.into_observation()
    }

    /// Write an observation descriptor file.
    pub(crate) fn write_descriptor_file(&self, path: &Path) -> Result<(), ObsContextError> {
        let descriptor = ObsDescriptor::from_observation(self);
        let contents =
            toml::to_string_pretty(&descriptor).expect("descriptor serialisation cannot fail");
        std::fs::write(path, contents).map_err(|e| ObsContextError::DescriptorIo {
            path: path.to_path_buf().into_boxed_path(),
            err: e,
        })
    }
}

/// The on-disk form of an [`Observation`], written next to synthesised
/// measurement sets and consumed by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ObsDescriptor {
    pub(crate) telescope: Telescope,

    /// The phase centre right ascension \[degrees\].
    pub(crate) ra_deg: f64,

    /// The phase centre declination \[degrees\].
    pub(crate) dec_deg: f64,

    /// The first centroid timestamp \[GPS seconds\].
    pub(crate) start_time_gpst_s: f64,

    /// The time resolution \[seconds\].
    pub(crate) time_res_s: f64,

    pub(crate) num_timesteps: usize,

    /// The centre frequency of the first fine channel \[Hz\].
    pub(crate) first_freq_hz: f64,

    /// The frequency resolution \[Hz\].
    pub(crate) freq_res_hz: f64,

    pub(crate) num_channels: usize,

    /// UT1 - UTC \[seconds\].
    #[serde(default)]
    pub(crate) dut1_s: f64,

    #[serde(rename = "station")]
    pub(crate) stations: Vec<StationEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StationEntry {
    pub(crate) name: String,

    /// The ITRF position \[metres\].
    pub(crate) itrf: [f64; 3],
}

impl ObsDescriptor {
    pub(crate) fn from_observation(obs: &Observation) -> ObsDescriptor {
        ObsDescriptor {
            telescope: obs.telescope,
            ra_deg: obs.phase_centre.ra.to_degrees(),
            dec_deg: obs.phase_centre.dec.to_degrees(),
            start_time_gpst_s: obs.timestamps.first().to_gpst_seconds(),
            time_res_s: obs.time_res.to_seconds(),
            num_timesteps: obs.timestamps.len(),
            first_freq_hz: *obs.fine_chan_freqs.first(),
            freq_res_hz: obs.freq_res_hz,
            num_channels: obs.fine_chan_freqs.len(),
            dut1_s: obs.dut1.to_seconds(),
            stations: obs
                .station_names
                .iter()
                .zip(obs.station_itrfs.iter())
                .map(|(name, xyz)| StationEntry {
                    name: name.clone(),
                    itrf: [xyz.x, xyz.y, xyz.z],
                })
                .collect(),
        }
    }

    pub(crate) fn into_observation(self) -> Result<Observation, ObsContextError> {
        let ObsDescriptor {
            telescope,
            ra_deg,
            dec_deg,
            start_time_gpst_s,
            time_res_s,
            num_timesteps,
            first_freq_hz,
            freq_res_hz,
            num_channels,
            dut1_s,
            stations,
        } = self;

        if !(0.0..=360.0).contains(&ra_deg) {
            return Err(ObsContextError::RaInvalid);
        }
        if !(-90.0..=90.0).contains(&dec_deg) {
            return Err(ObsContextError::DecInvalid);
        }
        if freq_res_hz <= f64::EPSILON {
            return Err(ObsContextError::FreqResTooSmall);
        }
        if time_res_s <= f64::EPSILON {
            return Err(ObsContextError::TimeResTooSmall);
        }

        let time_res = Duration::from_seconds(time_res_s);
        let start = Epoch::from_gpst_seconds(start_time_gpst_s);
        let timestamps = Vec1::try_from_vec(
            (0..num_timesteps)
                .map(|i| start + time_res * i as i64)
                .collect(),
        )
        .map_err(|_| ObsContextError::ZeroTimesteps)?;
        let fine_chan_freqs = Vec1::try_from_vec(
            (0..num_channels)
                .map(|i| first_freq_hz + freq_res_hz * i as f64)
                .collect(),
        )
        .map_err(|_| ObsContextError::ZeroChannels)?;

        let (station_names, station_itrfs): (Vec<String>, Vec<XyzGeocentric>) = stations
            .into_iter()
            .map(|s| {
                (
                    s.name,
                    XyzGeocentric {
                        x: s.itrf[0],
                        y: s.itrf[1],
                        z: s.itrf[2],
                    },
                )
            })
            .unzip();
        let station_names =
            Vec1::try_from_vec(station_names).map_err(|_| ObsContextError::NoStations)?;
        let array_position = lofar_array_position();
        let station_xyzs = Observation::itrfs_to_geodetic(&station_itrfs, array_position);

        Ok(Observation {
            telescope,
            station_names,
            station_itrfs,
            station_xyzs,
            array_position,
            phase_centre: RADec::from_degrees(ra_deg, dec_deg),
            timestamps,
            time_res,
            fine_chan_freqs,
            freq_res_hz,
            dut1: Duration::from_seconds(dut1_s),
        })
    }
}
