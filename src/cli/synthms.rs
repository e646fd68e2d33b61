// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The `synthms` executable: synthesise an empty measurement set and the
//! observation descriptor that the pipeline consumes.

use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use hifitime::Duration;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use vec1::Vec1;

use super::{
    common::{display_warnings, parse_iso_utc, save_args_toml, InfoPrinter, ARG_FILE_HELP},
    startup, GlobalArgs, LositoError, Warn,
};
use crate::{
    context::{
        load_station_layout, lofar_array_position, Observation, StationSelection, Telescope,
        STATION_SELECTIONS_COMMA_SEPARATED, TELESCOPES_COMMA_SEPARATED,
    },
    io::write::vis_output_type_from_path,
    math::num_cross_baselines,
    params::{synth_ms::SynthMsParams, OutputVisParams},
    unit_parsing::{parse_freq, parse_time},
};

const DEFAULT_NAME: &str = "sim";
const DEFAULT_TIME_RES: &str = "4s";
const DEFAULT_DURATION: &str = "1h";
const DEFAULT_NUM_CHANNELS: usize = 64;
const DEFAULT_FREQ_RES: &str = "48.828125kHz";

lazy_static::lazy_static! {
    static ref TELESCOPE_HELP: String =
        format!("Which antenna set to observe with. Supported: {}. Default: lba", *TELESCOPES_COMMA_SEPARATED);

    static ref STATIONS_HELP: String =
        format!("Which stations to include. Supported: {}. Default: all", *STATION_SELECTIONS_COMMA_SEPARATED);

    static ref TIME_RES_HELP: String =
        format!("The correlator integration time (e.g. 2s). Default: {DEFAULT_TIME_RES}");

    static ref DURATION_HELP: String =
        format!("The observation length (e.g. 4h). Default: {DEFAULT_DURATION}");

    static ref NUM_CHANNELS_HELP: String =
        format!("The total number of fine channels. Default: {DEFAULT_NUM_CHANNELS}");

    static ref FREQ_RES_HELP: String =
        format!("The fine-channel resolution (e.g. 195.3125kHz). Default: {DEFAULT_FREQ_RES}");

    static ref OUTPUTS_HELP: String =
        format!("Paths to the output visibility files (.ms and/or .uvfits). Default: <NAME>.ms");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct SynthmsCliArgs {
    /// A name for the simulated observation; used for default output
    /// filenames.
    #[clap(long, help_heading = "OBSERVATION PARAMETERS")]
    name: Option<String>,

    #[clap(short, long, help = TELESCOPE_HELP.as_str(), help_heading = "OBSERVATION PARAMETERS")]
    telescope: Option<String>,

    #[clap(long, help = STATIONS_HELP.as_str(), help_heading = "OBSERVATION PARAMETERS")]
    stations: Option<String>,

    /// The phase centre right ascension [degrees].
    #[clap(short, long, help_heading = "OBSERVATION PARAMETERS")]
    ra: Option<f64>,

    /// The phase centre declination [degrees].
    #[clap(short, long, allow_hyphen_values = true, help_heading = "OBSERVATION PARAMETERS")]
    dec: Option<f64>,

    /// The observation start (UTC), e.g. 2022-01-01T00:00:00.
    #[clap(long, help_heading = "OBSERVATION PARAMETERS")]
    start_time: Option<String>,

    #[clap(long, help = DURATION_HELP.as_str(), help_heading = "OBSERVATION PARAMETERS")]
    duration: Option<String>,

    #[clap(long, help = TIME_RES_HELP.as_str(), help_heading = "OBSERVATION PARAMETERS")]
    time_res: Option<String>,

    #[clap(short = 'c', long, help = NUM_CHANNELS_HELP.as_str(), help_heading = "OBSERVATION PARAMETERS")]
    num_channels: Option<usize>,

    #[clap(short, long, help = FREQ_RES_HELP.as_str(), help_heading = "OBSERVATION PARAMETERS")]
    freq_res: Option<String>,

    /// The centroid frequency of the band [MHz]. The default depends on
    /// the antenna set (54 for LBA, 150 for HBA).
    #[clap(long, help_heading = "OBSERVATION PARAMETERS")]
    centre_freq: Option<f64>,

    /// Use this value as the DUT1 [seconds].
    #[clap(long, help_heading = "OBSERVATION PARAMETERS")]
    dut1: Option<f64>,

    #[clap(
        short = 'o',
        long,
        multiple_values(true),
        help = OUTPUTS_HELP.as_str(),
        help_heading = "OUTPUT FILES"
    )]
    outputs: Option<Vec<PathBuf>>,

    /// Path to the output observation descriptor. Default: <NAME>.obs.toml
    #[clap(long, help_heading = "OUTPUT FILES")]
    obsfile: Option<PathBuf>,
}

impl SynthmsCliArgs {
    fn merge(self, other: Self) -> Self {
        Self {
            name: self.name.or(other.name),
            telescope: self.telescope.or(other.telescope),
            stations: self.stations.or(other.stations),
            ra: self.ra.or(other.ra),
            dec: self.dec.or(other.dec),
            start_time: self.start_time.or(other.start_time),
            duration: self.duration.or(other.duration),
            time_res: self.time_res.or(other.time_res),
            num_channels: self.num_channels.or(other.num_channels),
            freq_res: self.freq_res.or(other.freq_res),
            centre_freq: self.centre_freq.or(other.centre_freq),
            dut1: self.dut1.or(other.dut1),
            outputs: self.outputs.or(other.outputs),
            obsfile: self.obsfile.or(other.obsfile),
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    version,
    author,
    about = "Synthesise an empty LOFAR measurement set and its observation descriptor."
)]
pub struct Synthms {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    args_file: Option<PathBuf>,

    #[clap(flatten)]
    ms_args: SynthmsCliArgs,

    #[clap(flatten)]
    global: GlobalArgs,
}

impl Synthms {
    fn merge(self) -> Result<(SynthmsCliArgs, GlobalArgs), LositoError> {
        debug!("Merging command-line arguments with the argument file");
        let Synthms {
            args_file,
            ms_args,
            global,
        } = self;
        match args_file {
            Some(args_file) => {
                let file_args: SynthmsCliArgs = unpack_arg_file!(args_file);
                Ok((ms_args.merge(file_args), global))
            }
            None => Ok((ms_args, global)),
        }
    }

    pub fn run(self) -> Result<(), LositoError> {
        let dry_run = startup("synthms", &self.global);
        let (args, global) = self.merge()?;
        trace!("{:#?}", args);

        if let Some(toml) = &global.save_toml {
            save_args_toml(&args, toml)?;
        }

        let params = args.parse()?;

        let obs = &params.obs;
        let mut printer = InfoPrinter::new("Synthesising an observation".into());
        printer.push_block(vec![
            format!(
                "{} with {} stations ({} baselines)",
                obs.telescope,
                obs.num_stations(),
                num_cross_baselines(obs.num_stations())
            )
            .into(),
            format!(
                "Phase centre: {:>8.4}° {:>8.4}° (J2000)",
                obs.phase_centre.ra.to_degrees(),
                obs.phase_centre.dec.to_degrees()
            )
            .into(),
            format!("{} timesteps at {}", obs.timestamps.len(), obs.time_res).into(),
            format!(
                "{} channels of {:.3} kHz, centred on {:.3} MHz",
                obs.fine_chan_freqs.len(),
                obs.freq_res_hz / 1e3,
                (obs.fine_chan_freqs.first() + obs.fine_chan_freqs.last()) / 2.0 / 1e6
            )
            .into(),
        ]);
        printer.display();

        if obs.phase_centre_azel(*obs.timestamps.first()).el < 0.0 {
            "The phase centre starts below the horizon".warn();
        }
        display_warnings();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        params.run()?;
        info!("synthms complete.");
        Ok(())
    }
}

impl SynthmsCliArgs {
    fn parse(self) -> Result<SynthMsParams, LositoError> {
        let args = self;
        let name = args.name.unwrap_or_else(|| DEFAULT_NAME.to_string());

        let telescope = match args.telescope.as_deref() {
            None => Telescope::Lba,
            Some(t) => Telescope::from_str(&t.to_lowercase()).map_err(|_| {
                LositoError::Generic(format!(
                    "Unrecognised telescope '{t}'; supported: {}",
                    *TELESCOPES_COMMA_SEPARATED
                ))
            })?,
        };
        let selection = match args.stations.as_deref() {
            None => StationSelection::All,
            Some(s) => StationSelection::from_str(&s.to_lowercase()).map_err(|_| {
                LositoError::Generic(format!(
                    "Unrecognised station selection '{s}'; supported: {}",
                    *STATION_SELECTIONS_COMMA_SEPARATED
                ))
            })?,
        };
        let (station_names, station_itrfs) = load_station_layout(telescope, selection)?;

        let phase_centre = match (args.ra, args.dec) {
            (Some(ra), Some(dec)) => {
                if !(0.0..=360.0).contains(&ra) {
                    return Err(LositoError::Generic(
                        "Right Ascension was not within 0 to 360!".to_string(),
                    ));
                }
                if !(-90.0..=90.0).contains(&dec) {
                    return Err(LositoError::Generic(
                        "Declination was not within -90 to 90!".to_string(),
                    ));
                }
                marlu::RADec::from_degrees(ra, dec)
            }
            _ => {
                return Err(LositoError::Generic(
                    "Both --ra and --dec must be supplied".to_string(),
                ))
            }
        };

        let start = match args.start_time.as_deref() {
            Some(s) => parse_iso_utc(s)?,
            None => {
                return Err(LositoError::Generic(
                    "--start-time must be supplied (e.g. 2022-01-01T00:00:00)".to_string(),
                ))
            }
        };

        let time_res = {
            let (quantity, unit) =
                parse_time(args.time_res.as_deref().unwrap_or(DEFAULT_TIME_RES))?;
            let seconds = quantity * unit.to_seconds();
            if seconds <= 0.0 {
                return Err(LositoError::Generic(
                    "The time resolution cannot be 0 or negative!".to_string(),
                ));
            }
            Duration::from_seconds(seconds)
        };
        let duration = {
            let (quantity, unit) =
                parse_time(args.duration.as_deref().unwrap_or(DEFAULT_DURATION))?;
            Duration::from_seconds(quantity * unit.to_seconds())
        };
        let num_timesteps = (duration.to_seconds() / time_res.to_seconds()).floor() as usize;
        if num_timesteps == 0 {
            return Err(LositoError::Generic(
                "The duration is shorter than one integration time".to_string(),
            ));
        }
        // Centroid timestamps.
        let timestamps = Vec1::try_from_vec(
            (0..num_timesteps)
                .map(|i| start + time_res / 2 + time_res * i as i64)
                .collect(),
        )
        .expect("num_timesteps > 0");

        let freq_res_hz = {
            let (quantity, unit) =
                parse_freq(args.freq_res.as_deref().unwrap_or(DEFAULT_FREQ_RES))?;
            let hz = quantity * unit.to_hz();
            if hz <= 0.0 {
                return Err(LositoError::Generic(
                    "The frequency resolution cannot be 0 or negative!".to_string(),
                ));
            }
            hz
        };
        let num_channels = args.num_channels.unwrap_or(DEFAULT_NUM_CHANNELS);
        if num_channels == 0 {
            return Err(LositoError::Generic(
                "Number of fine channels cannot be 0!".to_string(),
            ));
        }
        let centre_freq_hz = args
            .centre_freq
            .map(|f| f * 1e6) // MHz -> Hz
            .unwrap_or_else(|| telescope.default_centre_freq_hz());
        let fine_chan_freqs = {
            let half_band = num_channels as f64 / 2.0 * freq_res_hz;
            Vec1::try_from_vec(
                (0..num_channels)
                    .map(|i| centre_freq_hz - half_band + freq_res_hz * (i as f64 + 0.5))
                    .collect(),
            )
            .expect("num_channels > 0")
        };

        let array_position = lofar_array_position();
        let station_xyzs = Observation::itrfs_to_geodetic(&station_itrfs, array_position);
        let obs = Observation {
            telescope,
            station_names: Vec1::try_from_vec(station_names).expect("layout is not empty"),
            station_itrfs,
            station_xyzs,
            array_position,
            phase_centre,
            timestamps,
            time_res,
            fine_chan_freqs,
            freq_res_hz,
            dut1: Duration::from_seconds(args.dut1.unwrap_or_default()),
        };

        let output_files = match args.outputs {
            Some(outputs) => {
                let mut files = vec![];
                for path in outputs {
                    let vis_type = vis_output_type_from_path(&path)?;
                    files.push((path, vis_type));
                }
                Vec1::try_from_vec(files).map_err(|_| {
                    LositoError::Generic("No visibility outputs were specified".to_string())
                })?
            }
            None => {
                let path = PathBuf::from(format!("{name}.ms"));
                let vis_type = vis_output_type_from_path(&path)?;
                Vec1::try_from_vec(vec![(path, vis_type)]).expect("one output")
            }
        };
        let obsfile = args
            .obsfile
            .unwrap_or_else(|| PathBuf::from(format!("{name}.obs.toml")));

        Ok(SynthMsParams {
            obs,
            output_vis_params: OutputVisParams { output_files },
            obsfile,
        })
    }
}
