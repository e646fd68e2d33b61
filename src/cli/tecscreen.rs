// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The `tecscreen` executable: generate turbulent ionospheric TEC screens.

use std::path::PathBuf;

use clap::Parser;
use hifitime::{Duration, Epoch};
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use vec1::Vec1;

use super::{
    common::{display_warnings, parse_iso_utc, save_args_toml, ARG_FILE_HELP},
    startup, GlobalArgs, LositoError,
};
use crate::{
    constants::{
        DEFAULT_SCREEN_HEIGHT_M, DEFAULT_SCREEN_OUTER_SCALE_M, DEFAULT_SCREEN_R0_M,
        DEFAULT_SCREEN_VELOCITY_MPS,
    },
    context::Observation,
    params::tec_screen::TecScreenParams,
    screens::ScreenSpec,
    unit_parsing::parse_time,
};

const DEFAULT_OUTPUT: &str = "tecscreen.fits";
const DEFAULT_SIZE: usize = 128;
const DEFAULT_PIXEL_SCALE_M: f64 = 2000.0;
const DEFAULT_SCREEN_CADENCE: &str = "30s";

lazy_static::lazy_static! {
    static ref SIZE_HELP: String =
        format!("The number of pixels along one side of the screen. Default: {DEFAULT_SIZE}");

    static ref PIXEL_SCALE_HELP: String =
        format!("Metres per pixel at the screen height. Default: {DEFAULT_PIXEL_SCALE_M}");

    static ref HEIGHT_HELP: String =
        format!("The height of the thin-layer screen [km]. Default: {}", DEFAULT_SCREEN_HEIGHT_M / 1e3);

    static ref R0_HELP: String =
        format!("The diffractive scale at 150 MHz [km]. Default: {}", DEFAULT_SCREEN_R0_M / 1e3);

    static ref OUTER_SCALE_HELP: String =
        format!("The outer scale of the turbulence [km]. Default: {}", DEFAULT_SCREEN_OUTER_SCALE_M / 1e3);

    static ref VELOCITY_HELP: String =
        format!("The frozen-flow velocity, east and north [m/s]. Default: {DEFAULT_SCREEN_VELOCITY_MPS} 0");

    static ref CADENCE_HELP: String =
        format!("The time between screen planes (e.g. 60s). Default: {DEFAULT_SCREEN_CADENCE}");

    static ref OUTPUT_HELP: String =
        format!("Path to the output FITS cube. Default: {DEFAULT_OUTPUT}");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct TecscreenCliArgs {
    /// Take the time range from this observation descriptor.
    #[clap(long, parse(from_str), help_heading = "INPUT FILES")]
    obsfile: Option<PathBuf>,

    /// The first screen time (UTC), e.g. 2022-01-01T00:00:00. Overrides
    /// the obsfile.
    #[clap(long, help_heading = "TIME RANGE")]
    start_time: Option<String>,

    /// The screen time range length (e.g. 4h). Overrides the obsfile.
    #[clap(long, help_heading = "TIME RANGE")]
    duration: Option<String>,

    #[clap(long, help = CADENCE_HELP.as_str(), help_heading = "TIME RANGE")]
    cadence: Option<String>,

    #[clap(long, help = SIZE_HELP.as_str(), help_heading = "SCREEN")]
    size: Option<usize>,

    #[clap(long, help = PIXEL_SCALE_HELP.as_str(), help_heading = "SCREEN")]
    pixel_scale: Option<f64>,

    #[clap(long, help = HEIGHT_HELP.as_str(), help_heading = "SCREEN")]
    height: Option<f64>,

    #[clap(long, help = R0_HELP.as_str(), help_heading = "TURBULENCE")]
    r0: Option<f64>,

    #[clap(long, help = OUTER_SCALE_HELP.as_str(), help_heading = "TURBULENCE")]
    outer_scale: Option<f64>,

    #[clap(
        long,
        number_of_values = 2,
        allow_hyphen_values = true,
        help = VELOCITY_HELP.as_str(),
        value_names = &["EAST_MPS", "NORTH_MPS"],
        help_heading = "TURBULENCE"
    )]
    velocity: Option<Vec<f64>>,

    /// The seed for the random number generator. The same seed always
    /// produces the same screens.
    #[clap(short, long, help_heading = "TURBULENCE")]
    seed: Option<u64>,

    #[clap(short, long, help = OUTPUT_HELP.as_str(), help_heading = "OUTPUT FILES")]
    output: Option<PathBuf>,

    /// Also render the first screen plane to this PNG.
    #[clap(long, help_heading = "OUTPUT FILES")]
    plot: Option<PathBuf>,
}

impl TecscreenCliArgs {
    fn merge(self, other: Self) -> Self {
        Self {
            obsfile: self.obsfile.or(other.obsfile),
            start_time: self.start_time.or(other.start_time),
            duration: self.duration.or(other.duration),
            cadence: self.cadence.or(other.cadence),
            size: self.size.or(other.size),
            pixel_scale: self.pixel_scale.or(other.pixel_scale),
            height: self.height.or(other.height),
            r0: self.r0.or(other.r0),
            outer_scale: self.outer_scale.or(other.outer_scale),
            velocity: self.velocity.or(other.velocity),
            seed: self.seed.or(other.seed),
            output: self.output.or(other.output),
            plot: self.plot.or(other.plot),
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    version,
    author,
    about = "Generate turbulent ionospheric TEC screens for a LOFAR simulation."
)]
pub struct Tecscreen {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    args_file: Option<PathBuf>,

    #[clap(flatten)]
    screen_args: TecscreenCliArgs,

    #[clap(flatten)]
    global: GlobalArgs,
}

impl Tecscreen {
    fn merge(self) -> Result<(TecscreenCliArgs, GlobalArgs), LositoError> {
        debug!("Merging command-line arguments with the argument file");
        let Tecscreen {
            args_file,
            screen_args,
            global,
        } = self;
        match args_file {
            Some(args_file) => {
                let file_args: TecscreenCliArgs = unpack_arg_file!(args_file);
                Ok((screen_args.merge(file_args), global))
            }
            None => Ok((screen_args, global)),
        }
    }

    pub fn run(self) -> Result<(), LositoError> {
        let dry_run = startup("tecscreen", &self.global);
        let (args, global) = self.merge()?;
        trace!("{:#?}", args);

        if let Some(toml) = &global.save_toml {
            save_args_toml(&args, toml)?;
        }

        let params = args.parse()?;
        display_warnings();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        params.run()?;
        info!("tecscreen complete.");
        Ok(())
    }
}

impl TecscreenCliArgs {
    fn parse(self) -> Result<TecScreenParams, LositoError> {
        let args = self;
        // The time range comes from an obsfile, or explicitly.
        let (start, duration) = match (&args.obsfile, &args.start_time, &args.duration) {
            (_, Some(start), Some(duration)) => {
                let start = parse_iso_utc(start)?;
                let (quantity, unit) = parse_time(duration)?;
                (start, Duration::from_seconds(quantity * unit.to_seconds()))
            }
            (Some(obsfile), _, _) => {
                let obs = Observation::from_descriptor_file(obsfile)?;
                let start = *obs.timestamps.first() - obs.time_res / 2;
                let duration = *obs.timestamps.last() + obs.time_res / 2 - start;
                (start, duration)
            }
            _ => {
                return Err(LositoError::Generic(
                    "The time range needs either an obsfile or both --start-time and --duration"
                        .to_string(),
                ))
            }
        };

        let cadence = {
            let (quantity, unit) =
                parse_time(args.cadence.as_deref().unwrap_or(DEFAULT_SCREEN_CADENCE))?;
            let seconds = quantity * unit.to_seconds();
            if seconds <= 0.0 {
                return Err(LositoError::Generic(
                    "The screen cadence cannot be 0 or negative!".to_string(),
                ));
            }
            Duration::from_seconds(seconds)
        };
        let num_planes = (duration.to_seconds() / cadence.to_seconds()).ceil().max(1.0) as usize;
        let times: Vec1<Epoch> = Vec1::try_from_vec(
            (0..num_planes).map(|i| start + cadence * i as i64).collect(),
        )
        .expect("num_planes >= 1");

        let size = args.size.unwrap_or(DEFAULT_SIZE);
        if size < 2 {
            return Err(LositoError::Screen(
                "Screen sizes must be at least 2 pixels".to_string(),
            ));
        }
        let velocity = match args.velocity.as_deref() {
            Some([east, north]) => (*east, *north),
            Some(other) => {
                return Err(LositoError::Generic(format!(
                    "Velocity specified as {other:?}, not [<EAST_MPS>, <NORTH_MPS>]"
                )))
            }
            None => (DEFAULT_SCREEN_VELOCITY_MPS, 0.0),
        };

        let spec = ScreenSpec {
            size,
            pixel_scale_m: args.pixel_scale.unwrap_or(DEFAULT_PIXEL_SCALE_M),
            height_m: args
                .height
                .map(|km| km * 1e3)
                .unwrap_or(DEFAULT_SCREEN_HEIGHT_M),
            r0_m: args.r0.map(|km| km * 1e3).unwrap_or(DEFAULT_SCREEN_R0_M),
            outer_scale_m: args
                .outer_scale
                .map(|km| km * 1e3)
                .unwrap_or(DEFAULT_SCREEN_OUTER_SCALE_M),
            velocity_east_mps: velocity.0,
            velocity_north_mps: velocity.1,
            seed: args.seed.unwrap_or(0),
        };
        if spec.r0_m <= 0.0 || spec.outer_scale_m <= 0.0 || spec.pixel_scale_m <= 0.0 {
            return Err(LositoError::Screen(
                "Screen scales must be positive".to_string(),
            ));
        }

        Ok(TecScreenParams {
            spec,
            times,
            output: args
                .output
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            plot_file: args.plot,
        })
    }

}
