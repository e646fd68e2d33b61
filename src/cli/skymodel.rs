// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The `skymodel` executable: generate a synthetic sky-model source list.

use std::path::PathBuf;

use clap::Parser;
use log::{debug, info, trace};
use marlu::RADec;
use serde::{Deserialize, Serialize};

use super::{
    common::{display_warnings, save_args_toml, ARG_FILE_HELP},
    startup, GlobalArgs, LositoError,
};
use crate::{
    context::Observation,
    params::sky_model::SkyModelParams,
    skymodel::{
        generate::GenerateFieldParams, SourceListType, SOURCE_LIST_TYPES_COMMA_SEPARATED,
    },
};

const DEFAULT_OUTPUT: &str = "sky.yaml";
const DEFAULT_RADIUS_DEG: f64 = 5.0;
const DEFAULT_NUM_SOURCES: usize = 100;
const DEFAULT_MIN_FLUX_JY: f64 = 0.1;
const DEFAULT_MAX_FLUX_JY: f64 = 10.0;
const DEFAULT_COUNT_SLOPE: f64 = 1.6;
const DEFAULT_GAUSSIAN_FRACTION: f64 = 0.2;

lazy_static::lazy_static! {
    static ref RADIUS_HELP: String =
        format!("The radius of the generated field [degrees]. Default: {DEFAULT_RADIUS_DEG}");

    static ref NUM_SOURCES_HELP: String =
        format!("How many sources to generate. Default: {DEFAULT_NUM_SOURCES}");

    static ref FLUX_HELP: String =
        format!("The minimum and maximum Stokes I flux density [Jy]. Default: {DEFAULT_MIN_FLUX_JY} {DEFAULT_MAX_FLUX_JY}");

    static ref SLOPE_HELP: String =
        format!("The slope of the differential source counts dN/dS ∝ S^-gamma. Default: {DEFAULT_COUNT_SLOPE}");

    static ref OUTPUT_TYPE_HELP: String =
        format!("The type of the output source list. May be required depending on the output filename. Supported types: {}", *SOURCE_LIST_TYPES_COMMA_SEPARATED);

    static ref OUTPUT_HELP: String =
        format!("Path to the output source list. Default: {DEFAULT_OUTPUT}");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct SkymodelCliArgs {
    /// Take the field centre and reference frequency from this observation
    /// descriptor.
    #[clap(long, parse(from_str), help_heading = "INPUT FILES")]
    obsfile: Option<PathBuf>,

    /// The field centre right ascension [degrees]. Overrides the obsfile.
    #[clap(short, long, help_heading = "FIELD")]
    ra: Option<f64>,

    /// The field centre declination [degrees]. Overrides the obsfile.
    #[clap(short, long, allow_hyphen_values = true, help_heading = "FIELD")]
    dec: Option<f64>,

    #[clap(long, help = RADIUS_HELP.as_str(), help_heading = "FIELD")]
    radius: Option<f64>,

    #[clap(short, long, help = NUM_SOURCES_HELP.as_str(), help_heading = "SOURCES")]
    num_sources: Option<usize>,

    #[clap(
        long,
        number_of_values = 2,
        help = FLUX_HELP.as_str(),
        value_names = &["MIN_JY", "MAX_JY"],
        help_heading = "SOURCES"
    )]
    flux_range: Option<Vec<f64>>,

    /// The reference frequency of the generated flux densities [MHz]. The
    /// default comes from the obsfile, if given, else 150 MHz.
    #[clap(long, help_heading = "SOURCES")]
    ref_freq: Option<f64>,

    #[clap(long, help = SLOPE_HELP.as_str(), help_heading = "SOURCES")]
    count_slope: Option<f64>,

    /// The fraction of sources that are Gaussians.
    #[clap(long, help_heading = "SOURCES")]
    gaussian_fraction: Option<f64>,

    /// Also include the A-team calibrators (CasA, CygA, TauA, VirA).
    #[clap(long, help_heading = "SOURCES")]
    #[serde(default)]
    ateam: bool,

    /// The seed for the random number generator. The same seed always
    /// produces the same sky.
    #[clap(short, long, help_heading = "SOURCES")]
    seed: Option<u64>,

    #[clap(short, long, help = OUTPUT_HELP.as_str(), help_heading = "OUTPUT FILES")]
    output: Option<PathBuf>,

    #[clap(long, help = OUTPUT_TYPE_HELP.as_str(), help_heading = "OUTPUT FILES")]
    output_type: Option<String>,
}

impl SkymodelCliArgs {
    fn parse(self) -> Result<SkyModelParams, LositoError> {
        let args = self;
        // An obsfile provides defaults for the field centre and reference
        // frequency.
        let obs = match &args.obsfile {
            Some(path) => Some(Observation::from_descriptor_file(path)?),
            None => None,
        };

        let centre = match (args.ra, args.dec, &obs) {
            (Some(ra), Some(dec), _) => {
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
                RADec::from_degrees(ra, dec)
            }
            (None, None, Some(obs)) => obs.phase_centre,
            _ => {
                return Err(LositoError::Generic(
                    "The field centre needs either an obsfile or both --ra and --dec"
                        .to_string(),
                ))
            }
        };

        let ref_freq_hz = match (args.ref_freq, &obs) {
            // MHz -> Hz.
            (Some(f), _) => f * 1e6,
            (None, Some(obs)) => obs.fine_chan_freqs[obs.fine_chan_freqs.len() / 2],
            (None, None) => 150e6,
        };

        let (min_flux_jy, max_flux_jy) = match args.flux_range.as_deref() {
            Some([min, max]) => (*min, *max),
            Some(other) => {
                return Err(LositoError::Generic(format!(
                    "Flux range specified as {other:?}, not [<MIN_JY>, <MAX_JY>]"
                )))
            }
            None => (DEFAULT_MIN_FLUX_JY, DEFAULT_MAX_FLUX_JY),
        };
        if min_flux_jy <= 0.0 || max_flux_jy <= min_flux_jy {
            return Err(LositoError::Generic(format!(
                "Bad flux range: {min_flux_jy} to {max_flux_jy} Jy"
            )));
        }

        let num_sources = args.num_sources.unwrap_or(DEFAULT_NUM_SOURCES);
        if num_sources == 0 && !args.ateam {
            return Err(LositoError::Generic(
                "Number of sources cannot be 0 (unless --ateam is given)".to_string(),
            ));
        }
        let gaussian_fraction = args
            .gaussian_fraction
            .unwrap_or(DEFAULT_GAUSSIAN_FRACTION)
            .clamp(0.0, 1.0);

        let output = args
            .output
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
        let output_type = match args.output_type.as_deref() {
            Some(t) => Some(t.parse::<SourceListType>().map_err(|_| {
                LositoError::Srclist(format!(
                    "Unrecognised source list type '{t}'; supported types: {}",
                    *SOURCE_LIST_TYPES_COMMA_SEPARATED
                ))
            })?),
            None => None,
        };

        Ok(SkyModelParams {
            generate: GenerateFieldParams {
                centre,
                radius_rad: args.radius.unwrap_or(DEFAULT_RADIUS_DEG).to_radians(),
                num_sources,
                min_flux_jy,
                max_flux_jy,
                ref_freq_hz,
                count_slope: args.count_slope.unwrap_or(DEFAULT_COUNT_SLOPE),
                gaussian_fraction,
                include_ateam: args.ateam,
                seed: args.seed.unwrap_or(0),
            },
            output,
            output_type,
        })
    }

    fn merge(self, other: Self) -> Self {
        Self {
            obsfile: self.obsfile.or(other.obsfile),
            ra: self.ra.or(other.ra),
            dec: self.dec.or(other.dec),
            radius: self.radius.or(other.radius),
            num_sources: self.num_sources.or(other.num_sources),
            flux_range: self.flux_range.or(other.flux_range),
            ref_freq: self.ref_freq.or(other.ref_freq),
            count_slope: self.count_slope.or(other.count_slope),
            gaussian_fraction: self.gaussian_fraction.or(other.gaussian_fraction),
            ateam: self.ateam || other.ateam,
            seed: self.seed.or(other.seed),
            output: self.output.or(other.output),
            output_type: self.output_type.or(other.output_type),
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    version,
    author,
    about = "Generate a synthetic sky-model source list for a LOFAR field."
)]
pub struct Skymodel {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    args_file: Option<PathBuf>,

    #[clap(flatten)]
    sky_args: SkymodelCliArgs,

    #[clap(flatten)]
    global: GlobalArgs,
}

impl Skymodel {
    /// Merge the CLI arguments with any arguments file. CLI arguments are
    /// preferred.
    fn merge(self) -> Result<(SkymodelCliArgs, GlobalArgs), LositoError> {
        debug!("Merging command-line arguments with the argument file");
        let Skymodel {
            args_file,
            sky_args,
            global,
        } = self;
        match args_file {
            Some(args_file) => {
                let file_args: SkymodelCliArgs = unpack_arg_file!(args_file);
                Ok((sky_args.merge(file_args), global))
            }
            None => Ok((sky_args, global)),
        }
    }

    pub fn run(self) -> Result<(), LositoError> {
        let dry_run = startup("skymodel", &self.global);
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
        info!("skymodel complete.");
        Ok(())
    }
}
