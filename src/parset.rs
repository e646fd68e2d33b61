// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The pipeline parset: one observation plus an ordered list of corruption
//! steps, as a TOML document.
//!
//! ```toml
//! obsfile = "sim.obs.toml"
//! skymodel = "sky.yaml"
//! solutions = "corruptions.fits"
//! seed = 42
//!
//! [output]
//! files = ["corrupted.uvfits"]
//!
//! [[step]]
//! operation = "tec"
//! rms_tecu = 0.1
//!
//! [[step]]
//! operation = "noise"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::operations::{
    bandpass::{BandpassConfig, BandpassOp},
    clock::{ClockConfig, ClockOp},
    faraday::{FaradayConfig, FaradayOp},
    noise::{NoiseConfig, NoiseOp},
    polmisalign::{PolMisalignConfig, PolMisalignOp},
    tec::{TecConfig, TecOp},
    Operation, OperationType,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Parset {
    /// The observation descriptor to corrupt.
    pub(crate) obsfile: PathBuf,

    /// The sky model to predict; required when visibilities are written.
    pub(crate) skymodel: Option<PathBuf>,

    /// Where to write the solution tables. Defaults to the parset's name
    /// with a "_solutions.fits" suffix.
    pub(crate) solutions: Option<PathBuf>,

    /// The base seed; each step without its own seed derives one from this
    /// and its position.
    #[serde(default)]
    pub(crate) seed: u64,

    #[serde(default)]
    pub(crate) output: OutputSection,

    #[serde(default, rename = "step")]
    pub(crate) steps: Vec<Step>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct OutputSection {
    /// Corrupted visibility outputs (uvfits and/or measurement sets).
    #[serde(default)]
    pub(crate) files: Vec<PathBuf>,

    /// Skip precessing station positions to J2000 when modelling.
    #[serde(default)]
    pub(crate) no_precession: bool,
}

/// One pipeline step. The `operation` key selects the type; all other keys
/// belong to that operation's configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub(crate) enum Step {
    Tec(TecConfig),
    Clock(ClockConfig),
    Faraday(FaradayConfig),
    Polmisalign(PolMisalignConfig),
    Bandpass(BandpassConfig),
    Noise(NoiseConfig),
}

impl Step {
    pub(crate) fn operation_type(&self) -> OperationType {
        match self {
            Step::Tec(_) => OperationType::Tec,
            Step::Clock(_) => OperationType::Clock,
            Step::Faraday(_) => OperationType::Faraday,
            Step::Polmisalign(_) => OperationType::PolMisalign,
            Step::Bandpass(_) => OperationType::Bandpass,
            Step::Noise(_) => OperationType::Noise,
        }
    }

    /// Turn the step into a runnable operation. `default_seed` is used
    /// when the step doesn't carry its own.
    pub(crate) fn into_operation(self, default_seed: u64) -> Box<dyn Operation> {
        match self {
            Step::Tec(config) => Box::new(TecOp::new(config, default_seed)),
            Step::Clock(config) => Box::new(ClockOp::new(config, default_seed)),
            Step::Faraday(config) => Box::new(FaradayOp::new(config, default_seed)),
            Step::Polmisalign(config) => Box::new(PolMisalignOp::new(config, default_seed)),
            Step::Bandpass(config) => Box::new(BandpassOp::new(config, default_seed)),
            Step::Noise(config) => Box::new(NoiseOp::new(config)),
        }
    }
}

#[derive(Error, Debug)]
pub(crate) enum ParsetError {
    #[error("Couldn't read parset '{path}': {err}", path = path.display())]
    Io {
        path: Box<Path>,
        err: std::io::Error,
    },

    #[error("Couldn't decode parset '{path}':\n{message}", path = path.display())]
    Parse { path: Box<Path>, message: String },

    #[error("The parset has no [[step]] tables; nothing to simulate. Supported operations: {}", *crate::operations::OPERATION_TYPES_COMMA_SEPARATED)]
    NoSteps,

    #[error("The parset requests output visibilities but names no sky model")]
    OutputNeedsSkyModel,
}

impl Parset {
    pub(crate) fn from_file(path: &Path) -> Result<Parset, ParsetError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ParsetError::Io {
            path: path.to_path_buf().into_boxed_path(),
            err: e,
        })?;
        let parset: Parset = toml::from_str(&contents).map_err(|e| ParsetError::Parse {
            path: path.to_path_buf().into_boxed_path(),
            message: e.to_string(),
        })?;
        parset.validate()?;
        Ok(parset)
    }

    fn validate(&self) -> Result<(), ParsetError> {
        if self.steps.is_empty() {
            return Err(ParsetError::NoSteps);
        }
        if !self.output.files.is_empty() && self.skymodel.is_none() {
            return Err(ParsetError::OutputNeedsSkyModel);
        }
        Ok(())
    }

    /// The solutions path, defaulting next to the parset.
    pub(crate) fn solutions_path(&self, parset_path: &Path) -> PathBuf {
        self.solutions.clone().unwrap_or_else(|| {
            let stem = parset_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("losito");
            parset_path.with_file_name(format!("{stem}_solutions.fits"))
        })
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::operations::tec::TecMethod;

    #[test]
    fn parse_a_full_parset() {
        let parset: Parset = toml::from_str(indoc! {r#"
            obsfile = "sim.obs.toml"
            skymodel = "sky.yaml"
            seed = 7

            [output]
            files = ["corrupted.uvfits", "corrupted.ms"]

            [[step]]
            operation = "tec"
            method = "screen"
            screen_file = "screen.fits"

            [[step]]
            operation = "clock"
            all_stations = true

            [[step]]
            operation = "noise"
            factor = 1.5
        "#})
        .unwrap();
        parset.validate().unwrap();

        assert_eq!(parset.seed, 7);
        assert_eq!(parset.steps.len(), 3);
        assert_eq!(parset.output.files.len(), 2);
        match &parset.steps[0] {
            Step::Tec(config) => {
                assert_eq!(config.method, TecMethod::Screen);
                assert!(config.screen_file.is_some());
            }
            _ => panic!("expected a tec step"),
        }
        match &parset.steps[1] {
            Step::Clock(config) => assert!(config.all_stations),
            _ => panic!("expected a clock step"),
        }
    }

    #[test]
    fn defaults_are_applied() {
        let parset: Parset = toml::from_str(indoc! {r#"
            obsfile = "sim.obs.toml"

            [[step]]
            operation = "bandpass"
        "#})
        .unwrap();
        parset.validate().unwrap();

        assert_eq!(parset.seed, 0);
        assert!(parset.skymodel.is_none());
        assert!(parset.output.files.is_empty());
        match &parset.steps[0] {
            Step::Bandpass(config) => assert_eq!(config.scatter, 0.05),
            _ => panic!("expected a bandpass step"),
        }
    }

    #[test]
    fn bad_parsets_are_rejected() {
        // No steps.
        let parset: Parset = toml::from_str(r#"obsfile = "sim.obs.toml""#).unwrap();
        assert!(matches!(parset.validate(), Err(ParsetError::NoSteps)));

        // Output without a sky model.
        let parset: Parset = toml::from_str(indoc! {r#"
            obsfile = "sim.obs.toml"

            [output]
            files = ["out.uvfits"]

            [[step]]
            operation = "noise"
        "#})
        .unwrap();
        assert!(matches!(
            parset.validate(),
            Err(ParsetError::OutputNeedsSkyModel)
        ));

        // An unknown operation.
        assert!(toml::from_str::<Parset>(indoc! {r#"
            obsfile = "sim.obs.toml"

            [[step]]
            operation = "beam"
        "#})
        .is_err());

        // A misspelled option.
        assert!(toml::from_str::<Parset>(indoc! {r#"
            obsfile = "sim.obs.toml"

            [[step]]
            operation = "noise"
            facter = 2.0
        "#})
        .is_err());
    }

    #[test]
    fn solutions_path_defaults_next_to_the_parset() {
        let parset: Parset = toml::from_str(indoc! {r#"
            obsfile = "sim.obs.toml"

            [[step]]
            operation = "noise"
        "#})
        .unwrap();
        let path = parset.solutions_path(Path::new("/data/run1/corruptions.toml"));
        assert_eq!(
            path,
            Path::new("/data/run1/corruptions_solutions.fits")
        );
    }
}
