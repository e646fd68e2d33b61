// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all losito-related errors. This should be the *only*
//! error enum that is publicly visible.

use thiserror::Error;

use crate::{
    context::ObsContextError,
    io::{write::VisWriteError, GlobError},
    operations::OpError,
    params::{
        pipeline::PipelineError, sky_model::SkyModelError, synth_ms::SynthMsError,
        tec_screen::TecScreenError,
    },
    parset::ParsetError,
    screens::ScreenError,
    skymodel::{ReadSourceListError, WriteSourceListError},
    soltab::SolTabError,
    unit_parsing::UnitParseError,
};

/// The *only* publicly visible error from losito.
#[derive(Error, Debug)]
pub enum LositoError {
    /// An error related to the corruption pipeline.
    #[error("{0}")]
    Pipeline(String),

    /// An error related to observation contexts.
    #[error("{0}")]
    Obs(String),

    /// An error related to sky-model source lists.
    #[error("{0}")]
    Srclist(String),

    /// An error related to solution tables.
    #[error("{0}")]
    Solutions(String),

    /// An error related to TEC screens.
    #[error("{0}")]
    Screen(String),

    /// An error related to writing visibilities.
    #[error("{0}")]
    VisWrite(String),

    /// An error related to argument files.
    #[error("{0}")]
    ArgFile(String),

    /// An error related to globbing.
    #[error("{0}")]
    Glob(String),

    /// A generic error.
    #[error("{0}")]
    Generic(String),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

impl From<ParsetError> for LositoError {
    fn from(e: ParsetError) -> Self {
        Self::Pipeline(e.to_string())
    }
}

impl From<PipelineError> for LositoError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::SolTab(e) => Self::Solutions(e.to_string()),
            PipelineError::VisWrite(e) => Self::VisWrite(e.to_string()),
            e => Self::Pipeline(e.to_string()),
        }
    }
}

impl From<OpError> for LositoError {
    fn from(e: OpError) -> Self {
        Self::Pipeline(e.to_string())
    }
}

impl From<ObsContextError> for LositoError {
    fn from(e: ObsContextError) -> Self {
        Self::Obs(e.to_string())
    }
}

impl From<ReadSourceListError> for LositoError {
    fn from(e: ReadSourceListError) -> Self {
        Self::Srclist(e.to_string())
    }
}

impl From<WriteSourceListError> for LositoError {
    fn from(e: WriteSourceListError) -> Self {
        Self::Srclist(e.to_string())
    }
}

impl From<SkyModelError> for LositoError {
    fn from(e: SkyModelError) -> Self {
        Self::Srclist(e.to_string())
    }
}

impl From<SynthMsError> for LositoError {
    fn from(e: SynthMsError) -> Self {
        match e {
            SynthMsError::ObsContext(e) => Self::Obs(e.to_string()),
            e => Self::VisWrite(e.to_string()),
        }
    }
}

impl From<TecScreenError> for LositoError {
    fn from(e: TecScreenError) -> Self {
        Self::Screen(e.to_string())
    }
}

impl From<ScreenError> for LositoError {
    fn from(e: ScreenError) -> Self {
        Self::Screen(e.to_string())
    }
}

impl From<SolTabError> for LositoError {
    fn from(e: SolTabError) -> Self {
        Self::Solutions(e.to_string())
    }
}

impl From<VisWriteError> for LositoError {
    fn from(e: VisWriteError) -> Self {
        Self::VisWrite(e.to_string())
    }
}

impl From<GlobError> for LositoError {
    fn from(e: GlobError) -> Self {
        Self::Glob(e.to_string())
    }
}

impl From<UnitParseError> for LositoError {
    fn from(e: UnitParseError) -> Self {
        Self::Generic(e.to_string())
    }
}
