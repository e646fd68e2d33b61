// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Generate a turbulent TEC screen cube.

use std::path::PathBuf;

use hifitime::Epoch;
use log::info;
use thiserror::Error;
use vec1::Vec1;

use crate::{
    cli::common::InfoPrinter,
    screens::{fits, ScreenError, ScreenSpec, TecScreen, TecScreenCube},
};

pub(crate) struct TecScreenParams {
    pub(crate) spec: ScreenSpec,

    /// The timestamps to rasterise at.
    pub(crate) times: Vec1<Epoch>,

    pub(crate) output: PathBuf,

    /// Render the first screen plane to this PNG (plotting feature only).
    pub(crate) plot_file: Option<PathBuf>,
}

impl TecScreenParams {
    pub(crate) fn run(&self) -> Result<(), TecScreenError> {
        let mut printer = InfoPrinter::new("Generating TEC screens".into());
        printer.push_block(vec![
            format!(
                "{} planes of {}x{} pixels ({:.0} km across)",
                self.times.len(),
                self.spec.size,
                self.spec.size,
                self.spec.extent_m() / 1e3
            )
            .into(),
            format!(
                "r0 {:.1} km, outer scale {:.1} km, height {:.0} km",
                self.spec.r0_m / 1e3,
                self.spec.outer_scale_m / 1e3,
                self.spec.height_m / 1e3
            )
            .into(),
            format!(
                "frozen flow ({:.1}, {:.1}) m/s, seed {}",
                self.spec.velocity_east_mps, self.spec.velocity_north_mps, self.spec.seed
            )
            .into(),
        ]);
        printer.display();

        let screen = TecScreen::new(self.spec);
        let epoch = *self.times.first();
        let times: Vec<Epoch> = self.times.iter().copied().collect();
        let cube = TecScreenCube {
            spec: self.spec,
            data: screen.rasterise(epoch, &times),
            times,
        };

        fits::write(&cube, &self.output)?;
        info!("TEC screens written to {}", self.output.display());

        if let Some(plot_file) = &self.plot_file {
            #[cfg(feature = "plotting")]
            {
                crate::screens::plot::plot_screen(&cube, 0, plot_file)?;
                info!("Screen plot written to {}", plot_file.display());
            }
            #[cfg(not(feature = "plotting"))]
            {
                return Err(TecScreenError::NoPlottingFeature {
                    file: plot_file.clone(),
                });
            }
        }

        Ok(())
    }
}

#[derive(Error, Debug)]
pub(crate) enum TecScreenError {
    #[cfg(not(feature = "plotting"))]
    #[error("Cannot plot to '{file}'; losito was compiled without the \"plotting\" feature", file = file.display())]
    NoPlottingFeature { file: PathBuf },

    #[error(transparent)]
    Screen(#[from] ScreenError),
}
