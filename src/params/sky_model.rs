// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Generate a synthetic sky-model source list.

use std::path::PathBuf;

use log::info;
use thiserror::Error;

use crate::{
    cli::common::InfoPrinter,
    skymodel::{
        generate::{generate_field, GenerateFieldParams},
        write_source_list, SourceListType, WriteSourceListError,
    },
};

pub(crate) struct SkyModelParams {
    pub(crate) generate: GenerateFieldParams,

    pub(crate) output: PathBuf,

    /// Output type; guessed from the extension when absent.
    pub(crate) output_type: Option<SourceListType>,
}

impl SkyModelParams {
    pub(crate) fn run(&self) -> Result<(), SkyModelError> {
        let source_list = generate_field(&self.generate);
        let counts = source_list.get_counts();

        let mut printer = InfoPrinter::new("Generated sky model".into());
        printer.push_block(vec![
            format!(
                "{} sources within {:.1}° of ({:.4}°, {:.4}°)",
                source_list.len(),
                self.generate.radius_rad.to_degrees(),
                self.generate.centre.ra.to_degrees(),
                self.generate.centre.dec.to_degrees()
            )
            .into(),
            format!(
                "{} points, {} gaussians",
                counts.num_points, counts.num_gaussians
            )
            .into(),
        ]);
        printer.display();

        write_source_list(&source_list, &self.output, self.output_type)?;
        info!("Sky model written to {}", self.output.display());
        Ok(())
    }
}

#[derive(Error, Debug)]
pub(crate) enum SkyModelError {
    #[error(transparent)]
    Write(#[from] WriteSourceListError),
}
