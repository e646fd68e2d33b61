// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The `losito` executable: run a parset of corruption operations over an
//! observation.

use clap::Parser;
use log::{debug, info, trace};
use vec1::Vec1;

use super::{
    common::{display_warnings, resolve_path, save_args_toml, InfoPrinter},
    startup, GlobalArgs, LositoError,
};
use crate::{
    context::Observation,
    io::write::{can_write_to_file, vis_output_type_from_path},
    params::{ModellingParams, OutputVisParams, pipeline::PipelineParams},
    parset::Parset,
    skymodel::read::read_source_list_file,
};

#[derive(Parser, Debug)]
#[clap(
    version,
    author,
    about = r#"Simulate direction-independent corruptions for a LOFAR observation.
The parset names an observation descriptor, corruption steps, and outputs."#
)]
pub struct Losito {
    /// Path to the pipeline parset.
    #[clap(name = "PARSET", parse(from_os_str))]
    parset: std::path::PathBuf,

    #[clap(flatten)]
    global: GlobalArgs,
}

impl Losito {
    pub fn run(self) -> Result<(), LositoError> {
        let dry_run = startup("losito", &self.global);

        debug!("Reading parset {}", self.parset.display());
        let parset = Parset::from_file(&self.parset)?;
        trace!("{:#?}", parset);

        if let Some(toml) = &self.global.save_toml {
            save_args_toml(&parset, toml)?;
        }

        // The paths in a parset are relative to the parset itself.
        let obsfile = resolve_path(&self.parset, &parset.obsfile);
        let obs = Observation::from_descriptor_file(&obsfile)?;

        let mut obs_printer = InfoPrinter::new("Observation".into());
        obs_printer.push_block(vec![
            format!("{} ({} stations)", obs.telescope, obs.num_stations()).into(),
            format!(
                "Phase centre: {:>8.4}° {:>8.4}° (J2000)",
                obs.phase_centre.ra.to_degrees(),
                obs.phase_centre.dec.to_degrees()
            )
            .into(),
            format!(
                "{} timesteps at {}",
                obs.timestamps.len(),
                obs.time_res
            )
            .into(),
            format!(
                "{} channels, {:.3}-{:.3} MHz",
                obs.fine_chan_freqs.len(),
                obs.fine_chan_freqs.first() / 1e6,
                obs.fine_chan_freqs.last() / 1e6
            )
            .into(),
        ]);
        obs_printer.display();

        // Load the sky model when the parset wants visibilities.
        let source_list = match &parset.skymodel {
            Some(path) => {
                let path = resolve_path(&self.parset, path);
                let (source_list, sl_type) = read_source_list_file(&path, None)?;
                let counts = source_list.get_counts();
                let mut printer = InfoPrinter::new("Sky model".into());
                printer.push_block(vec![
                    format!("{} ({sl_type})", path.display()).into(),
                    format!(
                        "{} sources ({} points, {} gaussians)",
                        source_list.len(),
                        counts.num_points,
                        counts.num_gaussians
                    )
                    .into(),
                ]);
                printer.display();
                Some(source_list)
            }
            None => None,
        };

        // Work out the outputs.
        let solutions_file = parset.solutions_path(&self.parset);
        can_write_to_file(&solutions_file).map_err(|e| LositoError::VisWrite(e.to_string()))?;
        let output_vis_params = if parset.output.files.is_empty() {
            None
        } else {
            let mut outputs = vec![];
            for file in &parset.output.files {
                let file = resolve_path(&self.parset, file);
                let vis_type = vis_output_type_from_path(&file)?;
                outputs.push((file, vis_type));
            }
            Some(OutputVisParams {
                output_files: Vec1::try_from_vec(outputs).expect("not empty"),
            })
        };

        let mut step_printer = InfoPrinter::new("Pipeline".into());
        let mut block = vec![];
        for (i, step) in parset.steps.iter().enumerate() {
            block.push(format!("{}. {}", i + 1, step.operation_type()).into());
        }
        step_printer.push_block(block);
        step_printer.push_line(format!("Solutions: {}", solutions_file.display()).into());
        step_printer.display();

        let steps = parset
            .steps
            .iter()
            .enumerate()
            .map(|(i_step, step)| {
                // Each step gets its own deterministic seed unless it set
                // one.
                let default_seed = parset.seed.wrapping_add(i_step as u64 + 1);
                (
                    step.operation_type(),
                    step.clone().into_operation(default_seed),
                )
            })
            .collect();

        let params = PipelineParams {
            obs,
            source_list,
            steps,
            solutions_file,
            output_vis_params,
            modelling_params: ModellingParams {
                apply_precession: !parset.output.no_precession,
            },
            seed: parset.seed,
        };

        display_warnings();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        params.run()?;
        info!("losito complete.");
        Ok(())
    }
}
