// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Run a parset's operations over an observation: collect solution tables,
//! and optionally write corrupted model visibilities.

use std::{path::PathBuf, thread::{self, ScopedJoinHandle}};

use crossbeam_channel::{bounded, Sender};
use crossbeam_utils::atomic::AtomicCell;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, info};
use marlu::{
    constants::{FREQ_WEIGHT_FACTOR, TIME_WEIGHT_FACTOR},
    Jones,
};
use ndarray::prelude::*;
use num_complex::Complex;
use rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;

use crate::{
    cli::common::InfoPrinter,
    context::Observation,
    io::write::{write_vis, VisTimestep, VisWriteError},
    math::{sample_standard_normal, StationBaselineMap},
    model::SkyModeller,
    operations::{compose_gains, OpError, Operation, OperationType},
    params::{ModellingParams, OutputVisParams},
    skymodel::SourceList,
    soltab::{self, SolTabError, Solutions},
    PROGRESS_BARS,
};

pub(crate) struct PipelineParams {
    pub(crate) obs: Observation,

    /// The sky model; present when visibilities are being written.
    pub(crate) source_list: Option<SourceList>,

    /// The operations, in application order.
    pub(crate) steps: Vec<(OperationType, Box<dyn Operation>)>,

    /// Where the solution tables go.
    pub(crate) solutions_file: PathBuf,

    /// The corrupted visibility outputs, if any.
    pub(crate) output_vis_params: Option<OutputVisParams>,

    pub(crate) modelling_params: ModellingParams,

    /// The base seed for the whole pipeline (noise draws included).
    pub(crate) seed: u64,
}

impl PipelineParams {
    pub(crate) fn run(&self) -> Result<(), PipelineError> {
        let PipelineParams {
            obs,
            source_list,
            steps,
            solutions_file,
            output_vis_params,
            modelling_params: ModellingParams { apply_precession },
            seed,
        } = self;

        let num_times = obs.timestamps.len();
        let num_stations = obs.num_stations();
        let num_chans = obs.fine_chan_freqs.len();

        // Run the operations in order, composing their gains and collecting
        // their solution tables.
        let mut total_gains: Array3<Jones<f64>> =
            Array3::from_elem((num_times, num_stations, num_chans), Jones::identity());
        let mut noise_sigma_jy: Option<Vec<f64>> = None;
        let mut solutions = Solutions::new(obs.station_names.clone(), obs.timestamps.clone());

        for (i_step, (op_type, op)) in steps.iter().enumerate() {
            let mut printer =
                InfoPrinter::new(format!("Step {}: {op_type}", i_step + 1).into());
            let output = op.simulate(obs)?;
            let mut block = vec![];
            if let Some(gains) = output.gains {
                block.push("Simulated station gains".into());
                compose_gains(&mut total_gains, &gains);
            }
            if let Some(sigmas) = output.noise_sigma_jy {
                block.push(
                    format!(
                        "Noise: {:.2} Jy per visibility at the band centre",
                        sigmas[sigmas.len() / 2]
                    )
                    .into(),
                );
                // Noise levels add in quadrature if someone stacks noise
                // steps.
                noise_sigma_jy = Some(match noise_sigma_jy.take() {
                    None => sigmas,
                    Some(existing) => existing
                        .into_iter()
                        .zip(sigmas)
                        .map(|(a, b)| a.hypot(b))
                        .collect(),
                });
            }
            for (sol_type, soltab) in output.soltabs {
                solutions.push(sol_type, soltab)?;
            }
            if let Some(last) = solutions.soltabs.last() {
                block.push(format!("Recorded solution table '{}'", last.name).into());
            }
            printer.push_block(block);
            printer.display();
        }

        soltab::fits::write(&solutions, solutions_file)?;
        info!("Solution tables written to {}", solutions_file.display());

        // Without visibility outputs we're done.
        let output_vis_params = match output_vis_params {
            Some(p) => p,
            None => return Ok(()),
        };
        let source_list = source_list
            .as_ref()
            .expect("visibility outputs imply a sky model");

        let fine_chan_freqs: Vec<f64> = obs.fine_chan_freqs.iter().copied().collect();
        let modeller = SkyModeller::new(
            source_list,
            &obs.station_xyzs,
            &fine_chan_freqs,
            obs.phase_centre,
            obs.array_position.longitude_rad,
            obs.array_position.latitude_rad,
            obs.dut1,
            *apply_precession,
        );

        // Channel for passing simulated visibilities to the writer.
        let (tx_model, rx_model) = bounded(5);

        // Progress bars.
        let multi_progress = MultiProgress::with_draw_target(if PROGRESS_BARS.load() {
            ProgressDrawTarget::stdout()
        } else {
            ProgressDrawTarget::hidden()
        });
        let model_progress = multi_progress.add(
            ProgressBar::new(num_times as _)
                .with_style(
                    ProgressStyle::default_bar()
                        .template("{msg:17}: [{wide_bar:.blue}] {pos:2}/{len:2} timesteps ({elapsed_precise}<{eta_precise})")
                        .unwrap()
                        .progress_chars("=> "),
                )
                .with_position(0)
                .with_message("Sky modelling"),
        );
        let write_progress = multi_progress.add(
            ProgressBar::new(num_times as _)
                .with_style(
                    ProgressStyle::default_bar()
                        .template("{msg:17}: [{wide_bar:.blue}] {pos:2}/{len:2} timesteps ({elapsed_precise}<{eta_precise})")
                        .unwrap()
                        .progress_chars("=> "),
                )
                .with_position(0)
                .with_message("Vis writing"),
        );

        // Generate and corrupt the visibilities on one thread, write them
        // out on another.
        let error = AtomicCell::new(false);
        let scoped_threads_result: Result<String, PipelineError> = thread::scope(|scope| {
            let model_handle: ScopedJoinHandle<Result<(), PipelineError>> =
                thread::Builder::new()
                    .name("model".to_string())
                    .spawn_scoped(scope, || {
                        model_progress.tick();
                        let result = model_thread(
                            obs,
                            &modeller,
                            &total_gains,
                            noise_sigma_jy.as_deref(),
                            *seed,
                            tx_model,
                            &error,
                            model_progress,
                        );
                        if result.is_err() {
                            error.store(true);
                        }
                        result
                    })
                    .expect("OS can create threads");

            let write_handle: ScopedJoinHandle<Result<String, VisWriteError>> =
                thread::Builder::new()
                    .name("write".to_string())
                    .spawn_scoped(scope, || {
                        write_progress.tick();
                        let result = write_vis(
                            &output_vis_params.output_files,
                            obs,
                            rx_model,
                            &error,
                            Some(write_progress),
                        );
                        if result.is_err() {
                            error.store(true);
                        }
                        result
                    })
                    .expect("OS can create threads");

            model_handle.join().unwrap()?;
            let write_message = write_handle.join().unwrap()?;
            Ok(write_message)
        });

        info!("{}", scoped_threads_result?);
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn model_thread(
    obs: &Observation,
    modeller: &SkyModeller,
    total_gains: &Array3<Jones<f64>>,
    noise_sigma_jy: Option<&[f64]>,
    seed: u64,
    tx: Sender<VisTimestep>,
    error: &AtomicCell<bool>,
    progress_bar: ProgressBar,
) -> Result<(), PipelineError> {
    let baseline_map = StationBaselineMap::new(obs.num_stations());
    let num_baselines = baseline_map.baseline_to_stations.len();
    let num_chans = obs.fine_chan_freqs.len();
    let weight_factor =
        (obs.freq_res_hz / FREQ_WEIGHT_FACTOR) * (obs.time_res.to_seconds() / TIME_WEIGHT_FACTOR);

    for (i_timestep, &timestamp) in obs.timestamps.iter().enumerate() {
        let mut cross_data_fb: Array2<Jones<f32>> =
            Array2::default((num_chans, num_baselines));
        modeller.model_timestep_with(timestamp, cross_data_fb.view_mut());

        // Corrupt: V' = G_p V G_q^H per baseline and channel.
        let gains_t = total_gains.index_axis(Axis(0), i_timestep);
        for (i_baseline, &(p, q)) in baseline_map.baseline_to_stations.iter().enumerate() {
            for i_chan in 0..num_chans {
                let g_p = gains_t[(p, i_chan)];
                let g_q = gains_t[(q, i_chan)];
                let vis = Jones::<f64>::from(cross_data_fb[(i_chan, i_baseline)]);
                cross_data_fb[(i_chan, i_baseline)] = Jones::from(g_p * vis * g_q.h());
            }
        }

        // Thermal noise, per polarisation, per quadrature.
        if let Some(sigmas) = noise_sigma_jy {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i_timestep as u64));
            for i_chan in 0..num_chans {
                let sigma = sigmas[i_chan] as f32;
                for i_baseline in 0..num_baselines {
                    let mut draw = || {
                        Complex::new(
                            sigma * sample_standard_normal(&mut rng) as f32,
                            sigma * sample_standard_normal(&mut rng) as f32,
                        )
                    };
                    let noise = Jones::from([draw(), draw(), draw(), draw()]);
                    cross_data_fb[(i_chan, i_baseline)] += noise;
                }
            }
        }

        // Should we continue?
        if error.load() {
            return Ok(());
        }

        debug!("Sending timestep {i_timestep}");
        match tx.send(VisTimestep {
            cross_data_fb,
            cross_weights_fb: Array2::from_elem(
                (num_chans, num_baselines),
                weight_factor as f32,
            ),
            timestamp,
        }) {
            Ok(()) => (),
            // If we can't send the message, it's because the channel has
            // been closed on the other side. That should only happen
            // because the writer has exited due to error; in that case,
            // just exit this thread.
            Err(_) => return Ok(()),
        }

        progress_bar.inc(1);
    }

    progress_bar.abandon_with_message("Finished corrupting the sky model");
    Ok(())
}

#[derive(Error, Debug)]
pub(crate) enum PipelineError {
    #[error(transparent)]
    Op(#[from] OpError),

    #[error(transparent)]
    SolTab(#[from] SolTabError),

    #[error(transparent)]
    VisWrite(#[from] VisWriteError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
