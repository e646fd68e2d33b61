// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Synthesise an empty measurement set (and/or uvfits) for an observation,
//! plus the observation descriptor the pipeline consumes.

use std::{path::PathBuf, thread::{self, ScopedJoinHandle}};

use crossbeam_channel::bounded;
use crossbeam_utils::atomic::AtomicCell;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::info;
use marlu::constants::{FREQ_WEIGHT_FACTOR, TIME_WEIGHT_FACTOR};
use ndarray::prelude::*;
use thiserror::Error;

use crate::{
    context::{ObsContextError, Observation},
    io::write::{write_vis, VisTimestep, VisWriteError},
    math::num_cross_baselines,
    params::OutputVisParams,
    PROGRESS_BARS,
};

pub(crate) struct SynthMsParams {
    pub(crate) obs: Observation,

    pub(crate) output_vis_params: OutputVisParams,

    /// Where the observation descriptor goes.
    pub(crate) obsfile: PathBuf,
}

impl SynthMsParams {
    pub(crate) fn run(&self) -> Result<(), SynthMsError> {
        let SynthMsParams {
            obs,
            output_vis_params,
            obsfile,
        } = self;

        obs.write_descriptor_file(obsfile)?;
        info!("Observation descriptor written to {}", obsfile.display());

        let num_times = obs.timestamps.len();
        let num_baselines = num_cross_baselines(obs.num_stations());
        let num_chans = obs.fine_chan_freqs.len();
        let weight_factor = (obs.freq_res_hz / FREQ_WEIGHT_FACTOR)
            * (obs.time_res.to_seconds() / TIME_WEIGHT_FACTOR);

        let (tx, rx) = bounded(5);
        let progress = ProgressBar::with_draw_target(
            Some(num_times as _),
            if PROGRESS_BARS.load() {
                ProgressDrawTarget::stdout()
            } else {
                ProgressDrawTarget::hidden()
            },
        )
        .with_style(
            ProgressStyle::default_bar()
                .template("{msg:17}: [{wide_bar:.blue}] {pos:2}/{len:2} timesteps ({elapsed_precise}<{eta_precise})")
                .unwrap()
                .progress_chars("=> "),
        )
        .with_message("Vis writing");

        let error = AtomicCell::new(false);
        let error_ref = &error;
        let scoped_threads_result: Result<String, SynthMsError> = thread::scope(|scope| {
            // The "model" here is trivial: empty visibilities with uniform
            // weights. Moving `tx` into the thread closes the channel when
            // all timesteps have been sent.
            let timestamps = &obs.timestamps;
            let feed_handle: ScopedJoinHandle<()> = thread::Builder::new()
                .name("feed".to_string())
                .spawn_scoped(scope, move || {
                    for &timestamp in timestamps.iter() {
                        if error_ref.load() {
                            return;
                        }
                        let timestep = VisTimestep {
                            cross_data_fb: Array2::default((num_chans, num_baselines)),
                            cross_weights_fb: Array2::from_elem(
                                (num_chans, num_baselines),
                                weight_factor as f32,
                            ),
                            timestamp,
                        };
                        if tx.send(timestep).is_err() {
                            return;
                        }
                    }
                })
                .expect("OS can create threads");

            let write_handle: ScopedJoinHandle<Result<String, VisWriteError>> =
                thread::Builder::new()
                    .name("write".to_string())
                    .spawn_scoped(scope, || {
                        progress.tick();
                        let result = write_vis(
                            &output_vis_params.output_files,
                            obs,
                            rx,
                            &error,
                            Some(progress),
                        );
                        if result.is_err() {
                            error.store(true);
                        }
                        result
                    })
                    .expect("OS can create threads");

            feed_handle.join().unwrap();
            let write_message = write_handle.join().unwrap()?;
            Ok(write_message)
        });

        info!("{}", scoped_threads_result?);
        Ok(())
    }
}

#[derive(Error, Debug)]
pub(crate) enum SynthMsError {
    #[error(transparent)]
    ObsContext(#[from] ObsContextError),

    #[error(transparent)]
    VisWrite(#[from] VisWriteError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
