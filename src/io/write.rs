// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to handle writing out visibilities.

use std::path::{Path, PathBuf};

use crossbeam_channel::Receiver;
use crossbeam_utils::atomic::AtomicCell;
use indicatif::ProgressBar;
use itertools::Itertools;
use log::{debug, trace};
use marlu::{
    History, Jones, MeasurementSetWriter, ObsContext as MarluObsContext, UvfitsWriter,
    VisContext, VisWrite,
};
use ndarray::prelude::*;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use vec1::Vec1;

pub(crate) use super::error::{FileWriteError, VisWriteError};
use crate::{cli::Warn, context::Observation, math::StationBaselineMap};

/// All write-supported visibility formats.
#[derive(Debug, Display, EnumIter, EnumString, Clone, Copy)]
pub(crate) enum VisOutputType {
    #[strum(serialize = "uvfits")]
    Uvfits,
    #[strum(serialize = "ms")]
    MeasurementSet,
}

lazy_static::lazy_static! {
    pub(crate) static ref VIS_OUTPUT_EXTENSIONS: String = VisOutputType::iter().join(", ");
}

/// Work out a visibility output type from a path's extension.
pub(crate) fn vis_output_type_from_path(path: &Path) -> Result<VisOutputType, VisWriteError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match ext.as_deref() {
        Some("uvfits") => Ok(VisOutputType::Uvfits),
        Some("ms") => Ok(VisOutputType::MeasurementSet),
        _ => Err(VisWriteError::InvalidOutputFormat(
            ext.unwrap_or_else(|| "<no extension>".to_string()),
        )),
    }
}

/// A struct to carry all of the visibilities of a timestep.
pub(crate) struct VisTimestep {
    /// Cross-correlation visibilities ([channel][baseline]).
    pub(crate) cross_data_fb: Array2<Jones<f32>>,

    /// Cross-correlation weights (1:1 with the visibilities).
    pub(crate) cross_weights_fb: Array2<f32>,

    /// The timestamp corresponding to these visibilities.
    pub(crate) timestamp: hifitime::Epoch,
}

/// Create the specified visibility outputs and receive timesteps of
/// visibilities to write to them. This function is intended to be run
/// concurrently with a simulation thread; timesteps must arrive in the
/// observation's order.
///
/// # Returns
///
/// * A neatly-formatted string reporting all of the files that got written
///   out.
pub(crate) fn write_vis(
    outputs: &Vec1<(PathBuf, VisOutputType)>,
    obs: &Observation,
    rx: Receiver<VisTimestep>,
    error: &AtomicCell<bool>,
    progress_bar: Option<ProgressBar>,
) -> Result<String, VisWriteError> {
    let baseline_map = StationBaselineMap::new(obs.num_stations());
    let num_baselines = baseline_map.baseline_to_stations.len();
    let num_chans = obs.fine_chan_freqs.len();

    // Marlu expects "leading edge" timestamps, not centroids.
    let start_timestamp = *obs.timestamps.first() - obs.time_res / 2;
    let vis_ctx = VisContext {
        num_sel_timesteps: obs.timestamps.len(),
        start_timestamp,
        int_time: obs.time_res,
        num_sel_chans: num_chans,
        start_freq_hz: *obs.fine_chan_freqs.first(),
        freq_resolution_hz: obs.freq_res_hz,
        sel_baselines: baseline_map.baseline_to_stations.clone(),
        avg_time: 1,
        avg_freq: 1,
        num_vis_pols: 4,
    };

    let sched_duration = *obs.timestamps.last() + obs.time_res / 2 - start_timestamp;
    let (s_lat, c_lat) = obs.array_position.latitude_rad.sin_cos();
    let marlu_obs_ctx = MarluObsContext {
        sched_start_timestamp: start_timestamp,
        sched_duration,
        name: Some(format!("losito {}", obs.telescope)),
        phase_centre: obs.phase_centre,
        pointing_centre: Some(obs.phase_centre),
        array_pos: obs.array_position,
        ant_positions_enh: obs
            .station_xyzs
            .iter()
            .map(|xyz| xyz.to_enh_inner(s_lat, c_lat))
            .collect(),
        ant_names: obs.station_names.to_vec(),
        field_name: None,
        project_id: None,
        observer: None,
    };

    // Prepare history for the output vis files. It's possible that the
    // command-line call has invalid UTF-8. So use args_os and attempt to
    // convert to UTF-8 strings. If there are problems on the way, don't
    // bother trying to write the CMDLINE key.
    let cmd_line = std::env::args_os()
        .map(|a| a.into_string())
        .collect::<Result<Vec<String>, _>>()
        .map(|v| v.join(" "))
        .ok();
    let history = History {
        application: Some("losito"),
        cmd_line: cmd_line.as_deref(),
        message: None,
    };

    let mut writers: Vec<Box<dyn VisWrite>> = vec![];
    for (output, vis_type) in outputs {
        debug!("Setting up {} ({vis_type})", output.display());
        can_write_to_file(output)?;
        let vis_writer: Box<dyn VisWrite> = match vis_type {
            VisOutputType::Uvfits => {
                let uvfits = UvfitsWriter::from_marlu(
                    output,
                    &vis_ctx,
                    obs.array_position,
                    obs.phase_centre,
                    obs.dut1,
                    marlu_obs_ctx.name.as_deref(),
                    obs.station_names.to_vec(),
                    obs.station_xyzs.clone(),
                    false,
                    Some(&history),
                )?;
                Box::new(uvfits)
            }

            VisOutputType::MeasurementSet => {
                let ms = MeasurementSetWriter::new(
                    output,
                    obs.phase_centre,
                    obs.array_position,
                    obs.station_xyzs.clone(),
                    obs.dut1,
                    false,
                );
                ms.initialize(&vis_ctx, &marlu_obs_ctx, Some(&history))?;
                Box::new(ms)
            }
        };
        writers.push(vis_writer);
    }

    // Receive visibilities from another thread, writing them out one
    // timestep at a time.
    for (
        i_timestep,
        VisTimestep {
            cross_data_fb,
            cross_weights_fb,
            timestamp,
        },
    ) in rx.iter().enumerate()
    {
        debug!(
            "Received timestep {i_timestep} (GPS {})",
            timestamp.to_gpst_seconds()
        );
        assert_eq!(cross_data_fb.dim(), (num_chans, num_baselines));

        let chunk_vis_ctx = VisContext {
            start_timestamp: timestamp - obs.time_res / 2,
            num_sel_timesteps: 1,
            ..vis_ctx.clone()
        };

        // Add a timestep axis; marlu wants (time, channel, baseline).
        let data_tfb = cross_data_fb.insert_axis(Axis(0));
        let weights_tfb = cross_weights_fb.insert_axis(Axis(0));
        trace!("Writing timestep {i_timestep}");
        for vis_writer in writers.iter_mut() {
            vis_writer.write_vis(data_tfb.view(), weights_tfb.view(), &chunk_vis_ctx)?;
            // Should we continue?
            if error.load() {
                return Ok(String::new());
            }
        }

        if let Some(progress_bar) = progress_bar.as_ref() {
            progress_bar.inc(1);
        }
    }

    if let Some(progress_bar) = progress_bar.as_ref() {
        progress_bar.abandon_with_message("Finished writing visibilities");
    }

    for vis_writer in writers.iter_mut() {
        vis_writer.finalise()?;
    }
    debug!("Finished writing");

    let output_vis_str = if outputs.len() == 1 {
        format!("Visibilities written to {}", outputs.first().0.display())
    } else {
        format!(
            "Visibilities written to: {}",
            outputs.iter().map(|(o, _)| o.display()).join(", ")
        )
    };
    Ok(output_vis_str)
}

/// Check if we are able to write to a file path. If the containing
/// directory doesn't exist, create it. If the file exists, emit a warning
/// that it will be overwritten.
///
/// With this approach, we potentially avoid doing a whole simulation only
/// to be unable to write to a file at the end.
pub(crate) fn can_write_to_file(file: &Path) -> Result<(), FileWriteError> {
    trace!("Testing whether we can write to {}", file.display());

    if let Some(parent) = file.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|_| FileWriteError::NewDirectory(parent.to_path_buf()))?;
        }
        if !parent.as_os_str().is_empty() {
            let metadata = std::fs::metadata(parent)?;
            if metadata.permissions().readonly() {
                return Err(FileWriteError::FileNotWritable {
                    file: file.display().to_string(),
                });
            }
        }
    }
    if file.exists() {
        format!("Will overwrite the existing path '{}'", file.display()).warn();
    }

    Ok(())
}
