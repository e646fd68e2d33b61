// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to generate sky-model visibilities on the CPU.
//!
//! There are no station beam responses here; in this simulator all
//! station-dependent effects enter as corruption operations applied on top
//! of the ideal model visibilities.

#[cfg(test)]
mod tests;

use std::{borrow::Cow, f64::consts::{FRAC_PI_2, LN_2}};

use hifitime::{Duration, Epoch};
use log::debug;
use marlu::{
    c64,
    pos::xyz::xyzs_to_cross_uvws,
    precession::{get_lmst, precess_time},
    Jones, LmnRime, RADec, XyzGeodetic, UVW,
};
use ndarray::{parallel::prelude::*, prelude::*};

use crate::{
    constants::VEL_C,
    skymodel::{ComponentType, SourceList},
};

const GAUSSIAN_EXP_CONST: f64 = -(FRAC_PI_2 * FRAC_PI_2) / LN_2;

/// The parameters of a Gaussian component, ready for enveloping.
#[derive(Debug, Clone, Copy)]
struct GaussianParams {
    /// Major axis size \[radians\]
    maj: f64,
    /// Minor axis size \[radians\]
    min: f64,
    /// Position angle \[radians\]
    pa: f64,
}

/// Sky-model components flattened into arrays, with their instrumental
/// flux densities evaluated per fine channel.
#[derive(Debug, Default)]
struct ComponentArrays {
    lmns: Vec<LmnRime>,

    /// Instrumental flux densities, (channel, component).
    fds: Array2<Jones<f64>>,

    /// Only populated for Gaussian components.
    gaussian_params: Vec<GaussianParams>,
}

pub(crate) struct SkyModeller<'a> {
    /// The phase centre used for all modelling.
    phase_centre: RADec,
    /// The longitude of the array we're using \[radians\].
    array_longitude: f64,
    /// The latitude of the array we're using \[radians\].
    array_latitude: f64,
    /// UT1 - UTC.
    dut1: Duration,
    /// Shift baselines and LSTs back to J2000.
    precess: bool,

    fine_chan_freqs: &'a [f64],
    station_xyzs: &'a [XyzGeodetic],

    points: ComponentArrays,
    gaussians: ComponentArrays,
}

impl<'a> SkyModeller<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        source_list: &SourceList,
        station_xyzs: &'a [XyzGeodetic],
        fine_chan_freqs: &'a [f64],
        phase_centre: RADec,
        array_longitude_rad: f64,
        array_latitude_rad: f64,
        dut1: Duration,
        apply_precession: bool,
    ) -> SkyModeller<'a> {
        let mut points = ComponentArrays::default();
        let mut gaussians = ComponentArrays::default();
        let mut point_fds = vec![];
        let mut gaussian_fds = vec![];

        for comp in source_list
            .values()
            .flat_map(|src| src.components.iter())
        {
            let lmn = comp.radec.to_lmn(phase_centre).prepare_for_rime();
            match comp.comp_type {
                ComponentType::Point => {
                    points.lmns.push(lmn);
                    point_fds.push(&comp.flux_type);
                }
                ComponentType::Gaussian { maj, min, pa } => {
                    gaussians.lmns.push(lmn);
                    gaussians.gaussian_params.push(GaussianParams { maj, min, pa });
                    gaussian_fds.push(&comp.flux_type);
                }
            }
        }

        // Evaluate the instrumental flux densities per channel up front.
        let to_fds = |flux_types: &[&crate::skymodel::FluxDensityType]| {
            Array2::from_shape_fn(
                (fine_chan_freqs.len(), flux_types.len()),
                |(i_freq, i_comp)| {
                    flux_types[i_comp]
                        .estimate_at_freq(fine_chan_freqs[i_freq])
                        .to_inst_stokes()
                },
            )
        };
        points.fds = to_fds(&point_fds);
        gaussians.fds = to_fds(&gaussian_fds);

        SkyModeller {
            phase_centre,
            array_longitude: array_longitude_rad,
            array_latitude: array_latitude_rad,
            dut1,
            precess: apply_precession,
            fine_chan_freqs,
            station_xyzs,
            points,
            gaussians,
        }
    }

    /// For a timestamp, get the LST and station [`UVW`]s. These depend on
    /// whether we're precessing.
    fn get_lst_uvws(&self, timestamp: Epoch) -> (f64, Vec<UVW>) {
        let (lst, xyzs) = if self.precess {
            let precession_info = precess_time(
                self.array_longitude,
                self.array_latitude,
                self.phase_centre,
                timestamp,
                self.dut1,
            );
            // Apply precession to the station XYZ positions.
            let precessed_xyzs = precession_info.precess_xyz(self.station_xyzs);
            debug!(
                "Modelling GPS timestamp {}, LMST {}°, J2000 LMST {}°",
                timestamp.to_gpst_seconds(),
                precession_info.lmst.to_degrees(),
                precession_info.lmst_j2000.to_degrees()
            );
            (precession_info.lmst_j2000, Cow::from(precessed_xyzs))
        } else {
            let lst = get_lmst(self.array_longitude, timestamp, self.dut1);
            debug!(
                "Modelling GPS timestamp {}, LMST {}°",
                timestamp.to_gpst_seconds(),
                lst.to_degrees()
            );
            (lst, Cow::from(self.station_xyzs))
        };

        let uvws = xyzs_to_cross_uvws(&xyzs, self.phase_centre.to_hadec(lst));
        (lst, uvws)
    }

    /// For a single timestep, generate model visibilities for all sky-model
    /// components.
    ///
    /// `vis_fb`: a mutable view with dimensions `[channel][baseline]`; the
    /// number of baselines must match the number of cross-correlation
    /// baselines of the station layout. Modelled visibilities are *added*
    /// to this array.
    ///
    /// The returned [`UVW`]s are the metre-scale baseline coordinates of
    /// this timestep.
    pub(crate) fn model_timestep_with(
        &self,
        timestamp: Epoch,
        mut vis_fb: ArrayViewMut2<Jones<f32>>,
    ) -> Vec<UVW> {
        let (_, uvws) = self.get_lst_uvws(timestamp);
        assert_eq!(
            vis_fb.len_of(Axis(1)),
            uvws.len(),
            "vis_fb.len_of(Axis(1)) != uvws.len()"
        );
        assert_eq!(
            vis_fb.len_of(Axis(0)),
            self.fine_chan_freqs.len(),
            "vis_fb.len_of(Axis(0)) != fine_chan_freqs.len()"
        );

        self.model_points(vis_fb.view_mut(), &uvws);
        self.model_gaussians(vis_fb.view_mut(), &uvws);
        uvws
    }

    fn model_points(&self, mut vis_fb: ArrayViewMut2<Jones<f32>>, uvws: &[UVW]) {
        if self.points.lmns.is_empty() {
            return;
        }
        let fds = &self.points.fds;
        let lmns = &self.points.lmns;

        // Iterate over the baseline axis.
        vis_fb
            .axis_iter_mut(Axis(1))
            .into_par_iter()
            .zip(uvws.par_iter())
            .for_each(|(mut vis_f, &uvw)| {
                vis_f
                    .iter_mut()
                    .zip(fds.outer_iter())
                    .zip(self.fine_chan_freqs)
                    .for_each(|((vis, comp_fds), freq)| {
                        // Divide UVW by lambda to make UVW dimensionless.
                        let UVW { u, v, w } = uvw * *freq / VEL_C;

                        // Accumulate the double-precision visibilities into
                        // a double-precision Jones matrix before demoting.
                        let mut jones_accum: Jones<f64> = Jones::default();
                        comp_fds.iter().zip(lmns.iter()).for_each(
                            |(comp_fd, &LmnRime { l, m, n })| {
                                jones_accum += *comp_fd * c64::cis(u * l + v * m + w * n);
                            },
                        );
                        *vis += Jones::from(jones_accum);
                    });
            });
    }

    fn model_gaussians(&self, mut vis_fb: ArrayViewMut2<Jones<f32>>, uvws: &[UVW]) {
        if self.gaussians.lmns.is_empty() {
            return;
        }
        let fds = &self.gaussians.fds;
        let lmns = &self.gaussians.lmns;
        let gaussian_params = &self.gaussians.gaussian_params;

        vis_fb
            .axis_iter_mut(Axis(1))
            .into_par_iter()
            .zip(uvws.par_iter())
            .for_each(|(mut vis_f, &uvw)| {
                vis_f
                    .iter_mut()
                    .zip(fds.outer_iter())
                    .zip(self.fine_chan_freqs)
                    .for_each(|((vis, comp_fds), freq)| {
                        let UVW { u, v, w } = uvw * *freq / VEL_C;

                        let envelopes = gaussian_params.iter().map(|g_params| {
                            let (s_pa, c_pa) = g_params.pa.sin_cos();
                            // Temporary variables for clarity.
                            let k_x = u * s_pa + v * c_pa;
                            let k_y = u * c_pa - v * s_pa;
                            (GAUSSIAN_EXP_CONST
                                * (g_params.maj.powi(2) * k_x.powi(2)
                                    + g_params.min.powi(2) * k_y.powi(2)))
                            .exp()
                        });

                        let mut jones_accum: Jones<f64> = Jones::default();
                        comp_fds
                            .iter()
                            .zip(lmns.iter())
                            .zip(envelopes)
                            .for_each(|((comp_fd, &LmnRime { l, m, n }), envelope)| {
                                jones_accum +=
                                    *comp_fd * c64::cis(u * l + v * m + w * n) * envelope;
                            });
                        *vis += Jones::from(jones_accum);
                    });
            });
    }
}
