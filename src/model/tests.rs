// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use marlu::Jones;
use ndarray::prelude::*;

use super::*;
use crate::{
    context::tests::simple_obs,
    skymodel::{
        generate::single_point_source, ComponentType, FluxDensity, FluxDensityType, Source,
        SourceComponent,
    },
};

#[test]
fn point_source_at_phase_centre_gives_unit_visibilities() {
    let obs = simple_obs(5, 1, 3);
    let source_list = single_point_source(obs.phase_centre, 1.0, *obs.fine_chan_freqs.first());
    let freqs: Vec<f64> = obs.fine_chan_freqs.iter().copied().collect();
    let modeller = SkyModeller::new(
        &source_list,
        &obs.station_xyzs,
        &freqs,
        obs.phase_centre,
        obs.array_position.longitude_rad,
        obs.array_position.latitude_rad,
        obs.dut1,
        false,
    );

    let num_baselines = obs.num_cross_baselines();
    let mut vis_fb = Array2::default((freqs.len(), num_baselines));
    let uvws = modeller.model_timestep_with(*obs.timestamps.first(), vis_fb.view_mut());
    assert_eq!(uvws.len(), num_baselines);

    for vis in vis_fb.iter() {
        // XX and YY are the Stokes I flux; the cross hands are empty.
        assert_abs_diff_eq!(vis[0].re, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(vis[0].im, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(vis[3].re, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(vis[1].norm(), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(vis[2].norm(), 0.0, epsilon = 1e-6);
    }
}

#[test]
fn offset_point_source_keeps_its_amplitude() {
    let obs = simple_obs(5, 1, 2);
    let offset = marlu::RADec::from_radians(
        obs.phase_centre.ra + 0.01,
        obs.phase_centre.dec - 0.005,
    );
    let source_list = single_point_source(offset, 2.5, *obs.fine_chan_freqs.first());
    let freqs: Vec<f64> = obs.fine_chan_freqs.iter().copied().collect();
    let modeller = SkyModeller::new(
        &source_list,
        &obs.station_xyzs,
        &freqs,
        obs.phase_centre,
        obs.array_position.longitude_rad,
        obs.array_position.latitude_rad,
        obs.dut1,
        false,
    );

    let mut vis_fb = Array2::default((freqs.len(), obs.num_cross_baselines()));
    modeller.model_timestep_with(*obs.timestamps.first(), vis_fb.view_mut());

    let mut saw_phase = false;
    for vis in vis_fb.iter() {
        // A phase slope moves power into the imaginary part, but a single
        // point source keeps its amplitude on every baseline.
        assert_abs_diff_eq!(vis[0].norm(), 2.5, epsilon = 1e-4);
        assert_abs_diff_eq!(vis[3].norm(), 2.5, epsilon = 1e-4);
        if vis[0].im.abs() > 1e-3 {
            saw_phase = true;
        }
    }
    assert!(saw_phase, "an offset source must produce non-zero phases");
}

#[test]
fn gaussians_are_attenuated_on_long_baselines() {
    let obs = simple_obs(10, 1, 1);
    let freqs: Vec<f64> = obs.fine_chan_freqs.iter().copied().collect();

    let mut source_list = single_point_source(obs.phase_centre, 1.0, freqs[0]);
    source_list.insert(
        "blob".to_string(),
        Source {
            components: Box::new([SourceComponent {
                radec: obs.phase_centre,
                comp_type: ComponentType::Gaussian {
                    // A very extended source.
                    maj: (3600.0_f64).to_radians() / 3600.0,
                    min: (3600.0_f64).to_radians() / 3600.0,
                    pa: 0.0,
                },
                flux_type: FluxDensityType::List(vec1::vec1![FluxDensity {
                    freq: freqs[0],
                    i: 1.0,
                    ..Default::default()
                }]),
            }]),
        },
    );

    let modeller = SkyModeller::new(
        &source_list,
        &obs.station_xyzs,
        &freqs,
        obs.phase_centre,
        obs.array_position.longitude_rad,
        obs.array_position.latitude_rad,
        obs.dut1,
        false,
    );
    let mut vis_fb = Array2::default((1, obs.num_cross_baselines()));
    let uvws = modeller.model_timestep_with(*obs.timestamps.first(), vis_fb.view_mut());

    // On the longest baseline the Gaussian contributes less than the point,
    // so the total sits between 1 and 2 Jy; at the phase centre both
    // components are unresolved only for short baselines.
    let (i_longest, _) = uvws
        .iter()
        .enumerate()
        .map(|(i, uvw)| (i, uvw.u.hypot(uvw.v)))
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
        .unwrap();
    let longest: Jones<f32> = vis_fb[(0, i_longest)];
    assert!(longest[0].norm() < 2.0);
    assert!(longest[0].norm() >= 1.0 - 1e-4);
}

#[test]
fn precession_changes_uvws_only_slightly() {
    let obs = simple_obs(4, 1, 1);
    let source_list = single_point_source(obs.phase_centre, 1.0, *obs.fine_chan_freqs.first());
    let freqs: Vec<f64> = obs.fine_chan_freqs.iter().copied().collect();

    let mut uvws = vec![];
    for precess in [false, true] {
        let modeller = SkyModeller::new(
            &source_list,
            &obs.station_xyzs,
            &freqs,
            obs.phase_centre,
            obs.array_position.longitude_rad,
            obs.array_position.latitude_rad,
            obs.dut1,
            precess,
        );
        let mut vis_fb = Array2::default((1, obs.num_cross_baselines()));
        uvws.push(modeller.model_timestep_with(*obs.timestamps.first(), vis_fb.view_mut()));
    }

    for (u1, u2) in uvws[0].iter().zip(uvws[1].iter()) {
        let b1 = (u1.u.powi(2) + u1.v.powi(2) + u1.w.powi(2)).sqrt();
        let b2 = (u2.u.powi(2) + u2.v.powi(2) + u2.w.powi(2)).sqrt();
        // Precession rotates baselines; it doesn't stretch them.
        assert_abs_diff_eq!(b1, b2, epsilon = 1e-3 * b1.max(1.0));
        // But the components should differ.
        assert!((u1.u - u2.u).abs() + (u1.v - u2.v).abs() > 1e-9);
    }
}
