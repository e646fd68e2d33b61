// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Some general mathematical routines.

/// A map between cross-correlation baselines and their constituent stations.
/// Simulated observations have no flagged stations, so the map is dense:
/// baseline 0 is always between stations 0 and 1.
#[derive(Debug, Clone)]
pub(crate) struct StationBaselineMap {
    /// The station indices for each cross-correlation baseline.
    pub(crate) baseline_to_stations: Vec<(usize, usize)>,
}

impl StationBaselineMap {
    pub(crate) fn new(num_stations: usize) -> StationBaselineMap {
        let mut baseline_to_stations =
            Vec::with_capacity(num_cross_baselines(num_stations));
        for s1 in 0..num_stations {
            for s2 in s1 + 1..num_stations {
                baseline_to_stations.push((s1, s2));
            }
        }
        StationBaselineMap {
            baseline_to_stations,
        }
    }
}

/// The number of cross-correlation baselines for a number of stations.
pub(crate) fn num_cross_baselines(num_stations: usize) -> usize {
    num_stations * num_stations.saturating_sub(1) / 2
}

/// Draw from the standard normal distribution via the Box-Muller transform.
pub(crate) fn sample_standard_normal(rng: &mut impl rand::Rng) -> f64 {
    // Avoid ln(0).
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Linearly interpolate a tabulated function at `x`. `xs` must be
/// ascendingly sorted and the same length as `ys`; outside the table the
/// boundary values are used.
pub(crate) fn linear_interp(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    debug_assert_eq!(xs.len(), ys.len());
    debug_assert!(!xs.is_empty());

    match xs.iter().position(|&x0| x0 >= x) {
        Some(0) => ys[0],
        None => ys[ys.len() - 1],
        Some(i) => {
            let frac = (x - xs[i - 1]) / (xs[i] - xs[i - 1]);
            ys[i - 1] + frac * (ys[i] - ys[i - 1])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    #[test]
    fn baseline_map_is_dense_and_ordered() {
        let map = StationBaselineMap::new(4);
        assert_eq!(
            map.baseline_to_stations,
            [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]
        );
        assert_eq!(num_cross_baselines(4), 6);
        assert_eq!(num_cross_baselines(0), 0);
        assert_eq!(num_cross_baselines(1), 0);
    }

    #[test]
    fn linear_interp_interior_and_clamped() {
        let xs = [0.0, 1.0, 3.0];
        let ys = [0.0, 2.0, 4.0];
        assert_abs_diff_eq!(linear_interp(&xs, &ys, 0.5), 1.0);
        assert_abs_diff_eq!(linear_interp(&xs, &ys, 2.0), 3.0);
        assert_abs_diff_eq!(linear_interp(&xs, &ys, -1.0), 0.0);
        assert_abs_diff_eq!(linear_interp(&xs, &ys, 10.0), 4.0);
        assert_abs_diff_eq!(linear_interp(&xs, &ys, 1.0), 2.0);
    }
}
