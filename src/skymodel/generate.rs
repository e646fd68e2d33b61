// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Synthetic sky-model generation.
//!
//! Sources are drawn from a power-law differential flux distribution and
//! placed uniformly within a radius of the field centre. A configurable
//! fraction of them are Gaussians. The bright "A-team" calibrators can be
//! appended for wide-field corruption studies.

use marlu::RADec;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{ComponentType, FluxDensity, FluxDensityType, Source, SourceComponent, SourceList};
use crate::math::sample_standard_normal;

/// The mean spectral index of the synthetic population.
const MEAN_SPEC_INDEX: f64 = -0.8;
/// The standard deviation of the synthetic spectral indices.
const SPEC_INDEX_SIGMA: f64 = 0.15;

/// The A-team: positions and 74 MHz flux densities.
const ATEAM: [(&str, f64, f64, f64, f64); 4] = [
    // (name, RA [deg], Dec [deg], I at 74 MHz [Jy], spectral index)
    ("CasA", 350.850, 58.815, 17000.0, -0.73),
    ("CygA", 299.868, 40.734, 10690.0, -0.77),
    ("TauA", 83.633, 22.014, 1340.0, -0.22),
    ("VirA", 187.706, 12.391, 1180.0, -0.86),
];

#[derive(Debug, Clone)]
pub(crate) struct GenerateFieldParams {
    /// The centre of the field.
    pub(crate) centre: RADec,

    /// The radius of the field \[radians\].
    pub(crate) radius_rad: f64,

    /// How many sources to generate.
    pub(crate) num_sources: usize,

    /// The minimum Stokes I flux density \[Jy\] at the reference frequency.
    pub(crate) min_flux_jy: f64,

    /// The maximum Stokes I flux density \[Jy\] at the reference frequency.
    pub(crate) max_flux_jy: f64,

    /// The reference frequency of the generated flux densities \[Hz\].
    pub(crate) ref_freq_hz: f64,

    /// The slope gamma of the differential source counts dN/dS ∝ S^-gamma.
    pub(crate) count_slope: f64,

    /// The fraction of sources that are Gaussians.
    pub(crate) gaussian_fraction: f64,

    /// Append the A-team calibrators?
    pub(crate) include_ateam: bool,

    /// The seed for the random number generator.
    pub(crate) seed: u64,
}

/// Draw a flux density from the power-law distribution dN/dS ∝ S^-gamma,
/// truncated to [s_min, s_max].
fn sample_flux(rng: &mut impl Rng, s_min: f64, s_max: f64, gamma: f64) -> f64 {
    let u: f64 = rng.gen();
    if (gamma - 1.0).abs() < 1e-10 {
        // The inverse CDF degenerates to log-uniform at gamma = 1.
        (s_min.ln() + u * (s_max.ln() - s_min.ln())).exp()
    } else {
        let p = 1.0 - gamma;
        (s_min.powf(p) + u * (s_max.powf(p) - s_min.powf(p))).powf(1.0 / p)
    }
}

/// Draw a position uniformly within a spherical cap around the field
/// centre.
fn sample_position(rng: &mut impl Rng, centre: RADec, radius_rad: f64) -> RADec {
    // Uniform in solid angle: cos(rho) uniform in [cos(radius), 1].
    let cos_rho = 1.0 - rng.gen::<f64>() * (1.0 - radius_rad.cos());
    let rho = cos_rho.acos();
    let theta: f64 = rng.gen::<f64>() * std::f64::consts::TAU;

    // Offset on the tangent plane; adequate for simulation fields.
    let dec = (centre.dec + rho * theta.sin()).clamp(
        -std::f64::consts::FRAC_PI_2,
        std::f64::consts::FRAC_PI_2,
    );
    let ra = centre.ra + rho * theta.cos() / centre.dec.cos().max(1e-6);
    RADec::from_radians(ra.rem_euclid(std::f64::consts::TAU), dec)
}

pub(crate) fn generate_field(params: &GenerateFieldParams) -> SourceList {
    let GenerateFieldParams {
        centre,
        radius_rad,
        num_sources,
        min_flux_jy,
        max_flux_jy,
        ref_freq_hz,
        count_slope,
        gaussian_fraction,
        include_ateam,
        seed,
    } = params;
    let mut rng = StdRng::seed_from_u64(*seed);

    let mut source_list = SourceList::new();
    for i_source in 0..*num_sources {
        let radec = sample_position(&mut rng, *centre, *radius_rad);
        let flux = sample_flux(&mut rng, *min_flux_jy, *max_flux_jy, *count_slope);
        let si = MEAN_SPEC_INDEX + SPEC_INDEX_SIGMA * sample_standard_normal(&mut rng);

        let comp_type = if rng.gen::<f64>() < *gaussian_fraction {
            // Sizes up to a few arcmin, with the minor axis and position
            // angle drawn independently.
            let maj = (10.0 + rng.gen::<f64>() * 170.0_f64).to_radians() / 3600.0;
            let min = maj * (0.3 + rng.gen::<f64>() * 0.7);
            let pa = rng.gen::<f64>() * std::f64::consts::PI;
            ComponentType::Gaussian { maj, min, pa }
        } else {
            ComponentType::Point
        };

        source_list.insert(
            format!("sim{i_source:04}"),
            Source {
                components: Box::new([SourceComponent {
                    radec,
                    comp_type,
                    flux_type: FluxDensityType::PowerLaw {
                        si,
                        fd: FluxDensity {
                            freq: *ref_freq_hz,
                            i: flux,
                            ..Default::default()
                        },
                    },
                }]),
            },
        );
    }

    if *include_ateam {
        for (name, ra_deg, dec_deg, i_74, si) in ATEAM {
            source_list.insert(
                name.to_string(),
                Source {
                    components: Box::new([SourceComponent {
                        radec: RADec::from_degrees(ra_deg, dec_deg),
                        comp_type: ComponentType::Point,
                        flux_type: FluxDensityType::PowerLaw {
                            si,
                            fd: FluxDensity {
                                freq: 74e6,
                                i: i_74,
                                ..Default::default()
                            },
                        },
                    }]),
                },
            );
        }
    }

    source_list
}

/// A single-source list for testing: `flux_jy` of Stokes I at the given
/// position and frequency.
#[cfg(test)]
pub(crate) fn single_point_source(radec: RADec, flux_jy: f64, freq_hz: f64) -> SourceList {
    let mut sl = SourceList::new();
    sl.insert(
        "test".to_string(),
        Source {
            components: Box::new([SourceComponent {
                radec,
                comp_type: ComponentType::Point,
                flux_type: FluxDensityType::List(vec1::vec1![FluxDensity {
                    freq: freq_hz,
                    i: flux_jy,
                    ..Default::default()
                }]),
            }]),
        },
    );
    sl
}
