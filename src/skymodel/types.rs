// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Structures to describe sky-model sources and their components.

use std::ops::{Deref, DerefMut};

use indexmap::IndexMap;
use marlu::{c64, Jones, RADec};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use vec1::Vec1;

use crate::constants::DEFAULT_SPEC_INDEX;

/// An [`IndexMap`] of source names for keys and [`Source`] structs for
/// values.
///
/// By making [`SourceList`] a new type, useful methods can be put onto it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceList(IndexMap<String, Source>);

impl SourceList {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Get counts of each of the component types and flux-density types.
    pub(crate) fn get_counts(&self) -> ComponentCounts {
        let mut counts = ComponentCounts::default();
        self.iter()
            .flat_map(|(_, src)| src.components.iter())
            .for_each(|c| {
                match c.comp_type {
                    ComponentType::Point => counts.num_points += 1,
                    ComponentType::Gaussian { .. } => counts.num_gaussians += 1,
                }
                match c.flux_type {
                    FluxDensityType::PowerLaw { .. } => counts.num_power_laws += 1,
                    FluxDensityType::List(_) => counts.num_lists += 1,
                }
            });
        counts
    }

    /// Filter component types from one [`SourceList`] and return a new one.
    pub(crate) fn filter(self, filter_points: bool, filter_gaussians: bool) -> SourceList {
        let sl: IndexMap<_, _> = self
            .0
            .into_iter()
            // Filter sources containing any of the rejected types.
            .filter_map(|(name, src)| {
                if !(filter_points && src.components.iter().any(|c| c.is_point())
                    || filter_gaussians && src.components.iter().any(|c| c.is_gaussian()))
                {
                    Some((name, src))
                } else {
                    None
                }
            })
            .collect();
        SourceList(sl)
    }
}

impl From<IndexMap<String, Source>> for SourceList {
    fn from(sl: IndexMap<String, Source>) -> Self {
        Self(sl)
    }
}

impl Deref for SourceList {
    type Target = IndexMap<String, Source>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for SourceList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl FromIterator<(String, Source)> for SourceList {
    fn from_iter<I: IntoIterator<Item = (String, Source)>>(iter: I) -> Self {
        let mut c = Self::new();
        for i in iter {
            c.insert(i.0, i.1);
        }
        c
    }
}

impl IntoIterator for SourceList {
    type Item = (String, Source);
    type IntoIter = indexmap::map::IntoIter<String, Source>;

    fn into_iter(self) -> indexmap::map::IntoIter<String, Source> {
        self.0.into_iter()
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ComponentCounts {
    pub(crate) num_points: usize,
    pub(crate) num_gaussians: usize,
    pub(crate) num_power_laws: usize,
    pub(crate) num_lists: usize,
}

/// A collection of components.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Source {
    /// The components associated with the source.
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub components: Box<[SourceComponent]>,
}

impl Source {
    /// Estimate the flux densities for each of a source's components given a
    /// frequency.
    pub(crate) fn get_flux_estimates(&self, freq_hz: f64) -> Vec<FluxDensity> {
        self.components
            .iter()
            .map(|comp| comp.flux_type.estimate_at_freq(freq_hz))
            .collect()
    }
}

/// Information on a source's component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceComponent {
    /// Coordinates struct associated with the component.
    #[serde(flatten)]
    pub radec: RADec,

    /// The type of component.
    pub comp_type: ComponentType,

    /// The flux densities associated with this component.
    pub flux_type: FluxDensityType,
}

impl SourceComponent {
    /// Estimate the flux density of this component at a frequency.
    pub(crate) fn estimate_at_freq(&self, freq_hz: f64) -> FluxDensity {
        self.flux_type.estimate_at_freq(freq_hz)
    }

    pub(crate) fn is_point(&self) -> bool {
        matches!(self.comp_type, ComponentType::Point)
    }

    pub(crate) fn is_gaussian(&self) -> bool {
        matches!(self.comp_type, ComponentType::Gaussian { .. })
    }
}

/// Source component types supported by losito.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Point,

    Gaussian {
        /// Major axis size \[radians\]
        #[serde(serialize_with = "radians_to_arcsecs")]
        #[serde(deserialize_with = "arcsecs_to_radians")]
        maj: f64,

        /// Minor axis size \[radians\]
        #[serde(serialize_with = "radians_to_arcsecs")]
        #[serde(deserialize_with = "arcsecs_to_radians")]
        min: f64,

        /// Position angle \[radians\]
        #[serde(serialize_with = "radians_to_degrees")]
        #[serde(deserialize_with = "degrees_to_radians")]
        pa: f64,
    },
}

fn radians_to_arcsecs<S: Serializer>(num: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(num.to_degrees() * 3600.0)
}

fn radians_to_degrees<S: Serializer>(num: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(num.to_degrees())
}

fn arcsecs_to_radians<'de, D>(d: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let num: f64 = Deserialize::deserialize(d)?;
    Ok(num.to_radians() / 3600.0)
}

fn degrees_to_radians<'de, D>(d: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let num: f64 = Deserialize::deserialize(d)?;
    Ok(num.to_radians())
}

/// At a frequency, four flux densities for each Stokes parameter.
// When serialising/deserialising, ignore Stokes Q U V if they are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FluxDensity {
    /// The frequency that these flux densities apply to \[Hz\]
    pub freq: f64,

    /// The flux density of Stokes I \[Jy\]
    pub i: f64,

    /// The flux density of Stokes Q \[Jy\]
    #[serde(default)]
    #[serde(skip_serializing_if = "is_zero")]
    pub q: f64,

    /// The flux density of Stokes U \[Jy\]
    #[serde(default)]
    #[serde(skip_serializing_if = "is_zero")]
    pub u: f64,

    /// The flux density of Stokes V \[Jy\]
    #[serde(default)]
    #[serde(skip_serializing_if = "is_zero")]
    pub v: f64,
}

impl FluxDensity {
    /// Given two flux densities, calculate the spectral index that fits
    /// them. Uses only Stokes I.
    pub(crate) fn calc_spec_index(&self, fd2: &Self) -> f64 {
        (fd2.i / self.i).ln() / (fd2.freq / self.freq).ln()
    }

    /// Convert a [`FluxDensity`] into a [`Jones`] matrix representing
    /// instrumental Stokes (i.e. XX, XY, YX, YY).
    pub(crate) fn to_inst_stokes(self) -> Jones<f64> {
        Jones::from([
            c64::new(self.i + self.q, 0.0),
            c64::new(self.u, self.v),
            c64::new(self.u, -self.v),
            c64::new(self.i - self.q, 0.0),
        ])
    }
}

/// This is only used for serialisation
#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(num: &f64) -> bool {
    num.abs() < f64::EPSILON
}

impl std::ops::Mul<f64> for FluxDensity {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        FluxDensity {
            freq: self.freq,
            i: self.i * rhs,
            q: self.q * rhs,
            u: self.u * rhs,
            v: self.v * rhs,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FluxDensityType {
    /// A list of flux densities specified at multiple frequencies.
    /// Interpolation/extrapolation is needed to get flux densities at
    /// non-specified frequencies. The entries must be ascendingly sorted by
    /// frequency.
    List(Vec1<FluxDensity>),

    /// $S_\nu = a \nu^{\alpha}$
    PowerLaw {
        /// Spectral index (alpha)
        si: f64,
        /// Flux density (a)
        fd: FluxDensity,
    },
}

impl FluxDensityType {
    /// Given flux density information, estimate the flux density at a
    /// particular frequency. For power laws, the "ratio" of the reference
    /// frequency and the specified frequency is used to scale the reference
    /// flux density.
    ///
    /// The estimated flux density is based off of the Stokes I component, so
    /// any other Stokes parameters may be poorly estimated.
    pub(crate) fn estimate_at_freq(&self, freq_hz: f64) -> FluxDensity {
        match self {
            FluxDensityType::PowerLaw { si, fd } => {
                let ratio = calc_flux_ratio(freq_hz, fd.freq, *si);
                let mut new_fd = *fd * ratio;
                new_fd.freq = freq_hz;
                new_fd
            }

            FluxDensityType::List(fds) => {
                // `smaller` is the entry with a frequency smaller than but
                // nearest to the specified frequency (or the nearest usable
                // entry when extrapolating).
                let (spec_index, smaller) = if fds.len() == 1 {
                    (DEFAULT_SPEC_INDEX, fds.first())
                } else if freq_hz <= fds.first().freq {
                    let (fd1, fd2) = (&fds[0], &fds[1]);
                    (fd1.calc_spec_index(fd2), fd1)
                } else if freq_hz >= fds.last().freq {
                    let (fd1, fd2) = (&fds[fds.len() - 2], &fds[fds.len() - 1]);
                    (fd1.calc_spec_index(fd2), fd2)
                } else {
                    let i = fds
                        .iter()
                        .position(|fd| fd.freq > freq_hz)
                        .expect("freq_hz is within the list bounds");
                    let (fd1, fd2) = (&fds[i - 1], &fds[i]);
                    (fd1.calc_spec_index(fd2), fd1)
                };

                let mut new_fd = *smaller * calc_flux_ratio(freq_hz, smaller.freq, spec_index);
                new_fd.freq = freq_hz;
                new_fd
            }
        }
    }
}

/// Given a spectral index, determine the ratio of two flux densities at
/// different frequencies.
pub(crate) fn calc_flux_ratio(desired_freq_hz: f64, cat_freq_hz: f64, spec_index: f64) -> f64 {
    (desired_freq_hz / cat_freq_hz).powf(spec_index)
}
