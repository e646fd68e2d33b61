// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! General tests against sky-model source lists.

use approx::assert_abs_diff_eq;
use indoc::indoc;
use marlu::RADec;
use vec1::vec1;

use super::{
    bbs,
    generate::{generate_field, GenerateFieldParams},
    read::{from_json, from_yaml},
    *,
};

fn small_source_list() -> SourceList {
    let mut sl = SourceList::new();
    sl.insert(
        "pl".to_string(),
        Source {
            components: Box::new([SourceComponent {
                radec: RADec::from_degrees(10.0, 45.0),
                comp_type: ComponentType::Point,
                flux_type: FluxDensityType::PowerLaw {
                    si: -0.7,
                    fd: FluxDensity {
                        freq: 150e6,
                        i: 2.0,
                        ..Default::default()
                    },
                },
            }]),
        },
    );
    sl.insert(
        "gauss".to_string(),
        Source {
            components: Box::new([SourceComponent {
                radec: RADec::from_degrees(11.0, 44.0),
                comp_type: ComponentType::Gaussian {
                    maj: (60.0_f64).to_radians() / 3600.0,
                    min: (30.0_f64).to_radians() / 3600.0,
                    pa: (45.0_f64).to_radians(),
                },
                flux_type: FluxDensityType::List(vec1![
                    FluxDensity {
                        freq: 120e6,
                        i: 1.0,
                        ..Default::default()
                    },
                    FluxDensity {
                        freq: 180e6,
                        i: 0.5,
                        ..Default::default()
                    },
                ]),
            }]),
        },
    );
    sl
}

#[test]
fn power_law_estimation_is_exact() {
    let fdt = FluxDensityType::PowerLaw {
        si: -0.8,
        fd: FluxDensity {
            freq: 150e6,
            i: 1.0,
            ..Default::default()
        },
    };
    let fd = fdt.estimate_at_freq(300e6);
    assert_abs_diff_eq!(fd.i, (2.0_f64).powf(-0.8), epsilon = 1e-12);
    assert_abs_diff_eq!(fd.freq, 300e6);

    // At the reference frequency, the reference flux comes back.
    let fd = fdt.estimate_at_freq(150e6);
    assert_abs_diff_eq!(fd.i, 1.0, epsilon = 1e-12);
}

#[test]
fn list_estimation_interpolates_between_entries() {
    let fdt = FluxDensityType::List(vec1![
        FluxDensity {
            freq: 100e6,
            i: 1.0,
            ..Default::default()
        },
        FluxDensity {
            freq: 200e6,
            i: 0.5,
            ..Default::default()
        },
    ]);
    // The implied spectral index between the two entries.
    let si = (0.5_f64).ln() / (2.0_f64).ln();
    let fd = fdt.estimate_at_freq(150e6);
    assert_abs_diff_eq!(fd.i, (1.5_f64).powf(si), epsilon = 1e-12);

    // Extrapolation uses the boundary pair.
    let fd = fdt.estimate_at_freq(400e6);
    assert_abs_diff_eq!(fd.i, 0.5 * (2.0_f64).powf(si), epsilon = 1e-12);
}

#[test]
fn counts_and_filtering() {
    let sl = small_source_list();
    let counts = sl.get_counts();
    assert_eq!(
        counts,
        ComponentCounts {
            num_points: 1,
            num_gaussians: 1,
            num_power_laws: 1,
            num_lists: 1,
        }
    );

    let filtered = sl.filter(false, true);
    assert_eq!(filtered.len(), 1);
    assert!(filtered.contains_key("pl"));
}

#[test]
fn yaml_round_trip() {
    let sl = small_source_list();
    let yaml = serde_yaml::to_string(&sl).unwrap();
    let sl2 = from_yaml(std::io::Cursor::new(yaml)).unwrap();
    assert_eq!(sl.len(), sl2.len());
    assert_eq!(sl["pl"], sl2["pl"]);
    assert_eq!(sl["gauss"], sl2["gauss"]);
}

#[test]
fn json_round_trip() {
    let sl = small_source_list();
    let json = serde_json::to_string(&sl).unwrap();
    let sl2 = from_json(std::io::Cursor::new(json)).unwrap();
    assert_eq!(sl.len(), sl2.len());
    assert_eq!(sl["pl"], sl2["pl"]);
}

#[test]
fn bbs_round_trip() {
    let sl = small_source_list();
    let mut buf = vec![];
    bbs::write_source_list(&mut buf, &sl).unwrap();
    let sl2 = bbs::parse_source_list(std::io::Cursor::new(buf)).unwrap();

    assert_eq!(sl.len(), sl2.len());
    let pl = &sl2["pl"].components[0];
    assert_abs_diff_eq!(pl.radec.ra, sl["pl"].components[0].radec.ra, epsilon = 1e-8);
    assert_abs_diff_eq!(pl.radec.dec, sl["pl"].components[0].radec.dec, epsilon = 1e-8);
    match &pl.flux_type {
        FluxDensityType::PowerLaw { si, fd } => {
            assert_abs_diff_eq!(*si, -0.7);
            assert_abs_diff_eq!(fd.i, 2.0);
            assert_abs_diff_eq!(fd.freq, 150e6);
        }
        _ => panic!("expected a power law"),
    }

    // The Gaussian's shape survives (the flux list collapses to its first
    // entry; that is the format's limitation).
    match &sl2["gauss"].components[0].comp_type {
        ComponentType::Gaussian { maj, min, pa } => {
            assert_abs_diff_eq!(maj.to_degrees() * 3600.0, 60.0, epsilon = 1e-3);
            assert_abs_diff_eq!(min.to_degrees() * 3600.0, 30.0, epsilon = 1e-3);
            assert_abs_diff_eq!(pa.to_degrees(), 45.0, epsilon = 1e-3);
        }
        _ => panic!("expected a gaussian"),
    }
}

#[test]
fn bbs_parses_handwritten_input() {
    let input = indoc! {"
        # A comment.
        format = Name, Type, Ra, Dec, I, ReferenceFrequency='74000000', SpectralIndex='[-0.8]', MajorAxis, MinorAxis, Orientation

        3C196, POINT, 08:13:36.05, +48.13.02.6, 83.1, 150000000, [-0.73], , ,
        blob, GAUSSIAN, 08:20:00.00, +47.00.00.0, 2.5, , , 120, 60, 30
    "};
    let sl = bbs::parse_source_list(std::io::Cursor::new(input)).unwrap();
    assert_eq!(sl.len(), 2);

    let c = &sl["3C196"].components[0];
    let expected_ra = (8.0 + 13.0 / 60.0 + 36.05 / 3600.0) * 15.0;
    assert_abs_diff_eq!(c.radec.ra.to_degrees(), expected_ra, epsilon = 1e-9);
    match &c.flux_type {
        FluxDensityType::PowerLaw { si, fd } => {
            assert_abs_diff_eq!(*si, -0.73);
            assert_abs_diff_eq!(fd.freq, 150e6);
            assert_abs_diff_eq!(fd.i, 83.1);
        }
        _ => panic!("expected a power law"),
    }

    // The blob picks up the header defaults for frequency and spectral
    // index.
    let c = &sl["blob"].components[0];
    match &c.flux_type {
        FluxDensityType::PowerLaw { si, fd } => {
            assert_abs_diff_eq!(*si, -0.8);
            assert_abs_diff_eq!(fd.freq, 74e6);
        }
        _ => panic!("expected a power law"),
    }
}

#[test]
fn bbs_rejects_garbage() {
    assert!(bbs::parse_source_list(std::io::Cursor::new("not a source list")).is_err());
    let missing_dec = indoc! {"
        format = Name, Type, Ra, Dec, I
        s1, POINT, 08:13:36.05, , 1.0
    "};
    assert!(bbs::parse_source_list(std::io::Cursor::new(missing_dec)).is_err());
}

#[test]
fn generated_fields_are_deterministic_and_bounded() {
    let params = GenerateFieldParams {
        centre: RADec::from_degrees(180.0, 45.0),
        radius_rad: (5.0_f64).to_radians(),
        num_sources: 50,
        min_flux_jy: 0.1,
        max_flux_jy: 10.0,
        ref_freq_hz: 54e6,
        count_slope: 1.6,
        gaussian_fraction: 0.2,
        include_ateam: false,
        seed: 42,
    };
    let sl1 = generate_field(&params);
    let sl2 = generate_field(&params);
    assert_eq!(sl1.len(), 50);
    for ((n1, s1), (n2, s2)) in sl1.iter().zip(sl2.iter()) {
        assert_eq!(n1, n2);
        assert_eq!(s1, s2);
    }

    for (_, source) in sl1.iter() {
        let fd = source.components[0].estimate_at_freq(54e6);
        assert!((0.1..=10.0).contains(&fd.i), "flux {} out of bounds", fd.i);
        let sep = source.components[0].radec.separation(params.centre);
        assert!(sep <= params.radius_rad * 1.5, "separation {sep} too large");
    }

    let with_ateam = generate_field(&GenerateFieldParams {
        include_ateam: true,
        ..params
    });
    assert_eq!(with_ateam.len(), 54);
    assert!(with_ateam.contains_key("CygA"));
}
