// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;

use super::*;

#[test]
fn test_parse_time() {
    let (quantity, unit) = parse_time("4").unwrap();
    assert_abs_diff_eq!(quantity, 4.0);
    assert_eq!(unit, TimeFormat::NoUnit);

    let (quantity, unit) = parse_time("4s").unwrap();
    assert_abs_diff_eq!(quantity, 4.0);
    assert_eq!(unit, TimeFormat::S);

    let (quantity, unit) = parse_time("2000ms").unwrap();
    assert_abs_diff_eq!(quantity, 2000.0);
    assert_eq!(unit, TimeFormat::Ms);

    let (quantity, unit) = parse_time("30 min").unwrap();
    assert_abs_diff_eq!(quantity, 30.0);
    assert_eq!(unit, TimeFormat::Min);

    let (quantity, unit) = parse_time("8H").unwrap();
    assert_abs_diff_eq!(quantity, 8.0);
    assert_eq!(unit, TimeFormat::H);

    assert_abs_diff_eq!(quantity * unit.to_seconds(), 28800.0);
}

#[test]
fn test_parse_freq() {
    let (quantity, unit) = parse_freq("40").unwrap();
    assert_abs_diff_eq!(quantity, 40.0);
    assert_eq!(unit, FreqFormat::NoUnit);

    let (quantity, unit) = parse_freq("195.3125kHz").unwrap();
    assert_abs_diff_eq!(quantity, 195.3125);
    assert_eq!(unit, FreqFormat::kHz);

    let (quantity, unit) = parse_freq("54MHz").unwrap();
    assert_abs_diff_eq!(quantity, 54.0);
    assert_eq!(unit, FreqFormat::MHz);

    assert_abs_diff_eq!(quantity * unit.to_hz(), 54e6);
}

#[test]
fn test_parse_malformed() {
    assert!(parse_time("4q").is_err());
    assert!(parse_time("s").is_err());
    assert!(parse_freq("forty hz").is_err());
    assert!(parse_freq("").is_err());
}
