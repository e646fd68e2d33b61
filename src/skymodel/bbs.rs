// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reading and writing of the LOFAR BBS/makesourcedb plain-text source-list
//! format.
//!
//! The first line declares the columns, e.g.
//!
//! ```text
//! format = Name, Type, Ra, Dec, I, ReferenceFrequency='150000000.0', SpectralIndex='[-0.8]', MajorAxis, MinorAxis, Orientation
//! ```
//!
//! and each following non-comment line is one component. Right ascensions
//! are sexagesimal hours (`14:11:20.90`), declinations are dot-separated
//! sexagesimal degrees (`+52.12.09.0`); both also accept plain degrees.

use std::io::{BufRead, Write};

use marlu::RADec;
use vec1::vec1;

use super::{
    error::{ReadSourceListError, WriteSourceListError},
    ComponentType, FluxDensity, FluxDensityType, Source, SourceComponent, SourceList,
};

/// The columns understood by this reader/writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Name,
    Type,
    Patch,
    Ra,
    Dec,
    I,
    Q,
    U,
    V,
    ReferenceFrequency,
    SpectralIndex,
    MajorAxis,
    MinorAxis,
    Orientation,
}

impl Column {
    fn parse(s: &str) -> Option<Column> {
        Some(match s.to_lowercase().as_str() {
            "name" => Column::Name,
            "type" => Column::Type,
            "patch" => Column::Patch,
            "ra" => Column::Ra,
            "dec" => Column::Dec,
            "i" => Column::I,
            "q" => Column::Q,
            "u" => Column::U,
            "v" => Column::V,
            "referencefrequency" => Column::ReferenceFrequency,
            "spectralindex" => Column::SpectralIndex,
            "majoraxis" => Column::MajorAxis,
            "minoraxis" => Column::MinorAxis,
            "orientation" => Column::Orientation,
            _ => return None,
        })
    }
}

/// Split a data line on commas, but not within square brackets.
fn split_fields(line: &str) -> Vec<&str> {
    let mut fields = vec![];
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in line.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                fields.push(line[start..i].trim());
                start = i + 1;
            }
            _ => (),
        }
    }
    fields.push(line[start..].trim());
    fields
}

/// Parse a right ascension, either sexagesimal hours (`hh:mm:ss.s`) or
/// decimal degrees, to radians.
fn parse_ra(s: &str) -> Result<f64, String> {
    if s.contains(':') {
        let mut parts = s.split(':');
        let (h, m, sec) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(m), Some(s), None) => (h, m, s),
            _ => return Err(format!("Malformed RA '{s}'")),
        };
        let h: f64 = h.trim().parse().map_err(|_| format!("Malformed RA '{s}'"))?;
        let m: f64 = m.trim().parse().map_err(|_| format!("Malformed RA '{s}'"))?;
        let sec: f64 = sec
            .trim()
            .parse()
            .map_err(|_| format!("Malformed RA '{s}'"))?;
        Ok(((h + m / 60.0 + sec / 3600.0) * 15.0).to_radians())
    } else {
        let deg: f64 = s.trim().parse().map_err(|_| format!("Malformed RA '{s}'"))?;
        Ok(deg.to_radians())
    }
}

/// Parse a declination, either dot-separated sexagesimal degrees
/// (`+dd.mm.ss.s`, the makesourcedb convention) or decimal degrees, to
/// radians.
fn parse_dec(s: &str) -> Result<f64, String> {
    let s = s.trim();
    // A plain number (at most one '.') is decimal degrees.
    if s.matches('.').count() <= 1 {
        let deg: f64 = s.parse().map_err(|_| format!("Malformed Dec '{s}'"))?;
        return Ok(deg.to_radians());
    }

    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, s.strip_prefix('+').unwrap_or(s)),
    };
    let parts: Vec<&str> = rest.splitn(3, '.').collect();
    if parts.len() != 3 {
        return Err(format!("Malformed Dec '{s}'"));
    }
    let d: f64 = parts[0]
        .parse()
        .map_err(|_| format!("Malformed Dec '{s}'"))?;
    let m: f64 = parts[1]
        .parse()
        .map_err(|_| format!("Malformed Dec '{s}'"))?;
    let sec: f64 = parts[2]
        .parse()
        .map_err(|_| format!("Malformed Dec '{s}'"))?;
    Ok(sign * (d + m / 60.0 + sec / 3600.0).to_radians())
}

/// Parse the leading spectral-index coefficient out of `[c0, c1, ...]`.
fn parse_spectral_index(s: &str) -> Result<Option<f64>, String> {
    let inner = s
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| format!("Malformed SpectralIndex '{s}'"))?;
    match inner.split(',').next().map(str::trim) {
        None | Some("") => Ok(None),
        Some(c0) => c0
            .parse()
            .map(Some)
            .map_err(|_| format!("Malformed SpectralIndex '{s}'")),
    }
}

pub(crate) fn parse_source_list<R: BufRead>(
    reader: R,
) -> Result<SourceList, ReadSourceListError> {
    let mut columns: Option<Vec<(Column, Option<String>)>> = None;
    let mut source_list = SourceList::new();

    for (i_line, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        let line_num = i_line + 1;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let err = |message: String| ReadSourceListError::ParseLine {
            line: line_num,
            message,
        };

        // The first useful line must be the format declaration.
        if columns.is_none() {
            let decl = line
                .to_lowercase()
                .starts_with("format")
                .then(|| line.splitn(2, '=').nth(1))
                .flatten()
                .ok_or_else(|| err("Expected a 'format = ...' declaration".to_string()))?
                .to_string();
            let mut cols = vec![];
            for field in split_fields(&decl) {
                // A column may carry a default, e.g.
                // ReferenceFrequency='150000000.0'.
                let (name, default) = match field.split_once('=') {
                    Some((name, default)) => (
                        name.trim(),
                        Some(default.trim().trim_matches('\'').trim_matches('"').to_string()),
                    ),
                    None => (field, None),
                };
                let column = Column::parse(name)
                    .ok_or_else(|| err(format!("Unrecognised column '{name}'")))?;
                cols.push((column, default));
            }
            columns = Some(cols);
            continue;
        }
        let columns = columns.as_ref().expect("set above");

        let fields = split_fields(line);
        if fields.len() > columns.len() {
            return Err(err(format!(
                "Got {} fields, but the format declares only {} columns",
                fields.len(),
                columns.len()
            )));
        }

        let mut name = None;
        let mut comp_type_str = None;
        let mut ra = None;
        let mut dec = None;
        let mut stokes = [0.0; 4];
        let mut ref_freq = None;
        let mut spec_index = None;
        let mut maj = None;
        let mut min = None;
        let mut pa = None;

        for (i_col, (column, default)) in columns.iter().enumerate() {
            // An absent or empty field falls back to the column default.
            let value = match fields.get(i_col) {
                Some(f) if !f.is_empty() => Some(f.to_string()),
                _ => default.clone(),
            };
            let value = match value {
                Some(v) => v,
                None => continue,
            };
            let parse_float = |v: &str| -> Result<f64, ReadSourceListError> {
                v.parse().map_err(|_| {
                    err(format!("Couldn't parse '{v}' as a number"))
                })
            };
            match column {
                Column::Name => name = Some(value),
                Column::Type => comp_type_str = Some(value.to_lowercase()),
                Column::Patch => (),
                Column::Ra => ra = Some(parse_ra(&value).map_err(&err)?),
                Column::Dec => dec = Some(parse_dec(&value).map_err(&err)?),
                Column::I => stokes[0] = parse_float(&value)?,
                Column::Q => stokes[1] = parse_float(&value)?,
                Column::U => stokes[2] = parse_float(&value)?,
                Column::V => stokes[3] = parse_float(&value)?,
                Column::ReferenceFrequency => ref_freq = Some(parse_float(&value)?),
                Column::SpectralIndex => {
                    spec_index = parse_spectral_index(&value).map_err(&err)?
                }
                Column::MajorAxis => maj = Some(parse_float(&value)?),
                Column::MinorAxis => min = Some(parse_float(&value)?),
                Column::Orientation => pa = Some(parse_float(&value)?),
            }
        }

        let name = name.ok_or_else(|| err("Missing Name".to_string()))?;
        let radec = match (ra, dec) {
            (Some(ra), Some(dec)) => RADec::from_radians(ra, dec),
            _ => return Err(err("Missing Ra or Dec".to_string())),
        };
        let comp_type = match comp_type_str.as_deref() {
            Some("point") | None => ComponentType::Point,
            Some("gaussian") => ComponentType::Gaussian {
                maj: maj.unwrap_or_default().to_radians() / 3600.0,
                min: min.unwrap_or_default().to_radians() / 3600.0,
                pa: pa.unwrap_or_default().to_radians(),
            },
            Some(t) => return Err(err(format!("Unrecognised component type '{t}'"))),
        };
        let fd = FluxDensity {
            freq: ref_freq.unwrap_or(150e6),
            i: stokes[0],
            q: stokes[1],
            u: stokes[2],
            v: stokes[3],
        };
        let flux_type = match spec_index {
            Some(si) => FluxDensityType::PowerLaw { si, fd },
            None => FluxDensityType::List(vec1![fd]),
        };

        source_list.insert(
            name,
            Source {
                components: Box::new([SourceComponent {
                    radec,
                    comp_type,
                    flux_type,
                }]),
            },
        );
    }

    if source_list.is_empty() {
        return Err(ReadSourceListError::Empty);
    }
    Ok(source_list)
}

/// Format a right ascension \[radians\] as sexagesimal hours.
fn format_ra(ra_rad: f64) -> String {
    let hours = (ra_rad.to_degrees() / 15.0).rem_euclid(24.0);
    let h = hours.floor();
    let minutes = (hours - h) * 60.0;
    let m = minutes.floor();
    let s = (minutes - m) * 60.0;
    format!("{:02}:{:02}:{:08.5}", h as u8, m as u8, s)
}

/// Format a declination \[radians\] in the dot-separated makesourcedb
/// convention.
fn format_dec(dec_rad: f64) -> String {
    let sign = if dec_rad < 0.0 { '-' } else { '+' };
    let dec = dec_rad.to_degrees().abs();
    let d = dec.floor();
    let minutes = (dec - d) * 60.0;
    let m = minutes.floor();
    let s = (minutes - m) * 60.0;
    format!("{sign}{:02}.{:02}.{:08.5}", d as u8, m as u8, s)
}

pub(crate) fn write_source_list<W: Write>(
    writer: &mut W,
    sl: &SourceList,
) -> Result<(), WriteSourceListError> {
    writeln!(
        writer,
        "format = Name, Type, Ra, Dec, I, Q, U, V, ReferenceFrequency='150000000.0', SpectralIndex='[]', MajorAxis, MinorAxis, Orientation"
    )?;
    writeln!(writer)?;

    for (name, source) in sl.iter() {
        for (i_comp, comp) in source.components.iter().enumerate() {
            // Components after the first get a suffix to keep names unique.
            let comp_name = if i_comp == 0 {
                name.clone()
            } else {
                format!("{name}_{i_comp}")
            };
            let (type_str, maj, min, pa) = match comp.comp_type {
                ComponentType::Point => ("POINT", String::new(), String::new(), String::new()),
                ComponentType::Gaussian { maj, min, pa } => (
                    "GAUSSIAN",
                    format!("{:.3}", maj.to_degrees() * 3600.0),
                    format!("{:.3}", min.to_degrees() * 3600.0),
                    format!("{:.3}", pa.to_degrees()),
                ),
            };
            let (fd, si_str) = match &comp.flux_type {
                FluxDensityType::PowerLaw { si, fd } => (*fd, format!("[{si}]")),
                FluxDensityType::List(fds) => (*fds.first(), "[]".to_string()),
            };
            writeln!(
                writer,
                "{comp_name}, {type_str}, {ra}, {dec}, {i}, {q}, {u}, {v}, {freq}, {si_str}, {maj}, {min}, {pa}",
                ra = format_ra(comp.radec.ra),
                dec = format_dec(comp.radec.dec),
                i = fd.i,
                q = fd.q,
                u = fd.u,
                v = fd.v,
                freq = fd.freq,
            )?;
        }
    }
    Ok(())
}
