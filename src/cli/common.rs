// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helpers shared between the command-line interfaces: pretty printers for
//! reporting information, collected warnings, argument files and common
//! parsing.

use std::{borrow::Cow, path::Path, sync::Mutex};

use hifitime::Epoch;
use itertools::Itertools;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use super::LositoError;

const VERTICAL: char = '│';
const UP_AND_RIGHT: char = '└';
const VERTICAL_AND_RIGHT: char = '├';

lazy_static::lazy_static! {
    static ref WARNING_PRINTER: Mutex<WarningPrinter> = Mutex::new(WarningPrinter::new());

    pub(crate) static ref ARG_FILE_TYPES_COMMA_SEPARATED: String = ArgFileTypes::iter().join(", ");

    pub(crate) static ref ARG_FILE_HELP: String =
        format!("All arguments may be specified in a file. Any CLI arguments override arguments set in the file. Supported formats: {}", *ARG_FILE_TYPES_COMMA_SEPARATED);
}

#[derive(Debug, Display, EnumIter, EnumString)]
pub(crate) enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

macro_rules! unpack_arg_file {
    ($arg_file:expr) => {{
        use std::{fs::File, io::Read, str::FromStr};

        use crate::cli::common::{ArgFileTypes, ARG_FILE_TYPES_COMMA_SEPARATED};

        debug!("Attempting to parse argument file {}", $arg_file.display());

        let mut contents = String::new();
        let arg_file_type = $arg_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ArgFileTypes::from_str(&e).ok());

        match arg_file_type {
            Some(ArgFileTypes::Toml) => {
                debug!("Parsing toml file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match toml::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(LositoError::ArgFile(format!(
                            "Couldn't decode toml structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }
            Some(ArgFileTypes::Json) => {
                debug!("Parsing json file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match serde_json::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(LositoError::ArgFile(format!(
                            "Couldn't decode json structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }

            _ => {
                return Err(LositoError::ArgFile(format!(
                    "Argument file '{:?}' doesn't have a recognised file extension! Valid extensions are: {}",
                    $arg_file, *ARG_FILE_TYPES_COMMA_SEPARATED
                )))
            }
        }
    }};
}

/// Serialise arguments into a TOML file for reproducing a run.
pub(super) fn save_args_toml<T: serde::Serialize>(
    args: &T,
    path: &Path,
) -> Result<(), LositoError> {
    use std::{
        fs::File,
        io::{BufWriter, Write},
    };

    let mut f = BufWriter::new(File::create(path)?);
    let toml_str = toml::to_string(args).expect("toml serialisation error");
    f.write_all(toml_str.as_bytes())?;
    Ok(())
}

/// Parse an ISO-8601-style UTC timestamp ("2022-01-01T00:00:00").
pub(super) fn parse_iso_utc(s: &str) -> Result<Epoch, LositoError> {
    let bad = || LositoError::Generic(format!("Couldn't parse '{s}' as an ISO UTC timestamp"));
    let (date, time) = s.trim().split_once('T').ok_or_else(bad)?;
    let mut date_parts = date.split('-');
    let (y, mo, d) = match (date_parts.next(), date_parts.next(), date_parts.next()) {
        (Some(y), Some(mo), Some(d)) => (
            y.parse().map_err(|_| bad())?,
            mo.parse().map_err(|_| bad())?,
            d.parse().map_err(|_| bad())?,
        ),
        _ => return Err(bad()),
    };
    let mut time_parts = time.trim_end_matches('Z').split(':');
    let (h, mi, sec) = match (time_parts.next(), time_parts.next(), time_parts.next()) {
        (Some(h), Some(mi), Some(sec)) => (
            h.parse().map_err(|_| bad())?,
            mi.parse().map_err(|_| bad())?,
            sec.parse::<f64>().map_err(|_| bad())?,
        ),
        _ => return Err(bad()),
    };
    let whole_seconds = sec.floor();
    let nanos = ((sec - whole_seconds) * 1e9).round() as u32;
    Ok(Epoch::from_gregorian_utc(
        y,
        mo,
        d,
        h,
        mi,
        whole_seconds as u8,
        nanos,
    ))
}

/// Resolve a possibly-relative path against the directory of another file.
pub(super) fn resolve_path(base_file: &Path, path: &Path) -> std::path::PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_file
            .parent()
            .map(|dir| dir.join(path))
            .unwrap_or_else(|| path.to_path_buf())
    }
}

pub(crate) struct InfoPrinter {
    title: Cow<'static, str>,
    blocks: Vec<Vec<Cow<'static, str>>>,
}

impl InfoPrinter {
    pub(crate) fn new(title: Cow<'static, str>) -> Self {
        Self {
            title,
            blocks: vec![],
        }
    }

    pub(crate) fn push_line(&mut self, line: Cow<'static, str>) {
        self.blocks.push(vec![line]);
    }

    pub(crate) fn push_block(&mut self, block: Vec<Cow<'static, str>>) {
        self.blocks.push(block);
    }

    pub(crate) fn display(self) {
        log::info!("{}", console::style(self.title).bold());
        let num_blocks = self.blocks.len();
        for (i_block, block) in self.blocks.into_iter().enumerate() {
            let num_lines = block.len();
            for (i_line, line) in block.into_iter().enumerate() {
                let symbol = match (i_line, i_line + 1 == num_lines, i_block + 1 == num_blocks) {
                    (0, false, _) => VERTICAL_AND_RIGHT,
                    (0, _, false) => VERTICAL_AND_RIGHT,
                    (0, true, true) => UP_AND_RIGHT,
                    _ => VERTICAL,
                };
                log::info!("{symbol} {line}");
            }
        }
        log::info!("");
    }
}

struct WarningPrinter {
    blocks: Vec<Vec<Cow<'static, str>>>,
}

impl WarningPrinter {
    fn new() -> Self {
        Self { blocks: vec![] }
    }

    fn push_line(&mut self, line: Cow<'static, str>) {
        self.blocks.push(vec![line]);
    }

    fn push_block(&mut self, block: Vec<Cow<'static, str>>) {
        self.blocks.push(block);
    }

    fn display(&mut self) {
        log::debug!("Displaying warnings");
        if self.blocks.is_empty() {
            return;
        }

        log::warn!("{}", console::style("Warnings").bold());
        let num_blocks = self.blocks.len();
        for (i_block, block) in self.blocks.iter().enumerate() {
            let num_lines = block.len();
            for (i_line, line) in block.iter().enumerate() {
                let symbol = match (i_line, i_line + 1 == num_lines, i_block + 1 == num_blocks) {
                    (0, false, _) => VERTICAL_AND_RIGHT,
                    (0, _, false) => VERTICAL_AND_RIGHT,
                    (0, true, true) => UP_AND_RIGHT,
                    _ => VERTICAL,
                };
                log::warn!("{symbol} {line}");
            }
        }
        log::warn!("");
        self.blocks.clear();
    }
}

pub(crate) trait Warn {
    fn warn(self);
}

impl Warn for &'static str {
    fn warn(self) {
        WARNING_PRINTER.lock().unwrap().push_line(self.into());
    }
}

impl Warn for String {
    fn warn(self) {
        WARNING_PRINTER.lock().unwrap().push_line(self.into());
    }
}

impl Warn for Cow<'static, str> {
    fn warn(self) {
        WARNING_PRINTER.lock().unwrap().push_line(self);
    }
}

impl Warn for Vec<Cow<'static, str>> {
    fn warn(self) {
        WARNING_PRINTER.lock().unwrap().push_block(self);
    }
}

/// Print out any warnings that have been collected as CLI arguments have
/// been parsed. This should only be called once before all arguments have
/// been parsed into parameters.
pub(crate) fn display_warnings() {
    WARNING_PRINTER.lock().unwrap().display();
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn iso_utc_parsing() {
        let epoch = parse_iso_utc("2022-01-01T00:00:00").unwrap();
        let (y, mo, d, h, mi, s, _) = epoch.to_gregorian_utc();
        assert_eq!((y, mo, d, h, mi, s), (2022, 1, 1, 0, 0, 0));

        let epoch = parse_iso_utc("2023-06-15T12:30:45.5Z").unwrap();
        let (.., s, ns) = epoch.to_gregorian_utc();
        assert_eq!(s, 45);
        assert_abs_diff_eq!(ns as f64, 5e8, epsilon = 10.0);

        assert!(parse_iso_utc("not a time").is_err());
        assert!(parse_iso_utc("2022-01-01").is_err());
    }

    #[test]
    fn path_resolution() {
        let base = Path::new("/data/run/parset.toml");
        assert_eq!(
            resolve_path(base, Path::new("obs.toml")),
            Path::new("/data/run/obs.toml")
        );
        assert_eq!(
            resolve_path(base, Path::new("/elsewhere/obs.toml")),
            Path::new("/elsewhere/obs.toml")
        );
    }
}
