// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command-line interface code for the four losito executables. The
//! argument structs here are raw user inputs; their `parse` methods turn
//! them into validated parameter structs in [`crate::params`].
//!
//! All booleans must have `#[serde(default)]` annotated, and anything that
//! isn't a boolean must be optional. This allows all arguments to be
//! optional *and* usable in an arguments file.

#[macro_use]
pub(crate) mod common;
mod error;
mod losito;
mod skymodel;
mod synthms;
mod tecscreen;

pub(crate) use common::Warn;
pub use error::LositoError;
pub use losito::Losito;
pub use skymodel::Skymodel;
pub use synthms::Synthms;
pub use tecscreen::Tecscreen;

use clap::Args;
use log::info;

use crate::PROGRESS_BARS;

// Add build-time information from the "built" crate.
include!(concat!(env!("OUT_DIR"), "/built.rs"));

/// Arguments every executable takes.
#[derive(Debug, Clone, Default, Args, serde::Serialize, serde::Deserialize)]
pub(crate) struct GlobalArgs {
    /// Don't draw progress bars.
    #[clap(long)]
    #[serde(default)]
    pub(crate) no_progress_bars: bool,

    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv). The default is to print only high-level information.
    #[clap(short, long, parse(from_occurrences))]
    #[serde(default)]
    pub(crate) verbosity: u8,

    /// Only verify that arguments were correctly ingested and print out
    /// high-level information.
    #[clap(long)]
    #[serde(default)]
    pub(crate) dry_run: bool,

    /// Save the input arguments into a new TOML file that can be used to
    /// reproduce this run.
    #[clap(long)]
    pub(crate) save_toml: Option<std::path::PathBuf>,
}

/// Set up logging, progress bars and the startup banner. Returns whether
/// this is a dry run.
pub(super) fn startup(tool: &str, global: &GlobalArgs) -> bool {
    setup_logging(global.verbosity).expect("Failed to initialise logging.");
    // Enable progress bars if the user didn't say "no progress bars".
    if !global.no_progress_bars {
        PROGRESS_BARS.store(true);
    }

    info!("losito {tool} {}", env!("CARGO_PKG_VERSION"));
    display_build_info();
    global.dry_run
}

/// Activate a logger. All log messages are put onto `stdout`. `env_logger`
/// automatically only uses colours and fancy symbols if we're on a tty
/// (e.g. a terminal); piped output will be formatted sensibly. Source code
/// lines are displayed in log messages when verbosity >= 3.
fn setup_logging(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stdout);
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Info),
        1 => builder.filter_level(log::LevelFilter::Debug),
        2 => builder.filter_level(log::LevelFilter::Trace),
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
            builder.format(|buf, record| {
                use std::io::Write;

                let timestamp = buf.timestamp();
                let level = record.level();
                let target = record.target();
                let line = record.line().unwrap_or(0);
                let message = record.args();

                writeln!(buf, "[{timestamp} {level} {target}:{line}] {message}")
            })
        }
    };
    builder.init();

    Ok(())
}

/// Write many info-level log lines of how this executable was compiled.
fn display_build_info() {
    let dirty = match GIT_DIRTY {
        Some(true) => " (dirty)",
        _ => "",
    };
    match GIT_COMMIT_HASH_SHORT {
        Some(hash) => {
            info!("Compiled on git commit hash: {hash}{dirty}");
        }
        None => info!("Compiled on git commit hash: <no git info>"),
    }
    if let Some(hr) = GIT_HEAD_REF {
        info!("            git head ref: {}", hr);
    }
    info!("            {}", BUILT_TIME_UTC);
    info!("         with compiler {}", RUSTC_VERSION);
    info!("");
}
