// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use clap::Parser;

use losito::cli::Losito;

fn main() {
    // Not returning Result from main; that prints the debug representation
    // of the error.
    if let Err(e) = Losito::parse().run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
