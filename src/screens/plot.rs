// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Rendering TEC screens to bitmaps. Only available with the "plotting"
//! feature.

use std::path::Path;

use ndarray::prelude::*;
use plotters::prelude::*;

use super::{ScreenError, TecScreenCube};

/// Pixels per screen pixel in the rendered bitmap.
const SCALE: u32 = 4;

/// Render one plane of a screen cube as a PNG heatmap. Blue is negative
/// dTEC, red positive, white zero.
pub(crate) fn plot_screen(
    cube: &TecScreenCube,
    i_time: usize,
    file: &Path,
) -> Result<(), ScreenError> {
    let plane = cube.data.index_axis(Axis(0), i_time);
    let size = cube.spec.size;

    let max_abs = plane
        .iter()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        .max(1e-9);

    let dims = (size as u32 * SCALE, size as u32 * SCALE);
    let root = BitMapBackend::new(file, dims).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| ScreenError::Plotting(e.to_string()))?;

    let cells = root.split_evenly((size, size));
    for (i_cell, cell) in cells.iter().enumerate() {
        // `split_evenly` walks rows top to bottom; flip so north is up.
        let i_y = size - 1 - i_cell / size;
        let i_x = i_cell % size;
        let v = plane[(i_y, i_x)] / max_abs;
        let colour = if v >= 0.0 {
            RGBColor(
                255,
                (255.0 * (1.0 - v)) as u8,
                (255.0 * (1.0 - v)) as u8,
            )
        } else {
            RGBColor(
                (255.0 * (1.0 + v)) as u8,
                (255.0 * (1.0 + v)) as u8,
                255,
            )
        };
        cell.fill(&colour)
            .map_err(|e| ScreenError::Plotting(e.to_string()))?;
    }

    root.present()
        .map_err(|e| ScreenError::Plotting(e.to_string()))?;
    Ok(())
}
