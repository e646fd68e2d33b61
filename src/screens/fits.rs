// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reading and writing TEC screen cubes as FITS files.
//!
//! The layout is a primary HDU carrying the screen spec in header keys, a
//! "SCREEN" image HDU with the (time, y, x) dTEC cube, and a "TIMES" binary
//! table with one GPS-seconds column.

use std::path::Path;

use fitsio::{
    images::{ImageDescription, ImageType},
    tables::{ColumnDataType, ColumnDescription},
    FitsFile,
};
use hifitime::Epoch;
use ndarray::prelude::*;

use super::{ScreenError, ScreenSpec, TecScreenCube};

pub(crate) fn write(cube: &TecScreenCube, file: &Path) -> Result<(), ScreenError> {
    if file.exists() {
        std::fs::remove_file(file)?;
    }
    let mut fptr = FitsFile::create(file).open()?;
    let hdu = fptr.primary_hdu()?;

    hdu.write_key(&mut fptr, "TELESCOP", "LOFAR")?;
    hdu.write_key(&mut fptr, "PIXSCALE", cube.spec.pixel_scale_m)?;
    hdu.write_key(&mut fptr, "HEIGHT", cube.spec.height_m)?;
    hdu.write_key(&mut fptr, "R0", cube.spec.r0_m)?;
    hdu.write_key(&mut fptr, "OUTERSC", cube.spec.outer_scale_m)?;
    hdu.write_key(&mut fptr, "VEAST", cube.spec.velocity_east_mps)?;
    hdu.write_key(&mut fptr, "VNORTH", cube.spec.velocity_north_mps)?;
    hdu.write_key(&mut fptr, "SEED", cube.spec.seed.to_string())?;
    hdu.write_key(
        &mut fptr,
        "SOFTWARE",
        format!(
            "Created by {} v{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ),
    )?;

    let (n_times, n_y, n_x) = cube.data.dim();
    let image_description = ImageDescription {
        data_type: ImageType::Double,
        dimensions: &[n_times, n_y, n_x],
    };
    let hdu = fptr.create_image("SCREEN", &image_description)?;
    let flat: Vec<f64> = cube.data.iter().copied().collect();
    hdu.write_image(&mut fptr, &flat)?;

    let time_col = ColumnDescription::new("Time")
        .with_type(ColumnDataType::Double)
        .create()?;
    let hdu = fptr.create_table("TIMES", &[time_col])?;
    hdu.write_col(
        &mut fptr,
        "Time",
        &cube
            .times
            .iter()
            .map(|t| t.to_gpst_seconds())
            .collect::<Vec<f64>>(),
    )?;

    Ok(())
}

pub(crate) fn read(file: &Path) -> Result<TecScreenCube, ScreenError> {
    let mut fptr = FitsFile::open(file)?;
    let hdu = fptr.primary_hdu()?;

    let pixel_scale_m: f64 = hdu.read_key(&mut fptr, "PIXSCALE")?;
    let height_m: f64 = hdu.read_key(&mut fptr, "HEIGHT")?;
    let r0_m: f64 = hdu.read_key(&mut fptr, "R0")?;
    let outer_scale_m: f64 = hdu.read_key(&mut fptr, "OUTERSC")?;
    let velocity_east_mps: f64 = hdu.read_key(&mut fptr, "VEAST")?;
    let velocity_north_mps: f64 = hdu.read_key(&mut fptr, "VNORTH")?;
    let seed: String = hdu.read_key(&mut fptr, "SEED")?;
    let seed: u64 = seed.trim().parse().unwrap_or(0);

    let hdu = fptr.hdu("SCREEN")?;
    let (n_times, n_y, n_x) = match &hdu.info {
        fitsio::hdu::HduInfo::ImageInfo { shape, .. } if shape.len() == 3 => {
            (shape[0], shape[1], shape[2])
        }
        _ => return Err(ScreenError::Empty),
    };
    if n_times == 0 {
        return Err(ScreenError::Empty);
    }
    if n_y < 2 || n_x != n_y {
        return Err(ScreenError::TooSmall);
    }
    let flat: Vec<f64> = hdu.read_image(&mut fptr)?;
    let data = Array3::from_shape_vec((n_times, n_y, n_x), flat)
        .expect("shape matches the read image");

    let hdu = fptr.hdu("TIMES")?;
    let times_gpst: Vec<f64> = hdu.read_col(&mut fptr, "Time")?;
    if times_gpst.len() != n_times {
        return Err(ScreenError::MismatchedTimes {
            n_times: times_gpst.len(),
            n_planes: n_times,
        });
    }
    let times = times_gpst
        .into_iter()
        .map(Epoch::from_gpst_seconds)
        .collect();

    Ok(TecScreenCube {
        spec: ScreenSpec {
            size: n_x,
            pixel_scale_m,
            height_m,
            r0_m,
            outer_scale_m,
            velocity_east_mps,
            velocity_north_mps,
            seed,
        },
        times,
        data,
    })
}
