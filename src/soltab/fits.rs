// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reading and writing solution-table FITS files.
//!
//! The layout is a primary HDU naming the tables, shared "ANTENNAS" and
//! "TIMES" binary tables, and per solution table a 4-dimensional image HDU
//! (time, station, frequency, polarisation) plus a "<NAME>_FREQS" table
//! when the table varies with frequency.

use std::{ffi::CString, path::Path, str::FromStr};

use fitsio::{
    errors::check_status as fits_check_status,
    images::{ImageDescription, ImageType},
    tables::{ColumnDataType, ColumnDescription},
    FitsFile,
};
use hifitime::Epoch;
use ndarray::prelude::*;
use vec1::Vec1;

use super::{SolTab, SolTabError, SolType, Solutions};

pub(crate) fn write(sols: &Solutions, file: &Path) -> Result<(), SolTabError> {
    if file.exists() {
        std::fs::remove_file(file)?;
    }
    let mut fptr = FitsFile::create(file).open()?;
    let hdu = fptr.primary_hdu()?;

    hdu.write_key(&mut fptr, "TELESCOP", "LOFAR")?;
    hdu.write_key(
        &mut fptr,
        "SOFTWARE",
        format!(
            "Created by {} v{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ),
    )?;
    hdu.write_key(&mut fptr, "NSOLTAB", sols.soltabs.len() as u32)?;
    for (i, soltab) in sols.soltabs.iter().enumerate() {
        hdu.write_key(&mut fptr, &format!("SOLTB{i:03}"), soltab.name.as_str())?;
    }

    // Write out the current command-line call ("CMDLINE"). It's possible
    // that the command-line call has invalid UTF-8. So use args_os and
    // attempt to convert to UTF-8 strings. If there are problems on the
    // way, don't bother trying to write the CMDLINE key.
    unsafe {
        match std::env::args_os()
            .map(|a| a.into_string())
            .collect::<Result<Vec<String>, _>>()
            .and_then(|v| CString::new(v.join(" ")).map_err(|_| std::ffi::OsString::from("")))
        {
            Err(_) => (),
            Ok(value) => {
                let key_name = CString::new("CMDLINE").unwrap();
                let comment = CString::new("Command-line call").unwrap();
                let mut status = 0;
                // ffpkls = fits_write_key_longstr
                fitsio_sys::ffpkls(
                    fptr.as_raw(),     /* I - FITS file pointer        */
                    key_name.as_ptr(), /* I - name of keyword to write */
                    value.as_ptr(),    /* I - keyword value            */
                    comment.as_ptr(),  /* I - keyword comment          */
                    &mut status,       /* IO - error status            */
                );
                fits_check_status(status)?;
            }
        }
    }

    // Station information ("ANTENNAS" HDU).
    {
        let antenna_col = ColumnDescription::new("Antenna")
            .with_type(ColumnDataType::Int)
            .create()?;
        let name_col = ColumnDescription::new("Name")
            .with_type(ColumnDataType::String)
            .that_repeats(16)
            .create()?;
        let hdu = fptr.create_table("ANTENNAS", &[antenna_col, name_col])?;
        hdu.write_col(
            &mut fptr,
            "Antenna",
            &(0..sols.station_names.len() as u32).collect::<Vec<_>>(),
        )?;
        hdu.write_col(&mut fptr, "Name", &sols.station_names.to_vec())?;
    }

    // Timestamps ("TIMES" HDU).
    {
        let time_col = ColumnDescription::new("Time")
            .with_type(ColumnDataType::Double)
            .create()?;
        let hdu = fptr.create_table("TIMES", &[time_col])?;
        hdu.write_col(
            &mut fptr,
            "Time",
            &sols
                .times
                .iter()
                .map(|t| t.to_gpst_seconds())
                .collect::<Vec<f64>>(),
        )?;
    }

    // One image HDU per solution table.
    for soltab in &sols.soltabs {
        let (n_t, n_s, n_f, n_p) = soltab.values.dim();
        let image_description = ImageDescription {
            data_type: ImageType::Double,
            dimensions: &[n_t, n_s, n_f, n_p],
        };
        let hdu_name = soltab.name.to_uppercase();
        let hdu = fptr.create_image(&hdu_name, &image_description)?;
        hdu.write_key(&mut fptr, "SOLTYPE", soltab.sol_type.to_string())?;
        hdu.write_key(&mut fptr, "POLS", soltab.pols.join(","))?;
        let flat: Vec<f64> = soltab.values.iter().copied().collect();
        hdu.write_image(&mut fptr, &flat)?;

        if let Some(freqs) = &soltab.freqs {
            let freq_col = ColumnDescription::new("Freq")
                .with_type(ColumnDataType::Double)
                .create()?;
            let hdu = fptr.create_table(format!("{hdu_name}_FREQS"), &[freq_col])?;
            hdu.write_col(&mut fptr, "Freq", &freqs.to_vec())?;
        }
    }

    Ok(())
}

pub(crate) fn read(file: &Path) -> Result<Solutions, SolTabError> {
    let mut fptr = FitsFile::open(file)?;
    let hdu = fptr.primary_hdu()?;

    let num_soltabs: i64 = hdu.read_key(&mut fptr, "NSOLTAB")?;
    let mut soltab_names = Vec::with_capacity(num_soltabs as usize);
    for i in 0..num_soltabs {
        let name: String = hdu.read_key(&mut fptr, &format!("SOLTB{i:03}"))?;
        soltab_names.push(name.trim().to_lowercase());
    }
    if soltab_names.is_empty() {
        return Err(SolTabError::Empty);
    }

    let hdu = fptr.hdu("ANTENNAS")?;
    let station_names: Vec<String> = hdu.read_col(&mut fptr, "Name")?;
    let station_names = Vec1::try_from_vec(
        station_names
            .into_iter()
            .map(|n| n.trim().to_string())
            .collect(),
    )
    .map_err(|_| SolTabError::NoStations)?;

    let hdu = fptr.hdu("TIMES")?;
    let times_gpst: Vec<f64> = hdu.read_col(&mut fptr, "Time")?;
    let times = Vec1::try_from_vec(
        times_gpst
            .into_iter()
            .map(Epoch::from_gpst_seconds)
            .collect(),
    )
    .map_err(|_| SolTabError::NoTimes)?;

    let mut soltabs = vec![];
    for name in soltab_names {
        let hdu_name = name.to_uppercase();
        let hdu = fptr.hdu(hdu_name.as_str())?;
        let sol_type_str: String = hdu.read_key(&mut fptr, "SOLTYPE")?;
        let sol_type = SolType::from_str(sol_type_str.trim()).map_err(|_| {
            SolTabError::UnknownSolType {
                hdu: hdu_name.clone(),
                sol_type: sol_type_str,
            }
        })?;
        let pols_str: String = hdu.read_key(&mut fptr, "POLS")?;
        let pols: Vec<String> = if pols_str.trim().is_empty() {
            vec![]
        } else {
            pols_str.split(',').map(|p| p.trim().to_string()).collect()
        };

        let dims = match &hdu.info {
            fitsio::hdu::HduInfo::ImageInfo { shape, .. } if shape.len() == 4 => {
                (shape[0], shape[1], shape[2], shape[3])
            }
            _ => {
                return Err(SolTabError::BadShape {
                    name,
                    dims: "non-4D image".to_string(),
                    expected: "a 4D image".to_string(),
                })
            }
        };
        let flat: Vec<f64> = hdu.read_image(&mut fptr)?;
        let values =
            Array4::from_shape_vec(dims, flat).expect("shape matches the read image");

        // A frequency table is only present for frequency-dependent tables.
        let freqs = match fptr.hdu(format!("{hdu_name}_FREQS").as_str()) {
            Ok(hdu) => {
                let freqs: Vec<f64> = hdu.read_col(&mut fptr, "Freq")?;
                Vec1::try_from_vec(freqs).ok()
            }
            Err(_) => None,
        };

        soltabs.push(SolTab {
            name,
            sol_type,
            freqs,
            pols,
            values,
        });
    }

    Ok(Solutions {
        station_names,
        times,
        soltabs,
    })
}
