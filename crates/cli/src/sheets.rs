//! `ingestcheck sheets`: list workbook sheets.

use std::path::PathBuf;

use crate::{require_file, to_json, CliError};

pub fn cmd_sheets(file: PathBuf, json: bool) -> Result<(), CliError> {
    require_file(&file)?;
    let names = ingestcheck_io::list_sheets(&file).map_err(CliError::decode)?;

    if json {
        println!("{}", to_json(&names)?);
    } else {
        for name in &names {
            println!("{name}");
        }
    }
    Ok(())
}
