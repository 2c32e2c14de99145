//! CSV table reader with up-front header validation.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use yield_risk_dataset_models::TableSchema;

use crate::DatasetError;

/// Checks that every column `T` requires is present in `headers`.
///
/// # Errors
///
/// Returns [`DatasetError::MissingColumn`] naming the first absent column.
pub fn validate_headers<T: TableSchema>(headers: &[String]) -> Result<(), DatasetError> {
    for &column in T::REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(DatasetError::MissingColumn {
                table: T::TABLE,
                column,
            });
        }
    }
    Ok(())
}

/// Parses table `T` from any reader producing comma-separated UTF-8 text
/// with a header row.
///
/// # Errors
///
/// Returns [`DatasetError`] if a required column is missing or any row
/// fails to parse.
pub fn read_table<T: TableSchema, R: Read>(reader: R) -> Result<Vec<T>, DatasetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let mut headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
    T::normalize_headers(&mut headers);
    validate_headers::<T>(&headers)?;
    csv_reader.set_headers(csv::StringRecord::from(headers));

    let rows = csv_reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()?;
    Ok(rows)
}

/// Reads table `T` from `path`.
///
/// # Errors
///
/// Returns [`DatasetError::NotFound`] if the file does not exist, or any
/// error from [`read_table`].
pub fn load_table<T: TableSchema>(path: &Path) -> Result<Vec<T>, DatasetError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(DatasetError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let rows = read_table::<T, _>(BufReader::new(file))?;
    log::info!(
        "Loaded {} rows into table '{}' from {}",
        rows.len(),
        T::TABLE,
        path.display()
    );
    Ok(rows)
}
