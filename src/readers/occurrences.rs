use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::ReadError;
use crate::sdm::Occurrence;

/// Reads a JSON array of `{ "species", "x", "y" }` presence records.
pub fn read_occurrences<P: AsRef<Path>>(path: P) -> Result<Vec<Occurrence>, ReadError> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|e| {
        ReadError::Occurrences(format!("{}: {}", path.as_ref().display(), e))
    })
}
