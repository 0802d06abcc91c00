use std::path::Path;

use crate::error::{Error, Result};
use crate::finder::{Finder, FinderOptions};
use crate::models::LoginRecord;
use crate::table;

/// Pick the record at 1-based `index`.
pub fn select_direct<'a>(
    records: &'a [LoginRecord],
    index: usize,
    config_path: &Path,
) -> Result<&'a LoginRecord> {
    index
        .checked_sub(1)
        .and_then(|i| records.get(i))
        .ok_or_else(|| Error::Range {
            index,
            path: config_path.to_path_buf(),
        })
}

/// Let the user search the rendered table and map the chosen row back to its
/// record. `Ok(None)` means the user left without choosing.
pub fn select_interactive<'a>(
    records: &'a [LoginRecord],
    finder: &mut dyn Finder,
    options: &FinderOptions,
    config_path: &Path,
) -> Result<Option<&'a LoginRecord>> {
    let corpus = table::render(records);

    let Some(line) = finder.find(&corpus, options)? else {
        tracing::info!("Finder closed without a selection");
        return Ok(None);
    };

    let index = table::parse_index(&line).ok_or_else(|| Error::Selection { line: line.clone() })?;
    tracing::debug!("Finder returned host number {}", index);
    select_direct(records, index, config_path).map(Some)
}
