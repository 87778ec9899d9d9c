//! Terminal crawl-state listings
//!
//! Each listing is a CSV file with a `URL` header and one URL per row,
//! sorted ascending.

use crate::output::traits::OutputResult;
use std::path::Path;

/// Header row of every listing
pub const LISTING_HEADER: &str = "URL";

/// Writes a sorted single-column URL listing to `path`
pub fn write_listing<'a, I>(path: &Path, urls: I) -> OutputResult<()>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut rows: Vec<&String> = urls.into_iter().collect();
    rows.sort();

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([LISTING_HEADER])?;
    for url in rows {
        writer.write_record([url])?;
    }
    writer.flush()?;

    Ok(())
}
